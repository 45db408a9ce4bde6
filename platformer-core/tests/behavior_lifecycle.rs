// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Behavior lifecycle tests through the full frame loop

use glam::Vec2;
use platformer_core::behavior::{
    Behavior, BehaviorComponent, BehaviorContext, BehaviorKind, FnBehavior,
};
use platformer_core::controller::ButtonStates;
use platformer_core::ecs::ComponentKind;
use platformer_core::physics::BodyComponent;
use platformer_core::{CoreError, Entity, Simulation, SimulationConfig};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Active for a fixed number of evaluations, recording every hook call
struct Scripted {
    remaining: u32,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Behavior for Scripted {
    fn kind(&self) -> Option<BehaviorKind> {
        Some(BehaviorKind::Running)
    }

    fn evaluate(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<bool, CoreError> {
        let active = self.remaining > 0;
        self.remaining = self.remaining.saturating_sub(1);
        Ok(active)
    }

    fn init(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        assert!(ctx.is(BehaviorKind::Running));
        self.log.borrow_mut().push("init");
        Ok(())
    }

    fn act(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        self.log.borrow_mut().push("act");
        Ok(())
    }

    fn end(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        assert!(ctx.is(BehaviorKind::Running));
        self.log.borrow_mut().push("end");
        Ok(())
    }
}

#[test]
fn test_three_true_then_false_runs_init_act_act_end() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let entity = sim
        .world_mut()
        .spawn()
        .with(BehaviorComponent::new().with(Scripted {
            remaining: 3,
            log: Rc::clone(&log),
        }))
        .id();

    let input = ButtonStates::new();
    for frame in 0..3 {
        sim.step(&input, 0.016);
        let behaviors = sim.world().get::<BehaviorComponent>(entity).unwrap();
        assert!(behaviors.is(BehaviorKind::Running), "frame {frame}");
    }
    sim.step(&input, 0.016);
    sim.step(&input, 0.016);

    assert_eq!(*log.borrow(), vec!["init", "act", "act", "end"]);
    let behaviors = sim.world().get::<BehaviorComponent>(entity).unwrap();
    assert!(!behaviors.is(BehaviorKind::Running));
    assert!(!behaviors.is_behavior_active(0));
}

#[test]
fn test_later_behaviors_see_earlier_activations() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let saw_jumping = Rc::new(RefCell::new(false));
    let seen = Rc::clone(&saw_jumping);
    let entity = sim
        .world_mut()
        .spawn()
        .with(
            BehaviorComponent::new()
                .with(FnBehavior::new(|_| Ok(true)).with_kind(BehaviorKind::Jumping))
                .with(FnBehavior::new(move |ctx| {
                    *seen.borrow_mut() = ctx.is(BehaviorKind::Jumping);
                    Ok(false)
                })),
        )
        .id();

    sim.step(&ButtonStates::new(), 0.016);

    assert!(*saw_jumping.borrow());
    let behaviors = sim.world().get::<BehaviorComponent>(entity).unwrap();
    assert!(behaviors.is_behavior_active(0));
    assert!(!behaviors.is_behavior_active(1));
}

#[test]
fn test_missing_body_fails_only_that_entity() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let pusher = || {
        BehaviorComponent::new().with(
            FnBehavior::new(|_| Ok(true))
                .with_kind(BehaviorKind::Running)
                .on_init(|ctx| {
                    ctx.body()?.set_velocity_x(4.0);
                    Ok(())
                }),
        )
    };
    let bodiless = sim.world_mut().spawn().with(pusher()).id();
    let walker = sim
        .world_mut()
        .spawn()
        .with(pusher())
        .with(BodyComponent::dynamic())
        .id();

    let report = sim.step(&ButtonStates::new(), 0.016);

    let (_, behavior_stats) = report
        .systems
        .iter()
        .find(|(name, _)| name == "behavior")
        .unwrap();
    assert_eq!(behavior_stats.failed, 1);
    assert_eq!(behavior_stats.processed, 1);
    assert!(sim.world().has::<BehaviorComponent>(bodiless));
    assert_eq!(
        sim.world().get::<BodyComponent>(walker).unwrap().velocity().x,
        4.0
    );
    assert_eq!(
        CoreError::missing(bodiless, ComponentKind::Body).to_string(),
        format!("{bodiless} is missing required component Body")
    );
}

#[test]
fn test_pre_process_hook_sees_active_behaviors() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let mut body = BodyComponent::dynamic().with_size(2.0, 4.0);
    body.set_pre_process(|body, active, _delta| {
        if active.contains(BehaviorKind::GroundSliding) {
            body.set_size(4.0, 2.0);
        }
    });
    let entity = sim
        .world_mut()
        .spawn()
        .with(body)
        .with(
            BehaviorComponent::new()
                .with(FnBehavior::new(|_| Ok(true)).with_kind(BehaviorKind::GroundSliding)),
        )
        .id();

    sim.step(&ButtonStates::new(), 0.016);

    let size = sim.world().get::<BodyComponent>(entity).unwrap().collision_box().size();
    assert_eq!(size.x, 4.0);
    assert_eq!(size.y, 2.0);
}

/// Kicks the body once on start, then holds the dash speed
struct Dash {
    acts: Rc<Cell<u32>>,
}

impl Behavior for Dash {
    fn kind(&self) -> Option<BehaviorKind> {
        Some(BehaviorKind::AirDashing)
    }

    fn evaluate(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<bool, CoreError> {
        Ok(true)
    }

    fn init(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        ctx.body()?.apply_impulse(Vec2::new(6.0, 0.0));
        Ok(())
    }

    fn act(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        self.acts.set(self.acts.get() + 1);
        ctx.body()?.set_velocity_x(6.0);
        Ok(())
    }
}

#[test]
fn test_act_repeats_without_reapplying_init_effects() {
    let acts = Rc::new(Cell::new(0));
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let mut body = BodyComponent::dynamic();
    body.set_gravity_on(false);
    let entity = sim
        .world_mut()
        .spawn()
        .with(body)
        .with(BehaviorComponent::new().with(Dash { acts: Rc::clone(&acts) }))
        .id();

    for _ in 0..5 {
        sim.step(&ButtonStates::new(), 0.016);
    }
    // one act per frame after the init frame
    assert_eq!(acts.get(), 4);
    assert_eq!(sim.world().get::<BodyComponent>(entity).unwrap().velocity().x, 6.0);

    let input = ButtonStates::new();
    let mut dash = Dash { acts: Rc::new(Cell::new(0)) };
    let mut body = BodyComponent::dynamic();
    let mut ctx = BehaviorContext::new(Entity::new(0, 0), 0.016, &input).with_body(&mut body);
    dash.init(&mut ctx).unwrap();
    dash.act(&mut ctx).unwrap();
    let once = ctx.body().unwrap().velocity();
    dash.act(&mut ctx).unwrap();
    assert_eq!(ctx.body().unwrap().velocity(), once);
    assert_eq!(once, Vec2::new(6.0, 0.0));
}
