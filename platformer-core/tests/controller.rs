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
//! Controller dispatch tests through the full frame loop

use platformer_core::behavior::{BehaviorComponent, BehaviorKind, FnBehavior};
use platformer_core::controller::{ButtonAdapter, ButtonStates, ControllerComponent};
use platformer_core::ecs::components::Facing;
use platformer_core::physics::BodyComponent;
use platformer_core::{ControllerButton, Simulation, SimulationConfig};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<(ControllerButton, &'static str)>>>;

fn recording_adapter(button: ControllerButton, log: &Log) -> ButtonAdapter {
    let (a, b, c, d) = (Rc::clone(log), Rc::clone(log), Rc::clone(log), Rc::clone(log));
    ButtonAdapter::new()
        .on_just_pressed(move |_| {
            a.borrow_mut().push((button, "just_pressed"));
            Ok(())
        })
        .on_press_continued(move |_| {
            b.borrow_mut().push((button, "held"));
            Ok(())
        })
        .on_just_released(move |_| {
            c.borrow_mut().push((button, "just_released"));
            Ok(())
        })
        .on_release_continued(move |_| {
            d.borrow_mut().push((button, "released"));
            Ok(())
        })
}

#[test]
fn test_one_callback_per_button_in_polling_order() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let log: Log = Rc::default();
    sim.world_mut()
        .spawn()
        .with(
            ControllerComponent::new()
                .with_adapter(ControllerButton::A, recording_adapter(ControllerButton::A, &log))
                .with_adapter(ControllerButton::Left, recording_adapter(ControllerButton::Left, &log)),
        )
        .id();

    let mut input = ButtonStates::new();
    input.press(ControllerButton::A);
    sim.step(&input, 0.016);
    assert_eq!(
        *log.borrow(),
        vec![(ControllerButton::Left, "released"), (ControllerButton::A, "just_pressed")]
    );

    log.borrow_mut().clear();
    input.advance();
    sim.step(&input, 0.016);
    input.advance();
    input.release(ControllerButton::A);
    sim.step(&input, 0.016);
    input.advance();
    sim.step(&input, 0.016);

    let a_events: Vec<_> = log
        .borrow()
        .iter()
        .filter(|(button, _)| *button == ControllerButton::A)
        .map(|(_, event)| *event)
        .collect();
    assert_eq!(a_events, vec!["held", "just_released", "released"]);
}

#[test]
fn test_adapter_moves_body_and_turns_facing() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let runner = ButtonAdapter::new()
        .on_press_continued(|ctx| {
            *ctx.facing()? = Facing::Left;
            ctx.body()?.set_velocity_x(-3.0);
            Ok(())
        })
        .on_release_continued(|ctx| {
            ctx.body()?.set_velocity_x(0.0);
            Ok(())
        });
    let hero = sim
        .world_mut()
        .spawn()
        .with(BodyComponent::dynamic())
        .with(Facing::Right)
        .with(ControllerComponent::new().with_adapter(ControllerButton::Left, runner))
        .id();

    let mut input = ButtonStates::new();
    input.press(ControllerButton::Left);
    input.advance();
    sim.step(&input, 0.016);

    assert_eq!(sim.world().get::<Facing>(hero), Some(&Facing::Left));
    assert_eq!(sim.world().get::<BodyComponent>(hero).unwrap().velocity().x, -3.0);

    input.release(ControllerButton::Left);
    input.advance();
    sim.step(&input, 0.016);
    assert_eq!(sim.world().get::<BodyComponent>(hero).unwrap().velocity().x, 0.0);
}

#[test]
fn test_adapter_reads_behaviors_from_previous_frame() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);
    sim.world_mut()
        .spawn()
        .with(ControllerComponent::new().with_adapter(
            ControllerButton::B,
            ButtonAdapter::new().on_release_continued(move |ctx| {
                record.borrow_mut().push(ctx.is_behavior_active(BehaviorKind::Shooting));
                Ok(())
            }),
        ))
        .with(
            BehaviorComponent::new()
                .with(FnBehavior::new(|_| Ok(true)).with_kind(BehaviorKind::Shooting)),
        )
        .id();

    let input = ButtonStates::new();
    sim.step(&input, 0.016);
    sim.step(&input, 0.016);

    // input runs before behaviors within a frame
    assert_eq!(*seen.borrow(), vec![false, true]);
}

#[test]
fn test_missing_facing_fails_entity_not_frame() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    sim.world_mut()
        .spawn()
        .with(ControllerComponent::new().with_adapter(
            ControllerButton::Right,
            ButtonAdapter::new().on_release_continued(|ctx| {
                ctx.facing()?;
                Ok(())
            }),
        ))
        .id();
    let other = sim.world_mut().spawn().with(BodyComponent::dynamic()).id();

    let report = sim.step(&ButtonStates::new(), 0.016);

    assert_eq!(report.failures(), 1);
    assert!(sim.world().is_entity_alive(other));
}
