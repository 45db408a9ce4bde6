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
//! Wall jump example
//!
//! Runs a hero through a scripted input sequence: run left into a wall,
//! jump, slide down the wall, kick off it and air dash. Set `RUST_LOG=debug`
//! to see behavior transitions and deferred changes as they happen.

use glam::Vec2;
use platformer_core::behavior::{
    Behavior, BehaviorComponent, BehaviorContext, BehaviorKind, FnBehavior, JumpAction,
};
use platformer_core::controller::{ButtonAdapter, ButtonStates, ControllerComponent, InputSource};
use platformer_core::ecs::components::{Facing, SoundComponent};
use platformer_core::physics::{BodyComponent, BodySense, Fixture, FixtureRole};
use platformer_core::{ControllerButton, CoreError, Entity, Simulation, SimulationConfig, Timer};
use tracing_subscriber::EnvFilter;

const RUN_SPEED: f32 = 6.0;
const JUMP_SPEED: f32 = 14.0;
const WALL_KICK: f32 = 8.0;
const SLIDE_SPEED: f32 = -2.0;
const DASH_SPEED: f32 = 18.0;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Dash horizontally for a fixed time, once per airborne stretch
struct AirDash {
    timer: Timer,
    available: bool,
}

impl AirDash {
    fn new() -> Result<Self, CoreError> {
        Ok(AirDash {
            timer: Timer::finished(0.2)?,
            available: true,
        })
    }
}

impl Behavior for AirDash {
    fn kind(&self) -> Option<BehaviorKind> {
        Some(BehaviorKind::AirDashing)
    }

    fn name(&self) -> &str {
        "air_dash"
    }

    fn evaluate(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<bool, CoreError> {
        let pressed = ctx.input().is_just_pressed(ControllerButton::X);
        let dashing = ctx.is(BehaviorKind::AirDashing);
        let on_ground = ctx.body()?.is(BodySense::FeetOnGround);
        if on_ground {
            self.available = true;
        }
        if dashing {
            return Ok(!self.timer.is_finished() && !on_ground);
        }
        Ok(pressed && self.available && !on_ground && ctx.next_jump() == JumpAction::AirDash)
    }

    fn init(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        self.available = false;
        self.timer.reset();
        let direction = ctx.facing()?.sign();
        let body = ctx.body()?;
        body.set_gravity_on(false);
        body.set_velocity(Vec2::new(direction * DASH_SPEED, 0.0));
        ctx.request_sound("dash");
        Ok(())
    }

    fn act(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        self.timer.update(ctx.delta());
        Ok(())
    }

    fn end(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        let body = ctx.body()?;
        body.set_gravity_on(true);
        body.set_velocity_x(0.0);
        Ok(())
    }
}

fn wall_slide() -> FnBehavior {
    FnBehavior::new(|ctx| {
        let body = ctx.body()?;
        let against_wall = body.is(BodySense::TouchingBlockLeft) || body.is(BodySense::TouchingBlockRight);
        Ok(against_wall && !body.is(BodySense::FeetOnGround) && body.velocity().y < 0.0)
    })
    .with_kind(BehaviorKind::WallSliding)
    .on_act(|ctx| {
        let body = ctx.body()?;
        if body.velocity().y < SLIDE_SPEED {
            body.set_velocity_y(SLIDE_SPEED);
        }
        Ok(())
    })
}

fn jump() -> FnBehavior {
    FnBehavior::new(|ctx| {
        let pressed = ctx.input().is_just_pressed(ControllerButton::A);
        let sliding = ctx.is(BehaviorKind::WallSliding);
        let jumping = ctx.is(BehaviorKind::Jumping);
        let body = ctx.body()?;
        let grounded = body.is(BodySense::FeetOnGround);
        Ok((pressed && (grounded || sliding)) || (jumping && body.velocity().y > 0.0))
    })
    .with_kind(BehaviorKind::Jumping)
    .on_init(|ctx| {
        let sliding = ctx.is(BehaviorKind::WallSliding);
        let body = ctx.body()?;
        body.set_velocity_y(JUMP_SPEED);
        if sliding {
            let away = if body.is(BodySense::TouchingBlockLeft) { 1.0 } else { -1.0 };
            body.set_velocity_x(away * WALL_KICK);
        }
        ctx.set_next_jump(JumpAction::AirDash);
        ctx.request_sound(if sliding { "wall_jump" } else { "jump" });
        Ok(())
    })
    .on_end(|ctx| {
        ctx.set_next_jump(JumpAction::Jump);
        Ok(())
    })
}

fn run_adapter(direction: Facing) -> ButtonAdapter {
    ButtonAdapter::new()
        .on_press_continued(move |ctx| {
            if ctx.is_behavior_active(BehaviorKind::AirDashing) {
                return Ok(());
            }
            *ctx.facing()? = direction;
            ctx.body()?.set_velocity_x(direction.sign() * RUN_SPEED);
            Ok(())
        })
        .on_just_released(|ctx| {
            if !ctx.is_behavior_active(BehaviorKind::AirDashing) {
                ctx.body()?.set_velocity_x(0.0);
            }
            Ok(())
        })
}

fn spawn_block(sim: &mut Simulation, x: f32, y: f32, width: f32, height: f32) {
    sim.world_mut()
        .spawn()
        .with(
            BodyComponent::fixed()
                .with_size(width, height)
                .with_position(x, y)
                .with_fixture(Fixture::new(vec![FixtureRole::block()]).with_size(width, height)),
        )
        .id();
}

fn spawn_hero(sim: &mut Simulation) -> Result<Entity, CoreError> {
    let body = BodyComponent::dynamic()
        .with_size(1.0, 2.0)
        .with_position(4.0, 0.0)
        .with_gravity(-40.0)
        .with_fixture(Fixture::new(vec![FixtureRole::Feet]).with_size(0.9, 0.5).with_offset(0.0, -0.75))
        .with_fixture(Fixture::new(vec![FixtureRole::Head]).with_size(0.9, 0.25).with_offset(0.0, 0.9))
        .with_fixture(Fixture::new(vec![FixtureRole::Left]).with_size(0.2, 1.0).with_offset(-0.6, 0.25))
        .with_fixture(Fixture::new(vec![FixtureRole::Right]).with_size(0.2, 1.0).with_offset(0.6, 0.25));

    let behaviors = BehaviorComponent::new()
        .with(AirDash::new()?)
        .with(wall_slide())
        .with(jump());

    let controller = ControllerComponent::new()
        .with_adapter(ControllerButton::Left, run_adapter(Facing::Left))
        .with_adapter(ControllerButton::Right, run_adapter(Facing::Right));

    Ok(sim
        .world_mut()
        .spawn()
        .with(body)
        .with(behaviors)
        .with(controller)
        .with(Facing::Right)
        .with(SoundComponent::new())
        .id())
}

/// Buttons held on a given frame
fn scripted_input(frame: u64) -> Vec<ControllerButton> {
    match frame {
        20..=59 => vec![ControllerButton::Left],
        60..=61 => vec![ControllerButton::Left, ControllerButton::A],
        62..=79 => vec![ControllerButton::Left],
        100..=101 => vec![ControllerButton::A],
        112..=113 => vec![ControllerButton::Right, ControllerButton::X],
        _ => Vec::new(),
    }
}

fn main() -> Result<(), CoreError> {
    init_tracing();
    println!("Platformer Core - Wall Jump Example");
    println!("===================================\n");

    let mut sim = Simulation::new(SimulationConfig::default())?;
    spawn_block(&mut sim, -10.0, -10.0, 40.0, 10.0);
    spawn_block(&mut sim, -1.0, 0.0, 1.0, 30.0);
    let hero = spawn_hero(&mut sim)?;

    let mut input = ButtonStates::new();
    for frame in 0..180u64 {
        input.advance();
        let held = scripted_input(frame);
        for button in ControllerButton::ALL {
            input.set(button, held.contains(&button));
        }

        let report = sim.step(&input, 1.0 / 60.0);
        if report.failures() > 0 {
            println!("frame {frame}: {} entity failures", report.failures());
        }

        for (_, sound) in sim.drain_sounds() {
            println!("frame {frame:>3}: sound '{sound}'");
        }
        if frame % 10 == 0 {
            let body = sim.world().require::<BodyComponent>(hero)?;
            let behaviors = sim.world().require::<BehaviorComponent>(hero)?;
            let active: Vec<BehaviorKind> = behaviors.active_kinds().iter().collect();
            println!(
                "frame {frame:>3}: pos=({:6.2}, {:6.2}) vel=({:6.2}, {:6.2}) active={active:?}",
                body.position().x,
                body.position().y,
                body.velocity().x,
                body.velocity().y,
            );
        }
    }

    println!("\nExample completed successfully!");
    Ok(())
}
