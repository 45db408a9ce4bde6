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
//! A ready-to-run session: world, scheduler and the standard systems
//!
//! [`Simulation`] is the explicit context object a game loop owns. There is
//! no global state; two simulations never share anything.

use crate::behavior::BehaviorSystem;
use crate::config::SimulationConfig;
use crate::controller::{ControllerSystem, InputSource};
use crate::ecs::components::SoundComponent;
use crate::ecs::scheduler::{stages, FrameReport, Scheduler};
use crate::ecs::{ComponentKind, ComponentMask, Entity, FrameContext, World};
use crate::error::CoreError;
use crate::physics::{Rect, WorldSystem};
use crate::systems::{
    CullBounds, CullSystem, DebugBoard, DebugMessageSystem, PendulumSystem, TrajectorySystem, UpdatableSystem,
};
use tracing::{debug, warn};

/// Owns the world and runs the standard frame
///
/// # Examples
///
/// ```
/// use platformer_core::{Simulation, SimulationConfig};
/// use platformer_core::controller::ButtonStates;
/// use platformer_core::physics::BodyComponent;
///
/// let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
/// let hero = sim.world_mut().spawn().with(BodyComponent::dynamic().with_gravity(-20.0)).id();
///
/// let input = ButtonStates::new();
/// let report = sim.step(&input, 0.016);
/// assert_eq!(report.failures(), 0);
/// assert!(sim.world().get::<BodyComponent>(hero).unwrap().velocity().y < 0.0);
/// ```
pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    config: SimulationConfig,
    frame: u64,
    debug_board: DebugBoard,
    cull_bounds: CullBounds,
}

impl Simulation {
    /// Validate `config` and register the standard systems
    pub fn new(config: SimulationConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let cull = CullSystem::new(CullBounds::new(config.cull_bounds));
        let debug_messages = DebugMessageSystem::new(config.debug_message_slots);
        let cull_bounds = cull.bounds();
        let debug_board = debug_messages.board();

        let mut scheduler = Scheduler::new();
        scheduler.add_system(ControllerSystem::new(), stages::INPUT);
        scheduler.add_system(UpdatableSystem, stages::UPDATE);
        scheduler.add_system(TrajectorySystem, stages::UPDATE);
        scheduler.add_system(PendulumSystem, stages::UPDATE);
        scheduler.add_system(BehaviorSystem::new(), stages::BEHAVIOR);
        scheduler.add_system(WorldSystem::with_pool_config(config.pool.clone()), stages::PHYSICS);
        scheduler.add_system(cull, stages::POST_PROCESS);
        scheduler.add_system(debug_messages, stages::POST_PROCESS);
        debug!(systems = scheduler.system_count(), "simulation_created");

        Ok(Simulation {
            world: World::new(),
            scheduler,
            config,
            frame: 0,
            debug_board,
            cull_bounds,
        })
    }

    /// Run one frame with `delta` seconds clamped to `[0, max_frame_delta]`
    pub fn step(&mut self, input: &dyn InputSource, delta: f32) -> FrameReport {
        let clamped = if delta.is_nan() {
            0.0
        } else {
            delta.clamp(0.0, self.config.max_frame_delta)
        };
        if clamped != delta {
            warn!(delta, clamped, "frame_delta_clamped");
        }

        let frame = FrameContext::new(clamped, self.frame, input);
        let report = self.scheduler.run_frame(&mut self.world, &frame);
        self.frame += 1;
        report
    }

    /// The simulated world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The simulated world, for spawning and editing entities between frames
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The scheduler, for registering extra systems
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Active configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Debug text gathered during the last frame
    pub fn debug_board(&self) -> &DebugBoard {
        &self.debug_board
    }

    /// Move the culling region, e.g. to follow the camera
    pub fn set_cull_bounds(&mut self, bounds: Option<Rect>) {
        match bounds {
            Some(bounds) => self.cull_bounds.set(bounds),
            None => self.cull_bounds.clear(),
        }
    }

    /// Take every queued sound request, in entity order
    pub fn drain_sounds(&mut self) -> Vec<(Entity, String)> {
        let mask = ComponentMask::empty().with(ComponentKind::Sound);
        let mut drained = Vec::new();
        for entity in self.world.entities_matching(mask) {
            if let Some(sounds) = self.world.get_mut::<SoundComponent>(entity) {
                drained.extend(sounds.drain().into_iter().map(|key| (entity, key)));
            }
        }
        drained
    }
}
