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
//! System execution framework
//!
//! A system declares the component kinds it needs. Each pass selects every
//! live entity carrying at least those kinds, snapshotted at pass start, and
//! hands them to [`System::process_entity`] one at a time between an optional
//! pre-pass and post-pass.

use crate::controller::InputSource;
use crate::ecs::{ComponentMask, Entity, World};
use crate::error::CoreError;
use tracing::{error, trace};

/// Per-frame data handed to every system
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    /// Seconds elapsed since the previous frame
    pub delta: f32,
    /// Monotonic frame counter, starting at 0
    pub frame: u64,
    /// Polled input state for this frame
    pub input: &'a dyn InputSource,
}

impl<'a> FrameContext<'a> {
    /// Create a frame context
    pub fn new(delta: f32, frame: u64, input: &'a dyn InputSource) -> Self {
        FrameContext { delta, frame, input }
    }
}

/// Trait for systems that operate on the ECS world
pub trait System {
    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Component kinds an entity must carry to be processed
    fn mask(&self) -> ComponentMask;

    /// Runs once per pass before any entity is processed
    fn pre_process(&mut self, _world: &mut World, _frame: &FrameContext<'_>) {}

    /// Process a single matching entity
    ///
    /// Returning an error aborts this entity for this pass only.
    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        frame: &FrameContext<'_>,
    ) -> Result<(), CoreError>;

    /// Runs once per pass after every entity has been processed
    fn post_process(&mut self, _world: &mut World, _frame: &FrameContext<'_>) {}
}

/// Outcome counters for one system pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemRunStats {
    /// Entities processed without error
    pub processed: usize,
    /// Entities whose processing returned an error
    pub failed: usize,
    /// Entities skipped because they were destroyed earlier in the frame
    pub skipped: usize,
}

/// Run one pass of `system` over the world
///
/// The entity set is snapshotted before the pre-pass. Entities destroyed
/// after the snapshot are skipped; entities gaining components are only
/// picked up by the next pass.
pub fn run_system(
    system: &mut dyn System,
    world: &mut World,
    frame: &FrameContext<'_>,
) -> SystemRunStats {
    let mut stats = SystemRunStats::default();
    let entities = world.entities_matching(system.mask());
    trace!(system = system.name(), candidates = entities.len(), "system_pass");

    system.pre_process(world, frame);
    for entity in entities {
        if !world.is_entity_alive(entity) || world.is_pending_destroy(entity) {
            stats.skipped += 1;
            continue;
        }
        match system.process_entity(world, entity, frame) {
            Ok(()) => stats.processed += 1,
            Err(err) => {
                stats.failed += 1;
                error!(system = system.name(), entity = %entity, error = %err, "entity_processing_failed");
            }
        }
    }
    system.post_process(world, frame);

    stats
}
