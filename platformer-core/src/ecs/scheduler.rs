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
//! Frame scheduler
//!
//! Systems are organized into stages that execute in ascending order; within
//! a stage systems run in registration order. A frame opens the world's
//! deferral window, runs every stage to completion and then flushes the
//! structural changes queued during the frame.

use crate::ecs::system::{run_system, FrameContext, SystemRunStats};
use crate::ecs::{System, World};
use tracing::trace;

/// Stage identifier for grouping systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(pub usize);

impl StageId {
    /// Create a new stage ID
    pub fn new(id: usize) -> Self {
        StageId(id)
    }
}

/// Standard stages, in the order a frame runs them
pub mod stages {
    use super::StageId;

    /// Controller dispatch
    pub const INPUT: StageId = StageId(0);

    /// Per-entity updatables and scripted trajectories
    pub const UPDATE: StageId = StageId(1);

    /// Behavior evaluation
    pub const BEHAVIOR: StageId = StageId(2);

    /// Motion integration and collision resolution
    pub const PHYSICS: StageId = StageId(3);

    /// Culling, debug output and other read-mostly passes
    pub const POST_PROCESS: StageId = StageId(4);
}

/// A system with metadata for scheduling
struct ScheduledSystem {
    system: Box<dyn System>,
    stage: StageId,
}

/// Aggregate outcome of one scheduled frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Per-system stats, in execution order
    pub systems: Vec<(String, SystemRunStats)>,
    /// Deferred structural changes applied when the frame closed
    pub flushed: usize,
}

impl FrameReport {
    /// Total entity failures across every system
    pub fn failures(&self) -> usize {
        self.systems.iter().map(|(_, stats)| stats.failed).sum()
    }
}

/// Staged system scheduler
///
/// # Examples
///
/// ```
/// use platformer_core::ecs::scheduler::{Scheduler, stages};
/// use platformer_core::ecs::{ComponentMask, Entity, FrameContext, System, World};
/// use platformer_core::controller::ButtonStates;
/// use platformer_core::CoreError;
///
/// struct Noop;
/// impl System for Noop {
///     fn mask(&self) -> ComponentMask { ComponentMask::empty() }
///     fn process_entity(&mut self, _: &mut World, _: Entity, _: &FrameContext<'_>) -> Result<(), CoreError> {
///         Ok(())
///     }
/// }
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(Noop, stages::UPDATE);
/// let mut world = World::new();
/// let input = ButtonStates::new();
/// scheduler.run_frame(&mut world, &FrameContext::new(0.016, 0, &input));
/// ```
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Scheduler {
            systems: Vec::new(),
        }
    }

    /// Add a system to a specific stage
    pub fn add_system<S: System + 'static>(&mut self, system: S, stage: StageId) {
        self.add_boxed(Box::new(system), stage);
    }

    /// Add an already boxed system to a specific stage
    pub fn add_boxed(&mut self, system: Box<dyn System>, stage: StageId) {
        self.systems.push(ScheduledSystem { system, stage });
        // Stable sort keeps registration order inside a stage
        self.systems.sort_by_key(|s| s.stage);
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Get the number of stages in use
    pub fn stage_count(&self) -> usize {
        self.systems
            .iter()
            .map(|s| s.stage.0)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Names of the registered systems in execution order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Run one frame: every stage in order, then flush deferred changes
    pub fn run_frame(&mut self, world: &mut World, frame: &FrameContext<'_>) -> FrameReport {
        trace!(frame = frame.frame, delta = frame.delta, "frame_begin");
        world.begin_frame();

        let mut report = FrameReport::default();
        for scheduled in &mut self.systems {
            let stats = run_system(scheduled.system.as_mut(), world, frame);
            report.systems.push((scheduled.system.name().to_string(), stats));
        }

        report.flushed = world.end_frame();
        report
    }

    /// Clear all systems from the scheduler
    pub fn clear(&mut self) {
        self.systems.clear();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ButtonStates;
    use crate::ecs::{ComponentMask, Entity};
    use crate::error::CoreError;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct TestSystem {
        name: String,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl TestSystem {
        fn new(name: &str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            TestSystem {
                name: name.to_string(),
                log: Rc::clone(log),
            }
        }
    }

    impl System for TestSystem {
        fn name(&self) -> &str {
            &self.name
        }

        fn mask(&self) -> ComponentMask {
            ComponentMask::empty()
        }

        fn pre_process(&mut self, _world: &mut World, _frame: &FrameContext<'_>) {
            self.log.borrow_mut().push(self.name.clone());
        }

        fn process_entity(
            &mut self,
            _world: &mut World,
            _entity: Entity,
            _frame: &FrameContext<'_>,
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn run(scheduler: &mut Scheduler, world: &mut World) -> FrameReport {
        let input = ButtonStates::new();
        scheduler.run_frame(world, &FrameContext::new(0.016, 0, &input))
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.system_count(), 0);
        assert_eq!(scheduler.stage_count(), 0);
    }

    #[test]
    fn test_stage_ordering() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.add_system(TestSystem::new("physics", &log), stages::PHYSICS);
        scheduler.add_system(TestSystem::new("input", &log), stages::INPUT);
        scheduler.add_system(TestSystem::new("behavior", &log), stages::BEHAVIOR);
        scheduler.add_system(TestSystem::new("input_late", &log), stages::INPUT);

        let mut world = World::new();
        run(&mut scheduler, &mut world);

        assert_eq!(*log.borrow(), vec!["input", "input_late", "behavior", "physics"]);
        assert_eq!(scheduler.stage_count(), 4);
    }

    #[test]
    fn test_frame_closes_world() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.add_system(TestSystem::new("only", &log), stages::UPDATE);

        let mut world = World::new();
        world.create_entity();
        let report = run(&mut scheduler, &mut world);

        assert!(!world.is_frame_open());
        assert_eq!(report.systems.len(), 1);
        assert_eq!(report.systems[0].1.processed, 1);
        assert_eq!(report.failures(), 0);
    }

    #[test]
    fn test_empty_scheduler() {
        let mut scheduler = Scheduler::new();
        let mut world = World::new();
        let report = run(&mut scheduler, &mut world);
        assert!(report.systems.is_empty());
    }

    #[test]
    fn test_clear_scheduler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.add_system(TestSystem::new("test", &log), stages::UPDATE);
        assert_eq!(scheduler.system_count(), 1);

        scheduler.clear();
        assert_eq!(scheduler.system_count(), 0);
    }
}
