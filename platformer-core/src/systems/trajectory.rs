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
//! Scripted looping movement

use crate::ecs::{ComponentKind, ComponentMask, Entity, FrameContext, System, World};
use crate::error::CoreError;
use crate::physics::BodyComponent;
use crate::timer::Timer;
use glam::Vec2;

/// Looping list of `(velocity, duration)` segments
#[derive(Debug)]
pub struct TrajectoryComponent {
    segments: Vec<Vec2>,
    durations: Vec<Timer>,
    index: usize,
}

impl TrajectoryComponent {
    /// Build a trajectory; every duration must be finite and non-negative
    pub fn new(segments: &[(Vec2, f32)]) -> Result<Self, CoreError> {
        let durations = segments
            .iter()
            .map(|(_, duration)| Timer::new(*duration))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TrajectoryComponent {
            segments: segments.iter().map(|(velocity, _)| *velocity).collect(),
            durations,
            index: 0,
        })
    }

    /// Index of the running segment
    pub fn current_segment(&self) -> usize {
        self.index
    }

    /// Velocity of the running segment, if any
    pub fn current_velocity(&self) -> Option<Vec2> {
        self.segments.get(self.index).copied()
    }

    /// Advance the running segment's clock, moving on when it finishes
    pub fn update(&mut self, delta: f32) {
        let Some(timer) = self.durations.get_mut(self.index) else {
            return;
        };
        if timer.update(delta) {
            timer.reset();
            self.index = (self.index + 1) % self.durations.len();
        }
    }
}

/// Sets each body's velocity from its trajectory
#[derive(Debug, Default)]
pub struct TrajectorySystem;

impl System for TrajectorySystem {
    fn name(&self) -> &str {
        "trajectory"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::of(&[ComponentKind::Trajectory, ComponentKind::Body])
    }

    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        frame: &FrameContext<'_>,
    ) -> Result<(), CoreError> {
        let trajectory = world.require_mut::<TrajectoryComponent>(entity)?;
        let Some(velocity) = trajectory.current_velocity() else {
            return Ok(());
        };
        // the running segment's velocity covers the frame that finishes it
        trajectory.update(frame.delta);
        world.require_mut::<BodyComponent>(entity)?.set_velocity(velocity);
        Ok(())
    }
}
