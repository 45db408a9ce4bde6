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
//! Destroying entities that stay outside the visible region
//!
//! The region usually tracks the game camera, which lives outside the core.
//! It is shared through a [`CullBounds`] handle so the owner of the camera
//! can move it between frames.

use crate::ecs::{ComponentKind, ComponentMask, Entity, FrameContext, System, World};
use crate::error::CoreError;
use crate::physics::{BodyComponent, Rect};
use crate::timer::Timer;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// Shared, movable culling region
#[derive(Debug, Clone, Default)]
pub struct CullBounds(Rc<Cell<Option<Rect>>>);

impl CullBounds {
    /// Create a handle, optionally with an initial region
    pub fn new(bounds: Option<Rect>) -> Self {
        CullBounds(Rc::new(Cell::new(bounds)))
    }

    /// Current region; `None` disables culling
    pub fn get(&self) -> Option<Rect> {
        self.0.get()
    }

    /// Move the region
    pub fn set(&self, bounds: Rect) {
        self.0.set(Some(bounds));
    }

    /// Disable culling
    pub fn clear(&self) {
        self.0.set(None);
    }
}

/// Destroys the entity after it has been out of bounds for a while
#[derive(Debug)]
pub struct CullComponent {
    timer: Timer,
}

impl CullComponent {
    /// Cull after `delay` seconds continuously out of bounds
    pub fn new(delay: f32) -> Result<Self, CoreError> {
        Ok(CullComponent {
            timer: Timer::new(delay)?,
        })
    }

    /// Seconds spent out of bounds so far
    pub fn time_out_of_bounds(&self) -> f32 {
        self.timer.time()
    }
}

/// Culls bodies outside the shared bounds
#[derive(Debug, Default)]
pub struct CullSystem {
    bounds: CullBounds,
}

impl CullSystem {
    /// Create a system reading `bounds`
    pub fn new(bounds: CullBounds) -> Self {
        CullSystem { bounds }
    }

    /// Handle to the region this system reads
    pub fn bounds(&self) -> CullBounds {
        self.bounds.clone()
    }
}

impl System for CullSystem {
    fn name(&self) -> &str {
        "cull"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::of(&[ComponentKind::Cull, ComponentKind::Body])
    }

    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        frame: &FrameContext<'_>,
    ) -> Result<(), CoreError> {
        let Some(bounds) = self.bounds.get() else {
            return Ok(());
        };
        let inside = world.require::<BodyComponent>(entity)?.collision_box().overlaps(&bounds);
        let cull = world.require_mut::<CullComponent>(entity)?;
        if inside {
            cull.timer.reset();
        } else if cull.timer.update(frame.delta) {
            debug!(entity = %entity, "entity_culled");
            world.destroy_entity(entity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ButtonStates;
    use crate::ecs::system::run_system;

    #[test]
    fn test_cull_after_delay_out_of_bounds() {
        let mut world = World::new();
        let entity = world
            .spawn()
            .with(BodyComponent::dynamic().with_size(1.0, 1.0).with_position(50.0, 0.0))
            .with(CullComponent::new(0.5).unwrap())
            .id();
        let bounds = CullBounds::new(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let mut system = CullSystem::new(bounds.clone());
        let input = ButtonStates::new();

        run_system(&mut system, &mut world, &FrameContext::new(0.3, 0, &input));
        assert!(world.is_entity_alive(entity));
        assert!((world.get::<CullComponent>(entity).unwrap().time_out_of_bounds() - 0.3).abs() < 1e-6);

        // back in view resets the clock
        bounds.set(Rect::new(40.0, 0.0, 20.0, 10.0));
        run_system(&mut system, &mut world, &FrameContext::new(0.3, 1, &input));
        assert_eq!(world.get::<CullComponent>(entity).unwrap().time_out_of_bounds(), 0.0);

        bounds.set(Rect::new(0.0, 0.0, 10.0, 10.0));
        run_system(&mut system, &mut world, &FrameContext::new(0.3, 2, &input));
        run_system(&mut system, &mut world, &FrameContext::new(0.3, 3, &input));
        assert!(!world.is_entity_alive(entity));
    }

    #[test]
    fn test_no_bounds_never_culls() {
        let mut world = World::new();
        let entity = world
            .spawn()
            .with(BodyComponent::dynamic().with_position(1e6, 1e6))
            .with(CullComponent::new(0.0).unwrap())
            .id();
        let input = ButtonStates::new();
        run_system(&mut CullSystem::default(), &mut world, &FrameContext::new(1.0, 0, &input));
        assert!(world.is_entity_alive(entity));
    }
}
