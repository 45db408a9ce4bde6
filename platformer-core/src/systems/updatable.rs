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
//! Free-form per-entity update closures
//!
//! Used for entity logic that does not fit the behavior model: ticking a
//! timer, firing a periodic impulse, requesting a sound on a schedule.

use crate::ecs::components::SoundComponent;
use crate::ecs::{ComponentKind, ComponentMask, ComponentStorage, Entity, FrameContext, System, World};
use crate::error::CoreError;
use crate::physics::BodyComponent;
use std::fmt;

/// What an update closure may touch
pub struct UpdateContext<'a> {
    entity: Entity,
    delta: f32,
    body: Option<&'a mut BodyComponent>,
    sounds: Option<&'a mut SoundComponent>,
    destroy_requested: bool,
}

impl<'a> UpdateContext<'a> {
    /// Entity being updated
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Frame delta in seconds
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// The entity's body
    pub fn body(&mut self) -> Result<&mut BodyComponent, CoreError> {
        let entity = self.entity;
        self.body
            .as_deref_mut()
            .ok_or(CoreError::missing(entity, ComponentKind::Body))
    }

    /// The entity's sound queue
    pub fn sounds(&mut self) -> Result<&mut SoundComponent, CoreError> {
        let entity = self.entity;
        self.sounds
            .as_deref_mut()
            .ok_or(CoreError::missing(entity, ComponentKind::Sound))
    }

    /// Destroy the entity when the frame closes
    pub fn destroy(&mut self) {
        self.destroy_requested = true;
    }
}

type UpdateFn = Box<dyn FnMut(&mut UpdateContext<'_>) -> Result<(), CoreError>>;

/// Per-entity update closure run once per frame
pub struct UpdatableComponent {
    update: UpdateFn,
}

impl UpdatableComponent {
    /// Wrap an update closure
    pub fn new(update: impl FnMut(&mut UpdateContext<'_>) -> Result<(), CoreError> + 'static) -> Self {
        UpdatableComponent {
            update: Box::new(update),
        }
    }
}

impl fmt::Debug for UpdatableComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpdatableComponent(..)")
    }
}

/// Runs every [`UpdatableComponent`]
#[derive(Debug, Default)]
pub struct UpdatableSystem;

impl System for UpdatableSystem {
    fn name(&self) -> &str {
        "updatable"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::empty().with(ComponentKind::Updatable)
    }

    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        frame: &FrameContext<'_>,
    ) -> Result<(), CoreError> {
        let storages = world.storages_mut();
        let updatable = storages
            .updatables
            .get_mut(entity)
            .ok_or(CoreError::missing(entity, ComponentKind::Updatable))?;
        let mut ctx = UpdateContext {
            entity,
            delta: frame.delta,
            body: storages.bodies.get_mut(entity),
            sounds: storages.sounds.get_mut(entity),
            destroy_requested: false,
        };
        let result = (updatable.update)(&mut ctx);
        let destroy = ctx.destroy_requested;
        if destroy {
            world.destroy_entity(entity);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ButtonStates;
    use crate::ecs::system::run_system;
    use crate::timer::Timer;
    use glam::Vec2;

    #[test]
    fn test_update_closure_drives_body() {
        let mut world = World::new();
        let mut timer = Timer::new(0.05).unwrap();
        let entity = world
            .spawn()
            .with(BodyComponent::dynamic())
            .with(UpdatableComponent::new(move |ctx| {
                if timer.update(ctx.delta()) {
                    ctx.body()?.apply_impulse(Vec2::new(0.0, 1.0));
                    timer.reset();
                }
                Ok(())
            }))
            .id();

        let input = ButtonStates::new();
        let mut system = UpdatableSystem;
        for frame in 0..6 {
            run_system(&mut system, &mut world, &FrameContext::new(0.02, frame, &input));
        }
        // fires on frames 3 and 6
        assert_eq!(world.get::<BodyComponent>(entity).unwrap().velocity().y, 2.0);
    }

    #[test]
    fn test_update_may_destroy_entity() {
        let mut world = World::new();
        let entity = world
            .spawn()
            .with(UpdatableComponent::new(|ctx| {
                ctx.destroy();
                Ok(())
            }))
            .id();
        let input = ButtonStates::new();
        run_system(&mut UpdatableSystem, &mut world, &FrameContext::new(0.016, 0, &input));
        assert!(!world.is_entity_alive(entity));
    }
}
