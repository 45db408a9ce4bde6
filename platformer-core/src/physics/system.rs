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
//! The per-frame collision world system
//!
//! Per entity: run the pre-process hook, then integrate. After every body
//! has moved, the post-pass resolves fixture contacts across all bodies.

use crate::behavior::{BehaviorComponent, BehaviorSet};
use crate::ecs::{ComponentKind, ComponentMask, Entity, FrameContext, System, World};
use crate::error::CoreError;
use crate::physics::collision::{CollisionWorld, DamageEvent};
use crate::physics::{BodyComponent, BodyType};
use crate::pool::PoolConfig;

/// Integrates bodies and resolves their contacts
#[derive(Debug, Default)]
pub struct WorldSystem {
    collisions: CollisionWorld,
}

impl WorldSystem {
    /// Create a world system with default pooling
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world system with custom pooling
    pub fn with_pool_config(config: PoolConfig) -> Self {
        WorldSystem {
            collisions: CollisionWorld::with_pool_config(config),
        }
    }

    /// Contact state carried between frames
    pub fn collisions(&self) -> &CollisionWorld {
        &self.collisions
    }

    /// Damage dealt during the last frame
    pub fn damage_events(&self) -> &[DamageEvent] {
        self.collisions.damage_events()
    }
}

impl System for WorldSystem {
    fn name(&self) -> &str {
        "world"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::empty().with(ComponentKind::Body)
    }

    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        frame: &FrameContext<'_>,
    ) -> Result<(), CoreError> {
        let behaviors = world
            .get::<BehaviorComponent>(entity)
            .map(BehaviorComponent::active_kinds)
            .unwrap_or_else(BehaviorSet::empty);
        let body = world.require_mut::<BodyComponent>(entity)?;
        if body.body_type() == BodyType::Dynamic {
            body.run_pre_process(behaviors, frame.delta);
        }
        body.integrate(frame.delta);
        Ok(())
    }

    fn post_process(&mut self, world: &mut World, _frame: &FrameContext<'_>) {
        self.collisions.resolve(world);
    }
}
