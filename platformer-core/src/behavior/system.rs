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

use crate::behavior::BehaviorContext;
use crate::ecs::{ComponentKind, ComponentMask, ComponentStorage, Entity, FrameContext, System, World};
use crate::error::CoreError;

/// Evaluates every entity's behaviors once per frame
#[derive(Debug, Default)]
pub struct BehaviorSystem;

impl BehaviorSystem {
    /// Create the system
    pub fn new() -> Self {
        BehaviorSystem
    }
}

impl System for BehaviorSystem {
    fn name(&self) -> &str {
        "behavior"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::empty().with(ComponentKind::Behavior)
    }

    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        frame: &FrameContext<'_>,
    ) -> Result<(), CoreError> {
        let storages = world.storages_mut();
        let behaviors = storages
            .behaviors
            .get_mut(entity)
            .ok_or(CoreError::missing(entity, ComponentKind::Behavior))?;

        let mut ctx = BehaviorContext::new(entity, frame.delta, frame.input);
        if let Some(body) = storages.bodies.get_mut(entity) {
            ctx = ctx.with_body(body);
        }
        if let Some(facing) = storages.facings.get_mut(entity) {
            ctx = ctx.with_facing(facing);
        }
        if let Some(sounds) = storages.sounds.get_mut(entity) {
            ctx = ctx.with_sounds(sounds);
        }
        behaviors.update(&mut ctx)
    }
}
