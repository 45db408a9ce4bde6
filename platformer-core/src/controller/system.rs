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

use crate::behavior::BehaviorComponent;
use crate::controller::AdapterContext;
use crate::ecs::{ComponentKind, ComponentMask, ComponentStorage, Entity, FrameContext, System, World};
use crate::error::CoreError;

/// Dispatches polled input to every entity's controller adapters
#[derive(Debug, Default)]
pub struct ControllerSystem;

impl ControllerSystem {
    /// Create the system
    pub fn new() -> Self {
        ControllerSystem
    }
}

impl System for ControllerSystem {
    fn name(&self) -> &str {
        "controller"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::empty().with(ComponentKind::Controller)
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
            .get(entity)
            .map(BehaviorComponent::active_kinds)
            .unwrap_or_default();
        let controller = storages
            .controllers
            .get_mut(entity)
            .ok_or(CoreError::missing(entity, ComponentKind::Controller))?;

        let mut ctx = AdapterContext::new(entity, frame.delta, frame.input).with_behaviors(behaviors);
        if let Some(body) = storages.bodies.get_mut(entity) {
            ctx = ctx.with_body(body);
        }
        if let Some(facing) = storages.facings.get_mut(entity) {
            ctx = ctx.with_facing(facing);
        }
        controller.dispatch(&mut ctx)
    }
}
