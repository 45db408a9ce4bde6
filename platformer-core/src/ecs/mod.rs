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
//! Entity Component System (ECS) core implementation
//!
//! This module provides the foundational ECS architecture including:
//! - Generational entity handles
//! - A closed set of component storages selected by bitmask
//! - Deferred structural changes while a frame is running
//! - Staged system scheduling

mod component;
pub mod components;
mod entity;
pub mod scheduler;
pub mod system;
mod world;

pub use component::{
    Component, ComponentKind, ComponentMask, ComponentStorage, HashMapStorage, PendingComponent, Storages,
};
pub use entity::{Entity, EntityId};
pub use system::{run_system, FrameContext, System, SystemRunStats};
pub use world::{EntityBuilder, World};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Facing;

    #[test]
    fn test_world_creation() {
        let world = World::new();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_entity_creation() {
        let mut world = World::new();
        let entity = world.create_entity();
        assert_eq!(world.entity_count(), 1);
        assert!(world.is_entity_alive(entity));
        assert_eq!(world.mask_of(entity), Some(ComponentMask::empty()));
    }

    #[test]
    fn test_mask_selects_entities() {
        let mut world = World::new();
        let facing = world.spawn().with(Facing::Left).id();
        world.create_entity();
        assert_eq!(world.entities_matching(ComponentMask::of(&[ComponentKind::Facing])), vec![facing]);
    }
}
