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
//! World management
//!
//! The World owns every entity and every component. Structural changes made
//! while a frame is open (between [`World::begin_frame`] and
//! [`World::end_frame`]) are queued and applied in call order when the frame
//! closes, so a system pass never observes an entity gaining or losing
//! components halfway through.

use crate::ecs::component::{PendingComponent, Storages};
use crate::ecs::{Component, ComponentKind, ComponentMask, ComponentStorage, Entity};
use crate::error::CoreError;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

enum PendingOp {
    Insert(Entity, PendingComponent),
    Remove(Entity, ComponentKind),
    Destroy(Entity),
}

/// The main ECS world container
pub struct World {
    next_entity_id: u64,
    entity_generations: Vec<u32>,
    alive_entities: BTreeMap<Entity, ComponentMask>,
    storages: Storages,
    pending: Vec<PendingOp>,
    pending_destroy: HashSet<Entity>,
    frame_open: bool,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        World {
            next_entity_id: 0,
            entity_generations: Vec::new(),
            alive_entities: BTreeMap::new(),
            storages: Storages::default(),
            pending: Vec::new(),
            pending_destroy: HashSet::new(),
            frame_open: false,
        }
    }

    /// Create a new entity with no components
    pub fn create_entity(&mut self) -> Entity {
        let id = self.next_entity_id;
        self.next_entity_id += 1;

        // Extend generations vector if needed
        if id as usize >= self.entity_generations.len() {
            self.entity_generations.resize(id as usize + 1, 0);
        }

        let generation = self.entity_generations[id as usize];
        let entity = Entity::new(id, generation);
        self.alive_entities.insert(entity, ComponentMask::empty());

        entity
    }

    /// Create an entity and attach components through a builder
    ///
    /// ```
    /// use platformer_core::ecs::World;
    /// use platformer_core::ecs::components::{Facing, SoundComponent};
    ///
    /// let mut world = World::new();
    /// let entity = world.spawn().with(Facing::Left).with(SoundComponent::new()).id();
    /// assert!(world.has::<Facing>(entity));
    /// ```
    pub fn spawn(&mut self) -> EntityBuilder<'_> {
        let entity = self.create_entity();
        EntityBuilder { world: self, entity }
    }

    /// Attach a component, replacing any component of the same kind
    ///
    /// Deferred to the end of the frame when a frame is open.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), CoreError> {
        if !self.alive_entities.contains_key(&entity) {
            return Err(CoreError::DeadEntity(entity));
        }
        self.insert_pending(entity, component.into_pending());
        Ok(())
    }

    fn insert_pending(&mut self, entity: Entity, component: PendingComponent) {
        if self.frame_open {
            debug!(entity = %entity, kind = ?component.kind(), "component_insert_deferred");
            self.pending.push(PendingOp::Insert(entity, component));
        } else {
            self.attach_now(entity, component);
        }
    }

    fn attach_now(&mut self, entity: Entity, component: PendingComponent) {
        if let Some(mask) = self.alive_entities.get_mut(&entity) {
            mask.insert(component.kind());
            component.attach(entity, &mut self.storages);
        }
    }

    /// Detach the component of type `T`
    ///
    /// Deferred to the end of the frame when a frame is open.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<(), CoreError> {
        if !self.alive_entities.contains_key(&entity) {
            return Err(CoreError::DeadEntity(entity));
        }
        if self.frame_open {
            debug!(entity = %entity, kind = ?T::KIND, "component_remove_deferred");
            self.pending.push(PendingOp::Remove(entity, T::KIND));
        } else {
            self.detach_now(entity, T::KIND);
        }
        Ok(())
    }

    fn detach_now(&mut self, entity: Entity, kind: ComponentKind) {
        if let Some(mask) = self.alive_entities.get_mut(&entity) {
            mask.remove(kind);
            self.storages.remove(kind, entity);
        }
    }

    /// Destroy an entity and every component attached to it
    ///
    /// While a frame is open the entity stays alive until the frame closes,
    /// but system passes started after this call skip it.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.alive_entities.contains_key(&entity) {
            return false;
        }
        if self.frame_open {
            if self.pending_destroy.insert(entity) {
                debug!(entity = %entity, "entity_destroy_deferred");
                self.pending.push(PendingOp::Destroy(entity));
            }
            true
        } else {
            self.destroy_now(entity)
        }
    }

    fn destroy_now(&mut self, entity: Entity) -> bool {
        let Some(mask) = self.alive_entities.remove(&entity) else {
            return false;
        };
        for kind in mask.iter() {
            self.storages.remove(kind, entity);
        }
        // Increment generation for this entity ID
        let id = entity.id().raw() as usize;
        if id < self.entity_generations.len() {
            self.entity_generations[id] = self.entity_generations[id].wrapping_add(1);
        }
        true
    }

    /// Check if an entity is alive
    pub fn is_entity_alive(&self, entity: Entity) -> bool {
        self.alive_entities.contains_key(&entity)
    }

    /// Check if an entity is queued for destruction at the end of this frame
    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.pending_destroy.contains(&entity)
    }

    /// Components currently attached to `entity`
    pub fn mask_of(&self, entity: Entity) -> Option<ComponentMask> {
        self.alive_entities.get(&entity).copied()
    }

    /// Check whether `entity` carries a component of type `T`
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.mask_of(entity).is_some_and(|mask| mask.contains(T::KIND))
    }

    /// Borrow a component
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        T::storage(&self.storages).get(entity)
    }

    /// Mutably borrow a component
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        T::storage_mut(&mut self.storages).get_mut(entity)
    }

    /// Borrow a component that the caller's mask guarantees is present
    pub fn require<T: Component>(&self, entity: Entity) -> Result<&T, CoreError> {
        self.get(entity).ok_or(CoreError::missing(entity, T::KIND))
    }

    /// Mutably borrow a component that the caller's mask guarantees is present
    pub fn require_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, CoreError> {
        self.get_mut(entity).ok_or(CoreError::missing(entity, T::KIND))
    }

    /// Snapshot of live entities whose component set covers `mask`, in
    /// ascending entity order
    pub fn entities_matching(&self, mask: ComponentMask) -> Vec<Entity> {
        self.alive_entities
            .iter()
            .filter(|(_, carried)| carried.is_superset_of(mask))
            .map(|(entity, _)| *entity)
            .collect()
    }

    /// Get the number of alive entities
    pub fn entity_count(&self) -> usize {
        self.alive_entities.len()
    }

    /// Get an iterator over all alive entities in ascending order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.alive_entities.keys()
    }

    /// Start deferring structural changes
    pub fn begin_frame(&mut self) {
        if self.frame_open {
            warn!("frame_already_open");
        }
        self.frame_open = true;
    }

    /// Stop deferring and apply every queued change in call order
    ///
    /// Returns the number of queued operations that were applied.
    pub fn end_frame(&mut self) -> usize {
        self.frame_open = false;
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for op in pending {
            match op {
                PendingOp::Insert(entity, component) => self.attach_now(entity, component),
                PendingOp::Remove(entity, kind) => self.detach_now(entity, kind),
                PendingOp::Destroy(entity) => {
                    self.destroy_now(entity);
                }
            }
        }
        self.pending_destroy.clear();
        if count > 0 {
            debug!(applied = count, "deferred_changes_flushed");
        }
        count
    }

    /// Whether structural changes are currently being deferred
    pub fn is_frame_open(&self) -> bool {
        self.frame_open
    }

    /// Clear all entities
    ///
    /// Ids are handed out from zero again, but every generation is bumped so
    /// handles from before the clear stay dead.
    pub fn clear(&mut self) {
        self.alive_entities.clear();
        for generation in &mut self.entity_generations {
            *generation = generation.wrapping_add(1);
        }
        self.storages.clear();
        self.pending.clear();
        self.pending_destroy.clear();
        self.next_entity_id = 0;
    }

    pub(crate) fn storages(&self) -> &Storages {
        &self.storages
    }

    pub(crate) fn storages_mut(&mut self) -> &mut Storages {
        &mut self.storages
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder returned by [`World::spawn`]
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl EntityBuilder<'_> {
    /// Attach a component
    pub fn with<T: Component>(self, component: T) -> Self {
        self.world.insert_pending(self.entity, component.into_pending());
        self
    }

    /// Finish building and return the entity handle
    pub fn id(self) -> Entity {
        self.entity
    }
}
