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
//! Component storage and management
//!
//! The set of component types is closed and known at compile time. Each type
//! has a [`ComponentKind`] tag and its own storage inside [`Storages`], so a
//! lookup is a field access plus a hash map get rather than a runtime type
//! query, and an entity can never carry two components of the same kind.

use crate::behavior::BehaviorComponent;
use crate::controller::ControllerComponent;
use crate::ecs::components::{Facing, SoundComponent};
use crate::ecs::Entity;
use crate::physics::BodyComponent;
use crate::systems::{
    CullComponent, DebugMessageComponent, PendulumComponent, TrajectoryComponent, UpdatableComponent,
};
use std::collections::HashMap;
use std::fmt;

/// Tag identifying one of the core component types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    /// [`BodyComponent`]
    Body,
    /// [`BehaviorComponent`]
    Behavior,
    /// [`ControllerComponent`]
    Controller,
    /// [`UpdatableComponent`]
    Updatable,
    /// [`TrajectoryComponent`]
    Trajectory,
    /// [`PendulumComponent`]
    Pendulum,
    /// [`CullComponent`]
    Cull,
    /// [`DebugMessageComponent`]
    DebugMessage,
    /// [`SoundComponent`]
    Sound,
    /// [`Facing`]
    Facing,
}

impl ComponentKind {
    /// Every kind, in declaration order
    pub const ALL: [ComponentKind; 10] = [
        ComponentKind::Body,
        ComponentKind::Behavior,
        ComponentKind::Controller,
        ComponentKind::Updatable,
        ComponentKind::Trajectory,
        ComponentKind::Pendulum,
        ComponentKind::Cull,
        ComponentKind::DebugMessage,
        ComponentKind::Sound,
        ComponentKind::Facing,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of component kinds
///
/// Used both as the per-entity record of attached components and as the
/// required-component mask a [`System`](crate::ecs::System) declares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentMask(u16);

impl ComponentMask {
    /// The empty mask (matches every entity)
    pub const fn empty() -> Self {
        ComponentMask(0)
    }

    /// Build a mask from a list of kinds
    pub fn of(kinds: &[ComponentKind]) -> Self {
        kinds.iter().fold(Self::empty(), |mask, kind| mask.with(*kind))
    }

    /// Return a copy with `kind` added
    pub fn with(mut self, kind: ComponentKind) -> Self {
        self.insert(kind);
        self
    }

    /// Add a kind
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    /// Remove a kind
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    /// Check membership
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// True if every kind in `required` is also in `self`
    pub fn is_superset_of(&self, required: ComponentMask) -> bool {
        self.0 & required.0 == required.0
    }

    /// True if no kind is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the kinds in declaration order
    pub fn iter(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        ComponentKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Trait implemented by every core component type
///
/// The storage accessors are static so typed lookups resolve at compile
/// time. The set of implementors is closed: [`Storages`] has exactly one
/// field per [`ComponentKind`].
pub trait Component: Sized + 'static {
    /// The kind tag of this component type
    const KIND: ComponentKind;

    /// Storage holding every component of this type
    fn storage(storages: &Storages) -> &HashMapStorage<Self>;

    /// Mutable storage holding every component of this type
    fn storage_mut(storages: &mut Storages) -> &mut HashMapStorage<Self>;

    /// Box this component for a deferred insert
    fn into_pending(self) -> PendingComponent;

    /// Called when the component is attached to `entity`
    fn on_attach(&mut self, _entity: Entity) {}
}

/// Storage interface for components
pub trait ComponentStorage {
    /// The component type this storage manages
    type Component;

    /// Insert a component for the given entity, returning any replaced value
    fn insert(&mut self, entity: Entity, component: Self::Component) -> Option<Self::Component>;

    /// Remove a component for the given entity
    fn remove(&mut self, entity: Entity) -> Option<Self::Component>;

    /// Get a reference to a component for the given entity
    fn get(&self, entity: Entity) -> Option<&Self::Component>;

    /// Get a mutable reference to a component for the given entity
    fn get_mut(&mut self, entity: Entity) -> Option<&mut Self::Component>;

    /// Check if an entity has this component
    fn contains(&self, entity: Entity) -> bool;

    /// Number of stored components
    fn len(&self) -> usize;

    /// Check if the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all components
    fn clear(&mut self);
}

/// Simple HashMap-based component storage
pub struct HashMapStorage<T> {
    components: HashMap<Entity, T>,
}

impl<T> HashMapStorage<T> {
    /// Create a new empty storage
    pub fn new() -> Self {
        HashMapStorage {
            components: HashMap::new(),
        }
    }

    /// Iterate every (entity, component) pair in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&Entity, &T)> {
        self.components.iter()
    }
}

impl<T> Default for HashMapStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComponentStorage for HashMapStorage<T> {
    type Component = T;

    fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.components.insert(entity, component)
    }

    fn remove(&mut self, entity: Entity) -> Option<T> {
        self.components.remove(&entity)
    }

    fn get(&self, entity: Entity) -> Option<&T> {
        self.components.get(&entity)
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut(&entity)
    }

    fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn clear(&mut self) {
        self.components.clear();
    }
}

/// One storage per component kind
///
/// Fields are crate-visible so systems can borrow several storages of the
/// same entity at once (for example its behaviors mutably and its body
/// mutably) without going through the typed accessors.
#[derive(Default)]
pub struct Storages {
    pub(crate) bodies: HashMapStorage<BodyComponent>,
    pub(crate) behaviors: HashMapStorage<BehaviorComponent>,
    pub(crate) controllers: HashMapStorage<ControllerComponent>,
    pub(crate) updatables: HashMapStorage<UpdatableComponent>,
    pub(crate) trajectories: HashMapStorage<TrajectoryComponent>,
    pub(crate) pendulums: HashMapStorage<PendulumComponent>,
    pub(crate) culls: HashMapStorage<CullComponent>,
    pub(crate) debug_messages: HashMapStorage<DebugMessageComponent>,
    pub(crate) sounds: HashMapStorage<SoundComponent>,
    pub(crate) facings: HashMapStorage<Facing>,
}

impl Storages {
    /// Drop the component of `kind` attached to `entity`, if any
    pub(crate) fn remove(&mut self, kind: ComponentKind, entity: Entity) -> bool {
        match kind {
            ComponentKind::Body => self.bodies.remove(entity).is_some(),
            ComponentKind::Behavior => self.behaviors.remove(entity).is_some(),
            ComponentKind::Controller => self.controllers.remove(entity).is_some(),
            ComponentKind::Updatable => self.updatables.remove(entity).is_some(),
            ComponentKind::Trajectory => self.trajectories.remove(entity).is_some(),
            ComponentKind::Pendulum => self.pendulums.remove(entity).is_some(),
            ComponentKind::Cull => self.culls.remove(entity).is_some(),
            ComponentKind::DebugMessage => self.debug_messages.remove(entity).is_some(),
            ComponentKind::Sound => self.sounds.remove(entity).is_some(),
            ComponentKind::Facing => self.facings.remove(entity).is_some(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.bodies.clear();
        self.behaviors.clear();
        self.controllers.clear();
        self.updatables.clear();
        self.trajectories.clear();
        self.pendulums.clear();
        self.culls.clear();
        self.debug_messages.clear();
        self.sounds.clear();
        self.facings.clear();
    }
}

/// A component boxed for a deferred insert
pub enum PendingComponent {
    /// See [`BodyComponent`]
    Body(BodyComponent),
    /// See [`BehaviorComponent`]
    Behavior(BehaviorComponent),
    /// See [`ControllerComponent`]
    Controller(ControllerComponent),
    /// See [`UpdatableComponent`]
    Updatable(UpdatableComponent),
    /// See [`TrajectoryComponent`]
    Trajectory(TrajectoryComponent),
    /// See [`PendulumComponent`]
    Pendulum(PendulumComponent),
    /// See [`CullComponent`]
    Cull(CullComponent),
    /// See [`DebugMessageComponent`]
    DebugMessage(DebugMessageComponent),
    /// See [`SoundComponent`]
    Sound(SoundComponent),
    /// See [`Facing`]
    Facing(Facing),
}

impl PendingComponent {
    /// Kind of the boxed component
    pub fn kind(&self) -> ComponentKind {
        match self {
            PendingComponent::Body(_) => ComponentKind::Body,
            PendingComponent::Behavior(_) => ComponentKind::Behavior,
            PendingComponent::Controller(_) => ComponentKind::Controller,
            PendingComponent::Updatable(_) => ComponentKind::Updatable,
            PendingComponent::Trajectory(_) => ComponentKind::Trajectory,
            PendingComponent::Pendulum(_) => ComponentKind::Pendulum,
            PendingComponent::Cull(_) => ComponentKind::Cull,
            PendingComponent::DebugMessage(_) => ComponentKind::DebugMessage,
            PendingComponent::Sound(_) => ComponentKind::Sound,
            PendingComponent::Facing(_) => ComponentKind::Facing,
        }
    }

    pub(crate) fn attach(self, entity: Entity, storages: &mut Storages) {
        fn put<T: Component>(mut component: T, entity: Entity, storages: &mut Storages) {
            component.on_attach(entity);
            T::storage_mut(storages).insert(entity, component);
        }
        match self {
            PendingComponent::Body(c) => put(c, entity, storages),
            PendingComponent::Behavior(c) => put(c, entity, storages),
            PendingComponent::Controller(c) => put(c, entity, storages),
            PendingComponent::Updatable(c) => put(c, entity, storages),
            PendingComponent::Trajectory(c) => put(c, entity, storages),
            PendingComponent::Pendulum(c) => put(c, entity, storages),
            PendingComponent::Cull(c) => put(c, entity, storages),
            PendingComponent::DebugMessage(c) => put(c, entity, storages),
            PendingComponent::Sound(c) => put(c, entity, storages),
            PendingComponent::Facing(c) => put(c, entity, storages),
        }
    }
}

macro_rules! impl_component {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl_component!($ty, $kind, $field, |_component, _entity| {});
    };
    ($ty:ty, $kind:ident, $field:ident, |$component:ident, $entity:ident| $attach:block) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;

            fn storage(storages: &Storages) -> &HashMapStorage<Self> {
                &storages.$field
            }

            fn storage_mut(storages: &mut Storages) -> &mut HashMapStorage<Self> {
                &mut storages.$field
            }

            fn into_pending(self) -> PendingComponent {
                PendingComponent::$kind(self)
            }

            fn on_attach(&mut self, entity: Entity) {
                let $component = self;
                let $entity = entity;
                $attach
            }
        }
    };
}

impl_component!(BodyComponent, Body, bodies, |body, entity| {
    body.attach_to(entity);
});
impl_component!(BehaviorComponent, Behavior, behaviors);
impl_component!(ControllerComponent, Controller, controllers);
impl_component!(UpdatableComponent, Updatable, updatables);
impl_component!(TrajectoryComponent, Trajectory, trajectories);
impl_component!(PendulumComponent, Pendulum, pendulums);
impl_component!(CullComponent, Cull, culls);
impl_component!(DebugMessageComponent, DebugMessage, debug_messages);
impl_component!(SoundComponent, Sound, sounds);
impl_component!(Facing, Facing, facings);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_storage() {
        let mut storage = HashMapStorage::<Facing>::new();
        let entity = Entity::new(1, 0);

        assert!(storage.insert(entity, Facing::Left).is_none());
        assert!(storage.contains(entity));
        assert_eq!(storage.get(entity), Some(&Facing::Left));

        assert_eq!(storage.insert(entity, Facing::Right), Some(Facing::Left));
        assert_eq!(storage.len(), 1);

        storage.remove(entity);
        assert!(!storage.contains(entity));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_mask_superset() {
        let required = ComponentMask::of(&[ComponentKind::Body, ComponentKind::Behavior]);
        let mut carried = ComponentMask::empty().with(ComponentKind::Body);
        assert!(!carried.is_superset_of(required));

        carried.insert(ComponentKind::Behavior);
        carried.insert(ComponentKind::Sound);
        assert!(carried.is_superset_of(required));

        carried.remove(ComponentKind::Body);
        assert!(!carried.is_superset_of(required));
    }

    #[test]
    fn test_empty_mask_matches_everything() {
        assert!(ComponentMask::empty().is_superset_of(ComponentMask::empty()));
        assert!(ComponentMask::of(&[ComponentKind::Cull]).is_superset_of(ComponentMask::empty()));
    }

    #[test]
    fn test_mask_iterates_in_declaration_order() {
        let mask = ComponentMask::of(&[ComponentKind::Facing, ComponentKind::Body]);
        let kinds: Vec<_> = mask.iter().collect();
        assert_eq!(kinds, vec![ComponentKind::Body, ComponentKind::Facing]);
    }
}
