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
//! Physical bodies
//!
//! A body is an axis-aligned collision box with velocity, gravity and
//! resistance, owning an ordered list of fixtures. Body-sense flags are
//! written only by the collision world and are a fresh snapshot every frame.

use crate::behavior::BehaviorSet;
use crate::ecs::Entity;
use crate::physics::{Fixture, FixtureTag, Rect};
use glam::Vec2;
use std::fmt;

/// How a body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// Never moves on its own; typical for blocks
    Static,
    /// Integrated every frame and pushed around by resolution rules
    Dynamic,
    /// No standard physics; only custom collision masks see it
    Abstract,
}

/// Derived per-frame contact state of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodySense {
    /// Feet rest on a block
    FeetOnGround,
    /// Head touches a block
    HeadTouchingBlock,
    /// Left side touches a block
    TouchingBlockLeft,
    /// Right side touches a block
    TouchingBlockRight,
    /// Inside a water volume
    InWater,
    /// Inside a gate region
    TouchingGate,
}

impl BodySense {
    /// Every sense, in declaration order
    pub const ALL: [BodySense; 6] = [
        BodySense::FeetOnGround,
        BodySense::HeadTouchingBlock,
        BodySense::TouchingBlockLeft,
        BodySense::TouchingBlockRight,
        BodySense::InWater,
        BodySense::TouchingGate,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of body senses
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BodySenses(u8);

impl BodySenses {
    /// True if `sense` is set
    pub fn contains(&self, sense: BodySense) -> bool {
        self.0 & sense.bit() != 0
    }

    /// True if no sense is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate set senses in declaration order
    pub fn iter(&self) -> impl Iterator<Item = BodySense> + '_ {
        BodySense::ALL.into_iter().filter(move |sense| self.contains(*sense))
    }

    pub(crate) fn insert(&mut self, sense: BodySense) {
        self.0 |= sense.bit();
    }
}

impl fmt::Debug for BodySenses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Hook run once per frame before integration
///
/// Receives the body, the owning entity's active behaviors and the frame
/// delta. Typically resizes fixtures or changes gravity.
pub type PreProcessHook = Box<dyn FnMut(&mut BodyComponent, BehaviorSet, f32)>;

/// Physical body component
pub struct BodyComponent {
    body_type: BodyType,
    bounds: Rect,
    velocity: Vec2,
    last_step: Vec2,
    velocity_clamp: Option<Vec2>,
    gravity: f32,
    gravity_on: bool,
    resistance: Vec2,
    affected_by_resistance: bool,
    fixtures: Vec<Fixture>,
    pre_process: Option<PreProcessHook>,
    senses: BodySenses,
    previous_senses: BodySenses,
    custom_tag: u32,
    custom_mask: u32,
    owner: Option<Entity>,
}

impl BodyComponent {
    /// Create a zero-sized body at the origin
    pub fn new(body_type: BodyType) -> Self {
        BodyComponent {
            body_type,
            bounds: Rect::default(),
            velocity: Vec2::ZERO,
            last_step: Vec2::ZERO,
            velocity_clamp: None,
            gravity: 0.0,
            gravity_on: body_type == BodyType::Dynamic,
            resistance: Vec2::ONE,
            affected_by_resistance: false,
            fixtures: Vec::new(),
            pre_process: None,
            senses: BodySenses::default(),
            previous_senses: BodySenses::default(),
            custom_tag: 0,
            custom_mask: 0,
            owner: None,
        }
    }

    /// Shorthand for a dynamic body
    pub fn dynamic() -> Self {
        Self::new(BodyType::Dynamic)
    }

    /// Shorthand for a static body
    pub fn fixed() -> Self {
        Self::new(BodyType::Static)
    }

    /// Shorthand for an abstract body
    pub fn abstract_region() -> Self {
        Self::new(BodyType::Abstract)
    }

    /// Set the collision box size, keeping the bottom-left corner
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.bounds.width = width;
        self.bounds.height = height;
        self
    }

    /// Set the bottom-left corner
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.set_position(x, y);
        self
    }

    /// Set the gravity applied to vertical velocity
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Attach a fixture
    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.add_fixture(fixture);
        self
    }

    /// Body type
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Collision box
    pub fn collision_box(&self) -> Rect {
        self.bounds
    }

    /// Bottom-left corner
    pub fn position(&self) -> Vec2 {
        self.bounds.position()
    }

    /// Move the bottom-left corner to `(x, y)`
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.bounds.x = x;
        self.bounds.y = y;
        self.place_fixtures();
    }

    /// Center of the collision box
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Move so the collision box is centered on `center`
    pub fn set_center(&mut self, center: Vec2) {
        self.bounds.set_center(center);
        self.place_fixtures();
    }

    /// Resize the collision box, keeping its center
    pub fn set_size(&mut self, width: f32, height: f32) {
        let center = self.center();
        self.bounds.width = width;
        self.bounds.height = height;
        self.set_center(center);
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Replace the velocity
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Replace the horizontal velocity
    pub fn set_velocity_x(&mut self, x: f32) {
        self.velocity.x = x;
    }

    /// Replace the vertical velocity
    pub fn set_velocity_y(&mut self, y: f32) {
        self.velocity.y = y;
    }

    /// Distance moved by the last integration
    ///
    /// Zero for bodies that do not integrate. Teleports through
    /// [`set_position`](Self::set_position) do not count.
    pub fn last_step(&self) -> Vec2 {
        self.last_step
    }

    /// Add `impulse` to the velocity
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    /// Limit the absolute velocity per axis after integration
    pub fn set_velocity_clamp(&mut self, clamp: Option<Vec2>) {
        self.velocity_clamp = clamp.map(|c| c.abs());
    }

    /// Gravity applied to vertical velocity each frame
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Change gravity
    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Whether gravity is applied
    pub fn gravity_on(&self) -> bool {
        self.gravity_on
    }

    /// Turn gravity on or off
    pub fn set_gravity_on(&mut self, on: bool) {
        self.gravity_on = on;
    }

    /// Divide horizontal velocity by `factor` during the next integration
    ///
    /// Factors stack multiplicatively within a frame and reset to `1` after
    /// every integration.
    pub fn apply_resistance_x(&mut self, factor: f32) {
        self.resistance.x *= factor;
    }

    /// Divide vertical velocity by `factor` during the next integration
    pub fn apply_resistance_y(&mut self, factor: f32) {
        self.resistance.y *= factor;
    }

    /// Resistance divisors pending for the next integration
    pub fn resistance(&self) -> Vec2 {
        self.resistance
    }

    /// Whether resistance damps velocity
    pub fn is_affected_by_resistance(&self) -> bool {
        self.affected_by_resistance
    }

    /// Enable or disable resistance damping
    pub fn set_affected_by_resistance(&mut self, affected: bool) {
        self.affected_by_resistance = affected;
    }

    /// Attach a fixture, stamping its owner if the body is already attached
    pub fn add_fixture(&mut self, mut fixture: Fixture) {
        if let Some(owner) = self.owner {
            fixture.set_owner(owner);
        }
        fixture.place(self.center());
        self.fixtures.push(fixture);
    }

    /// Fixtures in declaration order
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Borrow a fixture by index
    pub fn fixture_mut(&mut self, index: usize) -> Option<&mut Fixture> {
        self.fixtures.get_mut(index)
    }

    /// First fixture carrying `tag`
    pub fn first_fixture_with(&self, tag: FixtureTag) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.has_tag(tag))
    }

    /// First fixture carrying `tag`, mutably
    pub fn first_fixture_with_mut(&mut self, tag: FixtureTag) -> Option<&mut Fixture> {
        self.fixtures.iter_mut().find(|f| f.has_tag(tag))
    }

    /// Install the per-frame pre-process hook
    pub fn set_pre_process(&mut self, hook: impl FnMut(&mut BodyComponent, BehaviorSet, f32) + 'static) {
        self.pre_process = Some(Box::new(hook));
    }

    /// True if `sense` was asserted by the last resolution pass
    pub fn is(&self, sense: BodySense) -> bool {
        self.senses.contains(sense)
    }

    /// Every sense asserted by the last resolution pass
    pub fn senses(&self) -> BodySenses {
        self.senses
    }

    /// True if `sense` turned on during the last resolution pass
    pub fn just_entered(&self, sense: BodySense) -> bool {
        self.senses.contains(sense) && !self.previous_senses.contains(sense)
    }

    /// True if `sense` turned off during the last resolution pass
    pub fn just_exited(&self, sense: BodySense) -> bool {
        !self.senses.contains(sense) && self.previous_senses.contains(sense)
    }

    /// Tag this body so custom masks can select it; tags are bit flags
    pub fn set_custom_collision_tag(&mut self, tag: u32) {
        self.custom_tag = tag;
    }

    /// Let bodies tagged with `tag` block this body
    pub fn add_custom_collision_mask(&mut self, tag: u32) {
        self.custom_mask |= tag;
    }

    /// Custom collision tag
    pub fn custom_collision_tag(&self) -> u32 {
        self.custom_tag
    }

    /// Custom collision mask
    pub fn custom_collision_mask(&self) -> u32 {
        self.custom_mask
    }

    /// Entity this body is attached to
    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub(crate) fn attach_to(&mut self, entity: Entity) {
        self.owner = Some(entity);
        for fixture in &mut self.fixtures {
            fixture.set_owner(entity);
        }
    }

    pub(crate) fn fixtures_mut(&mut self) -> &mut [Fixture] {
        &mut self.fixtures
    }

    pub(crate) fn run_pre_process(&mut self, behaviors: BehaviorSet, delta: f32) {
        if let Some(mut hook) = self.pre_process.take() {
            hook(self, behaviors, delta);
            // The hook may have installed a replacement
            if self.pre_process.is_none() {
                self.pre_process = Some(hook);
            }
        }
    }

    /// Apply gravity, resistance and velocity for one frame
    pub(crate) fn integrate(&mut self, delta: f32) {
        if self.body_type == BodyType::Dynamic {
            if self.gravity_on {
                self.velocity.y += self.gravity * delta;
            }
            if self.affected_by_resistance {
                if self.resistance.x > 0.0 {
                    self.velocity.x /= self.resistance.x;
                }
                if self.resistance.y > 0.0 {
                    self.velocity.y /= self.resistance.y;
                }
            }
            if let Some(clamp) = self.velocity_clamp {
                self.velocity = self.velocity.clamp(-clamp, clamp);
            }
            self.last_step = self.velocity * delta;
            self.bounds.translate(self.last_step);
        } else {
            self.last_step = Vec2::ZERO;
        }
        self.resistance = Vec2::ONE;
        self.place_fixtures();
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.bounds.translate(delta);
        self.place_fixtures();
    }

    pub(crate) fn place_fixtures(&mut self) {
        let center = self.center();
        for fixture in &mut self.fixtures {
            fixture.place(center);
        }
    }

    pub(crate) fn begin_sensing(&mut self) {
        self.previous_senses = self.senses;
        self.senses = BodySenses::default();
    }

    pub(crate) fn sense(&mut self, sense: BodySense) {
        self.senses.insert(sense);
    }
}

impl fmt::Debug for BodyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyComponent")
            .field("body_type", &self.body_type)
            .field("bounds", &self.bounds)
            .field("velocity", &self.velocity)
            .field("gravity", &self.gravity)
            .field("senses", &self.senses)
            .field("fixtures", &self.fixtures.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::FixtureRole;

    #[test]
    fn test_dynamic_integration() {
        let mut body = BodyComponent::dynamic().with_size(1.0, 1.0).with_gravity(-10.0);
        body.set_velocity(Vec2::new(2.0, 0.0));
        body.integrate(0.5);
        assert_eq!(body.velocity(), Vec2::new(2.0, -5.0));
        assert_eq!(body.position(), Vec2::new(1.0, -2.5));
        assert_eq!(body.last_step(), Vec2::new(1.0, -2.5));
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut body = BodyComponent::fixed().with_gravity(-10.0);
        body.set_velocity(Vec2::new(1.0, 1.0));
        body.integrate(1.0);
        assert_eq!(body.position(), Vec2::ZERO);
    }

    #[test]
    fn test_resistance_resets_after_integration() {
        let mut body = BodyComponent::dynamic();
        body.set_gravity_on(false);
        body.set_affected_by_resistance(true);
        body.set_velocity(Vec2::new(8.0, 0.0));
        body.apply_resistance_x(2.0);
        body.apply_resistance_x(2.0);
        body.integrate(0.0);
        assert_eq!(body.velocity().x, 2.0);
        assert_eq!(body.resistance(), Vec2::ONE);
    }

    #[test]
    fn test_fixtures_follow_body() {
        let mut body = BodyComponent::dynamic()
            .with_size(2.0, 2.0)
            .with_fixture(Fixture::new(vec![FixtureRole::Feet]).with_size(2.0, 0.5).with_offset(0.0, -1.0));
        body.set_position(10.0, 0.0);
        let feet = body.first_fixture_with(FixtureTag::Feet).unwrap();
        assert_eq!(feet.shape(), Rect::new(10.0, -0.25, 2.0, 0.5));
    }

    #[test]
    fn test_attach_stamps_fixture_owner() {
        let mut body = BodyComponent::dynamic().with_fixture(Fixture::new(vec![FixtureRole::Head]));
        let entity = Entity::new(4, 0);
        body.attach_to(entity);
        body.add_fixture(Fixture::new(vec![FixtureRole::Left]));
        assert!(body.fixtures().iter().all(|f| f.owner() == Some(entity)));
    }

    #[test]
    fn test_sense_transitions() {
        let mut body = BodyComponent::dynamic();
        body.begin_sensing();
        body.sense(BodySense::InWater);
        assert!(body.just_entered(BodySense::InWater));

        body.begin_sensing();
        body.sense(BodySense::InWater);
        assert!(body.is(BodySense::InWater));
        assert!(!body.just_entered(BodySense::InWater));

        body.begin_sensing();
        assert!(body.just_exited(BodySense::InWater));
    }

    #[test]
    fn test_pre_process_hook_sees_body() {
        let mut body = BodyComponent::dynamic().with_gravity(-1.0);
        body.set_pre_process(|body, _behaviors, _delta| body.set_gravity(-5.0));
        body.run_pre_process(BehaviorSet::empty(), 0.016);
        assert_eq!(body.gravity(), -5.0);
        // hook survives the call
        body.set_gravity(0.0);
        body.run_pre_process(BehaviorSet::empty(), 0.016);
        assert_eq!(body.gravity(), -5.0);
    }
}
