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
//! Fixtures: tagged sub-shapes owned by a body
//!
//! A fixture is a rectangle positioned relative to its body's center. Its
//! roles decide which resolution rules it takes part in, and each role
//! carries exactly the payload that rule needs.

use crate::damage::DamageNegotiator;
use crate::ecs::Entity;
use crate::physics::Rect;
use glam::Vec2;
use std::fmt;

/// Payload-free category of a fixture role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FixtureTag {
    /// Senses ground under the body
    Feet,
    /// Senses ceilings above the body
    Head,
    /// Senses walls on the left
    Left,
    /// Senses walls on the right
    Right,
    /// Solid surface
    Block,
    /// Deals damage
    Damager,
    /// Receives damage
    Damageable,
    /// Pushes force listeners
    Force,
    /// Is pushed by force fixtures
    ForceListener,
    /// Bounces off other bounceables
    Bounceable,
    /// Level transition region
    Gate,
    /// Notices gates
    GateListener,
    /// Water volume
    Water,
    /// Notices water
    WaterListener,
    /// Projectile-style hit detector
    HitterBox,
    /// Deflects hitters
    Shield,
    /// Content-defined tag with no built-in rule
    Custom,
}

impl FixtureTag {
    pub(crate) fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Direction a shield sends deflected hitters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reflection {
    /// Reverse horizontally
    #[default]
    Straight,
    /// Reverse horizontally and angle upward
    Up,
    /// Reverse horizontally and angle downward
    Down,
}

/// Surface properties of a block fixture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockSurface {
    /// Horizontal resistance applied to bodies standing on the block
    pub friction: Option<f32>,
}

impl BlockSurface {
    /// A block with horizontal friction
    pub fn with_friction(friction: f32) -> Self {
        BlockSurface {
            friction: Some(friction),
        }
    }
}

/// Identifies the kind of damage a damager deals
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DamagerInfo {
    /// Category looked up in the victim's damage table
    pub category: String,
}

impl DamagerInfo {
    /// Create damager info for `category`
    pub fn new(category: impl Into<String>) -> Self {
        DamagerInfo {
            category: category.into(),
        }
    }
}

/// Force vector applied by a force fixture
pub enum ForceSource {
    /// Constant force
    Fixed(Vec2),
    /// Force recomputed every time it is applied
    Supplied(Box<dyn Fn() -> Vec2>),
}

impl ForceSource {
    /// Current force vector
    pub fn current(&self) -> Vec2 {
        match self {
            ForceSource::Fixed(force) => *force,
            ForceSource::Supplied(supplier) => supplier(),
        }
    }
}

impl fmt::Debug for ForceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceSource::Fixed(force) => f.debug_tuple("Fixed").field(force).finish(),
            ForceSource::Supplied(_) => f.write_str("Supplied(..)"),
        }
    }
}

/// What a contact callback sees about the other side
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// Entity owning the other fixture
    pub other: Entity,
    /// Role of the other fixture that matched
    pub other_tag: FixtureTag,
    /// Velocity of this fixture's body at resolution time
    pub velocity: Vec2,
    /// Velocity of the other body at resolution time
    pub other_velocity: Vec2,
    /// Shield reflection, when the other fixture is a shield
    pub reflection: Option<Reflection>,
}

/// How a hitter reacts to striking something
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HitResponse {
    /// Keep going
    #[default]
    Continue,
    /// Replace the hitter body's velocity
    SetVelocity(Vec2),
    /// Destroy the hitter's entity at the end of the frame
    Destroy,
}

/// Called on bounce onset; `Some(v)` replaces the owning body's velocity
pub type BounceCallback = Box<dyn FnMut(&Contact) -> Option<Vec2>>;

/// Called when a hitter box first touches a block, damageable or shield
pub type HitCallback = Box<dyn FnMut(&Contact) -> HitResponse>;

/// One role of a fixture together with its payload
pub enum FixtureRole {
    /// See [`FixtureTag::Feet`]
    Feet,
    /// See [`FixtureTag::Head`]
    Head,
    /// See [`FixtureTag::Left`]
    Left,
    /// See [`FixtureTag::Right`]
    Right,
    /// See [`FixtureTag::Block`]
    Block(BlockSurface),
    /// See [`FixtureTag::Damager`]
    Damager(DamagerInfo),
    /// See [`FixtureTag::Damageable`]
    Damageable(Box<dyn DamageNegotiator>),
    /// See [`FixtureTag::Force`]
    Force(ForceSource),
    /// See [`FixtureTag::ForceListener`]
    ForceListener,
    /// See [`FixtureTag::Bounceable`]
    Bounceable(Option<BounceCallback>),
    /// See [`FixtureTag::Gate`]
    Gate,
    /// See [`FixtureTag::GateListener`]
    GateListener,
    /// See [`FixtureTag::Water`]
    Water,
    /// See [`FixtureTag::WaterListener`]
    WaterListener,
    /// See [`FixtureTag::HitterBox`]
    HitterBox(HitCallback),
    /// See [`FixtureTag::Shield`]
    Shield(Reflection),
    /// See [`FixtureTag::Custom`]
    Custom(String),
}

impl FixtureRole {
    /// Payload-free tag of this role
    pub fn tag(&self) -> FixtureTag {
        match self {
            FixtureRole::Feet => FixtureTag::Feet,
            FixtureRole::Head => FixtureTag::Head,
            FixtureRole::Left => FixtureTag::Left,
            FixtureRole::Right => FixtureTag::Right,
            FixtureRole::Block(_) => FixtureTag::Block,
            FixtureRole::Damager(_) => FixtureTag::Damager,
            FixtureRole::Damageable(_) => FixtureTag::Damageable,
            FixtureRole::Force(_) => FixtureTag::Force,
            FixtureRole::ForceListener => FixtureTag::ForceListener,
            FixtureRole::Bounceable(_) => FixtureTag::Bounceable,
            FixtureRole::Gate => FixtureTag::Gate,
            FixtureRole::GateListener => FixtureTag::GateListener,
            FixtureRole::Water => FixtureTag::Water,
            FixtureRole::WaterListener => FixtureTag::WaterListener,
            FixtureRole::HitterBox(_) => FixtureTag::HitterBox,
            FixtureRole::Shield(_) => FixtureTag::Shield,
            FixtureRole::Custom(_) => FixtureTag::Custom,
        }
    }

    /// Shorthand for a frictionless block
    pub fn block() -> Self {
        FixtureRole::Block(BlockSurface::default())
    }

    /// Shorthand for a damager of `category`
    pub fn damager(category: impl Into<String>) -> Self {
        FixtureRole::Damager(DamagerInfo::new(category))
    }

    /// Shorthand for a constant force
    pub fn force(force: Vec2) -> Self {
        FixtureRole::Force(ForceSource::Fixed(force))
    }
}

impl fmt::Debug for FixtureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureRole::Block(surface) => f.debug_tuple("Block").field(surface).finish(),
            FixtureRole::Damager(info) => f.debug_tuple("Damager").field(info).finish(),
            FixtureRole::Force(source) => f.debug_tuple("Force").field(source).finish(),
            FixtureRole::Shield(reflection) => f.debug_tuple("Shield").field(reflection).finish(),
            FixtureRole::Custom(name) => f.debug_tuple("Custom").field(name).finish(),
            other => write!(f, "{:?}", other.tag()),
        }
    }
}

/// Bitset of fixture tags, for cheap pair classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TagSet(u32);

impl TagSet {
    pub(crate) fn contains(self, tag: FixtureTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub(crate) fn insert(&mut self, tag: FixtureTag) {
        self.0 |= tag.bit();
    }
}

/// A tagged rectangle that moves rigidly with its owning body
#[derive(Debug)]
pub struct Fixture {
    roles: Vec<FixtureRole>,
    tags: TagSet,
    size: Vec2,
    offset: Vec2,
    shape: Rect,
    owner: Option<Entity>,
    active: bool,
}

impl Fixture {
    /// Create a zero-sized fixture centered on its body
    pub fn new(roles: Vec<FixtureRole>) -> Self {
        let mut tags = TagSet::default();
        for role in &roles {
            tags.insert(role.tag());
        }
        Fixture {
            roles,
            tags,
            size: Vec2::ZERO,
            offset: Vec2::ZERO,
            shape: Rect::default(),
            owner: None,
            active: true,
        }
    }

    /// Set the size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    /// Set the offset from the owning body's center
    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vec2::new(x, y);
        self
    }

    /// Resize in place
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    /// Move relative to the body center
    pub fn set_offset(&mut self, x: f32, y: f32) {
        self.offset = Vec2::new(x, y);
    }

    /// Size of the fixture
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Offset from the body center
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Absolute shape as of the last placement
    pub fn shape(&self) -> Rect {
        self.shape
    }

    /// Entity owning the body this fixture is attached to
    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    /// Inactive fixtures take no part in resolution
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable the fixture
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// True if any role carries `tag`
    pub fn has_tag(&self, tag: FixtureTag) -> bool {
        self.tags.contains(tag)
    }

    /// Roles in declaration order
    pub fn roles(&self) -> &[FixtureRole] {
        &self.roles
    }

    /// First role with `tag`
    pub fn role(&self, tag: FixtureTag) -> Option<&FixtureRole> {
        self.roles.iter().find(|role| role.tag() == tag)
    }

    /// First role with `tag`, mutably
    pub fn role_mut(&mut self, tag: FixtureTag) -> Option<&mut FixtureRole> {
        self.roles.iter_mut().find(|role| role.tag() == tag)
    }

    pub(crate) fn tags(&self) -> TagSet {
        self.tags
    }

    pub(crate) fn set_owner(&mut self, owner: Entity) {
        self.owner = Some(owner);
    }

    /// Recompute the absolute shape from the body center
    pub(crate) fn place(&mut self, body_center: Vec2) {
        self.shape = Rect::from_center(body_center + self.offset, self.size);
    }
}
