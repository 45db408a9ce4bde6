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
//! Contact detection and resolution
//!
//! Resolution runs in three steps:
//!
//! 1. Every body clears its sense flags and re-places its fixtures; active
//!    fixtures of non-abstract bodies are copied into a flat snapshot.
//! 2. Overlapping fixture pairs from different entities are classified
//!    against the rule table. This step only reads the snapshot and runs on
//!    the rayon pool when the `parallel` feature is enabled; results are
//!    collected in snapshot order either way.
//! 3. Contacts are applied one body at a time in entity order, then custom
//!    collision masks push dynamic bodies out of abstract regions.
//!
//! Callback contacts (damage, bounce, hit) fire once per overlap onset; a
//! pair must separate for a frame before it fires again. Forces apply every
//! frame of overlap.
//!
//! Block corrections are swept: a sensor is pushed back out of a block only
//! by as much as the body moved towards it during the last integration,
//! relative to the block's own motion. Feet brushing the side of a wall
//! therefore never lift the body onto the wall's top, and a body that walks
//! into a wall is stopped at its face.

use crate::damage::DamageContact;
use crate::ecs::{ComponentKind, ComponentMask, Entity, World};
use crate::physics::fixture::TagSet;
use crate::physics::{BodyComponent, BodySense, BodyType, Contact, FixtureRole, FixtureTag, HitResponse, Rect};
use crate::pool::{BufferPool, PoolConfig, PoolStats};
use glam::Vec2;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Resolution rule matched by a pair of fixtures
///
/// The first fixture of the pair is always the side that reacts: the
/// sensor, the listener, the damageable or the hitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactRule {
    /// Feet resting on a block
    FeetOnBlock,
    /// Head against a block
    HeadOnBlock,
    /// Left sensor against a block
    LeftOnBlock,
    /// Right sensor against a block
    RightOnBlock,
    /// Damageable touched by a damager
    Damage,
    /// Force listener inside a force field
    Force,
    /// Bounceable touching another bounceable
    Bounce,
    /// Gate listener inside a gate
    Gate,
    /// Water listener inside water
    Water,
    /// Hitter box striking a fixture with the given tag
    Hit(FixtureTag),
}

const RULES: [(ContactRule, FixtureTag, FixtureTag); 12] = [
    (ContactRule::FeetOnBlock, FixtureTag::Feet, FixtureTag::Block),
    (ContactRule::HeadOnBlock, FixtureTag::Head, FixtureTag::Block),
    (ContactRule::LeftOnBlock, FixtureTag::Left, FixtureTag::Block),
    (ContactRule::RightOnBlock, FixtureTag::Right, FixtureTag::Block),
    (ContactRule::Damage, FixtureTag::Damageable, FixtureTag::Damager),
    (ContactRule::Force, FixtureTag::ForceListener, FixtureTag::Force),
    (ContactRule::Bounce, FixtureTag::Bounceable, FixtureTag::Bounceable),
    (ContactRule::Gate, FixtureTag::GateListener, FixtureTag::Gate),
    (ContactRule::Water, FixtureTag::WaterListener, FixtureTag::Water),
    (ContactRule::Hit(FixtureTag::Block), FixtureTag::HitterBox, FixtureTag::Block),
    (ContactRule::Hit(FixtureTag::Damageable), FixtureTag::HitterBox, FixtureTag::Damageable),
    (ContactRule::Hit(FixtureTag::Shield), FixtureTag::HitterBox, FixtureTag::Shield),
];

/// Below this many fixtures detection stays on the calling thread
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 64;

/// Largest correction accepted beyond a body's own displacement
const CONTACT_SLOP: f32 = 1e-3;

/// Plain copy of one fixture, safe to share across threads
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixtureSnapshot {
    body: usize,
    fixture: usize,
    owner: Entity,
    shape: Rect,
    tags: TagSet,
}

#[derive(Debug, Clone, Copy)]
struct BodySnapshot {
    entity: Entity,
    velocity: Vec2,
    bounds: Rect,
    step: Vec2,
}

/// A classified overlap between two snapshot entries
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    rule: ContactRule,
    a: usize,
    b: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContactKey {
    rule: ContactRule,
    a: (Entity, usize),
    b: (Entity, usize),
}

/// A damage onset and what it dealt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageEvent {
    /// The overlap that triggered negotiation
    pub contact: DamageContact,
    /// Damage returned by the victim's negotiator
    pub amount: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    ground_shift: Option<f32>,
    ground_friction: Option<f32>,
    ceiling_shift: Option<f32>,
    left: bool,
    left_shift: f32,
    right: bool,
    right_shift: f32,
    water: bool,
    gate: bool,
    force: Vec2,
    set_velocity: Option<Vec2>,
}

fn classify(snapshots: &[FixtureSnapshot], i: usize, out: &mut Vec<Candidate>) {
    let first = &snapshots[i];
    for (offset, second) in snapshots[i + 1..].iter().enumerate() {
        let j = i + 1 + offset;
        if first.owner == second.owner || !first.shape.overlaps(&second.shape) {
            continue;
        }
        for (rule, reactor, source) in RULES {
            if first.tags.contains(reactor) && second.tags.contains(source) {
                out.push(Candidate { rule, a: i, b: j });
            }
            if second.tags.contains(reactor) && first.tags.contains(source) {
                out.push(Candidate { rule, a: j, b: i });
            }
        }
    }
}

/// Find every classified overlap, in snapshot order
pub(crate) fn detect(snapshots: &[FixtureSnapshot], out: &mut Vec<Candidate>) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        if snapshots.len() >= PARALLEL_THRESHOLD {
            let per_fixture: Vec<Vec<Candidate>> = (0..snapshots.len())
                .into_par_iter()
                .map(|i| {
                    let mut found = Vec::new();
                    classify(snapshots, i, &mut found);
                    found
                })
                .collect();
            for found in per_fixture {
                out.extend(found);
            }
            return;
        }
    }

    for i in 0..snapshots.len() {
        classify(snapshots, i, out);
    }
}

/// Persistent state of the collision world between frames
#[derive(Debug)]
pub struct CollisionWorld {
    previous: HashSet<ContactKey>,
    current: HashSet<ContactKey>,
    fixture_pool: BufferPool<FixtureSnapshot>,
    candidate_pool: BufferPool<Candidate>,
    damage_events: Vec<DamageEvent>,
    contact_count: usize,
}

impl CollisionWorld {
    /// Create a collision world with default pooling
    pub fn new() -> Self {
        Self::with_pool_config(PoolConfig::default())
    }

    /// Create a collision world with custom pooling
    pub fn with_pool_config(config: PoolConfig) -> Self {
        CollisionWorld {
            previous: HashSet::new(),
            current: HashSet::new(),
            fixture_pool: BufferPool::with_config(config.clone()),
            candidate_pool: BufferPool::with_config(config),
            damage_events: Vec::new(),
            contact_count: 0,
        }
    }

    /// Damage dealt during the last resolution pass
    pub fn damage_events(&self) -> &[DamageEvent] {
        &self.damage_events
    }

    /// Classified contacts found during the last resolution pass
    pub fn contact_count(&self) -> usize {
        self.contact_count
    }

    /// Forget every tracked overlap so all current contacts count as onsets
    pub fn reset_contacts(&mut self) {
        self.previous.clear();
        self.current.clear();
    }

    /// Statistics of the fixture snapshot pool
    pub fn pool_stats(&self) -> &PoolStats {
        self.fixture_pool.stats()
    }

    /// Run detection and resolution over every body in `world`
    pub fn resolve(&mut self, world: &mut World) {
        self.damage_events.clear();
        let mask = ComponentMask::empty().with(ComponentKind::Body);
        let entities: Vec<Entity> = world
            .entities_matching(mask)
            .into_iter()
            .filter(|e| !world.is_pending_destroy(*e))
            .collect();

        let mut snapshots = self.fixture_pool.acquire();
        let mut bodies = Vec::with_capacity(entities.len());
        for &entity in &entities {
            let Some(body) = world.get_mut::<BodyComponent>(entity) else {
                continue;
            };
            body.begin_sensing();
            body.place_fixtures();
            let index = bodies.len();
            bodies.push(BodySnapshot {
                entity,
                velocity: body.velocity(),
                bounds: body.collision_box(),
                step: body.last_step(),
            });
            if body.body_type() == BodyType::Abstract {
                continue;
            }
            for (fixture_index, fixture) in body.fixtures().iter().enumerate() {
                if fixture.is_active() {
                    snapshots.push(FixtureSnapshot {
                        body: index,
                        fixture: fixture_index,
                        owner: entity,
                        shape: fixture.shape(),
                        tags: fixture.tags(),
                    });
                }
            }
        }

        let mut candidates = self.candidate_pool.acquire();
        detect(&snapshots, &mut candidates);
        self.contact_count = candidates.len();

        let mut accumulators = vec![Accumulator::default(); bodies.len()];
        let mut destroyed = Vec::new();
        let mut onsets = 0usize;
        for candidate in candidates.iter() {
            let a = snapshots[candidate.a];
            let b = snapshots[candidate.b];
            let key = ContactKey {
                rule: candidate.rule,
                a: (a.owner, a.fixture),
                b: (b.owner, b.fixture),
            };
            let onset = !self.previous.contains(&key);
            self.current.insert(key);
            if onset {
                onsets += 1;
            }
            let accumulator = &mut accumulators[a.body];
            let approach = bodies[a.body].step - bodies[b.body].step;

            match candidate.rule {
                ContactRule::FeetOnBlock => {
                    let shift = b.shape.top() - a.shape.y;
                    let reachable = shift <= (-approach.y).max(0.0) + CONTACT_SLOP;
                    if reachable && accumulator.ground_shift.map_or(true, |best| shift > best) {
                        accumulator.ground_shift = Some(shift);
                        accumulator.ground_friction = block_friction(world, b);
                    }
                }
                ContactRule::HeadOnBlock => {
                    let shift = b.shape.y - a.shape.top();
                    let reachable = -shift <= approach.y.max(0.0) + CONTACT_SLOP;
                    if reachable && accumulator.ceiling_shift.map_or(true, |best| shift < best) {
                        accumulator.ceiling_shift = Some(shift);
                    }
                }
                ContactRule::LeftOnBlock => {
                    accumulator.left = true;
                    let body = bodies[a.body].bounds;
                    if side_contact(&body, &b.shape, approach) {
                        let depth = b.shape.right() - body.x;
                        if depth > 0.0 && depth <= (-approach.x).max(0.0) + CONTACT_SLOP {
                            accumulator.left_shift = accumulator.left_shift.max(depth);
                        }
                    }
                }
                ContactRule::RightOnBlock => {
                    accumulator.right = true;
                    let body = bodies[a.body].bounds;
                    if side_contact(&body, &b.shape, approach) {
                        let depth = body.right() - b.shape.x;
                        if depth > 0.0 && depth <= approach.x.max(0.0) + CONTACT_SLOP {
                            accumulator.right_shift = accumulator.right_shift.max(depth);
                        }
                    }
                }
                ContactRule::Gate => accumulator.gate = true,
                ContactRule::Water => accumulator.water = true,
                ContactRule::Force => {
                    if let Some(force) = force_of(world, b) {
                        accumulator.force += force;
                    }
                }
                ContactRule::Damage if onset => {
                    if let Some(event) = negotiate(world, a, b) {
                        self.damage_events.push(event);
                    }
                }
                ContactRule::Bounce if onset => {
                    let contact = Contact {
                        other: b.owner,
                        other_tag: FixtureTag::Bounceable,
                        velocity: bodies[a.body].velocity,
                        other_velocity: bodies[b.body].velocity,
                        reflection: None,
                    };
                    if let Some(velocity) = bounce(world, a, &contact) {
                        accumulator.set_velocity = Some(velocity);
                    }
                }
                ContactRule::Hit(tag) if onset => {
                    let contact = Contact {
                        other: b.owner,
                        other_tag: tag,
                        velocity: bodies[a.body].velocity,
                        other_velocity: bodies[b.body].velocity,
                        reflection: shield_reflection(world, b),
                    };
                    match hit(world, a, &contact) {
                        HitResponse::Continue => {}
                        HitResponse::SetVelocity(velocity) => accumulator.set_velocity = Some(velocity),
                        HitResponse::Destroy => destroyed.push(a.owner),
                    }
                }
                ContactRule::Damage | ContactRule::Bounce | ContactRule::Hit(_) => {}
            }
        }

        for (snapshot, accumulator) in bodies.iter().zip(&accumulators) {
            if let Some(body) = world.get_mut::<BodyComponent>(snapshot.entity) {
                apply(body, accumulator);
            }
        }
        resolve_custom_collisions(world, &entities);

        for entity in destroyed {
            debug!(entity = %entity, "hitter_destroyed");
            world.destroy_entity(entity);
        }

        trace!(
            fixtures = snapshots.len(),
            contacts = self.contact_count,
            onsets,
            "collision_pass"
        );
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
        self.fixture_pool.release(snapshots);
        self.candidate_pool.release(candidates);
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `body` overlaps `block` by more than this frame's vertical travel
///
/// Filters out blocks the body only grazes with its bottom or top edge, such
/// as the floor it is standing on.
fn side_contact(body: &Rect, block: &Rect, approach: Vec2) -> bool {
    body.intersection(block)
        .map_or(false, |overlap| overlap.height > approach.y.abs() + CONTACT_SLOP)
}

fn role_of(world: &World, snapshot: FixtureSnapshot, tag: FixtureTag) -> Option<&FixtureRole> {
    world
        .get::<BodyComponent>(snapshot.owner)?
        .fixtures()
        .get(snapshot.fixture)?
        .role(tag)
}

fn role_of_mut(world: &mut World, snapshot: FixtureSnapshot, tag: FixtureTag) -> Option<&mut FixtureRole> {
    world
        .get_mut::<BodyComponent>(snapshot.owner)?
        .fixture_mut(snapshot.fixture)?
        .role_mut(tag)
}

fn block_friction(world: &World, block: FixtureSnapshot) -> Option<f32> {
    match role_of(world, block, FixtureTag::Block) {
        Some(FixtureRole::Block(surface)) => surface.friction,
        _ => None,
    }
}

fn force_of(world: &World, source: FixtureSnapshot) -> Option<Vec2> {
    match role_of(world, source, FixtureTag::Force) {
        Some(FixtureRole::Force(force)) => Some(force.current()),
        _ => None,
    }
}

fn shield_reflection(world: &World, shield: FixtureSnapshot) -> Option<crate::physics::Reflection> {
    match role_of(world, shield, FixtureTag::Shield) {
        Some(FixtureRole::Shield(reflection)) => Some(*reflection),
        _ => None,
    }
}

fn negotiate(world: &mut World, victim: FixtureSnapshot, damager: FixtureSnapshot) -> Option<DamageEvent> {
    let category = match role_of(world, damager, FixtureTag::Damager) {
        Some(FixtureRole::Damager(info)) => info.category.clone(),
        _ => return None,
    };
    let contact = DamageContact {
        damager: damager.owner,
        damager_category: category,
        victim: victim.owner,
    };
    let amount = match role_of_mut(world, victim, FixtureTag::Damageable) {
        Some(FixtureRole::Damageable(negotiator)) => negotiator.negotiate(&contact),
        _ => return None,
    };
    debug!(
        damager = %contact.damager,
        victim = %contact.victim,
        category = %contact.damager_category,
        amount,
        "damage_negotiated"
    );
    Some(DamageEvent { contact, amount })
}

fn bounce(world: &mut World, bouncer: FixtureSnapshot, contact: &Contact) -> Option<Vec2> {
    match role_of_mut(world, bouncer, FixtureTag::Bounceable) {
        Some(FixtureRole::Bounceable(Some(callback))) => callback(contact),
        _ => None,
    }
}

fn hit(world: &mut World, hitter: FixtureSnapshot, contact: &Contact) -> HitResponse {
    match role_of_mut(world, hitter, FixtureTag::HitterBox) {
        Some(FixtureRole::HitterBox(callback)) => callback(contact),
        _ => HitResponse::Continue,
    }
}

fn apply(body: &mut BodyComponent, acc: &Accumulator) {
    let dynamic = body.body_type() == BodyType::Dynamic;

    if let Some(velocity) = acc.set_velocity {
        body.set_velocity(velocity);
    }
    if acc.force != Vec2::ZERO {
        body.apply_impulse(acc.force);
    }
    if let Some(shift) = acc.ground_shift {
        body.sense(BodySense::FeetOnGround);
        if dynamic {
            body.translate(Vec2::new(0.0, shift));
            body.set_velocity_y(0.0);
            if let Some(friction) = acc.ground_friction {
                body.apply_resistance_x(friction);
            }
        }
    }
    if let Some(shift) = acc.ceiling_shift {
        body.sense(BodySense::HeadTouchingBlock);
        if dynamic && body.velocity().y > 0.0 {
            body.translate(Vec2::new(0.0, shift));
            body.set_velocity_y(0.0);
        }
    }
    if acc.left {
        body.sense(BodySense::TouchingBlockLeft);
        if dynamic {
            if acc.left_shift > 0.0 {
                body.translate(Vec2::new(acc.left_shift, 0.0));
            }
            if body.velocity().x < 0.0 {
                body.set_velocity_x(0.0);
            }
        }
    }
    if acc.right {
        body.sense(BodySense::TouchingBlockRight);
        if dynamic {
            if acc.right_shift > 0.0 {
                body.translate(Vec2::new(-acc.right_shift, 0.0));
            }
            if body.velocity().x > 0.0 {
                body.set_velocity_x(0.0);
            }
        }
    }
    if acc.water {
        body.sense(BodySense::InWater);
    }
    if acc.gate {
        body.sense(BodySense::TouchingGate);
    }
}

/// Push dynamic bodies out of abstract regions whose tag is in their mask
fn resolve_custom_collisions(world: &mut World, entities: &[Entity]) {
    let regions: Vec<(Entity, Rect, u32)> = entities
        .iter()
        .filter_map(|&entity| {
            let body = world.get::<BodyComponent>(entity)?;
            (body.body_type() == BodyType::Abstract && body.custom_collision_tag() != 0)
                .then(|| (entity, body.collision_box(), body.custom_collision_tag()))
        })
        .collect();
    if regions.is_empty() {
        return;
    }

    for &entity in entities {
        let Some(body) = world.get_mut::<BodyComponent>(entity) else {
            continue;
        };
        if body.body_type() != BodyType::Dynamic || body.custom_collision_mask() == 0 {
            continue;
        }
        for &(region_entity, region, tag) in &regions {
            if body.custom_collision_mask() & tag == 0 {
                continue;
            }
            let Some(overlap) = body.collision_box().intersection(&region) else {
                continue;
            };
            let delta = body.center() - region.center();
            let mut velocity = body.velocity();
            if overlap.width <= overlap.height {
                let dir = if delta.x < 0.0 { -1.0 } else { 1.0 };
                body.translate(Vec2::new(dir * overlap.width, 0.0));
                if velocity.x * dir < 0.0 {
                    velocity.x = 0.0;
                }
            } else {
                let dir = if delta.y < 0.0 { -1.0 } else { 1.0 };
                body.translate(Vec2::new(0.0, dir * overlap.height));
                if velocity.y * dir < 0.0 {
                    velocity.y = 0.0;
                }
            }
            body.set_velocity(velocity);
            trace!(entity = %entity, region = %region_entity, "custom_collision_pushed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(body: usize, owner: u64, shape: Rect, tags: &[FixtureTag]) -> FixtureSnapshot {
        let mut set = TagSet::default();
        for tag in tags {
            set.insert(*tag);
        }
        FixtureSnapshot {
            body,
            fixture: 0,
            owner: Entity::new(owner, 0),
            shape,
            tags: set,
        }
    }

    #[test]
    fn test_detect_orients_reactor_first() {
        let snapshots = [
            snapshot(0, 0, Rect::new(0.0, 0.0, 10.0, 1.0), &[FixtureTag::Block]),
            snapshot(1, 1, Rect::new(0.0, 1.0, 2.0, 1.0), &[FixtureTag::Feet]),
        ];
        let mut out = Vec::new();
        detect(&snapshots, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rule, ContactRule::FeetOnBlock);
        assert_eq!((out[0].a, out[0].b), (1, 0));
    }

    #[test]
    fn test_same_owner_never_contacts() {
        let snapshots = [
            snapshot(0, 7, Rect::new(0.0, 0.0, 1.0, 1.0), &[FixtureTag::Block]),
            snapshot(0, 7, Rect::new(0.0, 0.0, 1.0, 1.0), &[FixtureTag::Feet]),
        ];
        let mut out = Vec::new();
        detect(&snapshots, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_bounce_pairs_react_on_both_sides() {
        let snapshots = [
            snapshot(0, 0, Rect::new(0.0, 0.0, 1.0, 1.0), &[FixtureTag::Bounceable]),
            snapshot(1, 1, Rect::new(0.5, 0.5, 1.0, 1.0), &[FixtureTag::Bounceable]),
        ];
        let mut out = Vec::new();
        detect(&snapshots, &mut out);
        let sides: Vec<_> = out.iter().map(|c| c.a).collect();
        assert_eq!(sides, vec![0, 1]);
    }

    #[test]
    fn test_detect_large_snapshot_is_ordered() {
        let snapshots: Vec<_> = (0..100)
            .map(|i| {
                let tag = if i % 2 == 0 { FixtureTag::Block } else { FixtureTag::Feet };
                snapshot(i, i as u64, Rect::new(i as f32 * 3.0, 0.0, 1.5, 1.0), &[tag])
            })
            .collect();
        let mut out = Vec::new();
        detect(&snapshots, &mut out);
        // each feet only touches the blocks on either side, which are too far
        assert!(out.is_empty());

        let touching: Vec<_> = (0..100)
            .map(|i| {
                let tag = if i % 2 == 0 { FixtureTag::Block } else { FixtureTag::Feet };
                snapshot(i, i as u64, Rect::new(i as f32, 0.0, 1.0, 1.0), &[tag])
            })
            .collect();
        out.clear();
        detect(&touching, &mut out);
        let pairs: Vec<_> = out.iter().map(|c| (c.b, c.a)).collect();
        let mut sorted = pairs.clone();
        sorted.sort_by_key(|&(block, feet)| (block.min(feet), block.max(feet)));
        assert_eq!(pairs, sorted);
        assert_eq!(out.len(), 99);
    }
}
