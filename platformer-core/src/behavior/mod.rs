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
//! Behavior state machines
//!
//! Each [`Behavior`] is a gated state machine evaluated once per frame:
//!
//! | was active | `evaluate` | call        |
//! |------------|------------|-------------|
//! | no         | `true`     | `init`      |
//! | yes        | `true`     | `act`       |
//! | yes        | `false`    | `end`       |
//! | no         | `false`    | nothing     |
//!
//! Behaviors of one entity run in declaration order. Which behaviors may be
//! active together is decided by their own guards, not by a central switch;
//! the shared [`JumpAction`] token and body/flag state keep them apart.

mod system;

pub use system::BehaviorSystem;

use crate::controller::InputSource;
use crate::ecs::components::{Facing, SoundComponent};
use crate::ecs::{ComponentKind, Entity};
use crate::error::CoreError;
use crate::physics::BodyComponent;
use std::fmt;
use tracing::debug;

/// Known behavior kinds, queried by animation and pre-process logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BehaviorKind {
    /// Moving along the ground
    Running,
    /// Rising from a jump
    Jumping,
    /// Sliding down a wall
    WallSliding,
    /// Dashing through the air
    AirDashing,
    /// Sliding along the ground
    GroundSliding,
    /// On a ladder
    Climbing,
    /// Swimming in water
    Swimming,
    /// Firing a weapon
    Shooting,
    /// Content-defined kind
    Custom(u8),
}

impl BehaviorKind {
    const BUILT_IN: [BehaviorKind; 8] = [
        BehaviorKind::Running,
        BehaviorKind::Jumping,
        BehaviorKind::WallSliding,
        BehaviorKind::AirDashing,
        BehaviorKind::GroundSliding,
        BehaviorKind::Climbing,
        BehaviorKind::Swimming,
        BehaviorKind::Shooting,
    ];
}

/// Set of behavior kinds
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BehaviorSet {
    // bits 0..8 are the built-in kinds, custom kind `n` is bit `8 + n`
    words: [u64; 5],
}

impl BehaviorSet {
    /// The empty set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from a list of kinds
    pub fn of(kinds: &[BehaviorKind]) -> Self {
        let mut set = Self::empty();
        for kind in kinds {
            set.insert(*kind);
        }
        set
    }

    /// Add a kind
    pub fn insert(&mut self, kind: BehaviorKind) {
        let (word, bit) = Self::locate(kind);
        self.words[word] |= bit;
    }

    /// Remove a kind
    pub fn remove(&mut self, kind: BehaviorKind) {
        let (word, bit) = Self::locate(kind);
        self.words[word] &= !bit;
    }

    /// Check membership
    pub fn contains(&self, kind: BehaviorKind) -> bool {
        let (word, bit) = Self::locate(kind);
        self.words[word] & bit != 0
    }

    /// True if no kind is set
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Iterate kinds: built-in kinds in declaration order, then custom kinds
    pub fn iter(&self) -> impl Iterator<Item = BehaviorKind> + '_ {
        BehaviorKind::BUILT_IN
            .into_iter()
            .chain((0..=u8::MAX).map(BehaviorKind::Custom))
            .filter(move |kind| self.contains(*kind))
    }

    fn locate(kind: BehaviorKind) -> (usize, u64) {
        let index = match kind {
            BehaviorKind::Running => 0,
            BehaviorKind::Jumping => 1,
            BehaviorKind::WallSliding => 2,
            BehaviorKind::AirDashing => 3,
            BehaviorKind::GroundSliding => 4,
            BehaviorKind::Climbing => 5,
            BehaviorKind::Swimming => 6,
            BehaviorKind::Shooting => 7,
            BehaviorKind::Custom(n) => 8 + usize::from(n),
        };
        (index / 64, 1 << (index % 64))
    }
}

impl fmt::Debug for BehaviorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// What the jump button does next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JumpAction {
    /// A normal jump
    #[default]
    Jump,
    /// An air dash
    AirDash,
}

/// Everything a behavior may read or write while it runs
pub struct BehaviorContext<'a> {
    entity: Entity,
    delta: f32,
    input: &'a dyn InputSource,
    active: BehaviorSet,
    next_jump: JumpAction,
    body: Option<&'a mut BodyComponent>,
    facing: Option<&'a mut Facing>,
    sounds: Option<&'a mut SoundComponent>,
}

impl<'a> BehaviorContext<'a> {
    /// Create a context with no components attached
    pub fn new(entity: Entity, delta: f32, input: &'a dyn InputSource) -> Self {
        BehaviorContext {
            entity,
            delta,
            input,
            active: BehaviorSet::empty(),
            next_jump: JumpAction::default(),
            body: None,
            facing: None,
            sounds: None,
        }
    }

    /// Give behaviors access to the entity's body
    pub fn with_body(mut self, body: &'a mut BodyComponent) -> Self {
        self.body = Some(body);
        self
    }

    /// Give behaviors access to the entity's facing
    pub fn with_facing(mut self, facing: &'a mut Facing) -> Self {
        self.facing = Some(facing);
        self
    }

    /// Give behaviors access to the entity's sound queue
    pub fn with_sounds(mut self, sounds: &'a mut SoundComponent) -> Self {
        self.sounds = Some(sounds);
        self
    }

    /// Entity being processed
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Frame delta in seconds
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Input state for this frame
    pub fn input(&self) -> &dyn InputSource {
        self.input
    }

    /// True if a behavior of `kind` is currently active on this entity
    pub fn is(&self, kind: BehaviorKind) -> bool {
        self.active.contains(kind)
    }

    /// Currently active kinds
    pub fn active_kinds(&self) -> BehaviorSet {
        self.active
    }

    /// True if the entity has a body
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// The entity's body
    pub fn body(&mut self) -> Result<&mut BodyComponent, CoreError> {
        let entity = self.entity;
        self.body
            .as_deref_mut()
            .ok_or(CoreError::missing(entity, ComponentKind::Body))
    }

    /// The entity's facing
    pub fn facing(&mut self) -> Result<&mut Facing, CoreError> {
        let entity = self.entity;
        self.facing
            .as_deref_mut()
            .ok_or(CoreError::missing(entity, ComponentKind::Facing))
    }

    /// The entity's sound queue
    pub fn sounds(&mut self) -> Result<&mut SoundComponent, CoreError> {
        let entity = self.entity;
        self.sounds
            .as_deref_mut()
            .ok_or(CoreError::missing(entity, ComponentKind::Sound))
    }

    /// Queue a sound if the entity has a sound queue
    pub fn request_sound(&mut self, key: &str) {
        match self.sounds.as_deref_mut() {
            Some(sounds) => sounds.request(key),
            None => debug!(entity = %self.entity, key, "sound_request_dropped"),
        }
    }

    /// What the jump button does next
    pub fn next_jump(&self) -> JumpAction {
        self.next_jump
    }

    /// Change what the jump button does next
    pub fn set_next_jump(&mut self, action: JumpAction) {
        self.next_jump = action;
    }
}

/// A gated state machine controlling one movement or ability mode
///
/// `act` runs every frame the behavior stays active and must be idempotent
/// under repeated invocation: one-shot effects belong in `init` or `end`.
pub trait Behavior {
    /// Kind reported while this behavior is active
    fn kind(&self) -> Option<BehaviorKind> {
        None
    }

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Decide whether the behavior should be active this frame
    fn evaluate(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<bool, CoreError>;

    /// First active frame
    fn init(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }

    /// Every following active frame
    fn act(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }

    /// First frame `evaluate` returns false after being active
    fn end(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }
}

type Evaluate = Box<dyn FnMut(&mut BehaviorContext<'_>) -> Result<bool, CoreError>>;
type Hook = Box<dyn FnMut(&mut BehaviorContext<'_>) -> Result<(), CoreError>>;

/// A behavior assembled from closures
///
/// ```
/// use platformer_core::behavior::{BehaviorKind, FnBehavior};
///
/// let running = FnBehavior::new(|ctx| Ok(ctx.input().is_pressed(platformer_core::ControllerButton::Right)))
///     .with_kind(BehaviorKind::Running)
///     .on_act(|ctx| {
///         ctx.body()?.set_velocity_x(5.0);
///         Ok(())
///     });
/// # let _ = running;
/// ```
pub struct FnBehavior {
    kind: Option<BehaviorKind>,
    evaluate: Evaluate,
    init: Option<Hook>,
    act: Option<Hook>,
    end: Option<Hook>,
}

impl FnBehavior {
    /// Create a behavior from its gate
    pub fn new(evaluate: impl FnMut(&mut BehaviorContext<'_>) -> Result<bool, CoreError> + 'static) -> Self {
        FnBehavior {
            kind: None,
            evaluate: Box::new(evaluate),
            init: None,
            act: None,
            end: None,
        }
    }

    /// Report `kind` while active
    pub fn with_kind(mut self, kind: BehaviorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the `init` hook
    pub fn on_init(mut self, hook: impl FnMut(&mut BehaviorContext<'_>) -> Result<(), CoreError> + 'static) -> Self {
        self.init = Some(Box::new(hook));
        self
    }

    /// Set the `act` hook
    pub fn on_act(mut self, hook: impl FnMut(&mut BehaviorContext<'_>) -> Result<(), CoreError> + 'static) -> Self {
        self.act = Some(Box::new(hook));
        self
    }

    /// Set the `end` hook
    pub fn on_end(mut self, hook: impl FnMut(&mut BehaviorContext<'_>) -> Result<(), CoreError> + 'static) -> Self {
        self.end = Some(Box::new(hook));
        self
    }
}

fn run_hook(hook: &mut Option<Hook>, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
    match hook {
        Some(hook) => hook(ctx),
        None => Ok(()),
    }
}

impl Behavior for FnBehavior {
    fn kind(&self) -> Option<BehaviorKind> {
        self.kind
    }

    fn name(&self) -> &str {
        "fn_behavior"
    }

    fn evaluate(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<bool, CoreError> {
        (self.evaluate)(ctx)
    }

    fn init(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        run_hook(&mut self.init, ctx)
    }

    fn act(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        run_hook(&mut self.act, ctx)
    }

    fn end(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        run_hook(&mut self.end, ctx)
    }
}

struct Slot {
    behavior: Box<dyn Behavior>,
    active: bool,
}

/// Ordered collection of behaviors attached to one entity
#[derive(Default)]
pub struct BehaviorComponent {
    slots: Vec<Slot>,
    active: BehaviorSet,
    next_jump: JumpAction,
}

impl BehaviorComponent {
    /// Create an empty component
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a behavior; behaviors run in the order they were added
    pub fn add(&mut self, behavior: impl Behavior + 'static) {
        self.slots.push(Slot {
            behavior: Box::new(behavior),
            active: false,
        });
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, behavior: impl Behavior + 'static) -> Self {
        self.add(behavior);
        self
    }

    /// Number of behaviors
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if there are no behaviors
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True if a behavior of `kind` is active
    pub fn is(&self, kind: BehaviorKind) -> bool {
        self.active.contains(kind)
    }

    /// Every active kind
    pub fn active_kinds(&self) -> BehaviorSet {
        self.active
    }

    /// True if the behavior at `index` is active
    pub fn is_behavior_active(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.active)
    }

    /// What the jump button does next
    pub fn next_jump(&self) -> JumpAction {
        self.next_jump
    }

    /// Evaluate every behavior once, in declaration order
    ///
    /// An error aborts the remaining behaviors for this frame; behaviors
    /// already processed keep their new state.
    pub fn update(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        self.with_context(ctx, |slots, ctx| {
            for slot in slots.iter_mut() {
                let should_be_active = slot.behavior.evaluate(ctx)?;
                match (slot.active, should_be_active) {
                    (false, true) => {
                        // the kind is visible to `init`, but the slot only
                        // turns active once `init` succeeds
                        let kind = slot.behavior.kind();
                        if let Some(kind) = kind {
                            ctx.active.insert(kind);
                        }
                        if let Err(err) = slot.behavior.init(ctx) {
                            if let Some(kind) = kind {
                                ctx.active.remove(kind);
                            }
                            return Err(err);
                        }
                        slot.active = true;
                        debug!(entity = %ctx.entity, behavior = slot.behavior.name(), "behavior_started");
                    }
                    (true, true) => slot.behavior.act(ctx)?,
                    (true, false) => deactivate(slot, ctx)?,
                    (false, false) => {}
                }
            }
            Ok(())
        })
    }

    /// Force `end` on every active behavior
    pub fn deactivate_all(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
        self.with_context(ctx, |slots, ctx| {
            for slot in slots.iter_mut().filter(|slot| slot.active) {
                deactivate(slot, ctx)?;
            }
            Ok(())
        })
    }

    fn with_context(
        &mut self,
        ctx: &mut BehaviorContext<'_>,
        run: impl FnOnce(&mut [Slot], &mut BehaviorContext<'_>) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        ctx.active = self.active;
        ctx.next_jump = self.next_jump;
        let result = run(&mut self.slots, ctx);
        self.active = ctx.active;
        self.next_jump = ctx.next_jump;
        result
    }
}

fn deactivate(slot: &mut Slot, ctx: &mut BehaviorContext<'_>) -> Result<(), CoreError> {
    let result = slot.behavior.end(ctx);
    slot.active = false;
    if let Some(kind) = slot.behavior.kind() {
        ctx.active.remove(kind);
    }
    debug!(entity = %ctx.entity, behavior = slot.behavior.name(), "behavior_ended");
    result
}

impl fmt::Debug for BehaviorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorComponent")
            .field("behaviors", &self.slots.len())
            .field("active", &self.active)
            .field("next_jump", &self.next_jump)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ButtonStates;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_behavior_set_custom_kinds() {
        let mut set = BehaviorSet::of(&[BehaviorKind::Running, BehaviorKind::Custom(200)]);
        assert!(set.contains(BehaviorKind::Custom(200)));
        assert!(!set.contains(BehaviorKind::Custom(8)));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![BehaviorKind::Running, BehaviorKind::Custom(200)]
        );
        set.remove(BehaviorKind::Custom(200));
        set.remove(BehaviorKind::Running);
        assert!(set.is_empty());
    }

    #[test]
    fn test_kind_active_during_init_and_cleared_after_end() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (at_init, at_end) = (Rc::clone(&seen), Rc::clone(&seen));
        let gate = Rc::new(RefCell::new(true));
        let open = Rc::clone(&gate);

        let mut component = BehaviorComponent::new().with(
            FnBehavior::new(move |_| Ok(*open.borrow()))
                .with_kind(BehaviorKind::Climbing)
                .on_init(move |ctx| {
                    at_init.borrow_mut().push(ctx.is(BehaviorKind::Climbing));
                    Ok(())
                })
                .on_end(move |ctx| {
                    at_end.borrow_mut().push(ctx.is(BehaviorKind::Climbing));
                    Ok(())
                }),
        );

        let input = ButtonStates::new();
        let mut ctx = BehaviorContext::new(Entity::new(0, 0), 0.016, &input);
        component.update(&mut ctx).unwrap();
        assert!(component.is(BehaviorKind::Climbing));

        *gate.borrow_mut() = false;
        component.update(&mut ctx).unwrap();
        assert!(!component.is(BehaviorKind::Climbing));
        assert!(!component.is_behavior_active(0));
        // still set while `end` runs
        assert_eq!(*seen.borrow(), vec![true, true]);
    }

    #[test]
    fn test_missing_body_is_reported() {
        let mut component = BehaviorComponent::new().with(FnBehavior::new(|ctx| {
            ctx.body()?;
            Ok(true)
        }));
        let input = ButtonStates::new();
        let entity = Entity::new(5, 0);
        let mut ctx = BehaviorContext::new(entity, 0.016, &input);
        assert_eq!(
            component.update(&mut ctx),
            Err(CoreError::missing(entity, ComponentKind::Body))
        );
        assert!(!component.is_behavior_active(0));
    }

    #[test]
    fn test_next_jump_shared_between_behaviors() {
        let mut component = BehaviorComponent::new()
            .with(FnBehavior::new(|ctx| {
                ctx.set_next_jump(JumpAction::AirDash);
                Ok(false)
            }))
            .with(FnBehavior::new(|ctx| Ok(ctx.next_jump() == JumpAction::AirDash)));

        let input = ButtonStates::new();
        let mut ctx = BehaviorContext::new(Entity::new(0, 0), 0.016, &input);
        component.update(&mut ctx).unwrap();
        assert_eq!(component.next_jump(), JumpAction::AirDash);
        assert!(component.is_behavior_active(1));
    }

    #[test]
    fn test_deactivate_all_ends_active_behaviors() {
        let ended = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&ended);
        let mut component = BehaviorComponent::new()
            .with(
                FnBehavior::new(|_| Ok(true))
                    .with_kind(BehaviorKind::Shooting)
                    .on_end(move |_| {
                        *counter.borrow_mut() += 1;
                        Ok(())
                    }),
            )
            .with(FnBehavior::new(|_| Ok(false)));

        let input = ButtonStates::new();
        let mut ctx = BehaviorContext::new(Entity::new(0, 0), 0.016, &input);
        component.update(&mut ctx).unwrap();
        component.deactivate_all(&mut ctx).unwrap();

        assert_eq!(*ended.borrow(), 1);
        assert!(component.active_kinds().is_empty());
    }

    #[test]
    fn test_failed_init_leaves_behavior_inactive() {
        let acts = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&acts);
        let mut component = BehaviorComponent::new().with(
            FnBehavior::new(|_| Ok(true))
                .with_kind(BehaviorKind::Swimming)
                .on_init(|ctx| {
                    ctx.body()?;
                    Ok(())
                })
                .on_act(move |_| {
                    *counter.borrow_mut() += 1;
                    Ok(())
                }),
        );

        let input = ButtonStates::new();
        let entity = Entity::new(2, 0);
        let mut ctx = BehaviorContext::new(entity, 0.016, &input);
        assert!(component.update(&mut ctx).is_err());
        assert!(!component.is_behavior_active(0));
        assert!(!component.is(BehaviorKind::Swimming));

        // next frame retries `init` instead of acting
        assert!(component.update(&mut ctx).is_err());
        assert_eq!(*acts.borrow(), 0);

        let mut body = BodyComponent::dynamic();
        let mut ctx = BehaviorContext::new(entity, 0.016, &input).with_body(&mut body);
        component.update(&mut ctx).unwrap();
        assert!(component.is(BehaviorKind::Swimming));
        assert_eq!(*acts.borrow(), 0);
    }
}
