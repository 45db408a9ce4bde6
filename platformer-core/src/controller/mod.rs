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
//! Controller adapter dispatch
//!
//! Input is polled, never pushed. Each frame every button is queried in
//! [`ControllerButton::ALL`] order and exactly one callback of the entity's
//! adapter for that button fires, chosen in this order:
//!
//! 1. just pressed: [`ControllerAdapter::on_just_pressed`]
//! 2. held: [`ControllerAdapter::on_press_continued`]
//! 3. just released: [`ControllerAdapter::on_just_released`]
//! 4. otherwise: [`ControllerAdapter::on_release_continued`]

mod system;

pub use system::ControllerSystem;

use crate::behavior::{BehaviorKind, BehaviorSet};
use crate::ecs::components::Facing;
use crate::ecs::{ComponentKind, Entity};
use crate::error::CoreError;
use crate::physics::BodyComponent;
use std::fmt;

/// Buttons of the virtual controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControllerButton {
    /// D-pad left
    Left,
    /// D-pad right
    Right,
    /// D-pad up
    Up,
    /// D-pad down
    Down,
    /// Jump
    A,
    /// Attack
    B,
    /// Special
    X,
    /// Pause
    Start,
    /// Menu
    Select,
}

impl ControllerButton {
    /// Every button, in polling order
    pub const ALL: [ControllerButton; 9] = [
        ControllerButton::Left,
        ControllerButton::Right,
        ControllerButton::Up,
        ControllerButton::Down,
        ControllerButton::A,
        ControllerButton::B,
        ControllerButton::X,
        ControllerButton::Start,
        ControllerButton::Select,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Source of polled button state
pub trait InputSource {
    /// Button is down this frame
    fn is_pressed(&self, button: ControllerButton) -> bool;

    /// Button went down this frame
    fn is_just_pressed(&self, button: ControllerButton) -> bool;

    /// Button went up this frame
    fn is_just_released(&self, button: ControllerButton) -> bool;
}

/// Snapshot input source driven by explicit press/release calls
///
/// Call [`advance`](ButtonStates::advance) once per frame before applying
/// the frame's presses and releases.
///
/// ```
/// use platformer_core::controller::{ButtonStates, ControllerButton, InputSource};
///
/// let mut input = ButtonStates::new();
/// input.press(ControllerButton::A);
/// assert!(input.is_just_pressed(ControllerButton::A));
/// input.advance();
/// assert!(input.is_pressed(ControllerButton::A));
/// assert!(!input.is_just_pressed(ControllerButton::A));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonStates {
    current: u16,
    previous: u16,
}

impl ButtonStates {
    /// All buttons up
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `button` down
    pub fn press(&mut self, button: ControllerButton) {
        self.current |= 1 << button.index();
    }

    /// Let `button` go
    pub fn release(&mut self, button: ControllerButton) {
        self.current &= !(1 << button.index());
    }

    /// Set `button` from a boolean
    pub fn set(&mut self, button: ControllerButton, pressed: bool) {
        if pressed {
            self.press(button);
        } else {
            self.release(button);
        }
    }

    /// Start a new frame: the current state becomes the previous state
    pub fn advance(&mut self) {
        self.previous = self.current;
    }

    fn was_pressed(&self, button: ControllerButton) -> bool {
        self.previous & (1 << button.index()) != 0
    }
}

impl InputSource for ButtonStates {
    fn is_pressed(&self, button: ControllerButton) -> bool {
        self.current & (1 << button.index()) != 0
    }

    fn is_just_pressed(&self, button: ControllerButton) -> bool {
        self.is_pressed(button) && !self.was_pressed(button)
    }

    fn is_just_released(&self, button: ControllerButton) -> bool {
        !self.is_pressed(button) && self.was_pressed(button)
    }
}

/// What an adapter callback may read or write
pub struct AdapterContext<'a> {
    entity: Entity,
    delta: f32,
    input: &'a dyn InputSource,
    behaviors: BehaviorSet,
    body: Option<&'a mut BodyComponent>,
    facing: Option<&'a mut Facing>,
}

impl<'a> AdapterContext<'a> {
    /// Create a context with no components attached
    pub fn new(entity: Entity, delta: f32, input: &'a dyn InputSource) -> Self {
        AdapterContext {
            entity,
            delta,
            input,
            behaviors: BehaviorSet::empty(),
            body: None,
            facing: None,
        }
    }

    /// Attach the entity's body
    pub fn with_body(mut self, body: &'a mut BodyComponent) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach the entity's facing
    pub fn with_facing(mut self, facing: &'a mut Facing) -> Self {
        self.facing = Some(facing);
        self
    }

    /// Attach a read-only view of the entity's active behaviors
    pub fn with_behaviors(mut self, behaviors: BehaviorSet) -> Self {
        self.behaviors = behaviors;
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

    /// True if a behavior of `kind` is active
    pub fn is_behavior_active(&self, kind: BehaviorKind) -> bool {
        self.behaviors.contains(kind)
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
}

/// Per-button input handler
pub trait ControllerAdapter {
    /// Button went down this frame
    fn on_just_pressed(&mut self, _ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }

    /// Button is still held
    fn on_press_continued(&mut self, _ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }

    /// Button went up this frame
    fn on_just_released(&mut self, _ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }

    /// Button is still up
    fn on_release_continued(&mut self, _ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }
}

type AdapterHook = Box<dyn FnMut(&mut AdapterContext<'_>) -> Result<(), CoreError>>;

/// Adapter assembled from optional closures
#[derive(Default)]
pub struct ButtonAdapter {
    just_pressed: Option<AdapterHook>,
    press_continued: Option<AdapterHook>,
    just_released: Option<AdapterHook>,
    release_continued: Option<AdapterHook>,
}

impl ButtonAdapter {
    /// An adapter that does nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle the press edge
    pub fn on_just_pressed(
        mut self,
        hook: impl FnMut(&mut AdapterContext<'_>) -> Result<(), CoreError> + 'static,
    ) -> Self {
        self.just_pressed = Some(Box::new(hook));
        self
    }

    /// Handle held frames
    pub fn on_press_continued(
        mut self,
        hook: impl FnMut(&mut AdapterContext<'_>) -> Result<(), CoreError> + 'static,
    ) -> Self {
        self.press_continued = Some(Box::new(hook));
        self
    }

    /// Handle the release edge
    pub fn on_just_released(
        mut self,
        hook: impl FnMut(&mut AdapterContext<'_>) -> Result<(), CoreError> + 'static,
    ) -> Self {
        self.just_released = Some(Box::new(hook));
        self
    }

    /// Handle released frames
    pub fn on_release_continued(
        mut self,
        hook: impl FnMut(&mut AdapterContext<'_>) -> Result<(), CoreError> + 'static,
    ) -> Self {
        self.release_continued = Some(Box::new(hook));
        self
    }
}

fn call(hook: &mut Option<AdapterHook>, ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
    match hook {
        Some(hook) => hook(ctx),
        None => Ok(()),
    }
}

impl ControllerAdapter for ButtonAdapter {
    fn on_just_pressed(&mut self, ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        call(&mut self.just_pressed, ctx)
    }

    fn on_press_continued(&mut self, ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        call(&mut self.press_continued, ctx)
    }

    fn on_just_released(&mut self, ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        call(&mut self.just_released, ctx)
    }

    fn on_release_continued(&mut self, ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        call(&mut self.release_continued, ctx)
    }
}

/// Per-entity table of button adapters, at most one per button
#[derive(Default)]
pub struct ControllerComponent {
    adapters: [Option<Box<dyn ControllerAdapter>>; 9],
}

impl ControllerComponent {
    /// A component with no adapters
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` for `button`, replacing any previous one
    pub fn set_adapter(&mut self, button: ControllerButton, adapter: impl ControllerAdapter + 'static) {
        self.adapters[button.index()] = Some(Box::new(adapter));
    }

    /// Builder form of [`set_adapter`](Self::set_adapter)
    pub fn with_adapter(mut self, button: ControllerButton, adapter: impl ControllerAdapter + 'static) -> Self {
        self.set_adapter(button, adapter);
        self
    }

    /// Drop the adapter for `button`
    pub fn remove_adapter(&mut self, button: ControllerButton) -> bool {
        self.adapters[button.index()].take().is_some()
    }

    /// True if `button` has an adapter
    pub fn has_adapter(&self, button: ControllerButton) -> bool {
        self.adapters[button.index()].is_some()
    }

    /// Fire one callback per registered button, in polling order
    ///
    /// An error stops dispatch for the remaining buttons this frame.
    pub fn dispatch(&mut self, ctx: &mut AdapterContext<'_>) -> Result<(), CoreError> {
        for button in ControllerButton::ALL {
            let Some(adapter) = self.adapters[button.index()].as_mut() else {
                continue;
            };
            let input = ctx.input;
            if input.is_just_pressed(button) {
                adapter.on_just_pressed(ctx)?;
            } else if input.is_pressed(button) {
                adapter.on_press_continued(ctx)?;
            } else if input.is_just_released(button) {
                adapter.on_just_released(ctx)?;
            } else {
                adapter.on_release_continued(ctx)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ControllerComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buttons: Vec<_> = ControllerButton::ALL
            .into_iter()
            .filter(|b| self.has_adapter(*b))
            .collect();
        f.debug_struct("ControllerComponent").field("buttons", &buttons).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>) -> ButtonAdapter {
        let (a, b, c, d) = (Rc::clone(log), Rc::clone(log), Rc::clone(log), Rc::clone(log));
        ButtonAdapter::new()
            .on_just_pressed(move |_| {
                a.borrow_mut().push("just_pressed");
                Ok(())
            })
            .on_press_continued(move |_| {
                b.borrow_mut().push("held");
                Ok(())
            })
            .on_just_released(move |_| {
                c.borrow_mut().push("just_released");
                Ok(())
            })
            .on_release_continued(move |_| {
                d.borrow_mut().push("released");
                Ok(())
            })
    }

    #[test]
    fn test_exactly_one_callback_per_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut component = ControllerComponent::new().with_adapter(ControllerButton::A, recorder(&log));
        let mut input = ButtonStates::new();
        let entity = Entity::new(0, 0);

        let frame = |input: &ButtonStates, component: &mut ControllerComponent| {
            let mut ctx = AdapterContext::new(entity, 0.016, input);
            component.dispatch(&mut ctx).unwrap();
        };

        frame(&input, &mut component);
        input.advance();
        input.press(ControllerButton::A);
        frame(&input, &mut component);
        input.advance();
        frame(&input, &mut component);
        input.advance();
        input.release(ControllerButton::A);
        frame(&input, &mut component);

        assert_eq!(*log.borrow(), vec!["released", "just_pressed", "held", "just_released"]);
    }

    #[test]
    fn test_polling_order_is_fixed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (right, left) = (Rc::clone(&log), Rc::clone(&log));
        let mut component = ControllerComponent::new()
            .with_adapter(
                ControllerButton::Right,
                ButtonAdapter::new().on_press_continued(move |_| {
                    right.borrow_mut().push(ControllerButton::Right);
                    Ok(())
                }),
            )
            .with_adapter(
                ControllerButton::Left,
                ButtonAdapter::new().on_press_continued(move |_| {
                    left.borrow_mut().push(ControllerButton::Left);
                    Ok(())
                }),
            );

        let mut input = ButtonStates::new();
        input.press(ControllerButton::Right);
        input.press(ControllerButton::Left);
        input.advance();
        let mut ctx = AdapterContext::new(Entity::new(0, 0), 0.016, &input);
        component.dispatch(&mut ctx).unwrap();

        assert_eq!(*log.borrow(), vec![ControllerButton::Left, ControllerButton::Right]);
    }

    #[test]
    fn test_adapter_without_body_fails() {
        let mut component = ControllerComponent::new().with_adapter(
            ControllerButton::B,
            ButtonAdapter::new().on_release_continued(|ctx| {
                ctx.body()?.set_velocity_x(0.0);
                Ok(())
            }),
        );
        let input = ButtonStates::new();
        let entity = Entity::new(2, 0);
        let mut ctx = AdapterContext::new(entity, 0.016, &input);
        assert_eq!(
            component.dispatch(&mut ctx),
            Err(CoreError::missing(entity, ComponentKind::Body))
        );
        assert!(component.remove_adapter(ControllerButton::B));
        assert!(!component.has_adapter(ControllerButton::B));
    }
}
