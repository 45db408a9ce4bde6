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
//! Swinging movement
//!
//! A pendulum hangs from a fixed anchor. Each frame it advances by one
//! semi-implicit Euler step and the body is given the velocity that carries
//! its center onto the bob during integration. Like trajectories, the body
//! should be dynamic with gravity off so nothing else bends the arc.

use crate::ecs::{ComponentKind, ComponentMask, Entity, FrameContext, System, World};
use crate::error::{ConfigError, CoreError};
use crate::physics::BodyComponent;
use glam::Vec2;
use std::fmt;

/// Damped simple pendulum
///
/// `angle` is measured from straight down, positive towards `+x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pendulum {
    anchor: Vec2,
    length: f32,
    gravity: f32,
    damping: f32,
    angle: f32,
    angular_velocity: f32,
}

impl Pendulum {
    /// Hang a pendulum of `length` from `anchor`, released at `angle` radians
    ///
    /// `gravity` is the magnitude of the downward pull.
    pub fn new(anchor: Vec2, length: f32, gravity: f32, angle: f32) -> Result<Self, CoreError> {
        if !length.is_finite() || length <= 0.0 {
            return Err(ConfigError::InvalidPendulumLength(length).into());
        }
        Ok(Pendulum {
            anchor,
            length,
            gravity,
            damping: 0.0,
            angle,
            angular_velocity: 0.0,
        })
    }

    /// Angular velocity lost per second, proportional to the current speed
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.max(0.0);
        self
    }

    /// Fixed point the pendulum hangs from
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Move the anchor; the bob follows on the next update
    pub fn set_anchor(&mut self, anchor: Vec2) {
        self.anchor = anchor;
    }

    /// Current angle from straight down, in radians
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Current angular velocity, in radians per second
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Rod length
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Position of the bob
    pub fn point(&self) -> Vec2 {
        self.anchor + self.length * Vec2::new(self.angle.sin(), -self.angle.cos())
    }

    /// Advance the swing by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        let delta = delta.max(0.0);
        let acceleration =
            -(self.gravity / self.length) * self.angle.sin() - self.damping * self.angular_velocity;
        self.angular_velocity += acceleration * delta;
        self.angle += self.angular_velocity * delta;
    }
}

type SwingFn = Box<dyn FnMut(&Pendulum)>;

/// Drives a body's center along a pendulum arc
pub struct PendulumComponent {
    pendulum: Pendulum,
    on_swing: Option<SwingFn>,
}

impl PendulumComponent {
    /// Wrap a pendulum
    pub fn new(pendulum: Pendulum) -> Self {
        PendulumComponent {
            pendulum,
            on_swing: None,
        }
    }

    /// Run `callback` with the pendulum after every update
    pub fn on_swing(mut self, callback: impl FnMut(&Pendulum) + 'static) -> Self {
        self.on_swing = Some(Box::new(callback));
        self
    }

    /// The driven pendulum
    pub fn pendulum(&self) -> &Pendulum {
        &self.pendulum
    }

    /// The driven pendulum, mutably
    pub fn pendulum_mut(&mut self) -> &mut Pendulum {
        &mut self.pendulum
    }

    fn update(&mut self, delta: f32) -> Vec2 {
        self.pendulum.update(delta);
        if let Some(callback) = self.on_swing.as_mut() {
            callback(&self.pendulum);
        }
        self.pendulum.point()
    }
}

impl fmt::Debug for PendulumComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendulumComponent")
            .field("pendulum", &self.pendulum)
            .field("on_swing", &self.on_swing.is_some())
            .finish()
    }
}

/// Steers bodies onto their pendulum's bob
#[derive(Debug, Default)]
pub struct PendulumSystem;

impl System for PendulumSystem {
    fn name(&self) -> &str {
        "pendulum"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::of(&[ComponentKind::Pendulum, ComponentKind::Body])
    }

    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        frame: &FrameContext<'_>,
    ) -> Result<(), CoreError> {
        let target = world.require_mut::<PendulumComponent>(entity)?.update(frame.delta);
        let body = world.require_mut::<BodyComponent>(entity)?;
        if frame.delta > 0.0 {
            body.set_velocity((target - body.center()) / frame.delta);
        } else {
            body.set_velocity(Vec2::ZERO);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_bob_hangs_below_anchor() {
        let pendulum = Pendulum::new(Vec2::new(5.0, 10.0), 4.0, 10.0, 0.0).unwrap();
        assert!((pendulum.point() - Vec2::new(5.0, 6.0)).length() < 1e-6);
    }

    #[test]
    fn test_released_pendulum_swings_through_bottom() {
        let mut pendulum = Pendulum::new(Vec2::ZERO, 1.0, 10.0, 0.5).unwrap();
        let mut crossed = false;
        for _ in 0..200 {
            pendulum.update(0.01);
            if pendulum.angle() < 0.0 {
                crossed = true;
                break;
            }
        }
        assert!(crossed);
        assert!(pendulum.angular_velocity() < 0.0);
    }

    #[test]
    fn test_damping_shrinks_amplitude() {
        let mut free = Pendulum::new(Vec2::ZERO, 1.0, 10.0, 0.5).unwrap();
        let mut damped = free.with_damping(1.0);
        let mut free_peak: f32 = 0.0;
        let mut damped_peak: f32 = 0.0;
        for step in 0..1000 {
            free.update(0.005);
            damped.update(0.005);
            if step > 800 {
                free_peak = free_peak.max(free.angle().abs());
                damped_peak = damped_peak.max(damped.angle().abs());
            }
        }
        assert!(free_peak > 0.4, "free peak = {free_peak}");
        assert!(damped_peak < free_peak * 0.2, "damped peak = {damped_peak}");
    }

    #[test]
    fn test_invalid_length_rejected() {
        let err = Pendulum::new(Vec2::ZERO, 0.0, 10.0, 0.0).unwrap_err();
        assert_eq!(err, CoreError::Config(ConfigError::InvalidPendulumLength(0.0)));
    }

    #[test]
    fn test_swing_callback_sees_each_update() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let pendulum = Pendulum::new(Vec2::ZERO, 2.0, 10.0, 0.3).unwrap();
        let mut component = PendulumComponent::new(pendulum).on_swing(move |_| counter.set(counter.get() + 1));
        component.update(0.016);
        component.update(0.016);
        assert_eq!(calls.get(), 2);
    }
}
