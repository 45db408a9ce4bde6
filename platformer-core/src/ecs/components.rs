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
//! Small shared data components
//!
//! These carry no behavior. Presentation layers read them after the frame
//! has been simulated; the core only writes them.

/// Horizontal direction an entity faces
///
/// # Examples
///
/// ```
/// use platformer_core::ecs::components::Facing;
///
/// let facing = Facing::Left;
/// assert_eq!(facing.sign(), -1.0);
/// assert_eq!(facing.flipped(), Facing::Right);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    /// Facing toward negative x
    Left,
    /// Facing toward positive x
    #[default]
    Right,
}

impl Facing {
    /// `-1.0` for left, `1.0` for right
    pub fn sign(&self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// The opposite direction
    pub fn flipped(&self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Queue of named sound requests
///
/// Behaviors and callbacks push sound keys here; the external audio layer
/// drains the queue once per frame. Nothing in the core plays audio.
#[derive(Debug, Clone, Default)]
pub struct SoundComponent {
    requests: Vec<String>,
}

impl SoundComponent {
    /// Create an empty request queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sound by key
    pub fn request(&mut self, key: impl Into<String>) {
        self.requests.push(key.into());
    }

    /// Pending requests in the order they were made
    pub fn pending(&self) -> &[String] {
        &self.requests
    }

    /// Take every pending request, leaving the queue empty
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.requests)
    }
}
