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
//! Rectangle physics and fixture collision
//!
//! This module provides:
//! - Axis-aligned rectangles with closed-interval overlap
//! - Fixtures with typed role payloads
//! - Bodies with gravity, resistance and derived sense flags
//! - The collision world that integrates and resolves every frame

mod body;
pub mod collision;
mod fixture;
mod shape;
mod system;

pub use body::{BodyComponent, BodySense, BodySenses, BodyType, PreProcessHook};
pub use collision::{CollisionWorld, ContactRule, DamageEvent};
pub use fixture::{
    BlockSurface, BounceCallback, Contact, DamagerInfo, Fixture, FixtureRole, FixtureTag, ForceSource,
    HitCallback, HitResponse, Reflection,
};
pub use shape::Rect;
pub use system::WorldSystem;
