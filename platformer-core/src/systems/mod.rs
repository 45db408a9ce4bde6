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
//! Smaller gameplay systems
//!
//! Each module pairs one component with the system that drives it.

mod cull;
mod debug;
mod pendulum;
mod trajectory;
mod updatable;

pub use cull::{CullBounds, CullComponent, CullSystem};
pub use debug::{DebugBoard, DebugMessageComponent, DebugMessageSystem};
pub use pendulum::{Pendulum, PendulumComponent, PendulumSystem};
pub use trajectory::{TrajectoryComponent, TrajectorySystem};
pub use updatable::{UpdatableComponent, UpdatableSystem, UpdateContext};
