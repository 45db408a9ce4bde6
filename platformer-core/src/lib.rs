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
//! # Platformer Core
//!
//! The simulation core of a 2D action platformer: an ECS frame scheduler,
//! priority-evaluated behavior state machines, a rectangle fixture
//! collision world and controller dispatch.
//!
//! ## Features
//!
//! - **ECS Architecture**: generational entities, a closed set of component
//!   storages and mask-selected systems with deferred structural changes
//! - **Behaviors**: per-entity state machines with `init`/`act`/`end`
//!   lifecycles evaluated in priority order
//! - **Collision World**: typed fixtures (feet, blocks, damagers, water, ...)
//!   resolved by rule after motion integration
//! - **Parallelization**: optional Rayon overlap detection behind the
//!   `parallel` feature
//! - **Timers**: countdowns with callbacks at time marks
//!
//! ## Example
//!
//! ```rust
//! use platformer_core::{Simulation, SimulationConfig};
//! use platformer_core::controller::ButtonStates;
//! use platformer_core::physics::{BodyComponent, Fixture, FixtureRole};
//!
//! let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
//! sim.world_mut()
//!     .spawn()
//!     .with(
//!         BodyComponent::fixed()
//!             .with_size(100.0, 10.0)
//!             .with_position(0.0, -10.0)
//!             .with_fixture(Fixture::new(vec![FixtureRole::block()]).with_size(100.0, 10.0)),
//!     )
//!     .id();
//!
//! let input = ButtonStates::new();
//! for _ in 0..10 {
//!     sim.step(&input, 1.0 / 60.0);
//! }
//! assert_eq!(sim.frame(), 10);
//! ```

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Behavior state machines
pub mod behavior;

/// Simulation configuration
pub mod config;

/// Controller input dispatch
pub mod controller;

/// Damage negotiation between damagers and victims
pub mod damage;

/// Error types
pub mod error;

/// Bodies, fixtures and the collision world
pub mod physics;

/// Memory pooling for reducing allocation churn
pub mod pool;

/// The standard frame loop
pub mod simulation;

/// Updatables, trajectories, pendulums, culling and debug messages
pub mod systems;

/// Countdown timers with time-marked callbacks
pub mod timer;

pub use config::SimulationConfig;
pub use controller::ControllerButton;
pub use ecs::{Entity, World};
pub use error::{ConfigError, CoreError, TimerError};
pub use simulation::Simulation;
pub use timer::{TimeMark, Timer};
