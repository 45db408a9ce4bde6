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
//! Error types
//!
//! Configuration errors are raised at construction time and never clamped.
//! Missing-component errors abort the current entity's processing for the
//! frame; the scheduler logs them and moves on to the next entity.

use crate::ecs::{ComponentKind, Entity};
use thiserror::Error;

/// Invalid timer construction or reconfiguration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimerError {
    /// Duration was negative, NaN or infinite
    #[error("timer duration must be finite and non-negative, got {0}")]
    InvalidDuration(f32),
    /// A time mark was scheduled outside `[0, duration]`
    #[error("time mark {mark} lies outside [0, {duration}]")]
    MarkOutOfRange {
        /// The offending mark
        mark: f32,
        /// The timer duration
        duration: f32,
    },
}

/// Invalid simulation configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Frame delta ceiling must be positive and finite
    #[error("max frame delta must be positive and finite, got {0}")]
    InvalidMaxFrameDelta(f32),
    /// Pool must be allowed to retain at least one buffer
    #[error("buffer pool must retain at least one buffer")]
    EmptyPool,
    /// Cull bounds must have a non-negative, finite extent
    #[error("cull bounds must have finite, non-negative size")]
    InvalidCullBounds,
    /// Pendulum length must be positive and finite
    #[error("pendulum length must be positive and finite, got {0}")]
    InvalidPendulumLength(f32),
}

/// Errors raised by the simulation core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A system or behavior asked for a component the entity does not carry
    #[error("{entity} is missing required component {kind:?}")]
    MissingComponent {
        /// Entity that was being processed
        entity: Entity,
        /// The absent component kind
        kind: ComponentKind,
    },
    /// The entity handle is stale or was never created
    #[error("{0} is not alive")]
    DeadEntity(Entity),
    /// Timer misconfiguration
    #[error(transparent)]
    Timer(#[from] TimerError),
    /// Simulation misconfiguration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Shorthand for [`CoreError::MissingComponent`]
    pub fn missing(entity: Entity, kind: ComponentKind) -> Self {
        CoreError::MissingComponent { entity, kind }
    }
}
