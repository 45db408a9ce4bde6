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
//! Simulation configuration

use crate::error::ConfigError;
use crate::physics::Rect;
use crate::pool::PoolConfig;

/// Settings for a [`Simulation`](crate::Simulation)
///
/// # Examples
///
/// ```
/// use platformer_core::SimulationConfig;
/// use platformer_core::physics::Rect;
///
/// let config = SimulationConfig::default()
///     .with_max_frame_delta(1.0 / 30.0)
///     .with_cull_bounds(Rect::new(0.0, 0.0, 320.0, 240.0));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Frame deltas above this many seconds are clamped down to it
    pub max_frame_delta: f32,
    /// Number of debug message slots
    pub debug_message_slots: usize,
    /// Initial culling region; `None` disables culling
    pub cull_bounds: Option<Rect>,
    /// Buffer pool settings for the collision world
    pub pool: PoolConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            max_frame_delta: 0.05,
            debug_message_slots: 8,
            cull_bounds: None,
            pool: PoolConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Set the frame delta ceiling
    pub fn with_max_frame_delta(mut self, seconds: f32) -> Self {
        self.max_frame_delta = seconds;
        self
    }

    /// Set the number of debug message slots
    pub fn with_debug_message_slots(mut self, slots: usize) -> Self {
        self.debug_message_slots = slots;
        self
    }

    /// Set the initial culling region
    pub fn with_cull_bounds(mut self, bounds: Rect) -> Self {
        self.cull_bounds = Some(bounds);
        self
    }

    /// Set the collision world's buffer pool settings
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Check every value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_frame_delta.is_finite() || self.max_frame_delta <= 0.0 {
            return Err(ConfigError::InvalidMaxFrameDelta(self.max_frame_delta));
        }
        if self.pool.max_pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if let Some(bounds) = self.cull_bounds {
            let finite = [bounds.x, bounds.y, bounds.width, bounds.height]
                .iter()
                .all(|v| v.is_finite());
            if !finite || bounds.width < 0.0 || bounds.height < 0.0 {
                return Err(ConfigError::InvalidCullBounds);
            }
        }
        Ok(())
    }
}
