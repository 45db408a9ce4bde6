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
//! Memory pooling for reducing allocation churn
//!
//! The collision world rebuilds fixture snapshots and contact lists every
//! frame. Pools keep those vectors alive between frames so a steady-state
//! frame allocates nothing.

use tracing::debug;

/// Configuration for buffer pool behavior
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Initial capacity for each freshly allocated buffer
    pub initial_capacity: usize,
    /// Maximum number of buffers to keep in the pool
    pub max_pool_size: usize,
    /// Whether to log when a new buffer has to be allocated
    pub log_resize_events: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_capacity: 64,
            max_pool_size: 4,
            log_resize_events: false,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with custom settings
    pub fn new(initial_capacity: usize, max_pool_size: usize) -> Self {
        PoolConfig {
            initial_capacity,
            max_pool_size,
            log_resize_events: false,
        }
    }

    /// Enable logging for allocation events
    pub fn with_logging(mut self) -> Self {
        self.log_resize_events = true;
        self
    }
}

/// Statistics for monitoring pool performance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Number of times a buffer was successfully borrowed from the pool
    pub hits: usize,
    /// Number of times a new buffer had to be allocated
    pub misses: usize,
    /// Current number of buffers in the pool
    pub pool_size: usize,
    /// Peak number of buffers ever held
    pub peak_size: usize,
}

impl PoolStats {
    /// Calculate the hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// A pool of reusable `Vec<T>` buffers
///
/// Buffers are handed out by value and must be given back with
/// [`BufferPool::release`]; a buffer that is never released is simply
/// dropped.
#[derive(Debug)]
pub struct BufferPool<T> {
    pool: Vec<Vec<T>>,
    config: PoolConfig,
    stats: PoolStats,
}

impl<T> BufferPool<T> {
    /// Create a new pool with default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a new pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Self {
        BufferPool {
            pool: Vec::new(),
            config,
            stats: PoolStats::default(),
        }
    }

    /// Take an empty buffer, allocating one if the pool is empty
    pub fn acquire(&mut self) -> Vec<T> {
        let buffer = match self.pool.pop() {
            Some(buffer) => {
                self.stats.hits += 1;
                buffer
            }
            None => {
                self.stats.misses += 1;
                if self.config.log_resize_events {
                    debug!(hit_rate = self.stats.hit_rate(), "buffer_pool_allocating");
                }
                Vec::with_capacity(self.config.initial_capacity)
            }
        };
        self.stats.pool_size = self.pool.len();
        buffer
    }

    /// Return a buffer; it is cleared and kept unless the pool is full
    pub fn release(&mut self, mut buffer: Vec<T>) {
        if self.pool.len() < self.config.max_pool_size {
            buffer.clear();
            self.pool.push(buffer);
            self.stats.pool_size = self.pool.len();
            self.stats.peak_size = self.stats.peak_size.max(self.stats.pool_size);
        }
    }

    /// Get current pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Drop every pooled buffer
    pub fn clear(&mut self) {
        self.pool.clear();
        self.stats.pool_size = 0;
    }

    /// Get the current number of buffers in the pool
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.max_pool_size, 4);
        assert!(!config.log_resize_events);
    }

    #[test]
    fn test_pool_reuse() {
        let mut pool: BufferPool<u32> = BufferPool::new();

        let mut buffer = pool.acquire();
        buffer.push(42);
        pool.release(buffer);

        let buffer = pool.acquire();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 64);

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_pool_max_size() {
        let mut pool: BufferPool<u32> = BufferPool::with_config(PoolConfig::new(8, 2));
        let buffers: Vec<_> = (0..3).map(|_| pool.acquire()).collect();
        for buffer in buffers {
            pool.release(buffer);
        }
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().peak_size, 2);

        pool.clear();
        assert!(pool.is_empty());
    }
}
