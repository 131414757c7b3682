use crate::error::{MapError, Result};
use crate::{DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, MAXIMUM_CAPACITY};

/// Validated sizing parameters for a [`ChainMap`](crate::ChainMap).
///
/// The default is 16 buckets with a load factor of 0.75.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    initial_capacity: usize,
    load_factor: f32,
}

impl MapConfig {
    /// Validate raw sizing values, e.g. ones read from a settings file.
    ///
    /// A negative capacity or a load factor that is not strictly positive
    /// (NaN included) is rejected. Capacities above [`MAXIMUM_CAPACITY`] are
    /// capped silently.
    pub fn new(initial_capacity: i64, load_factor: f32) -> Result<Self> {
        if initial_capacity < 0 {
            return Err(MapError::InvalidCapacity(initial_capacity));
        }
        let capped = initial_capacity.min(MAXIMUM_CAPACITY as i64) as usize;
        Self::default()
            .with_initial_capacity(capped)
            .with_load_factor(load_factor)
    }

    /// Replace the initial capacity, capping it at [`MAXIMUM_CAPACITY`].
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity.min(MAXIMUM_CAPACITY);
        self
    }

    /// Replace the load factor.
    pub fn with_load_factor(mut self, load_factor: f32) -> Result<Self> {
        if load_factor <= 0.0 || load_factor.is_nan() {
            return Err(MapError::InvalidLoadFactor(load_factor));
        }
        self.load_factor = load_factor;
        Ok(self)
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}
