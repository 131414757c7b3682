use thiserror::Error;

/// Errors raised while configuring a [`ChainMap`](crate::ChainMap).
///
/// Only construction can fail; lookups and mutations are total.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MapError {
    #[error("Illegal initial capacity: {0}")]
    InvalidCapacity(i64),
    #[error("Illegal load factor: {0}")]
    InvalidLoadFactor(f32),
}

pub type Result<T> = std::result::Result<T, MapError>;
