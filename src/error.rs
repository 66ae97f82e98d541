//! Error types for the occupancy map core.

use crate::core::Key;
use thiserror::Error;

/// Occupancy map error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// The map layout cannot be modified once chunks have been allocated.
    #[error("map layout is locked: chunks already allocated")]
    LayoutLocked,

    /// A required well-known layer is missing from the layout.
    #[error("required layer not present: {0}")]
    LayerNotFound(String),

    /// A key's local coordinate is out of range for the map's region dimensions.
    #[error("invalid key {0:?}: local coordinate out of range")]
    InvalidKey(Key),

    /// Malformed caller input: odd ray arrays, non-finite coordinates,
    /// degenerate map parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Region table or chunk allocation failed.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, MapError>;
