//! Error type for parsing model values from text.

use thiserror::Error;

/// Errors raised when textual model values cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown building type `{0}` (expected main, sub or fixed)")]
    UnknownBuildingType(String),

    #[error("unknown direction `{0}` (expected bottom, right, top, left or a-d)")]
    UnknownDirection(String),

    #[error("unsupported rotation of {0} degrees (expected 0, 90, 180 or 270)")]
    UnsupportedRotation(u32),

    #[error("adjacency weight {0} is not on the SLP scale 0, 2, 4, 6, 8, 10")]
    InvalidWeight(u8),
}
