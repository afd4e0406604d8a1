//! Error types for siteplan operations.
//!
//! [`SiteplanError`] is the error returned by the public API. Configuration
//! problems are reported through [`ConfigError`] before any search work
//! starts; geometry failures of individual candidates never surface here (see
//! [`crate::generator::GeometryError`]).

use thiserror::Error;

use siteplan_core::ModelError;

/// The main error type for siteplan operations.
#[derive(Debug, Error)]
pub enum SiteplanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generator output and validator expectations disagree. Always a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Problems found while validating a site definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no spaces are configured")]
    NoSpaces,

    #[error("no main process units are configured")]
    NoMainUnits,

    #[error("space `{0}` is defined more than once")]
    DuplicateSpace(String),

    #[error("main unit `{0}` has no main_process_sequence")]
    MissingSequence(String),

    #[error("sequence index {index} is used by both `{first}` and `{second}`")]
    DuplicateSequence {
        index: u32,
        first: String,
        second: String,
    },

    #[error("main sequence must be exactly 1..={expected}, found {found:?}")]
    NonContiguousSequence { expected: u32, found: Vec<u32> },

    #[error("{subject} must have positive dimensions, got {width} x {height}")]
    NonPositiveDimensions {
        subject: String,
        width: f32,
        height: f32,
    },

    #[error("space `{id}`: {source}")]
    Model {
        id: String,
        #[source]
        source: ModelError,
    },

    #[error("fixed space `{0}` needs x and y coordinates")]
    MissingPosition(String),

    #[error("adjacency key `{0}` must be written as `<id>-<id>`")]
    MalformedAdjacencyKey(String),

    #[error("adjacency key `{key}` refers to unknown space `{id}`")]
    UnknownAdjacencySpace { key: String, id: String },

    #[error("adjacency key `{0}` pairs a space with itself")]
    SelfAdjacency(String),

    #[error("adjacency `{key}` has a negative preferred gap {gap}")]
    NegativeGap { key: String, gap: f32 },

    #[error("hazard factors refer to unknown space `{0}`")]
    UnknownHazardSpace(String),

    #[error("invalid setting: {0}")]
    Validation(String),
}
