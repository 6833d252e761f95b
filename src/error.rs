//! Error type shared by the limit and rule engines.
//!
//! Only genuine caller contract violations are errors. Lack of history is
//! reported inside the normal result types (see
//! [`SufficiencyReport`](crate::limits::SufficiencyReport) and
//! [`TrendReport`](crate::limits::TrendReport)).

use thiserror::Error;

/// Errors produced by `u-labqc`.
#[derive(Debug, Error)]
pub enum QcError {
    /// Statistics were requested for zero observations.
    #[error("{operation}: statistics are undefined for an empty dataset")]
    EmptyDataset {
        /// The operation that received the empty input.
        operation: &'static str,
    },

    /// Paired slices of differing length.
    #[error("length mismatch: {values} values but {z_scores} z-scores")]
    LengthMismatch { values: usize, z_scores: usize },

    /// A numeric parameter is out of its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    /// Specification limits are inconsistent (e.g. USL <= LSL).
    #[error("invalid specification limits: {0}")]
    InvalidSpecification(String),

    /// The data has zero spread, so a ratio over SD is undefined.
    #[error("standard deviation is zero")]
    ZeroVariance,

    /// A locked limit set was asked to recompute its statistics.
    #[error("control limits are locked and cannot be recomputed")]
    LimitsLocked,

    /// A limit set was locked a second time.
    #[error("control limits are already locked")]
    AlreadyLocked,

    /// Rule configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QcError>;
