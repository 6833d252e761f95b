//! QC observations as seen by the rule engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::limits::ControlLimitSet;

/// A single control measurement.
///
/// The engine never mutates observations; the caller builds them from
/// stored data right before each evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Opaque identifier, reported back in violations.
    pub id: String,
    /// Raw measured value.
    pub value: f64,
    /// `value` in SD units against the locked limits for its lot.
    pub z_score: f64,
    /// Control level label, e.g. `"L1"`. Defines the level time series.
    pub level: String,
    pub timestamp: DateTime<Utc>,
    /// Analytical run identifier. Observations measured together share it.
    pub run_id: String,
}

impl Observation {
    /// Creates an observation with an empty level and run.
    pub fn new(id: impl Into<String>, value: f64, z_score: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            value,
            z_score,
            level: String::new(),
            timestamp,
            run_id: String::new(),
        }
    }

    /// Creates an observation whose z-score comes from `limits`.
    pub fn scored(
        id: impl Into<String>,
        value: f64,
        limits: &ControlLimitSet,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(id, value, limits.z_score(value), timestamp)
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Side of the mean: +1 above, -1 below, 0 on the mean (or NaN).
    pub(crate) fn side(&self) -> i8 {
        if self.z_score > 0.0 {
            1
        } else if self.z_score < 0.0 {
            -1
        } else {
            0
        }
    }
}
