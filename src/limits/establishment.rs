//! Establishing and locking long-term control limits for a lot.
//!
//! A lot accumulates in-control observations until [`sufficiency_check`]
//! passes, its values are screened with [`filter_in_control`], and the
//! survivors produce a [`ControlLimitSet`]. Once locked, the set's
//! mean, SD, and bounds are frozen.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::descriptive::{qc_statistics, z_score, ControlBounds, QcStatistics};
use crate::error::{QcError, Result};

/// Default minimum number of in-control points before limits may be set.
pub const DEFAULT_MIN_POINTS: usize = 20;

/// Default |z| cutoff used by [`filter_in_control`].
pub const DEFAULT_MAX_Z: f64 = 2.0;

/// Thresholds for [`sufficiency_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SufficiencyCriteria {
    pub min_points: usize,
    /// Optional minimum number of distinct days spanned by the data.
    pub min_days: Option<usize>,
}

impl Default for SufficiencyCriteria {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            min_days: None,
        }
    }
}

impl SufficiencyCriteria {
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_min_days(mut self, min_days: usize) -> Self {
        self.min_days = Some(min_days);
        self
    }
}

/// Outcome of a sufficiency check. Never an error: lacking data is the
/// normal state of a new lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SufficiencyReport {
    pub sufficient: bool,
    pub points_count: usize,
    pub required_points: usize,
    /// Days spanned (exact or estimated); present when a day threshold applies.
    pub days_count: Option<usize>,
    pub required_days: Option<usize>,
    /// `true` if `days_count` was estimated from the point count.
    pub days_estimated: bool,
    pub message: String,
}

/// Decides whether enough in-control history exists to establish limits.
///
/// Without per-day information the day count is estimated as one QC
/// point per day. Use [`sufficiency_check_dated`] when timestamps are
/// available.
///
/// # Examples
///
/// ```
/// use u_labqc::limits::{sufficiency_check, SufficiencyCriteria};
///
/// let values = vec![100.0; 19];
/// assert!(!sufficiency_check(&values, &SufficiencyCriteria::default()).sufficient);
///
/// let values = vec![100.0; 20];
/// assert!(sufficiency_check(&values, &SufficiencyCriteria::default()).sufficient);
/// ```
pub fn sufficiency_check(values: &[f64], criteria: &SufficiencyCriteria) -> SufficiencyReport {
    let points = values.len();
    build_report(points, criteria.min_days.map(|_| points), true, criteria)
}

/// Like [`sufficiency_check`], but counts distinct UTC calendar days
/// exactly from the observation timestamps.
pub fn sufficiency_check_dated(
    timestamps: &[DateTime<Utc>],
    criteria: &SufficiencyCriteria,
) -> SufficiencyReport {
    let days: BTreeSet<_> = timestamps.iter().map(|t| t.date_naive()).collect();
    build_report(timestamps.len(), Some(days.len()), false, criteria)
}

fn build_report(
    points: usize,
    days: Option<usize>,
    days_estimated: bool,
    criteria: &SufficiencyCriteria,
) -> SufficiencyReport {
    let required_points = criteria.min_points;
    let days_count = criteria.min_days.and(days);

    let message = if points < required_points {
        format!("Insufficient data: {points} of {required_points} required in-control points")
    } else {
        match (criteria.min_days, days_count) {
            (Some(required), Some(actual)) if actual < required => {
                let qualifier = if days_estimated { "approximately " } else { "" };
                format!("Insufficient data: {qualifier}{actual} of {required} required days")
            }
            _ => format!("Sufficient data: {points} points ({required_points} required)"),
        }
    };

    let days_ok = match (criteria.min_days, days_count) {
        (Some(required), Some(actual)) => actual >= required,
        _ => true,
    };

    SufficiencyReport {
        sufficient: points >= required_points && days_ok,
        points_count: points,
        required_points,
        days_count,
        required_days: criteria.min_days,
        days_estimated: days_estimated && days_count.is_some(),
        message,
    }
}

/// Values that survived in-control screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InControlFilter {
    pub in_control_values: Vec<f64>,
    /// Number of values removed.
    pub filtered_count: usize,
    pub original_count: usize,
}

/// Drops values whose paired |z| exceeds `max_z`.
///
/// Values with `|z| == max_z` are kept.
///
/// # Errors
///
/// [`QcError::LengthMismatch`] if `values` and `z_scores` differ in length.
///
/// # Examples
///
/// ```
/// use u_labqc::limits::filter_in_control;
///
/// let kept = filter_in_control(&[100.0, 112.0, 98.0], &[0.0, 2.4, -0.4], 2.0).unwrap();
/// assert_eq!(kept.in_control_values, vec![100.0, 98.0]);
/// assert_eq!(kept.filtered_count, 1);
/// ```
pub fn filter_in_control(values: &[f64], z_scores: &[f64], max_z: f64) -> Result<InControlFilter> {
    if values.len() != z_scores.len() {
        return Err(QcError::LengthMismatch {
            values: values.len(),
            z_scores: z_scores.len(),
        });
    }
    let in_control_values: Vec<f64> = values
        .iter()
        .zip(z_scores)
        .filter(|(_, z)| z.abs() <= max_z)
        .map(|(&v, _)| v)
        .collect();

    Ok(InControlFilter {
        filtered_count: values.len() - in_control_values.len(),
        original_count: values.len(),
        in_control_values,
    })
}

/// Where a limit set's mean and SD came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSource {
    /// Computed from this laboratory's own in-control data.
    LabDerived,
    /// Assigned by the control material manufacturer.
    Manufacturer,
    /// Derived from an inter-laboratory peer group.
    PeerGroup,
}

/// Mean/SD control limits for one analyte/level/instrument/lot.
///
/// # Invariants
///
/// Once [`lock`](Self::lock) has succeeded, `mean`, `standard_deviation`,
/// `cv` and `bounds` never change, and the lock metadata is written
/// exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlLimitSet {
    mean: f64,
    standard_deviation: f64,
    cv: f64,
    bounds: ControlBounds,
    source: LimitSource,
    established_at: DateTime<Utc>,
    locked_at: Option<DateTime<Utc>>,
    locked_by: Option<String>,
}

impl ControlLimitSet {
    /// Creates an unlocked set from an explicit mean and SD, e.g.
    /// manufacturer-assigned values.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] if `mean` is non-finite or `sd` is
    /// negative or non-finite.
    pub fn new(
        mean: f64,
        sd: f64,
        source: LimitSource,
        established_at: DateTime<Utc>,
    ) -> Result<Self> {
        if !mean.is_finite() {
            return Err(QcError::InvalidParameter {
                name: "mean",
                reason: "must be finite",
            });
        }
        if !sd.is_finite() || sd < 0.0 {
            return Err(QcError::InvalidParameter {
                name: "sd",
                reason: "must be finite and non-negative",
            });
        }
        Ok(Self {
            mean,
            standard_deviation: sd,
            cv: super::descriptive::coefficient_of_variation(sd, mean),
            bounds: ControlBounds::new(mean, sd),
            source,
            established_at,
            locked_at: None,
            locked_by: None,
        })
    }

    /// Materializes an unlocked set from a [`qc_statistics`] result.
    pub fn from_statistics(
        stats: &QcStatistics,
        source: LimitSource,
        established_at: DateTime<Utc>,
    ) -> Self {
        Self {
            mean: stats.mean,
            standard_deviation: stats.standard_deviation,
            cv: stats.cv,
            bounds: stats.bounds,
            source,
            established_at,
            locked_at: None,
            locked_by: None,
        }
    }

    /// Recomputes mean/SD/bounds from fresh data.
    ///
    /// # Errors
    ///
    /// - [`QcError::LimitsLocked`] if the set is locked; nothing changes.
    /// - Errors from [`qc_statistics`] (e.g. empty input).
    pub fn recompute(&mut self, values: &[f64], established_at: DateTime<Utc>) -> Result<()> {
        if self.is_locked() {
            warn!(
                mean = self.mean,
                sd = self.standard_deviation,
                "refusing to recompute locked control limits"
            );
            return Err(QcError::LimitsLocked);
        }
        let stats = qc_statistics(values, None, None)?;
        self.mean = stats.mean;
        self.standard_deviation = stats.standard_deviation;
        self.cv = stats.cv;
        self.bounds = stats.bounds;
        self.established_at = established_at;
        Ok(())
    }

    /// Locks the set. Lock metadata can be written only once.
    ///
    /// # Errors
    ///
    /// [`QcError::AlreadyLocked`] on a second call.
    pub fn lock(&mut self, locked_by: impl Into<String>, locked_at: DateTime<Utc>) -> Result<()> {
        if self.is_locked() {
            return Err(QcError::AlreadyLocked);
        }
        let locked_by = locked_by.into();
        info!(
            mean = self.mean,
            sd = self.standard_deviation,
            locked_by = %locked_by,
            "control limits locked"
        );
        self.locked_by = Some(locked_by);
        self.locked_at = Some(locked_at);
        Ok(())
    }

    /// z-score of `value` against this set's mean and SD.
    pub fn z_score(&self, value: f64) -> f64 {
        z_score(value, self.mean, self.standard_deviation)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn standard_deviation(&self) -> f64 {
        self.standard_deviation
    }

    pub fn cv(&self) -> f64 {
        self.cv
    }

    pub fn bounds(&self) -> &ControlBounds {
        &self.bounds
    }

    pub fn source(&self) -> LimitSource {
        self.source
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    pub fn locked_at(&self) -> Option<DateTime<Utc>> {
        self.locked_at
    }

    pub fn locked_by(&self) -> Option<&str> {
        self.locked_by.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked_at.is_some()
    }
}
