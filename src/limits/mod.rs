//! Statistical limit engine.
//!
//! Descriptive statistics, control limits, and trend signals over a flat
//! list of QC observations. Also owns the z-score transform shared with
//! the [`rules`](crate::rules) engine.
//!
//! # Operations
//!
//! - [`z_score`] — value in SD units relative to a mean
//! - [`basic_statistics`] — mean, sample SD, variance, range, CV
//! - [`qc_statistics`] — statistics plus ±1/2/3 SD bounds and outliers
//! - [`sufficiency_check`] / [`sufficiency_check_dated`] — gate for
//!   establishing limits
//! - [`filter_in_control`] — drop out-of-control values before
//!   establishing limits
//! - [`detect_trend`] — moving-average regression trend signal
//! - [`ControlLimitSet`] — lockable long-term limits for a lot
//!
//! # References
//!
//! - Westgard, J.O. (2016). *Basic QC Practices*, 4th ed.
//! - CLSI C24 — Statistical Quality Control for Quantitative Measurement
//!   Procedures

mod descriptive;
mod establishment;
mod trend;

pub use descriptive::{
    basic_statistics, coefficient_of_variation, qc_statistics, z_score, BasicStatistics,
    ControlBounds, QcStatistics,
};
pub use establishment::{
    filter_in_control, sufficiency_check, sufficiency_check_dated, ControlLimitSet,
    InControlFilter, LimitSource, SufficiencyCriteria, SufficiencyReport, DEFAULT_MAX_Z,
    DEFAULT_MIN_POINTS,
};
pub use trend::{detect_trend, TrendReport, DEFAULT_TREND_WINDOW, TREND_SLOPE_THRESHOLD};
