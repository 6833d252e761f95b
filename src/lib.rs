//! # u-labqc
//!
//! Laboratory statistical quality control: Westgard multirule evaluation,
//! CUSUM shift detection, and control limit establishment.
//!
//! The crate operates on plain `f64` measurements and z-scores. It holds
//! no state between calls; history, locked limits and CUSUM accumulators
//! are owned and persisted by the caller.
//!
//! ## Modules
//!
//! - [`rules`] — Westgard rule engine and QC classification
//! - [`limits`] — Descriptive statistics, ±1/2/3 SD limits, sufficiency,
//!   trend detection, lockable limit sets
//! - [`detection`] — Tabular CUSUM state transition
//! - [`capability`] — Capability indices (Cp, Cpk, Pp, Ppk, Cpm) and sigma metric
//! - [`error`] — Error type
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use u_labqc::limits::{ControlLimitSet, LimitSource};
//! use u_labqc::rules::{evaluate, EvaluationInput, Observation, QcStatus, RuleConfiguration};
//!
//! let limits = ControlLimitSet::new(100.0, 5.0, LimitSource::LabDerived, Utc::now()).unwrap();
//! let obs = Observation::scored("qc-42", 114.0, &limits, Utc::now()).with_level("L1");
//! let config = RuleConfiguration::default();
//!
//! let result = evaluate(&EvaluationInput::new(&obs, &config));
//! assert_eq!(result.status, QcStatus::Warning);
//! ```

pub mod capability;
pub mod detection;
pub mod error;
pub mod limits;
pub mod rules;

pub use error::QcError;
