//! Westgard rule evaluation engine.
//!
//! Classifies each new QC observation as in-control, warning or reject
//! from its z-score, its same-run peers and its same-level history, and
//! advances the level's CUSUM state.
//!
//! # Rules
//!
//! | Code | Class | Condition |
//! |------|-------|-----------|
//! | `1_3s` | reject | current `\|z\| >= 3` |
//! | `1_2s` | warning | current `2 <= \|z\| < 3`, only if nothing rejected |
//! | `2_2s_within` | reject | current and a same-run point `\|z\| >= 2`, same side |
//! | `2_2s_across` | reject | current and previous same-level point `\|z\| >= 2`, same side |
//! | `R_4s` | reject | opposite-side same-run point with range `>= 4` SD |
//! | `4_1s` | reject | 4 consecutive same-level `\|z\| > 1`, same side |
//! | `10x` | reject | 10 consecutive same-level points on one side |
//! | `2of3_2s` | reject | 2 of the last 3 same-level `\|z\| >= 2`, same side |
//! | `3_1s` | reject | 3 consecutive same-level `\|z\| > 1`, same side |
//! | `6x`, `9x` | reject | 6 / 9 consecutive same-level points on one side |
//! | `7T` | reject | 7 same-level raw values strictly monotonic in time |
//! | `CUSUM_positive`, `CUSUM_negative` | reject | CUSUM sum exceeds H |
//!
//! # Usage
//!
//! Build an [`EvaluationInput`] from the current [`Observation`], its
//! history, a [`RuleConfiguration`] and the persisted
//! [`CusumState`](crate::detection::CusumState), call [`evaluate`], and
//! persist the returned state.
//!
//! # References
//!
//! - Westgard, J.O., Barry, P.L., Hunt, M.R. & Groth, T. (1981). "A
//!   multi-rule Shewhart chart for quality control in clinical chemistry",
//!   *Clinical Chemistry* 27(3), pp. 493-501.

mod checks;
mod config;
mod engine;
mod observation;
mod selection;
mod violation;

pub use config::RuleConfiguration;
pub use engine::{evaluate, EvaluationInput, QcEvaluation};
pub use observation::Observation;
pub use selection::recommend_rules;
pub use violation::{determine_status, QcStatus, RuleCode, RuleSeverity, RuleViolation};
