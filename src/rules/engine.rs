//! Evaluation of one observation against its history.
//!
//! [`evaluate`] is a pure function: everything that must survive between
//! calls (history, CUSUM accumulators) is passed in and handed back.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use super::checks::{RuleContext, REJECT_RULES, WARNING_RULE};
use super::config::RuleConfiguration;
use super::observation::Observation;
use super::violation::{determine_status, QcStatus, RuleCode, RuleViolation};
use crate::detection::{CusumParams, CusumSide, CusumState};
use crate::error::Result;

/// Everything a single evaluation reads.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInput<'a> {
    /// The observation being classified.
    pub current: &'a Observation,
    /// Observations of the current run (any level). Filtered to
    /// `current.run_id`.
    pub run_history: &'a [Observation],
    /// Earlier observations of the current level. Filtered to
    /// `current.level` and sorted by timestamp before use.
    pub level_history: &'a [Observation],
    pub config: &'a RuleConfiguration,
    /// Persisted CUSUM state for the level/lot.
    pub previous_cusum: CusumState,
}

impl<'a> EvaluationInput<'a> {
    /// An input with no history and a fresh CUSUM state.
    pub fn new(current: &'a Observation, config: &'a RuleConfiguration) -> Self {
        Self {
            current,
            run_history: &[],
            level_history: &[],
            config,
            previous_cusum: CusumState::new(),
        }
    }

    pub fn with_run_history(mut self, run_history: &'a [Observation]) -> Self {
        self.run_history = run_history;
        self
    }

    pub fn with_level_history(mut self, level_history: &'a [Observation]) -> Self {
        self.level_history = level_history;
        self
    }

    pub fn with_previous_cusum(mut self, state: CusumState) -> Self {
        self.previous_cusum = state;
        self
    }
}

/// Result of evaluating one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcEvaluation {
    pub status: QcStatus,
    /// Violated rules only, reject-class first in evaluation order.
    pub violations: Vec<RuleViolation>,
    /// Updated CUSUM state to persist; `None` when CUSUM is disabled or
    /// the evaluation faulted.
    pub cusum: Option<CusumState>,
}

/// Evaluates the enabled rules for `input.current`.
///
/// All enabled reject-class rules are checked and every violation is
/// collected. The `1_2s` warning is checked only when nothing
/// reject-class fired. CUSUM, when enabled, is advanced from
/// `previous_cusum` and reported if either side exceeds H.
///
/// This function never panics or fails. An internal fault is logged and
/// reported as a single violation with code `error`.
///
/// An invalid CUSUM configuration (K negative, H not positive) is such a
/// fault and is detected before any rule runs: the result then carries
/// only the `error` violation with status `warning`, even for a point
/// that would otherwise be rejected by `1_3s`. Validate configurations
/// with [`RuleConfiguration::cusum_params`] when they are loaded.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use u_labqc::rules::{evaluate, EvaluationInput, Observation, QcStatus, RuleConfiguration};
///
/// let config = RuleConfiguration::default();
/// let obs = Observation::new("qc-1", 116.0, 3.2, Utc::now()).with_level("L1");
/// let result = evaluate(&EvaluationInput::new(&obs, &config));
///
/// assert_eq!(result.status, QcStatus::Reject);
/// assert_eq!(result.violations[0].rule.as_str(), "1_3s");
/// ```
pub fn evaluate(input: &EvaluationInput<'_>) -> QcEvaluation {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| evaluate_rules(input)));
    let reason = match outcome {
        Ok(Ok(evaluation)) => return evaluation,
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    error!(
        observation = %input.current.id,
        level = %input.current.level,
        %reason,
        "rule evaluation fault"
    );
    let violations = vec![RuleViolation::new(
        RuleCode::InternalError,
        format!("Rule evaluation failed: {reason}"),
        vec![input.current.id.clone()],
    )];
    QcEvaluation {
        status: determine_status(&violations),
        violations,
        cusum: None,
    }
}

fn evaluate_rules(input: &EvaluationInput<'_>) -> Result<QcEvaluation> {
    let current = input.current;
    let config = input.config;

    if !current.z_score.is_finite() || !current.value.is_finite() {
        warn!(
            observation = %current.id,
            value = current.value,
            z_score = current.z_score,
            "non-finite observation; point rules cannot fire"
        );
    }

    // Configuration is checked before any rule runs.
    let cusum_params = if config.cusum {
        Some(config.cusum_params()?)
    } else {
        None
    };

    let ctx = RuleContext::new(current, input.run_history, input.level_history);

    let mut violations: Vec<RuleViolation> = REJECT_RULES
        .iter()
        .filter(|(code, _)| config.is_enabled(*code))
        .filter_map(|(_, check)| check(&ctx))
        .collect();

    let cusum = if let Some(params) = cusum_params {
        let next = input.previous_cusum.update(current.z_score, &params);
        if let Some(side) = next.signal(&params) {
            violations.push(cusum_violation(side, &next, &params, ctx.current()));
        }
        Some(next)
    } else {
        None
    };

    let (warning_code, warning_check) = WARNING_RULE;
    if violations.is_empty() && config.is_enabled(warning_code) {
        violations.extend(warning_check(&ctx));
    }

    for v in &violations {
        trace!(rule = %v.rule, ids = ?v.observation_ids, "{}", v.message);
    }

    let status = determine_status(&violations);
    debug!(
        observation = %current.id,
        level = %current.level,
        z_score = current.z_score,
        violations = violations.len(),
        %status,
        "evaluated observation"
    );

    Ok(QcEvaluation {
        status,
        violations,
        cusum,
    })
}

fn cusum_violation(
    side: CusumSide,
    state: &CusumState,
    params: &CusumParams,
    current: &Observation,
) -> RuleViolation {
    let (rule, label, sum) = match side {
        CusumSide::Positive => (RuleCode::CusumPositive, "upper", state.pos),
        CusumSide::Negative => (RuleCode::CusumNegative, "lower", state.neg),
    };
    RuleViolation::new(
        rule,
        format!("{rule}: {label} cumulative sum {sum:.2} exceeds H = {}", params.h()),
        vec![current.id.clone()],
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
