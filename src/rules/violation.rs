//! Rule codes, violations, and the overall QC classification.
//!
//! # Reference
//!
//! Westgard, J.O., Barry, P.L., Hunt, M.R. & Groth, T. (1981). "A multi-rule
//! Shewhart chart for quality control in clinical chemistry",
//! *Clinical Chemistry* 27(3), pp. 493-501.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a QC rule, serialized as its conventional code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleCode {
    /// One point beyond ±3 SD.
    #[serde(rename = "1_3s")]
    OneThreeS,
    /// One point beyond ±2 SD (warning).
    #[serde(rename = "1_2s")]
    OneTwoS,
    /// Two points in the same run beyond 2 SD on the same side.
    #[serde(rename = "2_2s_within")]
    TwoTwoSWithin,
    /// Two consecutive same-level points beyond 2 SD on the same side.
    #[serde(rename = "2_2s_across")]
    TwoTwoSAcross,
    /// Range of 4 SD between opposite-side points in one run.
    #[serde(rename = "R_4s")]
    RangeFourS,
    /// Four consecutive same-level points beyond 1 SD on the same side.
    #[serde(rename = "4_1s")]
    FourOneS,
    /// Ten consecutive same-level points on the same side of the mean.
    #[serde(rename = "10x")]
    TenX,
    /// Two of three consecutive same-level points beyond 2 SD, same side.
    #[serde(rename = "2of3_2s")]
    TwoOfThreeTwoS,
    /// Three consecutive same-level points beyond 1 SD on the same side.
    #[serde(rename = "3_1s")]
    ThreeOneS,
    /// Six consecutive same-level points on the same side of the mean.
    #[serde(rename = "6x")]
    SixX,
    /// Nine consecutive same-level points on the same side of the mean.
    #[serde(rename = "9x")]
    NineX,
    /// Seven consecutive same-level values strictly increasing or decreasing.
    #[serde(rename = "7T")]
    SevenT,
    /// Upper CUSUM beyond the decision interval.
    #[serde(rename = "CUSUM_positive")]
    CusumPositive,
    /// Lower CUSUM beyond the decision interval.
    #[serde(rename = "CUSUM_negative")]
    CusumNegative,
    /// Synthetic code for an evaluation that could not run.
    #[serde(rename = "error")]
    InternalError,
}

impl RuleCode {
    /// The conventional code string, e.g. `"R_4s"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneThreeS => "1_3s",
            Self::OneTwoS => "1_2s",
            Self::TwoTwoSWithin => "2_2s_within",
            Self::TwoTwoSAcross => "2_2s_across",
            Self::RangeFourS => "R_4s",
            Self::FourOneS => "4_1s",
            Self::TenX => "10x",
            Self::TwoOfThreeTwoS => "2of3_2s",
            Self::ThreeOneS => "3_1s",
            Self::SixX => "6x",
            Self::NineX => "9x",
            Self::SevenT => "7T",
            Self::CusumPositive => "CUSUM_positive",
            Self::CusumNegative => "CUSUM_negative",
            Self::InternalError => "error",
        }
    }

    /// Severity class of a violation of this rule.
    ///
    /// Everything except the `1_2s` warning and the synthetic `error`
    /// code is reject-class.
    pub fn severity(&self) -> RuleSeverity {
        match self {
            Self::OneTwoS | Self::InternalError => RuleSeverity::Warning,
            _ => RuleSeverity::Reject,
        }
    }

    /// `true` if a violation of this rule rejects the run.
    pub fn is_reject(&self) -> bool {
        self.severity() == RuleSeverity::Reject
    }
}

/// Severity class of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSeverity {
    Warning,
    Reject,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The output of one rule check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: RuleCode,
    pub violated: bool,
    pub message: String,
    /// Observations that triggered the rule, oldest first.
    pub observation_ids: Vec<String>,
}

impl RuleViolation {
    pub(crate) fn new(rule: RuleCode, message: String, observation_ids: Vec<String>) -> Self {
        Self {
            rule,
            violated: true,
            message,
            observation_ids,
        }
    }
}

/// Overall classification of an evaluated observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QcStatus {
    InControl,
    Warning,
    Reject,
}

impl QcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InControl => "in-control",
            Self::Warning => "warning",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for QcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a violation list.
///
/// `InControl` if nothing is violated, `Reject` if any violated rule is
/// reject-class, otherwise `Warning`.
pub fn determine_status(violations: &[RuleViolation]) -> QcStatus {
    let mut fired = violations.iter().filter(|v| v.violated).peekable();
    if fired.peek().is_none() {
        return QcStatus::InControl;
    }
    if fired.any(|v| v.rule.is_reject()) {
        QcStatus::Reject
    } else {
        QcStatus::Warning
    }
}
