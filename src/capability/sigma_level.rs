//! Laboratory sigma metric.
//!
//! For an analytical method with allowable total error TEa, observed
//! bias and imprecision CV (all in percent):
//!
//! ```text
//! sigma = (TEa - |bias|) / CV
//! ```
//!
//! | Sigma | Category |
//! |-------|----------|
//! | >= 6  | World class |
//! | 5-6   | Excellent |
//! | 4-5   | Good |
//! | 3-4   | Marginal |
//! | 2-3   | Poor |
//! | < 2   | Unacceptable |
//!
//! The category drives which Westgard rules are worth running; see
//! [`recommend_rules`](crate::rules::recommend_rules).
//!
//! # References
//!
//! - Westgard, J.O. & Westgard, S.A. (2006). "The quality of laboratory
//!   testing today", *Am J Clin Pathol* 125(3), pp. 343-354.
//! - Westgard, J.O. et al. (2018). "Westgard Sigma Rules",
//!   *Clin Biochem* 57, pp. 3-6.

use serde::{Deserialize, Serialize};

/// Computes the sigma metric from TEa, bias and CV (percent).
///
/// # Returns
///
/// `None` if `cv <= 0` or any input is non-finite.
///
/// # Examples
///
/// ```
/// use u_labqc::capability::sigma_metric;
///
/// // TEa 10%, bias 1%, CV 1.5% -> sigma 6
/// let sigma = sigma_metric(10.0, 1.0, 1.5).unwrap();
/// assert!((sigma - 6.0).abs() < 1e-12);
/// assert!(sigma_metric(10.0, 1.0, 0.0).is_none());
/// ```
pub fn sigma_metric(tea_percent: f64, bias_percent: f64, cv_percent: f64) -> Option<f64> {
    if !tea_percent.is_finite() || !bias_percent.is_finite() || !cv_percent.is_finite() {
        return None;
    }
    if cv_percent <= 0.0 {
        return None;
    }
    Some((tea_percent - bias_percent.abs()) / cv_percent)
}

/// Quality category for a sigma metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigmaCategory {
    Unacceptable,
    Poor,
    Marginal,
    Good,
    Excellent,
    WorldClass,
}

impl SigmaCategory {
    /// Classifies a sigma value. NaN is `Unacceptable`.
    pub fn from_sigma(sigma: f64) -> Self {
        if sigma >= 6.0 {
            Self::WorldClass
        } else if sigma >= 5.0 {
            Self::Excellent
        } else if sigma >= 4.0 {
            Self::Good
        } else if sigma >= 3.0 {
            Self::Marginal
        } else if sigma >= 2.0 {
            Self::Poor
        } else {
            Self::Unacceptable
        }
    }
}
