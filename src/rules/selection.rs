//! Rule selection from assay sigma performance.
//!
//! Follows the Westgard Sigma Rules: the better an assay performs, the
//! fewer rules are needed to detect a medically important error.
//!
//! | Sigma | Rules |
//! |-------|-------|
//! | >= 6 | `1_3s` |
//! | 5 - 6 | `1_3s`, `2_2s`, `R_4s` |
//! | 4 - 5 | `1_3s`, `2_2s`, `R_4s`, `4_1s` |
//! | < 4 | full multirule with `10x` and the `1_2s` warning |
//!
//! # Reference
//!
//! Westgard, J.O. & Westgard, S.A. (2014). "Westgard Sigma Rules",
//! *Clinical Laboratory News*.

use super::config::RuleConfiguration;
use super::violation::RuleCode;

/// Recommends a rule configuration for an assay at `sigma`.
///
/// CUSUM and the extended rules are left disabled in every tier. A
/// non-finite sigma gets the full multirule.
///
/// # Examples
///
/// ```
/// use u_labqc::capability::sigma_metric;
/// use u_labqc::rules::{recommend_rules, RuleCode};
///
/// // TEa 10%, bias 1%, CV 1.5% -> sigma 6
/// let sigma = sigma_metric(10.0, 1.0, 1.5).unwrap();
/// let cfg = recommend_rules(sigma);
/// assert!(cfg.is_enabled(RuleCode::OneThreeS));
/// assert!(!cfg.is_enabled(RuleCode::RangeFourS));
/// ```
pub fn recommend_rules(sigma: f64) -> RuleConfiguration {
    let mut cfg = RuleConfiguration::none().with(RuleCode::OneThreeS, true);
    if sigma >= 6.0 {
        return cfg;
    }

    for rule in [
        RuleCode::TwoTwoSWithin,
        RuleCode::TwoTwoSAcross,
        RuleCode::RangeFourS,
    ] {
        cfg.set_enabled(rule, true);
    }
    if sigma >= 5.0 {
        return cfg;
    }

    cfg.set_enabled(RuleCode::FourOneS, true);
    if sigma >= 4.0 {
        return cfg;
    }

    cfg.set_enabled(RuleCode::TenX, true);
    cfg.set_enabled(RuleCode::OneTwoS, true);
    cfg
}
