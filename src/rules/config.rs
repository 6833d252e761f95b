//! Per-analyte rule configuration.
//!
//! Supplied fresh with every evaluation; the engine never caches it.
//! Field names in JSON are the rule codes themselves:
//!
//! ```json
//! { "1_3s": true, "2of3_2s": true, "cusum": true, "cusum_h": 5.0 }
//! ```
//!
//! Missing fields take their [`Default`] values.

use serde::{Deserialize, Serialize};

use super::violation::RuleCode;
use crate::detection::{CusumParams, DEFAULT_CUSUM_H, DEFAULT_CUSUM_K};
use crate::error::Result;

/// Rule enable flags plus CUSUM parameters.
///
/// Defaults enable the classic Westgard multirule (`1_3s`, `1_2s`,
/// `2_2s_within`, `2_2s_across`, `R_4s`, `4_1s`, `10x`); the extended
/// rules and CUSUM start disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfiguration {
    #[serde(rename = "1_3s")]
    pub one_three_s: bool,
    #[serde(rename = "1_2s")]
    pub one_two_s: bool,
    #[serde(rename = "2_2s_within")]
    pub two_two_s_within: bool,
    #[serde(rename = "2_2s_across")]
    pub two_two_s_across: bool,
    #[serde(rename = "R_4s")]
    pub range_four_s: bool,
    #[serde(rename = "4_1s")]
    pub four_one_s: bool,
    #[serde(rename = "10x")]
    pub ten_x: bool,
    #[serde(rename = "2of3_2s")]
    pub two_of_three_two_s: bool,
    #[serde(rename = "3_1s")]
    pub three_one_s: bool,
    #[serde(rename = "6x")]
    pub six_x: bool,
    #[serde(rename = "9x")]
    pub nine_x: bool,
    #[serde(rename = "7T")]
    pub seven_t: bool,
    pub cusum: bool,
    /// CUSUM slack constant K.
    pub cusum_k: f64,
    /// CUSUM decision interval H.
    pub cusum_h: f64,
    /// Control measurements per run (N). Informational only.
    pub replicates: Option<u32>,
}

impl Default for RuleConfiguration {
    fn default() -> Self {
        Self {
            one_three_s: true,
            one_two_s: true,
            two_two_s_within: true,
            two_two_s_across: true,
            range_four_s: true,
            four_one_s: true,
            ten_x: true,
            two_of_three_two_s: false,
            three_one_s: false,
            six_x: false,
            nine_x: false,
            seven_t: false,
            cusum: false,
            cusum_k: DEFAULT_CUSUM_K,
            cusum_h: DEFAULT_CUSUM_H,
            replicates: None,
        }
    }
}

impl RuleConfiguration {
    /// A configuration with every rule and CUSUM disabled.
    pub fn none() -> Self {
        Self {
            one_three_s: false,
            one_two_s: false,
            two_two_s_within: false,
            two_two_s_across: false,
            range_four_s: false,
            four_one_s: false,
            ten_x: false,
            ..Self::default()
        }
    }

    /// Parses a JSON configuration; absent fields take defaults.
    ///
    /// # Errors
    ///
    /// [`QcError::Config`](crate::error::QcError::Config) on malformed JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_labqc::rules::{RuleCode, RuleConfiguration};
    ///
    /// let cfg = RuleConfiguration::from_json(r#"{ "7T": true, "10x": false }"#).unwrap();
    /// assert!(cfg.is_enabled(RuleCode::SevenT));
    /// assert!(!cfg.is_enabled(RuleCode::TenX));
    /// assert!(cfg.is_enabled(RuleCode::OneThreeS));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `rule` is switched on. Both CUSUM codes follow `cusum`;
    /// the synthetic `error` code is never enabled.
    pub fn is_enabled(&self, rule: RuleCode) -> bool {
        match rule {
            RuleCode::CusumPositive | RuleCode::CusumNegative => self.cusum,
            RuleCode::InternalError => false,
            other => self.flag(other).copied().unwrap_or(false),
        }
    }

    /// Switches `rule` on or off. Has no effect for `error`.
    pub fn set_enabled(&mut self, rule: RuleCode, enabled: bool) {
        match rule {
            RuleCode::CusumPositive | RuleCode::CusumNegative => self.cusum = enabled,
            other => {
                if let Some(flag) = self.flag_mut(other) {
                    *flag = enabled;
                }
            }
        }
    }

    /// Builder form of [`set_enabled`](Self::set_enabled).
    pub fn with(mut self, rule: RuleCode, enabled: bool) -> Self {
        self.set_enabled(rule, enabled);
        self
    }

    /// Validated CUSUM parameters.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`](crate::error::QcError::InvalidParameter)
    /// if K is negative or H is not positive.
    pub fn cusum_params(&self) -> Result<CusumParams> {
        CusumParams::new(self.cusum_k, self.cusum_h)
    }

    /// The x-rules conventionally paired with the replicate count:
    /// multiples of 3 pair with `6x`/`9x`, anything else with `10x`.
    pub fn conventional_x_rules(&self) -> &'static [RuleCode] {
        match self.replicates {
            Some(n) if n > 0 && n % 3 == 0 => &[RuleCode::SixX, RuleCode::NineX],
            _ => &[RuleCode::TenX],
        }
    }

    fn flag(&self, rule: RuleCode) -> Option<&bool> {
        let flag = match rule {
            RuleCode::OneThreeS => &self.one_three_s,
            RuleCode::OneTwoS => &self.one_two_s,
            RuleCode::TwoTwoSWithin => &self.two_two_s_within,
            RuleCode::TwoTwoSAcross => &self.two_two_s_across,
            RuleCode::RangeFourS => &self.range_four_s,
            RuleCode::FourOneS => &self.four_one_s,
            RuleCode::TenX => &self.ten_x,
            RuleCode::TwoOfThreeTwoS => &self.two_of_three_two_s,
            RuleCode::ThreeOneS => &self.three_one_s,
            RuleCode::SixX => &self.six_x,
            RuleCode::NineX => &self.nine_x,
            RuleCode::SevenT => &self.seven_t,
            RuleCode::CusumPositive | RuleCode::CusumNegative => &self.cusum,
            RuleCode::InternalError => return None,
        };
        Some(flag)
    }

    fn flag_mut(&mut self, rule: RuleCode) -> Option<&mut bool> {
        let flag = match rule {
            RuleCode::OneThreeS => &mut self.one_three_s,
            RuleCode::OneTwoS => &mut self.one_two_s,
            RuleCode::TwoTwoSWithin => &mut self.two_two_s_within,
            RuleCode::TwoTwoSAcross => &mut self.two_two_s_across,
            RuleCode::RangeFourS => &mut self.range_four_s,
            RuleCode::FourOneS => &mut self.four_one_s,
            RuleCode::TenX => &mut self.ten_x,
            RuleCode::TwoOfThreeTwoS => &mut self.two_of_three_two_s,
            RuleCode::ThreeOneS => &mut self.three_one_s,
            RuleCode::SixX => &mut self.six_x,
            RuleCode::NineX => &mut self.nine_x,
            RuleCode::SevenT => &mut self.seven_t,
            RuleCode::CusumPositive | RuleCode::CusumNegative => &mut self.cusum,
            RuleCode::InternalError => return None,
        };
        Some(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QcError;

    #[test]
    fn defaults_enable_classic_multirule() {
        let cfg = RuleConfiguration::default();
        for code in [
            RuleCode::OneThreeS,
            RuleCode::OneTwoS,
            RuleCode::TwoTwoSWithin,
            RuleCode::TwoTwoSAcross,
            RuleCode::RangeFourS,
            RuleCode::FourOneS,
            RuleCode::TenX,
        ] {
            assert!(cfg.is_enabled(code), "{code} should default on");
        }
        for code in [
            RuleCode::TwoOfThreeTwoS,
            RuleCode::ThreeOneS,
            RuleCode::SixX,
            RuleCode::NineX,
            RuleCode::SevenT,
            RuleCode::CusumPositive,
        ] {
            assert!(!cfg.is_enabled(code), "{code} should default off");
        }
        assert_eq!(cfg.cusum_k, 0.5);
        assert_eq!(cfg.cusum_h, 4.0);
    }

    #[test]
    fn none_disables_everything() {
        let cfg = RuleConfiguration::none();
        assert!(!cfg.is_enabled(RuleCode::OneThreeS));
        assert!(!cfg.is_enabled(RuleCode::TenX));
        assert!(!cfg.cusum);
    }

    #[test]
    fn set_enabled_round_trips() {
        let cfg = RuleConfiguration::none()
            .with(RuleCode::NineX, true)
            .with(RuleCode::CusumNegative, true);
        assert!(cfg.is_enabled(RuleCode::NineX));
        assert!(cfg.cusum);
        assert!(cfg.is_enabled(RuleCode::CusumPositive));
    }

    #[test]
    fn internal_error_never_enabled() {
        let cfg = RuleConfiguration::default().with(RuleCode::InternalError, true);
        assert!(!cfg.is_enabled(RuleCode::InternalError));
    }

    #[test]
    fn from_json_partial() {
        let cfg = RuleConfiguration::from_json(
            r#"{ "cusum": true, "cusum_k": 0.75, "replicates": 3, "R_4s": false }"#,
        )
        .unwrap();
        assert!(cfg.cusum);
        assert_eq!(cfg.cusum_k, 0.75);
        assert_eq!(cfg.cusum_h, 4.0);
        assert!(!cfg.range_four_s);
        assert!(cfg.one_three_s);
        assert_eq!(cfg.replicates, Some(3));
    }

    #[test]
    fn from_json_malformed() {
        assert!(matches!(
            RuleConfiguration::from_json("{ \"1_3s\": "),
            Err(QcError::Config(_))
        ));
    }

    #[test]
    fn cusum_params_validated() {
        let mut cfg = RuleConfiguration::default();
        assert!(cfg.cusum_params().is_ok());
        cfg.cusum_h = 0.0;
        assert!(cfg.cusum_params().is_err());
    }

    #[test]
    fn conventional_x_rules_by_replicates() {
        let mut cfg = RuleConfiguration::default();
        assert_eq!(cfg.conventional_x_rules(), &[RuleCode::TenX]);
        cfg.replicates = Some(2);
        assert_eq!(cfg.conventional_x_rules(), &[RuleCode::TenX]);
        cfg.replicates = Some(3);
        assert_eq!(cfg.conventional_x_rules(), &[RuleCode::SixX, RuleCode::NineX]);
        cfg.replicates = Some(6);
        assert_eq!(cfg.conventional_x_rules(), &[RuleCode::SixX, RuleCode::NineX]);
    }
}
