//! Process capability indices (Cp, Cpk, Pp, Ppk, Cpm).
//!
//! Quantify how well QC results fit inside a tolerance window
//! `[LSL, USL]`. No rational subgrouping is modelled for individual QC
//! results, so the within-subgroup and overall sigma are both the sample
//! SD: Cp == Pp and Cpk == Ppk. They stay separate fields so consumers
//! keep the conventional names.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 8.
//! - Kane (1986), "Process Capability Indices", *Journal of Quality Technology*
//!   18(1), pp. 41--52.
//! - Chan, Cheng & Spiring (1988), "A New Measure of Process Capability: Cpm",
//!   *Journal of Quality Technology* 20(3), pp. 162--175.

use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};
use crate::limits::basic_statistics;

/// Two-sided tolerance specification with an optional target.
///
/// # Examples
///
/// ```
/// use u_labqc::capability::ProcessCapability;
///
/// let spec = ProcessCapability::new(9.0, 11.0).unwrap().with_target(10.0);
/// let data = [9.5, 10.0, 10.2, 9.8, 10.1, 10.3, 9.9, 10.0];
/// let indices = spec.compute(&data).unwrap();
/// assert!(indices.cp > 0.0);
/// assert!(indices.cpm.is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessCapability {
    lsl: f64,
    usl: f64,
    target: Option<f64>,
}

/// Computed capability indices.
///
/// | Index | Value | Interpretation |
/// |-------|-------|----------------|
/// | Cp/Pp | >= 1.33 | Process is capable |
/// | Cpk/Ppk | >= 1.33 | Process is capable and centered |
/// | Cpm | >= 1.33 | Process meets Taguchi loss criterion |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityIndices {
    /// Cp = (USL - LSL) / (6 * sd).
    pub cp: f64,
    /// Cpk = min(Cpu, Cpl).
    pub cpk: f64,
    /// Cpu = (USL - mean) / (3 * sd).
    pub cpu: f64,
    /// Cpl = (mean - LSL) / (3 * sd).
    pub cpl: f64,
    /// Pp, from overall variation.
    pub pp: f64,
    /// Ppk, from overall variation.
    pub ppk: f64,
    /// Cpm = (USL - LSL) / (6 * sqrt(sd² + (mean - target)²)).
    /// Present only when a target is given.
    pub cpm: Option<f64>,
    pub mean: f64,
    pub standard_deviation: f64,
}

impl ProcessCapability {
    /// Creates a two-sided specification.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidSpecification`] if either limit is non-finite or
    /// `usl <= lsl`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_labqc::capability::ProcessCapability;
    ///
    /// assert!(ProcessCapability::new(5.0, 10.0).is_ok());
    /// assert!(ProcessCapability::new(10.0, 5.0).is_err());
    /// ```
    pub fn new(lsl: f64, usl: f64) -> Result<Self> {
        if !lsl.is_finite() {
            return Err(QcError::InvalidSpecification("LSL must be finite".into()));
        }
        if !usl.is_finite() {
            return Err(QcError::InvalidSpecification("USL must be finite".into()));
        }
        if usl <= lsl {
            return Err(QcError::InvalidSpecification(format!(
                "USL ({usl}) must be greater than LSL ({lsl})"
            )));
        }
        Ok(Self {
            lsl,
            usl,
            target: None,
        })
    }

    /// Sets the target value; enables Cpm.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    /// Computes all indices from the sample mean and sample SD of `data`.
    ///
    /// # Errors
    ///
    /// - [`QcError::EmptyDataset`] if `data` is empty.
    /// - [`QcError::ZeroVariance`] if the sample SD is 0 (including a
    ///   single observation).
    pub fn compute(&self, data: &[f64]) -> Result<CapabilityIndices> {
        if data.is_empty() {
            return Err(QcError::EmptyDataset {
                operation: "capability_indices",
            });
        }
        let stats = basic_statistics(data)?;
        let sd = stats.standard_deviation;
        if sd <= 0.0 {
            return Err(QcError::ZeroVariance);
        }
        Ok(self.compute_indices(stats.mean, sd))
    }

    fn compute_indices(&self, x_bar: f64, sigma: f64) -> CapabilityIndices {
        let cpu = (self.usl - x_bar) / (3.0 * sigma);
        let cpl = (x_bar - self.lsl) / (3.0 * sigma);
        let cp = (self.usl - self.lsl) / (6.0 * sigma);
        let cpk = cpu.min(cpl);

        // Taguchi: mean squared deviation from target replaces the variance.
        let cpm = self.target.map(|t| {
            let tau = (sigma * sigma + (x_bar - t) * (x_bar - t)).sqrt();
            (self.usl - self.lsl) / (6.0 * tau)
        });

        CapabilityIndices {
            cp,
            cpk,
            cpu,
            cpl,
            pp: cp,
            ppk: cpk,
            cpm,
            mean: x_bar,
            standard_deviation: sigma,
        }
    }
}

/// Capability indices of `values` against `[lsl, usl]`.
///
/// Shorthand for [`ProcessCapability::new`] + [`ProcessCapability::compute`].
pub fn capability_indices(
    values: &[f64],
    lsl: f64,
    usl: f64,
    target: Option<f64>,
) -> Result<CapabilityIndices> {
    let mut spec = ProcessCapability::new(lsl, usl)?;
    if let Some(t) = target {
        spec = spec.with_target(t);
    }
    spec.compute(values)
}
