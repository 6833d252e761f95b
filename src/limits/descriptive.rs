//! Descriptive statistics and ±1/2/3 SD control bounds.
//!
//! # Definitions
//!
//! ```text
//! z    = (x - mean) / sd              (0 when sd == 0)
//! sd   = sqrt(SS / (n - 1))           (sample estimator)
//! CV % = sd / |mean| * 100            (0 when mean == 0)
//! ```

use serde::{Deserialize, Serialize};

use u_numflow::stats;

use crate::error::{QcError, Result};

/// Expresses `value` in standard-deviation units relative to `mean`.
///
/// Returns 0 when `sd` is 0: a limit set with no spread carries no
/// deviation signal, and that is not treated as an error.
///
/// # Examples
///
/// ```
/// use u_labqc::limits::z_score;
///
/// assert!((z_score(116.0, 100.0, 5.0) - 3.2).abs() < 1e-12);
/// assert_eq!(z_score(116.0, 100.0, 0.0), 0.0);
/// ```
pub fn z_score(value: f64, mean: f64, sd: f64) -> f64 {
    if sd == 0.0 {
        return 0.0;
    }
    (value - mean) / sd
}

/// Coefficient of variation in percent; 0 when `mean` is 0.
pub fn coefficient_of_variation(sd: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        return 0.0;
    }
    sd / mean.abs() * 100.0
}

/// Summary statistics of a flat list of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    pub mean: f64,
    /// Sample (n-1) standard deviation.
    pub standard_deviation: f64,
    /// Sample variance, `standard_deviation²`.
    pub variance: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    /// `max - min`.
    pub range: f64,
    /// Coefficient of variation, percent.
    pub cv: f64,
}

/// Computes [`BasicStatistics`] for `values`.
///
/// # Errors
///
/// - [`QcError::EmptyDataset`] if `values` is empty.
/// - [`QcError::InvalidParameter`] if any value is NaN or infinite.
///
/// # Examples
///
/// ```
/// use u_labqc::limits::basic_statistics;
///
/// let s = basic_statistics(&[95.0, 100.0, 105.0]).unwrap();
/// assert!((s.mean - 100.0).abs() < 1e-12);
/// assert!((s.standard_deviation - 5.0).abs() < 1e-12);
/// assert!((s.cv - 5.0).abs() < 1e-12);
/// assert!(basic_statistics(&[]).is_err());
/// ```
pub fn basic_statistics(values: &[f64]) -> Result<BasicStatistics> {
    if values.is_empty() {
        return Err(QcError::EmptyDataset {
            operation: "basic_statistics",
        });
    }
    let non_finite = || QcError::InvalidParameter {
        name: "values",
        reason: "must all be finite",
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(non_finite());
    }

    let mean = stats::mean(values).ok_or_else(non_finite)?;
    let min = stats::min(values).ok_or_else(non_finite)?;
    let max = stats::max(values).ok_or_else(non_finite)?;
    // A single observation has no spread estimate; report it as 0.
    let variance = if values.len() == 1 {
        0.0
    } else {
        stats::variance(values).ok_or_else(non_finite)?
    };
    let standard_deviation = variance.sqrt();

    Ok(BasicStatistics {
        mean,
        standard_deviation,
        variance,
        count: values.len(),
        min,
        max,
        range: max - min,
        cv: coefficient_of_variation(standard_deviation, mean),
    })
}

/// The six control bounds at ±1, ±2 and ±3 SD around a mean.
///
/// # Invariants
///
/// For `sd >= 0`: `limit_3s_lower <= limit_2s_lower <= limit_1s_lower
/// <= limit_1s_upper <= limit_2s_upper <= limit_3s_upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlBounds {
    pub limit_1s_lower: f64,
    pub limit_1s_upper: f64,
    pub limit_2s_lower: f64,
    pub limit_2s_upper: f64,
    pub limit_3s_lower: f64,
    pub limit_3s_upper: f64,
}

impl ControlBounds {
    /// Derives the bounds from a mean and standard deviation.
    pub fn new(mean: f64, sd: f64) -> Self {
        Self {
            limit_1s_lower: mean - sd,
            limit_1s_upper: mean + sd,
            limit_2s_lower: mean - 2.0 * sd,
            limit_2s_upper: mean + 2.0 * sd,
            limit_3s_lower: mean - 3.0 * sd,
            limit_3s_upper: mean + 3.0 * sd,
        }
    }

    /// `true` if `value` lies inside the closed ±3 SD band.
    pub fn within_3s(&self, value: f64) -> bool {
        value >= self.limit_3s_lower && value <= self.limit_3s_upper
    }
}

/// Statistics plus derived control bounds, as used to preview or
/// materialize a limit set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcStatistics {
    /// Statistics computed from the data itself.
    pub statistics: BasicStatistics,
    /// Mean the bounds are centred on (target if supplied, else computed).
    pub mean: f64,
    /// SD the bounds are scaled by (target if supplied, else computed).
    pub standard_deviation: f64,
    /// CV of `mean`/`standard_deviation`, percent.
    pub cv: f64,
    pub bounds: ControlBounds,
    /// Values strictly outside the ±3 SD band, in input order.
    pub outliers: Vec<f64>,
    pub in_control_count: usize,
    pub out_of_control_count: usize,
}

/// Computes statistics and ±1/2/3 SD bounds for `values`.
///
/// `target_mean` / `target_sd` override the computed mean / SD when
/// supplied (e.g. manufacturer or peer-group assigned values). The
/// overrides are independent of each other.
///
/// # Errors
///
/// Propagates [`basic_statistics`] errors.
///
/// # Examples
///
/// ```
/// use u_labqc::limits::qc_statistics;
///
/// let q = qc_statistics(&[95.0, 100.0, 105.0], None, None).unwrap();
/// assert!((q.bounds.limit_1s_upper - 105.0).abs() < 1e-12);
/// assert!((q.bounds.limit_1s_lower - 95.0).abs() < 1e-12);
/// assert!(q.outliers.is_empty());
/// ```
pub fn qc_statistics(
    values: &[f64],
    target_mean: Option<f64>,
    target_sd: Option<f64>,
) -> Result<QcStatistics> {
    let statistics = basic_statistics(values)?;
    let mean = target_mean.unwrap_or(statistics.mean);
    let sd = target_sd.unwrap_or(statistics.standard_deviation);
    let bounds = ControlBounds::new(mean, sd);

    let outliers: Vec<f64> = values
        .iter()
        .copied()
        .filter(|&v| !bounds.within_3s(v))
        .collect();
    let out_of_control_count = outliers.len();

    Ok(QcStatistics {
        statistics,
        mean,
        standard_deviation: sd,
        cv: coefficient_of_variation(sd, mean),
        bounds,
        outliers,
        in_control_count: values.len() - out_of_control_count,
        out_of_control_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_score_of_mean_is_zero() {
        assert_eq!(z_score(100.0, 100.0, 5.0), 0.0);
    }

    #[test]
    fn z_score_zero_sd_is_zero() {
        assert_eq!(z_score(123.0, 100.0, 0.0), 0.0);
        assert_eq!(z_score(-5.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn z_score_known_values() {
        assert!((z_score(116.0, 100.0, 5.0) - 3.2).abs() < 1e-12);
        assert!((z_score(114.0, 100.0, 5.0) - 2.8).abs() < 1e-12);
        assert!((z_score(90.0, 100.0, 5.0) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn basic_statistics_empty_is_error() {
        let err = basic_statistics(&[]).unwrap_err();
        assert!(matches!(err, QcError::EmptyDataset { .. }));
    }

    #[test]
    fn basic_statistics_rejects_nan() {
        assert!(matches!(
            basic_statistics(&[1.0, f64::NAN]),
            Err(QcError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn basic_statistics_known_values() {
        let s = basic_statistics(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert!((s.mean - 5.0).abs() < 1e-12);
        // SS = 32, n-1 = 7
        assert!((s.variance - 32.0 / 7.0).abs() < 1e-12);
        assert!((s.standard_deviation - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.range, 7.0);
    }

    #[test]
    fn basic_statistics_rejects_infinity() {
        assert!(matches!(
            basic_statistics(&[1.0, f64::INFINITY, 3.0]),
            Err(QcError::InvalidParameter { name: "values", .. })
        ));
    }

    #[test]
    fn basic_statistics_sample_variance() {
        // deviations -5, 0, 5 -> SS = 50, n-1 = 2
        let s = basic_statistics(&[95.0, 100.0, 105.0]).unwrap();
        assert!((s.variance - 25.0).abs() < 1e-12);
        assert!((s.standard_deviation - 5.0).abs() < 1e-12);
    }

    #[test]
    fn basic_statistics_single_value() {
        let s = basic_statistics(&[4.2]).unwrap();
        assert_eq!(s.mean, 4.2);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.standard_deviation, 0.0);
        assert_eq!(s.range, 0.0);
        assert_eq!(s.cv, 0.0);
    }

    #[test]
    fn cv_zero_mean_is_zero() {
        let s = basic_statistics(&[-1.0, 1.0]).unwrap();
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.cv, 0.0);
    }

    #[test]
    fn cv_uses_absolute_mean() {
        let s = basic_statistics(&[-95.0, -100.0, -105.0]).unwrap();
        assert!((s.cv - 5.0).abs() < 1e-12);
    }

    #[test]
    fn qc_statistics_three_values() {
        let q = qc_statistics(&[95.0, 100.0, 105.0], None, None).unwrap();
        assert!((q.mean - 100.0).abs() < 1e-12);
        assert!((q.standard_deviation - 5.0).abs() < 1e-12);
        assert!((q.bounds.limit_1s_upper - 105.0).abs() < 1e-12);
        assert!((q.bounds.limit_1s_lower - 95.0).abs() < 1e-12);
        assert!((q.bounds.limit_2s_upper - 110.0).abs() < 1e-12);
        assert!((q.bounds.limit_3s_lower - 85.0).abs() < 1e-12);
        assert_eq!(q.in_control_count, 3);
        assert_eq!(q.out_of_control_count, 0);
    }

    #[test]
    fn qc_statistics_uses_targets() {
        let q = qc_statistics(&[95.0, 100.0, 105.0, 130.0], Some(100.0), Some(5.0)).unwrap();
        assert_eq!(q.mean, 100.0);
        assert_eq!(q.standard_deviation, 5.0);
        assert!((q.bounds.limit_3s_upper - 115.0).abs() < 1e-12);
        assert_eq!(q.outliers, vec![130.0]);
        assert_eq!(q.in_control_count, 3);
        assert_eq!(q.out_of_control_count, 1);
        // computed statistics are still reported
        assert!(q.statistics.mean > 100.0);
    }

    #[test]
    fn qc_statistics_point_on_3s_limit_is_not_outlier() {
        let q = qc_statistics(&[115.0, 85.0], Some(100.0), Some(5.0)).unwrap();
        assert!(q.outliers.is_empty());
    }

    #[test]
    fn qc_statistics_empty_is_error() {
        assert!(matches!(
            qc_statistics(&[], Some(1.0), Some(1.0)),
            Err(QcError::EmptyDataset { .. })
        ));
    }
}
