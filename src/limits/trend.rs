//! Trend detection by regression over a moving average.
//!
//! # Algorithm
//!
//! 1. Smooth the series with a simple moving average of width `w`:
//!    `MA_j = mean(x_j .. x_{j+w-1})`, giving `n - w + 1` points.
//! 2. Fit `MA_j = b0 + b1 * j` by ordinary least squares (closed form,
//!    `b1 = Sxy / Sxx`).
//! 3. `|b1| > 0.1` flags an upward or downward trend by the sign of `b1`.

use serde::{Deserialize, Serialize};

/// Default moving-average width.
pub const DEFAULT_TREND_WINDOW: usize = 7;

/// Slope magnitude (value units per point) above which a trend is flagged.
pub const TREND_SLOPE_THRESHOLD: f64 = 0.1;

/// Result of [`detect_trend`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub has_upward_trend: bool,
    pub has_downward_trend: bool,
    /// `|slope|`.
    pub trend_strength: f64,
    /// Fitted OLS slope of the moving-average series.
    pub slope: f64,
    /// The moving-average series the slope was fitted to.
    pub moving_averages: Vec<f64>,
    pub message: String,
}

/// Detects a sustained drift in `values` (chronological order).
///
/// Never fails: with fewer than `window_size` values the report says so
/// and flags no trend. A `window_size` of 0 is treated as 1.
///
/// # Examples
///
/// ```
/// use u_labqc::limits::detect_trend;
///
/// let rising: Vec<f64> = (0..14).map(|i| 100.0 + 0.5 * i as f64).collect();
/// let report = detect_trend(&rising, 7);
/// assert!(report.has_upward_trend);
/// assert!((report.trend_strength - 0.5).abs() < 1e-9);
///
/// let short = detect_trend(&[1.0, 2.0], 7);
/// assert!(!short.has_upward_trend && !short.has_downward_trend);
/// ```
pub fn detect_trend(values: &[f64], window_size: usize) -> TrendReport {
    let w = window_size.max(1);
    if values.len() < w {
        return TrendReport {
            has_upward_trend: false,
            has_downward_trend: false,
            trend_strength: 0.0,
            slope: 0.0,
            moving_averages: Vec::new(),
            message: format!(
                "Insufficient data for trend analysis: need {w} points, have {}",
                values.len()
            ),
        };
    }

    let moving_averages = moving_average(values, w);
    let slope = ols_slope(&moving_averages).unwrap_or(0.0);
    let strength = slope.abs();
    let has_upward_trend = slope > TREND_SLOPE_THRESHOLD;
    let has_downward_trend = slope < -TREND_SLOPE_THRESHOLD;

    let message = if has_upward_trend {
        format!("Upward trend detected (slope {slope:.3} per point)")
    } else if has_downward_trend {
        format!("Downward trend detected (slope {slope:.3} per point)")
    } else {
        format!("No significant trend (slope {slope:.3} per point)")
    };

    TrendReport {
        has_upward_trend,
        has_downward_trend,
        trend_strength: strength,
        slope,
        moving_averages,
        message,
    }
}

/// Trailing simple moving average; `data.len() - w + 1` points.
fn moving_average(data: &[f64], w: usize) -> Vec<f64> {
    data.windows(w)
        .map(|win| win.iter().sum::<f64>() / w as f64)
        .collect()
}

/// OLS slope of `y` against its index `0..n`.
///
/// `None` for fewer than 2 points.
fn ols_slope(y: &[f64]) -> Option<f64> {
    let n = y.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (sxy, sxx) = y
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, &yi)| {
            let dx = i as f64 - x_mean;
            (sxy + dx * (yi - y_mean), sxx + dx * dx)
        });

    Some(sxy / sxx)
}
