//! Tabular CUSUM on z-scores, as a persistent state transition.
//!
//! # Algorithm
//!
//! Given the z-score of each new QC result, the upper and lower
//! cumulative sums are:
//!
//! ```text
//! pos(i) = max(0, pos(i-1) + z_i - k)
//! neg(i) = max(0, neg(i-1) - z_i - k)
//! ```
//!
//! A signal is generated when `pos(i) > h` or `neg(i) > h`.
//!
//! Unlike a batch chart, the state is carried between calls by the
//! caller: the engine receives the previous [`CusumState`] and returns
//! the next one for persistence.
//!
//! # Parameters
//!
//! - **k**: reference value (allowance), default 0.5 (tuned to a 1-sigma shift)
//! - **h**: decision interval, default 4.0
//!
//! # Reference
//!
//! Page, E.S. (1954). "Continuous inspection schemes", *Biometrika* 41(1-2), pp. 100-115.

use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};

/// Default reference value k.
pub const DEFAULT_CUSUM_K: f64 = 0.5;
/// Default decision interval h.
pub const DEFAULT_CUSUM_H: f64 = 4.0;

/// CUSUM slack constant and decision interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CusumParams {
    k: f64,
    h: f64,
}

impl Default for CusumParams {
    fn default() -> Self {
        Self {
            k: DEFAULT_CUSUM_K,
            h: DEFAULT_CUSUM_H,
        }
    }
}

impl CusumParams {
    /// Creates CUSUM parameters.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] if `k` is negative or non-finite, or
    /// `h` is not positive or non-finite.
    pub fn new(k: f64, h: f64) -> Result<Self> {
        if !k.is_finite() || k < 0.0 {
            return Err(QcError::InvalidParameter {
                name: "cusum_k",
                reason: "must be finite and non-negative",
            });
        }
        if !h.is_finite() || h <= 0.0 {
            return Err(QcError::InvalidParameter {
                name: "cusum_h",
                reason: "must be finite and positive",
            });
        }
        Ok(Self { k, h })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn h(&self) -> f64 {
        self.h
    }
}

/// Which accumulator crossed the decision interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CusumSide {
    Positive,
    Negative,
}

/// CUSUM accumulators for one level/lot.
///
/// # Invariants
///
/// - `pos >= 0` and `neg >= 0` after every update
/// - `crossed == (pos > h || neg > h)` for the `h` of the last update
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CusumState {
    pub pos: f64,
    pub neg: f64,
    pub crossed: bool,
}

impl CusumState {
    /// The starting state for a level/lot with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one z-score through the CUSUM and returns the next state.
    ///
    /// A non-finite `z` carries the accumulators forward unchanged, with
    /// `crossed` re-evaluated against `h`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_labqc::detection::{CusumParams, CusumState};
    ///
    /// let params = CusumParams::default();
    /// let mut state = CusumState::new();
    /// for _ in 0..4 {
    ///     state = state.update(1.5, &params);
    /// }
    /// // 4 * (1.5 - 0.5) = 4.0, not yet > h
    /// assert!(!state.crossed);
    /// state = state.update(1.5, &params);
    /// assert!(state.crossed);
    /// ```
    pub fn update(&self, z: f64, params: &CusumParams) -> Self {
        let (pos, neg) = if z.is_finite() {
            (
                (self.pos + z - params.k).max(0.0),
                (self.neg - z - params.k).max(0.0),
            )
        } else {
            (self.pos, self.neg)
        };
        Self {
            pos,
            neg,
            crossed: pos > params.h || neg > params.h,
        }
    }

    /// The side that exceeds `h`, upper side first.
    pub fn signal(&self, params: &CusumParams) -> Option<CusumSide> {
        if self.pos > params.h {
            Some(CusumSide::Positive)
        } else if self.neg > params.h {
            Some(CusumSide::Negative)
        } else {
            None
        }
    }

    /// Rebuilds the state sequence for a z-score history, starting from
    /// zero. Returns one state per input.
    ///
    /// # Complexity
    ///
    /// Time: O(n), Space: O(n)
    pub fn replay(z_scores: &[f64], params: &CusumParams) -> Vec<CusumState> {
        z_scores
            .iter()
            .scan(CusumState::new(), |state, &z| {
                *state = state.update(z, params);
                Some(*state)
            })
            .collect()
    }
}
