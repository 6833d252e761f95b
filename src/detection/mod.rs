//! Shift detection.
//!
//! # Charts
//!
//! - [`CusumState`] — tabular two-sided CUSUM (Page, 1954) over z-scores,
//!   advanced one observation at a time with caller-persisted state
//!
//! # References
//!
//! - Page, E.S. (1954). "Continuous Inspection Schemes",
//!   *Biometrika* 41(1/2), pp. 100-115.

mod cusum;

pub use cusum::{CusumParams, CusumSide, CusumState, DEFAULT_CUSUM_H, DEFAULT_CUSUM_K};
