//! Process capability analysis.
//!
//! Computes standard capability indices for assessing how well QC results
//! meet a tolerance window, and the laboratory sigma metric.
//!
//! # Indices
//!
//! - **Cp** — Potential capability (spread vs tolerance)
//! - **Cpk** — Actual capability (centering considered)
//! - **Pp**, **Ppk** — Long-term performance indices
//! - **Cpm** — Taguchi capability (target deviation)
//!
//! # Sigma Level
//!
//! - [`sigma_metric`] — `(TEa - |bias|) / CV`
//! - [`SigmaCategory`] — quality band of a sigma value
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.

mod indices;
mod sigma_level;

pub use indices::{capability_indices, CapabilityIndices, ProcessCapability};
pub use sigma_level::{sigma_metric, SigmaCategory};
