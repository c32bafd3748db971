//! # sj-viz
//!
//! QA distribution artifacts for subjet.
//!
//! This crate is dependency-light and emits plot-friendly JSON structures
//! (arrays instead of nested objects); rendering happens elsewhere.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Normalized QA histograms.
pub mod distributions;

pub use distributions::{
    DistributionMeta, N_EDGES, QaDistributionArtifact, build_distribution, write_key_artifacts,
};
