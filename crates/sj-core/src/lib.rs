//! # sj-core
//!
//! Core types and traits for subjet, a jet-substructure pipeline for
//! heavy-ion Monte-Carlo studies.
//!
//! This crate provides:
//! - `FourMomentum` and `Particle` with provenance tags
//! - The `Kinematics` trait shared by particles, jets and subjets
//! - The `EventSource` trait implemented by input adapters
//! - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{EventSource, Kinematics, delta_phi};
pub use types::{FourMomentum, Particle, Provenance, RawEvent};

/// Version of subjet
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
