//! # sj-cluster
//!
//! Sequential-recombination jet clustering for subjet.
//!
//! Clustering itself runs on the `jetty` crate (anti-kt, Cambridge/Aachen, kt,
//! E-scheme recombination). This crate records its steps as a history so that
//! constituents, parents and exclusive jets can be recovered, and adds jet
//! selectors and primary Lund declustering with soft drop.
//!
//! ## Example
//!
//! ```
//! use sj_cluster::{JetDefinition, cluster};
//! use sj_core::{FourMomentum, Kinematics, Particle};
//!
//! let parts = vec![
//!     Particle::hard(FourMomentum::from_pt_eta_phi_m(40.0, 0.1, 1.0, 0.0), 0),
//!     Particle::hard(FourMomentum::from_pt_eta_phi_m(10.0, 0.2, 1.1, 0.0), 1),
//! ];
//! let jets = cluster(&parts, JetDefinition::anti_kt(0.4));
//! assert_eq!(jets.len(), 1);
//! assert!(jets[0].pt() > 49.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod definition;
pub mod jet;
pub mod lund;
pub mod selector;
pub mod sequence;

pub use definition::{JetAlgorithm, JetDefinition, MAX_ALLOWABLE_R};
pub use jet::{Jet, sort_by_pt};
pub use lund::{LundDeclusterer, LundSplitting};
pub use selector::JetSelector;
pub use sequence::{ClusterSequence, HistoryElement, Parents, cluster};
