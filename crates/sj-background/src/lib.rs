//! # sj-background
//!
//! Heavy-ion background handling for subjet:
//! - `ThermalGenerator`: seeded thermal (Gamma-pT) background events
//! - `SubtractorBank`: event-wide constituent subtraction, one pass per radius
//! - `RandomCone`: random-cone δpT fluctuations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod random_cone;
pub mod subtractor;
pub mod thermal;

pub use random_cone::RandomCone;
pub use subtractor::{
    ConstituentSubtractor, SubtractedSet, SubtractorBank, SubtractorSettings, is_unsubtracted,
};
pub use thermal::{ThermalGenerator, ThermalSettings};
