//! # sj-analysis
//!
//! Per-event jet substructure analysis for heavy-ion studies.
//!
//! An [`EventProcessor`] validates each event, mixes in the background,
//! subtracts it for every configured correction radius, finds anti-kt jets,
//! matches combined jets to hard jets and computes observables. The rows land
//! in an [`Accumulator`] whose key table is fixed by the configuration.
//!
//! ```no_run
//! use std::path::Path;
//! use sj_analysis::{Accumulator, EventProcessor, load_settings};
//!
//! let settings = load_settings(Path::new("config.yaml"))?;
//! let mut accumulator = Accumulator::new(&settings);
//! let mut processor = EventProcessor::new(settings)?;
//! # let _ = (&mut accumulator, &mut processor);
//! # Ok::<(), sj_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod config;
pub mod finder;
pub mod keys;
pub mod matching;
pub mod mixer;
pub mod observables;
pub mod pipeline;

pub use accumulator::{Accumulator, EventContribution, JetRecord, KeyArrays, pad_four_vectors};
pub use config::{AnalysisConfig, PtBin, Settings, load_settings, read_config};
pub use finder::{COMBINED_PT_MIN_FRACTION, JetFinder};
pub use keys::{AccumulationKey, JetLabel, KeyInfo, KeyTable, NsubAxis, NsubjettinessGrid, QaObservable};
pub use matching::{MatchCounters, MatchOutcome, MatchedPair, Resolution, match_jets};
pub use mixer::{ValidEvent, mix, validate_event};
pub use observables::{ObservableBundle, ObservableComputer, PT_FLOOR, SoftDrop};
pub use pipeline::{EventProcessor, RunStats, run_events};
