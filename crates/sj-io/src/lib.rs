//! # sj-io
//!
//! File formats of subjet:
//! - [`ParquetEventSource`]: particle tables (one row per particle) grouped into events
//! - [`write_array_store`] / [`read_array_store`]: per-key jet arrays in one Parquet file
//! - [`infer_class_label`]: class label `y` from the input path

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array_store;
pub mod events;
pub mod label;

pub use array_store::{
    ARRAY_STORE_FILE, ArrayStore, StoreMetadata, read_array_store, write_array_store,
};
pub use events::{ParquetEventSource, write_event_parquet};
pub use label::infer_class_label;

use sj_core::Error;

pub(crate) fn store_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Store(format!("{context}: {e}"))
}

pub(crate) fn default_compression() -> parquet::basic::Compression {
    parquet::basic::Compression::SNAPPY
}
