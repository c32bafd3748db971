//! Per-key jet arrays in a single Parquet file.
//!
//! # Schema: `subjet_arrays_v1`
//!
//! One record batch per accumulation key, one row per jet:
//!
//! | Column              | Arrow Type                         | Description                   |
//! |---------------------|------------------------------------|-------------------------------|
//! | `key`               | `Utf8`                             | e.g. `hard_R0.4_pt100-125_Rmax0` |
//! | `label`             | `Utf8`                             | `hard`, `combined`, `combined_matched` |
//! | `jet_r`             | `Float64`                          | Jet radius                    |
//! | `pt_min`, `pt_max`  | `Float64`                          | pT bin edges                  |
//! | `r_max`             | `Float64`                          | Subtraction radius            |
//! | `y`                 | `Int64`                            | Class label                   |
//! | `X_Nsub`            | `FixedSizeList<Float64>[grid]`     | τ_N^β / pT in grid order      |
//! | `X_four_vectors`    | `FixedSizeList<Float64>[4·n_max]`  | Zero-padded `(pT, y, φ, 0)`   |
//! | `<qa observable>`   | `Float64` (nullable)               | One column per QA observable  |
//!
//! Key-value metadata carries the schema version, the N-subjettiness `N_list`
//! and `beta_list`, the ordered key list and the random-cone δpT series.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, FixedSizeListArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

use sj_analysis::{KeyArrays, QaObservable};
use sj_core::{Error, Result};

use crate::{default_compression, store_err};

/// File name of the array store inside the output directory.
pub const ARRAY_STORE_FILE: &str = "nsubjettiness.parquet";

/// Schema version string embedded in the key-value metadata.
pub const ARRAYS_SCHEMA_V1: &str = "subjet_arrays_v1";

/// Metadata key for the schema version.
pub const META_KEY_SCHEMA_VERSION: &str = "subjet.schema_version";
/// Metadata key for the N column of the N-subjettiness grid.
pub const META_KEY_N_LIST: &str = "subjet.N_list";
/// Metadata key for the β column of the N-subjettiness grid.
pub const META_KEY_BETA_LIST: &str = "subjet.beta_list";
/// Metadata key for the ordered key names.
pub const META_KEY_KEYS: &str = "subjet.keys";
/// Metadata key for the random-cone δpT series.
pub const META_KEY_DELTA_PT_RC: &str = "subjet.delta_pt_random_cone";
/// Metadata key for the zero-padding length.
pub const META_KEY_N_MAX: &str = "subjet.n_max_constituents";

/// Run-level metadata of an array store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// N of every grid entry
    #[serde(rename = "N_list")]
    pub n_list: Vec<usize>,
    /// β of every grid entry
    pub beta_list: Vec<f64>,
    /// Key names in file order
    pub keys: Vec<String>,
    /// Random-cone δpT, one entry per event with a background
    pub delta_pt_random_cone: Vec<f64>,
    /// Zero-padding length
    pub n_max_constituents: usize,
}

impl StoreMetadata {
    fn to_kv(&self) -> Result<HashMap<String, String>> {
        Ok(HashMap::from([
            (META_KEY_SCHEMA_VERSION.to_string(), ARRAYS_SCHEMA_V1.to_string()),
            (META_KEY_N_LIST.to_string(), serde_json::to_string(&self.n_list)?),
            (META_KEY_BETA_LIST.to_string(), serde_json::to_string(&self.beta_list)?),
            (META_KEY_KEYS.to_string(), serde_json::to_string(&self.keys)?),
            (META_KEY_DELTA_PT_RC.to_string(), serde_json::to_string(&self.delta_pt_random_cone)?),
            (META_KEY_N_MAX.to_string(), self.n_max_constituents.to_string()),
        ]))
    }

    fn from_kv(meta: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            meta.get(key).ok_or_else(|| Error::Store(format!("missing metadata key '{key}'")))
        };
        let version = get(META_KEY_SCHEMA_VERSION)?;
        if version != ARRAYS_SCHEMA_V1 {
            return Err(Error::Store(format!("unsupported array store schema '{version}'")));
        }
        Ok(Self {
            n_list: serde_json::from_str(get(META_KEY_N_LIST)?)?,
            beta_list: serde_json::from_str(get(META_KEY_BETA_LIST)?)?,
            keys: serde_json::from_str(get(META_KEY_KEYS)?)?,
            delta_pt_random_cone: serde_json::from_str(get(META_KEY_DELTA_PT_RC)?)?,
            n_max_constituents: get(META_KEY_N_MAX)?
                .parse()
                .map_err(|e| store_err("invalid n_max_constituents", e))?,
        })
    }
}

fn item_field() -> FieldRef {
    Arc::new(Field::new("item", DataType::Float64, false))
}

fn schema(n_nsub: usize, n_max: usize, metadata: HashMap<String, String>) -> SchemaRef {
    let mut fields = vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("label", DataType::Utf8, false),
        Field::new("jet_r", DataType::Float64, false),
        Field::new("pt_min", DataType::Float64, false),
        Field::new("pt_max", DataType::Float64, false),
        Field::new("r_max", DataType::Float64, false),
        Field::new("y", DataType::Int64, false),
        Field::new("X_Nsub", DataType::FixedSizeList(item_field(), n_nsub as i32), false),
        Field::new("X_four_vectors", DataType::FixedSizeList(item_field(), 4 * n_max as i32), false),
    ];
    for obs in QaObservable::ALL {
        fields.push(Field::new(obs.as_str(), DataType::Float64, true));
    }
    Arc::new(Schema::new(fields).with_metadata(metadata))
}

fn fixed_size_list(values: Vec<f64>, width: usize) -> Result<ArrayRef> {
    let list = FixedSizeListArray::try_new(
        item_field(),
        width as i32,
        Arc::new(Float64Array::from(values)),
        None,
    )
    .map_err(|e| store_err("failed to build FixedSizeList", e))?;
    Ok(Arc::new(list))
}

fn key_batch(schema: &SchemaRef, arrays: &KeyArrays, class_label: i64) -> Result<RecordBatch> {
    let n = arrays.n_jets;
    let info = &arrays.info;
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![info.name(); n])),
        Arc::new(StringArray::from(vec![info.label.as_str(); n])),
        Arc::new(Float64Array::from(vec![info.jet_r; n])),
        Arc::new(Float64Array::from(vec![info.pt_min; n])),
        Arc::new(Float64Array::from(vec![info.pt_max; n])),
        Arc::new(Float64Array::from(vec![info.r_max; n])),
        Arc::new(Int64Array::from(vec![class_label; n])),
        fixed_size_list(arrays.nsubjettiness.clone(), arrays.n_nsub)?,
        fixed_size_list(arrays.four_vectors.clone(), 4 * arrays.n_max)?,
    ];
    for (_, values) in &arrays.qa {
        columns.push(Arc::new(Float64Array::from(values.clone())));
    }
    RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| store_err(&format!("failed to build RecordBatch for {}", info.name()), e))
}

/// Write one record batch per key to `path`.
pub fn write_array_store(
    path: &Path,
    arrays: &[KeyArrays],
    metadata: &StoreMetadata,
    class_label: i64,
) -> Result<()> {
    let n_nsub = metadata.n_list.len();
    let n_max = metadata.n_max_constituents;
    if let Some(bad) = arrays.iter().find(|a| a.n_nsub != n_nsub || a.n_max != n_max) {
        return Err(Error::Store(format!(
            "key {} has shape ({}, {}), store expects ({n_nsub}, {n_max})",
            bad.info.name(),
            bad.n_nsub,
            bad.n_max
        )));
    }
    let schema = schema(n_nsub, n_max, metadata.to_kv()?);
    let props = WriterProperties::builder().set_compression(default_compression()).build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))
        .map_err(|e| store_err("failed to create Parquet writer", e))?;
    for key in arrays {
        let batch = key_batch(&schema, key, class_label)?;
        writer.write(&batch).map_err(|e| store_err("failed to write Parquet", e))?;
        tracing::debug!(key = %key.info.name(), rows = key.n_jets, "key written");
    }
    writer.close().map_err(|e| store_err("failed to close Parquet writer", e))?;
    Ok(())
}

/// Contents of an array store file.
#[derive(Debug, Clone)]
pub struct ArrayStore {
    /// Run-level metadata
    pub metadata: StoreMetadata,
    /// Decoded rows (batch boundaries are not preserved)
    pub batches: Vec<RecordBatch>,
}

impl ArrayStore {
    /// Total number of jet rows
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

/// Read an array store written by [`write_array_store`].
pub fn read_array_store(path: &Path) -> Result<ArrayStore> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| store_err(&format!("failed to read {}", path.display()), e))?;
    let metadata = StoreMetadata::from_kv(builder.schema().metadata())?;
    let reader = builder.build().map_err(|e| store_err("failed to build Parquet reader", e))?;
    let batches: std::result::Result<Vec<_>, _> = reader.collect();
    let batches = batches.map_err(|e| store_err("failed to read Parquet batches", e))?;
    Ok(ArrayStore { metadata, batches })
}
