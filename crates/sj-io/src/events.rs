//! Particle tables: one Parquet row per particle, grouped into events.
//!
//! # Columns
//!
//! | Column          | Type           | Required | Description                         |
//! |-----------------|----------------|----------|-------------------------------------|
//! | `run_number`    | integer        | yes      | Run number                          |
//! | `ev_id`         | integer        | yes      | Event id within the run             |
//! | `ParticlePt`    | float          | yes      | Transverse momentum (GeV)           |
//! | `ParticleEta`   | float          | yes      | Pseudorapidity                      |
//! | `ParticlePhi`   | float          | yes      | Azimuth                             |
//! | `ParticleMass`  | float          | no       | Mass (GeV), 0 when absent           |
//! | `is_background` | bool / integer | no       | Routes the row to the background    |
//!
//! Events are the groups of rows sharing `(run_number, ev_id)`, in order of
//! first appearance; an event with background rows only has an empty hard
//! collection. Numeric columns of any integer or float width are accepted.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;

use sj_core::{Error, EventSource, FourMomentum, Kinematics, Particle, RawEvent, Result};

use crate::{default_compression, store_err};

/// Run number column
pub const RUN_NUMBER_COLUMN: &str = "run_number";
/// Event id column
pub const EV_ID_COLUMN: &str = "ev_id";
/// pT column
pub const PT_COLUMN: &str = "ParticlePt";
/// η column
pub const ETA_COLUMN: &str = "ParticleEta";
/// φ column
pub const PHI_COLUMN: &str = "ParticlePhi";
/// Optional mass column
pub const MASS_COLUMN: &str = "ParticleMass";
/// Optional background flag column
pub const BACKGROUND_COLUMN: &str = "is_background";

fn column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<Option<ArrayRef>> {
    let Ok(idx) = batch.schema().index_of(name) else {
        return Ok(None);
    };
    let arr = cast(batch.column(idx), to)
        .map_err(|e| Error::Validation(format!("column '{name}' cannot be read as {to}: {e}")))?;
    Ok(Some(arr))
}

fn required(batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef> {
    column(batch, name, to)?
        .ok_or_else(|| Error::Validation(format!("missing column '{name}' in particle table")))
}

fn f64_value(arr: &Float64Array, row: usize) -> f64 {
    if arr.is_null(row) { f64::NAN } else { arr.value(row) }
}

#[derive(Debug, Default)]
struct EventRows {
    run_number: i64,
    ev_id: i64,
    hard: Vec<FourMomentum>,
    background: Vec<FourMomentum>,
}

/// Events of one particle table, served in order of first appearance.
#[derive(Debug)]
pub struct ParquetEventSource {
    events: VecDeque<RawEvent>,
    total: usize,
}

impl ParquetEventSource {
    /// Read and group a Parquet particle table.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| store_err(&format!("failed to read {}", path.display()), e))?
            .build()
            .map_err(|e| store_err("failed to build Parquet reader", e))?;
        let batches: std::result::Result<Vec<_>, _> = reader.collect();
        let batches = batches.map_err(|e| store_err("failed to read Parquet batches", e))?;
        let source = Self::from_batches(&batches)?;
        tracing::info!(path = %path.display(), events = source.total, "particle table loaded");
        Ok(source)
    }

    /// Group already-decoded record batches.
    pub fn from_batches(batches: &[RecordBatch]) -> Result<Self> {
        let mut order: Vec<EventRows> = Vec::new();
        let mut index: HashMap<(i64, i64), usize> = HashMap::new();
        let mut has_background = false;

        for batch in batches {
            let run = required(batch, RUN_NUMBER_COLUMN, &DataType::Int64)?;
            let ev = required(batch, EV_ID_COLUMN, &DataType::Int64)?;
            let pt = required(batch, PT_COLUMN, &DataType::Float64)?;
            let eta = required(batch, ETA_COLUMN, &DataType::Float64)?;
            let phi = required(batch, PHI_COLUMN, &DataType::Float64)?;
            let mass = column(batch, MASS_COLUMN, &DataType::Float64)?;
            let bkg = column(batch, BACKGROUND_COLUMN, &DataType::Boolean)?;
            has_background |= bkg.is_some();

            let run = run.as_primitive::<Int64Type>();
            let ev = ev.as_primitive::<Int64Type>();
            let pt = pt.as_primitive::<Float64Type>();
            let eta = eta.as_primitive::<Float64Type>();
            let phi = phi.as_primitive::<Float64Type>();
            let mass = mass.as_ref().map(|m| m.as_primitive::<Float64Type>());
            let bkg = bkg.as_ref().map(|b| b.as_boolean());

            for row in 0..batch.num_rows() {
                if run.is_null(row) || ev.is_null(row) {
                    return Err(Error::Validation(format!(
                        "row {row} has no run_number / ev_id"
                    )));
                }
                let key = (run.value(row), ev.value(row));
                let slot = *index.entry(key).or_insert_with(|| {
                    order.push(EventRows { run_number: key.0, ev_id: key.1, ..Default::default() });
                    order.len() - 1
                });
                let m = mass.map_or(0.0, |m| if m.is_null(row) { 0.0 } else { m.value(row) });
                let momentum = FourMomentum::from_pt_eta_phi_m(
                    f64_value(pt, row),
                    f64_value(eta, row),
                    f64_value(phi, row),
                    m,
                );
                let is_bkg = bkg.is_some_and(|b| !b.is_null(row) && b.value(row));
                let rows = &mut order[slot];
                if is_bkg {
                    rows.background.push(momentum);
                } else {
                    rows.hard.push(momentum);
                }
            }
        }

        let events: VecDeque<RawEvent> = order
            .into_iter()
            .map(|rows| RawEvent {
                run_number: rows.run_number,
                ev_id: rows.ev_id,
                hard: Some(
                    rows.hard.iter().enumerate().map(|(i, p)| Particle::hard(*p, i)).collect(),
                ),
                background: has_background.then(|| {
                    rows.background
                        .iter()
                        .enumerate()
                        .map(|(i, p)| Particle::background(*p, i))
                        .collect()
                }),
            })
            .collect();
        let total = events.len();
        Ok(Self { events, total })
    }
}

impl EventSource for ParquetEventSource {
    fn next_event(&mut self) -> Result<Option<RawEvent>> {
        Ok(self.events.pop_front())
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// Write events as a particle table (hard rows first, then background rows).
pub fn write_event_parquet(path: &Path, events: &[RawEvent]) -> Result<()> {
    let mut run = Vec::new();
    let mut ev = Vec::new();
    let mut cols: [Vec<f64>; 4] = Default::default();
    let mut bkg = Vec::new();
    for event in events {
        let tagged = [(&event.hard, false), (&event.background, true)];
        for (collection, is_bkg) in tagged {
            for p in collection.iter().flatten() {
                run.push(event.run_number);
                ev.push(event.ev_id);
                cols[0].push(p.pt());
                cols[1].push(p.eta());
                cols[2].push(p.phi());
                cols[3].push(p.m());
                bkg.push(is_bkg);
            }
        }
    }
    let [pt, eta, phi, mass] = cols;

    let schema = Arc::new(Schema::new(vec![
        Field::new(RUN_NUMBER_COLUMN, DataType::Int64, false),
        Field::new(EV_ID_COLUMN, DataType::Int64, false),
        Field::new(PT_COLUMN, DataType::Float64, false),
        Field::new(ETA_COLUMN, DataType::Float64, false),
        Field::new(PHI_COLUMN, DataType::Float64, false),
        Field::new(MASS_COLUMN, DataType::Float64, false),
        Field::new(BACKGROUND_COLUMN, DataType::Boolean, false),
    ]));
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(run)),
        Arc::new(Int64Array::from(ev)),
        Arc::new(Float64Array::from(pt)),
        Arc::new(Float64Array::from(eta)),
        Arc::new(Float64Array::from(phi)),
        Arc::new(Float64Array::from(mass)),
        Arc::new(BooleanArray::from(bkg)),
    ];
    let batch = RecordBatch::try_new(schema, arrays)
        .map_err(|e| store_err("failed to build particle RecordBatch", e))?;

    let props = WriterProperties::builder().set_compression(default_compression()).build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| store_err("failed to create Parquet writer", e))?;
    writer.write(&batch).map_err(|e| store_err("failed to write Parquet", e))?;
    writer.close().map_err(|e| store_err("failed to close Parquet writer", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float32Array, Int32Array, UInt8Array};

    fn batch(run: Vec<i32>, ev: Vec<i32>, pt: Vec<f32>, bkg: Option<Vec<u8>>) -> RecordBatch {
        let n = pt.len();
        let mut fields = vec![
            Field::new("run_number", DataType::Int32, false),
            Field::new("ev_id", DataType::Int32, false),
            Field::new("ParticlePt", DataType::Float32, false),
            Field::new("ParticleEta", DataType::Float32, false),
            Field::new("ParticlePhi", DataType::Float32, false),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(run)),
            Arc::new(Int32Array::from(ev)),
            Arc::new(Float32Array::from(pt)),
            Arc::new(Float32Array::from(vec![0.1_f32; n])),
            Arc::new(Float32Array::from(vec![1.0_f32; n])),
        ];
        if let Some(b) = bkg {
            fields.push(Field::new("is_background", DataType::UInt8, false));
            arrays.push(Arc::new(UInt8Array::from(b)));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let b = batch(vec![1, 1, 2, 1], vec![5, 5, 3, 4], vec![10.0, 20.0, 30.0, 40.0], None);
        let mut source = ParquetEventSource::from_batches(&[b]).unwrap();
        assert_eq!(source.len_hint(), Some(3));
        let first = source.next_event().unwrap().unwrap();
        assert_eq!((first.run_number, first.ev_id), (1, 5));
        let hard = first.hard.unwrap();
        assert_eq!(hard.len(), 2);
        assert_eq!(hard[1].user_index, 1);
        assert!((hard[1].pt() - 20.0).abs() < 1e-4);
        assert!(first.background.is_none());
        let second = source.next_event().unwrap().unwrap();
        assert_eq!((second.run_number, second.ev_id), (2, 3));
        source.next_event().unwrap().unwrap();
        assert!(source.next_event().unwrap().is_none());
    }

    #[test]
    fn test_background_flag_routes_rows() {
        let b = batch(vec![1, 1, 1], vec![1, 1, 1], vec![10.0, 1.0, 2.0], Some(vec![0, 1, 1]));
        let mut source = ParquetEventSource::from_batches(&[b]).unwrap();
        let event = source.next_event().unwrap().unwrap();
        assert_eq!(event.hard.as_ref().map(Vec::len), Some(1));
        let bkg = event.background.unwrap();
        assert_eq!(bkg.iter().map(|p| p.user_index).collect::<Vec<_>>(), vec![-1, -2]);
    }

    #[test]
    fn test_background_only_event_has_empty_hard() {
        let b = batch(vec![1], vec![1], vec![1.0], Some(vec![1]));
        let mut source = ParquetEventSource::from_batches(&[b]).unwrap();
        let event = source.next_event().unwrap().unwrap();
        assert_eq!(event.hard.as_ref().map(Vec::len), Some(0));
        assert_eq!(event.background.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_missing_column() {
        let schema = Arc::new(Schema::new(vec![Field::new("run_number", DataType::Int64, false)]));
        let b = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1]))]).unwrap();
        let err = ParquetEventSource::from_batches(&[b]).unwrap_err();
        assert!(err.to_string().contains("ev_id"));
    }
}
