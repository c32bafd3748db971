//! Per-key storage of jet observables across events.
//!
//! An event stages its rows in an [`EventContribution`]; [`Accumulator::commit`]
//! checks every key before appending anything, so a rejected event leaves no
//! partial rows behind.

use sj_core::{Error, Result};

use crate::config::Settings;
use crate::keys::{AccumulationKey, KeyInfo, KeyTable, QaObservable};
use crate::matching::{MatchCounters, MatchedPair};
use crate::observables::ObservableBundle;

/// One jet's row in a series.
#[derive(Debug, Clone, PartialEq)]
pub struct JetRecord {
    /// τ_N^β / pT in grid order
    pub nsubjettiness: Vec<f64>,
    /// QA values in [`QaObservable::ALL`] order; match-only entries are `None`
    /// outside `combined_matched`
    pub qa: [Option<f64>; 13],
    /// Constituent `(pT, y, φ, 0)` rows, unpadded
    pub four_vectors: Vec<[f64; 4]>,
}

impl JetRecord {
    /// Row for a jet, with the match QA values when `matched` is given.
    pub fn new(bundle: &ObservableBundle, matched: Option<&MatchedPair>) -> Self {
        let qa = QaObservable::ALL.map(|obs| match (obs, matched) {
            (QaObservable::DeltaPt, Some(m)) => Some(m.delta_pt),
            (QaObservable::MatchedPt, Some(m)) => Some(m.matched_pt),
            (QaObservable::MatchedDeltaR, Some(m)) => Some(m.delta_r),
            _ => bundle.qa_value(obs),
        });
        Self {
            nsubjettiness: bundle.nsubjettiness.clone(),
            qa,
            four_vectors: bundle.four_vectors.clone(),
        }
    }
}

/// Rows and counters produced by one event, not yet visible in the accumulator.
#[derive(Debug, Clone, Default)]
pub struct EventContribution {
    rows: Vec<(AccumulationKey, JetRecord)>,
    counters: MatchCounters,
    delta_pt_random_cone: Option<f64>,
}

impl EventContribution {
    /// Empty contribution
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a row under `key`.
    pub fn push(&mut self, key: AccumulationKey, record: JetRecord) {
        self.rows.push((key, record));
    }

    /// Add matching tallies
    pub fn add_counters(&mut self, counters: MatchCounters) {
        self.counters += counters;
    }

    /// Record the event's random-cone δpT
    pub fn set_delta_pt_random_cone(&mut self, delta_pt: f64) {
        self.delta_pt_random_cone = Some(delta_pt);
    }

    /// Number of staged rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing was staged
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Matching tallies of this event
    pub fn counters(&self) -> MatchCounters {
        self.counters
    }
}

/// Final arrays of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyArrays {
    /// The key
    pub key: AccumulationKey,
    /// Physical description of the key
    pub info: KeyInfo,
    /// Number of jets (rows)
    pub n_jets: usize,
    /// Width of the N-subjettiness rows
    pub n_nsub: usize,
    /// Row-major `n_jets × n_nsub` matrix
    pub nsubjettiness: Vec<f64>,
    /// Row-major `n_jets × n_max × 4` constituent array, zero padded
    pub four_vectors: Vec<f64>,
    /// Zero-padding length
    pub n_max: usize,
    /// QA columns in [`QaObservable::ALL`] order, one entry per jet
    pub qa: Vec<(QaObservable, Vec<Option<f64>>)>,
}

impl KeyArrays {
    /// Non-null values of one QA column
    pub fn qa_series(&self, observable: QaObservable) -> Vec<f64> {
        self.qa[observable.index()].1.iter().flatten().copied().collect()
    }
}

/// Flatten `rows` and pad with zero rows to exactly `n_max` four-vectors.
pub fn pad_four_vectors(rows: &[[f64; 4]], n_max: usize) -> Result<Vec<f64>> {
    if rows.len() > n_max {
        return Err(Error::ConstituentOverflow { count: rows.len(), n_max });
    }
    let mut out = Vec::with_capacity(4 * n_max);
    for row in rows {
        out.extend_from_slice(row);
    }
    out.resize(4 * n_max, 0.0);
    Ok(out)
}

/// The only state that outlives an event.
#[derive(Debug, Clone)]
pub struct Accumulator {
    table: KeyTable,
    n_nsub: usize,
    series: Vec<Vec<JetRecord>>,
    counters: MatchCounters,
    delta_pt_random_cone: Vec<f64>,
    events: u64,
}

impl Accumulator {
    /// Empty series for every valid key of `settings`.
    pub fn new(settings: &Settings) -> Self {
        let table = KeyTable::new(settings);
        let series = vec![Vec::new(); table.len()];
        Self {
            table,
            n_nsub: settings.nsub_grid.len(),
            series,
            counters: MatchCounters::default(),
            delta_pt_random_cone: Vec::new(),
            events: 0,
        }
    }

    /// The key table
    pub fn table(&self) -> &KeyTable {
        &self.table
    }

    /// Summed matching tallies
    pub fn counters(&self) -> MatchCounters {
        self.counters
    }

    /// Random-cone δpT, one entry per event with a background
    pub fn delta_pt_random_cone(&self) -> &[f64] {
        &self.delta_pt_random_cone
    }

    /// Committed events
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Rows committed under `key`
    pub fn len_of(&self, key: &AccumulationKey) -> Result<usize> {
        Ok(self.series[self.table.position(key)?].len())
    }

    /// Append an event's rows atomically.
    pub fn commit(&mut self, contribution: EventContribution) -> Result<()> {
        let mut positions = Vec::with_capacity(contribution.rows.len());
        for (key, record) in &contribution.rows {
            positions.push(self.table.position(key)?);
            if record.nsubjettiness.len() != self.n_nsub {
                return Err(Error::Computation(format!(
                    "N-subjettiness row has {} entries, grid has {}",
                    record.nsubjettiness.len(),
                    self.n_nsub
                )));
            }
        }
        for (pos, (_, record)) in positions.into_iter().zip(contribution.rows) {
            self.series[pos].push(record);
        }
        self.counters += contribution.counters;
        if let Some(dpt) = contribution.delta_pt_random_cone {
            self.delta_pt_random_cone.push(dpt);
        }
        self.events += 1;
        Ok(())
    }

    /// Fixed-shape arrays for every key, constituents padded to `n_max`.
    pub fn finalize(self, n_max: usize) -> Result<Vec<KeyArrays>> {
        let mut out = Vec::with_capacity(self.table.len());
        for (pos, records) in self.series.into_iter().enumerate() {
            let key = self.table.keys()[pos];
            let info = self.table.info(pos).clone();
            let n_jets = records.len();
            let mut nsubjettiness = Vec::with_capacity(n_jets * self.n_nsub);
            let mut four_vectors = Vec::with_capacity(n_jets * 4 * n_max);
            let mut qa: Vec<(QaObservable, Vec<Option<f64>>)> =
                QaObservable::ALL.iter().map(|&o| (o, Vec::with_capacity(n_jets))).collect();
            for record in &records {
                nsubjettiness.extend_from_slice(&record.nsubjettiness);
                four_vectors.extend(pad_four_vectors(&record.four_vectors, n_max)?);
                for (column, value) in qa.iter_mut().zip(record.qa) {
                    column.1.push(value);
                }
            }
            tracing::debug!(key = %info.name(), n_jets, n_nsub = self.n_nsub, n_max, "finalized");
            out.push(KeyArrays {
                key,
                info,
                n_jets,
                n_nsub: self.n_nsub,
                nsubjettiness,
                four_vectors,
                n_max,
                qa,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::keys::JetLabel;

    fn settings() -> Settings {
        let yaml = "K: [3]\njetR: [0.4]\njet_pt_bins: [[40, 60]]\neta_max: 0.9\n\
                    jet_matching_distance: 0.6\nconstituent_subtractor:\n  max_distance: [0, 0.25]\n  \
                    bge_rho_grid_size: 1.0\n  max_pt_correct: 100\n  ghost_area: 0.01\n";
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(yaml).unwrap();
        cfg.into_settings().unwrap()
    }

    fn record(n_constituents: usize) -> JetRecord {
        let bundle = ObservableBundle {
            pt: 50.0,
            angularity: 0.1,
            mass: 5.0,
            theta_g: 0.2,
            subjet_z: 0.8,
            hadron_z: 0.5,
            multiplicity: [n_constituents, 0, 0, 0],
            nsubjettiness: vec![0.1; 5],
            four_vectors: (0..n_constituents).map(|i| [1.0 + i as f64, 0.1, 0.2, 0.0]).collect(),
        };
        JetRecord::new(&bundle, None)
    }

    #[test]
    fn test_padding_round_trip() {
        let rows = vec![[1.0, 0.5, 2.0, 0.0], [3.0, -0.5, 4.0, 0.0]];
        let padded = pad_four_vectors(&rows, 5).unwrap();
        assert_eq!(padded.len(), 20);
        assert_eq!(&padded[..4], &rows[0]);
        assert_eq!(&padded[4..8], &rows[1]);
        assert!(padded[8..].iter().all(|&v| v == 0.0));
        assert!(matches!(
            pad_four_vectors(&rows, 1),
            Err(Error::ConstituentOverflow { count: 2, n_max: 1 })
        ));
    }

    #[test]
    fn test_commit_and_finalize() {
        let mut acc = Accumulator::new(&settings());
        let combined = AccumulationKey::new(JetLabel::Combined, 0, 0, 1);
        let mut contribution = EventContribution::new();
        contribution.push(combined, record(3));
        contribution.push(combined, record(1));
        contribution.set_delta_pt_random_cone(-1.5);
        contribution.add_counters(MatchCounters { accepted: 1, ..Default::default() });
        acc.commit(contribution).unwrap();
        assert_eq!(acc.len_of(&combined).unwrap(), 2);
        assert_eq!(acc.delta_pt_random_cone(), &[-1.5]);
        assert_eq!(acc.counters().accepted, 1);

        let arrays = acc.finalize(4).unwrap();
        let key = arrays.iter().find(|a| a.key == combined).unwrap();
        assert_eq!(key.n_jets, 2);
        assert_eq!(key.nsubjettiness.len(), 2 * 5);
        assert_eq!(key.four_vectors.len(), 2 * 4 * 4);
        assert_eq!(key.qa_series(QaObservable::JetPt), vec![50.0, 50.0]);
        assert!(key.qa_series(QaObservable::DeltaPt).is_empty());
        let empty = arrays.iter().find(|a| a.key.label == JetLabel::Hard).unwrap();
        assert_eq!(empty.n_jets, 0);
    }

    #[test]
    fn test_unknown_key_leaves_no_partial_rows() {
        let mut acc = Accumulator::new(&settings());
        let good = AccumulationKey::new(JetLabel::Combined, 0, 0, 0);
        let bad = AccumulationKey::new(JetLabel::Hard, 0, 0, 1);
        let mut contribution = EventContribution::new();
        contribution.push(good, record(2));
        contribution.push(bad, record(2));
        assert!(matches!(acc.commit(contribution), Err(Error::UnknownKey(_))));
        assert_eq!(acc.len_of(&good).unwrap(), 0);
        assert_eq!(acc.events(), 0);
    }

    #[test]
    fn test_overflow_is_fatal() {
        let mut acc = Accumulator::new(&settings());
        let mut contribution = EventContribution::new();
        contribution.push(AccumulationKey::new(JetLabel::Combined, 0, 0, 0), record(6));
        acc.commit(contribution).unwrap();
        assert!(matches!(acc.finalize(5), Err(Error::ConstituentOverflow { count: 6, n_max: 5 })));
    }

    #[test]
    fn test_matched_record_carries_match_values() {
        let mut rec = record(1);
        assert_eq!(rec.qa[QaObservable::MatchedPt.index()], None);
        let pair = MatchedPair { combined: 0, hard: 0, delta_pt: 2.0, delta_r: 0.05, matched_pt: 0.9 };
        let bundle = ObservableBundle {
            pt: 50.0,
            angularity: 0.0,
            mass: 0.0,
            theta_g: 0.0,
            subjet_z: 1.0,
            hadron_z: 1.0,
            multiplicity: [1, 1, 1, 1],
            nsubjettiness: vec![0.0; 5],
            four_vectors: vec![[50.0, 0.0, 1.0, 0.0]],
        };
        rec = JetRecord::new(&bundle, Some(&pair));
        assert_eq!(rec.qa[QaObservable::DeltaPt.index()], Some(2.0));
        assert_eq!(rec.qa[QaObservable::MatchedDeltaR.index()], Some(0.05));
        assert_eq!(rec.qa[QaObservable::Multiplicity1000.index()], Some(1.0));
    }
}
