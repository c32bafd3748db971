//! Typed names for everything the accumulator stores.
//!
//! Keys are index tuples into the configuration (radius, pT bin, subtraction
//! radius) and the set of valid keys is fixed once by [`KeyTable::new`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use sj_background::is_unsubtracted;
use sj_core::{Error, Result};

use crate::config::Settings;

/// Which jet population a series belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JetLabel {
    /// Jets of the hard (truth) event
    Hard,
    /// Jets of the combined (embedded, subtracted) event
    Combined,
    /// Combined jets with an accepted hard match
    CombinedMatched,
}

impl JetLabel {
    /// All labels in output order
    pub const ALL: [JetLabel; 3] = [JetLabel::Hard, JetLabel::Combined, JetLabel::CombinedMatched];

    /// Name used in file names and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            JetLabel::Hard => "hard",
            JetLabel::Combined => "combined",
            JetLabel::CombinedMatched => "combined_matched",
        }
    }
}

impl fmt::Display for JetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output series: (label, radius, pT bin, subtraction radius) by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccumulationKey {
    /// Jet population
    pub label: JetLabel,
    /// Index into the configured jet radii
    pub radius: usize,
    /// Index into the configured pT bins
    pub pt_bin: usize,
    /// Index into the configured subtraction radii
    pub r_max: usize,
}

impl AccumulationKey {
    /// Key for `label` at the given configuration indices
    pub fn new(label: JetLabel, radius: usize, pt_bin: usize, r_max: usize) -> Self {
        Self { label, radius, pt_bin, r_max }
    }
}

/// Physical values behind an [`AccumulationKey`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyInfo {
    /// Jet population
    pub label: JetLabel,
    /// Jet radius
    pub jet_r: f64,
    /// pT bin lower edge
    pub pt_min: f64,
    /// pT bin upper edge
    pub pt_max: f64,
    /// Subtraction radius
    pub r_max: f64,
}

impl KeyInfo {
    /// Stable name, e.g. `combined_R0.4_pt100-125_Rmax0.25`.
    pub fn name(&self) -> String {
        format!(
            "{}_R{}_pt{}-{}_Rmax{}",
            self.label, self.jet_r, self.pt_min, self.pt_max, self.r_max
        )
    }
}

/// The fixed set of valid keys.
///
/// `combined` and `combined_matched` exist for every subtraction radius; `hard`
/// only for the unsubtracted radius 0.
#[derive(Debug, Clone)]
pub struct KeyTable {
    keys: Vec<AccumulationKey>,
    infos: Vec<KeyInfo>,
    index: HashMap<AccumulationKey, usize>,
}

impl KeyTable {
    /// Enumerate every valid key of a configuration.
    pub fn new(settings: &Settings) -> Self {
        let mut keys = Vec::new();
        let mut infos = Vec::new();
        for label in JetLabel::ALL {
            for (ri, &jet_r) in settings.jet_radii.iter().enumerate() {
                for (bi, bin) in settings.pt_bins.iter().enumerate() {
                    for (mi, &r_max) in settings.subtraction_radii().iter().enumerate() {
                        if label == JetLabel::Hard && !is_unsubtracted(r_max) {
                            continue;
                        }
                        keys.push(AccumulationKey::new(label, ri, bi, mi));
                        infos.push(KeyInfo { label, jet_r, pt_min: bin.min, pt_max: bin.max, r_max });
                    }
                }
            }
        }
        let index = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
        Self { keys, infos, index }
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in table order
    pub fn keys(&self) -> &[AccumulationKey] {
        &self.keys
    }

    /// Physical description of the key at `position`
    pub fn info(&self, position: usize) -> &KeyInfo {
        &self.infos[position]
    }

    /// Position of `key`; unknown keys are an invariant violation.
    pub fn position(&self, key: &AccumulationKey) -> Result<usize> {
        self.index.get(key).copied().ok_or_else(|| Error::UnknownKey(format!("{key:?}")))
    }
}

/// One (N, β) entry of the N-subjettiness grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NsubAxis {
    /// Number of axes
    pub n: usize,
    /// Angular exponent
    pub beta: f64,
}

/// Ordered N-subjettiness (N, β) combinations.
#[derive(Debug, Clone, PartialEq)]
pub struct NsubjettinessGrid {
    axes: Vec<NsubAxis>,
}

impl NsubjettinessGrid {
    /// N = 1..K−2 with β ∈ {0.5, 1, 2}, then N = K−1 with β ∈ {1, 2}.
    pub fn from_k(k: usize) -> Self {
        let mut axes = Vec::new();
        for n in 1..k.saturating_sub(1) {
            for beta in [0.5, 1.0, 2.0] {
                axes.push(NsubAxis { n, beta });
            }
        }
        if k >= 2 {
            for beta in [1.0, 2.0] {
                axes.push(NsubAxis { n: k - 1, beta });
            }
        }
        Self { axes }
    }

    /// Grid entries in order
    pub fn axes(&self) -> &[NsubAxis] {
        &self.axes
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Whether the grid is empty
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Largest N in the grid
    pub fn max_n(&self) -> usize {
        self.axes.iter().map(|a| a.n).max().unwrap_or(0)
    }

    /// N column of the grid
    pub fn n_list(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.n).collect()
    }

    /// β column of the grid
    pub fn beta_list(&self) -> Vec<f64> {
        self.axes.iter().map(|a| a.beta).collect()
    }
}

/// Scalar QA quantities recorded per jet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QaObservable {
    /// pT(combined) − pT(hard)
    DeltaPt,
    /// Fraction of the hard jet pT found in the combined jet
    MatchedPt,
    /// ΔR between the matched jets
    MatchedDeltaR,
    /// Jet pT
    JetPt,
    /// Angularity λ(β=1, κ=1)
    JetAngularity,
    /// Jet mass
    JetMass,
    /// Soft-drop groomed radius
    JetThetaG,
    /// Leading R=0.1 subjet momentum fraction
    JetSubjetZ,
    /// Leading constituent momentum fraction
    HadronZ,
    /// Constituent count
    Multiplicity0000,
    /// Constituents above 0.15 GeV
    Multiplicity0150,
    /// Constituents above 0.5 GeV
    Multiplicity0500,
    /// Constituents above 1 GeV
    Multiplicity1000,
}

impl QaObservable {
    /// All observables in column order
    pub const ALL: [QaObservable; 13] = [
        QaObservable::DeltaPt,
        QaObservable::MatchedPt,
        QaObservable::MatchedDeltaR,
        QaObservable::JetPt,
        QaObservable::JetAngularity,
        QaObservable::JetMass,
        QaObservable::JetThetaG,
        QaObservable::JetSubjetZ,
        QaObservable::HadronZ,
        QaObservable::Multiplicity0000,
        QaObservable::Multiplicity0150,
        QaObservable::Multiplicity0500,
        QaObservable::Multiplicity1000,
    ];

    /// Column / artifact name
    pub fn as_str(&self) -> &'static str {
        match self {
            QaObservable::DeltaPt => "delta_pt",
            QaObservable::MatchedPt => "matched_pt",
            QaObservable::MatchedDeltaR => "matched_deltaR",
            QaObservable::JetPt => "jet_pt",
            QaObservable::JetAngularity => "jet_angularity",
            QaObservable::JetMass => "jet_mass",
            QaObservable::JetThetaG => "jet_theta_g",
            QaObservable::JetSubjetZ => "jet_subjet_z",
            QaObservable::HadronZ => "hadron_z",
            QaObservable::Multiplicity0000 => "multiplicity_0000",
            QaObservable::Multiplicity0150 => "multiplicity_0150",
            QaObservable::Multiplicity0500 => "multiplicity_0500",
            QaObservable::Multiplicity1000 => "multiplicity_1000",
        }
    }

    /// Only filled for accepted matches
    pub fn matched_only(&self) -> bool {
        matches!(
            self,
            QaObservable::DeltaPt | QaObservable::MatchedPt | QaObservable::MatchedDeltaR
        )
    }

    /// Position in [`QaObservable::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for QaObservable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
