//! Analysis configuration: YAML/JSON input, validated into `Settings`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sj_background::{SubtractorSettings, ThermalSettings, is_unsubtracted};
use sj_core::{Error, Result};

use crate::keys::NsubjettinessGrid;
use crate::observables::{SOFT_DROP_BETA, SOFT_DROP_Z_CUT, SoftDrop};

/// Raw configuration as written by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Candidate values of K; the largest is used
    #[serde(rename = "K")]
    pub k: Vec<usize>,
    /// Jet radii
    #[serde(rename = "jetR")]
    pub jet_r: Vec<f64>,
    /// Jet pT bins as `[min, max]` pairs
    pub jet_pt_bins: Vec<[f64; 2]>,
    /// Global pseudorapidity cutoff
    pub eta_max: f64,
    /// Matching distance as a fraction of the jet radius
    pub jet_matching_distance: f64,
    /// Thermal background synthesis; absent = none
    #[serde(default)]
    pub thermal_model: Option<ThermalSettings>,
    /// Constituent subtraction
    pub constituent_subtractor: SubtractorSettings,
    /// Seed of the thermal stream (the random cone derives its own)
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Zero-padding length of constituent four-vector arrays
    #[serde(default = "default_n_max_constituents")]
    pub n_max_constituents: usize,
    /// Radius of the random cone used for δpT
    #[serde(default = "default_random_cone_radius")]
    pub random_cone_radius: f64,
    /// Stop after this many events
    #[serde(default)]
    pub max_events: Option<usize>,
    /// Path token → class label
    #[serde(default = "default_class_labels")]
    pub class_labels: BTreeMap<String, i64>,
    /// Soft-drop z_cut for θ_g
    #[serde(default = "default_sd_zcut")]
    pub sd_zcut: f64,
    /// Soft-drop β for θ_g
    #[serde(default = "default_sd_beta")]
    pub sd_beta: f64,
}

fn default_seed() -> u64 {
    42
}

fn default_n_max_constituents() -> usize {
    800
}

fn default_random_cone_radius() -> f64 {
    0.4
}

fn default_sd_zcut() -> f64 {
    SOFT_DROP_Z_CUT
}

fn default_sd_beta() -> f64 {
    SOFT_DROP_BETA
}

fn default_class_labels() -> BTreeMap<String, i64> {
    BTreeMap::from([("jewel_PbPb".to_string(), 1), ("jewel_pp".to_string(), 0)])
}

/// A jet pT interval, half-open: `min <= pT < max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PtBin {
    /// Lower edge (inclusive)
    pub min: f64,
    /// Upper edge (exclusive)
    pub max: f64,
}

impl PtBin {
    /// Whether `pt` lies in the bin.
    pub fn contains(&self, pt: f64) -> bool {
        pt >= self.min && pt < self.max
    }
}

/// Validated run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Largest configured K
    pub k: usize,
    /// Jet radii in configuration order
    pub jet_radii: Vec<f64>,
    /// pT bins in configuration order
    pub pt_bins: Vec<PtBin>,
    /// Global pseudorapidity cutoff
    pub eta_max: f64,
    /// Matching distance fraction
    pub matching_fraction: f64,
    /// Thermal synthesis, if enabled
    pub thermal: Option<ThermalSettings>,
    /// Constituent subtraction
    pub subtractor: SubtractorSettings,
    /// Base seed
    pub seed: u64,
    /// Zero-padding length
    pub n_max_constituents: usize,
    /// Random cone radius
    pub random_cone_radius: f64,
    /// Event limit
    pub max_events: Option<usize>,
    /// Path token → class label
    pub class_labels: BTreeMap<String, i64>,
    /// N-subjettiness (N, β) grid derived from `k`
    pub nsub_grid: NsubjettinessGrid,
    /// θ_g grooming
    pub grooming: SoftDrop,
}

impl Settings {
    /// Subtraction radii in configuration order
    pub fn subtraction_radii(&self) -> &[f64] {
        &self.subtractor.max_distance
    }
}

impl AnalysisConfig {
    /// Validate and derive run settings.
    pub fn into_settings(self) -> Result<Settings> {
        let k = self.k.iter().copied().max().ok_or_else(|| Error::Validation("K is empty".into()))?;
        if k < 2 {
            return Err(Error::Validation(format!("K must be >= 2, got {k}")));
        }
        if self.jet_r.is_empty() {
            return Err(Error::Validation("jetR is empty".into()));
        }
        for r in &self.jet_r {
            if !(r.is_finite() && *r > 0.0) {
                return Err(Error::Validation(format!("jet radius must be > 0, got {r}")));
            }
        }
        if self.jet_pt_bins.is_empty() {
            return Err(Error::Validation("jet_pt_bins is empty".into()));
        }
        let mut pt_bins = Vec::with_capacity(self.jet_pt_bins.len());
        for [min, max] in self.jet_pt_bins {
            if !(min >= 0.0 && min < max && max.is_finite()) {
                return Err(Error::Validation(format!("invalid jet pT bin [{min}, {max}]")));
            }
            pt_bins.push(PtBin { min, max });
        }
        if !(self.eta_max.is_finite() && self.eta_max > 0.0) {
            return Err(Error::Validation(format!("eta_max must be > 0, got {}", self.eta_max)));
        }
        if !(self.jet_matching_distance.is_finite() && self.jet_matching_distance > 0.0) {
            return Err(Error::Validation(format!(
                "jet_matching_distance must be > 0, got {}",
                self.jet_matching_distance
            )));
        }
        if let Some(thermal) = &self.thermal_model {
            if !(thermal.n_avg >= 0.0) || !(thermal.sigma_n >= 0.0) || !(thermal.beta > 0.0) {
                return Err(Error::Validation(format!("invalid thermal_model {thermal:?}")));
            }
        }
        self.constituent_subtractor.validate()?;
        if self.n_max_constituents == 0 {
            return Err(Error::Validation("n_max_constituents must be > 0".into()));
        }
        if !(self.random_cone_radius > 0.0 && self.random_cone_radius < self.eta_max) {
            return Err(Error::Validation(format!(
                "random_cone_radius must lie in (0, eta_max), got {}",
                self.random_cone_radius
            )));
        }
        if !(0.0..1.0).contains(&self.sd_zcut) {
            return Err(Error::Validation(format!("sd_zcut must lie in [0, 1), got {}", self.sd_zcut)));
        }
        if !(self.sd_beta.is_finite() && self.sd_beta >= 0.0) {
            return Err(Error::Validation(format!("sd_beta must be >= 0, got {}", self.sd_beta)));
        }
        if !self.constituent_subtractor.max_distance.iter().any(|&r| is_unsubtracted(r)) {
            tracing::warn!(
                radii = ?self.constituent_subtractor.max_distance,
                "no unsubtracted radius (0) configured, hard jets will not be recorded"
            );
        }

        Ok(Settings {
            k,
            jet_radii: self.jet_r,
            pt_bins,
            eta_max: self.eta_max,
            matching_fraction: self.jet_matching_distance,
            thermal: self.thermal_model,
            subtractor: self.constituent_subtractor,
            seed: self.seed,
            n_max_constituents: self.n_max_constituents,
            random_cone_radius: self.random_cone_radius,
            max_events: self.max_events,
            class_labels: self.class_labels,
            nsub_grid: NsubjettinessGrid::from_k(k),
            grooming: SoftDrop { z_cut: self.sd_zcut, beta: self.sd_beta },
        })
    }
}

/// Read a configuration file (JSON by extension, YAML otherwise).
pub fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

/// Read and validate in one step.
pub fn load_settings(path: &Path) -> Result<Settings> {
    read_config(path)?.into_settings()
}
