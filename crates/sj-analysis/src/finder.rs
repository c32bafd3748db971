//! Jet finding with the acceptance windows of the hard and combined sets.

use sj_cluster::{Jet, JetDefinition, JetSelector, cluster};
use sj_core::Particle;

use crate::config::PtBin;

/// Fraction of the bin minimum used as the pT threshold for combined jets.
///
/// Background fluctuations shift combined jets in pT; matching recovers the
/// right ones, so the combined threshold is relaxed.
pub const COMBINED_PT_MIN_FRACTION: f64 = 0.2;

/// Hard-set acceptance: pT in the bin, |η| ≤ η_max − R.
pub fn hard_selector(bin: &PtBin, radius: f64, eta_max: f64) -> JetSelector {
    JetSelector::pt_min(bin.min).with_pt_max(bin.max).with_abs_eta_max(eta_max - radius)
}

/// Combined-set acceptance: pT ≥ bin.min · 0.2, |η| ≤ η_max − R.
pub fn combined_selector(bin: &PtBin, radius: f64, eta_max: f64) -> JetSelector {
    JetSelector::pt_min(bin.min * COMBINED_PT_MIN_FRACTION).with_abs_eta_max(eta_max - radius)
}

/// Anti-kt jet finding. Stateless; jets are re-found for every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct JetFinder;

impl JetFinder {
    /// All anti-kt jets of radius `radius`, sorted by descending pT, then
    /// filtered by `selector`.
    pub fn find(&self, particles: &[Particle], radius: f64, selector: &JetSelector) -> Vec<Jet> {
        selector.select(cluster(particles, JetDefinition::anti_kt(radius)))
    }
}
