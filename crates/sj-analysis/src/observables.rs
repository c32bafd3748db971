//! Jet substructure observables.
//!
//! Every ratio with a jet pT in the denominator divides by
//! `max(pT, PT_FLOOR)`, so all values stay finite for degenerate jets.

use serde::{Deserialize, Serialize};

use sj_cluster::{
    ClusterSequence, Jet, JetAlgorithm, JetDefinition, LundDeclusterer, cluster,
};
use sj_core::{FourMomentum, Kinematics};

use crate::keys::{NsubjettinessGrid, QaObservable};

/// Smallest pT used as a denominator (GeV).
pub const PT_FLOOR: f64 = 1e-9;

/// Constituent pT thresholds of the multiplicity observables (GeV); 0 counts all.
pub const MULTIPLICITY_THRESHOLDS: [f64; 4] = [0.0, 0.15, 0.5, 1.0];

/// Default soft-drop angular exponent for θ_g
pub const SOFT_DROP_BETA: f64 = 0.0;
/// Default soft-drop z_cut for θ_g
pub const SOFT_DROP_Z_CUT: f64 = 0.2;
/// Constituents closer than this to the jet axis count as on it.
pub const ON_AXIS_DELTA_R: f64 = 1e-9;
/// Radius of the subjets behind `jet_subjet_z`
pub const SUBJET_RADIUS: f64 = 0.1;

/// Generalized angularity λ(β, κ) = Σ (pT_i / pT_jet)^κ (ΔR_i / R)^β.
///
/// Rounding in the summed axis is ignored: ΔR below [`ON_AXIS_DELTA_R`] is 0.
pub fn angularity(jet: &Jet, beta: f64, kappa: f64, radius: f64) -> f64 {
    let pt_jet = jet.pt().max(PT_FLOOR);
    jet.constituents
        .iter()
        .map(|p| {
            let dr = p.delta_r(jet);
            let dr = if dr < ON_AXIS_DELTA_R { 0.0 } else { dr };
            (p.pt() / pt_jet).powf(kappa) * (dr / radius).powf(beta)
        })
        .sum()
}

/// Unnormalized N-subjettiness against exclusive-kt axes.
///
/// Axes for every requested N come from one kt reclustering of the constituents.
#[derive(Debug, Clone)]
pub struct NsubjettinessCalculator<'a> {
    jet: &'a Jet,
    sequence: ClusterSequence,
}

impl<'a> NsubjettinessCalculator<'a> {
    /// Recluster the constituents of `jet` with kt.
    pub fn new(jet: &'a Jet) -> Self {
        let sequence =
            ClusterSequence::new(&jet.constituents, JetDefinition::full_event(JetAlgorithm::Kt));
        Self { jet, sequence }
    }

    /// Exclusive-kt axes for `n` subjets
    pub fn axes(&self, n: usize) -> Vec<FourMomentum> {
        self.sequence.exclusive_jets(n)
    }

    /// τ_N^β = Σ pT_i · min_k ΔR_ik^β; 0 when the jet has at most N constituents.
    pub fn tau(&self, n: usize, beta: f64) -> f64 {
        if self.jet.n_constituents() <= n {
            return 0.0;
        }
        let axes = self.axes(n);
        self.jet
            .constituents
            .iter()
            .map(|p| {
                let d_min = axes.iter().map(|a| p.delta_r(a)).fold(f64::INFINITY, f64::min);
                p.pt() * d_min.powf(beta)
            })
            .sum()
    }
}

/// Soft-drop grooming parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftDrop {
    /// z_cut
    pub z_cut: f64,
    /// Angular exponent β
    pub beta: f64,
}

impl Default for SoftDrop {
    fn default() -> Self {
        Self { z_cut: SOFT_DROP_Z_CUT, beta: SOFT_DROP_BETA }
    }
}

/// Groomed radius θ_g = Δ / R of the first splitting passing soft drop; 0 when
/// none passes.
///
/// The constituents are reclustered with Cambridge/Aachen at the jet radius.
pub fn theta_g(jet: &Jet, radius: f64, grooming: SoftDrop) -> f64 {
    let definition = JetDefinition::new(JetAlgorithm::CambridgeAachen, radius);
    LundDeclusterer::new(jet, definition)
        .soft_drop(grooming.beta, grooming.z_cut, radius)
        .map_or(0.0, |s| s.delta / radius)
}

/// pT fraction of the leading anti-kt R = 0.1 subjet.
pub fn subjet_z(jet: &Jet) -> f64 {
    let subjets = cluster(&jet.constituents, JetDefinition::anti_kt(SUBJET_RADIUS));
    subjets.first().map_or(0.0, |s| s.pt() / jet.pt().max(PT_FLOOR))
}

/// pT fraction of the leading constituent.
pub fn hadron_z(jet: &Jet) -> f64 {
    jet.leading_constituent().map_or(0.0, |p| p.pt() / jet.pt().max(PT_FLOOR))
}

/// Constituents with pT strictly above `threshold`; a zero threshold counts all.
pub fn multiplicity(jet: &Jet, threshold: f64) -> usize {
    if threshold <= 0.0 {
        return jet.n_constituents();
    }
    jet.constituents.iter().filter(|p| p.pt() > threshold).count()
}

/// Constituent rows `(pT, y, φ, 0)` in clustering order.
pub fn constituent_four_vectors(jet: &Jet) -> Vec<[f64; 4]> {
    jet.constituents.iter().map(|p| [p.pt(), p.rap(), p.phi(), 0.0]).collect()
}

/// Everything recorded for one jet instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservableBundle {
    /// Jet pT
    pub pt: f64,
    /// λ(β=1, κ=1)
    pub angularity: f64,
    /// Jet mass
    pub mass: f64,
    /// Soft-drop θ_g
    pub theta_g: f64,
    /// Leading subjet z
    pub subjet_z: f64,
    /// Leading hadron z
    pub hadron_z: f64,
    /// Multiplicities at [`MULTIPLICITY_THRESHOLDS`]
    pub multiplicity: [usize; 4],
    /// τ_N^β / pT for every grid entry, in grid order
    pub nsubjettiness: Vec<f64>,
    /// Constituent `(pT, y, φ, 0)` rows
    pub four_vectors: Vec<[f64; 4]>,
}

impl ObservableBundle {
    /// Per-jet QA value; `None` for the match-only observables.
    pub fn qa_value(&self, observable: QaObservable) -> Option<f64> {
        let value = match observable {
            QaObservable::DeltaPt | QaObservable::MatchedPt | QaObservable::MatchedDeltaR => {
                return None;
            }
            QaObservable::JetPt => self.pt,
            QaObservable::JetAngularity => self.angularity,
            QaObservable::JetMass => self.mass,
            QaObservable::JetThetaG => self.theta_g,
            QaObservable::JetSubjetZ => self.subjet_z,
            QaObservable::HadronZ => self.hadron_z,
            QaObservable::Multiplicity0000 => self.multiplicity[0] as f64,
            QaObservable::Multiplicity0150 => self.multiplicity[1] as f64,
            QaObservable::Multiplicity0500 => self.multiplicity[2] as f64,
            QaObservable::Multiplicity1000 => self.multiplicity[3] as f64,
        };
        Some(value)
    }
}

/// Computes [`ObservableBundle`]s for a fixed N-subjettiness grid.
#[derive(Debug, Clone)]
pub struct ObservableComputer {
    grid: NsubjettinessGrid,
    grooming: SoftDrop,
}

impl ObservableComputer {
    /// Computer for `grid`, grooming θ_g with `grooming`
    pub fn new(grid: NsubjettinessGrid, grooming: SoftDrop) -> Self {
        Self { grid, grooming }
    }

    /// The N-subjettiness grid
    pub fn grid(&self) -> &NsubjettinessGrid {
        &self.grid
    }

    /// All observables of `jet` found with radius `radius`.
    pub fn compute(&self, jet: &Jet, radius: f64) -> ObservableBundle {
        let pt = jet.pt();
        let calculator = NsubjettinessCalculator::new(jet);
        let denominator = pt.max(PT_FLOOR);
        let nsubjettiness =
            self.grid.axes().iter().map(|a| calculator.tau(a.n, a.beta) / denominator).collect();
        ObservableBundle {
            pt,
            angularity: angularity(jet, 1.0, 1.0, radius),
            mass: jet.m(),
            theta_g: theta_g(jet, radius, self.grooming),
            subjet_z: subjet_z(jet),
            hadron_z: hadron_z(jet),
            multiplicity: MULTIPLICITY_THRESHOLDS.map(|t| multiplicity(jet, t)),
            nsubjettiness,
            four_vectors: constituent_four_vectors(jet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sj_core::Particle;

    fn particle(pt: f64, eta: f64, phi: f64, i: usize) -> Particle {
        Particle::hard(FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0), i)
    }

    fn two_prong() -> Jet {
        Jet::from_constituents(vec![
            particle(30.0, 0.0, 1.0, 0),
            particle(20.0, 0.0, 1.2, 1),
            particle(0.3, 0.05, 1.05, 2),
            particle(0.1, -0.05, 1.1, 3),
        ])
    }

    #[test]
    fn test_single_constituent_on_axis() {
        let jet = Jet::from_constituents(vec![particle(50.0, 0.1, 2.0, 0)]);
        let computer = ObservableComputer::new(NsubjettinessGrid::from_k(4), SoftDrop::default());
        let bundle = computer.compute(&jet, 0.4);
        assert_relative_eq!(bundle.pt, 50.0, epsilon = 1e-9);
        assert_relative_eq!(bundle.angularity, 0.0, epsilon = 1e-12);
        assert_eq!(bundle.multiplicity[0], 1);
        // N = 1, β = 1 is the second grid entry
        assert_eq!(computer.grid().axes()[1].n, 1);
        assert_eq!(bundle.nsubjettiness[1], 0.0);
        assert!(bundle.nsubjettiness.iter().all(|&t| t == 0.0));
        assert_eq!(bundle.theta_g, 0.0);
        assert_relative_eq!(bundle.hadron_z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(bundle.subjet_z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angularity_non_negative() {
        let jet = two_prong();
        let lambda = angularity(&jet, 1.0, 1.0, 0.4);
        assert!(lambda > 0.0);
        assert!(angularity(&jet, 2.0, 1.0, 0.4) >= 0.0);
    }

    #[test]
    fn test_multiplicity_ordering() {
        let jet = two_prong();
        let m = MULTIPLICITY_THRESHOLDS.map(|t| multiplicity(&jet, t));
        assert_eq!(m, [4, 3, 2, 2]);
        assert!(m.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_tau_decreases_with_n() {
        let jet = two_prong();
        let calc = NsubjettinessCalculator::new(&jet);
        let tau1 = calc.tau(1, 1.0);
        let tau2 = calc.tau(2, 1.0);
        assert!(tau1 > 0.0);
        assert!(tau2 < tau1);
        assert_eq!(calc.tau(4, 1.0), 0.0);
        assert_eq!(calc.axes(2).len(), 2);
    }

    #[test]
    fn test_theta_g_two_prong() {
        let jet = two_prong();
        let tg = theta_g(&jet, 0.4, SoftDrop::default());
        // the two hard prongs are 0.2 apart and share pT 30 : 20
        assert!(tg > 0.4 && tg < 0.6, "theta_g = {tg}");
    }

    #[test]
    fn test_theta_g_reclusters_at_jet_radius() {
        // The 40 GeV constituent is 0.9 from the core, outside R = 0.4: only the
        // 50 : 50 core splitting at Δ = 0.1 is groomed.
        let jet = Jet::from_constituents(vec![
            particle(50.0, 0.0, 0.0, 0),
            particle(50.0, 0.0, 0.1, 1),
            particle(40.0, 0.0, 0.9, 2),
        ]);
        let tg = theta_g(&jet, 0.4, SoftDrop::default());
        assert_relative_eq!(tg, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_theta_g_follows_grooming_settings() {
        let jet = two_prong();
        // z of the hard splitting is 0.4, so z_cut 0.45 grooms everything away
        assert_eq!(theta_g(&jet, 0.4, SoftDrop { z_cut: 0.45, beta: 0.0 }), 0.0);
        assert!(theta_g(&jet, 0.4, SoftDrop { z_cut: 0.1, beta: 1.0 }) > 0.0);
    }

    #[test]
    fn test_angularity_zero_for_collinear_constituents() {
        let jet = Jet::from_constituents(vec![
            particle(30.0, 0.2, 1.5, 0),
            particle(12.0, 0.2, 1.5, 1),
            particle(5.0, 0.2, 1.5, 2),
            particle(0.7, 0.2, 1.5, 3),
        ]);
        for beta in [0.5, 1.0, 1.5, 2.0, 3.0] {
            assert_eq!(angularity(&jet, beta, 1.0, 0.4), 0.0, "beta = {beta}");
        }
    }

    #[test]
    fn test_angularity_positive_once_displaced() {
        let jet = Jet::from_constituents(vec![
            particle(30.0, 0.2, 1.5, 0),
            particle(12.0, 0.2, 1.5, 1),
            particle(5.0, 0.2, 1.5, 2),
            particle(0.7, 0.25, 1.55, 3),
        ]);
        for beta in [0.5, 1.0, 1.5, 2.0, 3.0] {
            assert!(angularity(&jet, beta, 1.0, 0.4) > 0.0, "beta = {beta}");
        }
    }

    #[test]
    fn test_fractions_bounded() {
        let jet = two_prong();
        let hz = hadron_z(&jet);
        let sz = subjet_z(&jet);
        assert!(hz > 0.5 && hz <= 1.0);
        assert!(sz >= hz - 1e-12 && sz <= 1.0 + 1e-12);
    }

    #[test]
    fn test_empty_jet_is_finite() {
        let jet = Jet::from_constituents(vec![]);
        let computer = ObservableComputer::new(NsubjettinessGrid::from_k(3), SoftDrop::default());
        let bundle = computer.compute(&jet, 0.4);
        assert_eq!(bundle.hadron_z, 0.0);
        assert_eq!(bundle.subjet_z, 0.0);
        assert_eq!(bundle.multiplicity, [0; 4]);
        assert!(bundle.nsubjettiness.iter().all(|t| t.is_finite()));
        assert!(bundle.four_vectors.is_empty());
    }

    #[test]
    fn test_qa_values() {
        let bundle = ObservableComputer::new(NsubjettinessGrid::from_k(3), SoftDrop::default())
            .compute(&two_prong(), 0.4);
        assert_eq!(bundle.qa_value(QaObservable::DeltaPt), None);
        assert_eq!(bundle.qa_value(QaObservable::Multiplicity0150), Some(3.0));
        assert_eq!(bundle.qa_value(QaObservable::JetPt), Some(bundle.pt));
        let fv = &bundle.four_vectors;
        assert_eq!(fv.len(), 4);
        assert!(fv.iter().all(|row| row[3] == 0.0 && row[2] >= 0.0));
    }
}
