//! Primary Lund declustering and soft-drop grooming.

use sj_core::{FourMomentum, Kinematics};

use crate::definition::JetDefinition;
use crate::jet::Jet;
use crate::sequence::ClusterSequence;

/// One 1 → 2 splitting along the harder branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LundSplitting {
    /// Harder branch
    pub harder: FourMomentum,
    /// Softer branch
    pub softer: FourMomentum,
    /// Opening angle ΔR between the branches
    pub delta: f64,
    /// Momentum fraction of the softer branch
    pub z: f64,
}

/// Reclusters a jet's constituents into one tree and walks it.
#[derive(Debug, Clone)]
pub struct LundDeclusterer {
    sequence: ClusterSequence,
    root: Option<usize>,
}

impl LundDeclusterer {
    /// Recluster the constituents of `jet` with `definition`.
    ///
    /// Declustering starts from the hardest resulting jet; constituents the
    /// definition keeps apart from it take no part in the tree.
    pub fn new(jet: &Jet, definition: JetDefinition) -> Self {
        let sequence = ClusterSequence::new(&jet.constituents, definition);
        let root = sequence
            .inclusive_jet_indices()
            .into_iter()
            .max_by(|&a, &b| sequence.momentum(a).pt2().total_cmp(&sequence.momentum(b).pt2()));
        Self { sequence, root }
    }

    /// Splittings met when following the harder branch from the root.
    pub fn primary_splittings(&self) -> Vec<LundSplitting> {
        let mut out = Vec::new();
        let mut current = self.root;
        while let Some(j) = current {
            let Some((a, b)) = self.sequence.parents(j) else { break };
            let (pa, pb) = (self.sequence.momentum(a), self.sequence.momentum(b));
            let (hard_idx, harder, softer) = if pa.pt2() >= pb.pt2() { (a, pa, pb) } else { (b, pb, pa) };
            let delta = harder.delta_r(&softer);
            let pt_sum = harder.pt() + softer.pt();
            let z = if pt_sum > 0.0 { softer.pt() / pt_sum } else { 0.0 };
            out.push(LundSplitting { harder, softer, delta, z });
            current = Some(hard_idx);
        }
        out
    }

    /// First primary splitting with z > z_cut (Δ / R0)^β.
    ///
    /// `None` when no splitting passes (the jet is not tagged).
    pub fn soft_drop(&self, beta: f64, z_cut: f64, r0: f64) -> Option<LundSplitting> {
        self.primary_splittings()
            .into_iter()
            .find(|s| s.z > z_cut * (s.delta / r0).powf(beta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::JetAlgorithm;
    use approx::assert_relative_eq;
    use sj_core::Particle;

    fn ca(radius: f64) -> JetDefinition {
        JetDefinition::new(JetAlgorithm::CambridgeAachen, radius)
    }

    fn p(pt: f64, eta: f64, phi: f64, i: usize) -> Particle {
        Particle::hard(FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0), i)
    }

    #[test]
    fn test_single_constituent_not_tagged() {
        let jet = Jet::from_constituents(vec![p(50.0, 0.0, 1.0, 0)]);
        let d = LundDeclusterer::new(&jet, ca(0.4));
        assert!(d.primary_splittings().is_empty());
        assert!(d.soft_drop(0.0, 0.2, 0.4).is_none());
    }

    #[test]
    fn test_soft_drop_grooms_soft_wide_branch() {
        // Wide soft emission (z ≈ 0.02) is groomed; the two-prong core (z ≈ 0.4) is tagged.
        let jet = Jet::from_constituents(vec![
            p(30.0, 0.0, 1.0, 0),
            p(20.0, 0.0, 1.1, 1),
            p(1.0, 0.0, 1.35, 2),
        ]);
        let d = LundDeclusterer::new(&jet, ca(0.4));
        let splittings = d.primary_splittings();
        assert_eq!(splittings.len(), 2);
        assert!(splittings[0].z < 0.05);
        let sd = d.soft_drop(0.0, 0.2, 0.4).unwrap();
        assert_relative_eq!(sd.delta, 0.1, epsilon = 1e-6);
        assert_relative_eq!(sd.z, 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_branch_outside_radius_is_not_declustered() {
        // The 40 GeV group sits 0.9 away: C/A at R = 0.4 leaves it out of the tree.
        let jet = Jet::from_constituents(vec![
            p(50.0, 0.0, 0.0, 0),
            p(50.0, 0.0, 0.1, 1),
            p(40.0, 0.0, 0.9, 2),
        ]);
        let narrow = LundDeclusterer::new(&jet, ca(0.4)).primary_splittings();
        assert_eq!(narrow.len(), 1);
        assert_relative_eq!(narrow[0].delta, 0.1, epsilon = 1e-6);

        let wide = LundDeclusterer::new(&jet, JetDefinition::full_event(JetAlgorithm::CambridgeAachen))
            .primary_splittings();
        assert_eq!(wide.len(), 2);
        assert!(wide[0].delta > 0.8);
    }
}
