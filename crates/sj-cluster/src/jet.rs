//! Jets: a four-momentum plus the particles it was built from.

use sj_core::{FourMomentum, Kinematics, Particle};

/// A clustered jet.
#[derive(Debug, Clone, PartialEq)]
pub struct Jet {
    /// E-scheme sum of the constituents
    pub momentum: FourMomentum,
    /// Constituents in clustering order
    pub constituents: Vec<Particle>,
}

impl Jet {
    /// Jet with a known momentum
    pub fn new(momentum: FourMomentum, constituents: Vec<Particle>) -> Self {
        Self { momentum, constituents }
    }

    /// Jet whose momentum is the sum of `constituents`
    pub fn from_constituents(constituents: Vec<Particle>) -> Self {
        let momentum = constituents.iter().fold(FourMomentum::default(), |acc, p| acc + p.momentum);
        Self { momentum, constituents }
    }

    /// Number of constituents
    pub fn n_constituents(&self) -> usize {
        self.constituents.len()
    }

    /// Highest-pT constituent
    pub fn leading_constituent(&self) -> Option<&Particle> {
        self.constituents.iter().max_by(|a, b| a.pt2().total_cmp(&b.pt2()))
    }
}

impl Kinematics for Jet {
    fn px(&self) -> f64 {
        self.momentum.px
    }
    fn py(&self) -> f64 {
        self.momentum.py
    }
    fn pz(&self) -> f64 {
        self.momentum.pz
    }
    fn e(&self) -> f64 {
        self.momentum.e
    }
}

/// Sort by descending pT (stable).
pub fn sort_by_pt<K: Kinematics>(items: &mut [K]) {
    items.sort_by(|a, b| b.pt2().total_cmp(&a.pt2()));
}
