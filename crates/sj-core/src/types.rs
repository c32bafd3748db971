//! Common data types for subjet

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::traits::Kinematics;

/// Four-momentum (px, py, pz, E) in GeV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FourMomentum {
    /// x component
    pub px: f64,
    /// y component
    pub py: f64,
    /// z component
    pub pz: f64,
    /// Energy
    pub e: f64,
}

impl FourMomentum {
    /// Create from Cartesian components
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Create from transverse momentum, pseudorapidity, azimuth and mass
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let e = (px * px + py * py + pz * pz + m * m).sqrt();
        Self { px, py, pz, e }
    }

    /// Same direction, components scaled by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self { px: self.px * factor, py: self.py * factor, pz: self.pz * factor, e: self.e * factor }
    }

    /// All components finite
    pub fn is_finite(&self) -> bool {
        self.px.is_finite() && self.py.is_finite() && self.pz.is_finite() && self.e.is_finite()
    }
}

impl Add for FourMomentum {
    type Output = FourMomentum;

    fn add(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: FourMomentum) {
        *self = *self + rhs;
    }
}

impl Kinematics for FourMomentum {
    fn px(&self) -> f64 {
        self.px
    }
    fn py(&self) -> f64 {
        self.py
    }
    fn pz(&self) -> f64 {
        self.pz
    }
    fn e(&self) -> f64 {
        self.e
    }
}

/// Where a particle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Hard-process particle with its index in the hard collection
    Hard(usize),
    /// Background particle with its index in the background collection
    Background(usize),
}

/// A final-state particle: momentum plus a signed provenance tag.
///
/// `user_index >= 0` marks hard-process particles, `user_index < 0` background
/// particles (`-1` is the first background particle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Four-momentum
    pub momentum: FourMomentum,
    /// Signed provenance tag
    pub user_index: i64,
}

impl Particle {
    /// Hard-process particle with index `index`
    pub fn hard(momentum: FourMomentum, index: usize) -> Self {
        Self { momentum, user_index: index as i64 }
    }

    /// Background particle with index `index` (stored as `-(index + 1)`)
    pub fn background(momentum: FourMomentum, index: usize) -> Self {
        Self { momentum, user_index: -(index as i64) - 1 }
    }

    /// Decoded provenance tag
    pub fn provenance(&self) -> Provenance {
        if self.user_index >= 0 {
            Provenance::Hard(self.user_index as usize)
        } else {
            Provenance::Background((-self.user_index - 1) as usize)
        }
    }

    /// Whether the particle comes from the hard process
    pub fn is_hard(&self) -> bool {
        self.user_index >= 0
    }

    /// Copy with the momentum replaced, provenance kept
    pub fn with_momentum(&self, momentum: FourMomentum) -> Self {
        Self { momentum, user_index: self.user_index }
    }
}

impl Kinematics for Particle {
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

/// Particle collections of one event as delivered by an event source.
///
/// A `None` collection is absent for this event (as opposed to present but empty).
#[derive(Debug, Clone, Default)]
pub struct RawEvent {
    /// Run number
    pub run_number: i64,
    /// Event id within the run
    pub ev_id: i64,
    /// Hard-process (truth) particles
    pub hard: Option<Vec<Particle>>,
    /// Background particles from an external store
    pub background: Option<Vec<Particle>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_provenance_roundtrip() {
        let p = FourMomentum::from_pt_eta_phi_m(1.0, 0.0, 0.0, 0.0);
        assert_eq!(Particle::hard(p, 3).provenance(), Provenance::Hard(3));
        assert_eq!(Particle::background(p, 0).user_index, -1);
        assert_eq!(Particle::background(p, 4).provenance(), Provenance::Background(4));
        assert!(!Particle::background(p, 0).is_hard());
    }

    #[test]
    fn test_sum_mass() {
        // Two back-to-back 10 GeV massless particles: m = 20 GeV.
        let a = FourMomentum::new(10.0, 0.0, 0.0, 10.0);
        let b = FourMomentum::new(-10.0, 0.0, 0.0, 10.0);
        let s = a + b;
        assert_relative_eq!(s.m(), 20.0, epsilon = 1e-12);
        assert_relative_eq!(s.pt(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_keeps_direction() {
        let p = FourMomentum::from_pt_eta_phi_m(4.0, 0.5, 2.0, 0.0);
        let q = p.scaled(0.25);
        assert_relative_eq!(q.pt(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.eta(), 0.5, epsilon = 1e-10);
        assert_relative_eq!(q.phi(), 2.0, epsilon = 1e-12);
    }
}
