//! Random-cone estimate of background fluctuations.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sj_core::{Error, Kinematics, Particle, Result, delta_phi};

/// Throws one cone per event at a random position inside the acceptance.
///
/// δpT = pT(cone) − ρ·πR², with ρ the mean pT density of the background over
/// |η| < η_max.
#[derive(Debug, Clone)]
pub struct RandomCone {
    radius: f64,
    eta_max: f64,
    rng: StdRng,
}

impl RandomCone {
    /// Cone of `radius` kept fully inside |η| < `eta_max`.
    pub fn new(radius: f64, eta_max: f64, seed: u64) -> Result<Self> {
        if !(radius > 0.0) || !(eta_max > radius) {
            return Err(Error::Validation(format!(
                "random cone radius {radius} does not fit inside |eta| < {eta_max}"
            )));
        }
        Ok(Self { radius, eta_max, rng: StdRng::seed_from_u64(seed) })
    }

    /// δpT for one background event.
    pub fn delta_pt(&mut self, background: &[Particle]) -> f64 {
        let eta_cone = self.rng.random_range(-(self.eta_max - self.radius)..(self.eta_max - self.radius));
        let phi_cone = self.rng.random_range(0.0..2.0 * PI);
        self.delta_pt_at(background, eta_cone, phi_cone)
    }

    fn delta_pt_at(&self, background: &[Particle], eta_cone: f64, phi_cone: f64) -> f64 {
        let mut event_pt = 0.0;
        let mut cone_pt = 0.0;
        for p in background {
            let pt = p.pt();
            event_pt += pt;
            let deta = p.eta() - eta_cone;
            let dphi = delta_phi(p.phi(), phi_cone);
            if (deta * deta + dphi * dphi).sqrt() < self.radius {
                cone_pt += pt;
            }
        }
        let rho = event_pt / (2.0 * self.eta_max * 2.0 * PI);
        cone_pt - rho * PI * self.radius * self.radius
    }
}
