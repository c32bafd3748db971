//! Thermal (Boltzmann-like) background generator.
//!
//! Multiplicity ~ Normal(N_avg, σ_N), pT ~ Gamma(α, β), η uniform in
//! [−η_max, η_max], φ uniform in [0, 2π), massless.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma, Normal};
use serde::Deserialize;

use sj_core::{Error, FourMomentum, Particle, Result};

/// Thermal model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThermalSettings {
    /// Mean multiplicity
    #[serde(rename = "N_avg")]
    pub n_avg: f64,
    /// Multiplicity spread
    #[serde(rename = "sigma_N")]
    pub sigma_n: f64,
    /// Gamma scale (temperature-like), GeV
    pub beta: f64,
    /// Gamma shape
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    2.0
}

/// Stateful generator owning its own random stream.
#[derive(Debug, Clone)]
pub struct ThermalGenerator {
    eta_max: f64,
    multiplicity: Normal<f64>,
    pt: Gamma<f64>,
    rng: StdRng,
}

impl ThermalGenerator {
    /// Build a generator; invalid distribution parameters are a validation error.
    pub fn new(settings: &ThermalSettings, eta_max: f64, seed: u64) -> Result<Self> {
        if !(eta_max > 0.0) {
            return Err(Error::Validation(format!("thermal eta_max must be > 0, got {eta_max}")));
        }
        let multiplicity = Normal::new(settings.n_avg, settings.sigma_n)
            .map_err(|e| Error::Validation(format!("thermal multiplicity: {e}")))?;
        let pt = Gamma::new(settings.alpha, settings.beta)
            .map_err(|e| Error::Validation(format!("thermal pT spectrum: {e}")))?;
        Ok(Self { eta_max, multiplicity, pt, rng: StdRng::seed_from_u64(seed) })
    }

    /// Draw one background event. Particles carry background tags −1, −2, …
    pub fn generate(&mut self) -> Vec<Particle> {
        let n = self.multiplicity.sample(&mut self.rng).max(0.0) as usize;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let pt = self.pt.sample(&mut self.rng);
            let eta = self.rng.random_range(-self.eta_max..self.eta_max);
            let phi = self.rng.random_range(0.0..2.0 * PI);
            out.push(Particle::background(FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0), i));
        }
        out
    }
}
