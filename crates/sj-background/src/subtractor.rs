//! Event-wide constituent subtraction.
//!
//! The diffuse background density ρ is the median pT density of an (η, φ) grid.
//! A lattice of ghosts, each carrying ρ·A_ghost, absorbs momentum from nearby
//! particles: (particle, ghost) pairs closer than `max_distance` are visited in
//! order of pT^α·ΔR and the smaller of the two remaining pT values is removed
//! from both.

use std::borrow::Cow;
use std::f64::consts::PI;

use serde::Deserialize;
use statrs::statistics::{Data, Median};

use sj_core::{Error, Kinematics, Particle, Result, delta_phi};

/// Subtraction settings shared by every correction radius.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubtractorSettings {
    /// Maximum correction radii; 0 means "no subtraction"
    pub max_distance: Vec<f64>,
    /// Exponent of pT in the pair ordering
    #[serde(default)]
    pub alpha: f64,
    /// Cell size of the ρ-estimation grid
    pub bge_rho_grid_size: f64,
    /// Particles above this pT are never corrected
    pub max_pt_correct: f64,
    /// Area per ghost
    pub ghost_area: f64,
}

impl SubtractorSettings {
    /// Check the parameters of the ρ grid and ghost lattice.
    pub fn validate(&self) -> Result<()> {
        if self.max_distance.is_empty() {
            return Err(Error::Validation("constituent_subtractor.max_distance is empty".into()));
        }
        for (i, r) in self.max_distance.iter().enumerate() {
            if !(r.is_finite() && *r >= 0.0) {
                return Err(Error::Validation(format!("max_distance[{i}] must be >= 0, got {r}")));
            }
            if self.max_distance[..i].contains(r) {
                return Err(Error::Validation(format!("duplicate max_distance {r}")));
            }
        }
        if !(self.bge_rho_grid_size > 0.0) {
            return Err(Error::Validation("bge_rho_grid_size must be > 0".into()));
        }
        if !(self.ghost_area > 0.0) {
            return Err(Error::Validation("ghost_area must be > 0".into()));
        }
        if !(self.max_pt_correct > 0.0) {
            return Err(Error::Validation("max_pt_correct must be > 0".into()));
        }
        Ok(())
    }
}

/// Whether `r_max` is the "no subtraction" radius 0.
pub fn is_unsubtracted(r_max: f64) -> bool {
    r_max.abs() <= f64::EPSILON
}

/// One subtraction pass for a fixed correction radius.
#[derive(Debug, Clone)]
pub struct ConstituentSubtractor {
    max_distance: f64,
    alpha: f64,
    grid_size: f64,
    max_pt_correct: f64,
    ghost_area: f64,
    eta_max: f64,
}

#[derive(Debug, Clone, Copy)]
struct GhostLattice {
    n_eta: usize,
    n_phi: usize,
    d_eta: f64,
    d_phi: f64,
    eta_max: f64,
}

impl GhostLattice {
    fn new(eta_max: f64, ghost_area: f64) -> Self {
        let spacing = ghost_area.sqrt();
        let n_eta = ((2.0 * eta_max / spacing).ceil() as usize).max(1);
        let n_phi = ((2.0 * PI / spacing).ceil() as usize).max(1);
        Self { n_eta, n_phi, d_eta: 2.0 * eta_max / n_eta as f64, d_phi: 2.0 * PI / n_phi as f64, eta_max }
    }

    fn area(&self) -> f64 {
        self.d_eta * self.d_phi
    }

    fn len(&self) -> usize {
        self.n_eta * self.n_phi
    }

    fn center(&self, index: usize) -> (f64, f64) {
        let (ie, ip) = (index / self.n_phi, index % self.n_phi);
        (-self.eta_max + (ie as f64 + 0.5) * self.d_eta, (ip as f64 + 0.5) * self.d_phi)
    }

    /// Ghost indices within `radius` of (eta, phi).
    fn neighbours(&self, eta: f64, phi: f64, radius: f64) -> Vec<(usize, f64)> {
        let lo = (((eta - radius + self.eta_max) / self.d_eta).floor().max(0.0)) as usize;
        let hi = (((eta + radius + self.eta_max) / self.d_eta).floor() as isize)
            .clamp(-1, self.n_eta as isize - 1);
        if hi < 0 {
            return Vec::new();
        }
        let hi = hi as usize;
        let half = (radius / self.d_phi).ceil() as isize + 1;
        let cols: Vec<usize> = if 2 * half + 1 >= self.n_phi as isize {
            (0..self.n_phi).collect()
        } else {
            let center = (phi / self.d_phi).floor() as isize;
            (center - half..=center + half)
                .map(|c| c.rem_euclid(self.n_phi as isize) as usize)
                .collect()
        };
        let mut out = Vec::new();
        for ie in lo..=hi.min(self.n_eta - 1) {
            for &ip in &cols {
                let index = ie * self.n_phi + ip;
                let (ge, gp) = self.center(index);
                let dy = eta - ge;
                let dphi = delta_phi(phi, gp);
                let dr = (dy * dy + dphi * dphi).sqrt();
                if dr < radius {
                    out.push((index, dr));
                }
            }
        }
        out
    }
}

impl ConstituentSubtractor {
    /// Pass with correction radius `max_distance` over |η| < `eta_max`.
    pub fn new(max_distance: f64, settings: &SubtractorSettings, eta_max: f64) -> Self {
        Self {
            max_distance,
            alpha: settings.alpha,
            grid_size: settings.bge_rho_grid_size,
            max_pt_correct: settings.max_pt_correct,
            ghost_area: settings.ghost_area,
            eta_max,
        }
    }

    /// Correction radius
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Median pT density over an (η, φ) grid covering the acceptance.
    pub fn estimate_rho(&self, particles: &[Particle]) -> f64 {
        let n_eta = ((2.0 * self.eta_max / self.grid_size).round() as usize).max(1);
        let n_phi = ((2.0 * PI / self.grid_size).round() as usize).max(1);
        let d_eta = 2.0 * self.eta_max / n_eta as f64;
        let d_phi = 2.0 * PI / n_phi as f64;
        let mut cells = vec![0.0_f64; n_eta * n_phi];
        for p in particles {
            let eta = p.eta();
            if eta.abs() >= self.eta_max {
                continue;
            }
            let ie = (((eta + self.eta_max) / d_eta) as usize).min(n_eta - 1);
            let ip = ((p.phi() / d_phi) as usize).min(n_phi - 1);
            cells[ie * n_phi + ip] += p.pt();
        }
        let area = d_eta * d_phi;
        let densities: Vec<f64> = cells.into_iter().map(|pt| pt / area).collect();
        Data::new(densities).median()
    }

    /// Subtracted copy of `particles`; provenance tags and order are preserved,
    /// fully subtracted particles are dropped.
    pub fn subtract(&self, particles: &[Particle]) -> Vec<Particle> {
        let rho = self.estimate_rho(particles);
        if !(rho > 0.0) || self.max_distance <= 0.0 {
            return particles.to_vec();
        }
        let lattice = GhostLattice::new(self.eta_max, self.ghost_area);
        let mut ghost_pt = vec![rho * lattice.area(); lattice.len()];

        let mut remaining: Vec<f64> = particles.iter().map(|p| p.pt()).collect();
        let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
        for (i, p) in particles.iter().enumerate() {
            if !self.is_correctable(p) {
                continue;
            }
            let weight = if self.alpha == 0.0 { 1.0 } else { remaining[i].powf(self.alpha) };
            for (g, dr) in lattice.neighbours(p.rap(), p.phi(), self.max_distance) {
                pairs.push((weight * dr, i, g));
            }
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, i, g) in pairs {
            let (pt, gpt) = (remaining[i], ghost_pt[g]);
            if pt <= 0.0 || gpt <= 0.0 {
                continue;
            }
            if pt >= gpt {
                remaining[i] = pt - gpt;
                ghost_pt[g] = 0.0;
            } else {
                ghost_pt[g] = gpt - pt;
                remaining[i] = 0.0;
            }
        }

        let mut out = Vec::with_capacity(particles.len());
        for (p, &pt_new) in particles.iter().zip(&remaining) {
            if !self.is_correctable(p) {
                out.push(*p);
                continue;
            }
            let pt_old = p.pt();
            if pt_new > 0.0 && pt_old > 0.0 {
                out.push(p.with_momentum(p.momentum.scaled(pt_new / pt_old)));
            }
        }
        out
    }

    fn is_correctable(&self, p: &Particle) -> bool {
        p.pt() <= self.max_pt_correct && p.eta().abs() < self.eta_max
    }
}

/// Output of one configured correction radius.
#[derive(Debug, Clone)]
pub struct SubtractedSet<'a> {
    /// Correction radius (0 = unsubtracted)
    pub r_max: f64,
    /// Particles after the pass
    pub particles: Cow<'a, [Particle]>,
}

/// One independent pass per configured correction radius.
#[derive(Debug, Clone)]
pub struct SubtractorBank {
    passes: Vec<(f64, Option<ConstituentSubtractor>)>,
}

impl SubtractorBank {
    /// Build from validated settings.
    pub fn new(settings: &SubtractorSettings, eta_max: f64) -> Result<Self> {
        settings.validate()?;
        let passes = settings
            .max_distance
            .iter()
            .map(|&r| {
                let pass =
                    (!is_unsubtracted(r)).then(|| ConstituentSubtractor::new(r, settings, eta_max));
                (r, pass)
            })
            .collect();
        Ok(Self { passes })
    }

    /// Apply every pass to the same input. Radius 0 borrows the input untouched.
    pub fn apply<'a>(&self, particles: &'a [Particle]) -> Vec<SubtractedSet<'a>> {
        self.passes
            .iter()
            .map(|(r_max, pass)| {
                let particles = match pass {
                    None => Cow::Borrowed(particles),
                    Some(cs) => {
                        let out = cs.subtract(particles);
                        tracing::trace!(r_max, before = particles.len(), after = out.len(), "subtracted");
                        Cow::Owned(out)
                    }
                };
                SubtractedSet { r_max: *r_max, particles }
            })
            .collect()
    }
}
