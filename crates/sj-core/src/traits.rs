//! Core traits for subjet
//!
//! `Kinematics` gives every four-vector-like type (particles, jets, subjets) the
//! same derived quantities; `EventSource` is the seam between the event loop and
//! whatever store the particles come from.

use std::f64::consts::PI;

use crate::Result;
use crate::types::RawEvent;

/// Rapidity assigned to massless objects travelling along the beam axis.
pub const MAX_RAPIDITY: f64 = 1e5;

/// Derived kinematics from a (px, py, pz, E) four-vector.
pub trait Kinematics {
    /// x component of the momentum
    fn px(&self) -> f64;
    /// y component of the momentum
    fn py(&self) -> f64;
    /// z component of the momentum
    fn pz(&self) -> f64;
    /// Energy
    fn e(&self) -> f64;

    /// Squared transverse momentum
    fn pt2(&self) -> f64 {
        self.px() * self.px() + self.py() * self.py()
    }

    /// Transverse momentum
    fn pt(&self) -> f64 {
        self.pt2().sqrt()
    }

    /// Squared invariant mass (may be slightly negative from rounding)
    fn m2(&self) -> f64 {
        let p2 = self.pt2() + self.pz() * self.pz();
        (self.e() + p2.sqrt()) * (self.e() - p2.sqrt())
    }

    /// Invariant mass; negative when m² < 0.
    fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 { -(-m2).sqrt() } else { m2.sqrt() }
    }

    /// Azimuth in [0, 2π)
    fn phi(&self) -> f64 {
        if self.pt2() == 0.0 {
            return 0.0;
        }
        let mut phi = self.py().atan2(self.px());
        if phi < 0.0 {
            phi += 2.0 * PI;
        }
        if phi >= 2.0 * PI {
            phi -= 2.0 * PI;
        }
        phi
    }

    /// Rapidity y = ½ ln((E + pz) / (E − pz))
    fn rap(&self) -> f64 {
        let pt2 = self.pt2();
        let pz = self.pz();
        let e = self.e();
        if e == pz.abs() && pt2 == 0.0 {
            let r = MAX_RAPIDITY + pz.abs();
            return if pz >= 0.0 { r } else { -r };
        }
        let effective_m2 = self.m2().max(0.0);
        let e_plus_pz = e + pz.abs();
        let rap = 0.5 * ((pt2 + effective_m2) / (e_plus_pz * e_plus_pz)).ln();
        if pz > 0.0 { -rap } else { rap }
    }

    /// Pseudorapidity η = asinh(pz / pT)
    fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            let r = MAX_RAPIDITY + self.pz().abs();
            return if self.pz() >= 0.0 { r } else { -r };
        }
        (self.pz() / pt).asinh()
    }

    /// Angular distance in the rapidity–azimuth plane
    fn delta_r<K: Kinematics + ?Sized>(&self, other: &K) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Squared rapidity–azimuth distance
    fn squared_distance<K: Kinematics + ?Sized>(&self, other: &K) -> f64 {
        let dy = self.rap() - other.rap();
        let dphi = delta_phi(self.phi(), other.phi());
        dy * dy + dphi * dphi
    }
}

/// |φ1 − φ2| folded into [0, π].
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut d = (phi1 - phi2).abs();
    if d > PI {
        d = 2.0 * PI - d;
    }
    d
}

/// Supplier of per-event particle collections.
///
/// Implementations return `Ok(None)` once exhausted. A returned event may still
/// be malformed; the event loop decides whether to skip it.
pub trait EventSource {
    /// Next event, or `None` at end of input.
    fn next_event(&mut self) -> Result<Option<RawEvent>>;

    /// Number of events if known up front.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FourMomentum;
    use approx::assert_relative_eq;

    #[test]
    fn test_delta_phi_wraps() {
        assert_relative_eq!(delta_phi(0.1, 2.0 * PI - 0.1), 0.2, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(1.0, 1.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_massless_rapidity_equals_eta() {
        let p = FourMomentum::from_pt_eta_phi_m(10.0, 0.7, 1.2, 0.0);
        assert_relative_eq!(p.rap(), 0.7, epsilon = 1e-10);
        assert_relative_eq!(p.eta(), 0.7, epsilon = 1e-10);
        assert_relative_eq!(p.phi(), 1.2, epsilon = 1e-12);
        assert_relative_eq!(p.pt(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_delta_r_across_phi_boundary() {
        let a = FourMomentum::from_pt_eta_phi_m(5.0, 0.0, 0.05, 0.0);
        let b = FourMomentum::from_pt_eta_phi_m(5.0, 0.3, 2.0 * PI - 0.35, 0.0);
        assert_relative_eq!(a.delta_r(&b), 0.5, epsilon = 1e-10);
    }

    struct EmptySource;

    impl EventSource for EmptySource {
        fn next_event(&mut self) -> Result<Option<RawEvent>> {
            Ok(None)
        }
    }

    #[test]
    fn test_event_source_default_hint() {
        let mut s = EmptySource;
        assert!(s.len_hint().is_none());
        assert!(s.next_event().unwrap().is_none());
    }
}
