//! Background mixing: validation of raw events and the combined particle set.

use sj_core::{Error, Particle, RawEvent, Result};

/// An event whose particle collections passed validation.
#[derive(Debug, Clone)]
pub struct ValidEvent {
    /// Run number
    pub run_number: i64,
    /// Event id
    pub ev_id: i64,
    /// Hard-process particles (possibly none, tags ≥ 0)
    pub hard: Vec<Particle>,
    /// External background particles (tags < 0), if the source provided any
    pub background: Option<Vec<Particle>>,
}

fn malformed(raw: &RawEvent, reason: impl Into<String>) -> Error {
    Error::MalformedEvent { run_number: raw.run_number, ev_id: raw.ev_id, reason: reason.into() }
}

fn check_collection(raw: &RawEvent, particles: &[Particle], hard: bool) -> Result<()> {
    let (what, other) = if hard { ("hard", "background") } else { ("background", "hard") };
    for (i, p) in particles.iter().enumerate() {
        if !p.momentum.is_finite() {
            return Err(malformed(raw, format!("{what} particle {i} has non-finite kinematics")));
        }
        if p.is_hard() != hard {
            return Err(malformed(raw, format!("{what} particle {i} carries a {other} tag")));
        }
    }
    Ok(())
}

/// Validate the collections of `raw`.
///
/// The hard collection must be present; an empty one is kept, so the event
/// still contributes background-only jets and a random cone. An external
/// background is only checked when no thermal synthesis replaces it.
pub fn validate_event(raw: RawEvent, thermal_enabled: bool) -> Result<ValidEvent> {
    let hard = match &raw.hard {
        None => return Err(malformed(&raw, "hard particle collection missing")),
        Some(h) => h,
    };
    check_collection(&raw, hard, true)?;
    if !thermal_enabled {
        if let Some(bkg) = &raw.background {
            check_collection(&raw, bkg, false)?;
        }
    }
    let RawEvent { run_number, ev_id, hard, background } = raw;
    let background = if thermal_enabled { None } else { background };
    Ok(ValidEvent { run_number, ev_id, hard: hard.unwrap_or_default(), background })
}

/// Hard particles followed by the background: the set before subtraction.
pub fn mix(hard: &[Particle], background: &[Particle]) -> Vec<Particle> {
    let mut combined = Vec::with_capacity(hard.len() + background.len());
    combined.extend_from_slice(hard);
    combined.extend_from_slice(background);
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use sj_core::FourMomentum;

    fn p(pt: f64) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(pt, 0.1, 1.0, 0.0)
    }

    fn raw(hard: Option<Vec<Particle>>, background: Option<Vec<Particle>>) -> RawEvent {
        RawEvent { run_number: 1, ev_id: 2, hard, background }
    }

    #[test]
    fn test_mix_keeps_order_and_tags() {
        let hard = vec![Particle::hard(p(10.0), 0), Particle::hard(p(5.0), 1)];
        let bkg = vec![Particle::background(p(1.0), 0)];
        let combined = mix(&hard, &bkg);
        assert_eq!(combined.len(), 3);
        assert_eq!(combined[0], hard[0]);
        assert_eq!(combined[2].user_index, -1);
    }

    #[test]
    fn test_missing_hard_is_malformed() {
        let err = validate_event(raw(None, None), false).unwrap_err();
        assert!(err.is_per_event());
        let err = validate_event(raw(None, None), true).unwrap_err();
        assert!(err.is_per_event());
    }

    #[test]
    fn test_empty_hard_is_accepted() {
        let ev = validate_event(raw(Some(vec![]), None), true).unwrap();
        assert!(ev.hard.is_empty());
        let bkg = vec![Particle::background(p(1.0), 0)];
        let ev = validate_event(raw(Some(vec![]), Some(bkg)), false).unwrap();
        assert!(ev.hard.is_empty());
        assert_eq!(ev.background.map(|b| b.len()), Some(1));
    }

    #[test]
    fn test_non_finite_is_malformed() {
        let bad = Particle::hard(FourMomentum::new(f64::NAN, 0.0, 0.0, 1.0), 0);
        assert!(validate_event(raw(Some(vec![bad]), None), false).is_err());
    }

    #[test]
    fn test_background_checked_only_without_thermal() {
        let hard = vec![Particle::hard(p(10.0), 0)];
        let bad_bkg = vec![Particle::hard(p(1.0), 7)];
        assert!(validate_event(raw(Some(hard.clone()), Some(bad_bkg.clone())), false).is_err());
        let ok = validate_event(raw(Some(hard), Some(bad_bkg)), true).unwrap();
        assert!(ok.background.is_none());
    }
}
