//! Jet content agrees with an O(N³) reference clustering.

use jetty::PseudoJet;
use jetty::distance::Distance;
use jetty::{anti_kt_f, cambridge_aachen_f, kt_f};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sj_cluster::{ClusterSequence, JetAlgorithm, JetDefinition};
use sj_core::{FourMomentum, Particle};

const R: f64 = 0.4;
const N_EVENTS: u64 = 100;
const N_PARTICLES: usize = 16;

fn random_event(rng: &mut StdRng) -> Vec<Particle> {
    (0..N_PARTICLES)
        .map(|i| {
            let pt = rng.random_range(1.0..50.0);
            let eta = rng.random_range(-1.0..1.0);
            let phi = rng.random_range(0.0..std::f64::consts::TAU);
            Particle::hard(FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0), i)
        })
        .collect()
}

/// Exhaustive search for the smallest distance at every step.
fn reference_jets<D: Distance>(particles: &[Particle], d: D) -> Vec<Vec<i64>> {
    let mut alive: Vec<(PseudoJet, Vec<i64>)> = particles
        .iter()
        .map(|p| {
            let m = p.momentum;
            (PseudoJet::from([m.e, m.px, m.py, m.pz]), vec![p.user_index])
        })
        .collect();
    let mut jets = Vec::new();
    while !alive.is_empty() {
        let (mut best_i, mut best_j) = (0, None);
        let mut best = d.beam_distance(&alive[0].0);
        for i in 0..alive.len() {
            let dib = d.beam_distance(&alive[i].0);
            if dib < best {
                (best, best_i, best_j) = (dib, i, None);
            }
            for j in (i + 1)..alive.len() {
                let dij = d.distance(&alive[i].0, &alive[j].0);
                if dij < best {
                    (best, best_i, best_j) = (dij, i, Some(j));
                }
            }
        }
        match best_j {
            Some(j) => {
                let (pj, cj) = alive.swap_remove(j);
                let (pi, ci) = &mut alive[best_i];
                *pi = *pi + pj;
                ci.extend(cj);
            }
            None => {
                let (_, mut members) = alive.swap_remove(best_i);
                members.sort_unstable();
                jets.push(members);
            }
        }
    }
    jets.sort();
    jets
}

fn sequence_jets(particles: &[Particle], definition: JetDefinition) -> Vec<Vec<i64>> {
    let mut jets: Vec<Vec<i64>> = ClusterSequence::new(particles, definition)
        .inclusive_jets(0.0)
        .iter()
        .map(|j| {
            let mut members: Vec<i64> = j.constituents.iter().map(|c| c.user_index).collect();
            members.sort_unstable();
            members
        })
        .collect();
    jets.sort();
    jets
}

fn assert_matches_reference<D: Distance>(algorithm: JetAlgorithm, seed: u64, distance: impl Fn() -> D) {
    let mut rng = StdRng::seed_from_u64(seed);
    for ev in 0..N_EVENTS {
        let particles = random_event(&mut rng);
        let expected = reference_jets(&particles, distance());
        let got = sequence_jets(&particles, JetDefinition::new(algorithm, R));
        assert_eq!(got, expected, "{algorithm:?} event {ev}");
    }
}

#[test]
fn test_anti_kt_matches_reference() {
    assert_matches_reference(JetAlgorithm::AntiKt, 11, || anti_kt_f(R));
}

#[test]
fn test_kt_matches_reference() {
    assert_matches_reference(JetAlgorithm::Kt, 12, || kt_f(R));
}

#[test]
fn test_cambridge_aachen_matches_reference() {
    assert_matches_reference(JetAlgorithm::CambridgeAachen, 13, || cambridge_aachen_f(R));
}

#[test]
fn test_every_particle_lands_in_one_jet() {
    let mut rng = StdRng::seed_from_u64(7);
    let particles = random_event(&mut rng);
    for algorithm in [JetAlgorithm::AntiKt, JetAlgorithm::Kt, JetAlgorithm::CambridgeAachen] {
        let mut all: Vec<i64> =
            sequence_jets(&particles, JetDefinition::new(algorithm, R)).concat();
        all.sort_unstable();
        assert_eq!(all, (0..N_PARTICLES as i64).collect::<Vec<_>>());
    }
}
