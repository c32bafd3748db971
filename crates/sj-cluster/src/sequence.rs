//! Clustering histories on top of `jetty`.
//!
//! `jetty` reports each step by value (the two pseudojets it combined, or a
//! finished jet). Steps are mapped back onto history entries through the
//! pseudojets currently alive, so constituents, parents and exclusive jets stay
//! addressable.

use std::collections::HashMap;

use jetty::{ClusterStep, PseudoJet};
use sj_core::{FourMomentum, Kinematics, Particle};

use crate::definition::JetDefinition;
use crate::jet::{Jet, sort_by_pt};

/// How a history entry came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parents {
    /// Input particle
    Input,
    /// Pairwise recombination of two history entries
    Pair(usize, usize),
    /// Recombination of a history entry with the beam (an inclusive jet)
    Beam(usize),
}

/// One step of the clustering history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryElement {
    /// Origin of this entry
    pub parents: Parents,
    /// History entry this one was merged into
    pub child: Option<usize>,
    /// Jet produced by this step (`None` for beam recombinations)
    pub jet_index: Option<usize>,
}

fn pseudojet(p: &FourMomentum) -> PseudoJet {
    PseudoJet::from([p.e, p.px, p.py, p.pz])
}

/// Jet indices of the pseudojets still being clustered; identical momenta stack.
#[derive(Debug, Default)]
struct Alive(HashMap<PseudoJet, Vec<usize>>);

impl Alive {
    fn insert(&mut self, p: PseudoJet, jet: usize) {
        self.0.entry(p).or_default().push(jet);
    }

    fn take(&mut self, p: &PseudoJet) -> Option<usize> {
        self.0.get_mut(p)?.pop()
    }
}

/// Full clustering of one particle set.
#[derive(Debug, Clone)]
pub struct ClusterSequence {
    definition: JetDefinition,
    particles: Vec<Particle>,
    jets: Vec<FourMomentum>,
    jet_history: Vec<usize>,
    history: Vec<HistoryElement>,
}

impl ClusterSequence {
    /// Cluster `particles` with `definition`.
    ///
    /// Particles without a finite, non-zero pT carry no azimuth and are left out.
    pub fn new(particles: &[Particle], definition: JetDefinition) -> Self {
        let particles: Vec<Particle> = particles
            .iter()
            .filter(|p| p.momentum.is_finite() && p.pt2() > 0.0)
            .copied()
            .collect();
        let n = particles.len();
        let mut seq = Self {
            definition,
            jets: Vec::with_capacity(2 * n),
            jet_history: Vec::with_capacity(2 * n),
            history: Vec::with_capacity(2 * n),
            particles,
        };
        let mut alive = Alive::default();
        let mut inputs = Vec::with_capacity(n);
        for (i, p) in seq.particles.iter().enumerate() {
            seq.jets.push(p.momentum);
            seq.jet_history.push(i);
            seq.history.push(HistoryElement { parents: Parents::Input, child: None, jet_index: Some(i) });
            let pj = pseudojet(&p.momentum);
            alive.insert(pj, i);
            inputs.push(pj);
        }

        for step in definition.history(inputs) {
            match step {
                ClusterStep::Combine([a, b]) => {
                    let (Some(ja), Some(jb)) = (alive.take(&a), alive.take(&b)) else { break };
                    let k = seq.record_pair(ja, jb);
                    alive.insert(a + b, k);
                }
                ClusterStep::Jet(j) => {
                    let Some(jj) = alive.take(&j) else { break };
                    seq.record_beam(jj);
                }
            }
        }
        seq
    }

    fn record_pair(&mut self, jet_a: usize, jet_b: usize) -> usize {
        let k = self.jets.len();
        self.jets.push(self.jets[jet_a] + self.jets[jet_b]);
        let h = self.history.len();
        let (ha, hb) = (self.jet_history[jet_a], self.jet_history[jet_b]);
        self.history.push(HistoryElement {
            parents: Parents::Pair(ha, hb),
            child: None,
            jet_index: Some(k),
        });
        self.history[ha].child = Some(h);
        self.history[hb].child = Some(h);
        self.jet_history.push(h);
        k
    }

    fn record_beam(&mut self, jet: usize) {
        let h = self.history.len();
        let hj = self.jet_history[jet];
        self.history.push(HistoryElement {
            parents: Parents::Beam(hj),
            child: None,
            jet_index: None,
        });
        self.history[hj].child = Some(h);
    }

    /// Definition used for this sequence
    pub fn definition(&self) -> &JetDefinition {
        &self.definition
    }

    /// Input particles
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Clustering history (inputs first)
    pub fn history(&self) -> &[HistoryElement] {
        &self.history
    }

    /// Momentum of jet `jet_index` (inputs and intermediate objects included)
    pub fn momentum(&self, jet_index: usize) -> FourMomentum {
        self.jets[jet_index]
    }

    /// Indices of the inclusive jets, in the order they were recombined with the beam.
    pub fn inclusive_jet_indices(&self) -> Vec<usize> {
        self.history
            .iter()
            .filter_map(|h| match h.parents {
                Parents::Beam(p) => self.history[p].jet_index,
                _ => None,
            })
            .collect()
    }

    /// Inclusive jets with pT ≥ `pt_min`, in recombination order.
    pub fn inclusive_jets(&self, pt_min: f64) -> Vec<Jet> {
        let pt2_min = pt_min * pt_min;
        self.inclusive_jet_indices()
            .into_iter()
            .filter(|&j| self.jets[j].pt2() >= pt2_min)
            .map(|j| Jet::new(self.jets[j], self.constituents(j)))
            .collect()
    }

    /// Momenta of the objects left when the sequence is stopped at `n_jets` objects.
    ///
    /// Meaningful for kt / Cambridge-Aachen with a radius large enough that all
    /// pairwise recombinations precede the beam ones. Requests for at least as
    /// many jets as input particles return the particles themselves.
    pub fn exclusive_jets(&self, n_jets: usize) -> Vec<FourMomentum> {
        let n = self.particles.len();
        if n_jets >= n {
            return self.particles.iter().map(|p| p.momentum).collect();
        }
        let stop_point = 2 * n - n_jets;
        let mut out = Vec::with_capacity(n_jets);
        for h in self.history.iter().skip(stop_point) {
            let parents: [Option<usize>; 2] = match h.parents {
                Parents::Pair(p1, p2) => [Some(p1), Some(p2)],
                Parents::Beam(p1) => [Some(p1), None],
                Parents::Input => [None, None],
            };
            for p in parents.into_iter().flatten() {
                if p < stop_point {
                    if let Some(j) = self.history[p].jet_index {
                        out.push(self.jets[j]);
                    }
                }
            }
        }
        out
    }

    /// Parent jets of `jet_index`, or `None` for input particles.
    pub fn parents(&self, jet_index: usize) -> Option<(usize, usize)> {
        match self.history[self.jet_history[jet_index]].parents {
            Parents::Pair(p1, p2) => Some((self.history[p1].jet_index?, self.history[p2].jet_index?)),
            _ => None,
        }
    }

    /// Input particles making up `jet_index`, first parent before second parent.
    pub fn constituents(&self, jet_index: usize) -> Vec<Particle> {
        let mut out = Vec::new();
        let mut stack = vec![self.jet_history[jet_index]];
        while let Some(h) = stack.pop() {
            match self.history[h].parents {
                Parents::Input => {
                    if let Some(j) = self.history[h].jet_index {
                        out.push(self.particles[j]);
                    }
                }
                Parents::Pair(p1, p2) => {
                    stack.push(p2);
                    stack.push(p1);
                }
                Parents::Beam(_) => {}
            }
        }
        out
    }
}

/// Cluster `particles` and return all inclusive jets sorted by descending pT.
pub fn cluster(particles: &[Particle], definition: JetDefinition) -> Vec<Jet> {
    let mut jets = ClusterSequence::new(particles, definition).inclusive_jets(0.0);
    sort_by_pt(&mut jets);
    jets
}
