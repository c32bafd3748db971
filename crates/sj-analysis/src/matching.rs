//! Geometric matching of combined jets to hard jets.
//!
//! Three stages, run per (event, radius, pT bin, subtraction radius):
//! candidate collection, resolution from the combined side, and the pT-bin
//! acceptance filter. Resolution is one-directional: several combined jets may
//! resolve to the same hard jet and are not reduced to a single winner.

use std::collections::HashSet;
use std::ops::AddAssign;

use serde::Serialize;

use sj_cluster::Jet;
use sj_core::Kinematics;

use crate::config::PtBin;
use crate::observables::PT_FLOOR;

/// A link to a jet of the opposite sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    /// Index of the far jet in its own sequence
    pub other: usize,
    /// ΔR between the two jets
    pub delta_r: f64,
}

/// Candidate links recorded on both sides.
///
/// Per jet, links are in iteration order over the opposite sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateLinks {
    /// Links of each combined jet
    pub combined: Vec<Vec<MatchCandidate>>,
    /// Links of each hard jet
    pub hard: Vec<Vec<MatchCandidate>>,
}

/// Record a mutual link for every pair with ΔR < `max_dr`.
pub fn collect_candidates(combined: &[Jet], hard: &[Jet], max_dr: f64) -> CandidateLinks {
    let mut links = CandidateLinks {
        combined: vec![Vec::new(); combined.len()],
        hard: vec![Vec::new(); hard.len()],
    };
    for (ci, c) in combined.iter().enumerate() {
        for (hi, h) in hard.iter().enumerate() {
            let delta_r = c.delta_r(h);
            if delta_r < max_dr {
                links.combined[ci].push(MatchCandidate { other: hi, delta_r });
                links.hard[hi].push(MatchCandidate { other: ci, delta_r });
            }
        }
    }
    links
}

/// Tentative match of one combined jet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Zero or several candidates
    Unmatched {
        /// Number of candidate links
        candidates: usize,
    },
    /// Exactly one candidate: the hard jet index
    Unique(usize),
}

/// Resolve each combined jet from its own links only.
pub fn resolve(links: &CandidateLinks) -> Vec<Resolution> {
    links
        .combined
        .iter()
        .map(|c| match c.as_slice() {
            [only] => Resolution::Unique(only.other),
            other => Resolution::Unmatched { candidates: other.len() },
        })
        .collect()
}

/// An accepted (combined, hard) pair and its match QA values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    /// Combined jet index
    pub combined: usize,
    /// Hard jet index
    pub hard: usize,
    /// pT(combined) − pT(hard)
    pub delta_pt: f64,
    /// ΔR(combined, hard)
    pub delta_r: f64,
    /// Hard-jet momentum fraction recovered in the combined jet
    pub matched_pt: f64,
}

/// Terminal outcome of one combined jet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// No unique candidate
    Unmatched,
    /// Unique candidate whose pT lies outside the bin
    Rejected {
        /// Hard jet index
        hard: usize,
    },
    /// Accepted pair
    Accepted(MatchedPair),
}

/// Outcome tallies, summed over events by the accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounters {
    /// Combined jets with no candidate
    pub no_candidate: u64,
    /// Combined jets with two or more candidates
    pub ambiguous: u64,
    /// Unique matches with the hard jet outside the pT bin
    pub rejected_pt_bin: u64,
    /// Accepted matches
    pub accepted: u64,
}

impl AddAssign for MatchCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.no_candidate += rhs.no_candidate;
        self.ambiguous += rhs.ambiguous;
        self.rejected_pt_bin += rhs.rejected_pt_bin;
        self.accepted += rhs.accepted;
    }
}

/// Σ pT of the combined constituents that stem from the hard jet's
/// constituents, divided by pT(hard).
pub fn matched_pt(combined: &Jet, hard: &Jet) -> f64 {
    let hard_tags: HashSet<i64> =
        hard.constituents.iter().filter(|p| p.is_hard()).map(|p| p.user_index).collect();
    let shared: f64 = combined
        .constituents
        .iter()
        .filter(|p| p.is_hard() && hard_tags.contains(&p.user_index))
        .map(|p| p.pt())
        .sum();
    shared / hard.pt().max(PT_FLOOR)
}

/// Apply the pT-bin filter to each resolution.
pub fn accept(
    combined: &[Jet],
    hard: &[Jet],
    resolutions: &[Resolution],
    bin: &PtBin,
    counters: &mut MatchCounters,
) -> Vec<MatchOutcome> {
    resolutions
        .iter()
        .enumerate()
        .map(|(ci, resolution)| match *resolution {
            Resolution::Unmatched { candidates } => {
                if candidates == 0 {
                    counters.no_candidate += 1;
                } else {
                    counters.ambiguous += 1;
                }
                MatchOutcome::Unmatched
            }
            Resolution::Unique(hi) => {
                let (c, h) = (&combined[ci], &hard[hi]);
                if !bin.contains(h.pt()) {
                    counters.rejected_pt_bin += 1;
                    return MatchOutcome::Rejected { hard: hi };
                }
                counters.accepted += 1;
                MatchOutcome::Accepted(MatchedPair {
                    combined: ci,
                    hard: hi,
                    delta_pt: c.pt() - h.pt(),
                    delta_r: c.delta_r(h),
                    matched_pt: matched_pt(c, h),
                })
            }
        })
        .collect()
}

/// All three stages with the distance cut `fraction · radius`.
///
/// Returns one outcome per combined jet and the outcome tallies.
pub fn match_jets(
    combined: &[Jet],
    hard: &[Jet],
    radius: f64,
    fraction: f64,
    bin: &PtBin,
) -> (Vec<MatchOutcome>, MatchCounters) {
    let links = collect_candidates(combined, hard, fraction * radius);
    let resolutions = resolve(&links);
    let mut counters = MatchCounters::default();
    let outcomes = accept(combined, hard, &resolutions, bin, &mut counters);
    (outcomes, counters)
}
