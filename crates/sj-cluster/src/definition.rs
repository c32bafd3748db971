//! Jet definitions: algorithm + radius.

use jetty::{ClusterHistory, PseudoJet, anti_kt_f, cambridge_aachen_f, kt_f};
use serde::{Deserialize, Serialize};

/// Largest radius accepted by a definition; used for "one jet from everything" reclustering.
pub const MAX_ALLOWABLE_R: f64 = 1000.0;

/// Generalised-kt family member.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JetAlgorithm {
    /// p = -1
    AntiKt,
    /// p = 0
    CambridgeAachen,
    /// p = 1
    Kt,
}

/// Clustering algorithm and radius, E-scheme recombination.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct JetDefinition {
    /// Algorithm
    pub algorithm: JetAlgorithm,
    /// Jet radius R
    pub radius: f64,
}

impl JetDefinition {
    /// New definition; the radius is clamped to `MAX_ALLOWABLE_R`.
    pub fn new(algorithm: JetAlgorithm, radius: f64) -> Self {
        Self { algorithm, radius: radius.min(MAX_ALLOWABLE_R) }
    }

    /// Anti-kt with radius `radius`.
    pub fn anti_kt(radius: f64) -> Self {
        Self::new(JetAlgorithm::AntiKt, radius)
    }

    /// Definition that merges everything into a single jet (exclusive axes finding).
    pub fn full_event(algorithm: JetAlgorithm) -> Self {
        Self::new(algorithm, MAX_ALLOWABLE_R)
    }

    /// Step-by-step `jetty` clustering of `pseudojets` under this definition.
    pub(crate) fn history(&self, pseudojets: Vec<PseudoJet>) -> ClusterHistory<'static> {
        match self.algorithm {
            JetAlgorithm::AntiKt => ClusterHistory::new(pseudojets, anti_kt_f(self.radius)),
            JetAlgorithm::CambridgeAachen => {
                ClusterHistory::new(pseudojets, cambridge_aachen_f(self.radius))
            }
            JetAlgorithm::Kt => ClusterHistory::new(pseudojets, kt_f(self.radius)),
        }
    }
}
