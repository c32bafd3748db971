//! Kinematic acceptance for jets.

use sj_core::Kinematics;

use crate::jet::Jet;

/// pT window and |η| cut.
///
/// `pt_min` is inclusive, `pt_max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetSelector {
    /// Minimum pT
    pub pt_min: f64,
    /// Optional maximum pT
    pub pt_max: Option<f64>,
    /// Optional maximum |η|
    pub abs_eta_max: Option<f64>,
}

impl JetSelector {
    /// Selector with only a minimum pT
    pub fn pt_min(pt_min: f64) -> Self {
        Self { pt_min, pt_max: None, abs_eta_max: None }
    }

    /// Add a maximum pT
    pub fn with_pt_max(mut self, pt_max: f64) -> Self {
        self.pt_max = Some(pt_max);
        self
    }

    /// Add a maximum |η|
    pub fn with_abs_eta_max(mut self, abs_eta_max: f64) -> Self {
        self.abs_eta_max = Some(abs_eta_max);
        self
    }

    /// Whether `object` is accepted
    pub fn pass<K: Kinematics + ?Sized>(&self, object: &K) -> bool {
        let pt = object.pt();
        if pt < self.pt_min {
            return false;
        }
        if self.pt_max.is_some_and(|max| pt >= max) {
            return false;
        }
        if self.abs_eta_max.is_some_and(|max| object.eta().abs() > max) {
            return false;
        }
        true
    }

    /// Keep accepted jets, order preserved
    pub fn select(&self, mut jets: Vec<Jet>) -> Vec<Jet> {
        jets.retain(|j| self.pass(j));
        jets
    }
}
