//! Hard jets embedded in a thermal background, through the full event loop.

use sj_analysis::{
    AccumulationKey, Accumulator, AnalysisConfig, EventProcessor, JetLabel, QaObservable,
    run_events,
};
use sj_core::{EventSource, FourMomentum, Particle, RawEvent, Result};

const CONFIG: &str = r#"
K: [4]
jetR: [0.4]
jet_pt_bins: [[80.0, 120.0]]
eta_max: 0.9
jet_matching_distance: 0.6
thermal_model:
  N_avg: 200
  sigma_N: 5
  beta: 0.4
constituent_subtractor:
  max_distance: [0, 0.25]
  alpha: 0
  bge_rho_grid_size: 1.0
  max_pt_correct: 100
  ghost_area: 0.01
seed: 7
n_max_constituents: 200
"#;

struct Events {
    next: i64,
    total: i64,
}

impl EventSource for Events {
    fn next_event(&mut self) -> Result<Option<RawEvent>> {
        if self.next >= self.total {
            return Ok(None);
        }
        let ev_id = self.next;
        self.next += 1;
        let phi = 0.5 + 0.8 * ev_id as f64;
        let p = |pt, deta: f64, dphi: f64, i| {
            Particle::hard(FourMomentum::from_pt_eta_phi_m(pt, 0.1 + deta, phi + dphi, 0.0), i)
        };
        let hard = vec![p(50.0, 0.0, 0.0, 0), p(30.0, 0.05, 0.08, 1), p(20.0, -0.1, -0.05, 2)];
        Ok(Some(RawEvent { run_number: 100, ev_id, hard: Some(hard), background: None }))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.total as usize)
    }
}

#[test]
fn embedded_jets_are_matched_for_every_radius() {
    let cfg: AnalysisConfig = serde_yaml_ng::from_str(CONFIG).unwrap();
    let settings = cfg.into_settings().unwrap();
    let mut accumulator = Accumulator::new(&settings);
    let mut processor = EventProcessor::new(settings.clone()).unwrap();
    let mut source = Events { next: 0, total: 5 };

    let stats = run_events(&mut source, &mut processor, &mut accumulator, None).unwrap();
    assert_eq!(stats.events_processed, 5);
    assert_eq!(accumulator.counters().accepted, 10);
    assert_eq!(accumulator.delta_pt_random_cone().len(), 5);

    let hard = AccumulationKey::new(JetLabel::Hard, 0, 0, 0);
    assert_eq!(accumulator.len_of(&hard).unwrap(), 5);

    let arrays = accumulator.finalize(settings.n_max_constituents).unwrap();
    for mi in 0..2 {
        let key = AccumulationKey::new(JetLabel::CombinedMatched, 0, 0, mi);
        let matched = arrays.iter().find(|a| a.key == key).unwrap();
        assert_eq!(matched.n_jets, 5);
        for value in matched.qa_series(QaObservable::MatchedPt) {
            assert!(value > 0.8, "matched_pt = {value}");
        }
        for value in matched.qa_series(QaObservable::MatchedDeltaR) {
            assert!(value < 0.6 * 0.4);
        }
        assert!(matched.nsubjettiness.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert_eq!(matched.four_vectors.len(), 5 * 4 * settings.n_max_constituents);
    }

    // the unsubtracted combined jet carries background on top of the hard jet
    let unsubtracted = AccumulationKey::new(JetLabel::CombinedMatched, 0, 0, 0);
    let matched = arrays.iter().find(|a| a.key == unsubtracted).unwrap();
    assert!(matched.qa_series(QaObservable::DeltaPt).iter().all(|&d| d > 0.0));
}

#[test]
fn same_seed_same_arrays() {
    let run = || {
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(CONFIG).unwrap();
        let settings = cfg.into_settings().unwrap();
        let mut accumulator = Accumulator::new(&settings);
        let mut processor = EventProcessor::new(settings.clone()).unwrap();
        let mut source = Events { next: 0, total: 3 };
        run_events(&mut source, &mut processor, &mut accumulator, None).unwrap();
        accumulator.finalize(settings.n_max_constituents).unwrap()
    };
    assert_eq!(run(), run());
}
