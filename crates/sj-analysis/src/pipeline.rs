//! The per-event driver and the event loop.

use serde::Serialize;

use sj_background::{RandomCone, SubtractorBank, ThermalGenerator, is_unsubtracted};
use sj_cluster::Jet;
use sj_core::{EventSource, Kinematics, RawEvent, Result};

use crate::accumulator::{Accumulator, EventContribution, JetRecord};
use crate::config::Settings;
use crate::finder::{JetFinder, combined_selector, hard_selector};
use crate::keys::{AccumulationKey, JetLabel};
use crate::matching::{MatchOutcome, match_jets};
use crate::mixer::{mix, validate_event};
use crate::observables::{ObservableBundle, ObservableComputer};

/// Offset between the thermal stream seed and the random-cone stream seed.
pub const RANDOM_CONE_SEED_OFFSET: u64 = 0x5A5A_5A5A;

/// Progress is logged every this many events.
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Turns raw events into staged accumulator rows.
#[derive(Debug)]
pub struct EventProcessor {
    settings: Settings,
    finder: JetFinder,
    computer: ObservableComputer,
    subtractors: SubtractorBank,
    thermal: Option<ThermalGenerator>,
    random_cone: RandomCone,
}

impl EventProcessor {
    /// Build every per-run collaborator from validated settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let thermal = match &settings.thermal {
            Some(t) => Some(ThermalGenerator::new(t, settings.eta_max, settings.seed)?),
            None => None,
        };
        let random_cone = RandomCone::new(
            settings.random_cone_radius,
            settings.eta_max,
            settings.seed.wrapping_add(RANDOM_CONE_SEED_OFFSET),
        )?;
        let subtractors = SubtractorBank::new(&settings.subtractor, settings.eta_max)?;
        let computer = ObservableComputer::new(settings.nsub_grid.clone(), settings.grooming);
        Ok(Self { settings, finder: JetFinder, computer, subtractors, thermal, random_cone })
    }

    /// Process one event. A malformed event returns `Error::MalformedEvent`
    /// before any random stream is advanced.
    pub fn process(&mut self, raw: RawEvent) -> Result<EventContribution> {
        let event = validate_event(raw, self.thermal.is_some())?;
        let background = match self.thermal.as_mut() {
            Some(generator) => Some(generator.generate()),
            None => event.background,
        };

        let mut contribution = EventContribution::new();
        if let Some(bkg) = &background {
            contribution.set_delta_pt_random_cone(self.random_cone.delta_pt(bkg));
        }
        let combined = mix(&event.hard, background.as_deref().unwrap_or_default());
        let sets = self.subtractors.apply(&combined);

        for (ri, &radius) in self.settings.jet_radii.iter().enumerate() {
            for (bi, bin) in self.settings.pt_bins.iter().enumerate() {
                let hard_jets = self.finder.find(
                    &event.hard,
                    radius,
                    &hard_selector(bin, radius, self.settings.eta_max),
                );
                let combined_sel = combined_selector(bin, radius, self.settings.eta_max);
                for (mi, set) in sets.iter().enumerate() {
                    if is_unsubtracted(set.r_max) {
                        let key = AccumulationKey::new(JetLabel::Hard, ri, bi, mi);
                        for jet in &hard_jets {
                            let bundle = self.computer.compute(jet, radius);
                            contribution.push(key, JetRecord::new(&bundle, None));
                        }
                    }
                    let combined_jets = self.finder.find(&set.particles, radius, &combined_sel);
                    self.fill_combined(&mut contribution, &combined_jets, &hard_jets, radius, [ri, bi, mi]);
                }
            }
        }
        tracing::trace!(
            run_number = event.run_number,
            ev_id = event.ev_id,
            rows = contribution.len(),
            "event processed"
        );
        Ok(contribution)
    }

    fn fill_combined(
        &self,
        contribution: &mut EventContribution,
        combined_jets: &[Jet],
        hard_jets: &[Jet],
        radius: f64,
        [ri, bi, mi]: [usize; 3],
    ) {
        let bin = self.settings.pt_bins[bi];
        let mut bundles: Vec<Option<ObservableBundle>> = vec![None; combined_jets.len()];
        let mut bundle_of = |ci: usize| -> ObservableBundle {
            bundles[ci].get_or_insert_with(|| self.computer.compute(&combined_jets[ci], radius)).clone()
        };

        let combined_key = AccumulationKey::new(JetLabel::Combined, ri, bi, mi);
        for (ci, jet) in combined_jets.iter().enumerate() {
            if bin.contains(jet.pt()) {
                contribution.push(combined_key, JetRecord::new(&bundle_of(ci), None));
            }
        }

        let (outcomes, counters) =
            match_jets(combined_jets, hard_jets, radius, self.settings.matching_fraction, &bin);
        contribution.add_counters(counters);
        let matched_key = AccumulationKey::new(JetLabel::CombinedMatched, ri, bi, mi);
        for outcome in outcomes {
            if let MatchOutcome::Accepted(pair) = outcome {
                contribution.push(matched_key, JetRecord::new(&bundle_of(pair.combined), Some(&pair)));
            }
        }
    }
}

/// Event-loop tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Events read from the source
    pub events_read: u64,
    /// Events committed to the accumulator
    pub events_processed: u64,
    /// Malformed events skipped
    pub events_skipped: u64,
}

/// Drain `source` through `processor` into `accumulator`.
///
/// Malformed events are skipped with a warning; any other error aborts the run.
pub fn run_events(
    source: &mut dyn EventSource,
    processor: &mut EventProcessor,
    accumulator: &mut Accumulator,
    max_events: Option<usize>,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    if let Some(n) = source.len_hint() {
        tracing::info!(events = n, "event source opened");
    }
    while max_events.is_none_or(|max| stats.events_read < max as u64) {
        let Some(raw) = source.next_event()? else { break };
        stats.events_read += 1;
        match processor.process(raw) {
            Ok(contribution) => {
                accumulator.commit(contribution)?;
                stats.events_processed += 1;
            }
            Err(e) if e.is_per_event() => {
                tracing::warn!(error = %e, "skipping event");
                stats.events_skipped += 1;
            }
            Err(e) => return Err(e),
        }
        if stats.events_read % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                events = stats.events_read,
                skipped = stats.events_skipped,
                "processing"
            );
        }
    }
    tracing::info!(
        events = stats.events_read,
        processed = stats.events_processed,
        skipped = stats.events_skipped,
        "event loop done"
    );
    Ok(stats)
}
