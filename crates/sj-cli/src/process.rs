//! `subjet process` orchestration.

use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use sj_analysis::{
    Accumulator, EventProcessor, KeyArrays, MatchCounters, QaObservable, RunStats, read_config,
    run_events,
};
use sj_io::{ARRAY_STORE_FILE, ParquetEventSource, StoreMetadata, infer_class_label, write_array_store};

/// Name of the run summary inside the output directory.
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut s = String::with_capacity(64);
    for b in out {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

fn sha256_file(path: &Path) -> Result<String> {
    Ok(sha256_hex(&std::fs::read(path)?))
}

#[derive(Debug, Clone, Serialize)]
struct InputFile {
    path: String,
    sha256: String,
}

#[derive(Debug, Clone, Serialize)]
struct KeySummary {
    key: String,
    n_jets: usize,
}

#[derive(Debug, Clone, Serialize)]
struct RunSummary {
    schema_version: String,
    tool: String,
    tool_version: String,
    created_unix_ms: u128,
    config: InputFile,
    input: InputFile,
    class_token: String,
    class_label: i64,
    seed: u64,
    events: RunStats,
    matching: MatchCounters,
    random_cone_entries: usize,
    keys: Vec<KeySummary>,
    qa_artifacts: usize,
    wall_time_s: f64,
}

fn write_qa_artifacts(out_dir: &Path, arrays: &[KeyArrays]) -> Result<usize> {
    let mut written = 0;
    for key in arrays {
        let series: Vec<(&str, Vec<f64>)> =
            QaObservable::ALL.iter().map(|obs| (obs.as_str(), key.qa_series(*obs))).collect();
        written += sj_viz::write_key_artifacts(&out_dir.join(key.info.name()), &series)?;
    }
    Ok(written)
}

pub fn cmd_process(
    config: &Path,
    input: &Path,
    out_dir: &Path,
    max_events: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    if !config.is_file() {
        anyhow::bail!("config file not found: {}", config.display());
    }
    if !input.is_file() {
        anyhow::bail!("input file not found: {}", input.display());
    }
    let started = Instant::now();

    let mut cfg = read_config(config)?;
    if let Some(s) = seed {
        cfg.seed = s;
    }
    if max_events.is_some() {
        cfg.max_events = max_events;
    }
    let settings = cfg.into_settings()?;
    let (class_token, class_label) = infer_class_label(input, &settings.class_labels)?;
    tracing::info!(token = %class_token, label = class_label, "class label");

    std::fs::create_dir_all(out_dir)?;
    let mut source = ParquetEventSource::open(input)?;
    let mut accumulator = Accumulator::new(&settings);
    let mut processor = EventProcessor::new(settings.clone())?;
    tracing::info!(
        keys = accumulator.table().len(),
        nsub = settings.nsub_grid.len(),
        thermal = settings.thermal.is_some(),
        "pipeline ready"
    );

    let stats = run_events(&mut source, &mut processor, &mut accumulator, settings.max_events)?;
    let matching = accumulator.counters();
    let delta_pt_random_cone = accumulator.delta_pt_random_cone().to_vec();
    let arrays = accumulator.finalize(settings.n_max_constituents)?;

    let metadata = StoreMetadata {
        n_list: settings.nsub_grid.n_list(),
        beta_list: settings.nsub_grid.beta_list(),
        keys: arrays.iter().map(|a| a.info.name()).collect(),
        delta_pt_random_cone,
        n_max_constituents: settings.n_max_constituents,
    };
    let store_path = out_dir.join(ARRAY_STORE_FILE);
    write_array_store(&store_path, &arrays, &metadata, class_label)?;
    tracing::info!(path = %store_path.display(), keys = arrays.len(), "array store written");

    let qa_artifacts = write_qa_artifacts(out_dir, &arrays)?;

    let summary = RunSummary {
        schema_version: "subjet_run_summary_v1".to_string(),
        tool: "subjet".to_string(),
        tool_version: sj_core::VERSION.to_string(),
        created_unix_ms: SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis(),
        config: InputFile { path: config.display().to_string(), sha256: sha256_file(config)? },
        input: InputFile { path: input.display().to_string(), sha256: sha256_file(input)? },
        class_token,
        class_label,
        seed: settings.seed,
        events: stats,
        matching,
        random_cone_entries: metadata.delta_pt_random_cone.len(),
        keys: arrays
            .iter()
            .map(|a| KeySummary { key: a.info.name(), n_jets: a.n_jets })
            .collect(),
        qa_artifacts,
        wall_time_s: started.elapsed().as_secs_f64(),
    };
    std::fs::write(out_dir.join(RUN_SUMMARY_FILE), serde_json::to_string_pretty(&summary)?)?;
    tracing::info!(
        events = stats.events_processed,
        skipped = stats.events_skipped,
        accepted = matching.accepted,
        "done"
    );
    Ok(())
}
