//! Density-normalized histograms of QA series (numbers-first).

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use sj_core::{Error, Result};

/// Number of bin edges per histogram.
pub const N_EDGES: usize = 20;

/// Headroom above the largest value.
const RANGE_SCALE: f64 = 1.2;

/// Schema version of [`QaDistributionArtifact`].
pub const QA_DISTRIBUTION_SCHEMA_V1: &str = "subjet_qa_distribution_v1";

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
pub struct DistributionMeta {
    pub tool: String,
    pub tool_version: String,
    pub created_unix_ms: u128,
}

/// One QA observable of one accumulation key.
#[derive(Debug, Clone, Serialize)]
pub struct QaDistributionArtifact {
    /// [`QA_DISTRIBUTION_SCHEMA_V1`]
    pub schema_version: String,
    /// Producer metadata
    pub meta: DistributionMeta,
    /// Observable name
    pub observable: String,
    /// Number of values histogrammed
    pub n_entries: usize,
    /// `N_EDGES` edges
    pub bin_edges: Vec<f64>,
    /// Density per bin (integrates to 1)
    pub density: Vec<f64>,
    /// Raw counts per bin
    pub counts: Vec<u64>,
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Computation(format!("system time error: {e}")))?;
    Ok(d.as_millis())
}

/// Edges from min(0, 1.2·min) to 1.2·max, `N_EDGES` of them.
fn edges_for(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let lo = (RANGE_SCALE * min).min(0.0);
    let mut hi = (RANGE_SCALE * max).max(0.0);
    if hi <= lo {
        hi = lo + 1.0;
    }
    let step = (hi - lo) / (N_EDGES - 1) as f64;
    (0..N_EDGES).map(|i| if i == N_EDGES - 1 { hi } else { lo + step * i as f64 }).collect()
}

/// Bin of `val`; the last bin includes the upper edge.
fn find_bin(edges: &[f64], val: f64) -> Option<usize> {
    let last = edges.len() - 1;
    if !(val >= edges[0] && val <= edges[last]) {
        return None;
    }
    if val == edges[last] {
        return Some(last - 1);
    }
    match edges.binary_search_by(|e| e.total_cmp(&val)) {
        Ok(i) => Some(i),
        Err(i) => Some(i.saturating_sub(1)),
    }
}

/// Histogram `values`; `None` for an empty series.
pub fn build_distribution(observable: &str, values: &[f64]) -> Result<Option<QaDistributionArtifact>> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Ok(None);
    }
    let bin_edges = edges_for(&finite);
    let mut counts = vec![0u64; N_EDGES - 1];
    for &v in &finite {
        if let Some(b) = find_bin(&bin_edges, v) {
            counts[b] += 1;
        }
    }
    let total: u64 = counts.iter().sum();
    let density = counts
        .iter()
        .zip(bin_edges.windows(2))
        .map(|(&c, w)| c as f64 / (total as f64 * (w[1] - w[0])))
        .collect();
    Ok(Some(QaDistributionArtifact {
        schema_version: QA_DISTRIBUTION_SCHEMA_V1.to_string(),
        meta: DistributionMeta {
            tool: "subjet".to_string(),
            tool_version: sj_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
        },
        observable: observable.to_string(),
        n_entries: finite.len(),
        bin_edges,
        density,
        counts,
    }))
}

/// Write `<dir>/<observable>.json` for every non-empty series; returns the
/// number of files written.
pub fn write_key_artifacts(dir: &Path, series: &[(&str, Vec<f64>)]) -> Result<usize> {
    let mut written = 0;
    for (name, values) in series {
        let Some(artifact) = build_distribution(name, values)? else {
            continue;
        };
        if written == 0 {
            std::fs::create_dir_all(dir)?;
        }
        let path = dir.join(format!("{name}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(&artifact)?)?;
        written += 1;
    }
    tracing::debug!(dir = %dir.display(), written, "QA artifacts");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_find_bin_edges() {
        let edges = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(find_bin(&edges, -0.5), None);
        assert_eq!(find_bin(&edges, 0.0), Some(0));
        assert_eq!(find_bin(&edges, 1.0), Some(1));
        assert_eq!(find_bin(&edges, 2.99), Some(2));
        assert_eq!(find_bin(&edges, 3.0), Some(2));
        assert_eq!(find_bin(&edges, 3.01), None);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let values = [0.1, 0.2, 0.25, 0.5, 0.9, 1.0];
        let art = build_distribution("jet_angularity", &values).unwrap().unwrap();
        assert_eq!(art.bin_edges.len(), N_EDGES);
        assert_eq!(art.bin_edges[0], 0.0);
        assert_relative_eq!(art.bin_edges[N_EDGES - 1], 1.2, epsilon = 1e-12);
        let integral: f64 =
            art.density.iter().zip(art.bin_edges.windows(2)).map(|(d, w)| d * (w[1] - w[0])).sum();
        assert_relative_eq!(integral, 1.0, epsilon = 1e-12);
        assert_eq!(art.counts.iter().sum::<u64>(), 6);
    }

    #[test]
    fn test_negative_values_widen_range() {
        let art = build_distribution("delta_pt", &[-10.0, 5.0, 20.0]).unwrap().unwrap();
        assert_relative_eq!(art.bin_edges[0], -12.0, epsilon = 1e-12);
        assert_eq!(art.counts.iter().sum::<u64>(), 3);
    }

    #[test]
    fn test_empty_and_constant_series() {
        assert!(build_distribution("jet_theta_g", &[]).unwrap().is_none());
        let art = build_distribution("jet_theta_g", &[0.0, 0.0]).unwrap().unwrap();
        assert_eq!(art.counts[0], 2);
    }

    #[test]
    fn test_write_skips_empty_series() {
        let dir = std::env::temp_dir().join(format!("sj_viz_{}", std::process::id()));
        let series = vec![("jet_pt", vec![50.0, 55.0]), ("delta_pt", vec![])];
        assert_eq!(write_key_artifacts(&dir, &series).unwrap(), 1);
        assert!(dir.join("jet_pt.json").exists());
        assert!(!dir.join("delta_pt.json").exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
