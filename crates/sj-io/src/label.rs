//! Class label of a run, taken from its input path.

use std::collections::BTreeMap;
use std::path::Path;

use sj_core::{Error, Result};

/// Label of the longest configured token contained in `path`.
///
/// Returns `(token, label)`; no matching token is a configuration error.
pub fn infer_class_label(path: &Path, labels: &BTreeMap<String, i64>) -> Result<(String, i64)> {
    let text = path.to_string_lossy();
    labels
        .iter()
        .filter(|(token, _)| !token.is_empty() && text.contains(token.as_str()))
        .max_by_key(|(token, _)| token.len())
        .map(|(token, &label)| (token.clone(), label))
        .ok_or_else(|| {
            Error::Validation(format!(
                "no class label token ({}) found in input path {}",
                labels.keys().cloned().collect::<Vec<_>>().join(", "),
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> BTreeMap<String, i64> {
        BTreeMap::from([("jewel_PbPb".to_string(), 1), ("jewel_pp".to_string(), 0)])
    }

    #[test]
    fn test_label_from_path() {
        let (token, y) = infer_class_label(Path::new("/data/jewel_PbPb/run_12.parquet"), &labels()).unwrap();
        assert_eq!((token.as_str(), y), ("jewel_PbPb", 1));
        let (_, y) = infer_class_label(Path::new("/data/jewel_pp/run_12.parquet"), &labels()).unwrap();
        assert_eq!(y, 0);
    }

    #[test]
    fn test_longest_token_wins() {
        let mut l = labels();
        l.insert("jewel".to_string(), 7);
        let (_, y) = infer_class_label(Path::new("sample_jewel_pp.parquet"), &l).unwrap();
        assert_eq!(y, 0);
    }

    #[test]
    fn test_missing_label_is_config_error() {
        let err = infer_class_label(Path::new("/data/pythia/run.parquet"), &labels()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
