//! Output discovery for AlphaFold3 runs.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::{PredictedModel, RawScoreSchema, Tool, ToolAdapter};
use crate::engine::error::EngineError;

/// Adapter for AlphaFold3's output directory layout.
///
/// AlphaFold3 writes one directory per sampled model, named
/// `seed-<seed>_sample-<sample>`, each holding `model.cif`,
/// `confidences.json`, and `summary_confidences.json`. Its confidence JSON
/// carries the tool's own token ordering, so PAE matrices need reordering
/// into the canonical chain order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alphafold3Adapter;

impl ToolAdapter for Alphafold3Adapter {
    fn tool(&self) -> Tool {
        Tool::Alphafold3
    }

    fn model_label(&self, seed: Option<u64>, sample: usize) -> String {
        match seed {
            Some(seed) => format!("Alphafold3_{}_{}", seed, sample),
            None => format!("Alphafold3_{}", sample),
        }
    }

    fn discover(&self, dir: &Path) -> Result<Vec<PredictedModel>, EngineError> {
        let mut models = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(directory_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some((seed, sample)) = parse_seed_sample(directory_name) else {
                continue;
            };
            let structure_path = path.join("model.cif");
            if !structure_path.is_file() {
                debug!(directory = %path.display(), "Sample directory without model.cif; skipping.");
                continue;
            }
            let confidences = path.join("confidences.json");
            let summary = path.join("summary_confidences.json");
            models.push(PredictedModel {
                name: self.model_label(Some(seed), sample),
                seed: Some(seed),
                sample,
                structure_path,
                scores_path: confidences.is_file().then_some(confidences),
                plddt_path: None,
                summary_path: summary.is_file().then_some(summary),
            });
        }
        models.sort_by_key(|model| (model.seed, model.sample));
        Ok(models)
    }

    fn raw_score_schema(&self) -> RawScoreSchema {
        RawScoreSchema::ConfidenceJson
    }

    fn needs_token_reordering(&self) -> bool {
        true
    }

    fn needs_confidence_embedding(&self) -> bool {
        false
    }
}

fn parse_seed_sample(directory_name: &str) -> Option<(u64, usize)> {
    let rest = directory_name.strip_prefix("seed-")?;
    let (seed, sample) = rest.split_once("_sample-")?;
    Some((seed.parse().ok()?, sample.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn scaffold_sample(root: &Path, name: &str, with_scores: bool) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.cif"), "data_model\n").unwrap();
        if with_scores {
            fs::write(dir.join("confidences.json"), "{}").unwrap();
            fs::write(dir.join("summary_confidences.json"), "{}").unwrap();
        }
    }

    #[test]
    fn discovery_sorts_by_seed_then_sample() {
        let dir = tempdir().unwrap();
        scaffold_sample(dir.path(), "seed-2_sample-0", true);
        scaffold_sample(dir.path(), "seed-1_sample-1", true);
        scaffold_sample(dir.path(), "seed-1_sample-0", false);

        let models = Alphafold3Adapter.discover(dir.path()).unwrap();

        let names: Vec<&str> = models.iter().map(|model| model.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Alphafold3_1_0", "Alphafold3_1_1", "Alphafold3_2_0"]
        );
        assert!(models[0].scores_path.is_none());
        assert!(models[1].scores_path.is_some());
        assert!(models[1].summary_path.is_some());
        assert!(models.iter().all(|model| model.plddt_path.is_none()));
    }

    #[test]
    fn non_sample_entries_are_ignored() {
        let dir = tempdir().unwrap();
        scaffold_sample(dir.path(), "seed-1_sample-0", true);
        fs::create_dir_all(dir.path().join("msas")).unwrap();
        fs::create_dir_all(dir.path().join("seed-x_sample-0")).unwrap();
        fs::write(dir.path().join("ranking_scores.csv"), "").unwrap();
        // A conforming directory without a structure file is not a model.
        fs::create_dir_all(dir.path().join("seed-9_sample-9")).unwrap();

        let models = Alphafold3Adapter.discover(dir.path()).unwrap();

        assert_eq!(models.len(), 1);
        assert_eq!(models[0].seed, Some(1));
        assert_eq!(models[0].sample, 0);
    }

    #[test]
    fn directory_names_parse_strictly() {
        assert_eq!(parse_seed_sample("seed-42_sample-3"), Some((42, 3)));
        assert_eq!(parse_seed_sample("seed-42"), None);
        assert_eq!(parse_seed_sample("sample-3_seed-42"), None);
        assert_eq!(parse_seed_sample("seed-one_sample-3"), None);
    }
}
