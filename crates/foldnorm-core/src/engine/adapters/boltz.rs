//! Output discovery for Boltz runs.

use std::fs;
use std::path::{Path, PathBuf};

use super::{PredictedModel, RawScoreSchema, Tool, ToolAdapter};
use crate::engine::error::EngineError;

/// Adapter for Boltz's output directory layout.
///
/// Boltz nests models under `boltz_results_<job>/predictions/<job>/` and
/// names them `<job>_model_<n>.cif`. Score files sit next to each model with
/// the stem prefixed: `pae_<stem>.json`, `plddt_<stem>.json`, and
/// `confidence_<stem>.json`. Structures carry no confidence in the
/// temperature factor column, so the pLDDT side file must be embedded.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoltzAdapter {
    seed: Option<u64>,
}

impl BoltzAdapter {
    /// Creates an adapter that labels models with the given run seed.
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

impl ToolAdapter for BoltzAdapter {
    fn tool(&self) -> Tool {
        Tool::Boltz
    }

    fn model_label(&self, seed: Option<u64>, sample: usize) -> String {
        match seed {
            Some(seed) => format!("Boltz-1_{}_{}", seed, sample),
            None => format!("Boltz-1_{}", sample),
        }
    }

    fn discover(&self, dir: &Path) -> Result<Vec<PredictedModel>, EngineError> {
        let mut cif_files = Vec::new();
        collect_cif_files(dir, &mut cif_files)?;

        let mut models = Vec::new();
        for path in cif_files {
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let Some((_, index)) = stem.rsplit_once("_model_") else {
                continue;
            };
            let Ok(sample) = index.parse::<usize>() else {
                continue;
            };
            let Some(parent) = path.parent() else {
                continue;
            };
            let pae = parent.join(format!("pae_{}.json", stem));
            let plddt = parent.join(format!("plddt_{}.json", stem));
            let confidence = parent.join(format!("confidence_{}.json", stem));
            models.push(PredictedModel {
                name: self.model_label(self.seed, sample),
                seed: self.seed,
                sample,
                structure_path: path,
                scores_path: pae.is_file().then_some(pae),
                plddt_path: plddt.is_file().then_some(plddt),
                summary_path: confidence.is_file().then_some(confidence),
            });
        }
        models.sort_by(|a, b| a.structure_path.cmp(&b.structure_path));
        Ok(models)
    }

    fn raw_score_schema(&self) -> RawScoreSchema {
        RawScoreSchema::PaeMatrixJson
    }

    fn needs_token_reordering(&self) -> bool {
        false
    }

    fn needs_confidence_embedding(&self) -> bool {
        true
    }
}

fn collect_cif_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), EngineError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_cif_files(&path, found)?;
        } else if path.extension().and_then(|extension| extension.to_str()) == Some("cif") {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn scaffold_model(predictions: &Path, job: &str, index: usize, with_plddt: bool) {
        let stem = format!("{}_model_{}", job, index);
        fs::write(predictions.join(format!("{}.cif", stem)), "data_model\n").unwrap();
        fs::write(predictions.join(format!("pae_{}.json", stem)), "{}").unwrap();
        fs::write(predictions.join(format!("confidence_{}.json", stem)), "{}").unwrap();
        if with_plddt {
            fs::write(predictions.join(format!("plddt_{}.json", stem)), "{}").unwrap();
        }
    }

    #[test]
    fn discovery_walks_the_nested_predictions_tree() {
        let dir = tempdir().unwrap();
        let predictions = dir.path().join("boltz_results_job/predictions/job");
        fs::create_dir_all(&predictions).unwrap();
        scaffold_model(&predictions, "job", 1, true);
        scaffold_model(&predictions, "job", 0, false);

        let adapter = BoltzAdapter::new(Some(7));
        let models = adapter.discover(dir.path()).unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "Boltz-1_7_0");
        assert_eq!(models[0].sample, 0);
        assert!(models[0].scores_path.is_some());
        assert!(models[0].plddt_path.is_none());
        assert!(models[0].summary_path.is_some());
        assert_eq!(models[1].name, "Boltz-1_7_1");
        assert!(models[1].plddt_path.is_some());
    }

    #[test]
    fn files_outside_the_model_naming_scheme_are_ignored() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.cif"), "data_x\n").unwrap();
        fs::write(dir.path().join("job_model_two.cif"), "data_x\n").unwrap();

        let models = BoltzAdapter::new(None).discover(dir.path()).unwrap();

        assert!(models.is_empty());
    }

    #[test]
    fn labels_without_a_seed_drop_the_seed_part() {
        let adapter = BoltzAdapter::new(None);
        assert_eq!(adapter.model_label(None, 3), "Boltz-1_3");
        assert_eq!(adapter.model_label(Some(5), 3), "Boltz-1_5_3");
    }
}
