//! Output discovery for Chai-1 runs.

use std::fs;
use std::path::Path;

use super::{PredictedModel, RawScoreSchema, Tool, ToolAdapter};
use crate::engine::error::EngineError;

/// Adapter for Chai-1's output directory layout.
///
/// Chai-1 writes `pred.model_idx_<n>.cif` and `scores.model_idx_<n>.json`
/// per model into one flat directory, plus a single shared
/// `pae_scores.json` holding the PAE matrices of every model stacked in
/// model index order. Structures embed pLDDT in the temperature factor
/// column already.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chai1Adapter;

impl ToolAdapter for Chai1Adapter {
    fn tool(&self) -> Tool {
        Tool::Chai1
    }

    fn model_label(&self, _seed: Option<u64>, sample: usize) -> String {
        format!("Chai-1_{}", sample)
    }

    fn discover(&self, dir: &Path) -> Result<Vec<PredictedModel>, EngineError> {
        let shared_pae = dir.join("pae_scores.json");
        let mut models = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(index) = file_name
                .strip_prefix("pred.model_idx_")
                .and_then(|rest| rest.strip_suffix(".cif"))
            else {
                continue;
            };
            let Ok(sample) = index.parse::<usize>() else {
                continue;
            };
            let summary = dir.join(format!("scores.model_idx_{}.json", sample));
            models.push(PredictedModel {
                name: self.model_label(None, sample),
                seed: None,
                sample,
                structure_path: path,
                scores_path: shared_pae.is_file().then(|| shared_pae.clone()),
                plddt_path: None,
                summary_path: summary.is_file().then_some(summary),
            });
        }
        models.sort_by_key(|model| model.sample);
        Ok(models)
    }

    fn raw_score_schema(&self) -> RawScoreSchema {
        RawScoreSchema::PaeTensorJson
    }

    fn needs_token_reordering(&self) -> bool {
        false
    }

    fn needs_confidence_embedding(&self) -> bool {
        false
    }
}
