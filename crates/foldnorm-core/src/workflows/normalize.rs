//! The end-to-end normalization workflow for one tool's output directory.
//!
//! ## Overview
//!
//! A run discovers every model the tool produced, pushes each one through
//! the normalization tasks, superposes siblings onto the first successful
//! model, and either persists the canonical artifacts or hands them back in
//! memory. One corrupt model never stops its siblings: failures are logged,
//! recorded on the report, and skipped.
//!
//! ## Pipeline
//!
//! Per model: parse the structure, relabel and reorder chains against the
//! complex description, classify chains, embed side-file confidence when the
//! tool needs it, detect clashes, and normalize the raw PAE scores. The
//! relabeled structure is the source of truth for every score metadata
//! array, so ordering bugs surface as hard length mismatches rather than
//! silently misassigned scores.

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::core::input::descriptor::ComplexDescriptor;
use crate::core::io::mmcif::{MmcifFile, MmcifMetadata};
use crate::core::io::scores::{Af3Confidences, PaeMatrixFile, PaeScores, PaeTensorFile, PlddtFile};
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::adapters::{PredictedModel, RawScoreSchema, ToolAdapter};
use crate::engine::classify::ChainClassifier;
use crate::engine::config::{NormalizationConfig, OutputMode};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::clash_detection::{self, ClashReport};
use crate::engine::tasks::pae_normalization::{self, RawPaeInput};
use crate::engine::tasks::{embed_confidence, relabel, superpose};

/// Where one persisted model's artifacts ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPaths {
    pub structure: PathBuf,
    pub scores: Option<PathBuf>,
    pub clashes: PathBuf,
}

/// One fully normalized model.
#[derive(Debug)]
pub struct ProcessedModel {
    /// The model as discovered on disk.
    pub model: PredictedModel,
    /// The relabeled, classified structure.
    pub structure: Structure,
    /// The canonical scores, when the tool shipped a raw score file.
    pub scores: Option<PaeScores>,
    /// The clash detection result.
    pub clashes: ClashReport,
    /// Whether the model was superposed onto the run's reference model.
    pub superposed: bool,
    /// Artifact locations, when the run persisted them.
    pub output: Option<NormalizedPaths>,
}

/// The outcome of one normalization run.
#[derive(Debug)]
pub struct NormalizationReport {
    /// Successfully normalized models, in discovery order.
    pub models: Vec<ProcessedModel>,
    /// Models that failed, with the error that stopped each one.
    pub failed: Vec<(String, EngineError)>,
}

/// Runs the full normalization workflow over one tool's output directory.
///
/// # Arguments
///
/// * `adapter` - The adapter for the tool that produced the output.
/// * `input_dir` - The tool's output directory.
/// * `output_dir` - Where normalized artifacts are written in persist mode.
/// * `descriptor` - The complex description the job was submitted with.
///   Without it chains keep their tool-assigned labels and types.
/// * `config` - Run configuration.
/// * `reporter` - Callback handler for progress events.
///
/// # Errors
///
/// Returns an error when no models are found or the output directory cannot
/// be created. Per-model failures do not fail the run; they are collected on
/// the report instead.
#[instrument(skip_all, name = "normalize_workflow")]
pub fn run<A>(
    adapter: &A,
    input_dir: &Path,
    output_dir: &Path,
    descriptor: Option<&ComplexDescriptor>,
    config: &NormalizationConfig,
    reporter: &ProgressReporter,
) -> Result<NormalizationReport, EngineError>
where
    A: ToolAdapter + Sync,
{
    info!(tool = %adapter.tool(), input = %input_dir.display(), "Starting normalization workflow.");

    // === Phase 1: Model Discovery ===
    reporter.report(Progress::PhaseStart { name: "Discovery" });
    let models = adapter.discover(input_dir)?;
    if models.is_empty() {
        return Err(EngineError::NoModels {
            tool: adapter.tool(),
            path: input_dir.to_path_buf(),
        });
    }
    info!(models = models.len(), "Discovered prediction models.");
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Per-Model Normalization ===
    reporter.report(Progress::PhaseStart {
        name: "Normalization",
    });
    reporter.report(Progress::TaskStart {
        total_steps: models.len() as u64,
    });

    #[cfg(feature = "parallel")]
    let model_iter = models.into_par_iter();
    #[cfg(not(feature = "parallel"))]
    let model_iter = models.into_iter();

    let results: Vec<(PredictedModel, Result<ProcessedModel, EngineError>)> = model_iter
        .map(|model| {
            reporter.report(Progress::StatusUpdate {
                text: model.name.clone(),
            });
            let outcome = process_model(adapter, &model, descriptor, config, reporter);
            reporter.report(Progress::TaskIncrement);
            (model, outcome)
        })
        .collect();
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let mut processed = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (model, outcome) in results {
        match outcome {
            Ok(done) => processed.push(done),
            Err(error) => {
                warn!(
                    tool = %adapter.tool(),
                    model = %model.name,
                    error = %error,
                    "Skipping model that failed to normalize."
                );
                failed.push((model.name, error));
            }
        }
    }

    // === Phase 3: Superposition ===
    if config.superpose && processed.len() > 1 {
        reporter.report(Progress::PhaseStart {
            name: "Superposition",
        });
        if let Some((reference, siblings)) = processed.split_first_mut() {
            for sibling in siblings {
                sibling.superposed = superpose::run(&reference.structure, &mut sibling.structure);
            }
        }
        reporter.report(Progress::PhaseFinish);
    }

    // === Phase 4: Serialization ===
    if config.output_mode == OutputMode::Persist {
        reporter.report(Progress::PhaseStart {
            name: "Serialization",
        });
        fs::create_dir_all(output_dir)?;
        let mut persisted = Vec::with_capacity(processed.len());
        for mut model in processed {
            match persist_model(&mut model, output_dir) {
                Ok(()) => persisted.push(model),
                Err(error) => {
                    warn!(
                        model = %model.model.name,
                        error = %error,
                        "Skipping model that failed to persist."
                    );
                    failed.push((model.model.name.clone(), error));
                }
            }
        }
        processed = persisted;
        reporter.report(Progress::PhaseFinish);
    }

    info!(
        normalized = processed.len(),
        failed = failed.len(),
        "Normalization workflow finished."
    );
    Ok(NormalizationReport {
        models: processed,
        failed,
    })
}

fn process_model<A: ToolAdapter>(
    adapter: &A,
    model: &PredictedModel,
    descriptor: Option<&ComplexDescriptor>,
    config: &NormalizationConfig,
    reporter: &ProgressReporter,
) -> Result<ProcessedModel, EngineError> {
    let (mut structure, _) = MmcifFile::read_from_path(&model.structure_path)?;

    if let Some(descriptor) = descriptor {
        let layout = descriptor.chain_layout();
        let plan = relabel::plan(&structure.chain_labels(), &layout)?;
        structure = relabel::apply(&structure, &plan)?;
        relabel::reorder(&mut structure, &plan.target_labels())?;
    }

    ChainClassifier::new(descriptor).annotate(&mut structure);

    if adapter.needs_confidence_embedding() {
        match &model.plddt_path {
            Some(path) => {
                let plddt = PlddtFile::from_path(path)?;
                embed_confidence::run(&mut structure, &plddt.plddt)?;
            }
            None => {
                warn!(model = %model.name, "No pLDDT file found; structure confidence stays unset.");
            }
        }
    }

    let clashes = clash_detection::run(&structure, &config.clash, reporter)?;
    let scores = load_and_normalize_scores(adapter, model, &structure)?;

    Ok(ProcessedModel {
        model: model.clone(),
        structure,
        scores,
        clashes,
        superposed: false,
        output: None,
    })
}

fn load_and_normalize_scores<A: ToolAdapter>(
    adapter: &A,
    model: &PredictedModel,
    structure: &Structure,
) -> Result<Option<PaeScores>, EngineError> {
    let Some(scores_path) = &model.scores_path else {
        warn!(model = %model.name, "No raw score file found; PAE output is skipped.");
        return Ok(None);
    };

    let raw = match adapter.raw_score_schema() {
        RawScoreSchema::ConfidenceJson => {
            let confidences = Af3Confidences::from_path(scores_path)?;
            RawPaeInput {
                pae: confidences.pae,
                contact_probs: Some(confidences.contact_probs),
                native_token_chain_ids: adapter
                    .needs_token_reordering()
                    .then_some(confidences.token_chain_ids),
            }
        }
        RawScoreSchema::PaeMatrixJson => {
            let matrix = PaeMatrixFile::from_path(scores_path)?;
            RawPaeInput {
                pae: matrix.pae,
                contact_probs: None,
                native_token_chain_ids: None,
            }
        }
        RawScoreSchema::PaeTensorJson => {
            let tensor = PaeTensorFile::from_path(scores_path)?;
            let matrix = tensor.model_matrix(model.sample, scores_path)?.clone();
            RawPaeInput {
                pae: matrix,
                contact_probs: None,
                native_token_chain_ids: None,
            }
        }
    };

    pae_normalization::normalize(structure, raw).map(Some)
}

fn persist_model(model: &mut ProcessedModel, output_dir: &Path) -> Result<(), EngineError> {
    let structure_path = output_dir.join(format!("{}.cif", model.model.name));
    let metadata = MmcifMetadata {
        block_name: model.model.name.clone(),
    };
    MmcifFile::write_to_path(&model.structure, &metadata, &structure_path)?;

    // The emitted file must parse back with identical bookkeeping.
    let (reread, _) = MmcifFile::read_from_path(&structure_path)?;
    if reread.atom_count() != model.structure.atom_count()
        || reread.chain_labels() != model.structure.chain_labels()
    {
        return Err(EngineError::Internal(format!(
            "normalized structure '{}' did not survive a write-read round trip",
            model.model.name
        )));
    }

    let scores_path = match &model.scores {
        Some(scores) => {
            let path = output_dir.join(format!("{}_pae.json", model.model.name));
            scores.to_path(&path)?;
            Some(path)
        }
        None => None,
    };

    let clashes_path = output_dir.join(format!("{}_clashes.csv", model.model.name));
    let file = fs::File::create(&clashes_path)?;
    model.clashes.write_csv(file)?;

    model.output = Some(NormalizedPaths {
        structure: structure_path,
        scores: scores_path,
        clashes: clashes_path,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::adapters::Alphafold3Adapter;
    use crate::engine::config::OutputMode;
    use std::fs;
    use tempfile::tempdir;

    const FIXTURE_CIF: &str = "\
data_fixture
#
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_entity_id
_atom_site.label_seq_id
_atom_site.pdbx_PDB_ins_code
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.auth_seq_id
_atom_site.auth_asym_id
_atom_site.pdbx_PDB_model_num
ATOM 1 N N . GLY A 1 1 ? 0.000 0.000 0.000 1.00 90.00 1 A 1
ATOM 2 C CA . GLY A 1 1 ? 1.500 0.000 0.000 1.00 92.00 1 A 1
ATOM 3 C CA . ALA A 1 2 ? 3.800 0.000 0.000 1.00 88.00 2 A 1
HETATM 4 C C1 . LIG B 2 . ? 10.000 0.000 0.000 1.00 70.00 1 B 1
HETATM 5 C C2 . LIG B 2 . ? 11.000 0.000 0.000 1.00 72.00 1 B 1
#
";

    const DESCRIPTION_JSON: &str = r#"{
        "sequences": [
            { "protein": { "id": "A", "sequence": "GA" } },
            { "ligand": { "id": "B", "ccdCodes": ["LIG"] } }
        ]
    }"#;

    fn confidences_json() -> String {
        let pae: Vec<Vec<f64>> = (0..4)
            .map(|row| (0..4).map(|col| (row * 4 + col) as f64).collect())
            .collect();
        serde_json::json!({
            "atom_chain_ids": ["A", "A", "A", "B", "B"],
            "atom_plddts": [90.0, 92.0, 88.0, 70.0, 72.0],
            "contact_probs": pae,
            "pae": pae,
            "token_chain_ids": ["A", "A", "B", "B"],
            "token_res_ids": [1, 2, 1, 1]
        })
        .to_string()
    }

    fn scaffold_af3_sample(root: &Path, seed: u64, sample: usize, cif: &str) {
        let dir = root.join(format!("seed-{}_sample-{}", seed, sample));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.cif"), cif).unwrap();
        fs::write(dir.join("confidences.json"), confidences_json()).unwrap();
    }

    fn descriptor() -> ComplexDescriptor {
        ComplexDescriptor::from_json_str(DESCRIPTION_JSON, Path::new("input.json")).unwrap()
    }

    fn config(mode: OutputMode) -> NormalizationConfig {
        NormalizationConfig::builder()
            .output_mode(mode)
            .build()
            .unwrap()
    }

    #[test]
    fn a_persisting_run_normalizes_every_model_and_writes_artifacts() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        scaffold_af3_sample(input.path(), 1, 0, FIXTURE_CIF);
        scaffold_af3_sample(input.path(), 1, 1, FIXTURE_CIF);
        let descriptor = descriptor();

        let report = run(
            &Alphafold3Adapter,
            input.path(),
            output.path(),
            Some(&descriptor),
            &config(OutputMode::Persist),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.models.len(), 2);
        assert!(report.failed.is_empty());

        let first = &report.models[0];
        assert_eq!(first.model.name, "Alphafold3_1_0");
        assert_eq!(first.structure.chain_labels(), vec!["A", "B"]);
        let scores = first.scores.as_ref().unwrap();
        assert_eq!(scores.token_chain_ids, vec!["A", "A", "B", "B"]);
        assert_eq!(scores.atom_plddts, vec![90.0, 92.0, 88.0, 70.0, 72.0]);

        let paths = first.output.as_ref().unwrap();
        assert!(paths.structure.is_file());
        assert!(paths.scores.as_ref().unwrap().is_file());
        assert!(paths.clashes.is_file());

        // Identical sibling models superpose trivially onto the first.
        assert!(!report.models[0].superposed);
        assert!(report.models[1].superposed);

        let (reread, metadata) = MmcifFile::read_from_path(&paths.structure).unwrap();
        assert_eq!(metadata.block_name, "Alphafold3_1_0");
        assert_eq!(reread.atom_count(), 5);
    }

    #[test]
    fn an_in_memory_run_leaves_the_filesystem_untouched() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        scaffold_af3_sample(input.path(), 1, 0, FIXTURE_CIF);
        let descriptor = descriptor();

        let report = run(
            &Alphafold3Adapter,
            input.path(),
            output.path(),
            Some(&descriptor),
            &config(OutputMode::InMemoryOnly),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.models.len(), 1);
        assert!(report.models[0].output.is_none());
        assert!(report.models[0].scores.is_some());
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[test]
    fn a_corrupt_model_is_skipped_and_siblings_continue() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        scaffold_af3_sample(input.path(), 1, 0, FIXTURE_CIF);
        scaffold_af3_sample(input.path(), 1, 1, "data_broken\n# no atoms\n");
        let descriptor = descriptor();

        let report = run(
            &Alphafold3Adapter,
            input.path(),
            output.path(),
            Some(&descriptor),
            &config(OutputMode::Persist),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.models.len(), 1);
        assert_eq!(report.models[0].model.name, "Alphafold3_1_0");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Alphafold3_1_1");
    }

    #[test]
    fn an_empty_input_directory_is_an_error() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();

        let error = run(
            &Alphafold3Adapter,
            input.path(),
            output.path(),
            None,
            &config(OutputMode::Persist),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert!(matches!(error, EngineError::NoModels { .. }));
    }

    #[test]
    fn without_a_description_chains_keep_their_tool_labels() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        scaffold_af3_sample(input.path(), 1, 0, FIXTURE_CIF);

        let report = run(
            &Alphafold3Adapter,
            input.path(),
            output.path(),
            None,
            &config(OutputMode::InMemoryOnly),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.models.len(), 1);
        assert_eq!(report.models[0].structure.chain_labels(), vec!["A", "B"]);
    }
}
