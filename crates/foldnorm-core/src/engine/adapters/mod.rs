//! Tool adapters bridging external predictors to the normalization engine.
//!
//! ## Overview
//!
//! Every supported prediction tool writes a different directory layout and a
//! different raw score format, but the normalization pipeline itself is tool
//! agnostic. A [`ToolAdapter`] captures the per-tool knowledge: where models
//! live on disk, how they are named, which score schema accompanies them,
//! and which normalization steps the tool's output actually needs. The
//! workflow is written once against the trait and parameterized with one
//! adapter per run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::engine::error::EngineError;

pub mod alphafold3;
pub mod boltz;
pub mod chai;

pub use alphafold3::Alphafold3Adapter;
pub use boltz::BoltzAdapter;
pub use chai::Chai1Adapter;

/// The external prediction tools with a supported adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Alphafold3,
    Boltz,
    Chai1,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Tool::Alphafold3 => "AlphaFold3",
                Tool::Boltz => "Boltz",
                Tool::Chai1 => "Chai-1",
            }
        )
    }
}

#[derive(Debug, Error)]
#[error("Unknown prediction tool '{0}'")]
pub struct ParseToolError(String);

impl FromStr for Tool {
    type Err = ParseToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alphafold3" | "af3" => Ok(Tool::Alphafold3),
            "boltz" | "boltz-1" | "boltz1" => Ok(Tool::Boltz),
            "chai" | "chai-1" | "chai1" => Ok(Tool::Chai1),
            other => Err(ParseToolError(other.to_string())),
        }
    }
}

/// The shape of the raw score file a tool writes next to its models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawScoreSchema {
    /// One JSON object per model carrying PAE, contact probabilities, and
    /// token metadata.
    ConfidenceJson,
    /// One JSON file per model holding a bare PAE matrix.
    PaeMatrixJson,
    /// One shared JSON file holding a model-major stack of PAE matrices.
    PaeTensorJson,
}

/// One predicted model found on disk, before any processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedModel {
    /// Stable display name, unique within one run.
    pub name: String,
    /// The sampling seed, for tools that encode one.
    pub seed: Option<u64>,
    /// The sample or model index within the seed.
    pub sample: usize,
    /// The structure file.
    pub structure_path: PathBuf,
    /// The raw PAE score file, following [`ToolAdapter::raw_score_schema`].
    pub scores_path: Option<PathBuf>,
    /// A separate per-token pLDDT file, for tools that do not embed
    /// confidence into the structure.
    pub plddt_path: Option<PathBuf>,
    /// The per-model summary metrics file, kept alongside the normalized
    /// output untouched.
    pub summary_path: Option<PathBuf>,
}

/// Per-tool knowledge the normalization workflow is parameterized with.
pub trait ToolAdapter {
    /// The tool this adapter handles.
    fn tool(&self) -> Tool;

    /// Builds the display name for a model of this tool.
    fn model_label(&self, seed: Option<u64>, sample: usize) -> String;

    /// Finds every predicted model below `dir`, sorted deterministically.
    ///
    /// Files and directories that do not match the tool's naming scheme are
    /// ignored; an empty result is not an error at this level.
    fn discover(&self, dir: &Path) -> Result<Vec<PredictedModel>, EngineError>;

    /// The score file shape [`PredictedModel::scores_path`] points at.
    fn raw_score_schema(&self) -> RawScoreSchema;

    /// Whether the tool's native token order differs from the canonical
    /// chain order, requiring a PAE matrix permutation.
    fn needs_token_reordering(&self) -> bool;

    /// Whether per-token confidence must be read from
    /// [`PredictedModel::plddt_path`] and embedded into the structure.
    fn needs_confidence_embedding(&self) -> bool;
}
