//! Defines error types for prediction normalization operations.

use std::path::PathBuf;

use thiserror::Error;

use super::adapters::Tool;
use super::config::ConfigError;
use crate::core::io::mmcif::MmcifError;
use crate::core::io::scores::ScoreError;

/// Represents errors that can occur during normalization of prediction
/// outputs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An error occurred while reading or writing a structure file.
    #[error("Structure file handling failed: {source}")]
    Structure {
        #[from]
        source: MmcifError,
    },

    /// An error occurred while reading or writing a score file.
    #[error("Score file handling failed: {source}")]
    Scores {
        #[from]
        source: ScoreError,
    },

    /// A filesystem operation outside of a specific file format failed.
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a clash report failed.
    #[error("Failed to write clash report: {source}")]
    Report {
        #[from]
        source: csv::Error,
    },

    /// The model does not have the chain count the complex description
    /// requires, so no chain can be renamed safely.
    #[error("Chain relabeling expected {expected} chains but the model contains {found}")]
    RelabelCountMismatch { expected: usize, found: usize },

    /// A requested chain order is not a permutation of the chains present.
    #[error("Invalid chain reorder: {0}")]
    ChainReorder(String),

    /// Two collections that must describe the same items disagree in size.
    #[error("Length mismatch in {context}: expected {expected}, found {found}")]
    LengthMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    /// A residue lacks an atom a calculation requires.
    #[error("Residue '{residue}' has no atom named '{atom}'")]
    MissingAtom { residue: String, atom: String },

    /// No prediction models were found where the tool should have left them.
    #[error("No {tool} models found under '{path}'")]
    NoModels { tool: Tool, path: PathBuf },

    /// The normalization configuration is invalid.
    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    /// An internal logic error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}
