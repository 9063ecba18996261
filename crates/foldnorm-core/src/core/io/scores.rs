use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Failed to read score file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse score file '{path}'")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Score file '{path}' is missing entry '{key}'")]
    MissingKey { path: PathBuf, key: String },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ScoreError> {
    let file = File::open(path).map_err(|e| ScoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| ScoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// The normalized per-model score file.
///
/// Every tool's raw scores are rewritten into this one shape so downstream
/// consumers never need to know which predictor produced a model. Field
/// order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaeScores {
    /// Chain label of every atom, in file order.
    pub atom_chain_ids: Vec<String>,
    /// Per-atom pLDDT, parallel to `atom_chain_ids`.
    pub atom_plddts: Vec<f64>,
    /// Token-by-token contact probabilities (all zeros for tools that do
    /// not produce them).
    pub contact_probs: Vec<Vec<f64>>,
    /// Token-by-token predicted aligned error.
    pub pae: Vec<Vec<f64>>,
    /// Chain label of every token.
    pub token_chain_ids: Vec<String>,
    /// Residue number of every token.
    pub token_res_ids: Vec<isize>,
}

impl PaeScores {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        read_json(path.as_ref())
    }

    /// Writes the scores as 4-space-indented JSON with keys in schema order.
    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ScoreError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ScoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        self.serialize(&mut serializer).map_err(|e| ScoreError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        writer.flush().map_err(|e| ScoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    pub fn token_count(&self) -> usize {
        self.token_res_ids.len()
    }

    pub fn atom_count(&self) -> usize {
        self.atom_chain_ids.len()
    }
}

/// Raw `confidences.json` as written next to each AlphaFold 3 model.
#[derive(Debug, Clone, Deserialize)]
pub struct Af3Confidences {
    pub atom_chain_ids: Vec<String>,
    pub atom_plddts: Vec<f64>,
    pub contact_probs: Vec<Vec<f64>>,
    pub pae: Vec<Vec<f64>>,
    pub token_chain_ids: Vec<String>,
    pub token_res_ids: Vec<isize>,
}

impl Af3Confidences {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        read_json(path.as_ref())
    }
}

/// A single-matrix PAE file (Boltz `pae_*.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct PaeMatrixFile {
    pub pae: Vec<Vec<f64>>,
}

impl PaeMatrixFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        read_json(path.as_ref())
    }
}

/// A per-residue pLDDT file (Boltz `plddt_*.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct PlddtFile {
    pub plddt: Vec<f64>,
}

impl PlddtFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        read_json(path.as_ref())
    }
}

/// A stacked PAE tensor shared by all models of a run (Chai-1
/// `pae_scores.json`), indexed model-major.
#[derive(Debug, Clone, Deserialize)]
pub struct PaeTensorFile {
    pub pae: Vec<Vec<Vec<f64>>>,
}

impl PaeTensorFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        read_json(path.as_ref())
    }

    /// Returns the PAE matrix of one model out of the stack.
    pub fn model_matrix(&self, model_idx: usize, path: &Path) -> Result<&Vec<Vec<f64>>, ScoreError> {
        self.pae.get(model_idx).ok_or_else(|| ScoreError::MissingKey {
            path: path.to_path_buf(),
            key: format!("pae[{}]", model_idx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_scores() -> PaeScores {
        PaeScores {
            atom_chain_ids: vec!["A".into(), "A".into(), "B".into()],
            atom_plddts: vec![91.5, 93.25, 77.0],
            contact_probs: vec![vec![1.0, 0.2], vec![0.2, 1.0]],
            pae: vec![vec![0.8, 5.5], vec![6.1, 0.9]],
            token_chain_ids: vec!["A".into(), "B".into()],
            token_res_ids: vec![1, 1],
        }
    }

    #[test]
    fn canonical_scores_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.json");

        let scores = sample_scores();
        scores.to_path(&path).unwrap();
        let reread = PaeScores::from_path(&path).unwrap();

        assert_eq!(reread, scores);
        assert_eq!(reread.token_count(), 2);
        assert_eq!(reread.atom_count(), 3);
    }

    #[test]
    fn canonical_scores_keep_schema_key_order_and_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.json");
        sample_scores().to_path(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let positions: Vec<usize> = [
            "\"atom_chain_ids\"",
            "\"atom_plddts\"",
            "\"contact_probs\"",
            "\"pae\"",
            "\"token_chain_ids\"",
            "\"token_res_ids\"",
        ]
        .iter()
        .map(|key| text.find(key).expect("key present"))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("    \"atom_chain_ids\""));
    }

    #[test]
    fn raw_boltz_files_parse() {
        let dir = tempdir().unwrap();
        let pae_path = dir.path().join("pae_demo_model_0.json");
        let plddt_path = dir.path().join("plddt_demo_model_0.json");
        std::fs::write(&pae_path, r#"{"pae": [[0.5, 2.0], [2.5, 0.5]]}"#).unwrap();
        std::fs::write(&plddt_path, r#"{"plddt": [0.91, 0.88]}"#).unwrap();

        let pae = PaeMatrixFile::from_path(&pae_path).unwrap();
        assert_eq!(pae.pae.len(), 2);
        let plddt = PlddtFile::from_path(&plddt_path).unwrap();
        assert_eq!(plddt.plddt, vec![0.91, 0.88]);
    }

    #[test]
    fn pae_tensor_indexes_models_and_reports_missing_ones() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pae_scores.json");
        std::fs::write(&path, r#"{"pae": [[[0.0, 1.0], [1.0, 0.0]]]}"#).unwrap();

        let tensor = PaeTensorFile::from_path(&path).unwrap();
        assert_eq!(tensor.model_matrix(0, &path).unwrap().len(), 2);

        let err = tensor.model_matrix(3, &path).unwrap_err();
        match err {
            ScoreError::MissingKey { key, .. } => assert_eq!(key, "pae[3]"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unreadable_and_malformed_files_are_distinguished() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            PaeScores::from_path(&missing).unwrap_err(),
            ScoreError::Io { .. }
        ));

        let garbled = dir.path().join("garbled.json");
        std::fs::write(&garbled, "{not json").unwrap();
        assert!(matches!(
            PaeScores::from_path(&garbled).unwrap_err(),
            ScoreError::Json { .. }
        ));
    }
}
