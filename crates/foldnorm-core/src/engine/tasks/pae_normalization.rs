//! Normalization of raw pairwise-error output into the canonical schema.
//!
//! Every tool ships a PAE matrix, but each one keys it differently: some
//! include contact probabilities and their own token ordering, others emit a
//! bare matrix. Normalization rebuilds all metadata arrays from the already
//! relabeled structure, permutes the matrix into canonical token order when
//! the tool's native order differs, and synthesizes a zero contact matrix
//! when none was produced, so every model ends up with an identical
//! [`PaeScores`] layout.

use std::collections::HashMap;
use std::collections::VecDeque;

use tracing::{debug, info, instrument};

use crate::core::io::scores::PaeScores;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;

/// The raw score content a tool adapter extracted for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPaeInput {
    /// The square pairwise error matrix, in the tool's native token order.
    pub pae: Vec<Vec<f64>>,
    /// The contact probability matrix, when the tool produces one.
    pub contact_probs: Option<Vec<Vec<f64>>>,
    /// The tool's native token-to-chain assignment. When present and
    /// different from the canonical order, rows and columns are permuted.
    pub native_token_chain_ids: Option<Vec<String>>,
}

/// Converts one model's raw PAE output into the canonical schema.
///
/// The structure must already carry canonical chain labels; every metadata
/// array is regenerated from it rather than trusted from the tool.
///
/// # Errors
///
/// Returns [`EngineError::LengthMismatch`] when the matrix dimensions or the
/// native token list disagree with the structure's token count, or when the
/// native order does not cover some canonical chain's tokens.
#[instrument(skip_all, name = "pae_normalization_task")]
pub fn normalize(structure: &Structure, raw: RawPaeInput) -> Result<PaeScores, EngineError> {
    let (token_chain_ids, token_res_ids) = token_metadata(structure);
    let token_count = token_chain_ids.len();

    check_matrix(&raw.pae, token_count, "PAE matrix")?;
    if let Some(contact_probs) = &raw.contact_probs {
        check_matrix(contact_probs, token_count, "contact probability matrix")?;
    }

    let permutation = match &raw.native_token_chain_ids {
        Some(native) => Some(token_permutation(&token_chain_ids, native)?),
        None => None,
    };

    let pae = match &permutation {
        Some(permutation) => {
            debug!("Permuting PAE rows and columns into canonical token order.");
            permute_matrix(&raw.pae, permutation)
        }
        None => raw.pae,
    };
    let contact_probs = match (raw.contact_probs, &permutation) {
        (Some(matrix), Some(permutation)) => permute_matrix(&matrix, permutation),
        (Some(matrix), None) => matrix,
        // Tools without contact output get an all-zero matrix so the schema
        // stays uniform.
        (None, _) => vec![vec![0.0; token_count]; token_count],
    };

    let (atom_chain_ids, atom_plddts) = atom_metadata(structure);

    info!(
        tokens = token_count,
        atoms = atom_chain_ids.len(),
        reordered = permutation.is_some(),
        "Normalized PAE scores."
    );

    Ok(PaeScores {
        atom_chain_ids,
        atom_plddts,
        contact_probs,
        pae,
        token_chain_ids,
        token_res_ids,
    })
}

fn token_metadata(structure: &Structure) -> (Vec<String>, Vec<isize>) {
    let mut token_chain_ids = Vec::new();
    let mut token_res_ids = Vec::new();
    for (label, residue_ids) in structure.token_residue_ids() {
        for residue_id in residue_ids {
            token_chain_ids.push(label.clone());
            token_res_ids.push(residue_id);
        }
    }
    (token_chain_ids, token_res_ids)
}

fn atom_metadata(structure: &Structure) -> (Vec<String>, Vec<f64>) {
    let mut atom_chain_ids = Vec::with_capacity(structure.atom_count());
    let mut atom_plddts = Vec::with_capacity(structure.atom_count());
    for (chain_id, chain) in structure.chains_iter() {
        for (_, atom) in structure.chain_atoms(chain_id) {
            atom_chain_ids.push(chain.id.clone());
            atom_plddts.push(atom.confidence.unwrap_or(0.0));
        }
    }
    (atom_chain_ids, atom_plddts)
}

fn check_matrix(matrix: &[Vec<f64>], token_count: usize, what: &str) -> Result<(), EngineError> {
    if matrix.len() != token_count {
        return Err(EngineError::LengthMismatch {
            context: format!("{} rows", what),
            expected: token_count,
            found: matrix.len(),
        });
    }
    for row in matrix {
        if row.len() != token_count {
            return Err(EngineError::LengthMismatch {
                context: format!("{} row width", what),
                expected: token_count,
                found: row.len(),
            });
        }
    }
    Ok(())
}

/// Builds the permutation mapping canonical token positions to native ones.
///
/// Tokens of the same chain keep their native relative order; each canonical
/// token greedily takes the next unused native token of its chain.
fn token_permutation(
    canonical: &[String],
    native: &[String],
) -> Result<Vec<usize>, EngineError> {
    if native.len() != canonical.len() {
        return Err(EngineError::LengthMismatch {
            context: "native token chain list".to_string(),
            expected: canonical.len(),
            found: native.len(),
        });
    }

    let mut native_positions: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (position, label) in native.iter().enumerate() {
        native_positions
            .entry(label.as_str())
            .or_default()
            .push_back(position);
    }

    let mut permutation = Vec::with_capacity(canonical.len());
    for label in canonical {
        let position = native_positions
            .get_mut(label.as_str())
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| EngineError::LengthMismatch {
                context: format!("native tokens for chain {}", label),
                expected: canonical.iter().filter(|l| *l == label).count(),
                found: native.iter().filter(|l| *l == label).count(),
            })?;
        permutation.push(position);
    }
    Ok(permutation)
}

fn permute_matrix(matrix: &[Vec<f64>], permutation: &[usize]) -> Vec<Vec<f64>> {
    permutation
        .iter()
        .map(|&row| {
            permutation
                .iter()
                .map(|&column| matrix[row][column])
                .collect()
        })
        .collect()
}
