//! Embeds externally supplied confidence values into a structure.
//!
//! Some tools leave the temperature factor column empty and ship pLDDT as a
//! flat per-token array in a side file. The array follows the structure's
//! token layout: one value per polymer residue, one per atom for ligand
//! chains and for modified polymer residues. Broadcasting those values onto
//! the atoms gives every downstream consumer the same per-atom view the
//! other tools produce natively.

use tracing::{debug, info, instrument};

use crate::core::models::chain::ChainType;
use crate::core::models::ids::AtomId;
use crate::core::models::structure::{LengthMode, Structure};
use crate::core::utils::residues::is_standard_residue;
use crate::engine::error::EngineError;

/// Writes per-token confidence values onto the structure's atoms.
///
/// Values on a `[0, 1]` scale are rescaled to `[0, 100]` first, keyed off
/// the array maximum.
///
/// # Errors
///
/// Returns [`EngineError::LengthMismatch`] when the array length does not
/// match the structure's token count. A partial embedding would silently
/// attach scores to the wrong atoms, so nothing is written in that case.
#[instrument(skip_all, name = "embed_confidence_task")]
pub fn run(structure: &mut Structure, plddts: &[f64]) -> Result<(), EngineError> {
    let expected: usize = structure
        .chain_lengths(LengthMode::Residues, true, true)
        .iter()
        .map(|(_, length)| *length)
        .sum();
    if plddts.len() != expected {
        return Err(EngineError::LengthMismatch {
            context: "confidence embedding tokens".to_string(),
            expected,
            found: plddts.len(),
        });
    }

    let maximum = plddts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale = if maximum <= 1.0 { 100.0 } else { 1.0 };
    if scale != 1.0 {
        debug!("Confidence values are fractional; rescaling to percent.");
    }

    // Resolve every atom's value before mutating anything.
    let mut assignments: Vec<(AtomId, f64)> = Vec::with_capacity(structure.atom_count());
    let mut cursor = 0usize;
    for (chain_id, chain) in structure.chains_iter() {
        let ligand_chain = chain.chain_type == ChainType::Ligand;
        let polymer_chain = matches!(
            chain.chain_type,
            ChainType::Protein | ChainType::DNA | ChainType::RNA
        );
        for (_, residue) in structure.chain_residues(chain_id) {
            let per_atom = ligand_chain || (polymer_chain && !is_standard_residue(&residue.name));
            if per_atom {
                for &atom_id in residue.atoms() {
                    assignments.push((atom_id, plddts[cursor] * scale));
                    cursor += 1;
                }
            } else {
                let value = plddts[cursor] * scale;
                cursor += 1;
                for &atom_id in residue.atoms() {
                    assignments.push((atom_id, value));
                }
            }
        }
    }

    for (atom_id, value) in assignments {
        if let Some(atom) = structure.atom_mut(atom_id) {
            atom.confidence = Some(value);
        }
    }

    info!(tokens = expected, "Embedded confidence values.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::ids::ChainId;
    use nalgebra::Point3;

    fn add_residue(
        structure: &mut Structure,
        chain: ChainId,
        number: isize,
        name: &str,
        atom_names: &[&str],
    ) {
        let residue_id = structure.add_residue(chain, number, name).unwrap();
        for atom_name in atom_names {
            let atom = Atom::new(atom_name, "C", residue_id, Point3::origin());
            structure.add_atom_to_residue(residue_id, atom).unwrap();
        }
    }

    fn mixed_structure() -> Structure {
        let mut structure = Structure::new();
        let a = structure.add_chain("A", ChainType::Protein);
        add_residue(&mut structure, a, 1, "GLY", &["N", "CA"]);
        add_residue(&mut structure, a, 2, "SEP", &["N", "CA"]);
        let b = structure.add_chain("B", ChainType::Ligand);
        add_residue(&mut structure, b, 1, "HEM", &["C1", "C2", "C3"]);
        structure
    }

    fn confidences(structure: &Structure) -> Vec<Option<f64>> {
        let mut values = Vec::new();
        for (chain_id, _) in structure.chains_iter() {
            for (_, atom) in structure.chain_atoms(chain_id) {
                values.push(atom.confidence);
            }
        }
        values
    }

    #[test]
    fn broadcasts_residue_values_and_consumes_per_atom_tokens() {
        // Tokens: GLY (1), SEP per atom (2), ligand per atom (3).
        let mut structure = mixed_structure();

        run(&mut structure, &[0.9, 0.8, 0.7, 0.6, 0.5, 0.4]).unwrap();

        assert_eq!(
            confidences(&structure),
            vec![
                Some(90.0),
                Some(90.0),
                Some(80.0),
                Some(70.0),
                Some(60.0),
                Some(50.0),
                Some(40.0),
            ]
        );
    }

    #[test]
    fn percent_scale_values_are_not_rescaled() {
        let mut structure = Structure::new();
        let a = structure.add_chain("A", ChainType::Protein);
        add_residue(&mut structure, a, 1, "GLY", &["CA"]);

        run(&mut structure, &[87.5]).unwrap();

        assert_eq!(confidences(&structure), vec![Some(87.5)]);
    }

    #[test]
    fn token_count_mismatch_embeds_nothing() {
        let mut structure = mixed_structure();

        let error = run(&mut structure, &[0.9, 0.8]).unwrap_err();

        match error {
            EngineError::LengthMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, 6);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(confidences(&structure).iter().all(Option::is_none));
    }
}
