//! Confidence aggregation over a parsed structure.
//!
//! Prediction tools store per-atom pLDDT values in the temperature factor
//! column. This module rolls those values up into per-residue and per-chain
//! views, the summary H-score, and the banded regions used for plots.
//! Unscored atoms read as zero everywhere except [`plddt_regions`], which
//! keeps them out of every band.

use itertools::Itertools;

use crate::core::models::chain::ChainType;
use crate::core::models::residue::Residue;
use crate::core::models::structure::{LengthMode, Structure};
use crate::engine::error::EngineError;

/// How a polymer residue's confidence is derived from its atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidueConfidenceMethod {
    /// Mean over all atoms of the residue.
    #[default]
    Average,
    /// The value of the `CA` atom. Fails when a residue has none, so this
    /// only suits protein-only complexes.
    AlphaCarbon,
    /// The value of the `P` atom. Fails when a residue has none, so this
    /// only suits nucleic-acid-only complexes.
    Phosphate,
}

/// Confidence band intervals over a flat score sequence.
///
/// Each band holds the inclusive `(start, end)` index ranges of the maximal
/// contiguous runs falling inside it. Scores outside every band, including
/// missing ones, appear in no range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfidenceBands {
    /// Scores in `[0, 50]`.
    pub very_low: Vec<(usize, usize)>,
    /// Scores in `(50, 70)`.
    pub low: Vec<(usize, usize)>,
    /// Scores in `[70, 90)`.
    pub confident: Vec<(usize, usize)>,
    /// Scores in `[90, 100]`.
    pub very_high: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    VeryLow,
    Low,
    Confident,
    VeryHigh,
}

fn band_of(score: f64) -> Option<Band> {
    if (0.0..=50.0).contains(&score) {
        Some(Band::VeryLow)
    } else if score > 50.0 && score < 70.0 {
        Some(Band::Low)
    } else if (70.0..90.0).contains(&score) {
        Some(Band::Confident)
    } else if (90.0..=100.0).contains(&score) {
        Some(Band::VeryHigh)
    } else {
        None
    }
}

/// Returns per-atom confidences grouped by chain, in source-file order.
pub fn per_atom(structure: &Structure) -> Vec<(String, Vec<f64>)> {
    structure
        .chains_iter()
        .map(|(chain_id, chain)| {
            let values = structure
                .chain_atoms(chain_id)
                .map(|(_, atom)| atom.confidence.unwrap_or(0.0))
                .collect();
            (chain.id.clone(), values)
        })
        .collect()
}

/// Returns per-atom confidences for ligand chains only.
pub fn per_ligand(structure: &Structure) -> Vec<(String, Vec<f64>)> {
    structure
        .chains_iter()
        .filter(|(_, chain)| chain.chain_type == ChainType::Ligand)
        .map(|(chain_id, chain)| {
            let values = structure
                .chain_atoms(chain_id)
                .map(|(_, atom)| atom.confidence.unwrap_or(0.0))
                .collect();
            (chain.id.clone(), values)
        })
        .collect()
}

/// Returns per-residue confidences grouped by chain, in source-file order.
///
/// Polymer residues collapse to one value via `method`. Ligand chains emit
/// one value per atom instead, since their "residues" are whole molecules.
///
/// # Errors
///
/// Returns [`EngineError::MissingAtom`] when a one-atom method does not find
/// its atom, and [`EngineError::LengthMismatch`] when a chain's value count
/// disagrees with [`Structure::chain_lengths`]. The latter means bookkeeping
/// upstream is corrupt, so it is never downgraded to a warning.
pub fn per_residue(
    structure: &Structure,
    method: ResidueConfidenceMethod,
) -> Result<Vec<(String, Vec<f64>)>, EngineError> {
    let expected = structure.chain_lengths(LengthMode::Residues, true, false);

    let mut per_chain = Vec::with_capacity(expected.len());
    for (chain_id, chain) in structure.chains_iter() {
        let mut values = Vec::new();
        if chain.chain_type == ChainType::Ligand {
            for (_, atom) in structure.chain_atoms(chain_id) {
                values.push(atom.confidence.unwrap_or(0.0));
            }
        } else {
            for (_, residue) in structure.chain_residues(chain_id) {
                values.push(residue_value(structure, residue, method)?);
            }
        }
        per_chain.push((chain.id.clone(), values));
    }

    for ((label, values), (_, expected_len)) in per_chain.iter().zip(&expected) {
        if values.len() != *expected_len {
            return Err(EngineError::LengthMismatch {
                context: format!("per-residue confidence for chain {}", label),
                expected: *expected_len,
                found: values.len(),
            });
        }
    }

    Ok(per_chain)
}

fn residue_value(
    structure: &Structure,
    residue: &Residue,
    method: ResidueConfidenceMethod,
) -> Result<f64, EngineError> {
    match method {
        ResidueConfidenceMethod::Average => {
            let scores: Vec<f64> = residue
                .atoms()
                .iter()
                .filter_map(|&atom_id| structure.atom(atom_id))
                .map(|atom| atom.confidence.unwrap_or(0.0))
                .collect();
            if scores.is_empty() {
                Ok(0.0)
            } else {
                Ok(scores.iter().sum::<f64>() / scores.len() as f64)
            }
        }
        ResidueConfidenceMethod::AlphaCarbon => anchor_value(structure, residue, "CA"),
        ResidueConfidenceMethod::Phosphate => anchor_value(structure, residue, "P"),
    }
}

fn anchor_value(
    structure: &Structure,
    residue: &Residue,
    atom_name: &str,
) -> Result<f64, EngineError> {
    let atom_id =
        residue
            .get_atom_id_by_name(atom_name)
            .ok_or_else(|| EngineError::MissingAtom {
                residue: format!("{} {}", residue.name, residue.id),
                atom: atom_name.to_string(),
            })?;
    let atom = structure.atom(atom_id).ok_or_else(|| {
        EngineError::Internal(format!("residue names an atom id that does not exist: {}", atom_name))
    })?;
    Ok(atom.confidence.unwrap_or(0.0))
}

/// Returns the mean over the full flattened per-atom confidence sequence.
pub fn average(structure: &Structure) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (chain_id, _) in structure.chains_iter() {
        for (_, atom) in structure.chain_atoms(chain_id) {
            sum += atom.confidence.unwrap_or(0.0);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Computes the H-score of a flat confidence sequence.
///
/// The H-score is the largest threshold `t` in `[1, 100]` such that at least
/// `t` percent of the scores are `>= t`. The scan runs from 100 down to 1
/// and the first qualifying threshold wins; 0 means none qualified.
pub fn h_score(scores: &[f64]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let total = scores.len() as f64;
    for threshold in (1..=100u8).rev() {
        let cutoff = f64::from(threshold);
        let percent_above = scores.iter().filter(|&&score| score >= cutoff).count() as f64
            / total
            * 100.0;
        if percent_above >= cutoff {
            return threshold;
        }
    }
    0
}

/// Buckets a flat score sequence into confidence band ranges.
///
/// Missing scores break runs without joining any band.
pub fn plddt_regions(scores: &[Option<f64>]) -> ConfidenceBands {
    let mut bands = ConfidenceBands::default();

    for (band, chunk) in &scores
        .iter()
        .enumerate()
        .chunk_by(|(_, score)| score.and_then(band_of))
    {
        let Some(band) = band else {
            continue;
        };
        let mut indices = chunk.map(|(index, _)| index);
        let Some(first) = indices.next() else {
            continue;
        };
        let last = indices.last().unwrap_or(first);
        let run = (first, last);
        match band {
            Band::VeryLow => bands.very_low.push(run),
            Band::Low => bands.low.push(run),
            Band::Confident => bands.confident.push(run),
            Band::VeryHigh => bands.very_high.push(run),
        }
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::ids::ChainId;
    use nalgebra::Point3;

    fn add_residue_with_atoms(
        structure: &mut Structure,
        chain: ChainId,
        number: isize,
        name: &str,
        atoms: &[(&str, &str, f64)],
    ) {
        let residue_id = structure.add_residue(chain, number, name).unwrap();
        for (atom_name, element, confidence) in atoms {
            let mut atom = Atom::new(atom_name, element, residue_id, Point3::origin());
            atom.confidence = Some(*confidence);
            structure.add_atom_to_residue(residue_id, atom).unwrap();
        }
    }

    fn protein_and_ligand() -> Structure {
        let mut structure = Structure::new();
        let a = structure.add_chain("A", ChainType::Protein);
        add_residue_with_atoms(&mut structure, a, 1, "GLY", &[("N", "N", 80.0), ("CA", "C", 90.0)]);
        add_residue_with_atoms(&mut structure, a, 2, "ALA", &[("N", "N", 40.0), ("CA", "C", 60.0)]);
        let b = structure.add_chain("B", ChainType::Ligand);
        add_residue_with_atoms(
            &mut structure,
            b,
            1,
            "HEM",
            &[("FE", "FE", 70.0), ("C1", "C", 50.0)],
        );
        structure
    }

    #[test]
    fn per_atom_groups_confidences_by_chain() {
        let structure = protein_and_ligand();

        let per_atom = per_atom(&structure);

        assert_eq!(
            per_atom,
            vec![
                ("A".to_string(), vec![80.0, 90.0, 40.0, 60.0]),
                ("B".to_string(), vec![70.0, 50.0]),
            ]
        );
    }

    #[test]
    fn per_ligand_keeps_only_ligand_chains() {
        let structure = protein_and_ligand();

        let per_ligand = per_ligand(&structure);

        assert_eq!(per_ligand, vec![("B".to_string(), vec![70.0, 50.0])]);
    }

    #[test]
    fn per_residue_averages_polymers_and_expands_ligands() {
        let structure = protein_and_ligand();

        let per_residue = per_residue(&structure, ResidueConfidenceMethod::Average).unwrap();

        assert_eq!(
            per_residue,
            vec![
                ("A".to_string(), vec![85.0, 50.0]),
                ("B".to_string(), vec![70.0, 50.0]),
            ]
        );
    }

    #[test]
    fn per_residue_alpha_carbon_picks_the_ca_atom() {
        let structure = protein_and_ligand();

        let per_residue = per_residue(&structure, ResidueConfidenceMethod::AlphaCarbon).unwrap();

        assert_eq!(per_residue[0], ("A".to_string(), vec![90.0, 60.0]));
    }

    #[test]
    fn per_residue_alpha_carbon_fails_without_a_ca_atom() {
        let mut structure = Structure::new();
        let a = structure.add_chain("A", ChainType::Protein);
        add_residue_with_atoms(&mut structure, a, 1, "GLY", &[("N", "N", 80.0)]);

        let error = per_residue(&structure, ResidueConfidenceMethod::AlphaCarbon).unwrap_err();

        match error {
            EngineError::MissingAtom { residue, atom } => {
                assert_eq!(residue, "GLY 1");
                assert_eq!(atom, "CA");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn per_residue_phosphate_reads_nucleotide_backbones() {
        let mut structure = Structure::new();
        let c = structure.add_chain("C", ChainType::DNA);
        add_residue_with_atoms(&mut structure, c, 1, "DG", &[("P", "P", 77.0), ("C1'", "C", 60.0)]);
        add_residue_with_atoms(&mut structure, c, 2, "DT", &[("P", "P", 81.0)]);

        let per_residue = per_residue(&structure, ResidueConfidenceMethod::Phosphate).unwrap();

        assert_eq!(per_residue, vec![("C".to_string(), vec![77.0, 81.0])]);
    }

    #[test]
    fn average_flattens_all_chains() {
        let structure = protein_and_ligand();

        // (80 + 90 + 40 + 60 + 70 + 50) / 6
        assert_eq!(average(&structure), 65.0);
    }

    #[test]
    fn average_of_an_empty_structure_is_zero() {
        assert_eq!(average(&Structure::new()), 0.0);
    }

    #[test]
    fn h_score_returns_the_highest_self_consistent_threshold() {
        // 3 of 4 scores are >= 75, so t = 75 qualifies and t = 76 does not.
        assert_eq!(h_score(&[95.0, 90.0, 85.0, 10.0]), 75);
    }

    #[test]
    fn h_score_of_a_uniform_sequence_is_its_floor() {
        assert_eq!(h_score(&[87.3, 87.3, 87.3]), 87);
    }

    #[test]
    fn h_score_defaults_to_zero() {
        assert_eq!(h_score(&[]), 0);
        assert_eq!(h_score(&[0.5, 0.2]), 0);
    }

    #[test]
    fn plddt_regions_encodes_contiguous_runs() {
        let scores = [
            Some(95.0),
            Some(92.0),
            Some(60.0),
            None,
            Some(30.0),
            Some(70.0),
            Some(89.9),
            Some(100.0),
        ];

        let bands = plddt_regions(&scores);

        assert_eq!(bands.very_high, vec![(0, 1), (7, 7)]);
        assert_eq!(bands.low, vec![(2, 2)]);
        assert_eq!(bands.very_low, vec![(4, 4)]);
        assert_eq!(bands.confident, vec![(5, 6)]);
    }

    #[test]
    fn plddt_regions_band_edges() {
        let scores = [Some(50.0), Some(50.1), Some(70.0), Some(90.0), Some(100.0)];

        let bands = plddt_regions(&scores);

        assert_eq!(bands.very_low, vec![(0, 0)]);
        assert_eq!(bands.low, vec![(1, 1)]);
        assert_eq!(bands.confident, vec![(2, 2)]);
        assert_eq!(bands.very_high, vec![(3, 4)]);
    }

    #[test]
    fn plddt_regions_ignores_out_of_range_scores() {
        let bands = plddt_regions(&[Some(-1.0), Some(120.0), None]);

        assert_eq!(bands, ConfidenceBands::default());
    }
}
