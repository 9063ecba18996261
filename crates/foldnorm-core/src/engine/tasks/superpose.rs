//! Rigid-body superposition of sibling models onto a reference.
//!
//! Models of the same complex land in arbitrary frames, which makes visual
//! comparison useless. This task pairs backbone anchor atoms (CA for amino
//! acids, C1' for nucleotides) between matching residues, fits the optimal
//! rotation and translation, and moves every atom of the mobile structure.

use nalgebra::Point3;
use tracing::{debug, instrument, warn};

use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{calculate_rmsd, superpose};
use crate::core::utils::residues::{is_standard_amino_acid, is_standard_nucleotide};

/// Superposes `mobile` onto `reference` in place.
///
/// Residues are matched by chain label and residue number; residues without
/// a backbone anchor (ligands among them) do not constrain the fit but move
/// with the rest of their structure.
///
/// Returns whether a transform was applied. Structures that share no anchor
/// pairs, or whose anchors are geometrically degenerate, are left in place
/// with a warning instead of failing the model.
#[instrument(skip_all, name = "superpose_task")]
pub fn run(reference: &Structure, mobile: &mut Structure) -> bool {
    let (reference_points, mobile_points) = anchor_pairs(reference, mobile);
    if reference_points.is_empty() {
        warn!("No shared backbone anchors; leaving the model in its native frame");
        return false;
    }

    let Some(transform) = superpose(&reference_points, &mobile_points) else {
        warn!("Superposition fit failed; leaving the model in its native frame");
        return false;
    };

    for (_, atom) in mobile.atoms_iter_mut() {
        atom.position = transform.apply(&atom.position);
    }

    let fitted: Vec<Point3<f64>> = mobile_points
        .iter()
        .map(|point| transform.apply(point))
        .collect();
    if let Some(rmsd) = calculate_rmsd(&reference_points, &fitted) {
        debug!(anchors = reference_points.len(), rmsd, "Superposed model.");
    }
    true
}

fn anchor_pairs(reference: &Structure, mobile: &Structure) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
    let mut reference_points = Vec::new();
    let mut mobile_points = Vec::new();

    for (mobile_chain_id, mobile_chain) in mobile.chains_iter() {
        let reference_chain_id = match reference.find_chain_by_label(&mobile_chain.id) {
            Some(id) => id,
            None => continue,
        };
        for (_, mobile_residue) in mobile.chain_residues(mobile_chain_id) {
            let anchor = if is_standard_amino_acid(&mobile_residue.name) {
                "CA"
            } else if is_standard_nucleotide(&mobile_residue.name) {
                "C1'"
            } else {
                continue;
            };
            let Some(reference_residue) = reference
                .find_residue_by_id(reference_chain_id, mobile_residue.id)
                .and_then(|id| reference.residue(id))
            else {
                continue;
            };
            if reference_residue.name != mobile_residue.name {
                continue;
            }
            let mobile_atom = mobile_residue
                .get_atom_id_by_name(anchor)
                .and_then(|id| mobile.atom(id));
            let reference_atom = reference_residue
                .get_atom_id_by_name(anchor)
                .and_then(|id| reference.atom(id));
            if let (Some(mobile_atom), Some(reference_atom)) = (mobile_atom, reference_atom) {
                mobile_points.push(mobile_atom.position);
                reference_points.push(reference_atom.position);
            }
        }
    }

    (reference_points, mobile_points)
}
