//! Chain relabeling against the canonical chain layout.
//!
//! Tools assign their own chain identifiers, and they render a multi-part
//! ligand as several physical chains where the complex description declares
//! one entity. Relabeling walks the model's chains and the canonical layout
//! in lockstep, renaming one-for-one and folding the extra chains of every
//! split ligand back under its declared label. This is the only place that
//! difference between tool output and description is reconciled.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::core::input::descriptor::ChainLayout;
use crate::core::models::ids::ChainId;
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;

/// One canonical chain and the structural chains that feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAssignment {
    /// The canonical label the chain ends up with.
    pub target_label: String,
    /// The current labels consumed, parent first. More than one entry means
    /// a link-group merge.
    pub source_labels: Vec<String>,
}

/// A complete, validated relabeling of one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelabelPlan {
    pub assignments: Vec<ChainAssignment>,
}

impl RelabelPlan {
    /// The canonical labels in their final order.
    pub fn target_labels(&self) -> Vec<String> {
        self.assignments
            .iter()
            .map(|assignment| assignment.target_label.clone())
            .collect()
    }
}

/// Plans the relabeling of a model's chains onto the canonical layout.
///
/// The model's chains correspond positionally to `layout.order`; link-group
/// members fold into their parent's assignment instead of keeping a chain of
/// their own.
///
/// # Errors
///
/// Returns [`EngineError::RelabelCountMismatch`] when the model's chain
/// count differs from the layout's. That means the tool produced an
/// unexpected chain topology, so no rename can be trusted.
pub fn plan(current_labels: &[String], layout: &ChainLayout) -> Result<RelabelPlan, EngineError> {
    if layout.order.len() != current_labels.len() {
        return Err(EngineError::RelabelCountMismatch {
            expected: layout.order.len(),
            found: current_labels.len(),
        });
    }

    let position: HashMap<&str, usize> = layout
        .order
        .iter()
        .enumerate()
        .map(|(index, label)| (label.as_str(), index))
        .collect();
    let members: HashSet<&str> = layout
        .link_groups
        .values()
        .flatten()
        .map(String::as_str)
        .collect();

    let mut assignments = Vec::new();
    for (index, canonical) in layout.order.iter().enumerate() {
        if members.contains(canonical.as_str()) {
            continue;
        }
        let mut source_labels = vec![current_labels[index].clone()];
        if let Some(group) = layout.link_groups.get(canonical) {
            for member in group {
                let member_position = position.get(member.as_str()).ok_or_else(|| {
                    EngineError::Internal(format!(
                        "link group member '{}' is missing from the chain layout",
                        member
                    ))
                })?;
                source_labels.push(current_labels[*member_position].clone());
            }
        }
        assignments.push(ChainAssignment {
            target_label: canonical.clone(),
            source_labels,
        });
    }

    debug!(assignments = assignments.len(), "Planned chain relabeling.");
    Ok(RelabelPlan { assignments })
}

/// Builds a new structure with the plan's canonical labels applied.
///
/// Parent chains keep their residue numbering. Residues of merged link-group
/// members are renumbered contiguously starting at 2, continuing across
/// members, so a three-part ligand ends up as one chain with residues
/// 1, 2, 3.
pub fn apply(structure: &Structure, plan: &RelabelPlan) -> Result<Structure, EngineError> {
    let mut relabeled = Structure::new();

    for assignment in &plan.assignments {
        let parent_label = &assignment.source_labels[0];
        let parent_id = structure.find_chain_by_label(parent_label).ok_or_else(|| {
            EngineError::Internal(format!("planned chain '{}' is not in the model", parent_label))
        })?;
        let chain_type = structure
            .chain(parent_id)
            .map(|chain| chain.chain_type)
            .unwrap_or_default();
        let target_id = relabeled.add_chain(&assignment.target_label, chain_type);

        for (_, residue) in structure.chain_residues(parent_id) {
            copy_residue(structure, &mut relabeled, target_id, residue.id, residue)?;
        }

        let mut next_number: isize = 2;
        for member_label in &assignment.source_labels[1..] {
            let member_id = structure.find_chain_by_label(member_label).ok_or_else(|| {
                EngineError::Internal(format!(
                    "planned chain '{}' is not in the model",
                    member_label
                ))
            })?;
            for (_, residue) in structure.chain_residues(member_id) {
                copy_residue(structure, &mut relabeled, target_id, next_number, residue)?;
                next_number += 1;
            }
        }
    }

    info!(
        chains_before = structure.chain_count(),
        chains_after = relabeled.chain_count(),
        "Applied chain relabeling."
    );
    Ok(relabeled)
}

fn copy_residue(
    source: &Structure,
    target: &mut Structure,
    target_chain: ChainId,
    number: isize,
    residue: &Residue,
) -> Result<(), EngineError> {
    let residue_id = target
        .add_residue(target_chain, number, &residue.name)
        .ok_or_else(|| EngineError::Internal("relabel target chain vanished".to_string()))?;
    if residue.hetero {
        if let Some(copy) = target.residue_mut(residue_id) {
            copy.hetero = true;
        }
    }

    for &atom_id in residue.atoms() {
        let atom = source
            .atom(atom_id)
            .ok_or_else(|| EngineError::Internal("residue names a missing atom".to_string()))?;
        let mut copy = atom.clone();
        copy.residue_id = residue_id;
        target
            .add_atom_to_residue(residue_id, copy)
            .ok_or_else(|| EngineError::Internal("relabel target residue vanished".to_string()))?;
    }
    Ok(())
}

/// Reorders the structure's chains into the given label order.
///
/// # Errors
///
/// Returns [`EngineError::ChainReorder`] when `desired` is not a permutation
/// of the chains present; the structure is left untouched in that case.
pub fn reorder(structure: &mut Structure, desired: &[String]) -> Result<(), EngineError> {
    let mut have = structure.chain_labels();
    have.sort();
    let mut want = desired.to_vec();
    want.sort();
    if have != want {
        return Err(EngineError::ChainReorder(format!(
            "cannot reorder chains {:?} into {:?}",
            structure.chain_labels(),
            desired
        )));
    }

    structure
        .reorder_chains(desired)
        .ok_or_else(|| EngineError::Internal("validated chain reorder was rejected".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::descriptor::ComplexDescriptor;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;
    use std::path::Path;

    const SPLIT_LIGAND: &str = r#"{
        "sequences": [
            { "protein": { "id": "A", "sequence": "MG" } },
            { "ligand": { "id": "B", "ccdCodes": ["HEM", "FAD", "NAD"] } }
        ]
    }"#;

    fn layout_of(json: &str) -> ChainLayout {
        ComplexDescriptor::from_json_str(json, Path::new("test.json"))
            .unwrap()
            .chain_layout()
    }

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn four_chain_model() -> Structure {
        let mut structure = Structure::new();
        let a = structure.add_chain("A", ChainType::Other);
        let gly = structure.add_residue(a, 1, "GLY").unwrap();
        let mut ca = Atom::new("CA", "C", gly, Point3::new(1.0, 0.0, 0.0));
        ca.confidence = Some(91.0);
        structure.add_atom_to_residue(gly, ca).unwrap();

        for (label, residue_name) in [("B", "HEM"), ("C", "FAD"), ("D", "NAD")] {
            let chain = structure.add_chain(label, ChainType::Other);
            let residue = structure.add_residue(chain, 1, residue_name).unwrap();
            let atom = Atom::new("C1", "C", residue, Point3::origin());
            structure.add_atom_to_residue(residue, atom).unwrap();
        }
        structure
    }

    #[test]
    fn plan_folds_link_group_members_into_their_parent() {
        let layout = layout_of(SPLIT_LIGAND);

        let plan = plan(&labels(&["A", "B", "C", "D"]), &layout).unwrap();

        assert_eq!(
            plan.assignments,
            vec![
                ChainAssignment {
                    target_label: "A".to_string(),
                    source_labels: labels(&["A"]),
                },
                ChainAssignment {
                    target_label: "B".to_string(),
                    source_labels: labels(&["B", "C", "D"]),
                },
            ]
        );
        assert_eq!(plan.target_labels(), labels(&["A", "B"]));
    }

    #[test]
    fn plan_is_positional_over_the_current_labels() {
        let layout = layout_of(SPLIT_LIGAND);

        // A tool that labels chains sequentially regardless of the request.
        let plan = plan(&labels(&["W", "X", "Y", "Z"]), &layout).unwrap();

        assert_eq!(plan.assignments[0].source_labels, labels(&["W"]));
        assert_eq!(plan.assignments[1].source_labels, labels(&["X", "Y", "Z"]));
    }

    #[test]
    fn plan_handles_members_that_are_not_adjacent_to_their_parent() {
        let layout = layout_of(
            r#"{
                "sequences": [
                    { "protein": { "id": "A", "sequence": "MG" } },
                    { "ligand": { "id": "B", "ccdCodes": ["HEM", "FAD"] } },
                    { "protein": { "id": "C", "sequence": "MK" } }
                ]
            }"#,
        );
        // Generated member D lands after the declared labels: A, B, C, D.
        assert_eq!(layout.order, labels(&["A", "B", "C", "D"]));

        let plan = plan(&labels(&["A", "B", "C", "D"]), &layout).unwrap();

        assert_eq!(plan.target_labels(), labels(&["A", "B", "C"]));
        assert_eq!(plan.assignments[1].source_labels, labels(&["B", "D"]));
        assert_eq!(plan.assignments[2].source_labels, labels(&["C"]));
    }

    #[test]
    fn plan_rejects_unexpected_chain_counts() {
        let layout = layout_of(SPLIT_LIGAND);

        let error = plan(&labels(&["A", "B", "C"]), &layout).unwrap_err();

        match error {
            EngineError::RelabelCountMismatch { expected, found } => {
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plan_is_pure() {
        let layout = layout_of(SPLIT_LIGAND);
        let current = labels(&["A", "B", "C", "D"]);

        assert_eq!(plan(&current, &layout).unwrap(), plan(&current, &layout).unwrap());
    }

    #[test]
    fn apply_merges_members_and_renumbers_from_two() {
        let layout = layout_of(SPLIT_LIGAND);
        let structure = four_chain_model();
        let plan = plan(&structure.chain_labels(), &layout).unwrap();

        let relabeled = apply(&structure, &plan).unwrap();

        assert_eq!(relabeled.chain_labels(), labels(&["A", "B"]));
        let merged = relabeled.find_chain_by_label("B").unwrap();
        let residues: Vec<(isize, String)> = relabeled
            .chain_residues(merged)
            .map(|(_, residue)| (residue.id, residue.name.clone()))
            .collect();
        assert_eq!(
            residues,
            vec![
                (1, "HEM".to_string()),
                (2, "FAD".to_string()),
                (3, "NAD".to_string()),
            ]
        );
        assert_eq!(relabeled.atom_count(), structure.atom_count());
    }

    #[test]
    fn apply_preserves_atom_payloads() {
        let layout = layout_of(SPLIT_LIGAND);
        let structure = four_chain_model();
        let plan = plan(&structure.chain_labels(), &layout).unwrap();

        let relabeled = apply(&structure, &plan).unwrap();

        let protein = relabeled.find_chain_by_label("A").unwrap();
        let (_, atom) = relabeled.chain_atoms(protein).next().unwrap();
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.confidence, Some(91.0));
        assert_eq!(atom.position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn reorder_applies_a_valid_permutation() {
        let mut structure = Structure::new();
        structure.add_chain("B", ChainType::Other);
        structure.add_chain("A", ChainType::Other);

        reorder(&mut structure, &labels(&["A", "B"])).unwrap();

        assert_eq!(structure.chain_labels(), labels(&["A", "B"]));
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let mut structure = Structure::new();
        structure.add_chain("A", ChainType::Other);
        structure.add_chain("B", ChainType::Other);

        let error = reorder(&mut structure, &labels(&["A", "C"])).unwrap_err();

        assert!(matches!(error, EngineError::ChainReorder(_)));
        assert_eq!(structure.chain_labels(), labels(&["A", "B"]));
    }
}
