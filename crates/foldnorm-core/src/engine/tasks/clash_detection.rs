//! Steric clash detection between the chains of a predicted structure.
//!
//! Atoms are indexed in a k-d tree and every cross-chain pair closer than a
//! van-der-Waals-derived threshold is flagged, excluding contacts that are
//! covalent bonds rather than prediction errors.

use std::collections::HashSet;
use std::io::Write;

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::core::models::ids::ChainId;
use crate::core::models::structure::Structure;
use crate::core::utils::elements::vdw_radius;
use crate::engine::config::ClashParams;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};

/// SG atoms at least this far apart (in Angstroms) read as disulfide bonds.
const DISULFIDE_FLOOR: f64 = 1.88;

/// One atom pair flagged as sterically clashing.
#[derive(Debug, Clone, PartialEq)]
pub struct ClashPair {
    pub chain_a: String,
    pub residue_a: isize,
    pub atom_a: String,
    pub chain_b: String,
    pub residue_b: isize,
    pub atom_b: String,
    /// Center distance in Angstroms.
    pub distance: f64,
}

/// A clashing residue pair derived from one or more atom pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResiduePair {
    pub chain_a: String,
    pub residue_a: isize,
    pub chain_b: String,
    pub residue_b: isize,
}

/// The result of one clash detection pass over a structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClashReport {
    /// Every clashing atom pair, in chain traversal order.
    pub atom_pairs: Vec<ClashPair>,
    /// Clashing residue pairs, deduplicated in first-seen order.
    pub residue_pairs: Vec<ResiduePair>,
}

impl ClashReport {
    /// The number of clashing atom pairs.
    pub fn atom_clash_count(&self) -> usize {
        self.atom_pairs.len()
    }

    /// The number of distinct clashing residue pairs.
    pub fn residue_clash_count(&self) -> usize {
        self.residue_pairs.len()
    }

    /// Whether the pass found no clashes at all.
    pub fn is_empty(&self) -> bool {
        self.atom_pairs.is_empty()
    }

    /// Writes the residue pairs as a CSV restraint table.
    ///
    /// Every row carries `RestraintSatisfied = False`, since a clash is by
    /// definition a violated contact restraint.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), EngineError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "Protein1",
            "SeqPos1",
            "Protein2",
            "SeqPos2",
            "RestraintSatisfied",
        ])?;
        for pair in &self.residue_pairs {
            let position_a = pair.residue_a.to_string();
            let position_b = pair.residue_b.to_string();
            csv_writer.write_record([
                pair.chain_a.as_str(),
                position_a.as_str(),
                pair.chain_b.as_str(),
                position_b.as_str(),
                "False",
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

struct AtomEntry<'s> {
    chain_id: ChainId,
    chain_label: &'s str,
    residue_number: isize,
    atom_name: &'s str,
    position: Point3<f64>,
    radius: f64,
}

/// Runs clash detection over every atom of the structure.
///
/// # Arguments
///
/// * `structure` - The structure to scan.
/// * `params` - Search radius and overlap fraction.
/// * `reporter` - Callback handler for progress events.
///
/// # Return
///
/// A [`ClashReport`] with the clashing atom pairs and the deduplicated
/// residue pairs.
#[instrument(skip_all, name = "clash_detection_task")]
pub fn run(
    structure: &Structure,
    params: &ClashParams,
    reporter: &ProgressReporter,
) -> Result<ClashReport, EngineError> {
    info!("Starting clash detection task.");
    reporter.report(Progress::Message("Detecting steric clashes".to_string()));

    let entries = collect_atom_entries(structure);
    let mut tree: KdTree<f64, 3> = KdTree::new();
    for (index, entry) in entries.iter().enumerate() {
        tree.add(
            &[entry.position.x, entry.position.y, entry.position.z],
            index as u64,
        );
    }

    let radius_squared = params.distance_threshold * params.distance_threshold;
    reporter.report(Progress::TaskStart {
        total_steps: entries.len() as u64,
    });

    #[cfg(feature = "parallel")]
    let index_iter = (0..entries.len()).into_par_iter();
    #[cfg(not(feature = "parallel"))]
    let index_iter = 0..entries.len();

    let atom_pairs: Vec<ClashPair> = index_iter
        .flat_map(|index| {
            let pairs = clashes_of(
                index,
                &entries,
                &tree,
                radius_squared,
                params.overlap_fraction,
            );
            reporter.report(Progress::TaskIncrement);
            pairs
        })
        .collect();
    reporter.report(Progress::TaskFinish);

    let residue_pairs = dedupe_residue_pairs(&atom_pairs);
    info!(
        atom_pairs = atom_pairs.len(),
        residue_pairs = residue_pairs.len(),
        "Clash detection task finished."
    );

    Ok(ClashReport {
        atom_pairs,
        residue_pairs,
    })
}

fn collect_atom_entries(structure: &Structure) -> Vec<AtomEntry<'_>> {
    let mut entries = Vec::with_capacity(structure.atom_count());
    for (chain_id, chain) in structure.chains_iter() {
        for (_, residue) in structure.chain_residues(chain_id) {
            for &atom_id in residue.atoms() {
                let Some(atom) = structure.atom(atom_id) else {
                    continue;
                };
                entries.push(AtomEntry {
                    chain_id,
                    chain_label: &chain.id,
                    residue_number: residue.id,
                    atom_name: &atom.name,
                    position: atom.position,
                    radius: vdw_radius(&atom.element),
                });
            }
        }
    }
    entries
}

fn clashes_of(
    index: usize,
    entries: &[AtomEntry],
    tree: &KdTree<f64, 3>,
    radius_squared: f64,
    overlap_fraction: f64,
) -> Vec<ClashPair> {
    let entry = &entries[index];
    let query = [entry.position.x, entry.position.y, entry.position.z];

    // Every pair is visited from its lower-indexed atom only.
    let mut hits: Vec<(usize, f64)> = tree
        .within_unsorted::<SquaredEuclidean>(&query, radius_squared)
        .into_iter()
        .map(|neighbour| (neighbour.item as usize, neighbour.distance))
        .filter(|&(other, _)| other > index)
        .collect();
    hits.sort_by_key(|&(other, _)| other);

    let mut pairs = Vec::new();
    for (other, squared_distance) in hits {
        let partner = &entries[other];
        if partner.chain_id == entry.chain_id {
            continue;
        }
        // Peptide bonds between linked chains show up as close C-N pairs.
        if is_peptide_pair(entry.atom_name, partner.atom_name) {
            continue;
        }
        let distance = squared_distance.sqrt();
        if entry.atom_name == "SG" && partner.atom_name == "SG" && distance > DISULFIDE_FLOOR {
            continue;
        }
        let clash_radius = (entry.radius + partner.radius) * overlap_fraction;
        if distance < clash_radius {
            pairs.push(ClashPair {
                chain_a: entry.chain_label.to_string(),
                residue_a: entry.residue_number,
                atom_a: entry.atom_name.to_string(),
                chain_b: partner.chain_label.to_string(),
                residue_b: partner.residue_number,
                atom_b: partner.atom_name.to_string(),
                distance,
            });
        }
    }
    pairs
}

fn is_peptide_pair(name_a: &str, name_b: &str) -> bool {
    (name_a == "C" && name_b == "N") || (name_a == "N" && name_b == "C")
}

fn dedupe_residue_pairs(atom_pairs: &[ClashPair]) -> Vec<ResiduePair> {
    let mut seen = HashSet::new();
    let mut residue_pairs = Vec::new();
    for clash in atom_pairs {
        let pair = ResiduePair {
            chain_a: clash.chain_a.clone(),
            residue_a: clash.residue_a,
            chain_b: clash.chain_b.clone(),
            residue_b: clash.residue_b,
        };
        if seen.insert(pair.clone()) {
            residue_pairs.push(pair);
        }
    }
    residue_pairs
}
