use crate::core::models::chain::ChainType;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a complex description.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Failed to read complex description from '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse complex description from '{path}'")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Ligand entity '{id}' has neither ccdCodes nor smiles")]
    InvalidLigand { id: String },
}

/// An entity ID field, which the run description allows as either a single
/// label or a list of labels (one per copy of the entity).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    One(String),
    Many(Vec<String>),
}

impl EntityId {
    pub fn labels(&self) -> Vec<String> {
        match self {
            EntityId::One(id) => vec![id.clone()],
            EntityId::Many(ids) => ids.clone(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        match self {
            EntityId::One(id) => id == label,
            EntityId::Many(ids) => ids.iter().any(|id| id == label),
        }
    }
}

/// A residue-level modification on a polymer entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Modification {
    Ptm {
        #[serde(rename = "ptmType")]
        ptm_type: String,
        #[serde(rename = "ptmPosition")]
        ptm_position: isize,
    },
    Base {
        #[serde(rename = "modificationType")]
        modification_type: String,
        #[serde(rename = "basePosition")]
        base_position: isize,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolymerEntity {
    pub id: EntityId,
    pub sequence: String,
    #[serde(default)]
    pub modifications: Vec<Modification>,
}

/// An "ccdCodes" field, given as one CCD code or a list of codes. A list of
/// two or more codes describes a covalently linked multi-part ligand that
/// prediction tools other than AlphaFold 3 split into separate chains.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CcdCodes {
    One(String),
    Many(Vec<String>),
}

impl CcdCodes {
    pub fn codes(&self) -> Vec<String> {
        match self {
            CcdCodes::One(code) => vec![code.clone()],
            CcdCodes::Many(codes) => codes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LigandEntity {
    pub id: EntityId,
    #[serde(rename = "ccdCodes")]
    pub ccd_codes: Option<CcdCodes>,
    pub smiles: Option<String>,
}

/// One entry of the run description's `sequences` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Protein(PolymerEntity),
    Dna(PolymerEntity),
    Rna(PolymerEntity),
    Ligand(LigandEntity),
}

impl Entity {
    pub fn chain_type(&self) -> ChainType {
        match self {
            Entity::Protein(_) => ChainType::Protein,
            Entity::Dna(_) => ChainType::DNA,
            Entity::Rna(_) => ChainType::RNA,
            Entity::Ligand(_) => ChainType::Ligand,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        match self {
            Entity::Protein(p) | Entity::Dna(p) | Entity::Rna(p) => &p.id,
            Entity::Ligand(l) => &l.id,
        }
    }
}

/// A reference to one atom, as `[chain, residue number, atom name]`.
pub type AtomRef = (String, isize, String);

/// The canonical description of the predicted complex, parsed from the
/// AlphaFold 3 style run description JSON.
///
/// This is the single source of truth for which chains the complex contains,
/// what kind each chain is, and which chains other tools split a multi-part
/// ligand into. All downstream classification and relabeling derives from it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComplexDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "modelSeeds")]
    pub model_seeds: Vec<i64>,
    pub sequences: Vec<Entity>,
    #[serde(default, rename = "bondedAtomPairs")]
    pub bonded_atom_pairs: Option<Vec<(AtomRef, AtomRef)>>,
}

/// The canonical chain labels of the complex, together with the groups of
/// generated labels that belong to split multi-part ligands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainLayout {
    /// Every canonical label: the declared entity labels in entity order,
    /// followed by the generated labels for split ligand parts.
    pub order: Vec<String>,
    /// Map from a multi-part ligand's declared label to the generated labels
    /// of its remaining parts, in part order.
    pub link_groups: HashMap<String, Vec<String>>,
}

impl ComplexDescriptor {
    /// Parses a complex description from a JSON string.
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, DescriptorError> {
        let descriptor: ComplexDescriptor =
            serde_json::from_str(json).map_err(|source| DescriptorError::Json {
                path: origin.to_path_buf(),
                source,
            })?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Reads and parses a complex description from a file.
    pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
        let json = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        for entity in &self.sequences {
            if let Entity::Ligand(ligand) = entity {
                if ligand.ccd_codes.is_none() && ligand.smiles.is_none() {
                    let id = ligand
                        .id
                        .labels()
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| "?".to_string());
                    return Err(DescriptorError::InvalidLigand { id });
                }
            }
        }
        Ok(())
    }

    /// Computes the canonical chain layout for this complex.
    ///
    /// Declared labels come first, in entity order with multi-copy entities
    /// flattened. Every ligand with two or more CCD codes then contributes
    /// one generated label per code after the first; each generated label is
    /// the first character of the alphabet not yet in use.
    pub fn chain_layout(&self) -> ChainLayout {
        let mut order: Vec<String> = Vec::new();
        let mut used: HashSet<String> = HashSet::new();
        for entity in &self.sequences {
            for label in entity.entity_id().labels() {
                if used.insert(label.clone()) {
                    order.push(label);
                }
            }
        }

        let mut link_groups: HashMap<String, Vec<String>> = HashMap::new();
        for entity in &self.sequences {
            let Entity::Ligand(ligand) = entity else {
                continue;
            };
            let Some(codes) = &ligand.ccd_codes else {
                continue;
            };
            let codes = codes.codes();
            if codes.len() < 2 {
                continue;
            }
            for parent in ligand.id.labels() {
                let mut members = Vec::with_capacity(codes.len() - 1);
                for _ in 1..codes.len() {
                    let generated = next_unused_label(&used);
                    used.insert(generated.clone());
                    order.push(generated.clone());
                    members.push(generated);
                }
                link_groups.insert(parent, members);
            }
        }

        ChainLayout { order, link_groups }
    }

    /// The canonical chain labels in canonical order.
    pub fn chain_order(&self) -> Vec<String> {
        self.chain_layout().order
    }

    /// Map from multi-part ligand labels to their generated member labels.
    pub fn link_groups(&self) -> HashMap<String, Vec<String>> {
        self.chain_layout().link_groups
    }

    /// Looks up the chain type a label was declared with.
    ///
    /// Generated labels of split ligand parts resolve to
    /// [`ChainType::Ligand`]. Returns `None` for labels the description does
    /// not cover.
    pub fn kind_of(&self, label: &str) -> Option<ChainType> {
        for entity in &self.sequences {
            if entity.entity_id().contains(label) {
                return Some(entity.chain_type());
            }
        }
        let layout = self.chain_layout();
        layout
            .link_groups
            .values()
            .any(|members| members.iter().any(|member| member == label))
            .then_some(ChainType::Ligand)
    }
}

fn next_unused_label(used: &HashSet<String>) -> String {
    for candidate in ('A'..='Z').chain('a'..='z') {
        let label = candidate.to_string();
        if !used.contains(&label) {
            return label;
        }
    }
    // 52 single-letter labels exhausted; fall back to numbered labels.
    let mut n = 0usize;
    loop {
        let label = format!("X{}", n);
        if !used.contains(&label) {
            return label;
        }
        n += 1;
    }
}
