//! Chain classification against a user-supplied complex description.
//!
//! Prediction tools do not record what kind of molecule each chain holds, so
//! the engine looks chain labels up in the [`ComplexDescriptor`] the job was
//! submitted with. When no description is available every query answers
//! `None` and downstream steps fall back to type-agnostic behavior.

use tracing::warn;

use crate::core::input::descriptor::ComplexDescriptor;
use crate::core::models::chain::ChainType;
use crate::core::models::structure::Structure;

/// Resolves chain labels to chain types using an optional complex
/// description.
pub struct ChainClassifier<'a> {
    descriptor: Option<&'a ComplexDescriptor>,
}

impl<'a> ChainClassifier<'a> {
    /// Creates a classifier backed by the given description, if any.
    pub fn new(descriptor: Option<&'a ComplexDescriptor>) -> Self {
        Self { descriptor }
    }

    /// Looks up the declared type of a chain label.
    ///
    /// Returns `None` when no description is available or when the label is
    /// not covered by it.
    pub fn kind_of(&self, label: &str) -> Option<ChainType> {
        self.descriptor.and_then(|descriptor| descriptor.kind_of(label))
    }

    /// Whether the label belongs to a ligand, including generated labels of
    /// split multi-part ligands.
    pub fn is_ligand(&self, label: &str) -> bool {
        self.kind_of(label) == Some(ChainType::Ligand)
    }

    /// Whether the label resolves to one of the given types.
    pub fn is_any_of(&self, label: &str, kinds: &[ChainType]) -> bool {
        self.kind_of(label).is_some_and(|kind| kinds.contains(&kind))
    }

    /// Writes the declared chain types onto the structure's chains.
    ///
    /// Chains the description does not cover keep [`ChainType::Other`]. With
    /// no description at all the structure is left untouched and a single
    /// warning is logged, since ligand-aware steps will degrade.
    pub fn annotate(&self, structure: &mut Structure) {
        if self.descriptor.is_none() {
            warn!(
                "No complex description available; chains stay unclassified and ligand handling is degraded"
            );
            return;
        }

        for label in structure.chain_labels() {
            let Some(chain_id) = structure.find_chain_by_label(&label) else {
                continue;
            };
            match self.kind_of(&label) {
                Some(kind) => {
                    if let Some(chain) = structure.chain_mut(chain_id) {
                        chain.chain_type = kind;
                    }
                }
                None => {
                    warn!(chain = %label, "Chain is not covered by the complex description; treating it as unclassified");
                }
            }
        }
    }
}
