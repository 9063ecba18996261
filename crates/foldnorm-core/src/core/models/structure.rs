use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use crate::core::utils::residues::{is_standard_residue, one_letter_code};
use slotmap::SlotMap;
use std::collections::HashMap;

/// Selects what one unit of length means in [`Structure::chain_lengths`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    /// Count every atom in the chain.
    Atoms,
    /// Count residues, subject to the ligand and modified-residue options.
    Residues,
}

/// Represents one predicted conformation as chains, residues, and atoms.
///
/// This struct is the central data structure for output normalization,
/// providing efficient storage and access to all structural components.
/// Chains keep the order in which they appeared in the source file, which
/// downstream relabeling and score normalization rely on.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Primary storage for atoms using a slot map for efficient ID management.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues using a slot map for efficient ID management.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains using a slot map for efficient ID management.
    chains: SlotMap<ChainId, Chain>,
    /// Chain IDs in source-file order.
    chain_order: Vec<ChainId>,
    /// Lookup map for finding residues by chain ID and residue number.
    residue_id_map: HashMap<(ChainId, isize), ResidueId>,
    /// Lookup map for finding chains by their label.
    chain_id_map: HashMap<String, ChainId>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the atom exists, otherwise `None`.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&mut Atom)` if the atom exists, otherwise `None`.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Returns the total number of atoms in the structure.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Returns a mutable iterator over all atoms, in storage order.
    ///
    /// Storage order is arbitrary; use [`Structure::chain_atoms`] when the
    /// source-file order matters.
    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = (AtomId, &mut Atom)> {
        self.atoms.iter_mut()
    }

    /// Retrieves an immutable reference to a residue by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The residue ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Residue)` if the residue exists, otherwise `None`.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Retrieves a mutable reference to a residue by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The residue ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&mut Residue)` if the residue exists, otherwise `None`.
    pub fn residue_mut(&mut self, id: ResidueId) -> Option<&mut Residue> {
        self.residues.get_mut(id)
    }

    /// Retrieves an immutable reference to a chain by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The chain ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Chain)` if the chain exists, otherwise `None`.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Retrieves a mutable reference to a chain by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The chain ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&mut Chain)` if the chain exists, otherwise `None`.
    pub fn chain_mut(&mut self, id: ChainId) -> Option<&mut Chain> {
        self.chains.get_mut(id)
    }

    /// Returns the number of chains in the structure.
    pub fn chain_count(&self) -> usize {
        self.chain_order.len()
    }

    /// Returns an iterator over all chains in source-file order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(ChainId, &Chain)` pairs.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    /// Returns the chain labels in source-file order.
    pub fn chain_labels(&self) -> Vec<String> {
        self.chains_iter()
            .map(|(_, chain)| chain.id.clone())
            .collect()
    }

    /// Returns an iterator over the residues of one chain, in chain order.
    pub fn chain_residues(&self, chain_id: ChainId) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains
            .get(chain_id)
            .into_iter()
            .flat_map(|chain| chain.residues().iter())
            .filter_map(|&id| self.residues.get(id).map(|residue| (id, residue)))
    }

    /// Returns an iterator over the atoms of one chain, in residue then atom order.
    pub fn chain_atoms(&self, chain_id: ChainId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.chain_residues(chain_id)
            .flat_map(|(_, residue)| residue.atoms().iter())
            .filter_map(|&id| self.atoms.get(id).map(|atom| (id, atom)))
    }

    /// Finds a chain ID by its label.
    ///
    /// # Arguments
    ///
    /// * `label` - The label of the chain (e.g., "A").
    ///
    /// # Return
    ///
    /// Returns `Some(ChainId)` if the chain exists, otherwise `None`.
    pub fn find_chain_by_label(&self, label: &str) -> Option<ChainId> {
        self.chain_id_map.get(label).copied()
    }

    /// Finds a residue ID by its chain ID and residue number.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - The ID of the chain containing the residue.
    /// * `residue_number` - The sequential number of the residue.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if the residue exists, otherwise `None`.
    pub fn find_residue_by_id(
        &self,
        chain_id: ChainId,
        residue_number: isize,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number))
            .copied()
    }

    /// Adds a new chain to the structure or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given label already
    /// exists, it returns the existing chain ID without creating a duplicate.
    /// New chains are appended to the source-file chain order.
    ///
    /// # Arguments
    ///
    /// * `label` - The label for the chain.
    /// * `chain_type` - The type of the chain.
    ///
    /// # Return
    ///
    /// The ID of the chain (new or existing).
    pub fn add_chain(&mut self, label: &str, chain_type: ChainType) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(label) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(label, chain_type));
        self.chain_id_map.insert(label.to_string(), chain_id);
        self.chain_order.push(chain_id);
        chain_id
    }

    /// Adds a new residue to the structure or returns the existing one.
    ///
    /// This method is idempotent; if a residue with the given chain ID and
    /// residue number already exists, it returns the existing residue ID.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - The ID of the chain to add the residue to.
    /// * `residue_number` - The sequential number of the residue.
    /// * `name` - The name of the residue.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if successful, otherwise `None` (e.g., if chain doesn't exist).
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        name: &str,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, residue_number);

        let residue_id = *self.residue_id_map.entry(key).or_insert_with(|| {
            let residue = Residue::new(residue_number, name, chain_id);
            self.residues.insert(residue)
        });

        if !chain.residues.contains(&residue_id) {
            chain.residues.push(residue_id);
        }

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// # Arguments
    ///
    /// * `residue_id` - The ID of the residue to add the atom to.
    /// * `atom` - The atom to add.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (e.g., if residue doesn't exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }

        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);

        if let Some(residue) = self.residues.get_mut(residue_id) {
            residue.add_atom(&name, atom_id);
        }

        Some(atom_id)
    }

    /// Reorders the chains to match the given label sequence.
    ///
    /// The new order must be a permutation of the current chain labels;
    /// no chain may be added, dropped, or duplicated by a reorder.
    ///
    /// # Arguments
    ///
    /// * `new_order` - The desired chain labels, in the desired order.
    ///
    /// # Return
    ///
    /// Returns `Some(())` on success, or `None` if `new_order` is not a
    /// permutation of the current labels. On `None` the structure is unchanged.
    pub fn reorder_chains(&mut self, new_order: &[String]) -> Option<()> {
        if new_order.len() != self.chain_order.len() {
            return None;
        }
        let mut reordered = Vec::with_capacity(new_order.len());
        let mut seen = std::collections::HashSet::new();
        for label in new_order {
            let chain_id = self.find_chain_by_label(label)?;
            if !seen.insert(chain_id) {
                return None;
            }
            reordered.push(chain_id);
        }
        self.chain_order = reordered;
        Some(())
    }

    /// Computes the length of every chain, in source-file order.
    ///
    /// In [`LengthMode::Atoms`] mode every atom counts. In
    /// [`LengthMode::Residues`] mode the count depends on the chain type:
    /// ligand chains contribute their atom count when `ligand_atoms` is set
    /// and a single unit otherwise, and polymer chains contribute one unit
    /// per residue, except that with `ptm_atoms` set any residue outside the
    /// standard alphabets expands to one unit per atom.
    ///
    /// # Arguments
    ///
    /// * `mode` - Whether to count atoms or residues.
    /// * `ligand_atoms` - Whether ligand chains count per atom.
    /// * `ptm_atoms` - Whether modified polymer residues count per atom.
    ///
    /// # Return
    ///
    /// Chain labels paired with their lengths, in source-file order.
    pub fn chain_lengths(
        &self,
        mode: LengthMode,
        ligand_atoms: bool,
        ptm_atoms: bool,
    ) -> Vec<(String, usize)> {
        let mut lengths: Vec<(String, usize)> = Vec::with_capacity(self.chain_order.len());

        for (chain_id, chain) in self.chains_iter() {
            let count = match mode {
                LengthMode::Atoms => self.chain_atoms(chain_id).count(),
                LengthMode::Residues => match chain.chain_type {
                    ChainType::Ligand => {
                        if ligand_atoms {
                            self.chain_atoms(chain_id).count()
                        } else {
                            1
                        }
                    }
                    ChainType::Protein | ChainType::DNA | ChainType::RNA if ptm_atoms => self
                        .chain_residues(chain_id)
                        .map(|(_, residue)| {
                            if is_standard_residue(&residue.name) {
                                1
                            } else {
                                residue.atoms().len()
                            }
                        })
                        .sum(),
                    _ => chain.residues().len(),
                },
            };
            lengths.push((chain.id.clone(), count));
        }

        lengths
    }

    /// Computes the token residue numbers for every chain, in source-file order.
    ///
    /// Ligand chains produce one token per atom, each carrying its residue
    /// number. Polymer chains produce one token per residue, except that
    /// hetero residues (modifications recorded as `HETATM`) expand to one
    /// token per atom.
    ///
    /// # Return
    ///
    /// Chain labels paired with their flat token residue number lists.
    pub fn token_residue_ids(&self) -> Vec<(String, Vec<isize>)> {
        let mut token_ids = Vec::with_capacity(self.chain_order.len());

        for (chain_id, chain) in self.chains_iter() {
            let mut ids = Vec::new();
            if chain.chain_type == ChainType::Ligand {
                for (_, residue) in self.chain_residues(chain_id) {
                    ids.extend(std::iter::repeat_n(residue.id, residue.atoms().len()));
                }
            } else {
                for (_, residue) in self.chain_residues(chain_id) {
                    if residue.hetero {
                        ids.extend(std::iter::repeat_n(residue.id, residue.atoms().len()));
                    } else {
                        ids.push(residue.id);
                    }
                }
            }
            token_ids.push((chain.id.clone(), ids));
        }

        token_ids
    }

    /// Extracts a one-letter sequence per chain, in source-file order.
    ///
    /// Residues outside the standard alphabets (including every ligand
    /// residue) are rendered as `X`.
    pub fn sequences(&self) -> Vec<(String, String)> {
        self.chains_iter()
            .map(|(chain_id, chain)| {
                let sequence: String = self
                    .chain_residues(chain_id)
                    .map(|(_, residue)| one_letter_code(&residue.name).unwrap_or('X'))
                    .collect();
                (chain.id.clone(), sequence)
            })
            .collect()
    }
}
