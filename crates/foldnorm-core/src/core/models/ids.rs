use slotmap::new_key_type;

new_key_type! {
    /// Stable key for an atom stored in a [`Structure`](super::structure::Structure).
    pub struct AtomId;
    /// Stable key for a residue stored in a [`Structure`](super::structure::Structure).
    pub struct ResidueId;
    /// Stable key for a chain stored in a [`Structure`](super::structure::Structure).
    pub struct ChainId;
}
