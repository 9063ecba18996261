use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents a single atom record from a predicted structure model.
///
/// This struct carries the subset of mmCIF `_atom_site` data that output
/// normalization actually needs: identity, coordinates, and the confidence
/// value that prediction tools store in the temperature-factor slot. It is
/// deliberately free of any force-field or simulation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "C1'").
    pub name: String,
    /// The element symbol as given by the file (e.g., "C", "N", "ZN").
    pub element: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The occupancy of the atom site.
    pub occupancy: f64,
    /// The per-atom confidence score (pLDDT) stored in the B-factor column,
    /// or `None` if the file carried no value for this atom.
    pub confidence: Option<f64>,
    /// Whether the atom was recorded as `HETATM` rather than `ATOM`.
    pub hetero: bool,
}

impl Atom {
    /// Creates a new `Atom` with default values for most fields.
    ///
    /// This constructor initializes an atom with the provided name, element,
    /// residue ID, and position. Other fields are set to their default values
    /// and can be modified afterward as needed.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `element` - The element symbol of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, element: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element: element.to_string(),
            residue_id,
            position,
            occupancy: 1.0,
            confidence: None,
            hetero: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ResidueId;
    use nalgebra::Point3;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let residue_id = ResidueId::default();
        let atom = Atom::new("CA", "C", residue_id, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.name, "CA");
        assert_eq!(atom.element, "C");
        assert_eq!(atom.residue_id, residue_id);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.confidence, None);
        assert!(!atom.hetero);
    }

    #[test]
    fn atom_equality_and_clone_works() {
        let residue_id = ResidueId::default();
        let mut atom1 = Atom::new("N", "N", residue_id, Point3::new(0.0, 0.0, 0.0));
        atom1.confidence = Some(87.5); // Also test non-default fields
        let atom2 = atom1.clone();
        assert_eq!(atom1, atom2);
    }

    #[test]
    fn primed_atom_names_are_preserved() {
        let residue_id = ResidueId::default();
        let atom = Atom::new("C1'", "C", residue_id, Point3::origin());
        assert_eq!(atom.name, "C1'");
    }
}
