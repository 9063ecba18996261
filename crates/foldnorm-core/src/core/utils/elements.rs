use phf::{Map, phf_map};

/// Fallback radius in Angstroms for elements missing from the table.
pub const DEFAULT_VDW_RADIUS: f64 = 1.7;

static VDW_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 1.2, "D" => 1.2,
    "C" => 1.7, "N" => 1.55, "O" => 1.52,
    "F" => 1.47, "P" => 1.8, "S" => 1.8,
    "CL" => 1.75, "BR" => 1.85, "I" => 1.98,
    "SE" => 1.9, "B" => 1.92, "SI" => 2.1,
    "NA" => 2.27, "MG" => 1.73, "K" => 2.75, "CA" => 2.31,
    "ZN" => 1.39, "CU" => 1.4, "NI" => 1.63,
};

/// Looks up the van der Waals radius for an element symbol.
///
/// The lookup is case-insensitive and tolerant of surrounding whitespace,
/// since mmCIF writers vary in how they case the `type_symbol` column.
/// Unknown elements fall back to [`DEFAULT_VDW_RADIUS`].
pub fn vdw_radius(element: &str) -> f64 {
    VDW_RADII
        .get(element.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_VDW_RADIUS)
}
