use phf::{Map, Set, phf_map, phf_set};

static STANDARD_AMINO_ACIDS: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
};

static STANDARD_NUCLEOTIDES: Set<&'static str> = phf_set! {
    "DA", "DC", "DG", "DT", "A", "C", "G", "U",
};

static ONE_LETTER_CODES: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
    "DA" => 'A', "DC" => 'C', "DG" => 'G', "DT" => 'T',
    "A" => 'A', "C" => 'C', "G" => 'G', "U" => 'U',
};

pub fn is_standard_amino_acid(res_name: &str) -> bool {
    STANDARD_AMINO_ACIDS.contains(res_name.trim())
}

pub fn is_standard_nucleotide(res_name: &str) -> bool {
    STANDARD_NUCLEOTIDES.contains(res_name.trim())
}

/// Whether a residue name counts as a single token when modified residues
/// are expanded to per-atom tokens.
pub fn is_standard_residue(res_name: &str) -> bool {
    is_standard_amino_acid(res_name) || is_standard_nucleotide(res_name)
}

/// One-letter code for a standard residue name, or `None` for anything else.
pub fn one_letter_code(res_name: &str) -> Option<char> {
    ONE_LETTER_CODES.get(res_name.trim()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_standard_amino_acids() {
        assert!(is_standard_amino_acid("ALA"));
        assert!(is_standard_amino_acid("TRP"));
        assert!(!is_standard_amino_acid("MSE"));
        assert!(!is_standard_amino_acid("HEM"));
    }

    #[test]
    fn recognizes_standard_nucleotides() {
        assert!(is_standard_nucleotide("DA"));
        assert!(is_standard_nucleotide("U"));
        assert!(!is_standard_nucleotide("PSU"));
    }

    #[test]
    fn standard_residue_covers_both_polymer_alphabets() {
        assert!(is_standard_residue("GLY"));
        assert!(is_standard_residue("DT"));
        assert!(!is_standard_residue("SEP"));
        assert!(!is_standard_residue(""));
    }

    #[test]
    fn membership_is_case_sensitive_and_trims_whitespace() {
        assert!(is_standard_amino_acid(" ALA "));
        assert!(!is_standard_amino_acid("ala"));
    }

    #[test]
    fn one_letter_code_maps_standard_names() {
        assert_eq!(one_letter_code("ALA"), Some('A'));
        assert_eq!(one_letter_code("TRP"), Some('W'));
        assert_eq!(one_letter_code("DG"), Some('G'));
        assert_eq!(one_letter_code("LIG"), None);
    }
}
