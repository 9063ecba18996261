use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::chain::ChainType;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct MmcifMetadata {
    pub block_name: String,
}

impl Default for MmcifMetadata {
    fn default() -> Self {
        Self {
            block_name: "model".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MmcifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: MmcifParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum MmcifParseErrorKind {
    #[error("_atom_site loop is missing the {0} column")]
    MissingColumn(&'static str),
    #[error("Atom record is shorter than the declared _atom_site headers")]
    TruncatedRow,
    #[error("Invalid numeric value for {column} (value: '{value}')")]
    InvalidNumber { column: &'static str, value: String },
}

fn parse_err(line: usize, kind: MmcifParseErrorKind) -> MmcifError {
    MmcifError::Parse { line, kind }
}

fn is_null(token: &str) -> bool {
    matches!(token, "." | "?")
}

fn parse_f64(value: &str, column: &'static str, line_num: usize) -> Result<f64, MmcifError> {
    value.parse().map_err(|_| {
        parse_err(
            line_num,
            MmcifParseErrorKind::InvalidNumber {
                column,
                value: value.into(),
            },
        )
    })
}

fn element_from_name(name: &str) -> String {
    name.chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

// Splits one line into CIF tokens. A quote only opens a string at the start
// of a token; mid-token quotes (primed atom names like C1') are literal.
fn tokenize_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None if (c == '\'' || c == '"') && current.is_empty() => quote = Some(c),
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[derive(Clone, Copy)]
struct AtomSiteColumns {
    group_pdb: Option<usize>,
    type_symbol: Option<usize>,
    atom_name: usize,
    comp_id: usize,
    asym_id: usize,
    seq_id: usize,
    cartn_x: usize,
    cartn_y: usize,
    cartn_z: usize,
    occupancy: Option<usize>,
    b_iso: Option<usize>,
    model_num: Option<usize>,
    min_len: usize,
}

impl AtomSiteColumns {
    fn resolve(headers: &[String], line_num: usize) -> Result<Self, MmcifError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |primary: &str, fallback: &str, what: &'static str| {
            find(primary)
                .or_else(|| find(fallback))
                .ok_or_else(|| parse_err(line_num, MmcifParseErrorKind::MissingColumn(what)))
        };

        Ok(Self {
            group_pdb: find("_atom_site.group_PDB"),
            type_symbol: find("_atom_site.type_symbol"),
            atom_name: require(
                "_atom_site.auth_atom_id",
                "_atom_site.label_atom_id",
                "atom identifier",
            )?,
            comp_id: require(
                "_atom_site.auth_comp_id",
                "_atom_site.label_comp_id",
                "component identifier",
            )?,
            asym_id: require(
                "_atom_site.auth_asym_id",
                "_atom_site.label_asym_id",
                "chain identifier",
            )?,
            seq_id: require(
                "_atom_site.auth_seq_id",
                "_atom_site.label_seq_id",
                "sequence identifier",
            )?,
            cartn_x: find("_atom_site.Cartn_x")
                .ok_or_else(|| parse_err(line_num, MmcifParseErrorKind::MissingColumn("Cartn_x")))?,
            cartn_y: find("_atom_site.Cartn_y")
                .ok_or_else(|| parse_err(line_num, MmcifParseErrorKind::MissingColumn("Cartn_y")))?,
            cartn_z: find("_atom_site.Cartn_z")
                .ok_or_else(|| parse_err(line_num, MmcifParseErrorKind::MissingColumn("Cartn_z")))?,
            occupancy: find("_atom_site.occupancy"),
            b_iso: find("_atom_site.B_iso_or_equiv"),
            model_num: find("_atom_site.pdbx_PDB_model_num"),
            min_len: headers.len(),
        })
    }
}

#[derive(Clone, Copy)]
enum ParserState {
    Base,
    InLoopHeader,
    InAtomSiteLoop(AtomSiteColumns),
    InOtherLoop,
}

fn parse_atom_row(
    tokens: &[String],
    cols: AtomSiteColumns,
    line_num: usize,
    structure: &mut Structure,
    first_model: &mut Option<String>,
    atoms_read: &mut usize,
) -> Result<(), MmcifError> {
    if tokens.len() < cols.min_len {
        return Err(parse_err(line_num, MmcifParseErrorKind::TruncatedRow));
    }

    // Only the first model of a multi-model file is kept.
    if let Some(idx) = cols.model_num {
        let model = tokens[idx].as_str();
        match first_model.as_deref() {
            None => *first_model = Some(model.to_string()),
            Some(first) if first != model => return Ok(()),
            Some(_) => {}
        }
    }

    let x_str = tokens[cols.cartn_x].as_str();
    let y_str = tokens[cols.cartn_y].as_str();
    let z_str = tokens[cols.cartn_z].as_str();
    // Unmodeled atoms have null coordinates; drop them.
    if is_null(x_str) || is_null(y_str) || is_null(z_str) {
        return Ok(());
    }
    let x = parse_f64(x_str, "_atom_site.Cartn_x", line_num)?;
    let y = parse_f64(y_str, "_atom_site.Cartn_y", line_num)?;
    let z = parse_f64(z_str, "_atom_site.Cartn_z", line_num)?;

    let seq_str = tokens[cols.seq_id].as_str();
    let res_id: isize = if is_null(seq_str) {
        1
    } else {
        seq_str.parse().map_err(|_| {
            parse_err(
                line_num,
                MmcifParseErrorKind::InvalidNumber {
                    column: "_atom_site.auth_seq_id",
                    value: seq_str.into(),
                },
            )
        })?
    };

    let occupancy = match cols.occupancy.map(|i| tokens[i].as_str()) {
        Some(occ) if !is_null(occ) => parse_f64(occ, "_atom_site.occupancy", line_num)?,
        _ => 1.0,
    };
    let confidence = match cols.b_iso.map(|i| tokens[i].as_str()) {
        Some(b) if !is_null(b) => Some(parse_f64(b, "_atom_site.B_iso_or_equiv", line_num)?),
        _ => None,
    };
    let hetero = matches!(
        cols.group_pdb.map(|i| tokens[i].as_str()),
        Some(group) if group.eq_ignore_ascii_case("HETATM")
    );

    let atom_name = tokens[cols.atom_name].as_str();
    let res_name = tokens[cols.comp_id].as_str();
    let chain_label = match tokens[cols.asym_id].as_str() {
        "." | "?" => "?",
        other => other,
    };
    let element = match cols.type_symbol.map(|i| tokens[i].as_str()) {
        Some(symbol) if !is_null(symbol) => symbol.to_string(),
        _ => element_from_name(atom_name),
    };

    let chain_id = structure.add_chain(chain_label, ChainType::Other);
    let residue_id = structure
        .add_residue(chain_id, res_id, res_name)
        .ok_or_else(|| {
            MmcifError::Inconsistency(format!(
                "Chain {} not found while adding residue {}",
                chain_label, res_id
            ))
        })?;
    if hetero {
        if let Some(residue) = structure.residue_mut(residue_id) {
            residue.hetero = true;
        }
    }

    let mut atom = Atom::new(atom_name, &element, residue_id, Point3::new(x, y, z));
    atom.occupancy = occupancy;
    atom.confidence = confidence;
    atom.hetero = hetero;
    structure
        .add_atom_to_residue(residue_id, atom)
        .ok_or_else(|| {
            MmcifError::Inconsistency(format!(
                "Residue {} {} not found while adding atom {}",
                res_name, res_id, atom_name
            ))
        })?;

    *atoms_read += 1;
    Ok(())
}

const ATOM_SITE_COLUMNS: [&str; 18] = [
    "_atom_site.group_PDB",
    "_atom_site.id",
    "_atom_site.type_symbol",
    "_atom_site.label_atom_id",
    "_atom_site.label_alt_id",
    "_atom_site.label_comp_id",
    "_atom_site.label_asym_id",
    "_atom_site.label_entity_id",
    "_atom_site.label_seq_id",
    "_atom_site.pdbx_PDB_ins_code",
    "_atom_site.Cartn_x",
    "_atom_site.Cartn_y",
    "_atom_site.Cartn_z",
    "_atom_site.occupancy",
    "_atom_site.B_iso_or_equiv",
    "_atom_site.auth_seq_id",
    "_atom_site.auth_asym_id",
    "_atom_site.pdbx_PDB_model_num",
];

// Quotes a field for output. Primed names (C1') get double quotes so the
// tokenizer on the read side sees a single token.
fn quote_field(s: &str) -> String {
    if s.is_empty() {
        return ".".to_string();
    }
    if !s.contains(char::is_whitespace) && !s.contains('\'') && !s.contains('"') {
        return s.to_string();
    }
    if s.contains('\'') && !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        format!("'{}'", s)
    }
}

pub struct MmcifFile;

impl StructureFile for MmcifFile {
    type Metadata = MmcifMetadata;
    type Error = MmcifError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut structure = Structure::new();
        let mut metadata = MmcifMetadata::default();

        let mut state = ParserState::Base;
        let mut loop_headers: Vec<String> = Vec::new();
        let mut first_model: Option<String> = None;
        let mut atoms_read = 0usize;
        let mut in_text_field = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            // Semicolon-delimited text blocks carry free text (sequences,
            // titles); nothing inside one is a tag or a data row.
            if trimmed.starts_with(';') {
                in_text_field = !in_text_field;
                continue;
            }
            if in_text_field || trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let tokens = tokenize_line(trimmed);
            if tokens.is_empty() {
                continue;
            }

            if tokens[0] == "loop_" {
                state = ParserState::InLoopHeader;
                loop_headers.clear();
                continue;
            }
            if let Some(block) = tokens[0].strip_prefix("data_") {
                metadata.block_name = block.to_string();
                state = ParserState::Base;
                continue;
            }

            match state {
                ParserState::Base => {}
                ParserState::InLoopHeader => {
                    if tokens[0].starts_with('_') {
                        loop_headers.push(tokens[0].clone());
                    } else if loop_headers.iter().any(|h| h.starts_with("_atom_site.")) {
                        let cols = AtomSiteColumns::resolve(&loop_headers, line_num)?;
                        parse_atom_row(
                            &tokens,
                            cols,
                            line_num,
                            &mut structure,
                            &mut first_model,
                            &mut atoms_read,
                        )?;
                        state = ParserState::InAtomSiteLoop(cols);
                    } else {
                        state = ParserState::InOtherLoop;
                    }
                }
                ParserState::InAtomSiteLoop(cols) => {
                    if tokens[0].starts_with('_') {
                        state = ParserState::Base;
                    } else {
                        parse_atom_row(
                            &tokens,
                            cols,
                            line_num,
                            &mut structure,
                            &mut first_model,
                            &mut atoms_read,
                        )?;
                    }
                }
                ParserState::InOtherLoop => {
                    if tokens[0].starts_with('_') {
                        state = ParserState::Base;
                    }
                }
            }
        }

        if atoms_read == 0 {
            return Err(MmcifError::MissingRecord("_atom_site records".into()));
        }
        Ok((structure, metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "data_{}", metadata.block_name)?;
        writeln!(writer, "#")?;
        writeln!(writer, "loop_")?;
        for column in ATOM_SITE_COLUMNS {
            writeln!(writer, "{}", column)?;
        }

        // Serials, label_asym_id and group_PDB are regenerated from the live
        // structure rather than echoed from whatever was parsed, so renames
        // and reorders survive serialization.
        let mut serial = 1usize;
        for (entity_idx, (chain_id, chain)) in structure.chains_iter().enumerate() {
            let asym_id = quote_field(&chain.id);
            for (_, residue) in structure.chain_residues(chain_id) {
                let comp_id = quote_field(&residue.name);
                for &atom_id in residue.atoms() {
                    let atom = structure.atom(atom_id).ok_or_else(|| {
                        MmcifError::Inconsistency(format!(
                            "Atom record missing for residue {} {}",
                            residue.name, residue.id
                        ))
                    })?;
                    let group_pdb = if chain.chain_type == ChainType::Ligand || atom.hetero {
                        "HETATM"
                    } else {
                        "ATOM"
                    };
                    let b_iso = match atom.confidence {
                        Some(value) => format!("{:.2}", value),
                        None => "?".to_string(),
                    };
                    writeln!(
                        writer,
                        "{} {} {} {} . {} {} {} {} ? {:.3} {:.3} {:.3} {:.2} {} {} {} 1",
                        group_pdb,
                        serial,
                        atom.element,
                        quote_field(&atom.name),
                        comp_id,
                        asym_id,
                        entity_idx + 1,
                        residue.id,
                        atom.position.x,
                        atom.position.y,
                        atom.position.z,
                        atom.occupancy,
                        b_iso,
                        residue.id,
                        asym_id,
                    )?;
                    serial += 1;
                }
            }
        }
        writeln!(writer, "#")?;
        Ok(())
    }

    fn write_structure_to(
        structure: &Structure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(structure, &MmcifMetadata::default(), writer)
    }
}
