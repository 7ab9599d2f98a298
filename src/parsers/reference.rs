// ==============================================================================
// parsers/reference.rs - Resistance Marker Reference Table Parser
// ==============================================================================
// Description: Loads the curated table of known resistance-marker sites into an
//              in-memory index keyed by (chromosome, position)
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Format: Delimited text with header (comma, or tab for .tsv/.tab/.txt)
// Example:
//   CHROM,POS,Gene Name,Drug Resistance,Marker
//   2L,2422652,Vgsc,Pyrethroid,L1014F
//   2R,28545767,Gste2,DDT,I114T
// Column order is free; extra columns are ignored.
// ==============================================================================

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::is_usable_path_component;
use crate::models::{ErrorKind, ReferenceEntry, SiteKey};

/// Columns the reference table must provide
pub const REQUIRED_COLUMNS: [&str; 5] = ["CHROM", "POS", "Gene Name", "Drug Resistance", "Marker"];

const WORKBOOK_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "xlsm"];
const TAB_EXTENSIONS: [&str; 3] = ["tsv", "tab", "txt"];

/// Errors that can occur while loading the reference table
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to open reference table {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read reference table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed row in reference table {path} at line {line}: {source}")]
    MalformedRow {
        path: String,
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("Reference table {path} is missing required column '{column}' (expected: {expected})")]
    MissingColumn {
        path: String,
        column: String,
        expected: String,
    },

    #[error("Reference table {path} is an Excel workbook; export the sheet as CSV or TSV")]
    UnsupportedWorkbook { path: String },

    #[error("Invalid POS value in reference table at line {line}: '{value}'")]
    InvalidPosition { line: usize, value: String },

    #[error("Unusable gene name in reference table at line {line}: '{value}' (gene names become directory names)")]
    InvalidGeneName { line: usize, value: String },
}

impl ReferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReferenceError::FileOpen { .. } | ReferenceError::Read { .. } => ErrorKind::FileAccess,
            ReferenceError::MalformedRow { .. }
            | ReferenceError::MissingColumn { .. }
            | ReferenceError::UnsupportedWorkbook { .. }
            | ReferenceError::InvalidPosition { .. }
            | ReferenceError::InvalidGeneName { .. } => ErrorKind::InputFormat,
        }
    }
}

/// Raw reference row as it appears in the table
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "CHROM")]
    chromosome: String,

    #[serde(rename = "POS")]
    position: String,

    #[serde(rename = "Gene Name")]
    gene_name: String,

    #[serde(rename = "Drug Resistance")]
    drug_resistance: String,

    #[serde(rename = "Marker")]
    marker: String,
}

/// Lookup from genomic site to known resistance marker
///
/// Duplicate sites follow last-row-wins: inserting an entry for a site that
/// is already present replaces it. The number of replaced rows is kept so the
/// loader can report it.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: HashMap<SiteKey, ReferenceEntry>,
    overwritten: usize,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced (if any)
    pub fn insert(&mut self, entry: ReferenceEntry) -> Option<ReferenceEntry> {
        let previous = self.entries.insert(entry.key(), entry);
        if previous.is_some() {
            self.overwritten += 1;
        }
        previous
    }

    pub fn get(&self, key: &SiteKey) -> Option<&ReferenceEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows that replaced an earlier row for the same site
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.values()
    }
}

impl FromIterator<ReferenceEntry> for ReferenceIndex {
    fn from_iter<I: IntoIterator<Item = ReferenceEntry>>(iter: I) -> Self {
        let mut index = ReferenceIndex::new();
        for entry in iter {
            index.insert(entry);
        }
        index
    }
}

/// Load the reference table at `path` into a [`ReferenceIndex`]
///
/// # Errors
/// * `FileOpen` / `Read` - the file cannot be opened or read
/// * `MalformedRow` - a row has the wrong number of cells or is not valid UTF-8
/// * `MissingColumn` - one of [`REQUIRED_COLUMNS`] is absent
/// * `UnsupportedWorkbook` - the file is an Excel workbook
/// * `InvalidPosition` / `InvalidGeneName` - a row cannot be used
pub fn load_reference(path: impl AsRef<Path>) -> Result<ReferenceIndex, ReferenceError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let extension = lowercase_extension(path);

    if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ReferenceError::UnsupportedWorkbook { path: shown });
    }

    let delimiter = if TAB_EXTENSIONS.contains(&extension.as_str()) {
        b'\t'
    } else {
        b','
    };

    let file = File::open(path).map_err(|source| ReferenceError::FileOpen {
        path: shown.clone(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| ReferenceError::Read {
            path: shown.clone(),
            source,
        })?
        .clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ReferenceError::MissingColumn {
                path: shown,
                column: column.to_string(),
                expected: REQUIRED_COLUMNS.join(", "),
            });
        }
    }

    let mut index = ReferenceIndex::new();

    for (idx, result) in reader.deserialize::<ReferenceRow>().enumerate() {
        // Line 1 is the header
        let line = idx + 2;
        let row = result.map_err(|source| row_error(&shown, line, source))?;

        let entry = row_to_entry(row, line)?;
        debug!(
            "Loaded marker {} ({}, {}) at {}",
            entry.marker,
            entry.gene_name,
            entry.drug_resistance,
            entry.key()
        );

        if let Some(previous) = index.insert(entry) {
            warn!(
                "Reference line {} redefines site {}:{} (replacing marker {})",
                line, previous.chromosome, previous.position, previous.marker
            );
        }
    }

    info!(
        "Loaded {} resistance marker sites from {} ({} duplicate rows replaced)",
        index.len(),
        shown,
        index.overwritten()
    );

    Ok(index)
}

fn row_to_entry(row: ReferenceRow, line: usize) -> Result<ReferenceEntry, ReferenceError> {
    let position = parse_position(&row.position).ok_or_else(|| ReferenceError::InvalidPosition {
        line,
        value: row.position.clone(),
    })?;

    if !is_usable_path_component(&row.gene_name) {
        return Err(ReferenceError::InvalidGeneName {
            line,
            value: row.gene_name,
        });
    }

    Ok(ReferenceEntry {
        chromosome: row.chromosome,
        position,
        gene_name: row.gene_name,
        drug_resistance: row.drug_resistance,
        marker: row.marker,
    })
}

/// I/O failures stay file-access errors; anything else the csv reader
/// rejects (ragged rows, bad UTF-8) is a problem with the table itself
fn row_error(path: &str, line: usize, source: csv::Error) -> ReferenceError {
    if source.is_io_error() {
        return ReferenceError::Read {
            path: path.to_string(),
            source,
        };
    }

    let line = source
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(line);
    ReferenceError::MalformedRow {
        path: path.to_string(),
        line,
        source,
    }
}

/// Parse a POS cell; spreadsheet exports may render integers as "123.0"
fn parse_position(value: &str) -> Option<u64> {
    let value = value.trim();
    let digits = value.strip_suffix(".0").unwrap_or(value);
    digits.parse::<u64>().ok()
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    /// Create a temporary reference table with the given suffix
    fn create_test_file(contents: &str, suffix: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_table() {
        let contents = "\
CHROM,POS,Gene Name,Drug Resistance,Marker
2L,2422652,Vgsc,Pyrethroid,L1014F
2R,28545767,Gste2,DDT,I114T
3R,28598038,Rdl,Dieldrin,A296G
";
        let file = create_test_file(contents, ".csv");
        let index = load_reference(file.path()).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.overwritten(), 0);

        let vgsc = index.get(&SiteKey::new("2L", 2422652)).unwrap();
        assert_eq!(vgsc.gene_name, "Vgsc");
        assert_eq!(vgsc.drug_resistance, "Pyrethroid");
        assert_eq!(vgsc.marker, "L1014F");
    }

    #[test]
    fn test_duplicate_site_last_row_wins() {
        let contents = "\
CHROM,POS,Gene Name,Drug Resistance,Marker
2L,2422652,Vgsc,Pyrethroid,L1014F
2L,2422652,Vgsc,Pyrethroid,L1014S
";
        let file = create_test_file(contents, ".csv");
        let index = load_reference(file.path()).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.overwritten(), 1);
        assert_eq!(index.get(&SiteKey::new("2L", 2422652)).unwrap().marker, "L1014S");
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let contents = "\
Marker,Notes,Drug Resistance,Gene Name,POS,CHROM
L1014F,kdr west,Pyrethroid,Vgsc,2422652,2L
";
        let file = create_test_file(contents, ".csv");
        let index = load_reference(file.path()).unwrap();

        let entry = index.get(&SiteKey::new("2L", 2422652)).unwrap();
        assert_eq!(entry.gene_name, "Vgsc");
        assert_eq!(entry.marker, "L1014F");
    }

    #[test]
    fn test_tab_delimited_table() {
        let contents = "CHROM\tPOS\tGene Name\tDrug Resistance\tMarker\n2L\t2422652\tVgsc\tPyrethroid\tL1014F\n";
        let file = create_test_file(contents, ".tsv");
        let index = load_reference(file.path()).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_missing_required_column() {
        let contents = "\
CHROM,POS,Gene Name,Marker
2L,2422652,Vgsc,L1014F
";
        let file = create_test_file(contents, ".csv");
        let err = load_reference(file.path()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InputFormat);
        match err {
            ReferenceError::MissingColumn { column, .. } => assert_eq!(column, "Drug Resistance"),
            other => panic!("Expected MissingColumn error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_reference(dir.path().join("absent.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[test]
    fn test_workbook_rejected() {
        let file = create_test_file("not really a workbook", ".xlsx");
        let err = load_reference(file.path()).unwrap_err();
        assert!(matches!(err, ReferenceError::UnsupportedWorkbook { .. }));
        assert_eq!(err.kind(), ErrorKind::InputFormat);
    }

    #[test]
    fn test_spreadsheet_style_position() {
        let contents = "\
CHROM,POS,Gene Name,Drug Resistance,Marker
2L,2422652.0,Vgsc,Pyrethroid,L1014F
";
        let file = create_test_file(contents, ".csv");
        let index = load_reference(file.path()).unwrap();
        assert!(index.get(&SiteKey::new("2L", 2422652)).is_some());
    }

    #[test]
    fn test_invalid_position() {
        let contents = "\
CHROM,POS,Gene Name,Drug Resistance,Marker
2L,2422652,Vgsc,Pyrethroid,L1014F
2L,NOT_A_NUMBER,Vgsc,Pyrethroid,L1014S
";
        let file = create_test_file(contents, ".csv");
        match load_reference(file.path()).unwrap_err() {
            ReferenceError::InvalidPosition { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "NOT_A_NUMBER");
            }
            other => panic!("Expected InvalidPosition error, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row_is_format_error() {
        let contents = "\
CHROM,POS,Gene Name,Drug Resistance,Marker
2L,2422652,Vgsc,Pyrethroid,L1014F
3R,28598038,Rdl,Dieldrin
";
        let file = create_test_file(contents, ".csv");
        let err = load_reference(file.path()).unwrap_err();

        match &err {
            ReferenceError::MalformedRow { line, .. } => assert_eq!(*line, 3),
            other => panic!("Expected MalformedRow error, got {:?}", other),
        }
        assert_eq!(err.kind(), ErrorKind::InputFormat);
    }

    #[test]
    fn test_gene_name_with_path_separator() {
        let contents = "\
CHROM,POS,Gene Name,Drug Resistance,Marker
2L,2422652,../Vgsc,Pyrethroid,L1014F
";
        let file = create_test_file(contents, ".csv");
        let err = load_reference(file.path()).unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidGeneName { line: 2, .. }));
    }

    #[test]
    fn test_index_from_iterator() {
        let entry = |marker: &str| ReferenceEntry {
            chromosome: "X".to_string(),
            position: 9,
            gene_name: "Cyp6".to_string(),
            drug_resistance: "Pyrethroid".to_string(),
            marker: marker.to_string(),
        };
        let index: ReferenceIndex = vec![entry("first"), entry("second")].into_iter().collect();

        assert_eq!(index.len(), 1);
        assert_eq!(index.iter().next().unwrap().marker, "second");
    }
}
