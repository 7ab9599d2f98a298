// ==============================================================================
// parsers/variants.rs - Tab-Delimited Variant File Parser
// ==============================================================================
// Description: Reads the sample list and per-variant records from a VCF-style
//              text file (plain or gzip/BGZF compressed)
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Format: Tab-delimited text
// Example:
//   ##fileformat=VCFv4.2
//   #CHROM  POS      ID  REF  ALT  QUAL  FILTER  INFO          FORMAT  S1   S2
//   2L      2422652  .   .    .    .     .       p.Leu1014Phe  .       G/A  .
// Columns used: CHROM (1), POS (2), INFO (8), one genotype per sample (10+).
// ==============================================================================

use flate2::read::MultiGzDecoder;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::is_usable_path_component;
use crate::models::{ErrorKind, SampleList, VariantRecord};

/// Prefix of the header line that declares the sample columns
pub const HEADER_PREFIX: &str = "#CHROM";

/// Number of fixed columns preceding the first sample column
pub const FIXED_COLUMNS: usize = 9;

const CHROM_COLUMN: usize = 0;
const POS_COLUMN: usize = 1;
const INFO_COLUMN: usize = 7;

/// Errors that can occur while reading the variant file
#[derive(Error, Debug)]
pub enum VariantError {
    #[error("Failed to open variant file {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read variant file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Variant file {path} has no '#CHROM' header line before its data")]
    MissingHeader { path: String },

    #[error("Variant line {line} has {found} columns, expected at least {expected} (9 fixed + {samples} samples)")]
    TooFewColumns {
        line: usize,
        found: usize,
        expected: usize,
        samples: usize,
    },

    #[error("Invalid POS value at variant line {line}: '{value}'")]
    InvalidPosition { line: usize, value: String },

    #[error("Unusable sample ID in '#CHROM' header at line {line}, column {column}: '{value}' (sample IDs become directory names)")]
    InvalidSampleId {
        line: usize,
        column: usize,
        value: String,
    },
}

impl VariantError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VariantError::FileOpen { .. } | VariantError::Read { .. } => ErrorKind::FileAccess,
            VariantError::MissingHeader { .. }
            | VariantError::TooFewColumns { .. }
            | VariantError::InvalidPosition { .. }
            | VariantError::InvalidSampleId { .. } => ErrorKind::InputFormat,
        }
    }
}

/// Parsed variant file: declared samples plus all data lines in file order
#[derive(Debug, Clone, Default)]
pub struct VariantFile {
    pub samples: SampleList,
    pub records: Vec<VariantRecord>,
}

/// Read the variant file at `path`
///
/// Files ending in `.gz` are decompressed on the fly. Metadata lines (`##...`)
/// are skipped; the `#CHROM` line supplies the sample list and must precede
/// the first data line. Sample IDs must be usable as directory names.
pub fn read_variants(path: impl AsRef<Path>) -> Result<VariantFile, VariantError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let file = File::open(path).map_err(|source| VariantError::FileOpen {
        path: shown.clone(),
        source,
    })?;

    let is_gzipped = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let reader: Box<dyn Read> = if is_gzipped {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let variants = parse_variants(BufReader::new(reader), &shown)?;

    info!(
        "Read {} variant records for {} samples from {}",
        variants.records.len(),
        variants.samples.len(),
        shown
    );

    Ok(variants)
}

/// Parse variant lines from any buffered reader; `source` names the input in errors
pub fn parse_variants<R: BufRead>(reader: R, source: &str) -> Result<VariantFile, VariantError> {
    let mut samples: Option<SampleList> = None;
    let mut records = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result.map_err(|e| VariantError::Read {
            path: source.to_string(),
            source: e,
        })?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('#') {
            if line.starts_with(HEADER_PREFIX) && samples.is_none() {
                let header = parse_header(line, line_number)?;
                info!("Samples found: {:?}", header.iter().collect::<Vec<_>>());
                samples = Some(header);
            }
            continue;
        }

        let sample_list = samples.as_ref().ok_or_else(|| VariantError::MissingHeader {
            path: source.to_string(),
        })?;

        records.push(parse_record(line, line_number, sample_list.len())?);
    }

    let samples = samples.ok_or_else(|| VariantError::MissingHeader {
        path: source.to_string(),
    })?;

    Ok(VariantFile { samples, records })
}

/// Split the `#CHROM` line; columns from the 10th onward are sample IDs
fn parse_header(line: &str, line_number: usize) -> Result<SampleList, VariantError> {
    let mut sample_ids = Vec::new();

    for (idx, id) in line.split('\t').enumerate().skip(FIXED_COLUMNS) {
        if !is_usable_path_component(id) {
            return Err(VariantError::InvalidSampleId {
                line: line_number,
                column: idx + 1,
                value: id.to_string(),
            });
        }
        sample_ids.push(id.to_string());
    }

    let mut seen = HashSet::new();
    for id in &sample_ids {
        if !seen.insert(id.as_str()) {
            warn!("Sample '{}' is declared more than once; its reports will be merged", id);
        }
    }

    Ok(SampleList::new(sample_ids))
}

fn parse_record(line: &str, line_number: usize, sample_count: usize) -> Result<VariantRecord, VariantError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let expected = FIXED_COLUMNS + sample_count;

    // expected >= 9, so CHROM, POS and INFO are always present past this check
    if fields.len() < expected {
        return Err(VariantError::TooFewColumns {
            line: line_number,
            found: fields.len(),
            expected,
            samples: sample_count,
        });
    }

    let position_str = fields[POS_COLUMN];
    let position = position_str.parse::<u64>().map_err(|_| VariantError::InvalidPosition {
        line: line_number,
        value: position_str.to_string(),
    })?;

    let genotypes = fields[FIXED_COLUMNS..expected]
        .iter()
        .map(|g| g.to_string())
        .collect();

    debug!("Parsed variant {}:{} at line {}", fields[CHROM_COLUMN], position, line_number);

    Ok(VariantRecord {
        chromosome: fields[CHROM_COLUMN].to_string(),
        position,
        info: fields[INFO_COLUMN].to_string(),
        genotypes,
    })
}
