// ==============================================================================
// output.rs - Per-Sample, Per-Gene Mutation Reports
// ==============================================================================
// Description: Appends resistance findings to CSV reports laid out as
//              <sample_dir>/<gene>/<gene>_mutations.csv
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Reports are append-only. The header row is written once, when the file is
// first created; files left by an earlier run are appended to as-is, so
// re-running over the same output directory duplicates rows.
// ==============================================================================

use csv::WriterBuilder;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{ErrorKind, MutationFinding};

/// Header row of every mutation report
pub const REPORT_HEADER: [&str; 5] = ["CHROM", "POS", "Gene Name", "Drug Resistance", "Mutation"];

/// Suffix appended to the sample ID to name its result directory
pub const SAMPLE_DIR_SUFFIX: &str = "_result";

/// Errors that can occur while writing reports
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open report {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to flush report {path}: {source}")]
    Flush {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::FileAccess
    }
}

/// Result directory for a sample: `<output_dir>/<sample>_result`
pub fn sample_dir(output_dir: &Path, sample: &str) -> PathBuf {
    output_dir.join(format!("{}{}", sample, SAMPLE_DIR_SUFFIX))
}

/// Report file for a gene: `<sample_dir>/<gene>/<gene>_mutations.csv`
pub fn report_path(sample_dir: &Path, gene_name: &str) -> PathBuf {
    sample_dir
        .join(gene_name)
        .join(format!("{}_mutations.csv", gene_name))
}

/// Destination for findings produced by the pipeline
pub trait FindingSink {
    /// Called once per declared sample before any of its findings
    fn begin_sample(&mut self, _sample_dir: &Path) -> Result<(), ReportError> {
        Ok(())
    }

    /// Record one finding for the sample whose result directory is `sample_dir`
    fn record(&mut self, sample_dir: &Path, finding: &MutationFinding) -> Result<(), ReportError>;
}

/// Filesystem sink writing CSV reports
///
/// Tracks which report paths already have a header for the duration of the
/// run; the filesystem is only checked the first time a path is seen.
#[derive(Debug, Default)]
pub struct CsvReportWriter {
    initialized: HashSet<PathBuf>,
    rows_written: usize,
}

impl CsvReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of data rows appended so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Report paths touched during this run
    pub fn reports(&self) -> impl Iterator<Item = &Path> {
        self.initialized.iter().map(PathBuf::as_path)
    }

    /// Ensure the gene directory exists; returns whether a header is owed
    fn prepare(&mut self, path: &Path) -> Result<bool, ReportError> {
        if self.initialized.contains(path) {
            return Ok(false);
        }

        if let Some(gene_dir) = path.parent() {
            fs::create_dir_all(gene_dir).map_err(|source| ReportError::CreateDir {
                path: gene_dir.display().to_string(),
                source,
            })?;
        }

        let needs_header = !path.is_file();
        if needs_header {
            info!("Initialized mutation report: {}", path.display());
        } else {
            debug!("Appending to existing report: {}", path.display());
        }

        self.initialized.insert(path.to_path_buf());
        Ok(needs_header)
    }
}

impl FindingSink for CsvReportWriter {
    fn begin_sample(&mut self, sample_dir: &Path) -> Result<(), ReportError> {
        fs::create_dir_all(sample_dir).map_err(|source| ReportError::CreateDir {
            path: sample_dir.display().to_string(),
            source,
        })?;
        debug!("Created sample directory: {}", sample_dir.display());
        Ok(())
    }

    fn record(&mut self, sample_dir: &Path, finding: &MutationFinding) -> Result<(), ReportError> {
        let path = report_path(sample_dir, &finding.gene_name);
        let shown = path.display().to_string();
        let needs_header = self.prepare(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ReportError::Open {
                path: shown.clone(),
                source,
            })?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer
                .write_record(REPORT_HEADER)
                .map_err(|source| ReportError::Write {
                    path: shown.clone(),
                    source,
                })?;
        }

        writer.serialize(finding).map_err(|source| ReportError::Write {
            path: shown.clone(),
            source,
        })?;

        writer.flush().map_err(|source| ReportError::Flush {
            path: shown.clone(),
            source,
        })?;

        self.rows_written += 1;
        debug!(
            "Recorded mutation in {}: {},{},{},{},{}",
            shown,
            finding.chromosome,
            finding.position,
            finding.gene_name,
            finding.drug_resistance,
            finding.mutation
        );

        Ok(())
    }
}

/// In-memory sink, keeps findings in arrival order
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub sample_dirs: Vec<PathBuf>,
    pub findings: Vec<(PathBuf, MutationFinding)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Findings recorded under `sample_dir`
    pub fn findings_for(&self, sample_dir: &Path) -> Vec<&MutationFinding> {
        self.findings
            .iter()
            .filter(|(dir, _)| dir == sample_dir)
            .map(|(_, finding)| finding)
            .collect()
    }
}

impl FindingSink for MemorySink {
    fn begin_sample(&mut self, sample_dir: &Path) -> Result<(), ReportError> {
        self.sample_dirs.push(sample_dir.to_path_buf());
        Ok(())
    }

    fn record(&mut self, sample_dir: &Path, finding: &MutationFinding) -> Result<(), ReportError> {
        self.findings.push((sample_dir.to_path_buf(), finding.clone()));
        Ok(())
    }
}
