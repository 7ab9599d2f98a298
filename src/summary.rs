// ==============================================================================
// summary.rs - Run Summary and Input Provenance
// ==============================================================================
// Description: Per-run record of inputs (with SHA-256 digests), outputs and
//              finding counts per sample and gene
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Input file and its content digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDigest {
    pub path: PathBuf,
    pub sha256: String,
}

impl InputDigest {
    pub fn compute(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            sha256: compute_sha256(path)?,
        })
    }
}

/// Findings for one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub sample: String,
    pub result_dir: PathBuf,
    pub findings: usize,
    /// Finding count per gene, sorted by gene name
    pub genes: BTreeMap<String, usize>,
}

impl SampleSummary {
    pub fn new(sample: impl Into<String>, result_dir: PathBuf) -> Self {
        Self {
            sample: sample.into(),
            result_dir,
            findings: 0,
            genes: BTreeMap::new(),
        }
    }

    pub fn add_finding(&mut self, gene_name: &str) {
        self.findings += 1;
        *self.genes.entry(gene_name.to_string()).or_insert(0) += 1;
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub variant_file: InputDigest,
    pub reference_file: InputDigest,
    pub output_dir: PathBuf,
    pub reference_sites: usize,
    pub variant_records: usize,
    pub total_findings: usize,
    pub samples: Vec<SampleSummary>,
}

impl RunSummary {
    /// Samples with at least one finding
    pub fn samples_with_findings(&self) -> usize {
        self.samples.iter().filter(|s| s.findings > 0).count()
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Failed to write summary file {}", path.display()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!("Wrote run summary to {}", path.display());
        Ok(())
    }

    /// Emit the summary through the logging layer
    pub fn log(&self) {
        info!(
            "Run summary: {} findings across {} of {} samples ({} reference sites, {} variant records)",
            self.total_findings,
            self.samples_with_findings(),
            self.samples.len(),
            self.reference_sites,
            self.variant_records
        );
        for sample in &self.samples {
            for (gene, count) in &sample.genes {
                info!("  {}: {} {} finding(s)", sample.sample, count, gene);
            }
        }
    }
}

/// SHA-256 of a file's contents, lowercase hex
pub fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_sha256_known_value() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        file.flush().unwrap();

        assert_eq!(
            compute_sha256(file.path()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sample_summary_counts() {
        let mut sample = SampleSummary::new("S1", PathBuf::from("out/S1_result"));
        sample.add_finding("Vgsc");
        sample.add_finding("Vgsc");
        sample.add_finding("Rdl");

        assert_eq!(sample.findings, 3);
        assert_eq!(sample.genes.get("Vgsc"), Some(&2));
        assert_eq!(sample.genes.keys().collect::<Vec<_>>(), vec!["Rdl", "Vgsc"]);
    }

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let mut s1 = SampleSummary::new("S1", dir.path().join("S1_result"));
        s1.add_finding("Vgsc");

        let summary = RunSummary {
            generated_at: Utc::now(),
            variant_file: InputDigest {
                path: PathBuf::from("calls.vcf"),
                sha256: "00".to_string(),
            },
            reference_file: InputDigest {
                path: PathBuf::from("markers.csv"),
                sha256: "11".to_string(),
            },
            output_dir: dir.path().to_path_buf(),
            reference_sites: 1,
            variant_records: 1,
            total_findings: 1,
            samples: vec![s1, SampleSummary::new("S2", dir.path().join("S2_result"))],
        };
        assert_eq!(summary.samples_with_findings(), 1);

        let path = dir.path().join("summary.json");
        summary.write_json(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_findings"], 1);
        assert_eq!(value["samples"][0]["genes"]["Vgsc"], 1);
        assert_eq!(value["reference_file"]["sha256"], "11");
    }
}
