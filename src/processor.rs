// ==============================================================================
// processor.rs - Resistance Scan Pipeline
// ==============================================================================
// Description: Loads the marker reference and variant calls, extracts
//              resistance mutations per sample, and hands them to a sink
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::extractor::{extract, MutationMatcher, ProteinChangeMatcher};
use crate::output::{sample_dir, FindingSink};
use crate::parsers::{load_reference, read_variants, ReferenceIndex, VariantFile};
use crate::summary::{InputDigest, RunSummary, SampleSummary};

/// Inputs and output location for one run
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub variant_file: PathBuf,
    pub reference_file: PathBuf,
    pub output_dir: PathBuf,
}

impl ScanConfig {
    pub fn new(
        variant_file: impl Into<PathBuf>,
        reference_file: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            variant_file: variant_file.into(),
            reference_file: reference_file.into(),
            output_dir: output_dir.into(),
        }
    }
}

pub struct ResistanceScanner<M = ProteinChangeMatcher> {
    config: ScanConfig,
    matcher: M,
}

impl ResistanceScanner<ProteinChangeMatcher> {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            matcher: ProteinChangeMatcher::new(),
        }
    }
}

impl<M: MutationMatcher> ResistanceScanner<M> {
    /// Scanner using a different mutation notation
    pub fn with_matcher(config: ScanConfig, matcher: M) -> Self {
        Self { config, matcher }
    }

    /// Main processing pipeline
    pub fn run<S: FindingSink>(&self, sink: &mut S) -> Result<RunSummary> {
        info!("Starting resistance marker scan");

        // 1. Output root
        std::fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.config.output_dir.display()
            )
        })?;
        info!("Created main output directory: {}", self.config.output_dir.display());

        // 2. Reference lookup
        let reference = load_reference(&self.config.reference_file)
            .context("Failed to load resistance marker reference")?;

        // 3. Variant calls
        let variants = read_variants(&self.config.variant_file)
            .context("Failed to read variant file")?;

        // 4. Input provenance
        let variant_digest = InputDigest::compute(&self.config.variant_file)
            .context("Failed to hash variant file")?;
        let reference_digest = InputDigest::compute(&self.config.reference_file)
            .context("Failed to hash reference table")?;

        // 5. Extract and record, sample by sample
        let samples = self.scan(&reference, &variants, sink)?;

        let summary = RunSummary {
            generated_at: Utc::now(),
            variant_file: variant_digest,
            reference_file: reference_digest,
            output_dir: self.config.output_dir.clone(),
            reference_sites: reference.len(),
            variant_records: variants.records.len(),
            total_findings: samples.iter().map(|s| s.findings).sum(),
            samples,
        };

        info!("Processing complete, results in {}", self.config.output_dir.display());
        Ok(summary)
    }

    /// Run the extractor over every (sample, variant) pair in file order
    pub fn scan<S: FindingSink>(
        &self,
        reference: &ReferenceIndex,
        variants: &VariantFile,
        sink: &mut S,
    ) -> Result<Vec<SampleSummary>> {
        let mut summaries = Vec::with_capacity(variants.samples.len());

        for (sample_index, sample) in variants.samples.iter().enumerate() {
            let dir = sample_dir(&self.config.output_dir, sample);
            sink.begin_sample(&dir)
                .with_context(|| format!("Failed to prepare results for sample {}", sample))?;

            let mut sample_summary = SampleSummary::new(sample, dir.clone());

            for variant in &variants.records {
                let Some(finding) = extract(sample_index, variant, reference, &self.matcher) else {
                    continue;
                };

                debug!(
                    "Found mutation {} at CHROM {}, POS {} for sample {}",
                    finding.mutation, finding.chromosome, finding.position, sample
                );

                sink.record(&dir, &finding)
                    .with_context(|| format!("Failed to record finding for sample {}", sample))?;
                sample_summary.add_finding(&finding.gene_name);
            }

            info!("Sample {}: {} resistance findings", sample, sample_summary.findings);
            summaries.push(sample_summary);
        }

        Ok(summaries)
    }
}
