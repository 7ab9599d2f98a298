// ==============================================================================
// main.rs - Resistance Scanner Entry Point
// ==============================================================================
// Description: Command-line entry point: scan variant calls for known
//              drug-resistance markers and write per-sample gene reports
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resistance_scanner::extractor::DEFAULT_MUTATION_PATTERN;
use resistance_scanner::{CsvReportWriter, ProteinChangeMatcher, ResistanceScanner, ScanConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Variant file (tab-delimited, VCF-style; .gz accepted)
    variant_file: PathBuf,

    /// Resistance marker reference table (CSV, or TSV for .tsv/.tab/.txt)
    reference_file: PathBuf,

    /// Directory receiving one <sample>_result folder per sample
    output_dir: PathBuf,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Regular expression locating the amino-acid change in the INFO column
    #[arg(
        long,
        value_name = "REGEX",
        default_value = DEFAULT_MUTATION_PATTERN,
        value_parser = ProteinChangeMatcher::with_pattern
    )]
    mutation_pattern: ProteinChangeMatcher,
}

fn main() -> Result<()> {
    // Initialize tracing (stdout is reserved for the completion message)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resistance_scanner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Usage errors exit with 1 before any file is touched
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    info!("Resistance scanner starting...");
    info!("Mutation pattern: {}", args.mutation_pattern.as_str());

    let config = ScanConfig::new(args.variant_file, args.reference_file, args.output_dir);
    let scanner = ResistanceScanner::with_matcher(config, args.mutation_pattern);
    let mut writer = CsvReportWriter::new();

    match scanner.run(&mut writer) {
        Ok(summary) => {
            summary.log();
            if let Some(path) = &args.summary {
                summary.write_json(path)?;
            }

            println!(
                "Processing complete! {} mutation(s) recorded for {} sample(s). Results saved in {}",
                summary.total_findings,
                summary.samples.len(),
                summary.output_dir.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Processing failed: {:#}", e);
            Err(e)
        }
    }
}
