// ==============================================================================
// lib.rs - Resistance Scanner Library
// ==============================================================================
// Description: Library interface for resistance marker scanning modules
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod parsers;
pub mod models;
pub mod extractor;
pub mod output;
pub mod summary;
pub mod processor;

pub use extractor::{extract, MutationMatcher, ProteinChangeMatcher};
pub use models::{ErrorKind, MutationFinding, ReferenceEntry, SampleList, SiteKey, VariantRecord};
pub use output::{CsvReportWriter, FindingSink, MemorySink};
pub use processor::{ResistanceScanner, ScanConfig};
pub use summary::RunSummary;
