// ==============================================================================
// models.rs - Resistance Marker Data Models
// ==============================================================================
// Description: Data structures shared by the reference loader, variant reader,
//              mutation extractor and report writer
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Genomic site used to join variants against the reference table
///
/// Kept as a structured pair rather than a joined string so chromosome names
/// containing separators (e.g. "scaffold_12") cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteKey {
    pub chromosome: String,
    pub position: u64,
}

impl SiteKey {
    pub fn new(chromosome: impl Into<String>, position: u64) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
        }
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}

/// Known resistance-marker site from the reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// Chromosome as written in the table (e.g., "2L")
    pub chromosome: String,

    /// 1-based position
    pub position: u64,

    /// Gene name (e.g., "Vgsc"); also names the report directory
    pub gene_name: String,

    /// Drug resistance descriptor (e.g., "Pyrethroid")
    pub drug_resistance: String,

    /// Marker label (e.g., "L1014F")
    pub marker: String,
}

impl ReferenceEntry {
    pub fn key(&self) -> SiteKey {
        SiteKey::new(self.chromosome.clone(), self.position)
    }
}

/// One data line of the variant file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub chromosome: String,
    pub position: u64,

    /// INFO column, free text searched for an amino-acid change token
    pub info: String,

    /// Per-sample genotype fields, aligned with the header's sample list
    pub genotypes: Vec<String>,
}

impl VariantRecord {
    pub fn key(&self) -> SiteKey {
        SiteKey::new(self.chromosome.clone(), self.position)
    }

    /// Genotype field for the sample at `sample_index` in the header order
    pub fn genotype(&self, sample_index: usize) -> Option<&str> {
        self.genotypes.get(sample_index).map(String::as_str)
    }
}

/// Ordered sample identifiers taken from the `#CHROM` header line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleList(Vec<String>);

impl SampleList {
    pub fn new(samples: Vec<String>) -> Self {
        Self(samples)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Reportable resistance mutation for one sample
///
/// Field order matches the report columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationFinding {
    #[serde(rename = "CHROM")]
    pub chromosome: String,

    #[serde(rename = "POS")]
    pub position: u64,

    #[serde(rename = "Gene Name")]
    pub gene_name: String,

    #[serde(rename = "Drug Resistance")]
    pub drug_resistance: String,

    /// Amino-acid change token, verbatim (e.g., "p.Leu1014Phe")
    #[serde(rename = "Mutation")]
    pub mutation: String,
}

/// Broad category of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input could not be read or an output could not be written
    FileAccess,
    /// An input was readable but not shaped as expected
    InputFormat,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FileAccess => "FileAccessError",
            ErrorKind::InputFormat => "InputFormatError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_key_equality_with_underscored_chromosomes() {
        use std::collections::HashSet;

        let keys: HashSet<SiteKey> = [
            SiteKey::new("scaffold_1", 2),
            SiteKey::new("scaffold_1", 2),
            SiteKey::new("scaffold", 12),
            SiteKey::new("scaffold_12", 2),
        ]
        .into_iter()
        .collect();

        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&SiteKey::new("scaffold_1", 2)));
    }

    #[test]
    fn test_site_key_display() {
        assert_eq!(SiteKey::new("2L", 2422652).to_string(), "2L:2422652");
    }

    #[test]
    fn test_variant_genotype_lookup() {
        let record = VariantRecord {
            chromosome: "2L".to_string(),
            position: 100,
            info: ".".to_string(),
            genotypes: vec!["G/A".to_string(), ".".to_string()],
        };
        assert_eq!(record.genotype(0), Some("G/A"));
        assert_eq!(record.genotype(1), Some("."));
        assert_eq!(record.genotype(2), None);
        assert_eq!(record.key(), SiteKey::new("2L", 100));
    }

    #[test]
    fn test_error_kind_str() {
        assert_eq!(ErrorKind::FileAccess.as_str(), "FileAccessError");
        assert_eq!(ErrorKind::InputFormat.as_str(), "InputFormatError");
    }
}
