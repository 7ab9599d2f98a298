// ==============================================================================
// extractor.rs - Resistance Mutation Extraction
// ==============================================================================
// Description: Joins variant records against the reference index and pulls
//              the amino-acid change token out of the INFO annotation
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Algorithm (per sample, per variant):
//   1. (CHROM, POS) not in reference index        → nothing
//   2. sample genotype field is "." (not called)  → nothing
//   3. INFO has no amino-acid change token        → nothing
//   4. otherwise → finding with the first token found
// ==============================================================================

use regex::Regex;

use crate::models::{MutationFinding, VariantRecord};
use crate::parsers::ReferenceIndex;

/// Three-letter amino-acid change notation, e.g. "p.Arg123Ser"
pub const DEFAULT_MUTATION_PATTERN: &str = r"p\.[A-Z][a-z]{2}[0-9]+[A-Z][a-z]{2}";

/// Genotype value meaning the sample was not called at this site
pub const NOT_CALLED: &str = ".";

/// Strategy for locating a mutation token in free-text annotation
pub trait MutationMatcher {
    /// Return the first mutation token in `annotation`, if any
    fn find_mutation<'a>(&self, annotation: &'a str) -> Option<&'a str>;
}

impl MutationMatcher for Regex {
    fn find_mutation<'a>(&self, annotation: &'a str) -> Option<&'a str> {
        self.find(annotation).map(|m| m.as_str())
    }
}

/// Regex-backed matcher for protein-level change tokens
#[derive(Debug, Clone)]
pub struct ProteinChangeMatcher {
    pattern: Regex,
}

impl ProteinChangeMatcher {
    /// Matcher using [`DEFAULT_MUTATION_PATTERN`]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_MUTATION_PATTERN).expect("default mutation pattern is valid"),
        }
    }

    /// Matcher using a caller-supplied notation
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for ProteinChangeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationMatcher for ProteinChangeMatcher {
    fn find_mutation<'a>(&self, annotation: &'a str) -> Option<&'a str> {
        self.pattern.find_mutation(annotation)
    }
}

/// Extract the finding for one sample at one variant
///
/// `sample_index` is the sample's position in the header's sample list. Only
/// the first token in the annotation is reported even when several are
/// present.
pub fn extract<M: MutationMatcher + ?Sized>(
    sample_index: usize,
    variant: &VariantRecord,
    reference: &ReferenceIndex,
    matcher: &M,
) -> Option<MutationFinding> {
    let entry = reference.get(&variant.key())?;

    let genotype = variant.genotype(sample_index)?;
    if genotype == NOT_CALLED {
        return None;
    }

    let mutation = matcher.find_mutation(&variant.info)?;

    Some(MutationFinding {
        chromosome: variant.chromosome.clone(),
        position: variant.position,
        gene_name: entry.gene_name.clone(),
        drug_resistance: entry.drug_resistance.clone(),
        mutation: mutation.to_string(),
    })
}
