// ==============================================================================
// parsers/mod.rs - Input file parser modules
// ==============================================================================
// Description: Parsers for the resistance marker reference table and the
//              tab-delimited variant file
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod reference;
pub mod variants;

pub use reference::{load_reference, ReferenceError, ReferenceIndex, REQUIRED_COLUMNS};
pub use variants::{parse_variants, read_variants, VariantError, VariantFile};

/// Whether `name` can be used as a single directory name under the output root
///
/// Sample IDs and gene names both become directories; anything that could
/// climb out of (or replace) the output directory is refused.
pub(crate) fn is_usable_path_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_path_components() {
        assert!(is_usable_path_component("Vgsc"));
        assert!(is_usable_path_component("AG1000G-BF-A.01"));

        assert!(!is_usable_path_component(""));
        assert!(!is_usable_path_component("."));
        assert!(!is_usable_path_component(".."));
        assert!(!is_usable_path_component("../escaped"));
        assert!(!is_usable_path_component("/tmp/abs"));
        assert!(!is_usable_path_component("dir\\name"));
        assert!(!is_usable_path_component("nul\0byte"));
    }
}
