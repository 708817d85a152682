//! Session configuration (§6.5): the knobs governing history depth, search
//! defaults, synthesis budget, and preview truncation.

use crate::document::GrepFlags;

/// Mirrors §6.5 verbatim, with the documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub history_depth: u32,
    pub max_candidates: u32,
    pub default_fuzzy_limit: usize,
    pub preview_list_cap: usize,
    pub preview_string_cap: usize,
    pub grep_default_flags: GrepFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_depth: 32,
            max_candidates: 100,
            default_fuzzy_limit: 10,
            preview_list_cap: 20,
            preview_string_cap: 4096,
            grep_default_flags: GrepFlags::default(),
        }
    }
}
