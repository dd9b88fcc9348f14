use serde::{Deserialize, Serialize};

use crate::ax::attribute::ProcessId;

/// A menu-bar extra found by one scan. Produced fresh on every scan and
/// handed to the caller, which owns persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredExtra {
    /// Never empty; falls back to a synthesized label.
    pub title: String,

    /// Owner of the underlying element; never 0.
    pub owning_process_id: ProcessId,

    /// Key used to find the same element again on a later scan.
    pub stable_identifier: String,

    /// At least one mutation strategy is expected to work.
    pub can_toggle_visibility: bool,
}

/// Result of a visibility change attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    /// The read-back after the write matched the requested state.
    pub verified: bool,

    /// Name of the strategy that verified, if any.
    pub strategy: Option<&'static str>,
}

impl MutationOutcome {
    pub fn failed() -> Self {
        Self {
            verified: false,
            strategy: None,
        }
    }

    pub fn verified_by(strategy: &'static str) -> Self {
        Self {
            verified: true,
            strategy: Some(strategy),
        }
    }
}
