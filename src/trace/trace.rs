use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ax::attribute::ProcessId;
use crate::state::state_model::ManagedItem;
use crate::state::sync::ApplyOutcome;

/// One line of the JSONL trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub operation: String,

    pub item: Option<String>,
    pub pid: Option<ProcessId>,

    pub requested_visible: Option<bool>,
    pub strategy: Option<String>,
    pub outcome: Option<String>,

    pub count: Option<usize>,
}

impl TraceEvent {
    pub fn now(operation: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            operation: operation.to_string(),
            item: None,
            pid: None,
            requested_visible: None,
            strategy: None,
            outcome: None,
            count: None,
        }
    }

    pub fn scan(count: usize, permission_granted: bool) -> Self {
        let outcome = if permission_granted { "ok" } else { "permission_missing" };
        Self::now("scan").with_count(count).with_outcome(outcome)
    }

    pub fn apply(
        operation: &str,
        item: &ManagedItem,
        visible: bool,
        outcome: ApplyOutcome,
    ) -> Self {
        let mut event = Self::now(operation).with_item(item);
        event.requested_visible = Some(visible);
        if let ApplyOutcome::Applied(strategy) = outcome {
            event.strategy = Some(strategy.to_string());
        }
        event.with_outcome(match outcome {
            ApplyOutcome::Applied(_) => "verified",
            ApplyOutcome::Demoted => "demoted",
            ApplyOutcome::IntentOnly => "intent_only",
            ApplyOutcome::PermissionMissing => "permission_missing",
        })
    }

    pub fn with_item(mut self, item: &ManagedItem) -> Self {
        self.item = Some(item.title.clone());
        self.pid = item.owning_process_id;
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}
