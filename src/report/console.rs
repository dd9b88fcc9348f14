use uuid::Uuid;

use crate::menubar::extra_model::DiscoveredExtra;
use crate::state::reconcile::ReconcileReport;
use crate::state::state_model::{ManagedItem, PersistedState};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format one scan's results.
///
/// ```text
/// === Scan: 2 menu-bar extras ===
///
/// ✓ Dropbox             pid 412   com.getdropbox.dropbox.status
/// · Wi-Fi               pid 88    AXMenuBarItem::wi-fi
/// ```
///
/// `✓` marks extras whose visibility can be changed.
pub fn format_scan(extras: &[DiscoveredExtra]) -> String {
    let mut out = format!("=== Scan: {} menu-bar extras ===\n\n", extras.len());

    for extra in extras {
        let marker = if extra.can_toggle_visibility { "\u{2713}" } else { "\u{b7}" };
        out.push_str(&format!(
            "{} {:<24} pid {:<7} {}\n",
            marker, extra.title, extra.owning_process_id, extra.stable_identifier
        ));
    }

    out
}

/// Format the catalog the way the status menu lays it out: every group
/// with its items, then ungrouped items.
pub fn format_catalog(state: &PersistedState) -> String {
    let mut out = String::new();

    let master = if state.preferences.shows_managed_items { "shown" } else { "hidden" };
    out.push_str(&format!("=== Managed items ({}) ===\n", master));

    for group in &state.groups {
        out.push_str(&format!("\n[{}]\n", group.title));
        let members: Vec<&ManagedItem> = state
            .items
            .iter()
            .filter(|i| i.group_id == Some(group.id))
            .collect();
        if members.is_empty() {
            out.push_str("  No items\n");
        }
        for item in members {
            out.push_str(&format_item(item));
        }
    }

    let ungrouped: Vec<&ManagedItem> = state.items.iter().filter(|i| i.group_id.is_none()).collect();
    if !ungrouped.is_empty() {
        out.push('\n');
        for item in ungrouped {
            out.push_str(&format_item(item));
        }
    }

    out
}

fn format_item(item: &ManagedItem) -> String {
    let check = if item.is_visible { "[x]" } else { "[ ]" };
    let kind = match (item.owning_process_id, item.can_toggle_system_visibility) {
        (None, _) => "placeholder".to_string(),
        (Some(pid), true) => format!("pid {pid}"),
        (Some(pid), false) => format!("pid {pid}, not controllable"),
    };
    format!("  {} {} ({}) {}\n", check, item.title, kind, short_id(item.id))
}

pub fn format_reconcile(report: &ReconcileReport, changed: bool) -> String {
    let mut out = format!(
        "=== Merged: {} new, {} refreshed, {} stale ===\n",
        report.inserted.len(),
        report.refreshed.len(),
        report.stale.len()
    );
    if !changed {
        out.push_str("(menu bar unchanged since last scan)\n");
    }
    out
}

/// First block of a uuid, enough to address an item from the CLI.
pub fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
