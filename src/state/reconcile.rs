use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::menubar::extra_model::DiscoveredExtra;
use crate::state::normalize::catalog_key;
use crate::state::state_model::ManagedItem;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    /// Items created for extras seen for the first time.
    pub inserted: Vec<Uuid>,
    /// Existing items matched by this scan.
    pub refreshed: Vec<Uuid>,
    /// System-backed items this scan did not see. They stay in the catalog.
    pub stale: Vec<Uuid>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.refreshed.is_empty() && self.stale.is_empty()
    }
}

/// Merge one scan into the catalog.
///
/// Matches on `(owning process, case-insensitive title)`. A match only
/// refreshes the identifier and togglability; `id`, `is_visible` and
/// `group_id` are left alone. Nothing is ever removed.
pub fn reconcile(items: &mut Vec<ManagedItem>, extras: &[DiscoveredExtra], hide_new_by_default: bool) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let existing = items.len();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        if let Some(pid) = item.owning_process_id {
            index.entry(catalog_key(pid, &item.title)).or_insert(i);
        }
    }

    let mut matched: HashSet<usize> = HashSet::new();

    for extra in extras {
        let key = catalog_key(extra.owning_process_id, &extra.title);

        match index.get(&key) {
            Some(&i) => {
                let item = &mut items[i];
                item.ax_identifier = Some(extra.stable_identifier.clone());
                item.can_toggle_system_visibility = extra.can_toggle_visibility && !item.demoted;
                if matched.insert(i) {
                    report.refreshed.push(item.id);
                }
            }
            None => {
                let item = ManagedItem {
                    id: Uuid::new_v4(),
                    title: extra.title.clone(),
                    is_visible: !hide_new_by_default,
                    group_id: None,
                    owning_process_id: Some(extra.owning_process_id),
                    ax_identifier: Some(extra.stable_identifier.clone()),
                    can_toggle_system_visibility: extra.can_toggle_visibility,
                    demoted: false,
                };
                index.insert(key, items.len());
                matched.insert(items.len());
                report.inserted.push(item.id);
                items.push(item);
            }
        }
    }

    report.stale = items
        .iter()
        .enumerate()
        .take(existing)
        .filter(|(i, item)| item.is_system_backed() && !matched.contains(i))
        .map(|(_, item)| item.id)
        .collect();

    log::info!(
        "reconcile: {} inserted, {} refreshed, {} stale",
        report.inserted.len(),
        report.refreshed.len(),
        report.stale.len()
    );
    report
}
