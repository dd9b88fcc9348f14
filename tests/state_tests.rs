use stein::{
    ax::{attribute, attribute::ScalarValue},
    error::SteinError,
    menubar::{engine::MenuBarEngine, indexer::IndexerConfig},
    platform::fixture::FixtureDesktop,
    refresh_catalog,
    state::{
        normalize::catalog_fingerprint,
        reconcile::reconcile,
        state_model::{ManagedItem, PersistedState},
        store::AppStateStore,
        sync::{ApplyOutcome, apply_toggle_all, apply_visibility},
    },
};
use tempfile::TempDir;
use uuid::Uuid;

mod common;

use crate::common::utils::{SYSTEM_UI_PID, extra, menu_item, standard_desktop, system_ui};

fn temp_store() -> (TempDir, AppStateStore) {
    let dir = TempDir::new().unwrap();
    let store = AppStateStore::open(&dir.path().join("state.json")).unwrap();
    (dir, store)
}

fn item_titled<'a>(store: &'a AppStateStore, title: &str) -> &'a ManagedItem {
    store
        .state()
        .items
        .iter()
        .find(|i| i.title == title)
        .unwrap_or_else(|| panic!("no item titled '{title}'"))
}

// =========================================================================
// Reconciliation
// =========================================================================

#[test]
fn reconcile_inserts_new_extras() {
    let mut items = Vec::new();
    let report = reconcile(&mut items, &[extra("Clock", 88, true), extra("Wi-Fi", 88, false)], false);

    assert_eq!(report.inserted.len(), 2);
    assert!(report.refreshed.is_empty() && report.stale.is_empty());
    assert!(items.iter().all(|i| i.is_visible && i.group_id.is_none() && !i.demoted));
    assert_eq!(items[1].ax_identifier.as_deref(), Some("AXMenuBarItem::wi-fi"));
    assert!(!items[1].can_toggle_system_visibility);
}

#[test]
fn reconcile_keeps_identity_and_user_choices() {
    let group = Uuid::new_v4();
    let mut items = Vec::new();
    reconcile(&mut items, &[extra("Clock", 88, true)], false);
    let id = items[0].id;
    items[0].is_visible = false;
    items[0].group_id = Some(group);

    let mut drifted = extra("CLOCK", 88, false);
    drifted.stable_identifier = "com.apple.clock".into();
    let report = reconcile(&mut items, &[drifted], false);

    assert_eq!(report.refreshed, vec![id]);
    assert!(report.inserted.is_empty());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert!(!items[0].is_visible);
    assert_eq!(items[0].group_id, Some(group));
    assert_eq!(items[0].title, "Clock", "Title kept as first seen");
    assert_eq!(items[0].ax_identifier.as_deref(), Some("com.apple.clock"));
    assert!(!items[0].can_toggle_system_visibility);
}

#[test]
fn reconcile_never_merges_across_processes() {
    let mut items = Vec::new();
    reconcile(&mut items, &[extra("Clock", 88, true)], false);
    let report = reconcile(&mut items, &[extra("Clock", 89, true)], false);

    assert_eq!(report.inserted.len(), 1);
    assert_eq!(report.stale, vec![items[0].id]);
    assert_eq!(items.len(), 2);
}

#[test]
fn reconcile_hides_new_items_when_asked() {
    let mut items = vec![ManagedItem::placeholder("Notes", true)];
    let report = reconcile(&mut items, &[extra("Clock", 88, true)], true);

    assert_eq!(report.inserted.len(), 1);
    assert!(!items[1].is_visible);
    assert!(items[0].is_visible, "Placeholder untouched");
    assert!(report.stale.is_empty(), "Placeholders are never stale");
}

#[test]
fn demoted_items_stay_uncontrollable() {
    let mut items = Vec::new();
    reconcile(&mut items, &[extra("Clock", 88, true)], false);
    items[0].demoted = true;
    items[0].can_toggle_system_visibility = false;

    reconcile(&mut items, &[extra("Clock", 88, true)], false);
    assert!(!items[0].can_toggle_system_visibility);
}

// =========================================================================
// Store persistence
// =========================================================================

#[test]
fn open_creates_the_state_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");
    let store = AppStateStore::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(store.state(), &PersistedState::default());
    assert!(store.state().preferences.shows_managed_items);
    assert_eq!(store.state().preferences.menu_bar_symbol_name, "wineglass");
}

#[test]
fn changes_survive_reopening() {
    let (dir, mut store) = temp_store();
    let group = store.add_group("Work", None).unwrap();
    let item = store.add_item("Notes").unwrap();
    store.assign(item, Some(group)).unwrap();
    store.set_hide_new_items_by_default(true).unwrap();
    store.merge_scan(&[extra("Clock", 88, true)]).unwrap();

    let reopened = AppStateStore::open(&dir.path().join("state.json")).unwrap();
    assert_eq!(reopened.state(), store.state());
    assert_eq!(reopened.state().groups[0].symbol_name, "square.grid.2x2");
    assert_eq!(reopened.item(item).unwrap().group_id, Some(group));
    assert!(reopened.state().last_scan_fingerprint.is_some());
}

#[test]
fn malformed_state_is_kept_as_a_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    let backup = dir.path().join("state.json.bak");
    std::fs::write(&path, "{ not json").unwrap();

    let mut store = AppStateStore::open(&path).unwrap();
    assert!(store.state().items.is_empty());
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{ not json");

    // The first save writes fresh state and leaves the backup alone.
    let id = store.add_item("Notes").unwrap();
    let reopened = AppStateStore::open(&path).unwrap();
    assert_eq!(reopened.item(id).unwrap().title, "Notes");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{ not json");
}

#[test]
fn merge_scan_reports_unchanged_menu_bars() {
    let (_dir, mut store) = temp_store();
    let scan = [extra("Clock", 88, true), extra("Wi-Fi", 88, true)];

    let (first, changed) = store.merge_scan(&scan).unwrap();
    assert_eq!(first.inserted.len(), 2);
    assert!(changed);

    let (second, changed) = store.merge_scan(&scan).unwrap();
    assert_eq!(second.refreshed, first.inserted);
    assert!(!changed);
    assert_eq!(store.state().last_scan_fingerprint.as_deref(), Some(catalog_fingerprint(&scan).as_str()));

    let (third, changed) = store.merge_scan(&scan[..1]).unwrap();
    assert!(changed);
    assert_eq!(third.stale, vec![item_titled(&store, "Wi-Fi").id]);
    assert_eq!(store.state().items.len(), 2, "Stale items stay in the catalog");
}

#[test]
fn new_items_follow_the_hide_preference() {
    let (_dir, mut store) = temp_store();
    store.set_hide_new_items_by_default(true).unwrap();

    let placeholder = store.add_item("Notes").unwrap();
    store.merge_scan(&[extra("Clock", 88, true)]).unwrap();

    assert!(!store.item(placeholder).unwrap().is_visible);
    assert!(!item_titled(&store, "Clock").is_visible);
}

#[test]
fn toggle_all_aligns_every_item() {
    let (_dir, mut store) = temp_store();
    let a = store.add_item("A").unwrap();
    let b = store.add_item("B").unwrap();
    store.set_visibility(b, false).unwrap();

    assert!(!store.toggle_all_managed_items().unwrap());
    assert!(!store.item(a).unwrap().is_visible);
    assert!(!store.item(b).unwrap().is_visible);

    assert!(store.toggle_all_managed_items().unwrap());
    assert!(store.item(a).unwrap().is_visible && store.item(b).unwrap().is_visible);
}

#[test]
fn assign_rejects_unknown_groups() {
    let (_dir, mut store) = temp_store();
    let item = store.add_item("Notes").unwrap();

    let err = store.assign(item, Some(Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, SteinError::GroupNotFound(_)));

    let group = store.add_group("Work", Some("briefcase")).unwrap();
    assert_eq!(store.resolve_group("work").unwrap(), group);
    store.assign(item, Some(group)).unwrap();
    store.assign(item, None).unwrap();
    assert_eq!(store.item(item).unwrap().group_id, None);
}

#[test]
fn items_resolve_by_id_or_prefix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    let json = r#"{
        "items": [
            { "id": "aaaaaaaa-0000-4000-8000-000000000001", "title": "One", "is_visible": true },
            { "id": "aaaaaaaa-1111-4000-8000-000000000002", "title": "Two", "is_visible": true }
        ]
    }"#;
    std::fs::write(&path, json).unwrap();
    let store = AppStateStore::open(&path).unwrap();

    let two = Uuid::parse_str("aaaaaaaa-1111-4000-8000-000000000002").unwrap();
    assert_eq!(store.resolve_item("aaaaaaaa-1111-4000-8000-000000000002").unwrap(), two);
    assert_eq!(store.resolve_item("aaaaaaaa-1").unwrap(), two);
    assert_eq!(store.resolve_item("AAAAAAAA-1").unwrap(), two);
    assert!(matches!(store.resolve_item("aaaa"), Err(SteinError::AmbiguousItem(_))));
    assert!(matches!(store.resolve_item("bbbb"), Err(SteinError::ItemNotFound(_))));
    assert!(matches!(store.resolve_item(""), Err(SteinError::ItemNotFound(_))));
}

// =========================================================================
// Pushing intent to the live menu bar
// =========================================================================

#[test]
fn refresh_catalog_merges_a_live_scan() {
    let desktop = standard_desktop();
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (_dir, mut store) = temp_store();

    let report = refresh_catalog(&engine, &mut store).unwrap().unwrap();
    assert_eq!(report.inserted.len(), 4);
    assert!(item_titled(&store, "Dropbox").can_toggle_system_visibility);
    assert!(!item_titled(&store, "Dropbox menu item").can_toggle_system_visibility);
}

#[test]
fn refresh_catalog_without_permission_leaves_the_catalog_alone() {
    let desktop = standard_desktop();
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (_dir, mut store) = temp_store();
    refresh_catalog(&engine, &mut store).unwrap();
    let before = store.state().clone();

    desktop.set_permission(false);
    assert!(refresh_catalog(&engine, &mut store).unwrap().is_none());
    assert_eq!(store.state(), &before);
}

#[test]
fn apply_visibility_changes_the_screen() {
    let desktop = standard_desktop();
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (_dir, mut store) = temp_store();
    refresh_catalog(&engine, &mut store).unwrap();
    let id = item_titled(&store, "Wi-Fi").id;

    let (outcome, mutation) = apply_visibility(&mut store, &engine, id, false).unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied("hidden_attribute"));
    assert!(mutation.verified);
    assert!(!store.item(id).unwrap().is_visible);

    let node = desktop.node_titled("Wi-Fi").unwrap();
    assert_eq!(desktop.peek(node, attribute::HIDDEN), Some(ScalarValue::Bool(true)));
}

#[test]
fn failed_change_demotes_but_keeps_intent() {
    let desktop = FixtureDesktop::new(system_ui(vec![menu_item("Stubborn").sticky(attribute::HIDDEN)]));
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (dir, mut store) = temp_store();
    refresh_catalog(&engine, &mut store).unwrap();
    let id = item_titled(&store, "Stubborn").id;
    assert!(store.item(id).unwrap().can_toggle_system_visibility);

    let (outcome, _) = apply_visibility(&mut store, &engine, id, false).unwrap();
    assert_eq!(outcome, ApplyOutcome::Demoted);

    let item = store.item(id).unwrap();
    assert!(!item.is_visible);
    assert!(item.demoted && !item.can_toggle_system_visibility);

    // The next attempt records intent only, and a rescan does not re-enable it.
    let (outcome, _) = apply_visibility(&mut store, &engine, id, true).unwrap();
    assert_eq!(outcome, ApplyOutcome::IntentOnly);
    refresh_catalog(&engine, &mut store).unwrap();

    let reopened = AppStateStore::open(&dir.path().join("state.json")).unwrap();
    let item = reopened.item(id).unwrap();
    assert!(item.is_visible);
    assert!(!item.can_toggle_system_visibility);
    assert_eq!(item.owning_process_id, Some(SYSTEM_UI_PID));
}

#[test]
fn placeholders_only_record_intent() {
    let desktop = standard_desktop();
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (_dir, mut store) = temp_store();
    let id = store.add_item("Notes").unwrap();

    let before = desktop.probe_calls();
    let (outcome, mutation) = apply_visibility(&mut store, &engine, id, false).unwrap();
    assert_eq!(outcome, ApplyOutcome::IntentOnly);
    assert!(!mutation.verified);
    assert!(!store.item(id).unwrap().is_visible);
    assert_eq!(desktop.probe_calls(), before);
}

#[test]
fn toggle_all_pushes_to_every_controllable_item() {
    let desktop = standard_desktop();
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (_dir, mut store) = temp_store();
    refresh_catalog(&engine, &mut store).unwrap();
    store.add_item("Notes").unwrap();

    let outcomes = apply_toggle_all(&mut store, &engine).unwrap();
    assert_eq!(outcomes.len(), 5);
    let applied = outcomes.iter().filter(|(_, o)| matches!(o, ApplyOutcome::Applied(_))).count();
    assert_eq!(applied, 3, "Clock, Dropbox, Wi-Fi");
    assert!(store.state().items.iter().all(|i| !i.is_visible));

    for title in ["Clock", "Dropbox", "Wi-Fi"] {
        let node = desktop.node_titled(title).unwrap();
        assert_eq!(desktop.peek(node, attribute::HIDDEN), Some(ScalarValue::Bool(true)));
    }
}

#[test]
fn missing_permission_records_intent_without_demoting() {
    let desktop = standard_desktop();
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (_dir, mut store) = temp_store();
    refresh_catalog(&engine, &mut store).unwrap();
    let id = item_titled(&store, "Wi-Fi").id;
    let node = desktop.node_titled("Wi-Fi").unwrap();

    desktop.set_permission(false);
    let (outcome, mutation) = apply_visibility(&mut store, &engine, id, false).unwrap();
    assert_eq!(outcome, ApplyOutcome::PermissionMissing);
    assert!(!mutation.verified);

    let item = store.item(id).unwrap();
    assert!(!item.is_visible);
    assert!(!item.demoted && item.can_toggle_system_visibility);
    assert_eq!(desktop.peek(node, attribute::HIDDEN), Some(ScalarValue::Bool(false)));

    // Once granted, the same item is still controllable.
    desktop.set_permission(true);
    refresh_catalog(&engine, &mut store).unwrap();
    assert!(item_titled(&store, "Wi-Fi").can_toggle_system_visibility);
    let (outcome, _) = apply_visibility(&mut store, &engine, id, false).unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied("hidden_attribute"));
    assert_eq!(desktop.peek(node, attribute::HIDDEN), Some(ScalarValue::Bool(true)));
}

#[test]
fn toggle_all_without_permission_demotes_nothing() {
    let desktop = standard_desktop();
    let engine = MenuBarEngine::new(&desktop, IndexerConfig::default());
    let (_dir, mut store) = temp_store();
    refresh_catalog(&engine, &mut store).unwrap();

    desktop.set_permission(false);
    let outcomes = apply_toggle_all(&mut store, &engine).unwrap();
    assert!(outcomes.iter().all(|(_, o)| matches!(o, ApplyOutcome::PermissionMissing | ApplyOutcome::IntentOnly)));
    assert!(store.state().items.iter().all(|i| !i.is_visible && !i.demoted));
    assert!(item_titled(&store, "Clock").can_toggle_system_visibility);
}
