use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::SteinError;
use crate::menubar::extra_model::DiscoveredExtra;
use crate::state::normalize::catalog_fingerprint;
use crate::state::reconcile::{ReconcileReport, reconcile};
use crate::state::state_model::{ItemGroup, ManagedItem, PersistedState};

/// Owns the persisted catalog and preferences. Every mutating call is
/// written through to disk before it returns.
pub struct AppStateStore {
    path: PathBuf,
    state: PersistedState,
}

impl AppStateStore {
    /// `<data dir>/Stein/state.json`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Stein")
            .join("state.json")
    }

    /// Load the state at `path`. A missing file starts (and writes) the
    /// initial state; a malformed one is moved aside to `state.json.bak`
    /// and the store starts fresh.
    pub fn open(path: &Path) -> Result<Self, SteinError> {
        let mut store = Self {
            path: path.to_path_buf(),
            state: PersistedState::default(),
        };

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => store.state = state,
                Err(e) => {
                    let backup = path.with_extension("json.bak");
                    log::warn!("malformed state file {}: {}; moving it to {}", path.display(), e, backup.display());
                    fs::rename(path, &backup).map_err(|source| SteinError::Io { path: backup, source })?;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("creating state file {}", path.display());
                store.save()?;
            }
            Err(source) => {
                return Err(SteinError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn item(&self, id: Uuid) -> Option<&ManagedItem> {
        self.state.items.iter().find(|i| i.id == id)
    }

    /// Resolve a full id or an unambiguous id prefix.
    pub fn resolve_item(&self, query: &str) -> Result<Uuid, SteinError> {
        if let Ok(id) = Uuid::parse_str(query) {
            return self.item(id).map(|i| i.id).ok_or_else(|| SteinError::ItemNotFound(query.into()));
        }

        let needle = query.to_lowercase();
        let mut hits = self
            .state
            .items
            .iter()
            .filter(|i| !needle.is_empty() && i.id.to_string().starts_with(&needle));

        match (hits.next(), hits.next()) {
            (Some(item), None) => Ok(item.id),
            (Some(_), Some(_)) => Err(SteinError::AmbiguousItem(query.into())),
            _ => Err(SteinError::ItemNotFound(query.into())),
        }
    }

    /// Resolve a group by id or case-insensitive title.
    pub fn resolve_group(&self, query: &str) -> Result<Uuid, SteinError> {
        self.state
            .groups
            .iter()
            .find(|g| g.id.to_string() == query || g.title.eq_ignore_ascii_case(query))
            .map(|g| g.id)
            .ok_or_else(|| SteinError::GroupNotFound(query.into()))
    }

    fn save(&self) -> Result<(), SteinError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SteinError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(&self.state).map_err(|source| SteinError::Json {
            context: "state".into(),
            source,
        })?;

        // Write-then-rename so a crash never leaves a truncated file.
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, json).map_err(|source| SteinError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|source| SteinError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn update<T>(&mut self, f: impl FnOnce(&mut PersistedState) -> T) -> Result<T, SteinError> {
        let out = f(&mut self.state);
        self.save()?;
        Ok(out)
    }

    fn update_item(&mut self, id: Uuid, f: impl FnOnce(&mut ManagedItem)) -> Result<(), SteinError> {
        let Some(index) = self.state.items.iter().position(|i| i.id == id) else {
            return Err(SteinError::ItemNotFound(id.to_string()));
        };
        self.update(|state| f(&mut state.items[index]))
    }

    // ---- Operations ----

    /// Flip the global switch and align every item's intent with it.
    /// Returns the new value.
    pub fn toggle_all_managed_items(&mut self) -> Result<bool, SteinError> {
        self.update(|state| {
            state.preferences.shows_managed_items = !state.preferences.shows_managed_items;
            let show = state.preferences.shows_managed_items;
            for item in &mut state.items {
                item.is_visible = show;
            }
            show
        })
    }

    pub fn set_menu_bar_symbol(&mut self, symbol: &str) -> Result<(), SteinError> {
        self.update(|state| state.preferences.menu_bar_symbol_name = symbol.to_string())
    }

    pub fn set_hide_new_items_by_default(&mut self, value: bool) -> Result<(), SteinError> {
        self.update(|state| state.preferences.hide_new_items_by_default = value)
    }

    pub fn set_visibility(&mut self, id: Uuid, visible: bool) -> Result<(), SteinError> {
        self.update_item(id, |item| item.is_visible = visible)
    }

    pub fn assign(&mut self, id: Uuid, group_id: Option<Uuid>) -> Result<(), SteinError> {
        if let Some(group) = group_id {
            if !self.state.groups.iter().any(|g| g.id == group) {
                return Err(SteinError::GroupNotFound(group.to_string()));
            }
        }
        self.update_item(id, |item| item.group_id = group_id)
    }

    /// Add a placeholder item, visible unless new items start hidden.
    pub fn add_item(&mut self, title: &str) -> Result<Uuid, SteinError> {
        self.update(|state| {
            let item = ManagedItem::placeholder(title, !state.preferences.hide_new_items_by_default);
            let id = item.id;
            state.items.push(item);
            id
        })
    }

    pub fn add_group(&mut self, title: &str, symbol_name: Option<&str>) -> Result<Uuid, SteinError> {
        self.update(|state| {
            let group = ItemGroup::new(title, symbol_name);
            let id = group.id;
            state.groups.push(group);
            id
        })
    }

    /// Mark an item as no longer controllable after a failed change.
    /// Its visibility intent is kept.
    pub fn demote(&mut self, id: Uuid) -> Result<(), SteinError> {
        self.update_item(id, |item| {
            item.can_toggle_system_visibility = false;
            item.demoted = true;
        })
    }

    /// Reconcile a scan into the catalog and remember its fingerprint.
    /// The second value is false when the scan matches the previous one.
    pub fn merge_scan(&mut self, extras: &[DiscoveredExtra]) -> Result<(ReconcileReport, bool), SteinError> {
        let fingerprint = catalog_fingerprint(extras);
        self.update(|state| {
            let changed = state.last_scan_fingerprint.as_deref() != Some(fingerprint.as_str());
            let hide_new = state.preferences.hide_new_items_by_default;
            let report = reconcile(&mut state.items, extras, hide_new);
            state.last_scan_fingerprint = Some(fingerprint);
            (report, changed)
        })
    }
}
