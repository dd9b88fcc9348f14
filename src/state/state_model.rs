use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ax::attribute::ProcessId;

/// A catalog entry. `id` never changes, so group assignment and the
/// visibility preference survive rescans even when the platform
/// identifier drifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedItem {
    pub id: Uuid,
    pub title: String,

    /// The user's intent. May differ from the screen when a change failed.
    pub is_visible: bool,

    #[serde(default)]
    pub group_id: Option<Uuid>,

    /// `None` marks a user-defined placeholder the engine never touches.
    #[serde(default)]
    pub owning_process_id: Option<ProcessId>,

    /// Stable identifier as of the last scan.
    #[serde(default)]
    pub ax_identifier: Option<String>,

    #[serde(default)]
    pub can_toggle_system_visibility: bool,

    /// Set once a change failed verification; rescans no longer restore
    /// `can_toggle_system_visibility`.
    #[serde(default)]
    pub demoted: bool,
}

impl ManagedItem {
    pub fn placeholder(title: &str, is_visible: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            is_visible,
            group_id: None,
            owning_process_id: None,
            ax_identifier: None,
            can_toggle_system_visibility: false,
            demoted: false,
        }
    }

    pub fn is_system_backed(&self) -> bool {
        self.owning_process_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub id: Uuid,
    pub title: String,
    #[serde(default = "default_group_symbol")]
    pub symbol_name: String,
}

impl ItemGroup {
    pub fn new(title: &str, symbol_name: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            symbol_name: symbol_name.map(str::to_string).unwrap_or_else(default_group_symbol),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    pub shows_managed_items: bool,
    pub hide_new_items_by_default: bool,
    pub menu_bar_symbol_name: String,
    pub global_toggle_shortcut: String,
    pub launch_at_login: bool,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            shows_managed_items: true,
            hide_new_items_by_default: false,
            menu_bar_symbol_name: "wineglass".to_string(),
            global_toggle_shortcut: "⌥⌘B".to_string(),
            launch_at_login: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub preferences: AppPreferences,
    #[serde(default)]
    pub groups: Vec<ItemGroup>,
    #[serde(default)]
    pub items: Vec<ManagedItem>,

    /// Fingerprint of the last merged scan.
    #[serde(default)]
    pub last_scan_fingerprint: Option<String>,
}

fn default_group_symbol() -> String {
    "square.grid.2x2".to_string()
}
