use serde::{Deserialize, Serialize};

use crate::ax::attribute::ProcessId;

/// How a running application presents itself to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Dock icon and regular windows.
    Regular,
    /// No Dock icon; may own windows and menu-bar extras.
    Accessory,
    /// Background only.
    Prohibited,
}

/// A process as reported by the platform's process registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningProcess {
    pub pid: ProcessId,

    #[serde(default)]
    pub bundle_id: Option<String>,

    /// Localized display name.
    #[serde(default)]
    pub name: Option<String>,

    pub activation_policy: ActivationPolicy,

    /// Bundle declares itself an agent with no Dock presence (LSUIElement).
    #[serde(default)]
    pub ui_element_only: bool,
}

impl RunningProcess {
    /// Behaves like a menu-bar-only helper: no regular window or Dock presence.
    pub fn is_accessory_style(&self) -> bool {
        match self.activation_policy {
            ActivationPolicy::Accessory => true,
            ActivationPolicy::Regular => self.ui_element_only,
            ActivationPolicy::Prohibited => false,
        }
    }

    pub fn has_bundle_id(&self, bundle_id: &str) -> bool {
        self.bundle_id.as_deref() == Some(bundle_id)
    }
}

pub trait ProcessRegistry {
    fn running_processes(&self) -> Vec<RunningProcess>;

    fn current_pid(&self) -> ProcessId;

    fn display_name(&self, pid: ProcessId) -> Option<String> {
        self.running_processes()
            .into_iter()
            .find(|p| p.pid == pid)
            .and_then(|p| p.name)
            .filter(|n| !n.trim().is_empty())
    }
}

pub trait PermissionOracle {
    fn permission_granted(&self) -> bool;

    /// Fire-and-forget: asks the OS to show its consent dialog.
    fn request_permission_prompt(&self);
}
