use crate::ax::attribute::{self, ProcessId};
use crate::ax::probe::AttributeProbe;
use crate::platform::process::ProcessRegistry;

/// Prefix of identifiers given to synthesized helper-application entries.
pub const SYNTHETIC_PREFIX: &str = "app::";

/// First non-empty trimmed label among title, description and help.
pub fn read_label<P: AttributeProbe>(probe: &P, element: &P::Element) -> Option<String> {
    attribute::LABEL_ATTRIBUTES.iter().find_map(|key| {
        probe
            .read_string(element, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Label of `element`, falling back to its owner's display name and then
/// to its pid. Never empty.
pub fn derive_title<D>(desktop: &D, element: &D::Element, pid: ProcessId) -> String
where
    D: AttributeProbe + ProcessRegistry,
{
    read_label(desktop, element).unwrap_or_else(|| fallback_title(desktop.display_name(pid).as_deref(), pid))
}

pub fn fallback_title(display_name: Option<&str>, pid: ProcessId) -> String {
    match display_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => app_item_title(name),
        None => format!("Menu item {pid}"),
    }
}

pub fn app_item_title(name: &str) -> String {
    format!("{name} menu item")
}

/// `AXIdentifier` when present, otherwise `<role>::<lowercased title>`.
pub fn stable_identifier<P: AttributeProbe>(probe: &P, element: &P::Element, title: &str) -> String {
    if let Some(id) = probe
        .read_string(element, attribute::IDENTIFIER)
        .filter(|id| !id.is_empty())
    {
        return id;
    }

    let role = probe
        .read_string(element, attribute::ROLE)
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}::{}", role, title.to_lowercase())
}

pub fn synthetic_identifier(bundle_id: Option<&str>, pid: ProcessId) -> String {
    match bundle_id.filter(|b| !b.is_empty()) {
        Some(bundle) => format!("{SYNTHETIC_PREFIX}{bundle}"),
        None => format!("{SYNTHETIC_PREFIX}{pid}"),
    }
}

pub fn is_synthetic_identifier(identifier: &str) -> bool {
    identifier.starts_with(SYNTHETIC_PREFIX)
}

/// Deduplication key: `<pid>::<lowercased title>`.
pub fn dedup_key(pid: ProcessId, title: &str) -> String {
    format!("{}::{}", pid, title.to_lowercase())
}
