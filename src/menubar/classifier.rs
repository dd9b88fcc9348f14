use crate::ax::attribute;
use crate::ax::probe::AttributeProbe;

/// Markers for individual menu-bar items (`AXMenuBarItem`, `AXMenuExtra`).
const ITEM_MARKERS: [&str; 2] = ["menubaritem", "menuextra"];

/// Marker for the menu-bar container itself (`AXMenuBar`, `AXExtrasMenuBar`).
const CONTAINER_MARKER: &str = "menubar";

const BUTTON_MARKER: &str = "button";

/// Identifier/description hints that a generic button lives in the menu bar.
const EXTRA_HINTS: [&str; 3] = ["status", "menu", "extra"];

/// The few attributes classification looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBundle {
    pub role: Option<String>,
    pub subrole: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<String>,
}

impl AttributeBundle {
    pub fn read<P: AttributeProbe>(probe: &P, element: &P::Element) -> Self {
        Self {
            role: probe.read_string(element, attribute::ROLE),
            subrole: probe.read_string(element, attribute::SUBROLE),
            identifier: probe.read_string(element, attribute::IDENTIFIER),
            description: probe.read_string(element, attribute::DESCRIPTION),
        }
    }

    pub fn with_role(role: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            ..Self::default()
        }
    }

    fn roles(&self) -> impl Iterator<Item = String> + '_ {
        [&self.role, &self.subrole]
            .into_iter()
            .flatten()
            .map(|s| s.to_lowercase())
    }
}

/// Role or subrole names the menu-bar container, not one of its items.
pub fn is_likely_host_container(bundle: &AttributeBundle) -> bool {
    bundle
        .roles()
        .any(|r| r.contains(CONTAINER_MARKER) && !is_item_marker(&r))
}

/// Permissive: anything that might be a menu-bar extra. Later stages drop
/// elements without an owner; processes with nothing classifiable are
/// covered by the synthetic helper entries.
pub fn is_likely_extra(bundle: &AttributeBundle) -> bool {
    if bundle.roles().any(|r| is_item_marker(&r)) {
        return true;
    }

    let is_button = bundle
        .role
        .as_deref()
        .is_some_and(|r| r.to_lowercase().contains(BUTTON_MARKER));

    is_button && (has_extra_hint(bundle.identifier.as_deref()) || has_extra_hint(bundle.description.as_deref()))
}

fn is_item_marker(lowered: &str) -> bool {
    ITEM_MARKERS.iter().any(|m| lowered.contains(m))
}

fn has_extra_hint(value: Option<&str>) -> bool {
    value
        .map(|v| {
            let lower = v.to_lowercase();
            EXTRA_HINTS.iter().any(|h| lower.contains(h))
        })
        .unwrap_or(false)
}
