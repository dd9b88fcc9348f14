#![allow(dead_code)]

use stein::{
    ax::attribute,
    menubar::extra_model::DiscoveredExtra,
    platform::{
        fixture::{FixtureDesktop, FixtureNode, FixtureSpec},
        process::ActivationPolicy,
    },
    state::state_model::ManagedItem,
};
use uuid::Uuid;

pub const CURRENT_PID: i32 = 1;
pub const SYSTEM_UI_PID: i32 = 88;
pub const CONTROL_CENTER_PID: i32 = 90;
pub const DROPBOX_PID: i32 = 412;

/// A togglable menu-bar item owned by whoever owns its parent.
pub fn menu_item(title: &str) -> FixtureNode {
    FixtureNode::new("AXMenuBarItem")
        .title(title)
        .attr(attribute::HIDDEN, false)
        .settable(attribute::HIDDEN)
}

/// `AXApplication` root whose `AXMenuBar` attribute points at a bar holding `items`.
pub fn host_tree(items: Vec<FixtureNode>) -> FixtureNode {
    let bar = items
        .into_iter()
        .fold(FixtureNode::new("AXMenuBar").exposed_as(attribute::MENU_BAR), |bar, item| bar.child(item));
    FixtureNode::new("AXApplication").child(bar)
}

/// SystemUIServer hosting `items`.
pub fn system_ui(items: Vec<FixtureNode>) -> FixtureSpec {
    FixtureSpec::new().process(
        SYSTEM_UI_PID,
        "com.apple.systemuiserver",
        "SystemUIServer",
        ActivationPolicy::Accessory,
        Some(host_tree(items)),
    )
}

/// The running Dropbox agent (accessory, no tree of its own).
pub fn with_dropbox(spec: FixtureSpec) -> FixtureSpec {
    spec.process(DROPBOX_PID, "com.getdropbox.dropbox", "Dropbox", ActivationPolicy::Accessory, None)
}

/// SystemUIServer with Wi-Fi and Clock, plus a Dropbox extra it hosts for pid 412.
pub fn standard_desktop() -> FixtureDesktop {
    FixtureDesktop::new(with_dropbox(system_ui(vec![
        menu_item("Wi-Fi"),
        menu_item("Clock"),
        FixtureNode::new("AXMenuExtra")
            .title("Dropbox")
            .attr(attribute::IDENTIFIER, "com.getdropbox.dropbox.status")
            .attr(attribute::HIDDEN, false)
            .settable(attribute::HIDDEN)
            .owned_by(DROPBOX_PID),
    ])))
}

/// A catalog entry that mirrors a scan result.
pub fn managed(extra: &DiscoveredExtra, visible: bool) -> ManagedItem {
    ManagedItem {
        id: Uuid::new_v4(),
        title: extra.title.clone(),
        is_visible: visible,
        group_id: None,
        owning_process_id: Some(extra.owning_process_id),
        ax_identifier: Some(extra.stable_identifier.clone()),
        can_toggle_system_visibility: extra.can_toggle_visibility,
        demoted: false,
    }
}

pub fn extra(title: &str, pid: i32, togglable: bool) -> DiscoveredExtra {
    DiscoveredExtra {
        title: title.into(),
        owning_process_id: pid,
        stable_identifier: format!("AXMenuBarItem::{}", title.to_lowercase()),
        can_toggle_visibility: togglable,
    }
}

pub fn find<'a>(extras: &'a [DiscoveredExtra], title: &str) -> &'a DiscoveredExtra {
    extras
        .iter()
        .find(|e| e.title == title)
        .unwrap_or_else(|| panic!("no extra titled '{title}' in {extras:?}"))
}

/// The sample desktop shipped under `demos/`.
pub fn demo_desktop() -> FixtureDesktop {
    let base = std::env::current_dir().unwrap();
    FixtureDesktop::load(&base.join("demos").join("desktop.yaml")).unwrap()
}
