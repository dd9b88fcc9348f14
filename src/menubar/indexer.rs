use std::cmp::Ordering;
use std::collections::HashSet;

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};

use crate::ax::attribute;
use crate::ax::walker::TreeWalker;
use crate::menubar::classifier::{AttributeBundle, is_likely_extra, is_likely_host_container};
use crate::menubar::extra_model::DiscoveredExtra;
use crate::menubar::identity::{dedup_key, derive_title, fallback_title, stable_identifier, synthetic_identifier};
use crate::platform::Desktop;

// ============================================================================
// Indexer configuration
// ============================================================================

/// Process lists and traversal bounds used by scans and mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Bundle identifiers of system processes that host the menu bar.
    #[serde(default = "default_host_bundle_ids")]
    pub host_bundle_ids: Vec<String>,

    /// Processes never listed as menu-bar helpers.
    #[serde(default = "default_denylist_bundle_ids")]
    pub denylist_bundle_ids: Vec<String>,

    /// Application attributes that point straight at a menu bar.
    #[serde(default = "default_menu_bar_attributes")]
    pub menu_bar_attributes: Vec<String>,

    /// How deep to look under an application root for menu-bar containers.
    #[serde(default = "default_host_walk_depth")]
    pub host_walk_depth: usize,

    /// How many parents to try when the element itself is not settable.
    #[serde(default = "default_ancestor_levels")]
    pub ancestor_levels: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            host_bundle_ids: default_host_bundle_ids(),
            denylist_bundle_ids: default_denylist_bundle_ids(),
            menu_bar_attributes: default_menu_bar_attributes(),
            host_walk_depth: default_host_walk_depth(),
            ancestor_levels: default_ancestor_levels(),
        }
    }
}

fn default_host_bundle_ids() -> Vec<String> {
    ["com.apple.systemuiserver", "com.apple.controlcenter"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_denylist_bundle_ids() -> Vec<String> {
    [
        "com.apple.dock",
        "com.apple.systemuiserver",
        "com.apple.controlcenter",
        "com.apple.notificationcenterui",
        "com.apple.WindowManager",
        "com.apple.Spotlight",
        "com.apple.finder",
        "com.apple.loginwindow",
        "com.apple.TextInputMenuAgent",
        "com.apple.universalaccessd",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_menu_bar_attributes() -> Vec<String> {
    vec![attribute::MENU_BAR.to_string(), attribute::EXTRAS_MENU_BAR.to_string()]
}

fn default_host_walk_depth() -> usize { 3 }
fn default_ancestor_levels() -> usize { 3 }

// ============================================================================
// Indexer
// ============================================================================

/// Discovers menu-bar extras across the host processes.
///
/// Stateless between calls: each scan walks the live trees again.
pub struct Indexer<'a, D: Desktop> {
    desktop: &'a D,
    config: &'a IndexerConfig,
}

impl<'a, D: Desktop> Indexer<'a, D> {
    pub fn new(desktop: &'a D, config: &'a IndexerConfig) -> Self {
        Self { desktop, config }
    }

    /// Full scan: classified extras from every host root plus synthesized
    /// entries for accessory helpers, deduplicated and sorted by title.
    ///
    /// Without accessibility permission nothing is traversed and the result
    /// is empty.
    pub fn scan(&self) -> Vec<DiscoveredExtra> {
        if !self.desktop.permission_granted() {
            log::warn!("accessibility permission not granted; scan skipped");
            return Vec::new();
        }

        let mut entries = Vec::new();
        let roots = self.host_roots();

        for root in &roots {
            for candidate in self.candidates(root) {
                if let Some(extra) = self.describe(&candidate) {
                    entries.push(extra);
                }
            }
        }

        let discovered = entries.len();
        entries.extend(self.synthesize_helpers());

        let result = dedup_and_sort(entries);
        log::info!(
            "scan: {} host roots, {} discovered, {} after dedup",
            roots.len(),
            discovered,
            result.len()
        );
        result
    }

    /// Menu-bar containers of every running host process: whatever the
    /// application's menu-bar attributes point at, plus any container found
    /// by a shallow walk. Each element appears once.
    pub fn host_roots(&self) -> Vec<D::Element> {
        let walker = TreeWalker::new(self.desktop);
        let mut roots: Vec<D::Element> = Vec::new();

        for process in self.desktop.running_processes() {
            let is_host = self
                .config
                .host_bundle_ids
                .iter()
                .any(|b| process.has_bundle_id(b));
            if !is_host {
                continue;
            }

            let Some(app) = self.desktop.application(process.pid) else {
                log::debug!("host {} (pid {}) exposes no accessibility root", process.name.as_deref().unwrap_or("?"), process.pid);
                continue;
            };

            for key in &self.config.menu_bar_attributes {
                if let Some(bar) = self.desktop.read_element(&app, key) {
                    push_unique(&mut roots, bar);
                }
            }

            for element in walker.descendants(&app, self.config.host_walk_depth) {
                if is_likely_host_container(&AttributeBundle::read(self.desktop, &element)) {
                    push_unique(&mut roots, element);
                }
            }
        }

        roots
    }

    /// Extras directly under `root`, plus extras one level below any child
    /// that is not itself an extra. Nothing deeper is examined.
    pub fn candidates(&self, root: &D::Element) -> Vec<D::Element> {
        let walker = TreeWalker::new(self.desktop);
        let mut found = Vec::new();

        for child in walker.children(root) {
            if is_likely_extra(&AttributeBundle::read(self.desktop, &child)) {
                found.push(child);
                continue;
            }

            for grandchild in walker.children(&child) {
                if is_likely_extra(&AttributeBundle::read(self.desktop, &grandchild)) {
                    found.push(grandchild);
                }
            }
        }

        found
    }

    /// Whether the hidden attribute is settable on `element` or on one of
    /// its nearest ancestors.
    pub fn can_toggle(&self, element: &D::Element) -> bool {
        if self.desktop.is_settable(element, attribute::HIDDEN) {
            return true;
        }

        TreeWalker::new(self.desktop)
            .ancestors(element, self.config.ancestor_levels)
            .iter()
            .any(|a| self.desktop.is_settable(a, attribute::HIDDEN))
    }

    fn describe(&self, element: &D::Element) -> Option<DiscoveredExtra> {
        let pid = self.desktop.owning_process(element);
        if pid == 0 {
            log::debug!("dropping candidate without owning process: {:?}", element);
            return None;
        }

        let title = derive_title(self.desktop, element, pid);
        let stable_identifier = stable_identifier(self.desktop, element, &title);
        let can_toggle_visibility = self.can_toggle(element);

        log::debug!("extra '{}' pid={} id={} togglable={}", title, pid, stable_identifier, can_toggle_visibility);

        Some(DiscoveredExtra {
            title,
            owning_process_id: pid,
            stable_identifier,
            can_toggle_visibility,
        })
    }

    /// Catalog entries for accessory-style applications, which may own a
    /// menu-bar extra without exposing anything classifiable.
    fn synthesize_helpers(&self) -> Vec<DiscoveredExtra> {
        let current = self.desktop.current_pid();

        self.desktop
            .running_processes()
            .into_iter()
            .filter(|p| p.pid > 0 && p.pid != current)
            .filter(|p| {
                !self
                    .config
                    .denylist_bundle_ids
                    .iter()
                    .any(|b| p.has_bundle_id(b))
            })
            .filter(|p| p.is_accessory_style())
            .map(|p| DiscoveredExtra {
                title: fallback_title(p.name.as_deref(), p.pid),
                owning_process_id: p.pid,
                stable_identifier: synthetic_identifier(p.bundle_id.as_deref(), p.pid),
                can_toggle_visibility: false,
            })
            .collect()
    }
}

fn push_unique<E: PartialEq>(list: &mut Vec<E>, element: E) {
    if !list.contains(&element) {
        list.push(element);
    }
}

/// Keep the first entry per `(pid, lowercased title)` and sort by title.
pub fn dedup_and_sort(entries: Vec<DiscoveredExtra>) -> Vec<DiscoveredExtra> {
    let mut seen = HashSet::new();
    let mut unique: Vec<DiscoveredExtra> = entries
        .into_iter()
        .filter(|e| seen.insert(dedup_key(e.owning_process_id, &e.title)))
        .collect();

    let order = TitleOrder::new();
    unique.sort_by(|a, b| order.compare(&a.title, &b.title));
    unique
}

/// Case-insensitive collation of titles. Titles that collate equal keep
/// their relative order.
pub struct TitleOrder {
    collator: Option<Collator>,
}

impl TitleOrder {
    /// Root-locale collator at secondary strength: accents count, case does not.
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Secondary);

        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                log::warn!("title collator unavailable, sorting by lowercase code points: {}", e);
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => {
                let left = a.chars().flat_map(char::to_lowercase);
                let right = b.chars().flat_map(char::to_lowercase);
                left.cmp(right)
            }
        }
    }
}

impl Default for TitleOrder {
    fn default() -> Self {
        Self::new()
    }
}
