use crate::menubar::extra_model::{DiscoveredExtra, MutationOutcome};
use crate::menubar::indexer::{Indexer, IndexerConfig};
use crate::menubar::mutator::VisibilityMutator;
use crate::platform::Desktop;
use crate::state::state_model::ManagedItem;

/// What the state owner talks to: scanning, mutation and the permission
/// oracle, all over one platform handle.
pub struct MenuBarEngine<'a, D: Desktop> {
    desktop: &'a D,
    config: IndexerConfig,
}

impl<'a, D: Desktop> MenuBarEngine<'a, D> {
    pub fn new(desktop: &'a D, config: IndexerConfig) -> Self {
        Self { desktop, config }
    }

    pub fn permission_granted(&self) -> bool {
        self.desktop.permission_granted()
    }

    pub fn request_permission_prompt(&self) {
        self.desktop.request_permission_prompt();
    }

    pub fn scan(&self) -> Vec<DiscoveredExtra> {
        Indexer::new(self.desktop, &self.config).scan()
    }

    pub fn set_visibility(&self, item: &ManagedItem, visible: bool) -> bool {
        self.set_visibility_detailed(item, visible).verified
    }

    pub fn set_visibility_detailed(&self, item: &ManagedItem, visible: bool) -> MutationOutcome {
        VisibilityMutator::new(self.desktop, &self.config).set_visibility_detailed(item, visible)
    }
}
