use crate::ax::attribute::{self, ProcessId};
use crate::ax::probe::AttributeProbe;
use crate::ax::walker::TreeWalker;
use crate::menubar::extra_model::MutationOutcome;
use crate::menubar::identity::{derive_title, is_synthetic_identifier, stable_identifier};
use crate::menubar::indexer::{Indexer, IndexerConfig};
use crate::platform::Desktop;
use crate::state::state_model::ManagedItem;

// ============================================================================
// Strategies
// ============================================================================

/// One way of changing an element's visibility. `attempt` returns true only
/// when a read-back confirms the requested state.
pub trait VisibilityStrategy<P: AttributeProbe> {
    fn name(&self) -> &'static str;

    fn attempt(&self, probe: &P, element: &P::Element, visible: bool) -> bool;
}

/// Write `hidden = !visible`.
pub struct HiddenAttribute;

/// Write `value = visible` on elements that model visibility as a value.
pub struct ValueAttribute;

/// Apply `HiddenAttribute` to the nearest ancestors, stopping at the first
/// that verifies.
pub struct AncestorHidden {
    pub levels: usize,
}

impl<P: AttributeProbe> VisibilityStrategy<P> for HiddenAttribute {
    fn name(&self) -> &'static str {
        "hidden_attribute"
    }

    fn attempt(&self, probe: &P, element: &P::Element, visible: bool) -> bool {
        write_verified(probe, element, attribute::HIDDEN, !visible)
    }
}

impl<P: AttributeProbe> VisibilityStrategy<P> for ValueAttribute {
    fn name(&self) -> &'static str {
        "value_attribute"
    }

    fn attempt(&self, probe: &P, element: &P::Element, visible: bool) -> bool {
        write_verified(probe, element, attribute::VALUE, visible)
    }
}

impl<P: AttributeProbe> VisibilityStrategy<P> for AncestorHidden {
    fn name(&self) -> &'static str {
        "ancestor_hidden_attribute"
    }

    fn attempt(&self, probe: &P, element: &P::Element, visible: bool) -> bool {
        TreeWalker::new(probe)
            .ancestors(element, self.levels)
            .iter()
            .any(|ancestor| write_verified(probe, ancestor, attribute::HIDDEN, !visible))
    }
}

/// Settable check, write, read-back. An accepted write whose read-back
/// disagrees is undone so a failed attempt leaves the prior value in place.
fn write_verified<P: AttributeProbe>(probe: &P, element: &P::Element, key: &str, value: bool) -> bool {
    if !probe.is_settable(element, key) {
        return false;
    }

    let before = probe.read_bool(element, key);
    if !probe.write_bool(element, key, value) {
        return false;
    }

    let after = probe.read_bool(element, key);
    if after == Some(value) {
        return true;
    }

    if let Some(prior) = before {
        if after != Some(prior) {
            log::debug!("{} read back {:?} after writing {}; restoring {}", key, after, value, prior);
            probe.write_bool(element, key, prior);
        }
    }
    false
}

/// Strategy chain in the order they are tried.
pub fn default_strategies<P: AttributeProbe>(ancestor_levels: usize) -> Vec<Box<dyn VisibilityStrategy<P>>> {
    vec![
        Box::new(HiddenAttribute),
        Box::new(ValueAttribute),
        Box::new(AncestorHidden { levels: ancestor_levels }),
    ]
}

// ============================================================================
// VisibilityMutator
// ============================================================================

/// Re-locates a managed item's live element and changes its visibility.
pub struct VisibilityMutator<'a, D: Desktop> {
    desktop: &'a D,
    config: &'a IndexerConfig,
    strategies: Vec<Box<dyn VisibilityStrategy<D>>>,
}

impl<'a, D: Desktop> VisibilityMutator<'a, D> {
    pub fn new(desktop: &'a D, config: &'a IndexerConfig) -> Self {
        Self::with_strategies(desktop, config, default_strategies(config.ancestor_levels))
    }

    pub fn with_strategies(
        desktop: &'a D,
        config: &'a IndexerConfig,
        strategies: Vec<Box<dyn VisibilityStrategy<D>>>,
    ) -> Self {
        Self {
            desktop,
            config,
            strategies,
        }
    }

    pub fn set_visibility(&self, item: &ManagedItem, visible: bool) -> bool {
        self.set_visibility_detailed(item, visible).verified
    }

    /// Runs the strategy chain, first verified success wins.
    ///
    /// Placeholders and synthesized helper entries are refused up front;
    /// so is everything while accessibility permission is missing.
    pub fn set_visibility_detailed(&self, item: &ManagedItem, visible: bool) -> MutationOutcome {
        let Some(pid) = item.owning_process_id else {
            return MutationOutcome::failed();
        };

        if item.ax_identifier.as_deref().is_some_and(is_synthetic_identifier) {
            log::debug!("'{}' is a synthesized entry; nothing to mutate", item.title);
            return MutationOutcome::failed();
        }

        if !self.desktop.permission_granted() {
            log::warn!("accessibility permission not granted; cannot change '{}'", item.title);
            return MutationOutcome::failed();
        }

        let Some(element) = self.locate(pid, item.ax_identifier.as_deref(), &item.title) else {
            log::info!("'{}' (pid {}) not found in the menu bar", item.title, pid);
            return MutationOutcome::failed();
        };

        for strategy in &self.strategies {
            if strategy.attempt(self.desktop, &element, visible) {
                log::info!("'{}' visible={} via {}", item.title, visible, strategy.name());
                return MutationOutcome::verified_by(strategy.name());
            }
        }

        log::info!("no strategy could set '{}' visible={}", item.title, visible);
        MutationOutcome::failed()
    }

    /// Live element owned by `pid` whose derived identifier equals
    /// `identifier`; failing that, the first whose title matches ignoring case.
    pub fn locate(&self, pid: ProcessId, identifier: Option<&str>, title: &str) -> Option<D::Element> {
        let indexer = Indexer::new(self.desktop, self.config);

        let owned: Vec<(D::Element, String)> = indexer
            .host_roots()
            .iter()
            .flat_map(|root| indexer.candidates(root))
            .filter(|c| self.desktop.owning_process(c) == pid)
            .map(|c| {
                let derived = derive_title(self.desktop, &c, pid);
                (c, derived)
            })
            .collect();

        if let Some(identifier) = identifier {
            let by_identifier = owned
                .iter()
                .find(|(c, derived)| stable_identifier(self.desktop, c, derived) == identifier);
            if let Some((element, _)) = by_identifier {
                return Some(element.clone());
            }
        }

        let wanted = title.to_lowercase();
        owned
            .into_iter()
            .find(|(_, derived)| derived.to_lowercase() == wanted)
            .map(|(element, _)| element)
    }
}
