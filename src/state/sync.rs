use uuid::Uuid;

use crate::error::SteinError;
use crate::menubar::engine::MenuBarEngine;
use crate::menubar::extra_model::MutationOutcome;
use crate::platform::Desktop;
use crate::state::store::AppStateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The live element now shows the requested state.
    Applied(&'static str),
    /// The change could not be verified; the item is no longer togglable.
    Demoted,
    /// Placeholder or already-demoted item: only the intent was recorded.
    IntentOnly,
    /// Accessibility permission is missing: intent recorded, screen and
    /// controllability untouched.
    PermissionMissing,
}

/// Record the user's intent for one item and push it to the live element
/// when the item is controllable. A failed change demotes the item but
/// keeps the intent.
pub fn apply_visibility<D: Desktop>(
    store: &mut AppStateStore,
    engine: &MenuBarEngine<'_, D>,
    id: Uuid,
    visible: bool,
) -> Result<(ApplyOutcome, MutationOutcome), SteinError> {
    store.set_visibility(id, visible)?;
    push_to_screen(store, engine, id, visible)
}

/// Global toggle: flip the switch, then push every item's new intent.
pub fn apply_toggle_all<D: Desktop>(
    store: &mut AppStateStore,
    engine: &MenuBarEngine<'_, D>,
) -> Result<Vec<(Uuid, ApplyOutcome)>, SteinError> {
    let visible = store.toggle_all_managed_items()?;
    let ids: Vec<Uuid> = store.state().items.iter().map(|i| i.id).collect();

    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let (outcome, _) = push_to_screen(store, engine, id, visible)?;
        outcomes.push((id, outcome));
    }
    Ok(outcomes)
}

fn push_to_screen<D: Desktop>(
    store: &mut AppStateStore,
    engine: &MenuBarEngine<'_, D>,
    id: Uuid,
    visible: bool,
) -> Result<(ApplyOutcome, MutationOutcome), SteinError> {
    let item = store
        .item(id)
        .cloned()
        .ok_or_else(|| SteinError::ItemNotFound(id.to_string()))?;

    if !item.is_system_backed() || !item.can_toggle_system_visibility {
        return Ok((ApplyOutcome::IntentOnly, MutationOutcome::failed()));
    }

    if !engine.permission_granted() {
        log::warn!("accessibility permission not granted; '{}' left as is on screen", item.title);
        return Ok((ApplyOutcome::PermissionMissing, MutationOutcome::failed()));
    }

    let mutation = engine.set_visibility_detailed(&item, visible);
    match mutation.strategy {
        Some(strategy) if mutation.verified => Ok((ApplyOutcome::Applied(strategy), mutation)),
        _ => {
            store.demote(id)?;
            Ok((ApplyOutcome::Demoted, mutation))
        }
    }
}
