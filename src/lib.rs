//! Discovery and visibility control for menu-bar extras owned by other
//! processes.
//!
//! The engine (`menubar`) walks foreign accessibility trees through the
//! traits in `ax` and `platform`, returns what it found, and changes the
//! visibility of one element at a time. Persistence and reconciliation of
//! those findings live in `state`.

use crate::{
    menubar::engine::MenuBarEngine,
    platform::Desktop,
    state::{reconcile::ReconcileReport, store::AppStateStore},
};

pub mod ax;
pub mod cli;
pub mod error;
pub mod menubar;
pub mod platform;
pub mod report;
pub mod state;
pub mod trace;

/// Scan the live menu bar and merge the result into the catalog.
///
/// Returns `None` without touching the store when accessibility permission
/// is missing, so a permissionless empty scan never reads as "everything
/// went stale".
pub fn refresh_catalog<D: Desktop>(
    engine: &MenuBarEngine<'_, D>,
    store: &mut AppStateStore,
) -> Result<Option<ReconcileReport>, error::SteinError> {
    if !engine.permission_granted() {
        return Ok(None);
    }

    let extras = engine.scan();
    let (report, _changed) = store.merge_scan(&extras)?;
    Ok(Some(report))
}
