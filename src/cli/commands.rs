use std::path::Path;

use crate::cli::config::{AppConfig, Cli, Commands, OutputFormat, resolve_state_path};
use crate::error::SteinError;
use crate::menubar::engine::MenuBarEngine;
use crate::platform::Desktop;
use crate::platform::fixture::FixtureDesktop;
use crate::report::console::{format_catalog, format_reconcile, format_scan, short_id};
use crate::state::store::AppStateStore;
use crate::state::sync::{ApplyOutcome, apply_toggle_all, apply_visibility};
use crate::trace::logger::TraceLogger;

// ============================================================================
// Dispatch
// ============================================================================

/// Run one CLI invocation and return what it prints.
pub fn execute(cli: &Cli, config: &AppConfig) -> Result<String, Box<dyn std::error::Error>> {
    let state_path = resolve_state_path(cli.state.as_deref(), config);

    // Catalog-only commands never touch the accessibility API.
    match &cli.command {
        Commands::List => return cmd_list(&state_path),
        Commands::Add { title } => return cmd_add(&state_path, title),
        Commands::Group { title, symbol } => return cmd_group(&state_path, title, symbol.as_deref()),
        Commands::Assign { item, group } => return cmd_assign(&state_path, item, group.as_deref()),
        Commands::Prefs {
            hide_new_by_default,
            symbol,
        } => return cmd_prefs(&state_path, *hide_new_by_default, symbol.as_deref()),
        _ => {}
    }

    let tracer = TraceLogger::from_config(&config.trace);

    match &cli.fixture {
        Some(path) => {
            let desktop = FixtureDesktop::load(Path::new(path))?;
            run_with_desktop(&desktop, cli, config, &state_path, &tracer)
        }
        None => run_live(cli, config, &state_path, &tracer),
    }
}

#[cfg(target_os = "macos")]
fn run_live(
    cli: &Cli,
    config: &AppConfig,
    state_path: &Path,
    tracer: &TraceLogger,
) -> Result<String, Box<dyn std::error::Error>> {
    let desktop = crate::platform::macos::MacDesktop::new();
    run_with_desktop(&desktop, cli, config, state_path, tracer)
}

#[cfg(not(target_os = "macos"))]
fn run_live(
    _cli: &Cli,
    _config: &AppConfig,
    _state_path: &Path,
    _tracer: &TraceLogger,
) -> Result<String, Box<dyn std::error::Error>> {
    Err(SteinError::NoBackend.into())
}

fn run_with_desktop<D: Desktop>(
    desktop: &D,
    cli: &Cli,
    config: &AppConfig,
    state_path: &Path,
    tracer: &TraceLogger,
) -> Result<String, Box<dyn std::error::Error>> {
    let engine = MenuBarEngine::new(desktop, config.indexer.clone());

    match &cli.command {
        Commands::Permission { prompt } => Ok(cmd_permission(&engine, *prompt)),
        Commands::Scan { format, merge } => cmd_scan(&engine, state_path, *format, *merge, tracer),
        Commands::Show { item } => cmd_set_visibility(&engine, state_path, item, true, tracer),
        Commands::Hide { item } => cmd_set_visibility(&engine, state_path, item, false, tracer),
        Commands::ToggleAll => cmd_toggle_all(&engine, state_path, tracer),
        _ => unreachable!("catalog-only commands are dispatched before a desktop is opened"),
    }
}

// ============================================================================
// Engine-backed subcommands
// ============================================================================

pub fn cmd_permission<D: Desktop>(engine: &MenuBarEngine<'_, D>, prompt: bool) -> String {
    if engine.permission_granted() {
        return "Accessibility permission: granted\n".to_string();
    }

    if prompt {
        engine.request_permission_prompt();
        "Accessibility permission: not granted (prompt requested)\n".to_string()
    } else {
        "Accessibility permission: not granted (run with --prompt to request it)\n".to_string()
    }
}

pub fn cmd_scan<D: Desktop>(
    engine: &MenuBarEngine<'_, D>,
    state_path: &Path,
    format: OutputFormat,
    merge: bool,
    tracer: &TraceLogger,
) -> Result<String, Box<dyn std::error::Error>> {
    let granted = engine.permission_granted();
    if !granted {
        log::warn!("scan requested without accessibility permission; run `stein permission --prompt`");
    }

    let extras = engine.scan();
    tracer.record_scan(&extras, granted);

    let mut out = match format {
        OutputFormat::Text => format_scan(&extras),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&extras).map_err(|source| SteinError::Json {
                context: "scan results".into(),
                source,
            })?;
            json.push('\n');
            json
        }
    };

    if merge && !granted {
        if format == OutputFormat::Text {
            out.push_str("\nCatalog not updated: accessibility permission is missing\n");
        }
    } else if merge {
        let mut store = AppStateStore::open(state_path)?;
        let (report, changed) = store.merge_scan(&extras)?;
        if format == OutputFormat::Text {
            out.push('\n');
            out.push_str(&format_reconcile(&report, changed));
        }
    }

    Ok(out)
}

pub fn cmd_set_visibility<D: Desktop>(
    engine: &MenuBarEngine<'_, D>,
    state_path: &Path,
    query: &str,
    visible: bool,
    tracer: &TraceLogger,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut store = AppStateStore::open(state_path)?;
    let id = store.resolve_item(query)?;
    let (outcome, _) = apply_visibility(&mut store, engine, id, visible)?;

    let item = store.item(id).ok_or_else(|| SteinError::ItemNotFound(query.into()))?;
    tracer.record_apply("set_visibility", item, visible, outcome);

    Ok(describe_outcome(&item.title, visible, outcome))
}

pub fn cmd_toggle_all<D: Desktop>(
    engine: &MenuBarEngine<'_, D>,
    state_path: &Path,
    tracer: &TraceLogger,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut store = AppStateStore::open(state_path)?;
    let outcomes = apply_toggle_all(&mut store, engine)?;
    let visible = store.state().preferences.shows_managed_items;

    let mut out = String::new();
    for (id, outcome) in outcomes {
        if let Some(item) = store.item(id) {
            tracer.record_apply("toggle_all", item, visible, outcome);
            out.push_str(&describe_outcome(&item.title, visible, outcome));
        }
    }
    if out.is_empty() {
        out.push_str("No managed items\n");
    }
    Ok(out)
}

fn describe_outcome(title: &str, visible: bool, outcome: ApplyOutcome) -> String {
    let verb = if visible { "shown" } else { "hidden" };
    match outcome {
        ApplyOutcome::Applied(strategy) => format!("{title}: {verb} ({strategy})\n"),
        ApplyOutcome::Demoted => format!("{title}: marked {verb}, but the change could not be verified; item is no longer controllable\n"),
        ApplyOutcome::IntentOnly => format!("{title}: marked {verb}\n"),
        ApplyOutcome::PermissionMissing => {
            format!("{title}: marked {verb}; accessibility permission is missing (run `stein permission --prompt`)\n")
        }
    }
}

// ============================================================================
// Catalog-only subcommands
// ============================================================================

pub fn cmd_list(state_path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let store = AppStateStore::open(state_path)?;
    Ok(format_catalog(store.state()))
}

pub fn cmd_add(state_path: &Path, title: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut store = AppStateStore::open(state_path)?;
    let id = store.add_item(title)?;
    Ok(format!("Added '{}' ({})\n", title, short_id(id)))
}

pub fn cmd_group(state_path: &Path, title: &str, symbol: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    let mut store = AppStateStore::open(state_path)?;
    let id = store.add_group(title, symbol)?;
    Ok(format!("Created group '{}' ({})\n", title, short_id(id)))
}

pub fn cmd_assign(state_path: &Path, item: &str, group: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    let mut store = AppStateStore::open(state_path)?;
    let id = store.resolve_item(item)?;
    let group_id = group.map(|g| store.resolve_group(g)).transpose()?;
    store.assign(id, group_id)?;

    Ok(match group {
        Some(g) => format!("Assigned {} to '{}'\n", short_id(id), g),
        None => format!("Ungrouped {}\n", short_id(id)),
    })
}

pub fn cmd_prefs(
    state_path: &Path,
    hide_new_by_default: Option<bool>,
    symbol: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut store = AppStateStore::open(state_path)?;
    if let Some(value) = hide_new_by_default {
        store.set_hide_new_items_by_default(value)?;
    }
    if let Some(symbol) = symbol {
        store.set_menu_bar_symbol(symbol)?;
    }

    let prefs = &store.state().preferences;
    Ok(format!(
        "hide_new_items_by_default: {}\nmenu_bar_symbol_name: {}\nglobal_toggle_shortcut: {}\nlaunch_at_login: {}\n",
        prefs.hide_new_items_by_default,
        prefs.menu_bar_symbol_name,
        prefs.global_toggle_shortcut,
        prefs.launch_at_login
    ))
}
