use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::menubar::extra_model::DiscoveredExtra;
use crate::state::state_model::ManagedItem;
use crate::state::sync::ApplyOutcome;
use crate::trace::trace::TraceEvent;

/// `trace:` section of `stein.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            path: default_path(),
        }
    }
}

fn default_enabled() -> bool { true }
fn default_path() -> String { "stein_trace.jsonl".to_string() }

enum Sink {
    Off,
    /// Opened on the first record, so runs that trace nothing leave no file.
    Pending(PathBuf),
    Open(File),
}

/// Appends scan and mutation records to a JSONL file. Tracing problems are
/// logged and otherwise ignored; they never fail the operation being traced.
pub struct TraceLogger {
    sink: Mutex<Sink>,
}

impl TraceLogger {
    pub fn from_config(config: &TraceConfig) -> Self {
        if !config.enabled || config.path.trim().is_empty() {
            return Self::disabled();
        }
        Self::to_file(config.path.as_str())
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: Mutex::new(Sink::Pending(path.into())),
        }
    }

    pub fn disabled() -> Self {
        Self { sink: Mutex::new(Sink::Off) }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.lock().map(|sink| !matches!(*sink, Sink::Off)).unwrap_or(false)
    }

    /// One record per scan, with the permission state it ran under.
    pub fn record_scan(&self, extras: &[DiscoveredExtra], permission_granted: bool) {
        self.write(&TraceEvent::scan(extras.len(), permission_granted));
    }

    /// One record per show/hide that reached the accessibility layer.
    /// Intent-only changes never touch the screen and are skipped.
    pub fn record_apply(
        &self,
        operation: &str,
        item: &ManagedItem,
        visible: bool,
        outcome: ApplyOutcome,
    ) {
        if outcome == ApplyOutcome::IntentOnly {
            return;
        }
        self.write(&TraceEvent::apply(operation, item, visible, outcome));
    }

    fn write(&self, event: &TraceEvent) {
        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                log::warn!("failed to serialize trace event: {}", e);
                return;
            }
        };

        let mut sink = match self.sink.lock() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("trace logger lock poisoned: {}", e);
                return;
            }
        };

        if let Sink::Pending(path) = &*sink {
            *sink = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Sink::Open(file),
                Err(e) => {
                    log::warn!("could not open trace file '{}': {}; tracing off", path.display(), e);
                    Sink::Off
                }
            };
        }

        if let Sink::Open(file) = &mut *sink {
            if let Err(e) = writeln!(file, "{}", json) {
                log::warn!("failed to write trace event: {}", e);
            }
        }
    }
}
