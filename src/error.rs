use std::path::PathBuf;

use thiserror::Error;

/// Errors from the layers around the engine: configuration, the state
/// store, fixture loading and the CLI. The engine itself reports failure
/// through `false` and empty results, never through this type.
#[derive(Debug, Error)]
pub enum SteinError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML error ({context}): {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no managed item matches '{0}'")]
    ItemNotFound(String),

    #[error("'{0}' matches more than one managed item")]
    AmbiguousItem(String),

    #[error("no group matches '{0}'")]
    GroupNotFound(String),

    /// No live accessibility backend on this platform and no fixture given.
    #[error("no accessibility backend available on this platform; pass --fixture <FILE>")]
    NoBackend,
}
