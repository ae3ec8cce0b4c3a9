//! Core error kinds.

use std::path::PathBuf;

use thiserror::Error;

use stagehand_core::graph::GraphError;
use stagehand_core::registry::RegistryError;
use stagehand_creds::CredsError;
use stagehand_ui::UiError;

/// Errors surfaced by the core orchestrator.
///
/// Plugin failures bubble unchanged; the only wrapping the core adds is the
/// vertex name when a context or implementation could not be loaded during
/// a walk.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The appfile names no active infrastructure configuration.
    #[error("infrastructure not found in appfile: {0}")]
    InfraNotConfigured(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("error making cache directory '{path}': {source}")]
    CacheSetupFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error clearing compile directory '{path}': {source}")]
    CompileCleanupFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Cached credentials could not be decrypted or parsed.
    #[error(
        "error reading encrypted credentials: {source}\n\n\
         If this error persists, you can force the credentials to be requested\n\
         again by entering an empty password at the prompt."
    )]
    BadCredentialsPassword { source: CredsError },

    #[error("error writing encrypted credentials: {0}")]
    CredentialsWriteFailed(CredsError),

    #[error("error building dependency for dev '{name}': {source}")]
    DevDepBuildFailed { name: String, source: anyhow::Error },

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("error loading appfile for '{name}': {source}")]
    VertexContext {
        name: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("error loading app implementation for '{name}': {source}")]
    VertexApp {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Ui(#[from] UiError),

    /// A plugin implementation failed; the error is passed through as-is.
    #[error(transparent)]
    Plugin(#[from] anyhow::Error),
}
