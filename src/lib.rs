//! # Stagehand
//!
//! A development-environment and deployment orchestrator. A declarative
//! project description (the "Appfile") is compiled into provisioning
//! artifacts by pluggable application and infrastructure implementations,
//! and the core executes lifecycle tasks against the result.
//!
//! ## Core Concepts
//!
//! - **Appfile**: declarative project description naming an application
//!   type, its active infrastructure, and its dependencies
//! - **Tuple**: `(app type, infra type, infra flavor)`, the key that
//!   selects an application implementation
//! - **Registry**: factory maps resolving tuples and infrastructure types
//!   to implementations
//! - **Core**: owns the compiled dependency graph and runs the lifecycle
//!   tasks (`compile`, `build`, `dev`, `execute`)
//!
//! ## Architecture
//!
//! ```text
//! Appfile (compiled graph)
//!    ↓
//! Core
//!    ↓
//! Registry (tuple → app, type → infra)
//!    ↓
//! Graph walk (dependency order, fail-fast)
//!    ↓
//! App / Infra implementations
//!    ↓
//! Compiled artifacts + dev-dep cache
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use stagehand::prelude::*;
//!
//! // Assemble the registry with the implementations you ship.
//! let mut registry = Registry::new();
//! registry.register_infra("aws", my_aws_factory());
//! registry.register_app(Tuple::new("ruby", "aws", "simple"), my_ruby_factory());
//!
//! // Hand the core a compiled appfile graph and run a task.
//! let core = Core::new(CoreConfig::new(
//!     data_dir, local_dir, compile_dir, compiled, registry, directory, ui,
//! ));
//! core.compile().await?;
//! ```

pub use stagehand_core::{
    app, appfile, context, devdep, directory, graph, infra, registry, types,
};
pub use stagehand_creds as creds;
pub use stagehand_runtime::{Core, CoreConfig, CoreError, Layout};
pub use stagehand_ui::{ConsoleUi, InputOpts, PlaybackUi, Ui, UiError};

/// Prelude for convenient imports
pub mod prelude {
    pub use stagehand_core::app::{App, AppContext, AppFactory, CompileResult, Tuple};
    pub use stagehand_core::appfile::{Appfile, Application, Infrastructure, Project};
    pub use stagehand_core::context::Shared;
    pub use stagehand_core::devdep::{read_dev_dep, write_dev_dep, DevDep};
    pub use stagehand_core::directory::{Directory, InMemoryDirectory};
    pub use stagehand_core::graph::Compiled;
    pub use stagehand_core::infra::{CredsMap, Infra, InfraContext, InfraFactory};
    pub use stagehand_core::registry::Registry;
    pub use stagehand_core::types::{ExecuteOpts, ExecuteTask};
    pub use stagehand_runtime::{Core, CoreConfig, CoreError};
    pub use stagehand_ui::{ConsoleUi, InputOpts, Ui};
}
