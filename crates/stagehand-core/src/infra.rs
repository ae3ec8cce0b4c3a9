//! Infrastructure plugin contract.
//!
//! One infrastructure implementation serves a whole appfile session; it is
//! selected by the project's infrastructure type and invoked with a fresh
//! [`InfraContext`] per task.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::appfile::Infrastructure;
use crate::context::Shared;

/// Infrastructure credentials as handed to plugins. Opaque to the core;
/// persisted encrypted at rest between runs.
pub type CredsMap = HashMap<String, String>;

/// Result of compiling infrastructure artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfraCompileResult;

/// Context handed to infrastructure implementations. Constructed fresh for
/// every task.
#[derive(Clone)]
pub struct InfraContext {
    /// Output directory for compiled infrastructure artifacts.
    pub dir: PathBuf,
    /// The active infrastructure configuration.
    pub infra: Infrastructure,
    /// Action name; set for `execute` tasks only.
    pub action: Option<String>,
    /// Action arguments; set for `execute` tasks only.
    pub action_args: Vec<String>,
    /// Credentials; populated by the credential store before tasks that
    /// need them.
    pub creds: CredsMap,
    /// Services shared across every context.
    pub shared: Shared,
}

/// Infrastructure implementation capability set.
#[async_trait]
pub trait Infra: Send + Sync + std::fmt::Debug {
    /// Compile infrastructure artifacts (provisioning plans) into `ctx.dir`.
    async fn compile(&self, ctx: &mut InfraContext) -> anyhow::Result<InfraCompileResult>;

    /// Execute `ctx.action` against the infrastructure.
    async fn execute(&self, ctx: &mut InfraContext) -> anyhow::Result<()>;

    /// Query the user for fresh credentials, e.g. API keys.
    async fn creds(&self, ctx: &mut InfraContext) -> anyhow::Result<CredsMap>;
}

/// Factory that starts an infrastructure implementation.
pub trait InfraFactory: Send + Sync {
    fn build(&self) -> anyhow::Result<Arc<dyn Infra>>;
}

impl<F> InfraFactory for F
where
    F: Fn() -> anyhow::Result<Arc<dyn Infra>> + Send + Sync,
{
    fn build(&self) -> anyhow::Result<Arc<dyn Infra>> {
        self()
    }
}
