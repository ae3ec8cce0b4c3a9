//! Application plugin contract.
//!
//! An application implementation is selected per vertex by its
//! [`Tuple`] and invoked with a fresh [`AppContext`] for every task.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::appfile::{Appfile, Application};
use crate::context::Shared;
use crate::devdep::DevDep;

/// Registry key selecting an application implementation.
///
/// All three fields take part in equality and hashing; there is no default
/// flavor sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tuple {
    /// Application type.
    pub app: String,
    /// Infrastructure type.
    pub infra: String,
    /// Infrastructure flavor.
    pub infra_flavor: String,
}

impl Tuple {
    /// Create a tuple from its three components.
    pub fn new(
        app: impl Into<String>,
        infra: impl Into<String>,
        infra_flavor: impl Into<String>,
    ) -> Self {
        Self {
            app: app.into(),
            infra: infra.into(),
            infra_flavor: infra_flavor.into(),
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.app, self.infra, self.infra_flavor)
    }
}

/// Per-vertex context handed to application implementations. Constructed
/// fresh for every task.
#[derive(Clone)]
pub struct AppContext {
    /// Output directory for compiled artifacts; disjoint across vertices.
    pub dir: PathBuf,
    /// Long-lived cache directory keyed by appfile id; exists on handoff.
    pub cache_dir: PathBuf,
    /// The registry tuple this context resolved through.
    pub tuple: Tuple,
    /// The vertex's appfile.
    pub appfile: Arc<Appfile>,
    /// Shortcut to the appfile's application section.
    pub application: Application,
    /// Action name; set for `execute` tasks only.
    pub action: Option<String>,
    /// Action arguments; set for `execute` tasks only.
    pub action_args: Vec<String>,
    /// Dev-dep fragment paths, sorted by vertex id. Populated only for the
    /// root vertex while compiling, after all dependencies finished.
    pub dev_dep_fragments: Vec<PathBuf>,
    /// Services shared across every context.
    pub shared: Shared,
}

/// Result of compiling a single vertex.
#[derive(Debug, Clone, Default)]
pub struct CompileResult {
    /// Provisioning fragment the root splices into its dev environment
    /// artifact, if this vertex produced one.
    pub dev_dep_fragment: Option<PathBuf>,
}

/// Application implementation capability set.
///
/// Implementations are black boxes to the core: they may block arbitrarily
/// and report to the user through `ctx.shared.ui`.
#[async_trait]
pub trait App: Send + Sync + fmt::Debug {
    /// Compile artifacts for this vertex into `ctx.dir`.
    async fn compile(&self, ctx: &mut AppContext) -> anyhow::Result<CompileResult>;

    /// Build the deployable artifact from previously compiled output.
    async fn build(&self, ctx: &mut AppContext) -> anyhow::Result<()>;

    /// Bring up, or act on, the development environment.
    async fn dev(&self, ctx: &mut AppContext) -> anyhow::Result<()>;

    /// Produce the prebuilt dev dependency for `ctx`, a dependency of
    /// `root`. The result is cached under `ctx.cache_dir`.
    async fn dev_dep(&self, root: &AppContext, ctx: &AppContext) -> anyhow::Result<DevDep>;
}

/// Factory that starts an application implementation.
pub trait AppFactory: Send + Sync {
    fn build(&self) -> anyhow::Result<Arc<dyn App>>;
}

impl<F> AppFactory for F
where
    F: Fn() -> anyhow::Result<Arc<dyn App>> + Send + Sync,
{
    fn build(&self) -> anyhow::Result<Arc<dyn App>> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_tuple_equality_covers_all_fields() {
        let a = Tuple::new("ruby", "aws", "simple");
        let b = Tuple::new("ruby", "aws", "simple");
        let c = Tuple::new("ruby", "aws", "vpc");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert!(map.contains_key(&b));
        assert!(!map.contains_key(&c));
    }

    #[test]
    fn test_tuple_display() {
        let tuple = Tuple::new("go", "aws", "vpc");
        assert_eq!(tuple.to_string(), "(go, aws, vpc)");
    }
}
