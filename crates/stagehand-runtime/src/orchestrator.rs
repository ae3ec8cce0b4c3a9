//! The core orchestrator.
//!
//! A [`Core`] owns one compiled appfile graph for the lifetime of a
//! session and is immutable after construction. Every lifecycle task
//! builds fresh per-vertex contexts, resolves implementations through the
//! registry, and (where the task needs the whole graph) walks the
//! dependencies with fail-fast semantics.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use stagehand_core::app::{App, AppContext, CompileResult, Tuple};
use stagehand_core::appfile::Appfile;
use stagehand_core::context::Shared;
use stagehand_core::devdep::{self, DEV_DEP_FILE};
use stagehand_core::directory::Directory;
use stagehand_core::graph::{Compiled, WalkError, WalkStep};
use stagehand_core::infra::{CredsMap, Infra, InfraContext};
use stagehand_core::registry::Registry;
use stagehand_core::types::{ExecuteOpts, ExecuteTask};
use stagehand_ui::Ui;

use crate::creds;
use crate::error::CoreError;
use crate::layout::Layout;

const DEFAULT_MAX_PARALLEL: usize = 4;

/// Configuration for creating a new core with [`Core::new`].
pub struct CoreConfig {
    /// Directory for data global to every stagehand process.
    pub data_dir: PathBuf,
    /// Directory for data local to this appfile; survives compilation.
    pub local_dir: PathBuf,
    /// Directory compiled artifacts are written to; wiped by every compile.
    pub compile_dir: PathBuf,
    /// The compiled appfile this core operates on.
    pub compiled: Compiled,
    /// Available app and infrastructure implementations.
    pub registry: Registry,
    /// Backend storing data about this appfile.
    pub directory: Arc<dyn Directory>,
    /// User interface.
    pub ui: Arc<dyn Ui>,
    /// Maximum vertices walked in parallel.
    pub max_parallel: usize,
}

impl CoreConfig {
    /// Create a core configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data_dir: impl Into<PathBuf>,
        local_dir: impl Into<PathBuf>,
        compile_dir: impl Into<PathBuf>,
        compiled: Compiled,
        registry: Registry,
        directory: Arc<dyn Directory>,
        ui: Arc<dyn Ui>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            local_dir: local_dir.into(),
            compile_dir: compile_dir.into(),
            compiled,
            registry,
            directory,
            ui,
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    /// Set the maximum number of vertices walked in parallel.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max.max(1);
        self
    }
}

/// The core orchestrator.
pub struct Core {
    compiled: Compiled,
    registry: Registry,
    layout: Layout,
    shared: Shared,
    max_parallel: usize,
}

impl Core {
    /// Create a new core. The config should not be reused or modified
    /// afterwards.
    pub fn new(config: CoreConfig) -> Self {
        Self {
            layout: Layout::new(config.data_dir, config.local_dir, config.compile_dir),
            compiled: config.compiled,
            registry: config.registry,
            shared: Shared {
                directory: config.directory,
                ui: config.ui,
            },
            max_parallel: config.max_parallel,
        }
    }

    /// The compiled appfile this core operates on.
    pub fn compiled(&self) -> &Compiled {
        &self.compiled
    }

    /// The on-disk layout of this session.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Compile the appfile: infrastructure first, then every vertex in
    /// dependency order. The root vertex receives the dev-dep fragment
    /// paths of its dependencies, sorted by vertex id.
    pub async fn compile(&self) -> Result<(), CoreError> {
        let (infra, mut infra_ctx) = self.infra().await?;

        self.layout
            .clean_compile_dir()
            .await
            .map_err(|source| CoreError::CompileCleanupFailed {
                path: self.layout.compile_dir().to_path_buf(),
                source,
            })?;

        info!("running infra compile");
        infra.compile(&mut infra_ctx).await?;

        info!(vertices = self.compiled.len(), "compiling appfile graph");
        let results: Mutex<Vec<(String, CompileResult)>> =
            Mutex::new(Vec::with_capacity(self.compiled.len()));

        self.walk_apps(|app, mut ctx, is_root| {
            let results = &results;
            async move {
                if is_root {
                    ctx.shared.ui.message("Compiling main application...");
                    // By the DAG contract the root runs last, so every
                    // dependency result is already recorded here.
                    let recorded = results.lock().unwrap();
                    ctx.dev_dep_fragments = fragment_paths(&recorded);
                } else {
                    ctx.shared.ui.message(&format!(
                        "Compiling dependency '{}'...",
                        ctx.application.name
                    ));
                }

                let result = app.compile(&mut ctx).await?;

                results
                    .lock()
                    .unwrap()
                    .push((ctx.appfile.id.clone(), result));
                Ok(())
            }
        })
        .await
    }

    /// Build the deployable artifact for the compiled appfile.
    ///
    /// Dependencies have no effect on the build, and compile is expected to
    /// have run before: build never re-compiles.
    pub async fn build(&self) -> Result<(), CoreError> {
        let (infra, mut infra_ctx) = self.infra().await?;
        creds::ensure(&self.layout, infra.as_ref(), &mut infra_ctx).await?;

        let root = Arc::clone(self.root_file()?);
        let mut ctx = self.app_context(&root).await?;
        let app = self.registry.resolve_app(&ctx.tuple)?;

        info!(app = %ctx.application.name, "building deployable artifact");
        app.build(&mut ctx).await?;
        Ok(())
    }

    /// Bring up the development environment: load or build each
    /// dependency's cached dev dependency, then hand the root application
    /// the complete picture.
    pub async fn dev(&self) -> Result<(), CoreError> {
        let root = Arc::clone(self.root_file()?);
        let mut root_ctx = self.app_context(&root).await?;
        let root_app = self.registry.resolve_app(&root_ctx.tuple)?;

        self.walk_apps(|app, ctx, is_root| {
            let root_ctx = &root_ctx;
            async move {
                // The root is the dev environment itself; it runs after
                // the walk.
                if is_root {
                    return Ok(());
                }

                let name = ctx.application.name.clone();
                let cache_path = ctx.cache_dir.join(DEV_DEP_FILE);

                if devdep::read_dev_dep(&cache_path).await.is_ok() {
                    ctx.shared
                        .ui
                        .header(&format!("Using cached dev dependency for '{name}'"));
                    return Ok(());
                }

                debug!(dep = %name, "building dev dependency");
                let mut dep = app.dev_dep(root_ctx, &ctx).await.map_err(|source| {
                    CoreError::DevDepBuildFailed {
                        name: name.clone(),
                        source,
                    }
                })?;

                if !dep.files.is_empty() {
                    dep.rel_files(&ctx.cache_dir)
                        .map_err(|err| CoreError::DevDepBuildFailed {
                            name: name.clone(),
                            source: err.into(),
                        })?;
                    devdep::write_dev_dep(&cache_path, &dep)
                        .await
                        .map_err(|err| CoreError::DevDepBuildFailed {
                            name: name.clone(),
                            source: err.into(),
                        })?;
                }

                Ok(())
            }
        })
        .await?;

        info!(app = %root_ctx.application.name, "starting dev environment");
        root_app.dev(&mut root_ctx).await?;
        Ok(())
    }

    /// Execute `opts.action` against the target selected by `opts.task`.
    pub async fn execute(&self, opts: ExecuteOpts) -> Result<(), CoreError> {
        match opts.task {
            ExecuteTask::Dev => self.execute_app(opts).await,
            ExecuteTask::Infra => self.execute_infra(opts).await,
            other => Err(CoreError::UnknownTask(format!("{other:?}"))),
        }
    }

    async fn execute_app(&self, opts: ExecuteOpts) -> Result<(), CoreError> {
        let root = Arc::clone(self.root_file()?);
        let mut ctx = self.app_context(&root).await?;
        let app = self.registry.resolve_app(&ctx.tuple)?;

        ctx.action = Some(opts.action);
        ctx.action_args = opts.args;

        app.dev(&mut ctx).await?;
        Ok(())
    }

    async fn execute_infra(&self, opts: ExecuteOpts) -> Result<(), CoreError> {
        let (infra, mut ctx) = self.infra().await?;

        ctx.action = Some(opts.action);
        ctx.action_args = opts.args;

        infra.execute(&mut ctx).await?;
        Ok(())
    }

    fn root_file(&self) -> Result<&Arc<Appfile>, CoreError> {
        Ok(self.compiled.root()?)
    }

    /// Build the per-vertex app context.
    async fn app_context(&self, file: &Arc<Appfile>) -> Result<AppContext, CoreError> {
        let config = file.active_infrastructure().ok_or_else(|| {
            CoreError::InfraNotConfigured(file.project.infrastructure.clone())
        })?;

        let tuple = Tuple::new(
            &file.application.kind,
            &file.project.infrastructure,
            &config.flavor,
        );

        // The root compiles into "app"; dependencies into "dep-<id>".
        let root = self.root_file()?;
        let dir = if file.id == root.id {
            self.layout.app_dir()
        } else {
            self.layout.dep_dir(&file.id)
        };

        let cache_dir = self
            .layout
            .ensure_cache_dir(&file.id)
            .await
            .map_err(|source| CoreError::CacheSetupFailed {
                path: self.layout.cache_dir(&file.id),
                source,
            })?;

        Ok(AppContext {
            dir,
            cache_dir,
            tuple,
            appfile: Arc::clone(file),
            application: file.application.clone(),
            action: None,
            action_args: Vec::new(),
            dev_dep_fragments: Vec::new(),
            shared: self.shared.clone(),
        })
    }

    /// Resolve the infrastructure implementation and its context.
    async fn infra(&self) -> Result<(Arc<dyn Infra>, InfraContext), CoreError> {
        let root = self.root_file()?;
        let kind = root.project.infrastructure.clone();

        let infra = self.registry.resolve_infra(&kind)?;
        let config = root
            .active_infrastructure()
            .ok_or_else(|| CoreError::InfraNotConfigured(kind.clone()))?;

        let ctx = InfraContext {
            dir: self.layout.infra_dir(&kind),
            infra: config.clone(),
            action: None,
            action_args: Vec::new(),
            creds: CredsMap::new(),
            shared: self.shared.clone(),
        };
        Ok((infra, ctx))
    }

    /// Walk the graph in dependency order with fail-fast semantics: the
    /// first callback error sets a stop flag, callbacks on other branches
    /// observe it and return immediately so the traversal drains, and the
    /// error is propagated to the caller.
    async fn walk_apps<F, Fut>(&self, f: F) -> Result<(), CoreError>
    where
        F: Fn(Arc<dyn App>, AppContext, bool) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let stop = AtomicBool::new(false);

        let result = self
            .compiled
            .walk(self.max_parallel, |step: WalkStep| {
                let stop = &stop;
                let f = &f;
                async move {
                    // Another branch already failed; drain without working.
                    if stop.load(Ordering::SeqCst) {
                        return Ok(());
                    }

                    let out = self.visit(f, step).await;
                    if out.is_err() {
                        stop.store(true, Ordering::SeqCst);
                    }
                    out
                }
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(WalkError::Callback(err)) => Err(err),
            Err(WalkError::Graph(err)) => Err(err.into()),
        }
    }

    async fn visit<F, Fut>(&self, f: &F, step: WalkStep) -> Result<(), CoreError>
    where
        F: Fn(Arc<dyn App>, AppContext, bool) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let name = step.file.application.name.clone();

        let ctx = self
            .app_context(&step.file)
            .await
            .map_err(|err| CoreError::VertexContext {
                name: name.clone(),
                source: Box::new(err),
            })?;

        let app = self
            .registry
            .resolve_app(&ctx.tuple)
            .map_err(|err| CoreError::VertexApp { name, source: err })?;

        f(app, ctx, step.is_root).await
    }
}

/// Fragment paths of every recorded result, sorted by vertex id for
/// deterministic assembly.
fn fragment_paths(results: &[(String, CompileResult)]) -> Vec<PathBuf> {
    let mut tagged: Vec<(&str, &PathBuf)> = results
        .iter()
        .filter_map(|(id, result)| {
            result
                .dev_dep_fragment
                .as_ref()
                .map(|path| (id.as_str(), path))
        })
        .collect();
    tagged.sort_by_key(|(id, _)| *id);
    tagged.into_iter().map(|(_, path)| path.clone()).collect()
}
