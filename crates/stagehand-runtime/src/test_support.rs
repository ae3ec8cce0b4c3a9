//! Test-only mock implementations and fixtures.
//!
//! Kept as a normal module so integration tests and downstream embedders
//! can drive the core without real plugin implementations.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use stagehand_core::app::{App, AppContext, AppFactory, CompileResult};
use stagehand_core::appfile::{Appfile, Application, Infrastructure, Project};
use stagehand_core::context::Shared;
use stagehand_core::devdep::DevDep;
use stagehand_core::directory::InMemoryDirectory;
use stagehand_core::infra::{CredsMap, Infra, InfraCompileResult, InfraContext, InfraFactory};
use stagehand_ui::Ui;

/// Appfile fixture targeting the `aws` infrastructure with flavor `simple`.
pub fn appfile(id: &str, name: &str, kind: &str) -> Appfile {
    Appfile {
        id: id.to_string(),
        application: Application {
            name: name.to_string(),
            kind: kind.to_string(),
        },
        project: Project {
            name: format!("{name} project"),
            infrastructure: "aws".to_string(),
        },
        infrastructure: vec![Infrastructure {
            name: "aws".to_string(),
            kind: "aws".to_string(),
            flavor: "simple".to_string(),
        }],
    }
}

/// Infra context fixture for driving credential flows directly.
pub fn infra_context(ui: Arc<dyn Ui>) -> InfraContext {
    InfraContext {
        dir: PathBuf::from("infra-aws"),
        infra: Infrastructure {
            name: "aws".to_string(),
            kind: "aws".to_string(),
            flavor: "simple".to_string(),
        },
        action: None,
        action_args: Vec::new(),
        creds: CredsMap::new(),
        shared: Shared {
            directory: Arc::new(InMemoryDirectory::new()),
            ui,
        },
    }
}

/// Counter-instrumented mock application.
#[derive(Default, Debug)]
pub struct MockApp {
    /// Fragment file `compile` writes into its output dir and reports.
    pub fragment_file: Option<String>,
    /// Fail `compile` with this message.
    pub fail_compile: Option<String>,
    /// Files `dev_dep` creates inside the cache directory.
    pub dev_dep_files: Vec<String>,
    /// Fail `dev_dep` with this message.
    pub fail_dev_dep: Option<String>,
    pub compile_calls: AtomicUsize,
    pub build_calls: AtomicUsize,
    pub dev_calls: AtomicUsize,
    pub dev_dep_calls: AtomicUsize,
    /// `(appfile id, fragments)` snapshots observed by `compile`.
    pub compiled: Mutex<Vec<(String, Vec<PathBuf>)>>,
    /// Actions observed by `dev`.
    pub dev_actions: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl App for MockApp {
    async fn compile(&self, ctx: &mut AppContext) -> anyhow::Result<CompileResult> {
        self.compile_calls.fetch_add(1, Ordering::SeqCst);
        self.compiled
            .lock()
            .unwrap()
            .push((ctx.appfile.id.clone(), ctx.dev_dep_fragments.clone()));
        if let Some(message) = &self.fail_compile {
            return Err(anyhow!("{message}"));
        }

        tokio::fs::create_dir_all(&ctx.dir).await?;
        let dev_dep_fragment = match &self.fragment_file {
            Some(name) => {
                let path = ctx.dir.join(name);
                tokio::fs::write(&path, "# dev fragment\n").await?;
                Some(path)
            }
            None => None,
        };
        Ok(CompileResult { dev_dep_fragment })
    }

    async fn build(&self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn dev(&self, ctx: &mut AppContext) -> anyhow::Result<()> {
        self.dev_calls.fetch_add(1, Ordering::SeqCst);
        self.dev_actions.lock().unwrap().push(ctx.action.clone());
        Ok(())
    }

    async fn dev_dep(&self, _root: &AppContext, ctx: &AppContext) -> anyhow::Result<DevDep> {
        self.dev_dep_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_dev_dep {
            return Err(anyhow!("{message}"));
        }

        let mut files = Vec::new();
        for name in &self.dev_dep_files {
            let path = ctx.cache_dir.join(name);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, "dev dependency artifact\n").await?;
            files.push(path);
        }
        Ok(DevDep { files })
    }
}

/// Factory handing out clones of one shared mock app.
pub fn app_factory(app: Arc<MockApp>) -> Arc<dyn AppFactory> {
    Arc::new(move || -> anyhow::Result<Arc<dyn App>> { Ok(Arc::clone(&app) as Arc<dyn App>) })
}

/// Counter-instrumented mock infrastructure.
#[derive(Default, Debug)]
pub struct MockInfra {
    /// Credentials `creds` hands back.
    pub creds: CredsMap,
    /// Fail `compile` with this message.
    pub fail_compile: Option<String>,
    pub compile_calls: AtomicUsize,
    pub execute_calls: AtomicUsize,
    pub creds_calls: AtomicUsize,
    /// Actions observed by `execute`.
    pub execute_actions: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl Infra for MockInfra {
    async fn compile(&self, ctx: &mut InfraContext) -> anyhow::Result<InfraCompileResult> {
        self.compile_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_compile {
            return Err(anyhow!("{message}"));
        }
        tokio::fs::create_dir_all(&ctx.dir).await?;
        Ok(InfraCompileResult)
    }

    async fn execute(&self, ctx: &mut InfraContext) -> anyhow::Result<()> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.execute_actions.lock().unwrap().push(ctx.action.clone());
        Ok(())
    }

    async fn creds(&self, _ctx: &mut InfraContext) -> anyhow::Result<CredsMap> {
        self.creds_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.creds.clone())
    }
}

/// Factory handing out clones of one shared mock infrastructure.
pub fn infra_factory(infra: Arc<MockInfra>) -> Arc<dyn InfraFactory> {
    Arc::new(move || -> anyhow::Result<Arc<dyn Infra>> { Ok(Arc::clone(&infra) as Arc<dyn Infra>) })
}
