//! On-disk layout for one appfile session.
//!
//! Three roots with different lifetimes: `data_dir` is global to every
//! stagehand process and holds the long-lived per-vertex caches;
//! `local_dir` is private to this appfile and survives compilation (it
//! holds the encrypted credentials); `compile_dir` is wiped at the start of
//! every compile and repopulated by it.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

/// Computes and creates the directories a core session works with.
#[derive(Debug, Clone)]
pub struct Layout {
    data_dir: PathBuf,
    local_dir: PathBuf,
    compile_dir: PathBuf,
}

impl Layout {
    /// Create a layout over the three session roots.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        local_dir: impl Into<PathBuf>,
        compile_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            local_dir: local_dir.into(),
            compile_dir: compile_dir.into(),
        }
    }

    /// The compile output root.
    pub fn compile_dir(&self) -> &Path {
        &self.compile_dir
    }

    /// Output directory for the root application.
    pub fn app_dir(&self) -> PathBuf {
        self.compile_dir.join("app")
    }

    /// Output directory for the dependency vertex `id`.
    pub fn dep_dir(&self, id: &str) -> PathBuf {
        self.compile_dir.join(format!("dep-{id}"))
    }

    /// Output directory for infrastructure artifacts of type `kind`.
    pub fn infra_dir(&self, kind: &str) -> PathBuf {
        self.compile_dir.join(format!("infra-{kind}"))
    }

    /// Cache directory for the vertex `id`; stable across runs.
    pub fn cache_dir(&self, id: &str) -> PathBuf {
        self.data_dir.join("cache").join(id)
    }

    /// Path of the encrypted credentials file.
    pub fn creds_path(&self) -> PathBuf {
        self.local_dir.join("creds")
    }

    /// Create the cache directory for `id`. Idempotent.
    pub async fn ensure_cache_dir(&self, id: &str) -> io::Result<PathBuf> {
        let dir = self.cache_dir(id);
        mkdir_all(&dir).await?;
        Ok(dir)
    }

    /// Create `local_dir` if missing; called lazily before the first
    /// credential write.
    pub async fn ensure_local_dir(&self) -> io::Result<()> {
        mkdir_all(&self.local_dir).await
    }

    /// Erase all prior compile output, ignoring a missing directory.
    pub async fn clean_compile_dir(&self) -> io::Result<()> {
        info!(
            dir = %self.compile_dir.display(),
            "deleting prior compilation contents"
        );
        match fs::remove_dir_all(&self.compile_dir).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

async fn mkdir_all(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(root: &Path) -> Layout {
        Layout::new(root.join("data"), root.join("local"), root.join("compile"))
    }

    #[test]
    fn test_path_derivation() {
        let layout = layout(Path::new("/tmp/session"));

        assert_eq!(layout.app_dir(), PathBuf::from("/tmp/session/compile/app"));
        assert_eq!(
            layout.dep_dir("web-db"),
            PathBuf::from("/tmp/session/compile/dep-web-db")
        );
        assert_eq!(
            layout.infra_dir("aws"),
            PathBuf::from("/tmp/session/compile/infra-aws")
        );
        assert_eq!(
            layout.cache_dir("web-db"),
            PathBuf::from("/tmp/session/data/cache/web-db")
        );
        assert_eq!(
            layout.creds_path(),
            PathBuf::from("/tmp/session/local/creds")
        );
    }

    #[test]
    fn test_ensure_cache_dir_is_idempotent() {
        tokio_test::block_on(async {
            let root = tempfile::tempdir().expect("tempdir");
            let layout = layout(root.path());

            let first = layout.ensure_cache_dir("app-1").await.expect("create");
            let second = layout.ensure_cache_dir("app-1").await.expect("recreate");
            assert_eq!(first, second);
            assert!(first.is_dir());
        });
    }

    #[test]
    fn test_clean_compile_dir_ignores_missing() {
        tokio_test::block_on(async {
            let root = tempfile::tempdir().expect("tempdir");
            let layout = layout(root.path());

            layout.clean_compile_dir().await.expect("clean missing");
        });
    }

    #[test]
    fn test_clean_compile_dir_removes_contents() {
        tokio_test::block_on(async {
            let root = tempfile::tempdir().expect("tempdir");
            let layout = layout(root.path());

            tokio::fs::create_dir_all(layout.compile_dir())
                .await
                .expect("mkdir");
            tokio::fs::write(layout.compile_dir().join("stale.txt"), b"old")
                .await
                .expect("write");

            layout.clean_compile_dir().await.expect("clean");
            assert!(!layout.compile_dir().exists());
        });
    }
}
