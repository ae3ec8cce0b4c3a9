//! Cached development dependencies.
//!
//! A dependency vertex can prebuild an immutable artifact once and have the
//! root consume it when composing the dev environment. The descriptor lives
//! at `<cache_dir>/dev-dep.json` next to the files it references.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the descriptor file inside a vertex cache directory.
pub const DEV_DEP_FILE: &str = "dev-dep.json";

/// Dev dependency errors
#[derive(Debug, Error)]
pub enum DevDepError {
    #[error("reading dev dependency descriptor: {0}")]
    Io(#[from] std::io::Error),
    #[error("decoding dev dependency descriptor: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("dev dependency file '{0}' is outside the cache directory '{1}'")]
    OutsideCache(PathBuf, PathBuf),
}

/// A prebuilt development dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevDep {
    /// Files making up the dependency, relative to its cache directory.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl DevDep {
    /// Rewrite `files` to be relative to `cache_dir`, verifying that every
    /// entry actually lives under it.
    pub fn rel_files(&mut self, cache_dir: &Path) -> Result<(), DevDepError> {
        for file in &mut self.files {
            if file.is_absolute() {
                let rel = file.strip_prefix(cache_dir).map_err(|_| {
                    DevDepError::OutsideCache(file.clone(), cache_dir.to_path_buf())
                })?;
                *file = rel.to_path_buf();
            } else if file
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                return Err(DevDepError::OutsideCache(
                    file.clone(),
                    cache_dir.to_path_buf(),
                ));
            }
        }
        Ok(())
    }
}

/// Read a descriptor from `path`.
pub async fn read_dev_dep(path: &Path) -> Result<DevDep, DevDepError> {
    let raw = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Write `dep` as the descriptor at `path`.
pub async fn write_dev_dep(path: &Path, dep: &DevDep) -> Result<(), DevDepError> {
    let raw = serde_json::to_vec_pretty(dep)?;
    tokio::fs::write(path, raw).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_round_trip() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join(DEV_DEP_FILE);

            let dep = DevDep {
                files: vec![PathBuf::from("bin/tool"), PathBuf::from("lib/helper.sh")],
            };
            write_dev_dep(&path, &dep).await.expect("write");

            let back = read_dev_dep(&path).await.expect("read");
            assert_eq!(back, dep);
        });
    }

    #[test]
    fn test_read_missing_descriptor_fails() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().expect("tempdir");
            let err = read_dev_dep(&dir.path().join(DEV_DEP_FILE))
                .await
                .expect_err("missing file");
            assert!(matches!(err, DevDepError::Io(_)));
        });
    }

    #[test]
    fn test_rel_files_strips_cache_prefix() {
        let cache = Path::new("/data/cache/app-1");
        let mut dep = DevDep {
            files: vec![
                cache.join("bin/tool"),
                PathBuf::from("already/relative"),
            ],
        };

        dep.rel_files(cache).expect("rel files");
        assert_eq!(
            dep.files,
            vec![PathBuf::from("bin/tool"), PathBuf::from("already/relative")]
        );
    }

    #[test]
    fn test_rel_files_rejects_paths_outside_cache() {
        let cache = Path::new("/data/cache/app-1");
        let mut dep = DevDep {
            files: vec![PathBuf::from("/data/cache/other/bin/tool")],
        };
        assert!(matches!(
            dep.rel_files(cache),
            Err(DevDepError::OutsideCache(..))
        ));

        let mut dep = DevDep {
            files: vec![PathBuf::from("../escape")],
        };
        assert!(matches!(
            dep.rel_files(cache),
            Err(DevDepError::OutsideCache(..))
        ));
    }
}
