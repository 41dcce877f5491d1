//! Remote archive access.
//!
//! Remote paths are `/`-separated strings relative to the archive root.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SyncError};

/// Archive holding one folder per year, one folder per patient below it.
pub trait RemoteStore {
    /// Names of the entries directly below `path`, sorted.
    fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Copies one remote file to `local`, creating parent folders.
    fn download(&self, remote: &str, local: &Path) -> Result<()>;

    /// Copies a remote folder recursively into `local_dir`.
    fn download_tree(&self, remote: &str, local_dir: &Path) -> Result<()>;

    /// Copies a local folder recursively to `remote`.
    fn upload_tree(&self, local_dir: &Path, remote: &str) -> Result<()>;
}

/// Joins remote path segments with `/`.
pub fn join_remote(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Archive mounted on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, remote: &str) -> PathBuf {
        remote
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl RemoteStore for LocalDirStore {
    fn list(&self, path: &str) -> Result<Vec<String>> {
        let dir = self.resolve(path);
        let remote_error = |source: std::io::Error| SyncError::Remote {
            operation: "list",
            path: path.to_string(),
            source,
        };
        let mut names = fs::read_dir(&dir)
            .map_err(remote_error)?
            .map(|entry| {
                entry
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .map_err(remote_error)
            })
            .collect::<Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn download(&self, remote: &str, local: &Path) -> Result<()> {
        if let Some(parent) = local.parent() {
            create_dir(parent)?;
        }
        fs::copy(self.resolve(remote), local).map_err(|source| SyncError::Remote {
            operation: "download",
            path: remote.to_string(),
            source,
        })?;
        debug!(remote, local = %local.display(), "downloaded file");
        Ok(())
    }

    fn download_tree(&self, remote: &str, local_dir: &Path) -> Result<()> {
        copy_tree(&self.resolve(remote), local_dir).map_err(|source| SyncError::Remote {
            operation: "download",
            path: remote.to_string(),
            source,
        })
    }

    fn upload_tree(&self, local_dir: &Path, remote: &str) -> Result<()> {
        copy_tree(local_dir, &self.resolve(remote)).map_err(|source| SyncError::Remote {
            operation: "upload",
            path: remote.to_string(),
            source,
        })?;
        debug!(local = %local_dir.display(), remote, "uploaded folder");
        Ok(())
    }
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

pub(crate) fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| SyncError::Io {
        operation: "create directory",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn remote_paths_join_with_slashes() {
        assert_eq!(join_remote("2024", "PA1"), "2024/PA1");
        assert_eq!(join_remote("/archive/2024/", "/PA1"), "/archive/2024/PA1");
        assert_eq!(join_remote("", "2024"), "2024");
    }

    #[test]
    fn trees_round_trip_through_the_store() {
        let remote = tempdir().unwrap();
        let local = tempdir().unwrap();
        let store = LocalDirStore::new(remote.path());

        let source = local.path().join("subject");
        fs::create_dir_all(source.join("sample_arrays/EEG")).unwrap();
        fs::write(source.join("metadata.json"), b"{}").unwrap();
        fs::write(source.join("sample_arrays/EEG/attributes.json"), b"{}").unwrap();

        store.upload_tree(&source, "2024/PA1/slf_PA1_V1_FE1").unwrap();
        assert_eq!(store.list("2024/PA1").unwrap(), vec!["slf_PA1_V1_FE1"]);

        let back = local.path().join("back");
        store.download_tree("2024/PA1/slf_PA1_V1_FE1", &back).unwrap();
        assert!(back.join("sample_arrays/EEG/attributes.json").is_file());
    }

    #[test]
    fn listing_a_missing_folder_fails() {
        let remote = tempdir().unwrap();
        let store = LocalDirStore::new(remote.path());
        assert!(matches!(
            store.list("1999"),
            Err(SyncError::Remote { operation: "list", .. })
        ));
    }
}
