//! Read-only accessor for the download repository.
//!
//! The repository is a single flat directory: only regular files directly
//! inside the root are visible. Nothing here caches directory state; every
//! `list` call re-reads the directory so files added at runtime show up
//! without a restart.

use crate::error_handling::types::RepositoryError;
use log::error;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;

pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the regular files directly under the root, sorted.
    ///
    /// An unreadable or missing root is logged and reported as an empty
    /// listing rather than an error; the session serving the request must
    /// not die because of a repository hiccup.
    pub fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    "Failed to read file repository {}: {}",
                    self.root.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    /// Opens a file for streaming, returning the handle and its size.
    ///
    /// The name must be a bare filename; anything that resolves outside the
    /// repository root (parent segments, separators, absolute paths) is
    /// rejected before the filesystem is consulted.
    pub async fn open(&self, name: &str) -> Result<(File, u64), RepositoryError> {
        let path = self.resolve(name)?;

        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(RepositoryError::NotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(name.to_string()))
            }
            Err(e) => return Err(RepositoryError::IoError(e)),
        };

        let file = File::open(&path).await?;
        Ok((file, metadata.len()))
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, RepositoryError> {
        let candidate = Path::new(name);
        let mut components = candidate.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(candidate)),
            _ => Err(RepositoryError::PathTraversal(name.to_string())),
        }
    }
}
