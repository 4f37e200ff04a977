// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sandboxed storage root for file-path document sources.

use std::path::{Component, Path, PathBuf};

use druckwerk_core::error::{DruckwerkError, Result};

/// A directory beneath which all `file_path` document sources must live.
///
/// Callers only ever supply relative paths; anything absolute or escaping
/// the root via parent components is rejected before the filesystem is
/// touched.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    /// Use `root` as the storage sandbox. The directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DruckwerkError::Config(format!(
                "storage path {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller-supplied relative path against the root.
    ///
    /// Rejects absolute paths and any path containing a parent component;
    /// `a/../b` is rejected even though it stays inside the root, because
    /// nothing legitimate produces such paths.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);

        if relative.is_empty() {
            return Err(DruckwerkError::InvalidArgument(
                "empty document file path".into(),
            ));
        }

        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(DruckwerkError::InvalidArgument(format!(
                        "file path {relative:?} escapes the storage root"
                    )));
                }
            }
        }

        Ok(self.root.join(path))
    }
}
