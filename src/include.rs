//! The "include once" primitive shared by eager includes and autoloading.

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct IncludedSource {
    pub path: PathBuf,
    pub bytes: usize,
    pub content_hash: String,
}

#[derive(Debug, Default)]
pub struct SourceStore {
    attempted: HashSet<PathBuf>,
    failed: HashSet<PathBuf>,
    included: Vec<IncludedSource>,
}

impl SourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(false)` when the path is already included. A path whose read failed
    /// keeps failing on later calls and is never read again.
    pub fn include_once(&mut self, path: &Path) -> Result<bool> {
        if self.failed.contains(path) {
            anyhow::bail!("Source file failed to include earlier: {}", path.display());
        }
        if !self.attempted.insert(path.to_path_buf()) {
            log::debug!("already included: {}", path.display());
            return Ok(false);
        }

        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                self.failed.insert(path.to_path_buf());
                return Err(e)
                    .with_context(|| format!("Failed to include source file: {}", path.display()));
            }
        };
        log::debug!("included {} ({} bytes)", path.display(), content.len());
        self.included.push(IncludedSource {
            path: path.to_path_buf(),
            bytes: content.len(),
            content_hash: hash_content(&content),
        });
        Ok(true)
    }

    pub fn is_included(&self, path: &Path) -> bool {
        self.included.iter().any(|s| s.path == path)
    }

    pub fn included(&self) -> &[IncludedSource] {
        &self.included
    }
}

pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "class_autoload_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    #[test]
    fn include_once_skips_second_inclusion() -> Result<()> {
        let path = temp_path("Helpers.php");
        std::fs::write(&path, "<?php function helper() {}")?;

        let mut store = SourceStore::new();
        assert!(store.include_once(&path)?);
        assert!(!store.include_once(&path)?);
        assert_eq!(store.included().len(), 1);
        assert!(store.is_included(&path));
        assert_eq!(store.included()[0].bytes, 26);

        std::fs::remove_file(path)?;
        Ok(())
    }

    #[test]
    fn failed_read_keeps_failing_without_rereading() {
        let path = temp_path("Missing.php");
        let mut store = SourceStore::new();

        let err = store.include_once(&path).unwrap_err();
        assert!(format!("{err}").contains("Missing.php"));

        // Creating the file afterwards does not turn the earlier failure into success.
        std::fs::write(&path, "<?php").unwrap();
        let again = store.include_once(&path).unwrap_err();
        assert!(format!("{again}").contains("failed to include earlier"));
        assert!(!store.is_included(&path));
        assert!(store.included().is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn hash_content_is_sha256_hex() {
        assert_eq!(
            hash_content(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
