//! Precomputed lookup data: the class map with its fallback directories, and
//! the eager-include list.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupTable {
    #[serde(default)]
    pub file: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub dir: Vec<PathBuf>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, class: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.file.insert(class.into(), path.into());
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir.push(dir.into());
        self
    }

    pub fn lookup(&self, class: &str) -> Option<&Path> {
        self.file.get(class).map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.dir.is_empty()
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse lookup table")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lookup table: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse lookup table: {}", path.display()))
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                log::debug!("lookup table {} not present, using empty table", p.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

pub fn load_include_list(path: &Path) -> Result<Vec<PathBuf>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read include list: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse include list: {}", path.display()))
}

pub fn load_include_list_optional(path: Option<&Path>) -> Result<Vec<PathBuf>> {
    match path {
        Some(p) if p.exists() => load_include_list(p),
        _ => Ok(Vec::new()),
    }
}
