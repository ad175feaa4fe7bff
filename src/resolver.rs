use anyhow::Result;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::include::SourceStore;
use crate::lookup::LookupTable;
use crate::probe::{FileProbe, FsProbe};
use crate::registry::{AutoloadRegistry, Autoloader, RegistrationError};

pub const DEFAULT_NAMESPACE_DELIMITER: char = '\\';
pub const DEFAULT_EXTENSION: &str = "php";
pub const DEFAULT_HOOK_NAME: &str = "class-autoload";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum Origin {
    Map,
    Root,
    Fallback(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub path: PathBuf,
    pub origin: Origin,
}

/// Lookup order is fixed: exact class map entry, then the primary root, then
/// each fallback directory in table order. The first hit wins. Roots are path
/// prefixes and are concatenated, not joined, with the relative class path.
#[derive(Debug)]
pub struct ClassResolver<P = FsProbe> {
    name: String,
    table: LookupTable,
    root: PathBuf,
    delimiter: char,
    extension: String,
    probe: P,
}

impl ClassResolver<FsProbe> {
    pub fn new(table: LookupTable, root: impl Into<PathBuf>) -> Self {
        Self::with_probe(table, root, FsProbe)
    }
}

impl<P: FileProbe> ClassResolver<P> {
    pub fn with_probe(table: LookupTable, root: impl Into<PathBuf>, probe: P) -> Self {
        Self {
            name: DEFAULT_HOOK_NAME.to_string(),
            table,
            root: root.into(),
            delimiter: DEFAULT_NAMESPACE_DELIMITER,
            extension: DEFAULT_EXTENSION.to_string(),
            probe,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn resolve(&self, class: &str) -> Option<PathBuf> {
        self.locate(class).map(|r| r.path)
    }

    pub fn locate(&self, class: &str) -> Option<Resolution> {
        if let Some(path) = self.table.lookup(class) {
            return Some(Resolution {
                path: path.to_path_buf(),
                origin: Origin::Map,
            });
        }

        let relative = self.relative_path(class);

        let candidate = self.candidate(&self.root, &relative);
        if self.probe.exists(&candidate) {
            return Some(Resolution {
                path: candidate,
                origin: Origin::Root,
            });
        }

        self.table.dir.iter().enumerate().find_map(|(idx, dir)| {
            let candidate = self.candidate(dir, &relative);
            self.probe.exists(&candidate).then_some(Resolution {
                path: candidate,
                origin: Origin::Fallback(idx),
            })
        })
    }

    pub fn load(&self, class: &str, sources: &mut SourceStore) -> Result<bool> {
        let Some(path) = self.resolve(class) else {
            log::debug!("{}: no file for {class}", self.name);
            return Ok(false);
        };
        sources.include_once(&path)?;
        Ok(true)
    }

    pub fn relative_path(&self, class: &str) -> String {
        class.replace(self.delimiter, MAIN_SEPARATOR_STR)
    }

    fn candidate(&self, prefix: &Path, relative: &str) -> PathBuf {
        let mut os = OsString::from(prefix.as_os_str());
        os.push(relative);
        os.push(".");
        os.push(&self.extension);
        PathBuf::from(os)
    }
}

impl<P: FileProbe + 'static> ClassResolver<P> {
    pub fn register(
        self,
        registry: &mut AutoloadRegistry,
        prepend: bool,
    ) -> std::result::Result<(), RegistrationError> {
        registry.register(Box::new(self), prepend)
    }
}

impl<P: FileProbe> Autoloader for ClassResolver<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, class: &str, sources: &mut SourceStore) -> Result<bool> {
        ClassResolver::load(self, class, sources)
    }
}
