use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;

use crate::lookup::LookupTable;

pub fn scan_sources(base_path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !base_path.is_dir() {
        anyhow::bail!("Search root is not a directory: {}", base_path.display());
    }

    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if entry.file_type().is_some_and(|t| t.is_file())
                    && path.extension().is_some_and(|e| e == extension)
                {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    Ok(rx.iter().collect())
}

// `<root>/App/Models/User.php` -> `App\Models\User`
pub fn source_path_to_class_name(root: &Path, path: &Path, delimiter: char) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(s) => segments.push(s.to_str()?),
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    let separator = delimiter.to_string();
    Some(segments.join(separator.as_str()))
}

pub fn build_lookup_table(root: &Path, extension: &str, delimiter: char) -> Result<LookupTable> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve search root: {}", root.display()))?;
    let sources = scan_sources(&root, extension)?;

    let entries: Vec<(String, PathBuf)> = sources
        .par_iter()
        .filter_map(|path| {
            source_path_to_class_name(&root, path, delimiter).map(|class| (class, path.clone()))
        })
        .collect();

    let mut table = LookupTable::new();
    for (class, path) in entries {
        table.file.insert(class, path);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn source_path_maps_to_namespaced_class() {
        let root = Path::new("/project/src");
        assert_eq!(
            source_path_to_class_name(root, &root.join("App/Models/User.php"), '\\').as_deref(),
            Some("App\\Models\\User")
        );
        assert_eq!(
            source_path_to_class_name(root, Path::new("/elsewhere/User.php"), '\\'),
            None
        );
    }

    #[test]
    fn build_lookup_table_indexes_matching_extension_only() -> Result<()> {
        let base = temp_dir("class-autoload-scan");
        fs::create_dir_all(base.join("App/Models"))?;
        fs::write(base.join("App/Models/User.php"), "<?php")?;
        fs::write(base.join("App/Kernel.php"), "<?php")?;
        fs::write(base.join("App/README.md"), "docs")?;

        let table = build_lookup_table(&base, "php", '\\')?;
        let canonical = base.canonicalize()?;
        assert_eq!(table.file.len(), 2);
        assert_eq!(
            table.lookup("App\\Models\\User"),
            Some(canonical.join("App/Models/User.php").as_path())
        );
        assert!(table.lookup("App\\Kernel").is_some());
        assert!(table.dir.is_empty());

        let _ = fs::remove_dir_all(&base);
        Ok(())
    }

    #[test]
    fn missing_root_is_an_error() {
        let base = temp_dir("class-autoload-scan-missing");
        assert!(scan_sources(&base, "php").is_err());
    }
}
