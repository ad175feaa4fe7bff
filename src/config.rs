use anyhow::{Context, Result};
use std::env;
use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::bootstrap::{Channel, StartupOptions};
use crate::cli::Cli;

pub const ROOT_ENV: &str = "AUTOLOAD_ROOT";
pub const MAP_ENV: &str = "AUTOLOAD_MAP";
pub const FILES_ENV: &str = "AUTOLOAD_FILES";
pub const HOST_VERSION_ENV: &str = "AUTOLOAD_HOST_VERSION";

pub const CLASSMAP_FILE: &str = "classmap.json";
pub const FILES_FILE: &str = "files.json";

pub const DEFAULT_HOST_VERSION: &str = "8.2.0";

pub fn resolve_root(cli: &Cli) -> Result<PathBuf> {
    let root = match cli.root.clone() {
        Some(p) => p,
        None => match env::var_os(ROOT_ENV) {
            Some(p) => PathBuf::from(p),
            None => env::current_dir().context("Failed to read current directory")?,
        },
    };
    Ok(with_trailing_separator(&root))
}

pub fn resolve_map_path(cli: &Cli, root: &Path) -> Result<Option<PathBuf>> {
    resolve_data_file(cli.map.clone(), MAP_ENV, root, CLASSMAP_FILE)
}

pub fn resolve_files_path(cli: &Cli, root: &Path) -> Result<Option<PathBuf>> {
    resolve_data_file(cli.files.clone(), FILES_ENV, root, FILES_FILE)
}

pub fn resolve_host_version(cli: &Cli) -> String {
    if let Some(v) = cli.host_version.clone() {
        return v;
    }
    env::var(HOST_VERSION_ENV).unwrap_or_else(|_| DEFAULT_HOST_VERSION.to_string())
}

pub fn startup_options(cli: &Cli) -> Result<StartupOptions> {
    let root = resolve_root(cli)?;
    let mut options = StartupOptions::new(resolve_host_version(cli), root.clone());
    options.channel = Channel::detect();
    options.lookup_table = resolve_map_path(cli, &root)?;
    options.include_list = resolve_files_path(cli, &root)?;
    options.extension = cli.ext.clone();
    options.prepend = !cli.append;
    Ok(options)
}

/// Search roots are prefixes, so the primary root must end in a separator.
pub fn with_trailing_separator(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    if !os.to_string_lossy().ends_with(MAIN_SEPARATOR) {
        os.push(MAIN_SEPARATOR.to_string());
    }
    PathBuf::from(os)
}

// flag, env var, `<root>/autoload/<name>`, user data dir
fn resolve_data_file(
    flag: Option<PathBuf>,
    env_key: &str,
    root: &Path,
    file_name: &str,
) -> Result<Option<PathBuf>> {
    if let Some(p) = flag {
        return Ok(Some(p));
    }
    if let Some(p) = env::var_os(env_key) {
        return Ok(Some(PathBuf::from(p)));
    }

    let local = root.join("autoload").join(file_name);
    if local.exists() {
        return Ok(Some(local));
    }

    let user = class_autoload_home()?.join(file_name);
    if user.exists() {
        return Ok(Some(user));
    }
    Ok(None)
}

fn class_autoload_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("class-autoload"))
}
