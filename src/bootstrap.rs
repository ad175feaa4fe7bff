//! Startup sequence: host environment check, lookup table loading, resolver
//! registration and eager includes.
//!
//! Nothing here writes to stdout or stderr. Failures come back as values and
//! the caller decides how to surface them.

use anyhow::Context;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::include::SourceStore;
use crate::lookup::{self, LookupTable};
use crate::registry::{AutoloadRegistry, RegistrationError};
use crate::resolver::{ClassResolver, DEFAULT_EXTENSION, DEFAULT_HOOK_NAME};

pub const MIN_HOST_VERSION: HostVersion = HostVersion::new(5, 3, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HostVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl HostVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    // `8`, `8.2`, `8.3.0-dev`, `7.4.33+deb`; missing components are zero.
    pub fn parse(raw: &str) -> Option<Self> {
        let core = raw
            .trim()
            .split(|c: char| c == '-' || c == '+' || c == ' ')
            .next()?;
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(p) => leading_number(p)?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => leading_number(p)?,
            None => 0,
        };
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// "1RC1" -> 1
fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Cli,
    // Carries a status line and headers.
    Http,
}

impl Channel {
    pub fn detect() -> Self {
        Self::from_gateway(std::env::var_os("GATEWAY_INTERFACE").is_some())
    }

    fn from_gateway(has_gateway: bool) -> Self {
        if has_gateway { Self::Http } else { Self::Cli }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub channel: Channel,
    pub status: Option<u16>,
    pub message: String,
}

impl Diagnostic {
    pub fn fatal(channel: Channel, message: impl Into<String>) -> Self {
        let status = match channel {
            Channel::Cli => None,
            Channel::Http => Some(500),
        };
        Self {
            channel,
            status,
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        match self.channel {
            Channel::Cli => format!("{}\n", self.message),
            Channel::Http => format!(
                "Status: {} Internal Server Error\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\n",
                self.status.unwrap_or(500),
                self.message
            ),
        }
    }
}

pub fn check_environment(
    version: &str,
    channel: Channel,
) -> std::result::Result<HostVersion, Diagnostic> {
    let Some(parsed) = HostVersion::parse(version) else {
        return Err(Diagnostic::fatal(
            channel,
            format!("Unrecognized host runtime version `{version}`"),
        ));
    };
    if parsed < MIN_HOST_VERSION {
        return Err(Diagnostic::fatal(
            channel,
            format!(
                "Host runtime {parsed} is not supported, version {MIN_HOST_VERSION} or later is required"
            ),
        ));
    }
    Ok(parsed)
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("environment check failed: {0}")]
    Precondition(Diagnostic),
    #[error("bootstrap aborted: {0}")]
    Registration(RegistrationError),
    #[error(transparent)]
    Load(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub host_version: String,
    pub channel: Channel,
    pub root: PathBuf,
    pub lookup_table: Option<PathBuf>,
    pub include_list: Option<PathBuf>,
    pub extension: String,
    pub prepend: bool,
}

impl StartupOptions {
    pub fn new(host_version: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            host_version: host_version.into(),
            channel: Channel::Cli,
            root: root.into(),
            lookup_table: None,
            include_list: None,
            extension: DEFAULT_EXTENSION.to_string(),
            prepend: true,
        }
    }
}

#[derive(Debug)]
pub struct Host {
    pub version: HostVersion,
    pub registry: AutoloadRegistry,
    pub sources: SourceStore,
}

impl Host {
    pub fn autoload(&mut self, class: &str) -> anyhow::Result<Option<String>> {
        self.registry.autoload(class, &mut self.sources)
    }
}

pub fn startup(options: &StartupOptions) -> std::result::Result<Host, BootstrapError> {
    let mut registry = AutoloadRegistry::new();
    let version = startup_with(options, &mut registry)?;
    let sources = include_eager(options)?;
    Ok(Host {
        version,
        registry,
        sources,
    })
}

pub fn startup_with(
    options: &StartupOptions,
    registry: &mut AutoloadRegistry,
) -> std::result::Result<HostVersion, BootstrapError> {
    let version = check_environment(&options.host_version, options.channel)
        .map_err(BootstrapError::Precondition)?;

    let table = LookupTable::load_optional(options.lookup_table.as_deref())?;
    log::info!(
        "lookup table: {} mapped classes, {} fallback dirs",
        table.file.len(),
        table.dir.len()
    );

    ClassResolver::new(table, options.root.clone())
        .named(DEFAULT_HOOK_NAME)
        .extension(options.extension.clone())
        .register(registry, options.prepend)
        .map_err(BootstrapError::Registration)?;
    Ok(version)
}

fn include_eager(options: &StartupOptions) -> anyhow::Result<SourceStore> {
    let files = lookup::load_include_list_optional(options.include_list.as_deref())?;
    let mut sources = SourceStore::new();
    for file in &files {
        sources
            .include_once(file)
            .with_context(|| format!("Failed to include eager file: {}", file.display()))?;
    }
    log::info!("eagerly included {} files", sources.included().len());
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "class_autoload_boot_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    #[test]
    fn host_version_parsing() {
        assert_eq!(HostVersion::parse("8.2.1"), Some(HostVersion::new(8, 2, 1)));
        assert_eq!(HostVersion::parse("8.3.0-dev"), Some(HostVersion::new(8, 3, 0)));
        assert_eq!(HostVersion::parse("7"), Some(HostVersion::new(7, 0, 0)));
        assert_eq!(HostVersion::parse("5.3.0RC2"), Some(HostVersion::new(5, 3, 0)));
        assert_eq!(HostVersion::parse("banana"), None);
        assert_eq!(HostVersion::parse(""), None);
    }

    #[test]
    fn old_host_is_rejected_on_both_channels() {
        let cli = check_environment("5.2.17", Channel::Cli).unwrap_err();
        assert_eq!(cli.status, None);
        assert!(cli.render().starts_with("Host runtime 5.2.17 is not supported"));

        let http = check_environment("5.2.17", Channel::Http).unwrap_err();
        assert_eq!(http.status, Some(500));
        let rendered = http.render();
        assert!(rendered.starts_with("Status: 500 Internal Server Error\r\n"));
        assert!(rendered.ends_with("version 5.3.0 or later is required\n"));

        assert_eq!(
            check_environment("5.3.0", Channel::Cli),
            Ok(HostVersion::new(5, 3, 0))
        );
    }

    #[test]
    fn channel_follows_gateway_presence() {
        assert_eq!(Channel::from_gateway(true), Channel::Http);
        assert_eq!(Channel::from_gateway(false), Channel::Cli);
    }

    #[test]
    fn failed_precondition_registers_nothing() {
        let mut registry = AutoloadRegistry::new();
        let options = StartupOptions::new("4.4.9", "/src/");
        let err = startup_with(&options, &mut registry).unwrap_err();
        assert!(matches!(err, BootstrapError::Precondition(_)));
        assert!(registry.hook_names().is_empty());
    }

    #[test]
    fn second_startup_in_same_registry_is_a_registration_error() {
        let mut registry = AutoloadRegistry::new();
        let options = StartupOptions::new("8.2.0", "/src/");
        startup_with(&options, &mut registry).unwrap();
        let err = startup_with(&options, &mut registry).unwrap_err();
        assert!(matches!(err, BootstrapError::Registration(_)));
        assert!(err.to_string().contains(DEFAULT_HOOK_NAME));
    }

    #[test]
    fn startup_includes_eager_files_once_and_autoloads() -> anyhow::Result<()> {
        let base = temp_dir("startup");
        let src = base.join("src");
        std::fs::create_dir_all(src.join("App"))?;
        let helpers = base.join("helpers.php");
        std::fs::write(&helpers, "<?php")?;
        std::fs::write(src.join("App").join("User.php"), "<?php class User {}")?;

        let files = base.join("files.json");
        std::fs::write(
            &files,
            serde_json::to_string(&vec![helpers.clone(), helpers.clone()])?,
        )?;
        let map = base.join("classmap.json");
        let table = LookupTable::new().with_file("App\\Alias", src.join("App").join("User.php"));
        std::fs::write(&map, serde_json::to_string(&table)?)?;

        let mut options = StartupOptions::new("8.1.0", format!("{}/", src.display()));
        options.lookup_table = Some(map);
        options.include_list = Some(files);

        let mut host = startup(&options)?;
        assert_eq!(host.sources.included().len(), 1);
        assert_eq!(host.autoload("App\\User")?.as_deref(), Some(DEFAULT_HOOK_NAME));
        assert_eq!(host.autoload("App\\Alias")?.as_deref(), Some(DEFAULT_HOOK_NAME));
        assert_eq!(host.sources.included().len(), 2);
        assert_eq!(host.autoload("App\\Ghost")?, None);

        let _ = std::fs::remove_dir_all(&base);
        Ok(())
    }
}
