use anyhow::{Context, Result};
use clap::Parser;
use class_autoload::bootstrap::{self, BootstrapError, Channel, Diagnostic};
use class_autoload::cli::{Cli, Commands};
use class_autoload::config::{
    resolve_host_version, resolve_map_path, resolve_root, startup_options,
};
use class_autoload::include::IncludedSource;
use class_autoload::lookup::LookupTable;
use class_autoload::resolver::{ClassResolver, Origin, DEFAULT_NAMESPACE_DELIMITER};
use class_autoload::scan::build_lookup_table;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = parse_cli();

    match cli.command.clone() {
        Commands::Resolve { class_name } => {
            let root = resolve_root(&cli)?;
            let table = LookupTable::load_optional(resolve_map_path(&cli, &root)?.as_deref())?;
            let resolver = ClassResolver::new(table, root).extension(cli.ext.clone());
            let class_name = normalize_class_name(&class_name);

            let found = resolver.locate(&class_name);
            let output = ResolveResult {
                path: found.as_ref().map(|r| r.path.to_string_lossy().to_string()),
                origin: found.as_ref().map(|r| r.origin),
                class_name,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            if found.is_none() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Load { class_names } => {
            let options = startup_options(&cli)?;
            let mut host = match bootstrap::startup(&options) {
                Ok(host) => host,
                Err(BootstrapError::Precondition(diagnostic)) => {
                    surface(&diagnostic);
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            };

            let mut classes = Vec::with_capacity(class_names.len());
            for raw in &class_names {
                let class_name = normalize_class_name(raw);
                let loaded_by = host
                    .autoload(&class_name)
                    .with_context(|| format!("Failed to load class {class_name}"))?;
                classes.push(LoadedClass {
                    class_name,
                    loaded: loaded_by.is_some(),
                    loaded_by,
                });
            }

            let all_loaded = classes.iter().all(|c| c.loaded);
            let output = LoadResult {
                host_version: host.version.to_string(),
                hooks: host
                    .registry
                    .hook_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                classes,
                included: host.sources.included(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            if !all_loaded {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Dump { output } => {
            let root = resolve_root(&cli)?;
            let table = build_lookup_table(&root, &cli.ext, DEFAULT_NAMESPACE_DELIMITER)?;
            let json = serde_json::to_string_pretty(&table)?;
            write_output(&json, output.as_deref())?;
        }
        Commands::Check => {
            let version = resolve_host_version(&cli);
            match bootstrap::check_environment(&version, Channel::detect()) {
                Ok(v) => println!("host runtime {v} is supported"),
                Err(diagnostic) => {
                    surface(&diagnostic);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_cli() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_resolve(args))
}

/// `class-autoload App\User` is shorthand for `class-autoload resolve App\User`.
fn rewrite_args_for_implicit_resolve(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["resolve", "load", "dump", "check", "help"];
    let valued = ["--root", "--map", "--files", "--ext", "--host-version"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if valued.contains(&a) {
            idx += 2;
            continue;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "resolve".to_string());
        }
    }

    args
}

fn normalize_class_name(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("use ") {
        s = rest.trim();
    }
    if s.ends_with(';') {
        s = s.trim_end_matches(';').trim();
    }
    let s = s.trim_start_matches(DEFAULT_NAMESPACE_DELIMITER);
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn surface(diagnostic: &Diagnostic) {
    match diagnostic.channel {
        Channel::Cli => eprint!("{}", diagnostic.render()),
        Channel::Http => print!("{}", diagnostic.render()),
    }
}

fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ResolveResult {
    class_name: String,
    path: Option<String>,
    origin: Option<Origin>,
}

#[derive(Debug, Serialize)]
struct LoadedClass {
    class_name: String,
    loaded: bool,
    loaded_by: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoadResult<'a> {
    host_version: String,
    hooks: Vec<String>,
    classes: Vec<LoadedClass>,
    included: &'a [IncludedSource],
}
