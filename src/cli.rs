use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-autoload")]
#[command(about = "Resolve namespaced class identifiers to source files and load them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub files: Option<PathBuf>,

    #[arg(long, value_name = "EXT", default_value = "php")]
    pub ext: String,

    #[arg(long, value_name = "VER")]
    pub host_version: Option<String>,

    #[arg(long)]
    pub append: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Resolve {
        class_name: String,
    },
    Load {
        #[arg(required = true)]
        class_names: Vec<String>,
    },
    Dump {
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    Check,
}
