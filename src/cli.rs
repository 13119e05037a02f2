//! Command-line interface implementation for kistamp.
//! Provides argument parsing using clap; every option can also be
//! supplied through a correspondingly named environment variable.

use crate::constants::DATE_FORMAT;
use crate::resolver::{Overrides, ResolverConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parses a literal KEY=VALUE replacement pair.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value))
            if !key.is_empty()
                && key.chars().all(|c| c == '-' || c == '_' || c.is_ascii_alphanumeric()) =>
        {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(format!(
            "expected KEY=VALUE with KEY matching [-_0-9a-zA-Z]+, got '{}'",
            s
        )),
    }
}

/// Command-line arguments structure for kistamp.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kistamp: stamps git project metadata into KiCad PCB templates",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace `${KEY}` variables in a single file or stream.
    /// Use `$${KEY}` for variables you do not want expanded.
    Single(SingleArgs),

    /// Replace `${KEY}` variables in every file matching a glob
    /// under a directory, recursively
    Recursive(RecursiveArgs),
}

#[derive(Args, Debug)]
pub struct SingleArgs {
    /// Source file, or '-' for stdin
    #[arg(value_name = "SRC", default_value = "-")]
    pub src: String,

    /// Destination file, or '-' for stdout
    #[arg(value_name = "DST", default_value = "-")]
    pub dst: String,

    /// Additional KEY=VALUE replacement pairs
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub replacements: Vec<(String, String)>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct RecursiveArgs {
    /// Directory to scan for matching files
    #[arg(value_name = "SRC_ROOT")]
    pub src_root: PathBuf,

    /// Glob pattern selecting the files to process, e.g. '*.kicad_pcb'
    #[arg(value_name = "GLOB")]
    pub glob: String,

    /// Directory the transformed tree is written to; passing SRC_ROOT
    /// itself selects in-place processing
    #[arg(value_name = "DST_ROOT")]
    pub dst_root: PathBuf,

    /// Additional KEY=VALUE replacement pairs
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub replacements: Vec<(String, String)>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by both subcommands.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// The path to the source file, relative to the repo root
    #[arg(short = 'p', long, env = "PROJECT_SRC_FILE_PATH")]
    pub src_file_path: Option<String>,

    /// The path to the local git repo
    #[arg(short = 'r', long, env = "PROJECT_REPO_PATH", default_value = ".")]
    pub repo_path: PathBuf,

    /// Public project repo URL
    #[arg(short = 'u', long, env = "PROJECT_REPO_URL")]
    pub repo_url: Option<String>,

    /// Project name (preferably without spaces)
    #[arg(short = 'n', long, env = "PROJECT_NAME")]
    pub name: Option<String>,

    /// Project version (preferably without spaces)
    #[arg(long, env = "PROJECT_VERSION")]
    pub vers: Option<String>,

    /// Date at which this version of the project was committed/released
    #[arg(short = 'd', long, env = "PROJECT_VERSION_DATE")]
    pub version_date: Option<String>,

    /// Date at which the currently being-made build of the project is
    /// made. This should basically always be left on the default, which
    /// is the current date.
    #[arg(long, env = "PROJECT_BUILD_DATE")]
    pub build_date: Option<String>,

    /// The format for the version and the build dates (strftime tokens)
    #[arg(long, default_value = DATE_FORMAT)]
    pub date_format: String,

    /// Whether the filtered file is a *.kicad_pcb
    #[arg(long)]
    pub kicad_pcb: bool,

    /// Whether to skip the actual replacing
    #[arg(long)]
    pub dry: bool,

    /// Whether to output additional info to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            repo_path: self.repo_path.clone(),
            date_format: self.date_format.clone(),
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            repo_url: self.repo_url.clone(),
            name: self.name.clone(),
            version: self.vers.clone(),
            version_date: self.version_date.clone(),
            build_date: self.build_date.clone(),
            source_file_path: self.src_file_path.clone(),
        }
    }
}

/// Parses command line arguments and returns the Cli structure.
pub fn get_args() -> Cli {
    Cli::parse()
}
