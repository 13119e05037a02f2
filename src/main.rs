//! kistamp's main application entry point and orchestration logic.
//! Handles command-line argument parsing and coordinates the resolver,
//! filter chain, substitution engine and directory walker.

use indexmap::IndexMap;
use kistamp::{
    cli::{get_args, Cli, Command, RecursiveArgs, SingleArgs},
    constants::STDIO_MARKER,
    error::{default_error_handler, Result},
    filter::select_chain,
    logger::init_logger,
    replace::ReplacementJob,
    resolver::{fill_reserved_vars, resolve_source_file_path, RepoMetadata},
    walker::{process_tree, TreeJob},
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

/// Main application entry point.
fn main() {
    let cli = get_args();

    let verbose = match &cli.command {
        Command::Single(args) => args.common.verbose,
        Command::Recursive(args) => args.common.verbose,
    };
    init_logger(verbose);

    if let Err(err) = run(cli) {
        default_error_handler(err);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Single(args) => run_single(args),
        Command::Recursive(args) => run_recursive(args),
    }
}

/// Single-stream operation: one source, one destination.
///
/// # Flow
/// 1. Resolves the repository snapshot
/// 2. Selects the filter chain (forced or by file suffix)
/// 3. Merges caller replacements over the resolved defaults
/// 4. Streams source to destination through the substitution engine
fn run_single(args: SingleArgs) -> Result<()> {
    let SingleArgs { src, dst, replacements, common } = args;

    let meta = RepoMetadata::resolve(&common.resolver_config(), &common.overrides())?;
    let source_file_path = resolve_source_file_path(common.src_file_path.as_deref(), &src);
    let chain = select_chain(common.kicad_pcb, &source_file_path)?;

    let mut vars: IndexMap<String, String> = replacements.into_iter().collect();
    fill_reserved_vars(&mut vars, &meta, &source_file_path);

    let job = ReplacementJob::new(&vars, &chain, common.dry, common.verbose)?;

    let src_stream: Box<dyn BufRead> = if src == STDIO_MARKER {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(&src)?))
    };
    // A dry run must not even truncate an existing destination file.
    let dst_stream: Box<dyn Write> = if common.dry {
        Box::new(io::sink())
    } else if dst == STDIO_MARKER {
        Box::new(io::stdout())
    } else {
        Box::new(File::create(&dst)?)
    };

    job.run(src_stream, dst_stream)
}

/// Recursive operation over a directory tree.
fn run_recursive(args: RecursiveArgs) -> Result<()> {
    let RecursiveArgs { src_root, glob, dst_root, replacements, common } = args;

    let job = TreeJob {
        src_root,
        pattern: glob,
        dst_root: Some(dst_root),
        extra_vars: replacements.into_iter().collect(),
        resolver: common.resolver_config(),
        overrides: common.overrides(),
        kicad_pcb: common.kicad_pcb,
        dry: common.dry,
        verbose: common.verbose,
    };
    process_tree(&job)
}
