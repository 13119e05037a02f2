//! Recursive directory processing.
//!
//! Walks the source root, selects files by glob and runs one
//! `ReplacementJob` per matched file. Output is either mirrored under a
//! destination root or written in place; both go through a temporary
//! sibling file followed by an atomic rename, so a failed run never
//! leaves a half-written file behind. Files already inside the
//! destination root are skipped so a run cannot reprocess its own
//! previous output.

use crate::error::{Error, Result};
use crate::filter::select_chain;
use crate::replace::ReplacementJob;
use crate::resolver::{
    fill_reserved_vars, resolve_source_file_path, Overrides, RepoMetadata, ResolverConfig,
};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// One recursive run: every file under `src_root` matching `pattern` is
/// processed with the same resolver parameters and extra variables.
#[derive(Debug, Default)]
pub struct TreeJob {
    pub src_root: PathBuf,
    pub pattern: String,
    /// Mirrored output root; `None` (or equal to `src_root`) means the
    /// matched files are rewritten in place.
    pub dst_root: Option<PathBuf>,
    pub extra_vars: IndexMap<String, String>,
    pub resolver: ResolverConfig,
    pub overrides: Overrides,
    pub kicad_pcb: bool,
    pub dry: bool,
    pub verbose: bool,
}

/// Processes every file under the job's source root that matches its glob.
///
/// The repository snapshot is resolved once for the whole run; the source
/// file path and the automatic filter-chain selection are recomputed per
/// file. The run stops on the first unrecoverable error.
pub fn process_tree(job: &TreeJob) -> Result<()> {
    let glob = build_glob(&job.pattern)?;

    // Passing the source root as the destination root means in-place.
    let dst_root = match &job.dst_root {
        Some(dst) if same_path(&job.src_root, dst) => None,
        other => other.clone(),
    };
    let dst_root_abs = match &dst_root {
        Some(dst) => {
            if !job.dry {
                fs::create_dir_all(dst)?;
            }
            fs::canonicalize(dst).ok()
        }
        None => None,
    };

    // Repository state cannot change mid-run; resolve the snapshot once.
    let meta = RepoMetadata::resolve(&job.resolver, &job.overrides)?;

    info!(
        "Scanning directory '{}' for '{}'",
        job.src_root.display(),
        job.pattern
    );
    for entry in WalkDir::new(&job.src_root) {
        let entry = entry.map_err(|e| Error::WalkError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(&job.src_root)
            .map_err(|e| Error::WalkError(e.to_string()))?;
        if !glob.is_match(relative) {
            continue;
        }
        if let Some(dst_abs) = &dst_root_abs {
            if fs::canonicalize(path)?.starts_with(dst_abs) {
                debug!("Skipping '{}' inside the destination root", path.display());
                continue;
            }
        }
        process_file(job, &meta, path, relative, dst_root.as_deref())?;
    }
    Ok(())
}

/// Compiles the caller's glob. The pattern matches at any depth below the
/// source root (a plain `b.kicad_pcb` finds the file in subdirectories
/// too), while `*` stays within one path component.
fn build_glob(pattern: &str) -> Result<GlobSet> {
    let deep = if pattern.starts_with("**/") {
        pattern.to_string()
    } else {
        format!("**/{}", pattern)
    };
    let glob_err = |e: globset::Error| Error::GlobError {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    };
    let glob = GlobBuilder::new(&deep)
        .literal_separator(true)
        .build()
        .map_err(glob_err)?;
    let mut builder = GlobSetBuilder::new();
    builder.add(glob);
    builder.build().map_err(glob_err)
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Runs one `ReplacementJob` for a matched file.
fn process_file(
    job: &TreeJob,
    meta: &RepoMetadata,
    src_path: &Path,
    relative: &Path,
    dst_root: Option<&Path>,
) -> Result<()> {
    let source_file_path = resolve_source_file_path(
        job.overrides.source_file_path.as_deref(),
        &src_path.to_string_lossy(),
    );
    let chain = select_chain(job.kicad_pcb, &source_file_path)?;
    let mut vars = job.extra_vars.clone();
    fill_reserved_vars(&mut vars, meta, &source_file_path);
    let replacement = ReplacementJob::new(&vars, &chain, job.dry, job.verbose)?;
    let src = BufReader::new(File::open(src_path)?);

    if job.dry {
        info!("Would process '{}'", src_path.display());
        return replacement.run(src, io::sink());
    }

    match dst_root {
        Some(dst_root) => {
            let dst_path = dst_root.join(relative);
            if let Some(parent) = dst_path.parent() {
                fs::create_dir_all(parent)?;
            }
            info!(
                "Processing '{}' -> '{}'",
                src_path.display(),
                dst_path.display()
            );
            write_atomic(&replacement, src, &dst_path)
        }
        None => {
            info!("Processing '{}' in place", src_path.display());
            write_atomic(&replacement, src, src_path)
        }
    }
}

/// Runs the job into a temporary sibling of `dst_path`, then atomically
/// renames it over the destination. On any failure the temporary file is
/// discarded and an existing destination is left untouched.
fn write_atomic<R: BufRead>(
    replacement: &ReplacementJob,
    src: R,
    dst_path: &Path,
) -> Result<()> {
    let parent = dst_path.parent().unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        replacement.run(src, &mut writer)?;
    }
    temp.persist(dst_path).map_err(|e| Error::IoError(e.error))?;
    Ok(())
}
