//! Resolution of the reserved project variables.
//!
//! The resolver produces a read-only snapshot of the repository state
//! (`RepoMetadata`) plus the per-file `SOURCE_FILE_PATH`. Caller-supplied
//! overrides always win; a default is only computed when the corresponding
//! override is absent. The resolver never writes to the repository.

use crate::constants::{
    DATE_FORMAT, PROJECT_BUILD_DATE, PROJECT_NAME, PROJECT_REPO_URL, PROJECT_VERSION,
    PROJECT_VERSION_DATE, SOURCE_FILE_PATH, STDIO_MARKER,
};
use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use git2::{DescribeFormatOptions, DescribeOptions, Repository};
use indexmap::IndexMap;
use log::warn;
use std::path::{Path, PathBuf};

/// Explicit resolver configuration; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Path to (or inside) the local git repository
    pub repo_path: PathBuf,
    /// strftime format for the version and build dates
    pub date_format: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { repo_path: PathBuf::from("."), date_format: DATE_FORMAT.to_string() }
    }
}

/// Caller-supplied values for the reserved variables. Any value present
/// here is used outright and its default is never computed.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repo_url: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub version_date: Option<String>,
    pub build_date: Option<String>,
    pub source_file_path: Option<String>,
}

/// Snapshot of the repository-derived variables, resolved once per run.
/// `SOURCE_FILE_PATH` is per-file and intentionally not part of it.
#[derive(Debug, Clone)]
pub struct RepoMetadata {
    pub repo_url: String,
    pub project_name: String,
    pub version: String,
    pub version_date: String,
    pub build_date: String,
}

impl RepoMetadata {
    /// Resolves the repository-derived variables, consulting git only for
    /// the values the overrides do not supply.
    ///
    /// # Errors
    /// * `Error::RepoConfigError` if a needed value cannot be derived from
    ///   the repository configuration (e.g. no tracking branch)
    /// * `Error::Git2Error` for underlying repository failures
    pub fn resolve(config: &ResolverConfig, overrides: &Overrides) -> Result<Self> {
        let build_date = match &overrides.build_date {
            Some(date) => date.clone(),
            None => Local::now().format(&config.date_format).to_string(),
        };

        if let (Some(repo_url), Some(name), Some(version), Some(version_date)) = (
            &overrides.repo_url,
            &overrides.name,
            &overrides.version,
            &overrides.version_date,
        ) {
            return Ok(Self {
                repo_url: repo_url.clone(),
                project_name: name.clone(),
                version: version.clone(),
                version_date: version_date.clone(),
                build_date,
            });
        }

        let repo = Repository::discover(&config.repo_path)?;
        let repo_url = match &overrides.repo_url {
            Some(url) => url.clone(),
            None => resolve_repo_url(&repo, &config.repo_path)?,
        };
        let project_name = match &overrides.name {
            Some(name) => name.clone(),
            None => resolve_project_name(&repo, &config.repo_path)?,
        };
        let version = match &overrides.version {
            Some(version) => version.clone(),
            None => resolve_version(&repo)?,
        };
        let version_date = match &overrides.version_date {
            Some(date) => date.clone(),
            None => resolve_version_date(&repo, &config.date_format)?,
        };

        Ok(Self { repo_url, project_name, version, version_date, build_date })
    }
}

/// Fills the reserved keys into `vars`, leaving caller-supplied entries
/// untouched (two-tier merge, caller layer wins).
pub fn fill_reserved_vars(
    vars: &mut IndexMap<String, String>,
    meta: &RepoMetadata,
    source_file_path: &str,
) {
    let defaults = [
        (PROJECT_REPO_URL, meta.repo_url.as_str()),
        (PROJECT_NAME, meta.project_name.as_str()),
        (PROJECT_VERSION, meta.version.as_str()),
        (PROJECT_VERSION_DATE, meta.version_date.as_str()),
        (PROJECT_BUILD_DATE, meta.build_date.as_str()),
        (SOURCE_FILE_PATH, source_file_path),
    ];
    for (key, value) in defaults {
        if !vars.contains_key(key) {
            vars.insert(key.to_string(), value.to_string());
        }
    }
}

/// Per-file source path: the override wins, else the stream path. The
/// stdin marker is accepted but ambiguous, so it is flagged.
pub fn resolve_source_file_path(override_path: Option<&str>, stream_path: &str) -> String {
    let path = override_path.unwrap_or(stream_path).to_string();
    if path == STDIO_MARKER {
        warn!("'source_file_path' has the generic value '{}'", path);
    }
    path
}

/// Rewrites an SSH-style remote (`user@host:group/name.git`) into
/// `https://host/group/name`. Best-effort; only guaranteed correct for
/// the common SSH shorthand form.
pub fn remote_to_https_url(url: &str) -> String {
    let without_user = match url.split_once('@') {
        Some((_, rest)) => rest,
        None => url,
    };
    let public_url = match without_user.split_once(':') {
        Some((host, path)) => format!("https://{}/{}", host, path),
        None => format!("https://{}", without_user),
    };
    match public_url.strip_suffix(".git") {
        Some(stripped) => stripped.to_string(),
        None => public_url,
    }
}

fn repo_config_err(repo_path: &Path, detail: impl Into<String>) -> Error {
    Error::RepoConfigError {
        repo_path: repo_path.display().to_string(),
        detail: detail.into(),
    }
}

/// The first URL of the remote behind the current branch's tracking
/// branch, rewritten to https form when necessary.
fn resolve_repo_url(repo: &Repository, repo_path: &Path) -> Result<String> {
    let head = repo.head()?;
    let branch_ref = head
        .name()
        .ok_or_else(|| repo_config_err(repo_path, "HEAD is not a named branch"))?;
    let remote_name_buf = repo
        .branch_upstream_remote(branch_ref)
        .map_err(|_| repo_config_err(repo_path, "current branch has no tracking branch"))?;
    let remote_name = remote_name_buf
        .as_str()
        .ok_or_else(|| repo_config_err(repo_path, "remote name is not valid UTF-8"))?;
    let remote = repo.find_remote(remote_name)?;
    let url = remote.url().ok_or_else(|| {
        repo_config_err(repo_path, format!("remote '{}' has no URL", remote_name))
    })?;
    if url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Ok(remote_to_https_url(url))
    }
}

/// The final path component of the repository's absolute root path.
fn resolve_project_name(repo: &Repository, repo_path: &Path) -> Result<String> {
    let root = repo.workdir().unwrap_or_else(|| repo.path());
    let root = root.canonicalize()?;
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| repo_config_err(repo_path, "repository root has no name"))
}

/// "git describe": nearest tag, dirty suffix, abbreviated commit id as the
/// fallback when no tag exists at all.
fn resolve_version(repo: &Repository) -> Result<String> {
    let mut opts = DescribeOptions::new();
    opts.describe_tags().show_commit_oid_as_fallback(true);
    let describe = repo.describe(&opts)?;
    let mut format = DescribeFormatOptions::new();
    format.dirty_suffix("-dirty");
    Ok(describe.format(Some(&format))?)
}

/// The commit date of the current head, formatted with `date_format`.
/// Converted to local time so it uses the same clock as the build date.
fn resolve_version_date(repo: &Repository, date_format: &str) -> Result<String> {
    let commit = repo.head()?.peel_to_commit()?;
    let date = DateTime::from_timestamp(commit.time().seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&Local);
    Ok(date.format(date_format).to_string())
}
