//! Error handling for the kistamp application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for kistamp operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors reported by the underlying git repository
    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),

    /// The repository is not configured in a way the resolver can use,
    /// e.g. the current branch has no tracking branch. Not recoverable
    /// locally.
    #[error("Repository configuration error in '{repo_path}': {detail}.")]
    RepoConfigError { repo_path: String, detail: String },

    /// Represents an invalid filter or token pattern
    #[error("Pattern error: {0}.")]
    RegexError(#[from] regex::Error),

    /// Represents an invalid glob pattern supplied by the caller
    #[error("Invalid glob pattern '{pattern}': {detail}.")]
    GlobError { pattern: String, detail: String },

    /// Represents errors during directory traversal
    #[error("Walk error: {0}.")]
    WalkError(String),
}

/// Convenience type alias for Results with kistamp's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
