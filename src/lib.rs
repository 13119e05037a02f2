//! kistamp stamps project metadata into KiCad PCB templates.
//! It replaces `${KEY}` placeholders with values derived from a local
//! git repository, caller-supplied overrides and computed defaults,
//! while keeping KiCad's quoting rules intact across the substitution.

/// Command-line interface module for the kistamp application
pub mod cli;

/// Shared constants: reserved variable names, default date format,
/// stream markers
pub mod constants;

/// Error types and handling for the kistamp application
pub mod error;

/// Structural quoting filters (quote/unquote around `(gr_text ...)`)
/// applied before and after substitution
pub mod filter;

/// Logging setup
pub mod logger;

/// Line-oriented `${KEY}` substitution engine
pub mod replace;

/// Resolution of the reserved project variables from git state
pub mod resolver;

/// Recursive directory processing with atomic in-place rewrites
pub mod walker;
