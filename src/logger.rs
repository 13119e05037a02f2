//! Logging setup. All diagnostics go to stderr; the destination stream
//! only ever receives substituted output.

use env_logger::Env;

/// Initializes the global logger. `verbose` lowers the default filter
/// to debug; an explicit `RUST_LOG` still takes precedence.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .init();
}
