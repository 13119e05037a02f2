//! Line-oriented `${KEY}` substitution.
//!
//! Substitution never spans a line boundary. Each line runs through the
//! configured pre-filter, a single left-to-right token scan, and the
//! post-filter, before being written to the destination stream. Original
//! line terminators (`\n` or `\r\n`) are preserved.

use crate::error::Result;
use crate::filter::FilterChain;
use indexmap::IndexMap;
use log::{debug, warn};
use regex::{Captures, Regex};
use std::io::{BufRead, Write};

/// Token grammar: `$${KEY}` is a literal escape, `${KEY}` a live
/// reference. The escape alternative comes first so a doubled dollar is
/// never parsed as a live token.
const TOKEN_PATTERN: &str = r"\$\$\{(?P<esc>[-_0-9a-zA-Z]+)\}|\$\{(?P<key>[-_0-9a-zA-Z]+)\}";

/// One unit of substitution work: a variable map, a filter chain and the
/// dry/verbose switches, applied to a source/destination stream pair.
pub struct ReplacementJob<'a> {
    vars: &'a IndexMap<String, String>,
    chain: &'a FilterChain,
    dry: bool,
    verbose: bool,
    token: Regex,
}

impl<'a> ReplacementJob<'a> {
    pub fn new(
        vars: &'a IndexMap<String, String>,
        chain: &'a FilterChain,
        dry: bool,
        verbose: bool,
    ) -> Result<Self> {
        Ok(Self { vars, chain, dry, verbose, token: Regex::new(TOKEN_PATTERN)? })
    }

    /// Consumes the whole source stream and writes the substituted lines
    /// to the destination. With `dry` set the source is still fully read
    /// and every transform computed, but nothing is written.
    ///
    /// # Errors
    /// * `Error::IoError` if the source cannot be read (including
    ///   non-UTF-8 content) or the destination cannot be written
    pub fn run<R: BufRead, W: Write>(&self, mut src: R, mut dst: W) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if src.read_line(&mut line)? == 0 {
                break;
            }
            let (body, eol) = split_line_ending(&line);
            let replaced = self.substitute(body);
            if !self.dry {
                dst.write_all(replaced.as_bytes())?;
                dst.write_all(eol.as_bytes())?;
            }
        }
        dst.flush()?;
        Ok(())
    }

    /// Applies the filter chain and token substitution to one line.
    ///
    /// An escape form `$${KEY}` loses one layer of escaping and is never
    /// looked up. A live `${KEY}` whose key is not in the variable map is
    /// left verbatim and logged as a warning.
    pub fn substitute(&self, line: &str) -> String {
        let line = match &self.chain.pre {
            Some(filter) => filter.apply(line),
            None => line.to_string(),
        };
        let line = self
            .token
            .replace_all(&line, |caps: &Captures| {
                if let Some(esc) = caps.name("esc") {
                    format!("${{{}}}", esc.as_str())
                } else {
                    let key = &caps["key"];
                    match self.vars.get(key) {
                        Some(value) => {
                            if self.verbose {
                                debug!("Replacing '{}' with '{}'", &caps[0], value);
                            }
                            value.clone()
                        }
                        None => {
                            warn!(
                                "Variable '{}' is not defined; leaving '{}' unchanged",
                                key, &caps[0]
                            );
                            caps[0].to_string()
                        }
                    }
                }
            })
            .into_owned();
        match &self.chain.post {
            Some(filter) => filter.apply(&line),
            None => line,
        }
    }
}

/// Splits a line as returned by `read_line` into its body and terminator.
fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}
