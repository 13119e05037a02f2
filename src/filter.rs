//! Structural quoting filters for whitespace-sensitive formats.
//!
//! KiCad board files only allow a bare (unquoted) `gr_text` value when it
//! contains no whitespace, and forbid a bare `$`/`{`/`}` outside quotes.
//! The pre-filter therefore quotes any unquoted run that still contains a
//! `${KEY}` reference before substitution, and the post-filter drops the
//! quotes again afterwards when the expanded value turned out not to need
//! them. A filter is a data value (pattern plus replacement template), so
//! chains for other formats can be added without new code paths.

use crate::constants::KICAD_PCB_SUFFIX;
use crate::error::Result;
use log::{debug, warn};
use regex::Regex;

/// A single structural rewrite: a pattern with the named capture groups
/// `pre`, `text` and `post`, and a replacement template referencing them.
#[derive(Debug)]
pub struct TextFilter {
    pattern: Regex,
    replacement: String,
}

impl TextFilter {
    /// Compiles a filter from a pattern and a replacement template.
    ///
    /// # Errors
    /// * `Error::RegexError` if the pattern does not compile
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self { pattern: Regex::new(pattern)?, replacement: replacement.to_string() })
    }

    /// Applies the rewrite to a single line. A line with zero matches is
    /// returned unchanged; that is a normal pass-through, not an error.
    pub fn apply(&self, line: &str) -> String {
        self.pattern.replace_all(line, self.replacement.as_str()).into_owned()
    }
}

/// An ordered pre/post pair of filters, either possibly absent.
/// The standard pipeline is pre-filter, substitution, post-filter.
#[derive(Debug, Default)]
pub struct FilterChain {
    pub pre: Option<TextFilter>,
    pub post: Option<TextFilter>,
}

impl FilterChain {
    /// The identity chain: lines pass through substitution untouched.
    pub fn none() -> Self {
        Self::default()
    }

    /// The KiCad PCB chain.
    ///
    /// * pre ("quote"): wraps an unquoted non-whitespace run following
    ///   `(gr_text ` in double quotes when it contains a `${KEY}`-shaped
    ///   reference.
    /// * post ("unquote"): removes the quotes around a quoted run following
    ///   `(gr_text ` when the content has no whitespace and no escaped
    ///   quote. Applying it to its own output is a no-op.
    pub fn kicad() -> Result<Self> {
        let pre = TextFilter::new(
            r#"(?P<pre>\(gr_text\s+)(?P<text>[^"\s]*\$\{[-_0-9a-zA-Z]*\}[^\s"]*)(?P<post>\s+[)(])"#,
            r#"${pre}"${text}"${post}"#,
        )?;
        let post = TextFilter::new(
            r#"(?P<pre>\(gr_text\s+)"(?P<text>[^"\s\\]+)"(?P<post>\s+[)(])"#,
            r"${pre}${text}${post}",
        )?;
        Ok(Self { pre: Some(pre), post: Some(post) })
    }
}

/// Selects the filter chain for one source file.
///
/// The KiCad chain is used when the caller forced it, or automatically when
/// the source path carries the `.kicad_pcb` suffix. Automatic selection
/// changes output structure, so it is logged as a warning.
pub fn select_chain(kicad_pcb: bool, source_file_path: &str) -> Result<FilterChain> {
    if kicad_pcb {
        debug!("KiCad PCB filters will be applied");
        return FilterChain::kicad();
    }
    if source_file_path.ends_with(KICAD_PCB_SUFFIX) {
        warn!(
            "Automatically enabling the KiCad PCB filters due to the '{}' suffix of '{}'",
            KICAD_PCB_SUFFIX, source_file_path
        );
        return FilterChain::kicad();
    }
    Ok(FilterChain::none())
}
