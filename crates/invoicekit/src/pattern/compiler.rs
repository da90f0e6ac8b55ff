//! Pattern compilation.
//!
//! Splits a raw pattern into literal and placeholder segments and builds the
//! anchored matcher used by the parser.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{InvoiceKitError, PatternError, Result};
use crate::pattern::PDF_EXTENSION;

/// One piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim.
    Literal(String),
    /// A `{name}` slot.
    Placeholder(String),
}

/// Matching behavior of a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternOptions {
    /// Match literals and placeholder values without regard to case.
    ///
    /// The `.pdf` extension is always matched case-insensitively.
    pub case_insensitive: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
        }
    }
}

/// A compiled filename pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
    placeholders: Vec<String>,
    options: PatternOptions,
    matcher: Regex,
}

impl Pattern {
    /// Compile a pattern with default options.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceKitError::PatternCompile`] if:
    /// - The pattern is empty once a trailing `.pdf` is removed
    /// - A placeholder name is used twice
    /// - The matcher cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use invoicekit::Pattern;
    ///
    /// let pattern = Pattern::compile("{mmyy}-{npwp}-{invoice}").unwrap();
    /// assert_eq!(pattern.placeholders(), ["mmyy", "npwp", "invoice"]);
    ///
    /// assert!(Pattern::compile("{a}-{a}").is_err());
    /// ```
    pub fn compile(raw: &str) -> Result<Self> {
        Self::compile_with(raw, PatternOptions::default())
    }

    /// Compile a pattern with explicit options.
    pub fn compile_with(raw: &str, options: PatternOptions) -> Result<Self> {
        let body = strip_pdf_extension(raw);
        if body.is_empty() {
            return Err(InvoiceKitError::pattern(raw, PatternError::Empty));
        }

        let segments = split_segments(body);

        let mut placeholders: Vec<String> = Vec::new();
        for segment in &segments {
            if let Segment::Placeholder(name) = segment {
                if placeholders.contains(name) {
                    return Err(InvoiceKitError::pattern(
                        raw,
                        PatternError::DuplicatePlaceholder { name: name.clone() },
                    ));
                }
                placeholders.push(name.clone());
            }
        }

        let matcher = build_matcher(&segments, options).map_err(|e| {
            InvoiceKitError::pattern(
                raw,
                PatternError::Matcher {
                    reason: e.to_string(),
                },
            )
        })?;

        Ok(Self {
            source: raw.to_string(),
            segments,
            placeholders,
            options,
            matcher,
        })
    }

    /// The pattern as supplied, extension included.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Literal and placeholder segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in left-to-right order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Whether the pattern has at least one placeholder.
    pub fn has_placeholders(&self) -> bool {
        !self.placeholders.is_empty()
    }

    /// Matching options this pattern was compiled with.
    pub fn options(&self) -> PatternOptions {
        self.options
    }

    pub(crate) fn matcher(&self) -> &Regex {
        &self.matcher
    }
}

impl FromStr for Pattern {
    type Err = InvoiceKitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Remove a trailing `.pdf` (any case) from `name`.
///
/// # Examples
///
/// ```
/// use invoicekit::pattern::strip_pdf_extension;
///
/// assert_eq!(strip_pdf_extension("a-b.PDF"), "a-b");
/// assert_eq!(strip_pdf_extension("a-b.txt"), "a-b.txt");
/// ```
pub fn strip_pdf_extension(name: &str) -> &str {
    let Some(split) = name.len().checked_sub(PDF_EXTENSION.len()) else {
        return name;
    };
    match name.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(PDF_EXTENSION) => &name[..split],
        _ => name,
    }
}

/// Split a pattern body into segments. Adjacent literal text is merged.
fn split_segments(body: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = body;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match placeholder_name(after) {
            Some(name) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name.to_string()));
                // name plus the closing brace
                rest = &after[name.len() + 1..];
            }
            None => {
                literal.push('{');
                rest = after;
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

/// Name of the placeholder starting right after an opening brace.
fn placeholder_name(s: &str) -> Option<&str> {
    let end = s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))?;
    (end > 0 && s[end..].starts_with('}')).then_some(&s[..end])
}

/// Anchored expression with escaped literals and one greedy group per
/// placeholder.
fn build_matcher(
    segments: &[Segment],
    options: PatternOptions,
) -> std::result::Result<Regex, regex::Error> {
    let mut expr = String::from("^");
    for segment in segments {
        match segment {
            Segment::Literal(text) => expr.push_str(&regex::escape(text)),
            Segment::Placeholder(_) => expr.push_str("(.+)"),
        }
    }
    expr.push('$');

    RegexBuilder::new(&expr)
        .case_insensitive(options.case_insensitive)
        .build()
}
