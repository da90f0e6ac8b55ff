//! Filename parsing.
//!
//! Names produced by browsers may carry a de-duplication counter such as
//! ` (2)` and the `.pdf` extension. Both are optional and peeled off before
//! the body is matched, so the last placeholder does not absorb them. When
//! the body without the counter does not match, the counter is matched as
//! part of the name.
//!
//! Placeholder captures are greedy. With back-to-back placeholders, or
//! separators that also occur inside values, each placeholder takes as much
//! as it can while still letting the placeholders and literals to its right
//! match:
//!
//! ```
//! use invoicekit::Pattern;
//!
//! let pattern = Pattern::compile("{a}{b}").unwrap();
//! let metadata = pattern.parse("abc").unwrap();
//! assert_eq!(metadata.get("a"), Some("ab"));
//! assert_eq!(metadata.get("b"), Some("c"));
//! ```

use crate::metadata::Metadata;
use crate::pattern::{Pattern, strip_pdf_extension};

impl Pattern {
    /// Recover metadata from `filename`.
    ///
    /// Returns `None` when the name cannot be decomposed under this pattern.
    /// No partial results are returned.
    pub fn parse(&self, filename: &str) -> Option<Metadata> {
        let captures = candidate_bodies(filename)
            .into_iter()
            .find_map(|body| self.matcher().captures(body))?;

        self.placeholders()
            .iter()
            .enumerate()
            .map(|(index, key)| {
                captures
                    .get(index + 1)
                    .map(|value| (key.clone(), value.as_str().to_string()))
            })
            .collect()
    }

    /// Whether `filename` can be parsed under this pattern.
    pub fn matches(&self, filename: &str) -> bool {
        candidate_bodies(filename)
            .into_iter()
            .any(|body| self.matcher().is_match(body))
    }
}

/// Bodies to try, in order: without the `.pdf` extension and a trailing
/// ` (N)` counter, then without the extension only.
///
/// A pattern ending in a parenthesised placeholder generates names like
/// `111 (001).pdf`, whose tail looks like a counter.
fn candidate_bodies(filename: &str) -> Vec<&str> {
    let stem = strip_pdf_extension(filename);
    let body = strip_duplicate_counter(stem);
    if body.len() == stem.len() {
        vec![stem]
    } else {
        vec![body, stem]
    }
}

fn strip_duplicate_counter(stem: &str) -> &str {
    let Some(inner) = stem.strip_suffix(')') else {
        return stem;
    };
    let Some(open) = inner.rfind('(') else {
        return stem;
    };

    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return stem;
    }

    let head = &inner[..open];
    match head.chars().next_back() {
        Some(space) if space.is_whitespace() => &head[..head.len() - space.len_utf8()],
        _ => stem,
    }
}
