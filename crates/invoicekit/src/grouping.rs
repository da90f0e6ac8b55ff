//! Group key derivation.
//!
//! Files whose parsed metadata agree on the selected keys end up in the same
//! group. The key is built from the selected values, ordered by key name:
//!
//! ```
//! use invoicekit::grouping::group_key;
//! use invoicekit::Metadata;
//!
//! let metadata: Metadata = [("npwp", "111"), ("mmyy", "1125"), ("invoice", "001")]
//!     .into_iter()
//!     .collect();
//!
//! // `invoice` is left out when no keys are selected explicitly.
//! assert_eq!(group_key(&metadata, &[] as &[&str]), "1125-111");
//! assert_eq!(group_key(&metadata, &["npwp"]), "111");
//! assert_eq!(group_key(&metadata, &["buyer"]), "General");
//! ```

use crate::metadata::Metadata;
use crate::pattern::Pattern;

/// Placeholder that identifies a single document and never groups files.
pub const IDENTIFIER_KEY: &str = "invoice";

/// Group used when no metadata key is selected.
pub const FALLBACK_GROUP: &str = "General";

/// Group for files whose names do not parse.
pub const UNCLASSIFIED_GROUP: &str = "Unclassified";

/// Separator between values in a group key.
pub const KEY_DELIMITER: &str = "-";

/// Derive the group key of `metadata`.
///
/// With an empty `keys` slice every metadata key except [`IDENTIFIER_KEY`]
/// is selected. Otherwise only metadata keys listed in `keys` are. Selected
/// values are joined with [`KEY_DELIMITER`] in key order; an empty selection
/// yields [`FALLBACK_GROUP`].
pub fn group_key<S: AsRef<str>>(metadata: &Metadata, keys: &[S]) -> String {
    // Metadata iterates in key order already.
    let values: Vec<&str> = metadata
        .iter()
        .filter(|(key, _)| {
            if keys.is_empty() {
                *key != IDENTIFIER_KEY
            } else {
                keys.iter().any(|k| k.as_ref() == *key)
            }
        })
        .map(|(_, value)| value)
        .collect();

    if values.is_empty() {
        FALLBACK_GROUP.to_string()
    } else {
        values.join(KEY_DELIMITER)
    }
}

/// Default grouping keys for `pattern`: every placeholder except
/// [`IDENTIFIER_KEY`].
pub fn default_group_keys(pattern: &Pattern) -> Vec<String> {
    pattern
        .placeholders()
        .iter()
        .filter(|name| name.as_str() != IDENTIFIER_KEY)
        .cloned()
        .collect()
}

/// Assigns filenames to groups under one pattern and key set.
#[derive(Debug, Clone)]
pub struct Grouper<'a> {
    pattern: &'a Pattern,
    keys: &'a [String],
}

impl<'a> Grouper<'a> {
    /// Create a grouper for `pattern` selecting `keys`.
    pub fn new(pattern: &'a Pattern, keys: &'a [String]) -> Self {
        Self { pattern, keys }
    }

    /// Group of `filename`, or `None` when the name does not parse.
    pub fn classify(&self, filename: &str) -> Option<String> {
        self.pattern
            .parse(filename)
            .map(|metadata| group_key(&metadata, self.keys))
    }

    /// Group of `filename`, with unparseable names sent to
    /// [`UNCLASSIFIED_GROUP`].
    pub fn assign(&self, filename: &str) -> String {
        self.classify(filename)
            .unwrap_or_else(|| UNCLASSIFIED_GROUP.to_string())
    }
}

/// Whether `key` names one of the built-in fallback groups.
pub fn is_fallback_group(key: &str) -> bool {
    key == FALLBACK_GROUP || key == UNCLASSIFIED_GROUP
}
