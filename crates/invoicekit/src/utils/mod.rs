//! Utilities for output naming, sizes and timestamps.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::OverwriteMode;
use crate::error::{InvoiceKitError, Result};

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}

/// Milliseconds since the Unix epoch, used to stamp generated output names.
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `<prefix>_<unix millis>.<extension>`.
pub fn timestamped_name(prefix: &str, extension: &str) -> String {
    format!("{prefix}_{}.{extension}", unix_millis())
}

/// Insert ` (N)` before the extension of `name`.
///
/// ```
/// use invoicekit::utils::numbered_name;
///
/// assert_eq!(numbered_name("1125-111.pdf", 2), "1125-111 (2).pdf");
/// assert_eq!(numbered_name("README", 1), "README (1)");
/// ```
pub fn numbered_name(name: &str, counter: usize) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({counter}){}", &name[..dot], &name[dot..]),
        _ => format!("{name} ({counter})"),
    }
}

/// Tracks names already handed out and renames collisions.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `name`, or the first free `name (N)` if it is taken.
    ///
    /// Comparison ignores ASCII case, since archive entries end up on
    /// case-insensitive filesystems.
    pub fn claim(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut counter = 1;
        while !self.taken.insert(candidate.to_ascii_lowercase()) {
            candidate = numbered_name(name, counter);
            counter += 1;
        }
        candidate
    }
}

/// Decide where an output file is written.
///
/// - `Force` overwrites an existing file.
/// - `NoClobber` refuses to overwrite.
/// - `Uniquify` picks the first free `name (N).ext`, like a browser does
///   for downloads.
pub fn resolve_output_path(path: &Path, mode: OverwriteMode) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    match mode {
        OverwriteMode::Force => Ok(path.to_path_buf()),
        OverwriteMode::NoClobber => Err(InvoiceKitError::invalid_config(format!(
            "Output file already exists: {}",
            path.display()
        ))),
        OverwriteMode::Uniquify => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    InvoiceKitError::invalid_config(format!(
                        "Output path has no file name: {}",
                        path.display()
                    ))
                })?;

            (1..)
                .map(|counter| path.with_file_name(numbered_name(&name, counter)))
                .find(|candidate| !candidate.exists())
                .ok_or_else(|| InvoiceKitError::other("No free output name"))
        }
    }
}
