//! Grouped PDF merging.
//!
//! [`Merger`] assigns input files to groups by parsing their names, merges
//! each group's pages in name order and returns either one PDF or a zip with
//! one PDF per group. [`MergeSession`] wraps a merger in the collect, merge
//! and collect-output cycle a front end drives.

pub mod orchestrator;
pub mod session;
pub mod summary;

use std::path::Path;

pub use orchestrator::{DEFAULT_OUTPUT_PREFIX, MergePlan, Merger, PlannedGroup};
pub use session::{MergeSession, MergeState};
pub use summary::{
    GroupOutcome, GroupReport, MergeOutput, MergeResult, MergeStatistics, MergeSummary, OutputMode,
};

use crate::error::{InvoiceKitError, Result};

/// A PDF payload with the name it is grouped and sorted by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Display name, usually the original filename.
    pub name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl InputFile {
    /// Create an input from a name and bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an input from disk. The display name is the file name.
    pub async fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InvoiceKitError::file_not_found(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = tokio::fs::read(path).await?;

        Ok(Self { name, bytes })
    }
}
