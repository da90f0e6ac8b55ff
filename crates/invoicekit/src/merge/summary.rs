//! Merge results and reporting.

use std::time::Duration;

use serde::Serialize;

use crate::error::GroupFailure;
use crate::io::{Archive, NamedDocument};
use crate::utils::format_file_size;

/// Whether a run produces one document or an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// At most one real group: everything merges into one document.
    Single,
    /// Two or more real groups: one document per group, zipped.
    Multi,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub enum MergeOutput {
    /// One merged PDF.
    Single(NamedDocument),
    /// A zip with one merged PDF per group.
    Archive(Archive),
}

impl MergeOutput {
    /// Filename of the artifact.
    pub fn name(&self) -> &str {
        match self {
            Self::Single(document) => &document.name,
            Self::Archive(archive) => &archive.name,
        }
    }

    /// Encoded artifact bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Single(document) => &document.bytes,
            Self::Archive(archive) => &archive.bytes,
        }
    }

    /// Consume the output, returning `(name, bytes)`.
    pub fn into_parts(self) -> (String, Vec<u8>) {
        match self {
            Self::Single(document) => (document.name, document.bytes),
            Self::Archive(archive) => (archive.name, archive.bytes),
        }
    }
}

/// How one group ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GroupOutcome {
    /// The group was merged.
    Merged {
        /// Name of the merged document.
        output_name: String,
        /// Pages in the merged document.
        page_count: usize,
    },
    /// The group was skipped.
    Failed {
        /// Why the group failed.
        reason: String,
    },
}

/// Report for one group of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// Group key.
    pub key: String,
    /// Member display names, in merge order.
    pub files: Vec<String>,
    /// Result of merging the group.
    pub outcome: GroupOutcome,
}

impl GroupReport {
    /// Whether the group was merged.
    pub fn is_merged(&self) -> bool {
        matches!(self.outcome, GroupOutcome::Merged { .. })
    }
}

/// Per-group account of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Mode the run operated in.
    pub mode: OutputMode,
    /// One report per group, in processing order.
    pub groups: Vec<GroupReport>,
}

impl MergeSummary {
    /// Groups that were merged.
    pub fn groups_merged(&self) -> usize {
        self.groups.iter().filter(|g| g.is_merged()).count()
    }

    /// Groups that failed.
    pub fn groups_failed(&self) -> usize {
        self.groups.len() - self.groups_merged()
    }

    /// Files that ended up in an output document.
    pub fn files_merged(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.is_merged())
            .map(|g| g.files.len())
            .sum()
    }

    /// Files left out because their group failed.
    pub fn files_skipped(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| !g.is_merged())
            .map(|g| g.files.len())
            .sum()
    }

    /// Failed groups with their reasons.
    pub fn failures(&self) -> Vec<GroupFailure> {
        self.groups
            .iter()
            .filter_map(|g| match &g.outcome {
                GroupOutcome::Failed { reason } => Some(GroupFailure {
                    group: g.key.clone(),
                    reason: reason.clone(),
                }),
                GroupOutcome::Merged { .. } => None,
            })
            .collect()
    }

    /// Names of the merged documents.
    pub fn output_names(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter_map(|g| match &g.outcome {
                GroupOutcome::Merged { output_name, .. } => Some(output_name.as_str()),
                GroupOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

/// Statistics about a merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeStatistics {
    /// Number of PDFs merged into an output.
    pub files_merged: usize,

    /// Number of PDFs dropped with a failed group.
    pub files_skipped: usize,

    /// Number of groups merged.
    pub groups_merged: usize,

    /// Number of groups that failed.
    pub groups_failed: usize,

    /// Total pages across the output documents.
    pub total_pages: usize,

    /// Total size of the input payloads.
    pub input_size: u64,

    /// Size of the produced artifact.
    pub output_size: u64,

    /// Wall time of the run.
    pub merge_time: Duration,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of a merge run.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The produced artifact.
    pub output: MergeOutput,
    /// Per-group report.
    pub summary: MergeSummary,
    /// Statistics about the run.
    pub statistics: MergeStatistics,
}
