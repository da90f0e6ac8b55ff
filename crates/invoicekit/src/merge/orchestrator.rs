//! Grouped merge orchestration.
//!
//! A run goes through three stages:
//!
//! 1. **Plan**: parse every name, derive its group, decide the output mode
//! 2. **Merge**: merge each group sequentially, isolating group failures
//! 3. **Package**: name the single document or zip the per-group documents

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::task;

use crate::cancel::CancellationToken;
use crate::config::NamingConfig;
use crate::error::{InvoiceKitError, Result};
use crate::grouping::{Grouper, UNCLASSIFIED_GROUP, is_fallback_group};
use crate::io::{Archive, DocumentCodec, LopdfCodec, NamedDocument};
use crate::merge::InputFile;
use crate::merge::summary::{
    GroupOutcome, GroupReport, MergeOutput, MergeResult, MergeStatistics, MergeSummary, OutputMode,
};
use crate::pattern::{PDF_EXTENSION, Pattern};
use crate::utils::timestamped_name;

/// Default prefix for timestamped output names.
pub const DEFAULT_OUTPUT_PREFIX: &str = "CoreTax_Merged";

/// One group scheduled for merging.
#[derive(Debug)]
pub struct PlannedGroup {
    /// Group key.
    pub key: String,
    /// Name of the document this group produces.
    pub output_name: String,
    /// Members sorted by display name.
    pub files: Vec<InputFile>,
}

/// Outcome of the planning stage.
#[derive(Debug)]
pub struct MergePlan {
    /// Output mode of the run.
    pub mode: OutputMode,
    /// Groups in processing order, [`UNCLASSIFIED_GROUP`] last.
    pub groups: Vec<PlannedGroup>,
}

impl MergePlan {
    /// Total number of files in the plan.
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }
}

/// Merges input files group by group.
#[derive(Debug, Clone)]
pub struct Merger<C = LopdfCodec> {
    pattern: Pattern,
    group_keys: Vec<String>,
    output_prefix: String,
    codec: C,
}

impl Merger<LopdfCodec> {
    /// Create a merger grouping by every placeholder except `invoice`.
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            group_keys: Vec::new(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            codec: LopdfCodec::new(),
        }
    }

    /// Create a merger from a naming configuration.
    pub fn from_config(config: &NamingConfig) -> Result<Self> {
        Ok(Self::new(config.compile()?)
            .with_group_keys(config.group_keys.clone())
            .with_output_prefix(config.output_prefix.clone()))
    }
}

impl<C: DocumentCodec> Merger<C> {
    /// Group by `keys` instead. An empty list restores the default.
    pub fn with_group_keys(mut self, keys: Vec<String>) -> Self {
        self.group_keys = keys;
        self
    }

    /// Prefix for timestamped output names.
    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    /// Use a different document codec.
    pub fn with_codec<D: DocumentCodec>(self, codec: D) -> Merger<D> {
        Merger {
            pattern: self.pattern,
            group_keys: self.group_keys,
            output_prefix: self.output_prefix,
            codec,
        }
    }

    /// The active pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Assign every file to a group and decide the output mode.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceKitError::NoFilesToMerge`] if `files` is empty.
    pub fn plan(&self, files: Vec<InputFile>) -> Result<MergePlan> {
        if files.is_empty() {
            return Err(InvoiceKitError::NoFilesToMerge);
        }

        let grouper = Grouper::new(&self.pattern, &self.group_keys);
        let mut buckets: BTreeMap<String, Vec<InputFile>> = BTreeMap::new();
        for file in files {
            let key = grouper.assign(&file.name);
            debug!("{} -> group {}", file.name, key);
            buckets.entry(key).or_default().push(file);
        }

        let real_groups = buckets
            .keys()
            .filter(|key| key.as_str() != UNCLASSIFIED_GROUP)
            .count();

        if real_groups <= 1 {
            let key = buckets
                .keys()
                .find(|key| key.as_str() != UNCLASSIFIED_GROUP)
                .cloned()
                .unwrap_or_else(|| UNCLASSIFIED_GROUP.to_string());
            let output_name = if is_fallback_group(&key) {
                timestamped_name(&self.output_prefix, "pdf")
            } else {
                document_name(&key)
            };

            let mut files: Vec<InputFile> = buckets.into_values().flatten().collect();
            sort_by_name(&mut files);

            return Ok(MergePlan {
                mode: OutputMode::Single,
                groups: vec![PlannedGroup {
                    key,
                    output_name,
                    files,
                }],
            });
        }

        let unclassified = buckets.remove(UNCLASSIFIED_GROUP);
        let groups = buckets
            .into_iter()
            .chain(unclassified.map(|files| (UNCLASSIFIED_GROUP.to_string(), files)))
            .map(|(key, mut files)| {
                sort_by_name(&mut files);
                PlannedGroup {
                    output_name: document_name(&key),
                    key,
                    files,
                }
            })
            .collect();

        Ok(MergePlan {
            mode: OutputMode::Multi,
            groups,
        })
    }

    /// Plan and merge `files`.
    ///
    /// Groups are merged one at a time; the token is checked before each
    /// group. In multi-output mode a failing group is reported in the summary
    /// and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `files` is empty
    /// - The token is cancelled (partial output is discarded)
    /// - The single group of a single-output run fails
    /// - Every group of a multi-output run fails
    /// - The archive cannot be written
    pub async fn merge(
        &self,
        files: Vec<InputFile>,
        cancel: &CancellationToken,
    ) -> Result<MergeResult> {
        let start = Instant::now();
        let input_size: u64 = files.iter().map(|f| f.bytes.len() as u64).sum();

        let plan = self.plan(files)?;
        info!(
            "Merging {} file(s) in {} group(s) ({:?} output)",
            plan.file_count(),
            plan.groups.len(),
            plan.mode
        );

        let mode = plan.mode;
        let mut documents = Vec::new();
        let mut reports = Vec::with_capacity(plan.groups.len());

        for group in plan.groups {
            cancel.check()?;

            let PlannedGroup {
                key,
                output_name,
                files,
            } = group;
            let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();

            let codec = self.codec.clone();
            let merged = match task::spawn_blocking(move || merge_group(&codec, files)).await {
                Ok(merged) => merged,
                // A panicking codec fails its group only.
                Err(e) if e.is_panic() => Err(InvoiceKitError::merge_failed(format!(
                    "group {key} panicked while merging"
                ))),
                Err(e) => return Err(InvoiceKitError::other(format!("Merge task failed: {e}"))),
            };

            match merged {
                Ok((bytes, page_count)) => {
                    debug!("Merged group {key}: {page_count} page(s)");
                    reports.push(GroupReport {
                        key,
                        files: names,
                        outcome: GroupOutcome::Merged {
                            output_name: output_name.clone(),
                            page_count,
                        },
                    });
                    documents.push(NamedDocument {
                        name: output_name,
                        bytes,
                        page_count,
                    });
                }
                Err(e) if mode == OutputMode::Multi && e.is_recoverable() => {
                    warn!("Skipping group {key}: {e}");
                    reports.push(GroupReport {
                        key,
                        files: names,
                        outcome: GroupOutcome::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let summary = MergeSummary {
            mode,
            groups: reports,
        };

        if documents.is_empty() {
            return Err(InvoiceKitError::AllGroupsFailed {
                failures: summary.failures(),
            });
        }

        let total_pages = documents.iter().map(|d| d.page_count).sum();
        let output = match mode {
            OutputMode::Single => {
                let document = documents.remove(0);
                MergeOutput::Single(document)
            }
            OutputMode::Multi => {
                let name = timestamped_name(&self.output_prefix, "zip");
                MergeOutput::Archive(Archive::package(name, documents)?)
            }
        };

        let statistics = MergeStatistics {
            files_merged: summary.files_merged(),
            files_skipped: summary.files_skipped(),
            groups_merged: summary.groups_merged(),
            groups_failed: summary.groups_failed(),
            total_pages,
            input_size,
            output_size: output.bytes().len() as u64,
            merge_time: start.elapsed(),
        };

        Ok(MergeResult {
            output,
            summary,
            statistics,
        })
    }
}

/// Merge one group's files in order, returning the encoded document and its
/// page count. Each source is dropped once its pages are copied.
fn merge_group<C: DocumentCodec>(codec: &C, files: Vec<InputFile>) -> Result<(Vec<u8>, usize)> {
    let mut output = codec.create();
    let mut page_count = 0;

    for file in files {
        let source = codec.decode(&file.name, &file.bytes)?;
        let pages = codec.append_pages(&mut output, source)?;
        debug!("Appended {} page(s) from {}", pages, file.name);
        page_count += pages;
    }

    let bytes = codec.encode(output)?;
    Ok((bytes, page_count))
}

fn document_name(key: &str) -> String {
    format!("{key}{PDF_EXTENSION}")
}

fn sort_by_name(files: &mut [InputFile]) {
    files.sort_by(|a, b| a.name.cmp(&b.name));
}
