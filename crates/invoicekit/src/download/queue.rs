//! Bounded download dispatch.
//!
//! Requests are handed to a [`DownloadDispatcher`] with at most
//! `max_concurrency` dispatches in flight. The cancellation token is checked
//! right before each request is dispatched; requests not yet started when
//! the token fires are reported as cancelled.

use std::future::Future;

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::download::naming::{InvoiceRegistry, suggest_filename};
use crate::error::Result;
use crate::pattern::Pattern;

/// Default number of dispatches in flight.
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// What the download target does when the filename is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Append a ` (N)` counter.
    #[default]
    Uniquify,
}

/// A download to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Source URL.
    pub url: String,
    /// Filename to save under.
    pub filename: String,
    /// Conflict handling.
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

impl DownloadRequest {
    /// Create a request saved under `filename`.
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            conflict: ConflictPolicy::Uniquify,
        }
    }

    /// Create a request named through the registry and pattern.
    pub fn named(
        url: impl Into<String>,
        original: &str,
        registry: &InvoiceRegistry,
        pattern: &Pattern,
    ) -> Self {
        Self::new(url, suggest_filename(original, registry, pattern))
    }
}

/// Starts downloads. Implemented by whatever actually fetches files.
pub trait DownloadDispatcher: Sync {
    /// Start `request`. Completing means the download was accepted, not
    /// that it finished.
    fn dispatch(&self, request: &DownloadRequest) -> impl Future<Output = Result<()>> + Send;
}

/// How one request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadOutcome {
    /// The dispatcher accepted the download.
    Started {
        /// Filename requested.
        filename: String,
    },
    /// The dispatcher rejected the download.
    Failed {
        /// Filename requested.
        filename: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Cancelled before being dispatched.
    Cancelled {
        /// Filename requested.
        filename: String,
    },
}

impl DownloadOutcome {
    /// Whether the download was started.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

/// Dispatches requests with bounded concurrency.
#[derive(Debug, Clone, Copy)]
pub struct DownloadQueue {
    max_concurrency: usize,
}

impl DownloadQueue {
    /// Create a queue allowing [`DEFAULT_MAX_CONCURRENCY`] dispatches.
    pub fn new() -> Self {
        Self::with_concurrency(DEFAULT_MAX_CONCURRENCY)
    }

    /// Create a queue allowing `max_concurrency` dispatches, at least one.
    pub fn with_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Dispatch limit.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Dispatch every request, returning one outcome per request in input
    /// order. A failed dispatch does not stop the queue.
    pub async fn run<D: DownloadDispatcher>(
        &self,
        requests: Vec<DownloadRequest>,
        dispatcher: &D,
        cancel: &CancellationToken,
    ) -> Vec<DownloadOutcome> {
        let indexed = stream::iter(requests.into_iter().enumerate());
        let mut outcomes: Vec<(usize, DownloadOutcome)> = indexed
            .map(|(index, request)| async move {
                if cancel.is_cancelled() {
                    return (
                        index,
                        DownloadOutcome::Cancelled {
                            filename: request.filename,
                        },
                    );
                }

                debug!("Dispatching {} -> {}", request.url, request.filename);
                let outcome = match dispatcher.dispatch(&request).await {
                    Ok(()) => DownloadOutcome::Started {
                        filename: request.filename,
                    },
                    Err(e) => {
                        warn!("Download failed to start: {e}");
                        DownloadOutcome::Failed {
                            filename: request.filename,
                            reason: e.to_string(),
                        }
                    }
                };
                (index, outcome)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

impl Default for DownloadQueue {
    fn default() -> Self {
        Self::new()
    }
}
