//! Download naming and dispatch.

pub mod naming;
pub mod queue;

pub use naming::{InvoiceRegistry, PORTAL_DOWNLOAD_PREFIX, suggest_filename};
pub use queue::{
    ConflictPolicy, DEFAULT_MAX_CONCURRENCY, DownloadDispatcher, DownloadOutcome, DownloadQueue,
    DownloadRequest,
};
