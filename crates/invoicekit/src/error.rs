//! Error types for invoicekit.
//!
//! This module defines all error types that can occur while compiling naming
//! patterns, merging grouped PDFs and dispatching downloads. Errors carry
//! enough context to tell the user which file or group went wrong.
//!
//! # Error Categories
//!
//! - **Pattern Errors**: the naming pattern cannot be compiled
//! - **PDF Errors**: an input payload is not a usable PDF
//! - **Merge Errors**: a group or the whole run failed
//! - **I/O Errors**: reading inputs or writing outputs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for invoicekit operations.
pub type Result<T> = std::result::Result<T, InvoiceKitError>;

/// Why a naming pattern was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Nothing is left once the `.pdf` suffix is stripped.
    #[error("pattern is empty")]
    Empty,

    /// The same placeholder appears twice.
    #[error("placeholder {{{name}}} appears more than once")]
    DuplicatePlaceholder {
        /// Name of the repeated placeholder.
        name: String,
    },

    /// The generated matching expression could not be built.
    #[error("failed to build matcher: {reason}")]
    Matcher {
        /// Message from the regex engine.
        reason: String,
    },
}

/// A group that could not be merged, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    /// Group key.
    pub group: String,
    /// Human readable reason.
    pub reason: String,
}

/// Main error type for invoicekit operations.
#[derive(Debug, Error)]
pub enum InvoiceKitError {
    /// The naming pattern could not be compiled.
    #[error("Invalid naming pattern '{pattern}'\n  Reason: {source}")]
    PatternCompile {
        /// The raw pattern as supplied.
        pattern: String,
        /// What is wrong with it.
        #[source]
        source: PatternError,
    },

    /// A payload is not a valid page-bearing PDF.
    #[error("Failed to decode PDF: {name}\n  Reason: {reason}")]
    Decode {
        /// Display name of the input file.
        name: String,
        /// Details from the PDF codec.
        reason: String,
    },

    /// Serializing a merged document failed.
    #[error("Failed to encode merged PDF\n  Reason: {reason}")]
    Encode {
        /// Details from the PDF codec.
        reason: String,
    },

    /// Copying pages into the output document failed.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// No files were provided for merging.
    #[error("No input files specified for merging")]
    NoFilesToMerge,

    /// Every group of the run failed, nothing was produced.
    #[error("All {} group(s) failed to merge", .failures.len())]
    AllGroupsFailed {
        /// One entry per failed group.
        failures: Vec<GroupFailure>,
    },

    /// Packaging merged documents into an archive failed.
    #[error("Failed to package archive: {reason}")]
    Archive {
        /// Details from the archive writer.
        reason: String,
    },

    /// A download could not be handed to the dispatcher.
    #[error("Failed to start download '{filename}': {reason}")]
    Dispatch {
        /// Filename the download was requested under.
        filename: String,
        /// Reason reported by the dispatcher.
        reason: String,
    },

    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Writing an invoice recap failed.
    #[error("Failed to write invoice recap: {reason}")]
    Export {
        /// Details from the CSV writer.
        reason: String,
    },

    /// The operation was cancelled through its token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<zip::result::ZipError> for InvoiceKitError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive {
            reason: err.to_string(),
        }
    }
}

impl From<csv::Error> for InvoiceKitError {
    fn from(err: csv::Error) -> Self {
        Self::Export {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for InvoiceKitError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

impl From<anyhow::Error> for InvoiceKitError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl InvoiceKitError {
    /// Create a PatternCompile error.
    pub fn pattern(pattern: impl Into<String>, source: PatternError) -> Self {
        Self::PatternCompile {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a Decode error.
    pub fn decode(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an Encode error.
    pub fn encode(reason: impl Into<String>) -> Self {
        Self::Encode {
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create a Dispatch error.
    pub fn dispatch(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dispatch {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error only affects one group or file.
    ///
    /// Recoverable errors are recorded in the merge summary while the
    /// remaining groups carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::Encode { .. }
                | Self::MergeFailed { .. }
                | Self::Dispatch { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PatternCompile { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::NoFilesToMerge => 1,
            Self::FileNotFound { .. } => 2,
            Self::Decode { .. } => 3,
            Self::Encode { .. } => 5,
            Self::Archive { .. } => 5,
            Self::Export { .. } => 5,
            Self::Io { .. } => 5,
            Self::MergeFailed { .. } => 6,
            Self::AllGroupsFailed { .. } => 6,
            Self::Dispatch { .. } => 7,
            Self::Cancelled => 130,
            Self::Other { .. } => 1,
        }
    }
}
