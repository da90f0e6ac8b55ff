//! invoicekit - Name, parse, group and merge tax-invoice PDFs.
//!
//! This library provides the filename-pattern engine and the grouped merge
//! pipeline used to manage invoice documents downloaded from a tax portal.
//! It supports:
//!
//! - Token patterns like `{mmyy}-{npwp}-{invoice}`
//! - Generating filenames from invoice metadata
//! - Parsing existing filenames back into metadata
//! - Grouping files by a derived key
//! - Merging each group into one PDF, packaged as a zip when needed
//! - Download naming and a bounded download queue
//! - CSV recaps of scraped invoices
//!
//! # Examples
//!
//! ## Naming a download
//!
//! ```
//! use invoicekit::{Metadata, Pattern};
//!
//! let pattern = Pattern::compile("{mmyy}-{npwp}-{invoice}").unwrap();
//! let metadata: Metadata = [("mmyy", "1125"), ("npwp", "123456"), ("invoice", "001")]
//!     .into_iter()
//!     .collect();
//!
//! assert_eq!(pattern.generate(&metadata), "1125-123456-001.pdf");
//! assert_eq!(pattern.parse("1125-123456-001 (2).pdf"), Some(metadata));
//! ```
//!
//! ## Merging grouped files
//!
//! ```no_run
//! use invoicekit::cancel::CancellationToken;
//! use invoicekit::merge::{InputFile, MergeOutput, Merger};
//! use invoicekit::Pattern;
//!
//! # async fn example(files: Vec<InputFile>) -> Result<(), Box<dyn std::error::Error>> {
//! let merger = Merger::new(Pattern::compile("{mmyy}-{npwp}-{invoice}")?);
//! let result = merger.merge(files, &CancellationToken::new()).await?;
//!
//! match result.output {
//!     MergeOutput::Single(document) => println!("wrote {}", document.name),
//!     MergeOutput::Archive(archive) => println!("wrote {}", archive.name),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod config;
pub mod download;
pub mod error;
pub mod grouping;
pub mod invoice;
pub mod io;
pub mod merge;
pub mod metadata;
pub mod output;
pub mod pattern;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, NamingConfig};
pub use error::{InvoiceKitError, PatternError, Result};
pub use metadata::Metadata;
pub use pattern::{Pattern, PatternOptions};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
