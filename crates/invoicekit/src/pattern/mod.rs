//! Filename patterns.
//!
//! A pattern is a template such as `{mmyy}-{npwp}-{invoice}` made of literal
//! text and `{name}` placeholders. One compiled [`Pattern`] serves both
//! directions:
//!
//! - [`Pattern::generate`] turns metadata into a filename
//! - [`Pattern::parse`] recovers metadata from a filename
//!
//! # Examples
//!
//! ```
//! use invoicekit::Pattern;
//!
//! let pattern = Pattern::compile("INV-{invoice}_{mmyy}.pdf").unwrap();
//! assert_eq!(pattern.placeholders(), ["invoice", "mmyy"]);
//!
//! let metadata = pattern.parse("inv-0042_1125.PDF").unwrap();
//! assert_eq!(metadata.get("invoice"), Some("0042"));
//! ```

pub mod compiler;
pub mod generator;
pub mod parser;

pub use compiler::{Pattern, PatternOptions, Segment, strip_pdf_extension};

/// Extension appended to generated names and stripped from patterns.
pub const PDF_EXTENSION: &str = ".pdf";
