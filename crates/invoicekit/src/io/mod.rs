//! Document and archive I/O.
//!
//! The merge pipeline only sees raw bytes and the [`DocumentCodec`] seam.
//! [`LopdfCodec`] is the default codec; [`archive`] packages several merged
//! documents into one zip.

pub mod archive;
pub mod codec;

pub use archive::{Archive, ArchiveEntry};
pub use codec::{DocumentCodec, LopdfCodec, PageAccumulator};

use crate::utils::format_file_size;

/// An encoded PDF with the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDocument {
    /// Output filename, ending in `.pdf`.
    pub name: String,
    /// Encoded PDF bytes.
    pub bytes: Vec<u8>,
    /// Pages in the document.
    pub page_count: usize,
}

impl NamedDocument {
    /// Size of the encoded document.
    pub fn format_size(&self) -> String {
        format_file_size(self.bytes.len() as u64)
    }
}
