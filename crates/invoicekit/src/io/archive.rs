//! Zip packaging for multi-group output.

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::io::NamedDocument;
use crate::utils::{UniqueNames, format_file_size};

/// One member of a packaged archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name inside the archive.
    pub name: String,
    /// Pages in the entry's document.
    pub page_count: usize,
    /// Uncompressed entry size.
    pub byte_len: usize,
}

/// A zip archive holding one merged document per group.
#[derive(Debug, Clone)]
pub struct Archive {
    /// Archive filename, ending in `.zip`.
    pub name: String,
    /// Encoded zip bytes.
    pub bytes: Vec<u8>,
    /// Entries in the order they were written.
    pub entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Package `documents` into a zip named `name`.
    ///
    /// Entries keep the order of `documents`. Colliding entry names get a
    /// ` (N)` counter.
    pub fn package(name: impl Into<String>, documents: Vec<NamedDocument>) -> Result<Self> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut names = UniqueNames::new();
        let mut entries = Vec::with_capacity(documents.len());

        for document in documents {
            let entry_name = names.claim(&document.name);
            writer.start_file(entry_name.as_str(), options)?;
            writer.write_all(&document.bytes)?;

            log::debug!(
                "Packed {} ({} pages, {})",
                entry_name,
                document.page_count,
                format_file_size(document.bytes.len() as u64)
            );
            entries.push(ArchiveEntry {
                name: entry_name,
                page_count: document.page_count,
                byte_len: document.bytes.len(),
            });
        }

        let bytes = writer.finish()?.into_inner();

        Ok(Self {
            name: name.into(),
            bytes,
            entries,
        })
    }

    /// Total pages across all entries.
    pub fn total_pages(&self) -> usize {
        self.entries.iter().map(|entry| entry.page_count).sum()
    }

    /// Size of the encoded archive.
    pub fn format_size(&self) -> String {
        format_file_size(self.bytes.len() as u64)
    }
}
