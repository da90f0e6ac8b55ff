//! Filename generation.

use crate::metadata::Metadata;
use crate::pattern::{PDF_EXTENSION, Pattern, Segment, strip_pdf_extension};

impl Pattern {
    /// Build a filename from `metadata`.
    ///
    /// Missing keys are substituted with an empty string, so this never
    /// fails. The result always ends in `.pdf`.
    ///
    /// # Examples
    ///
    /// ```
    /// use invoicekit::{Metadata, Pattern};
    ///
    /// let pattern = Pattern::compile("{mmyy}-{npwp}-{invoice}").unwrap();
    /// let metadata: Metadata = [("mmyy", "1125"), ("invoice", "001")].into_iter().collect();
    ///
    /// assert_eq!(pattern.generate(&metadata), "1125--001.pdf");
    /// ```
    pub fn generate(&self, metadata: &Metadata) -> String {
        let mut name = String::new();
        for segment in self.segments() {
            match segment {
                Segment::Literal(text) => name.push_str(text),
                Segment::Placeholder(key) => name.push_str(metadata.get(key).unwrap_or_default()),
            }
        }

        if !has_pdf_extension(&name) {
            name.push_str(PDF_EXTENSION);
        }

        name
    }
}

fn has_pdf_extension(name: &str) -> bool {
    strip_pdf_extension(name).len() != name.len()
}
