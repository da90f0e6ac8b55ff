//! Renaming of portal downloads.
//!
//! The portal names every tax invoice PDF
//! `OutputTaxInvoice-<uuid>-<issuer npwp>-<invoice no>-<buyer npwp>.pdf`.
//! When the invoice number belongs to a scraped record, the download is
//! renamed through the active pattern instead.

use std::collections::HashMap;

use log::debug;

use crate::invoice::InvoiceRecord;
use crate::pattern::Pattern;

/// Prefix of filenames the portal assigns to invoice downloads.
pub const PORTAL_DOWNLOAD_PREFIX: &str = "OutputTaxInvoice-";

/// Known invoices, keyed by invoice number.
#[derive(Debug, Clone, Default)]
pub struct InvoiceRegistry {
    records: HashMap<String, InvoiceRecord>,
}

impl InvoiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register records. A record replaces an earlier one with the same
    /// number. Returns how many records were registered.
    pub fn register<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = InvoiceRecord>,
    {
        let mut count = 0;
        for record in records {
            let number = record.number.trim().to_string();
            if number.is_empty() {
                continue;
            }
            self.records.insert(number, record);
            count += 1;
        }
        debug!("Registered {count} invoice(s), {} known", self.records.len());
        count
    }

    /// Record for an invoice number.
    pub fn get(&self, number: &str) -> Option<&InvoiceRecord> {
        self.records.get(number)
    }

    /// Number of known invoices.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no invoice is known.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record whose number occurs in `filename`.
    ///
    /// When several numbers occur the longest wins, so `123` never shadows
    /// `12345`.
    pub fn find_in(&self, filename: &str) -> Option<&InvoiceRecord> {
        self.records
            .iter()
            .filter(|(number, _)| filename.contains(number.as_str()))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(_, record)| record)
    }
}

/// Name a download should be saved under.
///
/// Portal downloads that mention a registered invoice are renamed with
/// `pattern`. Every other name is returned unchanged.
///
/// ```
/// use invoicekit::download::naming::{InvoiceRegistry, suggest_filename};
/// use invoicekit::invoice::InvoiceRecord;
/// use invoicekit::Pattern;
///
/// let mut registry = InvoiceRegistry::new();
/// registry.register([InvoiceRecord {
///     number: "04002500012345".to_string(),
///     date: "19-11-2025".to_string(),
///     npwp: "01.234.567.8-901.000".to_string(),
///     ..Default::default()
/// }]);
///
/// let pattern = Pattern::compile("{mmyy}-{npwp}-{invoice}").unwrap();
/// let name = suggest_filename(
///     "OutputTaxInvoice-9f1c-0123-04002500012345-0456.pdf",
///     &registry,
///     &pattern,
/// );
/// assert_eq!(name, "1125-012345678901000-04002500012345.pdf");
/// ```
pub fn suggest_filename(original: &str, registry: &InvoiceRegistry, pattern: &Pattern) -> String {
    if !original.starts_with(PORTAL_DOWNLOAD_PREFIX) {
        return original.to_string();
    }

    match registry.find_in(original) {
        Some(record) => {
            let renamed = pattern.generate(&record.to_metadata());
            debug!("Renaming {original} -> {renamed}");
            renamed
        }
        None => original.to_string(),
    }
}
