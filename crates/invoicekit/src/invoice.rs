//! Scraped invoice records.
//!
//! Records arrive as the portal displays them: dates like `19-11-2025`,
//! tax IDs with punctuation and amounts in Indonesian number format
//! (`1.000.000,00`). This module normalizes them into pattern metadata and
//! aggregates totals.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// Leading decimal number, the way a lenient float parser reads it.
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)").unwrap());

/// One row of the portal's invoice table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice number.
    pub number: String,
    /// Invoice date as displayed, usually `DD-MM-YYYY`.
    pub date: String,
    /// Tax ID (NPWP) as displayed.
    pub npwp: String,
    /// Buyer name.
    #[serde(default)]
    pub buyer_name: String,
    /// Tax base amount as displayed.
    #[serde(default)]
    pub dpp: String,
    /// VAT amount as displayed.
    #[serde(default)]
    pub ppn: String,
}

impl InvoiceRecord {
    /// Metadata for filename generation.
    ///
    /// Keys are `invoice`, `mmyy`, `npwp` and `buyer`.
    ///
    /// ```
    /// use invoicekit::invoice::InvoiceRecord;
    ///
    /// let record = InvoiceRecord {
    ///     number: "04002500012345".to_string(),
    ///     date: "19-11-2025".to_string(),
    ///     npwp: "01.234.567.8-901.000".to_string(),
    ///     ..Default::default()
    /// };
    /// let metadata = record.to_metadata();
    /// assert_eq!(metadata.get("mmyy"), Some("1125"));
    /// assert_eq!(metadata.get("npwp"), Some("012345678901000"));
    /// ```
    pub fn to_metadata(&self) -> Metadata {
        [
            ("invoice", self.number.trim().to_string()),
            ("mmyy", normalize_period(&self.date)),
            ("npwp", normalize_tax_id(&self.npwp)),
            ("buyer", self.buyer_name.trim().to_string()),
        ]
        .into_iter()
        .collect()
    }

    /// Parsed tax base amount.
    pub fn dpp_amount(&self) -> f64 {
        parse_currency(&self.dpp)
    }

    /// Parsed VAT amount.
    pub fn ppn_amount(&self) -> f64 {
        parse_currency(&self.ppn)
    }
}

/// Turn a `DD-MM-YYYY` date into `MMYY`.
///
/// Everything but digits and dashes is dropped first. Dates of any other
/// shape are returned in that cleaned form.
pub fn normalize_period(date: &str) -> String {
    let cleaned: String = date
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    match cleaned.split('-').collect::<Vec<_>>().as_slice() {
        [_, month, year] => {
            let year_suffix = &year[year.len().saturating_sub(2)..];
            format!("{month}{year_suffix}")
        }
        _ => cleaned,
    }
}

/// Keep only the digits of a tax ID.
pub fn normalize_tax_id(npwp: &str) -> String {
    npwp.chars().filter(char::is_ascii_digit).collect()
}

/// Parse a displayed amount such as `1.000.000,00`.
///
/// Dots are thousands separators and the comma is the decimal separator.
/// Anything that does not yield a number parses as `0.0`.
pub fn parse_currency(text: &str) -> f64 {
    let cleaned: String = text
        .replace('.', "")
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    LEADING_NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Running totals over selected invoices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InvoiceTotals {
    /// Sum of tax base amounts.
    pub dpp: f64,
    /// Sum of VAT amounts.
    pub ppn: f64,
    /// Number of invoices added.
    pub count: usize,
}

impl InvoiceTotals {
    /// Empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record.
    pub fn add(&mut self, record: &InvoiceRecord) {
        self.dpp += record.dpp_amount();
        self.ppn += record.ppn_amount();
        self.count += 1;
    }

    /// Tax base plus VAT.
    pub fn total(&self) -> f64 {
        self.dpp + self.ppn
    }

    /// Average of [`total`](Self::total) per invoice, zero when empty.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total() / self.count as f64
        }
    }
}

impl<'a> FromIterator<&'a InvoiceRecord> for InvoiceTotals {
    fn from_iter<I: IntoIterator<Item = &'a InvoiceRecord>>(iter: I) -> Self {
        let mut totals = Self::new();
        for record in iter {
            totals.add(record);
        }
        totals
    }
}
