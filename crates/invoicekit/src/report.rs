//! CSV recap of scraped invoices.
//!
//! One row per [`InvoiceRecord`] with the columns accountants expect in the
//! monthly tax recap. A header row is always written, even for an empty list.

use std::io::Write;

use chrono::Local;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::invoice::{InvoiceRecord, normalize_period};

/// Prefix of generated recap file names.
pub const RECAP_PREFIX: &str = "CoreTax_Rekap";

/// Column headers, in output order.
pub const RECAP_HEADERS: [&str; 5] = ["No Faktur", "Masa Pajak", "Tanggal", "DPP", "PPN"];

/// One line of the recap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapRow {
    /// Invoice number.
    #[serde(rename = "No Faktur")]
    pub invoice_number: String,
    /// Tax period as `MMYY`.
    #[serde(rename = "Masa Pajak")]
    pub tax_period: String,
    /// Transaction date as scraped.
    #[serde(rename = "Tanggal")]
    pub transaction_date: String,
    /// Tax base amount.
    #[serde(rename = "DPP")]
    pub dpp: f64,
    /// VAT amount.
    #[serde(rename = "PPN")]
    pub ppn: f64,
}

impl From<&InvoiceRecord> for RecapRow {
    fn from(record: &InvoiceRecord) -> Self {
        Self {
            invoice_number: record.number.trim().to_string(),
            tax_period: normalize_period(&record.date),
            transaction_date: record.date.trim().to_string(),
            dpp: record.dpp_amount(),
            ppn: record.ppn_amount(),
        }
    }
}

/// `CoreTax_Rekap_<YYYY-MM-DD_HH-MM>.csv` in local time.
pub fn recap_filename() -> String {
    format!("{RECAP_PREFIX}_{}.csv", Local::now().format("%Y-%m-%d_%H-%M"))
}

/// Write `records` as CSV to `writer`.
///
/// Returns the number of data rows written.
///
/// # Errors
///
/// Returns [`InvoiceKitError::Export`](crate::InvoiceKitError::Export) if a
/// row cannot be written.
pub fn write_recap<W: Write>(writer: W, records: &[InvoiceRecord]) -> Result<usize> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    out.write_record(RECAP_HEADERS)?;
    for record in records {
        out.serialize(RecapRow::from(record))?;
    }
    out.flush()?;

    debug!("Wrote recap of {} invoice(s)", records.len());
    Ok(records.len())
}

/// Recap of `records` as CSV bytes.
pub fn recap_bytes(records: &[InvoiceRecord]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_recap(&mut bytes, records)?;
    Ok(bytes)
}
