//! Integration tests for naming: records to downloads to merge groups.

use invoicekit::cancel::CancellationToken;
use invoicekit::download::{DownloadDispatcher, DownloadQueue, DownloadRequest, InvoiceRegistry};
use invoicekit::grouping::{FALLBACK_GROUP, Grouper, default_group_keys, group_key};
use invoicekit::invoice::{InvoiceRecord, InvoiceTotals};
use invoicekit::{Metadata, NamingConfig, Pattern, Result};
use rstest::rstest;
use std::sync::Mutex;

fn records() -> Vec<InvoiceRecord> {
    vec![
        InvoiceRecord {
            number: "04002500000101".to_string(),
            date: "19-11-2025".to_string(),
            npwp: "01.111.111.1-111.000".to_string(),
            buyer_name: "PT Satu".to_string(),
            dpp: "1.000.000".to_string(),
            ppn: "110.000".to_string(),
        },
        InvoiceRecord {
            number: "04002500000102".to_string(),
            date: "20-11-2025".to_string(),
            npwp: "01.111.111.1-111.000".to_string(),
            buyer_name: "PT Satu".to_string(),
            dpp: "2.000.000".to_string(),
            ppn: "220.000".to_string(),
        },
        InvoiceRecord {
            number: "04002500000201".to_string(),
            date: "02-12-2025".to_string(),
            npwp: "02.222.222.2-222.000".to_string(),
            buyer_name: "CV Dua".to_string(),
            dpp: "500.000,50".to_string(),
            ppn: "55.000,05".to_string(),
        },
    ]
}

#[derive(Default)]
struct CollectingDispatcher {
    filenames: Mutex<Vec<String>>,
}

impl DownloadDispatcher for CollectingDispatcher {
    async fn dispatch(&self, request: &DownloadRequest) -> Result<()> {
        self.filenames.lock().unwrap().push(request.filename.clone());
        Ok(())
    }
}

#[rstest]
#[case("{mmyy}-{npwp}-{invoice}")]
#[case("Faktur {invoice} ({buyer}) {mmyy}")]
#[case("{npwp}.{mmyy}.{invoice}.PDF")]
fn test_generated_names_parse_back(#[case] raw: &str) {
    let pattern = Pattern::compile(raw).unwrap();
    for record in records() {
        let metadata = record.to_metadata().restricted_to(pattern.placeholders());
        let name = pattern.generate(&metadata);
        assert!(name.to_lowercase().ends_with(".pdf"));
        assert_eq!(pattern.parse(&name), Some(metadata), "{name}");
    }
}

#[test]
fn test_generation_is_total() {
    let pattern = Pattern::compile("{mmyy}-{npwp}-{invoice}").unwrap();
    assert_eq!(pattern.generate(&Metadata::new()), "--.pdf");
}

#[test]
fn test_identifier_only_metadata_uses_fallback_group() {
    let metadata: Metadata = [("invoice", "001")].into_iter().collect();
    assert_eq!(group_key(&metadata, &[] as &[&str]), FALLBACK_GROUP);
}

#[tokio::test]
async fn test_downloads_are_named_and_grouped() {
    let naming = NamingConfig::default();
    let pattern = naming.compile().unwrap();

    let mut registry = InvoiceRegistry::new();
    registry.register(records());

    let originals = [
        "OutputTaxInvoice-6c1f-0999-04002500000101-0111.pdf",
        "OutputTaxInvoice-77aa-0999-04002500000102-0111.pdf",
        "OutputTaxInvoice-9d02-0999-04002500000201-0222.pdf",
        "OutputTaxInvoice-0000-0999-09999999999999-0333.pdf",
        "manual-upload.pdf",
    ];
    let requests: Vec<DownloadRequest> = originals
        .iter()
        .map(|original| {
            DownloadRequest::named(
                format!("https://portal.test/{original}"),
                original,
                &registry,
                &pattern,
            )
        })
        .collect();

    let dispatcher = CollectingDispatcher::default();
    let outcomes = DownloadQueue::new()
        .run(requests, &dispatcher, &CancellationToken::new())
        .await;
    assert!(outcomes.iter().all(|o| o.is_started()));

    let mut saved = dispatcher.filenames.into_inner().unwrap();
    saved.sort();
    assert_eq!(
        saved,
        [
            "1125-011111111111000-04002500000101.pdf",
            "1125-011111111111000-04002500000102.pdf",
            "1225-022222222222000-04002500000201.pdf",
            "OutputTaxInvoice-0000-0999-09999999999999-0333.pdf",
            "manual-upload.pdf",
        ]
    );

    let keys = default_group_keys(&pattern);
    let grouper = Grouper::new(&pattern, &keys);
    let groups: Vec<String> = saved.iter().map(|name| grouper.assign(name)).collect();
    assert_eq!(
        groups,
        [
            "1125-011111111111000",
            "1125-011111111111000",
            "1225-022222222222000",
            "OutputTaxInvoice-0000-0999-09999999999999",
            "Unclassified",
        ]
    );
}

#[test]
fn test_totals_over_records() {
    let totals: InvoiceTotals = records().iter().collect();
    assert_eq!(totals.count, 3);
    assert_eq!(totals.dpp, 3_500_000.5);
    assert!((totals.ppn - 385_000.05).abs() < 1e-6);
}
