//! Integration tests for grouped merging.

use invoicekit::cancel::CancellationToken;
use invoicekit::grouping::UNCLASSIFIED_GROUP;
use invoicekit::io::{DocumentCodec, LopdfCodec, PageAccumulator};
use invoicekit::merge::{GroupOutcome, MergeOutput, MergeSession, MergeState, Merger, OutputMode};
use invoicekit::{InvoiceKitError, NamingConfig, Pattern, Result};
use lopdf::Document;

use crate::common::{corrupt_input, page_markers, pdf_input, zip_entry, zip_entry_names};

fn tax_merger() -> Merger {
    Merger::new(Pattern::compile("{mmyy}-{npwp}-{invoice}").unwrap())
}

/// Codec that panics while decoding any file of the December 2025 period.
#[derive(Clone)]
struct PanickingCodec(LopdfCodec);

impl DocumentCodec for PanickingCodec {
    type Source = Document;
    type Output = PageAccumulator;

    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Document> {
        if name.starts_with("1225-") {
            panic!("decoder crashed on {name}");
        }
        self.0.decode(name, bytes)
    }

    fn page_count(&self, source: &Document) -> usize {
        self.0.page_count(source)
    }

    fn create(&self) -> PageAccumulator {
        self.0.create()
    }

    fn append_pages(&self, output: &mut PageAccumulator, source: Document) -> Result<usize> {
        self.0.append_pages(output, source)
    }

    fn encode(&self, output: PageAccumulator) -> Result<Vec<u8>> {
        self.0.encode(output)
    }
}

#[tokio::test]
async fn test_single_group_collapses_to_document() {
    let files = vec![
        pdf_input("1125-111-002.pdf", &["002.p1"]),
        pdf_input("1125-111-001.pdf", &["001.p1"]),
    ];

    let result = tax_merger()
        .merge(files, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.summary.mode, OutputMode::Single);
    match &result.output {
        MergeOutput::Single(document) => {
            assert_eq!(document.name, "1125-111.pdf");
            assert_eq!(document.page_count, 2);
            assert_eq!(page_markers(&document.bytes), ["001.p1", "002.p1"]);
        }
        MergeOutput::Archive(archive) => panic!("unexpected archive {}", archive.name),
    }
    assert_eq!(result.statistics.files_merged, 2);
    assert_eq!(result.statistics.total_pages, 2);
}

#[tokio::test]
async fn test_page_order_is_preserved() {
    let files = vec![
        pdf_input("1125-111-B.pdf", &["B.p1"]),
        pdf_input("1125-111-A.pdf", &["A.p1", "A.p2"]),
    ];

    let result = tax_merger()
        .with_codec(LopdfCodec::without_compression())
        .merge(files, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page_markers(result.output.bytes()), ["A.p1", "A.p2", "B.p1"]);
}

#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let files = vec![
        pdf_input("1125-111-001.pdf", &["001.p1"]),
        pdf_input("1125-111-002.pdf", &["002.p1"]),
        corrupt_input("1225-222-001.pdf"),
        pdf_input("0126-333-001.pdf", &["333.p1"]),
    ];

    let result = tax_merger()
        .merge(files, &CancellationToken::new())
        .await
        .unwrap();

    let MergeOutput::Archive(archive) = &result.output else {
        panic!("expected an archive");
    };
    assert!(archive.name.starts_with("CoreTax_Merged_"));
    assert!(archive.name.ends_with(".zip"));
    assert_eq!(
        zip_entry_names(&archive.bytes),
        ["0126-333.pdf", "1125-111.pdf"]
    );
    assert_eq!(
        page_markers(&zip_entry(&archive.bytes, "1125-111.pdf")),
        ["001.p1", "002.p1"]
    );

    let failures = result.summary.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].group, "1225-222");
    assert!(failures[0].reason.contains("1225-222-001.pdf"));

    assert_eq!(result.statistics.groups_merged, 2);
    assert_eq!(result.statistics.groups_failed, 1);
    assert_eq!(result.statistics.files_merged, 3);
    assert_eq!(result.statistics.files_skipped, 1);
}

#[tokio::test]
async fn test_panicking_group_is_isolated() {
    let files = vec![
        pdf_input("1125-111-001.pdf", &["111.p1"]),
        pdf_input("1225-222-001.pdf", &["222.p1"]),
        pdf_input("0126-333-001.pdf", &["333.p1"]),
    ];

    let result = tax_merger()
        .with_codec(PanickingCodec(LopdfCodec::new()))
        .merge(files, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        zip_entry_names(result.output.bytes()),
        ["0126-333.pdf", "1125-111.pdf"]
    );
    let failures = result.summary.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].group, "1225-222");
    assert!(failures[0].reason.contains("panicked"));
    assert_eq!(result.statistics.groups_failed, 1);
    assert_eq!(result.statistics.groups_merged, 2);
}

#[tokio::test]
async fn test_panicking_single_group_fails_the_run() {
    let files = vec![
        pdf_input("1225-222-001.pdf", &["a"]),
        pdf_input("1225-222-002.pdf", &["b"]),
    ];

    let err = tax_merger()
        .with_codec(PanickingCodec(LopdfCodec::new()))
        .merge(files, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, InvoiceKitError::MergeFailed { .. }));
    assert_eq!(err.exit_code(), 6);
}

#[tokio::test]
async fn test_unclassified_files_get_their_own_group() {
    let files = vec![
        pdf_input("1125-111-001.pdf", &["111.p1"]),
        pdf_input("1225-222-001.pdf", &["222.p1"]),
        pdf_input("scan.pdf", &["scan.p1"]),
    ];

    let result = tax_merger()
        .merge(files, &CancellationToken::new())
        .await
        .unwrap();

    let groups: Vec<(&str, Vec<&str>)> = result
        .summary
        .groups
        .iter()
        .map(|g| (g.key.as_str(), g.files.iter().map(String::as_str).collect()))
        .collect();
    assert_eq!(
        groups,
        [
            ("1125-111", vec!["1125-111-001.pdf"]),
            ("1225-222", vec!["1225-222-001.pdf"]),
            (UNCLASSIFIED_GROUP, vec!["scan.pdf"]),
        ]
    );

    let bytes = result.output.bytes();
    assert_eq!(
        zip_entry_names(bytes),
        ["1125-111.pdf", "1225-222.pdf", "Unclassified.pdf"]
    );
    assert_eq!(page_markers(&zip_entry(bytes, "Unclassified.pdf")), ["scan.p1"]);
}

#[tokio::test]
async fn test_all_groups_failing_fails_the_run() {
    let files = vec![
        corrupt_input("1125-111-001.pdf"),
        corrupt_input("1225-222-001.pdf"),
    ];

    let err = tax_merger()
        .merge(files, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InvoiceKitError::AllGroupsFailed { ref failures } if failures.len() == 2
    ));
    assert_eq!(err.exit_code(), 6);
}

#[tokio::test]
async fn test_single_file_passes_through() {
    let result = tax_merger()
        .merge(
            vec![pdf_input("1125-111-001.pdf", &["p1", "p2"])],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.output.name(), "1125-111.pdf");
    assert_eq!(page_markers(result.output.bytes()), ["p1", "p2"]);
}

#[tokio::test]
async fn test_configured_grouping_and_prefix() {
    let naming = NamingConfig {
        pattern: "{npwp}_{mmyy}_{invoice}".to_string(),
        group_keys: vec!["mmyy".to_string()],
        output_prefix: "Faktur_Keluaran".to_string(),
        ..Default::default()
    };
    let files = vec![
        pdf_input("111_1125_001.pdf", &["a"]),
        pdf_input("222_1125_002.pdf", &["b"]),
        pdf_input("111_1225_003.pdf", &["c"]),
    ];

    let result = Merger::from_config(&naming)
        .unwrap()
        .merge(files, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.output.name().starts_with("Faktur_Keluaran_"));
    assert_eq!(
        zip_entry_names(result.output.bytes()),
        ["1125.pdf", "1225.pdf"]
    );
    assert_eq!(
        page_markers(&zip_entry(result.output.bytes(), "1125.pdf")),
        ["a", "b"]
    );
}

#[tokio::test]
async fn test_cancelled_run_produces_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = tax_merger()
        .merge(
            vec![
                pdf_input("1125-111-001.pdf", &["a"]),
                pdf_input("1225-222-001.pdf", &["b"]),
            ],
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, InvoiceKitError::Cancelled));
    assert_eq!(err.exit_code(), 130);
}

#[tokio::test]
async fn test_session_cycle() {
    let mut session = MergeSession::new(tax_merger());
    session
        .add_file(pdf_input("1125-111-001.pdf", &["a"]))
        .unwrap();
    session
        .add_file(pdf_input("1125-111-002.pdf", &["b"]))
        .unwrap();

    session.run(&CancellationToken::new()).await.unwrap();
    assert!(matches!(session.state(), MergeState::Succeeded(_)));

    let result = session.take_output().unwrap();
    assert_eq!(result.output.name(), "1125-111.pdf");
    assert!(matches!(
        result.summary.groups[0].outcome,
        GroupOutcome::Merged { page_count: 2, .. }
    ));
    assert!(matches!(session.state(), MergeState::Idle));
}
