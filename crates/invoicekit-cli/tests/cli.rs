//! End-to-end tests of the `invoicekit` binary.

use std::path::Path;
use std::process::{Command, Output};

use lopdf::{Document, Object, dictionary};
use tempfile::TempDir;

fn invoicekit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_invoicekit"))
        .args(args)
        .env_remove("INVOICEKIT_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write_pdf(path: &Path, pages: usize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn test_merge_single_group() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_pdf(&input.path().join("1125-111-001.pdf"), 1);
    write_pdf(&input.path().join("1125-111-002.pdf"), 2);

    let glob = format!("{}/*.pdf", input.path().display());
    let out = invoicekit(&["merge", "-q", &glob, "-o", output.path().to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let merged = Document::load(output.path().join("1125-111.pdf")).unwrap();
    assert_eq!(merged.get_pages().len(), 3);
}

#[test]
fn test_merge_twice_uniquifies_output() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let a = input.path().join("1125-111-001.pdf");
    let b = input.path().join("1125-111-002.pdf");
    write_pdf(&a, 1);
    write_pdf(&b, 1);

    let args = [
        "merge",
        "-q",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "-o",
        output.path().to_str().unwrap(),
    ];
    assert!(invoicekit(&args).status.success());
    assert!(invoicekit(&args).status.success());

    assert!(output.path().join("1125-111.pdf").exists());
    assert!(output.path().join("1125-111 (1).pdf").exists());
}

#[test]
fn test_merge_dry_run_writes_nothing() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let a = input.path().join("1125-111-001.pdf");
    let b = input.path().join("1225-222-001.pdf");
    write_pdf(&a, 1);
    write_pdf(&b, 1);

    let out = invoicekit(&[
        "merge",
        "--dry-run",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "-o",
        output.path().to_str().unwrap(),
    ]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("1125-111 -> 1125-111.pdf"), "{stdout}");
    assert!(stdout.contains("zip archive"), "{stdout}");
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn test_merge_requires_two_inputs() {
    let input = TempDir::new().unwrap();
    let a = input.path().join("1125-111-001.pdf");
    write_pdf(&a, 1);

    let out = invoicekit(&["merge", a.to_str().unwrap()]);
    assert!(!out.status.success());
}

#[test]
fn test_merge_missing_input() {
    let out = invoicekit(&["merge", "/nonexistent/a.pdf", "/nonexistent/b.pdf"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_parse_prints_json() {
    let out = invoicekit(&[
        "parse",
        "1125-011111111111000-04002500000101 (2).pdf",
        "scan.pdf",
    ]);
    assert!(out.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["metadata"]["mmyy"], "1125");
    assert_eq!(lines[0]["metadata"]["invoice"], "04002500000101");
    assert_eq!(lines[0]["group"], "1125-011111111111000");
    assert!(lines[1]["metadata"].is_null());
    assert_eq!(lines[1]["group"], "Unclassified");
}

#[test]
fn test_name_copies_under_generated_names() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let records = input.path().join("records.json");
    std::fs::write(
        &records,
        r#"[{"number": "04002500000101", "date": "19-11-2025", "npwp": "01.111.111.1-111.000"}]"#,
    )
    .unwrap();
    let download = input.path().join("OutputTaxInvoice-6c1f-04002500000101.pdf");
    write_pdf(&download, 1);

    let out = invoicekit(&[
        "name",
        "-q",
        "--records",
        records.to_str().unwrap(),
        download.to_str().unwrap(),
        "-o",
        output.path().to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(
        output
            .path()
            .join("1125-011111111111000-04002500000101.pdf")
            .exists()
    );
}

#[test]
fn test_totals_json() {
    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.json");
    std::fs::write(
        &records,
        r#"[
            {"number": "1", "date": "19-11-2025", "npwp": "1",
             "dpp": "1.000.000", "ppn": "110.000"},
            {"number": "2", "date": "20-11-2025", "npwp": "1",
             "dpp": "500.000", "ppn": "55.000"}
        ]"#,
    )
    .unwrap();

    let out = invoicekit(&["totals", "--json", records.to_str().unwrap()]);
    assert!(out.status.success());

    let totals: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(totals["count"], 2);
    assert_eq!(totals["dpp"], 1_500_000.0);
    assert_eq!(totals["ppn"], 165_000.0);
}

#[test]
fn test_recap_writes_csv() {
    let dir = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let records = dir.path().join("records.json");
    std::fs::write(
        &records,
        r#"[
            {"number": "04002500000101", "date": "19-11-2025", "npwp": "1",
             "dpp": "1.000.000", "ppn": "110.000"}
        ]"#,
    )
    .unwrap();

    let args = [
        "recap",
        "-q",
        records.to_str().unwrap(),
        "-o",
        output.path().to_str().unwrap(),
        "--name",
        "rekap.csv",
    ];
    let out = invoicekit(&args);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(invoicekit(&args).status.success());

    let csv = std::fs::read_to_string(output.path().join("rekap.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        [
            "No Faktur,Masa Pajak,Tanggal,DPP,PPN",
            "04002500000101,1125,19-11-2025,1000000.0,110000.0",
        ]
    );
    assert!(output.path().join("rekap (1).csv").exists());
}

#[test]
fn test_recap_default_name() {
    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.json");
    std::fs::write(&records, "[]").unwrap();

    let out = invoicekit(&[
        "recap",
        "-q",
        records.to_str().unwrap(),
        "-o",
        dir.path().to_str().unwrap(),
    ]);
    assert!(out.status.success());

    let recaps: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("CoreTax_Rekap_") && name.ends_with(".csv"))
        .collect();
    assert_eq!(recaps.len(), 1);
}
