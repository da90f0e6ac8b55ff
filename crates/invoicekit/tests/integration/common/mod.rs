//! Shared helpers for integration tests.
//!
//! PDFs are built in memory with lopdf. Every page carries a `/Marker`
//! string so tests can check which source page ended up where.

#![allow(dead_code)]

use std::io::{Cursor, Read};

use invoicekit::merge::InputFile;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Build a PDF with one page per marker.
pub fn pdf_with_pages(markers: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for marker in markers {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*marker)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Marker" => Object::string_literal(*marker),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => markers.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Input file holding a PDF with the given page markers.
pub fn pdf_input(name: &str, markers: &[&str]) -> InputFile {
    InputFile::new(name, pdf_with_pages(markers))
}

/// Input file whose bytes are not a PDF.
pub fn corrupt_input(name: &str) -> InputFile {
    InputFile::new(name, b"%PDF-1.5\nthis is not a pdf".to_vec())
}

/// Page markers of an encoded PDF, in page order.
pub fn page_markers(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let marker = page.get(b"Marker").unwrap().as_str().unwrap();
            String::from_utf8_lossy(marker).into_owned()
        })
        .collect()
}

/// Entry names of a zip archive, in archive order.
pub fn zip_entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Contents of one zip entry.
pub fn zip_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents).unwrap();
    contents
}
