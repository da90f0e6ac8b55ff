//! PDF codec seam.
//!
//! A codec decodes raw bytes into a source document, copies its pages into
//! an accumulating output and finally encodes that output. The orchestrator
//! drops each source as soon as its pages are copied, so at most one decoded
//! source is alive per group.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

use crate::error::{InvoiceKitError, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 32;

/// Decode, copy and encode operations used by the merge pipeline.
pub trait DocumentCodec: Clone + Send + Sync + 'static {
    /// A decoded input document.
    type Source: Send;
    /// A document being assembled.
    type Output: Send;

    /// Decode `bytes`. `name` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceKitError::Decode`] if the payload is not a valid,
    /// unencrypted PDF with at least one page.
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Self::Source>;

    /// Pages in a decoded source.
    fn page_count(&self, source: &Self::Source) -> usize;

    /// Create an empty output document.
    fn create(&self) -> Self::Output;

    /// Append every page of `source` to `output` in document order.
    ///
    /// Returns the number of pages appended.
    fn append_pages(&self, output: &mut Self::Output, source: Self::Source) -> Result<usize>;

    /// Serialize `output`.
    fn encode(&self, output: Self::Output) -> Result<Vec<u8>>;
}

/// [`DocumentCodec`] backed by `lopdf`.
#[derive(Debug, Clone, Copy)]
pub struct LopdfCodec {
    compress: bool,
}

impl LopdfCodec {
    /// Create a codec that compresses streams on encode.
    pub fn new() -> Self {
        Self { compress: true }
    }

    /// Create a codec that writes streams as they were decoded.
    pub fn without_compression() -> Self {
        Self { compress: false }
    }
}

impl Default for LopdfCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Output document under construction.
///
/// Pages are re-parented under a single `Pages` node whose object id is
/// reserved up front. The node itself and the catalog are written on encode.
#[derive(Debug)]
pub struct PageAccumulator {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PageAccumulator {
    /// Pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }
}

impl DocumentCodec for LopdfCodec {
    type Source = Document;
    type Output = PageAccumulator;

    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Document> {
        let document =
            Document::load_mem(bytes).map_err(|e| InvoiceKitError::decode(name, e.to_string()))?;

        if document.is_encrypted() {
            return Err(InvoiceKitError::decode(name, "PDF is encrypted"));
        }
        if document.get_pages().is_empty() {
            return Err(InvoiceKitError::decode(name, "PDF has no pages"));
        }

        Ok(document)
    }

    fn page_count(&self, source: &Document) -> usize {
        source.get_pages().len()
    }

    fn create(&self) -> PageAccumulator {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        PageAccumulator {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn append_pages(&self, output: &mut PageAccumulator, mut source: Document) -> Result<usize> {
        source.renumber_objects_with(output.document.max_id + 1);

        // BTreeMap keyed by page number, so values come out in reading order.
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

        for &page_id in &page_ids {
            let inherited = inherited_attributes(&source, page_id);
            let page = source
                .get_dictionary_mut(page_id)
                .map_err(|e| InvoiceKitError::merge_failed(format!("Invalid page object: {e}")))?;

            for (key, value) in inherited {
                page.set(key, value);
            }
            page.set("Parent", Object::Reference(output.pages_id));
        }

        let source_max = source
            .objects
            .keys()
            .map(|(id, _)| *id)
            .max()
            .unwrap_or(source.max_id);

        output.document.objects.extend(source.objects);
        output.document.max_id = output.document.max_id.max(source_max);
        output
            .kids
            .extend(page_ids.iter().copied().map(Object::Reference));

        Ok(page_ids.len())
    }

    fn encode(&self, output: PageAccumulator) -> Result<Vec<u8>> {
        let PageAccumulator {
            mut document,
            pages_id,
            kids,
        } = output;

        if kids.is_empty() {
            return Err(InvoiceKitError::encode("document has no pages"));
        }

        let count = kids.len() as i64;
        let pages: Dictionary = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        };
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        // Old catalogs, page trees and outlines of the sources are unreachable now.
        document.prune_objects();
        document.renumber_objects();
        if self.compress {
            document.compress();
        }

        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .map_err(|e| InvoiceKitError::encode(e.to_string()))?;
        Ok(bytes)
    }
}

/// Attributes `page_id` lacks but inherits from an ancestor `Pages` node.
fn inherited_attributes(document: &Document, page_id: ObjectId) -> Vec<(&'static [u8], Object)> {
    let mut found = Vec::new();
    let Ok(page) = document.get_dictionary(page_id) else {
        return found;
    };

    let mut missing: Vec<&'static [u8]> = INHERITABLE_ATTRIBUTES
        .into_iter()
        .filter(|key| !page.has(key))
        .collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(node_id) = parent {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = document.get_dictionary(node_id) else {
            break;
        };

        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });

        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}
