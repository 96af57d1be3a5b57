// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open, inspect and split existing PDF documents using the
// `lopdf` crate.

use std::collections::{BTreeMap, BTreeSet};

use convertdmc_core::error::{ConvertError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::{debug, info, instrument};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Reads and splits existing PDF files.
///
/// Wraps `lopdf::Document` and provides page inspection and single-page
/// extraction.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document =
            Document::load_mem(data).map_err(|err| ConvertError::decode("PDF document", err))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height in points of a page (1-indexed), from its effective
    /// /MediaBox.
    pub fn page_dimensions(&self, page_number: u32) -> Option<(f32, f32)> {
        let page_id = *self.document.get_pages().get(&page_number)?;
        let media_box = inherited_attributes(&self.document, page_id)
            .into_iter()
            .find(|(key, _)| key.as_slice() == b"MediaBox")
            .map(|(_, value)| value)?;

        let corners = match resolve(&self.document, &media_box)? {
            Object::Array(values) if values.len() == 4 => values
                .iter()
                .map(|value| resolve(&self.document, value).and_then(number))
                .collect::<Option<Vec<f32>>>()?,
            _ => return None,
        };

        Some((
            (corners[2] - corners[0]).abs(),
            (corners[3] - corners[1]).abs(),
        ))
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract a single page (1-indexed) into a new standalone PDF document.
    ///
    /// The output is built from scratch: a fresh catalog and page tree holding
    /// a copy of the page (with inherited attributes flattened onto it) and
    /// only the objects it references. References to other pages, such as
    /// link destinations, become null.
    #[instrument(skip(self))]
    pub fn extract_page(&self, page_number: u32) -> Result<Vec<u8>> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            ConvertError::decode(
                "PDF document",
                format!(
                    "page {} out of range (document has {} pages)",
                    page_number,
                    pages.len()
                ),
            )
        })?;

        let page_err =
            |err: lopdf::Error| ConvertError::encode("PDF document", format!("page {page_number}: {err}"));

        let mut page = self.document.get_dictionary(page_id).map_err(page_err)?.clone();
        for (key, value) in inherited_attributes(&self.document, page_id) {
            if !page.has(&key) {
                page.set(key, value);
            }
        }

        let mut single = Document::with_version(self.document.version.clone());
        let pages_id = single.new_object_id();
        let new_page_id = single.new_object_id();

        let mut copier = PageCopier {
            source: &self.document,
            target: &mut single,
            copied: BTreeMap::from([(page_id, new_page_id)]),
            other_pages: pages.values().copied().filter(|id| *id != page_id).collect(),
        };
        let mut page = copier.copy_dictionary(&page);
        let copied = copier.copied.len();
        page.set("Parent", Object::Reference(pages_id));

        single.objects.insert(new_page_id, Object::Dictionary(page));
        single.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(new_page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = single.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        single.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        single.save_to(&mut output).map_err(|err| page_err(err.into()))?;

        debug!(
            page_number,
            copied,
            output_bytes = output.len(),
            "Page extracted"
        );
        Ok(output)
    }

    /// Split the document into one single-page PDF per page, in page order.
    #[instrument(skip(self))]
    pub fn split_pages(&self) -> Result<Vec<Vec<u8>>> {
        let page_numbers: Vec<u32> = self.document.get_pages().keys().copied().collect();
        info!(pages = page_numbers.len(), "Splitting PDF");

        page_numbers
            .into_iter()
            .map(|page_number| self.extract_page(page_number))
            .collect()
    }
}

// -- Helpers ------------------------------------------------------------------

/// Deep-copies objects reachable from one page into another document.
struct PageCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    /// Source id to target id, for objects already copied or reserved.
    copied: BTreeMap<ObjectId, ObjectId>,
    /// Pages that must not be pulled in through a reference.
    other_pages: BTreeSet<ObjectId>,
}

impl PageCopier<'_> {
    fn copy(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Array(items) => Object::Array(items.iter().map(|item| self.copy(item)).collect()),
            Object::Stream(stream) => {
                let mut stream = stream.clone();
                stream.dict = self.copy_dictionary(&stream.dict);
                Object::Stream(stream)
            }
            other => other.clone(),
        }
    }

    /// Copy every entry except /Parent, which would lead back up the source tree.
    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy(value));
        }
        copy
    }

    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if let Some(new_id) = self.copied.get(&id) {
            return Object::Reference(*new_id);
        }
        if self.other_pages.contains(&id) {
            return Object::Null;
        }
        let Ok(object) = self.source.get_object(id) else {
            debug!(?id, "Dangling reference dropped");
            return Object::Null;
        };

        // Reserve the id first so cycles resolve to it.
        let new_id = self.target.new_object_id();
        self.copied.insert(id, new_id);
        let copy = self.copy(object);
        self.target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}


/// The inheritable attributes in effect for `page_id`: the page's own values
/// first, then the nearest ancestor's for anything the page does not set.
fn inherited_attributes(document: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(node_id) = current {
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = document.get_dictionary(node_id) else {
            break;
        };
        collect_missing(node, &mut found);
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}

fn collect_missing(node: &Dictionary, found: &mut Vec<(Vec<u8>, Object)>) {
    for key in INHERITABLE {
        if found.iter().any(|(existing, _)| existing.as_slice() == key) {
            continue;
        }
        if let Ok(value) = node.get(key) {
            found.push((key.to_vec(), value.clone()));
        }
    }
}

/// Follow a single indirect reference.
fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}
