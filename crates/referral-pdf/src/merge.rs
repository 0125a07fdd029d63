//! PDF Merge algorithm
//!
//! Concatenates the pages of several PDFs into one new document. Field
//! structure is not inspected; inputs are expected to be flattened.

use std::collections::BTreeMap;

use lopdf::{dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::PdfError;
use crate::objects::inherited_attribute;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// All pages of `first`, then all pages of `second`
pub fn merge(first: &[u8], second: &[u8]) -> Result<Vec<u8>, PdfError> {
    merge_documents(vec![first.to_vec(), second.to_vec()])
}

/// Merge multiple PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. Create a new destination document with an empty page tree
/// 3. For each source document:
///    a. Copy inherited page attributes onto each page
///    b. Import all objects with ids shifted past the destination's
///    c. Re-parent its pages under the new page tree, in order
/// 4. Drop the sources' old catalogs and page trees, compress, serialize
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfError> {
    if documents.is_empty() {
        return Err(PdfError::Operation("No documents to merge".into()));
    }

    let mut sources = Vec::with_capacity(documents.len());
    for (i, bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(bytes).map_err(|e| {
            PdfError::MalformedDocument(format!("Failed to load document {}: {}", i, e))
        })?;
        sources.push(doc);
    }

    let mut dest = Document::with_version("1.7");
    let pages_id = dest.new_object_id();
    let mut kids: Vec<ObjectId> = Vec::new();

    for mut source in sources {
        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
        materialize_inherited(&mut source, &source_pages)?;

        let offset = dest.max_id;
        for (old_id, object) in std::mem::take(&mut source.objects) {
            dest.objects
                .insert((old_id.0 + offset, old_id.1), remap_object_refs(object, offset));
        }

        for old_page in source_pages {
            let page_id = (old_page.0 + offset, old_page.1);
            dest.get_dictionary_mut(page_id)?
                .set("Parent", Object::Reference(pages_id));
            kids.push(page_id);
        }

        dest.max_id = offset + source.max_id;
    }

    let count = kids.len();
    dest.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => count as i64,
        }),
    );
    let catalog_id = dest.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    dest.trailer.set("Root", Object::Reference(catalog_id));

    dest.prune_objects();
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfError::Serialization(format!("Failed to save merged PDF: {}", e)))?;

    debug!(documents = documents.len(), pages = count, bytes = buffer.len(), "Merged PDFs");
    Ok(buffer)
}

/// Number of pages in a serialized PDF
pub fn page_count(bytes: &[u8]) -> Result<usize, PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::MalformedDocument(e.to_string()))?;
    Ok(doc.get_pages().len())
}

/// Copy attributes the pages inherit from their page tree onto the pages
/// themselves, so they survive leaving that tree
fn materialize_inherited(doc: &mut Document, pages: &[ObjectId]) -> Result<(), PdfError> {
    for &page_id in pages {
        let mut inherited: BTreeMap<&[u8], Object> = BTreeMap::new();
        {
            let page = doc.get_dictionary(page_id)?;
            for &key in INHERITABLE {
                if page.has(key) {
                    continue;
                }
                if let Some(value) = inherited_attribute(doc, page_id, key) {
                    inherited.insert(key, value);
                }
            }
        }
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
    Ok(())
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
