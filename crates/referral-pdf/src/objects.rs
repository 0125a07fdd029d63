//! Small lopdf helpers shared by the filler, flattener and merger

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfError;

/// Follow a single level of indirection
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Dictionary entry, dereferenced
pub(crate) fn get_resolved<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|o| resolve(doc, o))
}

pub(crate) fn get_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    get_resolved(doc, dict, key).and_then(|o| o.as_dict().ok())
}

/// References listed in an array entry (e.g. `/Kids`, `/Annots`)
pub(crate) fn get_refs(doc: &Document, dict: &Dictionary, key: &[u8]) -> Vec<ObjectId> {
    match get_resolved(doc, dict, key) {
        Some(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Vec<u8>> {
    get_resolved(doc, dict, key)
        .and_then(|o| o.as_name().ok())
        .map(|n| n.to_vec())
}

pub(crate) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    get_resolved(doc, dict, key).and_then(|o| o.as_float().ok())
}

pub(crate) fn get_text(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match get_resolved(doc, dict, key)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Array(items) => items.iter().find_map(|o| match resolve(doc, o) {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }),
        _ => None,
    }
}

/// Four numbers as `[llx, lly, urx, ury]`, normalized so that ll < ur
pub(crate) fn get_rect(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<[f32; 4]> {
    let Some(Object::Array(items)) = get_resolved(doc, dict, key) else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }
    let mut n = [0.0f32; 4];
    for (slot, item) in n.iter_mut().zip(items) {
        *slot = resolve(doc, item).as_float().ok()?;
    }
    Some([
        n[0].min(n[2]),
        n[1].min(n[3]),
        n[0].max(n[2]),
        n[1].max(n[3]),
    ])
}

/// PDF text strings are PDFDocEncoding or UTF-16BE with a BOM
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

pub(crate) fn encode_text_string(text: &str) -> Vec<u8> {
    if text.chars().all(|c| (c as u32) < 0x100) {
        text.chars().map(|c| c as u8).collect()
    } else {
        let mut out = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        out
    }
}

pub(crate) fn rect_array(rect: [f32; 4]) -> Object {
    Object::Array(rect.iter().map(|&v| Object::Real(v)).collect())
}

/// Page that carries a widget: `/P`, else the page listing it in `/Annots`,
/// else the first page
pub(crate) fn page_for_widget(
    doc: &Document,
    pages: &BTreeMap<u32, ObjectId>,
    widget_id: ObjectId,
) -> Option<ObjectId> {
    let widget = doc.get_dictionary(widget_id).ok()?;
    if let Ok(Object::Reference(page_id)) = widget.get(b"P") {
        if pages.values().any(|id| id == page_id) {
            return Some(*page_id);
        }
    }
    pages
        .values()
        .copied()
        .find(|&page_id| {
            doc.get_dictionary(page_id)
                .map(|page| get_refs(doc, page, b"Annots").contains(&widget_id))
                .unwrap_or(false)
        })
        .or_else(|| pages.values().next().copied())
}

/// Page attribute looked up through the `/Parent` chain
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        if let Some(value) = get_resolved(doc, dict, key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
        depth += 1;
        if depth > 64 {
            return None;
        }
    }
    None
}

/// Register an XObject under `name` in the page's own resource dictionary.
/// Inherited or indirect resources are copied onto the page first.
pub(crate) fn add_xobject_resource(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    xobject_id: ObjectId,
) -> Result<(), PdfError> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    let mut xobjects = get_dict(doc, &resources, b"XObject")
        .cloned()
        .unwrap_or_default();
    xobjects.set(name, Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Draw `content` on top of the page. Existing content is wrapped in
/// `q`/`Q` so its graphics state cannot leak into the overlay.
pub(crate) fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), PdfError> {
    let existing: Vec<Object> = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let push_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut overlay = b"\nQ\n".to_vec();
    overlay.extend_from_slice(&content);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(push_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Content operators placing a form or image XObject with the given matrix
pub(crate) fn draw_xobject_ops(name: &str, matrix: [f32; 6]) -> Vec<u8> {
    format!(
        "q\n{} {} {} {} {} {} cm\n/{} Do\nQ\n",
        fmt_num(matrix[0]),
        fmt_num(matrix[1]),
        fmt_num(matrix[2]),
        fmt_num(matrix[3]),
        fmt_num(matrix[4]),
        fmt_num(matrix[5]),
        name
    )
    .into_bytes()
}

fn fmt_num(v: f32) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
