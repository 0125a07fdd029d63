//! Editable AcroForm view over a parsed template
//!
//! Fields are collected by walking `/AcroForm /Fields` recursively. Names
//! are fully qualified (`parent.child`), `/FT` and `/Ff` are inherited from
//! ancestors, and widgets are either the terminal field itself or its
//! nameless kids.

use std::collections::{HashMap, HashSet};

use lopdf::{Document, Object, ObjectId, StringFormat};
use referral_core::{FieldTriple, FieldValue};
use serde::Serialize;
use tracing::debug;

use crate::error::PdfError;
use crate::objects::{decode_text_string, encode_text_string, get_dict, get_name, get_refs, resolve};

pub const FLAG_MULTILINE: i64 = 1 << 12;
const FLAG_RADIO: i64 = 1 << 15;
const FLAG_PUSHBUTTON: i64 = 1 << 16;

/// Widget appearance state for an unchecked box
pub const OFF_STATE: &[u8] = b"Off";
const DEFAULT_ON_STATE: &[u8] = b"Yes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Checkbox,
    Radio,
    PushButton,
    Choice,
    Signature,
    Unknown,
}

impl FieldType {
    fn from_ft(ft: Option<&[u8]>, flags: i64) -> Self {
        match ft {
            Some(b"Tx") => FieldType::Text,
            Some(b"Btn") if flags & FLAG_PUSHBUTTON != 0 => FieldType::PushButton,
            Some(b"Btn") if flags & FLAG_RADIO != 0 => FieldType::Radio,
            Some(b"Btn") => FieldType::Checkbox,
            Some(b"Ch") => FieldType::Choice,
            Some(b"Sig") => FieldType::Signature,
            _ => FieldType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::PushButton => "button",
            FieldType::Choice => "choice",
            FieldType::Signature => "signature",
            FieldType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub id: ObjectId,
    pub field_type: FieldType,
    pub flags: i64,
    pub widgets: Vec<ObjectId>,
}

/// Outcome of applying a batch of triples
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FillReport {
    pub applied: usize,
    pub skipped: Vec<String>,
}

pub struct FormDocument {
    pub(crate) doc: Document,
    pub(crate) fields: Vec<FormField>,
    pub(crate) index: HashMap<String, usize>,
}

#[derive(Clone, Default)]
struct Inherited {
    name: Option<String>,
    ft: Option<Vec<u8>>,
    flags: Option<i64>,
}

impl FormDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::MalformedDocument(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        let fields = collect_fields(&doc);
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self { doc, fields, index }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Write `/V` on a text or choice field. Returns false when the field is
    /// missing or of another kind.
    pub fn set_text(&mut self, name: &str, value: &str) -> Result<bool, PdfError> {
        let Some(field) = self.field(name) else {
            return Ok(false);
        };
        if !matches!(field.field_type, FieldType::Text | FieldType::Choice) {
            return Ok(false);
        }
        let id = field.id;
        self.doc.get_dictionary_mut(id)?.set(
            "V",
            Object::String(encode_text_string(value), StringFormat::Literal),
        );
        Ok(true)
    }

    /// Check or uncheck a checkbox. Each widget's `/AS` is set to its own
    /// on-state (from `/AP /N`) or `Off`.
    pub fn set_checkbox(&mut self, name: &str, on: bool) -> Result<bool, PdfError> {
        let Some(field) = self.field(name) else {
            return Ok(false);
        };
        if field.field_type != FieldType::Checkbox {
            return Ok(false);
        }
        let id = field.id;
        let widgets = field.widgets.clone();

        let mut value = OFF_STATE.to_vec();
        for widget in widgets {
            let state = if on {
                self.on_state(widget)
            } else {
                OFF_STATE.to_vec()
            };
            if on && value == OFF_STATE {
                value = state.clone();
            }
            self.doc
                .get_dictionary_mut(widget)?
                .set("AS", Object::Name(state));
        }
        self.doc
            .get_dictionary_mut(id)?
            .set("V", Object::Name(value));
        Ok(true)
    }

    /// First appearance state of the widget other than `Off`
    pub fn on_state(&self, widget: ObjectId) -> Vec<u8> {
        self.doc
            .get_dictionary(widget)
            .ok()
            .and_then(|w| get_dict(&self.doc, w, b"AP"))
            .and_then(|ap| get_dict(&self.doc, ap, b"N"))
            .and_then(|n| {
                n.iter()
                    .map(|(k, _)| k.clone())
                    .find(|k| k.as_slice() != OFF_STATE)
            })
            .unwrap_or_else(|| DEFAULT_ON_STATE.to_vec())
    }

    /// Apply every triple in order. Unknown names and kind mismatches are
    /// skipped silently.
    pub fn apply(&mut self, triples: &[FieldTriple]) -> Result<FillReport, PdfError> {
        let mut report = FillReport::default();
        for triple in triples {
            let applied = match &triple.value {
                FieldValue::Text(text) => self.set_text(&triple.name, text)?,
                FieldValue::Checked(on) => self.set_checkbox(&triple.name, *on)?,
            };
            if applied {
                report.applied += 1;
            } else {
                report.skipped.push(triple.name.clone());
            }
        }
        if !report.skipped.is_empty() {
            debug!(
                applied = report.applied,
                skipped = report.skipped.len(),
                "Some mapped fields are not in the template"
            );
        }
        Ok(report)
    }

    /// Current text value of a field
    pub fn text_value(&self, name: &str) -> Option<String> {
        let field = self.field(name)?;
        let dict = self.doc.get_dictionary(field.id).ok()?;
        match resolve(&self.doc, dict.get(b"V").ok()?) {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    }

    /// Whether a checkbox's value is an on-state
    pub fn is_checked(&self, name: &str) -> Option<bool> {
        let field = self.field(name)?;
        let dict = self.doc.get_dictionary(field.id).ok()?;
        let value = get_name(&self.doc, dict, b"V")?;
        Some(value != OFF_STATE)
    }

    pub fn save(mut self) -> Result<Vec<u8>, PdfError> {
        self.doc.prune_objects();
        self.doc.compress();
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Serialization(e.to_string()))?;
        Ok(buffer)
    }
}

pub(crate) fn acroform_dict(doc: &Document) -> Option<&lopdf::Dictionary> {
    let catalog = doc.catalog().ok()?;
    get_dict(doc, catalog, b"AcroForm")
}

fn collect_fields(doc: &Document) -> Vec<FormField> {
    let Some(acroform) = acroform_dict(doc) else {
        return Vec::new();
    };
    let mut fields = Vec::new();
    let mut visited = HashSet::new();
    for id in get_refs(doc, acroform, b"Fields") {
        walk(doc, id, &Inherited::default(), &mut fields, &mut visited);
    }
    fields
}

fn walk(
    doc: &Document,
    id: ObjectId,
    inherited: &Inherited,
    out: &mut Vec<FormField>,
    visited: &mut HashSet<ObjectId>,
) {
    if !visited.insert(id) {
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        return;
    };

    let partial = match dict.get(b"T").map(|o| resolve(doc, o)) {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    };
    let name = match (&inherited.name, partial) {
        (Some(parent), Some(t)) => Some(format!("{}.{}", parent, t)),
        (None, Some(t)) => Some(t),
        (parent, None) => parent.clone(),
    };
    let ft = get_name(doc, dict, b"FT").or_else(|| inherited.ft.clone());
    let flags = dict
        .get(b"Ff")
        .ok()
        .and_then(|o| resolve(doc, o).as_i64().ok())
        .or(inherited.flags);

    let kids = get_refs(doc, dict, b"Kids");
    let field_kids: Vec<ObjectId> = kids
        .iter()
        .copied()
        .filter(|kid| {
            doc.get_dictionary(*kid)
                .map(|d| d.has(b"T"))
                .unwrap_or(false)
        })
        .collect();

    if !field_kids.is_empty() {
        let next = Inherited { name, ft, flags };
        for kid in field_kids {
            walk(doc, kid, &next, out, visited);
        }
        return;
    }

    let Some(name) = name else {
        return;
    };
    let flags = flags.unwrap_or(0);
    out.push(FormField {
        name,
        id,
        field_type: FieldType::from_ft(ft.as_deref(), flags),
        flags,
        widgets: if kids.is_empty() { vec![id] } else { kids },
    });
}
