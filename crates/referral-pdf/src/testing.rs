//! In-memory fillable PDFs for tests
//!
//! Page size and resources live on the page tree root so every fixture also
//! exercises attribute inheritance.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Checkbox,
    Signature,
}

#[derive(Debug, Clone)]
pub struct FixtureField {
    name: String,
    kind: Kind,
    page: usize,
    rect: [f32; 4],
    on_state: String,
    parent: Option<String>,
    multiline: bool,
    page_ref: bool,
}

impl FixtureField {
    fn new(name: &str, kind: Kind, page: usize, rect: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            page,
            rect,
            on_state: "Yes".to_string(),
            parent: None,
            multiline: false,
            page_ref: true,
        }
    }

    pub fn text(name: &str, page: usize, rect: [f32; 4]) -> Self {
        Self::new(name, Kind::Text, page, rect)
    }

    pub fn checkbox(name: &str, page: usize, rect: [f32; 4]) -> Self {
        Self::new(name, Kind::Checkbox, page, rect)
    }

    pub fn signature(name: &str, page: usize, rect: [f32; 4]) -> Self {
        Self::new(name, Kind::Signature, page, rect)
    }

    pub fn on_state(mut self, state: &str) -> Self {
        self.on_state = state.to_string();
        self
    }

    /// Nest under a non-terminal parent field that carries `/FT`
    pub fn under(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Leave out `/P` so the page must be found through `/Annots`
    pub fn without_page_ref(mut self) -> Self {
        self.page_ref = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FixtureForm {
    pages: usize,
    label: String,
    fields: Vec<FixtureField>,
}

impl FixtureForm {
    pub fn new(pages: usize) -> Self {
        Self {
            pages: pages.max(1),
            label: "Page".to_string(),
            fields: Vec::new(),
        }
    }

    /// Text drawn on each page as `<label> <n>`
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn field(mut self, field: FixtureField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        save(self.document(true))
    }

    pub fn build_without_acroform(&self) -> Vec<u8> {
        save(self.document(false))
    }

    fn document(&self, with_form: bool) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for n in 0..self.pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 760.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("{} {}", self.label, n + 1).into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().expect("encode fixture content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            page_ids.push(page_id);
        }

        let mut roots: Vec<Object> = Vec::new();
        let mut parents: Vec<(String, ObjectId, Vec<Object>, &'static str)> = Vec::new();
        let mut annots: Vec<Vec<Object>> = vec![Vec::new(); self.pages];

        if with_form {
            for field in &self.fields {
                let page_index = field.page.min(self.pages - 1);
                let page_id = page_ids[page_index];
                let dict = widget(&mut doc, field, page_id);
                let widget_id = doc.add_object(dict);
                annots[page_index].push(Object::Reference(widget_id));

                match &field.parent {
                    Some(parent) => {
                        let ft = field_type(field.kind);
                        match parents.iter_mut().find(|(name, ..)| name == parent) {
                            Some((_, parent_id, kids, _)) => {
                                kids.push(Object::Reference(widget_id));
                                set_parent(&mut doc, widget_id, *parent_id);
                            }
                            None => {
                                let parent_id = doc.new_object_id();
                                set_parent(&mut doc, widget_id, parent_id);
                                parents.push((
                                    parent.clone(),
                                    parent_id,
                                    vec![Object::Reference(widget_id)],
                                    ft,
                                ));
                                roots.push(Object::Reference(parent_id));
                            }
                        }
                        if let Ok(dict) = doc.get_dictionary_mut(widget_id) {
                            dict.remove(b"FT");
                        }
                    }
                    None => roots.push(Object::Reference(widget_id)),
                }
            }
            for (name, id, kids, ft) in parents {
                doc.objects.insert(
                    id,
                    Object::Dictionary(dictionary! {
                        "T" => Object::string_literal(name),
                        "FT" => ft,
                        "Kids" => kids,
                    }),
                );
            }
        }

        for (page_id, page_annots) in page_ids.iter().zip(annots) {
            if !page_annots.is_empty() {
                if let Ok(page) = doc.get_dictionary_mut(*page_id) {
                    page.set("Annots", page_annots);
                }
            }
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => self.pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => helvetica(),
                    },
                },
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if with_form {
            let acroform_id = doc.add_object(dictionary! {
                "Fields" => roots,
                "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
                "DR" => dictionary! {
                    "Font" => dictionary! {
                        "Helv" => helvetica(),
                    },
                },
            });
            catalog.set("AcroForm", acroform_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc
    }
}

fn helvetica() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    }
}

fn field_type(kind: Kind) -> &'static str {
    match kind {
        Kind::Text => "Tx",
        Kind::Checkbox => "Btn",
        Kind::Signature => "Sig",
    }
}

fn set_parent(doc: &mut Document, widget_id: ObjectId, parent_id: ObjectId) {
    if let Ok(dict) = doc.get_dictionary_mut(widget_id) {
        dict.set("Parent", parent_id);
    }
}

fn widget(doc: &mut Document, field: &FixtureField, page_id: ObjectId) -> Dictionary {
    let [x1, y1, x2, y2] = field.rect;
    let mut dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "T" => Object::string_literal(field.name.as_str()),
        "FT" => field_type(field.kind),
        "Rect" => vec![x1.into(), y1.into(), x2.into(), y2.into()],
        "F" => 4,
    };
    if field.page_ref {
        dict.set("P", page_id);
    }
    match field.kind {
        Kind::Text => {
            dict.set("DA", Object::string_literal("/Helv 0 Tf 0 g"));
            if field.multiline {
                dict.set("Ff", 1i64 << 12);
            }
        }
        Kind::Checkbox => {
            let (w, h) = (x2 - x1, y2 - y1);
            let on = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), w.into(), h.into()],
                },
                b"0 g 1 1 m 5 1 l 5 5 l f".to_vec(),
            ));
            let off = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), w.into(), h.into()],
                },
                Vec::new(),
            ));
            let mut normal = Dictionary::new();
            normal.set(field.on_state.as_str(), on);
            normal.set("Off", off);
            dict.set("AP", dictionary! { "N" => normal });
            dict.set("AS", "Off");
            dict.set("V", "Off");
        }
        Kind::Signature => {}
    }
    dict
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save fixture");
    buffer
}

/// Text shown with `Tj` across all content streams of a page, in order
pub fn page_texts(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let Ok(content) = doc.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&content) else {
        return Vec::new();
    };
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect()
}
