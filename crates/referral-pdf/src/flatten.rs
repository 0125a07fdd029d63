//! Form flattening
//!
//! Every visible widget's appearance is drawn into its page as a form
//! XObject, widget annotations are dropped from `/Annots`, and `/AcroForm`
//! is removed from the catalog.

use std::collections::{BTreeMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::appearance::{check_appearance, font_size_from_da, text_appearance, Quadding, TextStyle};
use crate::error::PdfError;
use crate::form::{acroform_dict, FieldType, FormDocument, FormField, FLAG_MULTILINE, OFF_STATE};
use crate::objects::{
    add_xobject_resource, append_page_content, draw_xobject_ops, get_dict, get_name, get_rect,
    get_resolved, get_text, page_for_widget,
};

const ANNOT_HIDDEN: i64 = 1 << 1;

enum Appearance {
    Existing(ObjectId),
    Generated(Stream),
}

impl FormDocument {
    /// Flatten the form in place. Returns the number of widgets drawn.
    pub fn flatten(&mut self) -> Result<usize, PdfError> {
        let pages = self.doc.get_pages();
        let default_da = acroform_dict(&self.doc)
            .and_then(|a| get_text(&self.doc, a, b"DA"))
            .unwrap_or_default();

        let fields = std::mem::take(&mut self.fields);
        self.index.clear();

        let mut widget_ids = HashSet::new();
        let mut overlays: BTreeMap<ObjectId, Vec<u8>> = BTreeMap::new();
        let mut drawn = 0;

        for field in &fields {
            for &widget in &field.widgets {
                widget_ids.insert(widget);
                let Some(rect) = visible_rect(&self.doc, widget) else {
                    continue;
                };
                let Some(appearance) = self.appearance_for(field, widget, rect, &default_da)? else {
                    continue;
                };
                let Some(page_id) = page_for_widget(&self.doc, &pages, widget) else {
                    continue;
                };

                let xobject = match appearance {
                    Appearance::Existing(id) => id,
                    Appearance::Generated(stream) => self.doc.add_object(stream),
                };
                let matrix = placement_matrix(&self.doc, xobject, rect);
                let name = format!("Fx{}", xobject.0);
                add_xobject_resource(&mut self.doc, page_id, &name, xobject)?;
                overlays
                    .entry(page_id)
                    .or_default()
                    .extend(draw_xobject_ops(&name, matrix));
                drawn += 1;
            }
        }

        for (page_id, content) in overlays {
            append_page_content(&mut self.doc, page_id, content)?;
        }
        remove_widget_annotations(&mut self.doc, &pages, &widget_ids)?;
        self.doc.catalog_mut()?.remove(b"AcroForm");

        debug!(fields = fields.len(), widgets = drawn, "Flattened form");
        Ok(drawn)
    }

    fn appearance_for(
        &self,
        field: &FormField,
        widget: ObjectId,
        rect: [f32; 4],
        default_da: &str,
    ) -> Result<Option<Appearance>, PdfError> {
        let doc = &self.doc;
        let widget_dict = doc.get_dictionary(widget)?;
        let field_dict = doc.get_dictionary(field.id)?;
        let (width, height) = (rect[2] - rect[0], rect[3] - rect[1]);

        let appearance = match field.field_type {
            FieldType::Text | FieldType::Choice => {
                let value = get_text(doc, field_dict, b"V").unwrap_or_default();
                if value.is_empty() {
                    return Ok(None);
                }
                let da = get_text(doc, widget_dict, b"DA")
                    .or_else(|| get_text(doc, field_dict, b"DA"))
                    .unwrap_or_else(|| default_da.to_string());
                let q = [widget_dict, field_dict]
                    .iter()
                    .find_map(|d| get_resolved(doc, d, b"Q").and_then(|o| o.as_i64().ok()));
                let style = TextStyle {
                    font_size: font_size_from_da(&da),
                    quadding: Quadding::from_q(q),
                    multiline: field.flags & FLAG_MULTILINE != 0,
                };
                Some(Appearance::Generated(text_appearance(width, height, &value, &style)?))
            }
            FieldType::Checkbox | FieldType::Radio => {
                let Some(state) = get_name(doc, widget_dict, b"AS") else {
                    return Ok(None);
                };
                match existing_appearance(doc, widget_dict, Some(&state)) {
                    Some(id) => Some(Appearance::Existing(id)),
                    None if state != OFF_STATE => {
                        Some(Appearance::Generated(check_appearance(width, height)?))
                    }
                    None => None,
                }
            }
            _ => {
                let state = get_name(doc, widget_dict, b"AS");
                existing_appearance(doc, widget_dict, state.as_deref()).map(Appearance::Existing)
            }
        };
        Ok(appearance)
    }
}

/// Widget rectangle, or `None` for hidden and zero-sized widgets
fn visible_rect(doc: &Document, widget: ObjectId) -> Option<[f32; 4]> {
    let dict = doc.get_dictionary(widget).ok()?;
    let flags = get_resolved(doc, dict, b"F")
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0);
    if flags & ANNOT_HIDDEN != 0 {
        return None;
    }
    let rect = get_rect(doc, dict, b"Rect")?;
    (rect[2] > rect[0] && rect[3] > rect[1]).then_some(rect)
}

/// Normal appearance stream for the widget: `/AP /N` itself when it is a
/// stream, otherwise the entry for `state`
fn existing_appearance(doc: &Document, widget: &Dictionary, state: Option<&[u8]>) -> Option<ObjectId> {
    let ap = get_dict(doc, widget, b"AP")?;
    match ap.get(b"N").ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => Some(*id),
            Object::Dictionary(states) => states.get(state?).ok()?.as_reference().ok(),
            _ => None,
        },
        Object::Dictionary(states) => states.get(state?).ok()?.as_reference().ok(),
        _ => None,
    }
}

/// Map the appearance's `/BBox` onto the widget rectangle
fn placement_matrix(doc: &Document, xobject: ObjectId, rect: [f32; 4]) -> [f32; 6] {
    let (width, height) = (rect[2] - rect[0], rect[3] - rect[1]);
    let bbox = doc
        .get_object(xobject)
        .ok()
        .and_then(|o| o.as_stream().ok())
        .and_then(|s| get_rect(doc, &s.dict, b"BBox"))
        .filter(|b| b[2] > b[0] && b[3] > b[1])
        .unwrap_or([0.0, 0.0, width, height]);
    let sx = width / (bbox[2] - bbox[0]);
    let sy = height / (bbox[3] - bbox[1]);
    [sx, 0.0, 0.0, sy, rect[0] - bbox[0] * sx, rect[1] - bbox[1] * sy]
}

fn is_widget(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype").and_then(|o| o.as_name()), Ok(b"Widget"))
}

fn remove_widget_annotations(
    doc: &mut Document,
    pages: &BTreeMap<u32, ObjectId>,
    widget_ids: &HashSet<ObjectId>,
) -> Result<(), PdfError> {
    for &page_id in pages.values() {
        let annots = {
            let page = doc.get_dictionary(page_id)?;
            match get_resolved(doc, page, b"Annots") {
                Some(Object::Array(items)) => items.clone(),
                _ => continue,
            }
        };
        let kept: Vec<Object> = annots
            .into_iter()
            .filter(|annot| match annot {
                Object::Reference(id) => {
                    !widget_ids.contains(id)
                        && !doc.get_dictionary(*id).map(is_widget).unwrap_or(false)
                }
                Object::Dictionary(dict) => !is_widget(dict),
                _ => true,
            })
            .collect();

        let page = doc.get_dictionary_mut(page_id)?;
        if kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", kept);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page_texts, FixtureField, FixtureForm};
    use pretty_assertions::assert_eq;
    use lopdf::dictionary;

    fn fixture() -> Vec<u8> {
        FixtureForm::new(2)
            .field(FixtureField::text("Name_2", 0, [50.0, 700.0, 300.0, 720.0]))
            .field(FixtureField::text("Notes", 1, [50.0, 500.0, 300.0, 600.0]).multiline())
            .field(FixtureField::checkbox("Mil_Yes", 0, [50.0, 650.0, 62.0, 662.0]))
            .field(FixtureField::checkbox("Mil_No", 0, [80.0, 650.0, 92.0, 662.0]))
            .field(FixtureField::text("Empty", 0, [50.0, 600.0, 300.0, 620.0]))
            .build()
    }

    fn flattened(form: FormDocument) -> Document {
        Document::load_mem(&form.save().unwrap()).unwrap()
    }

    #[test]
    fn test_flatten_removes_form_and_widgets() {
        let mut form = FormDocument::load(&fixture()).unwrap();
        form.set_text("Name_2", "Jane Smith").unwrap();
        form.set_checkbox("Mil_No", true).unwrap();
        form.flatten().unwrap();
        assert!(form.fields().is_empty());

        let doc = flattened(form);
        assert!(doc.catalog().unwrap().get(b"AcroForm").is_err());
        for page_id in doc.get_pages().values() {
            assert!(doc.get_dictionary(*page_id).unwrap().get(b"Annots").is_err());
        }
    }

    #[test]
    fn test_flatten_draws_only_filled_and_checked() {
        let mut form = FormDocument::load(&fixture()).unwrap();
        form.set_text("Name_2", "Jane Smith").unwrap();
        form.set_text("Notes", "Line one\nLine two").unwrap();
        form.set_checkbox("Mil_No", true).unwrap();
        form.set_checkbox("Mil_Yes", false).unwrap();
        // Name_2, Notes, Mil_No (on) and Mil_Yes (its empty Off appearance)
        assert_eq!(form.flatten().unwrap(), 4);
    }

    #[test]
    fn test_page_content_keeps_original_text() {
        let mut form = FormDocument::load(&fixture()).unwrap();
        form.set_text("Name_2", "Jane Smith").unwrap();
        form.flatten().unwrap();
        let doc = flattened(form);
        let first = *doc.get_pages().get(&1).unwrap();
        assert_eq!(page_texts(&doc, first), vec!["Page 1".to_string()]);

        let page = doc.get_dictionary(first).unwrap();
        let resources = get_dict(&doc, page, b"Resources").unwrap();
        let xobjects = get_dict(&doc, resources, b"XObject").unwrap();
        // Name_2 plus the Off appearances of both checkboxes
        assert_eq!(xobjects.len(), 3);
        assert!(get_dict(&doc, resources, b"Font").is_some());
    }

    #[test]
    fn test_placement_scales_bbox_to_rect() {
        let mut doc = Document::with_version("1.7");
        let id = doc.add_object(Stream::new(
            lopdf::dictionary! {
                "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
            },
            Vec::new(),
        ));
        assert_eq!(
            placement_matrix(&doc, id, [100.0, 200.0, 120.0, 205.0]),
            [2.0, 0.0, 0.0, 0.5, 100.0, 200.0]
        );
    }
}
