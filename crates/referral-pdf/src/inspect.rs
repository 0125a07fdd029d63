//! Template inspection: list every field a fillable PDF exposes

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PdfError;
use crate::form::{FieldType, FormDocument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: FieldType,
    pub widgets: usize,
}

/// Fields in document order
pub fn inspect_fields(bytes: &[u8]) -> Result<Vec<FieldInfo>, PdfError> {
    let form = FormDocument::load(bytes)?;
    Ok(form
        .fields()
        .iter()
        .map(|f| FieldInfo {
            name: f.name.clone(),
            field_type: f.field_type,
            widgets: f.widgets.len(),
        })
        .collect())
}

/// `name,type` lines with a header, names quoted when needed
pub fn fields_csv(fields: &[FieldInfo]) -> String {
    let mut out = String::from("name,type\n");
    for field in fields {
        let name = if field.name.contains([',', '"', '\n']) {
            format!("\"{}\"", field.name.replace('"', "\"\""))
        } else {
            field.name.clone()
        };
        out.push_str(&format!("{},{}\n", name, field.field_type.as_str()));
    }
    out
}

/// Empty payload-shaped object: `false` for checkboxes, `""` for everything
/// else (radio groups take one of their option names)
pub fn fields_skeleton(fields: &[FieldInfo]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|f| {
            let empty = match f.field_type {
                FieldType::Checkbox => Value::Bool(false),
                _ => Value::String(String::new()),
            };
            (f.name.clone(), empty)
        })
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureField, FixtureForm};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Vec<FieldInfo> {
        let bytes = FixtureForm::new(1)
            .field(FixtureField::text("Name_2", 0, [0.0, 0.0, 100.0, 20.0]))
            .field(FixtureField::checkbox("Mil_Yes", 0, [0.0, 30.0, 10.0, 40.0]))
            .field(FixtureField::signature("Signature Block70_es_:signer:signatureblock", 0, [0.0, 50.0, 100.0, 80.0]))
            .build();
        inspect_fields(&bytes).unwrap()
    }

    #[test]
    fn test_inspect_lists_fields_with_types() {
        let fields = sample();
        let summary: Vec<(&str, FieldType)> = fields
            .iter()
            .map(|f| (f.name.as_str(), f.field_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Name_2", FieldType::Text),
                ("Mil_Yes", FieldType::Checkbox),
                ("Signature Block70_es_:signer:signatureblock", FieldType::Signature),
            ]
        );
    }

    #[test]
    fn test_csv_output() {
        assert_eq!(
            fields_csv(&sample()),
            "name,type\nName_2,text\nMil_Yes,checkbox\nSignature Block70_es_:signer:signatureblock,signature\n"
        );
    }

    #[test]
    fn test_csv_quotes_commas() {
        let fields = vec![FieldInfo {
            name: "City, State".into(),
            field_type: FieldType::Text,
            widgets: 1,
        }];
        assert_eq!(fields_csv(&fields), "name,type\n\"City, State\",text\n");
    }

    #[test]
    fn test_skeleton() {
        let skeleton = fields_skeleton(&sample());
        assert_eq!(skeleton["Name_2"], json!(""));
        assert_eq!(skeleton["Mil_Yes"], json!(false));
    }
}
