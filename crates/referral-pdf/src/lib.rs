//! Referral PDF
//!
//! Fills the referral and consent AcroForm templates, draws signature
//! images, flattens the result and concatenates filled documents.

pub mod appearance;
pub mod error;
pub mod fill;
pub mod flatten;
pub mod form;
pub mod inspect;
pub mod merge;
mod objects;
pub mod signature;
pub mod template;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::PdfError;
pub use fill::fill;
pub use form::{FieldType, FillReport, FormDocument, FormField};
pub use inspect::{fields_csv, fields_skeleton, inspect_fields, FieldInfo};
pub use merge::{merge, merge_documents, page_count};
pub use template::{TemplateId, TemplateStore};
