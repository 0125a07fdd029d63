//! Fill pipeline: apply triples, draw signatures, flatten, serialize

use referral_core::{FieldTriple, SignatureImage};
use tracing::info;

use crate::error::PdfError;
use crate::form::FormDocument;
use crate::template::{TemplateId, TemplateStore};

/// Fill a template held in memory. The result has no interactive fields.
pub fn fill(template: &[u8], triples: &[FieldTriple], signatures: &[SignatureImage]) -> Result<Vec<u8>, PdfError> {
    let mut form = FormDocument::load(template)?;
    let report = form.apply(triples)?;

    let mut signed = 0;
    for signature in signatures {
        signed += form.draw_signature(signature)?;
    }

    let drawn = form.flatten()?;
    info!(
        applied = report.applied,
        skipped = report.skipped.len(),
        signatures = signed,
        widgets = drawn,
        "Filled form"
    );
    form.save()
}

impl TemplateStore {
    /// Resolve, read and fill one template
    pub fn fill(
        &self,
        id: TemplateId,
        triples: &[FieldTriple],
        signatures: &[SignatureImage],
    ) -> Result<Vec<u8>, PdfError> {
        let template = self.read(id)?;
        fill(&template, triples, signatures).map_err(|e| match e {
            PdfError::MalformedDocument(msg) => {
                PdfError::MalformedDocument(format!("{} template: {}", id, msg))
            }
            other => other,
        })
    }
}
