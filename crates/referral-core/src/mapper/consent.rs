//! Consent for Referral and Release schema

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::NaiveDate;

use super::{FieldSet, FieldTriple};
use crate::ccu::{normalize_zip, CcuDirectory};
use crate::dates::format_mm_dd_yyyy;
use crate::payload::IntakePayload;

/// Client signature widget on the consent template
pub const CLIENT_SIGNATURE_FIELDS: &[&str] = &["Signature Block70_es_:signer:signatureblock"];

/// Agency signature widget on the consent template
pub const AGENCY_SIGNATURE_FIELDS: &[&str] = &["Signature Block71_es_:signer:signatureblock"];

/// Title printed under the agency signature
pub const AGENCY_REPRESENTATIVE_TITLE: &str = "Intake Team";

/// A decoded signature to draw into a signature field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    /// Candidate field names; the first one present in the template wins
    pub field_names: Vec<String>,
    /// PNG bytes
    pub png: Vec<u8>,
}

/// Map an intake payload onto the consent template
pub fn consent_fields(p: &IntakePayload, ccu: &CcuDirectory, today: NaiveDate) -> Vec<FieldTriple> {
    let zip = normalize_zip(&p.text("individual_zip"));
    let city_county = join_non_empty(&[p.text("individual_city"), p.text("individual_county")], ", ");
    let full_address = join_non_empty(&[p.text("individual_address"), city_county, zip.clone()], " ");

    let telephone = p.text("individual_phone");
    let cell = p.text_any(&["best_phone", "individual_phone"]);
    let date = match p.text("referral_date") {
        d if d.is_empty() => format_mm_dd_yyyy(today),
        d => d,
    };

    let mut f = FieldSet::new();
    f.text("client_Name", p.text("individual_name"));
    f.text("client_Address", full_address);
    f.text("client_Email", p.text("individual_email"));
    f.text("client_Telephone", telephone);
    f.text("client_Cell", cell);
    f.text("Reasons for Referral", p.text("reason_for_referral"));
    f.text("Date", date);
    f.text(
        "Title of the Agency Representative",
        AGENCY_REPRESENTATIVE_TITLE,
    );

    let outs = ccu.outputs_for_zip(&zip);
    f.text("CCU_Name", outs.name);
    f.text("CCU_contact", outs.contact);
    f.text("CCU_contact_2", outs.contact2);

    f.into_triples()
}

/// Signatures present in the payload. Data URLs that fail to decode are
/// treated as missing.
pub fn consent_signatures(p: &IntakePayload) -> Vec<SignatureImage> {
    [
        ("consent_client_signature", CLIENT_SIGNATURE_FIELDS),
        ("consent_agency_signature", AGENCY_SIGNATURE_FIELDS),
    ]
    .into_iter()
    .filter_map(|(key, fields)| {
        let png = data_url_to_bytes(&p.text(key))?;
        Some(SignatureImage {
            field_names: fields.iter().map(|s| s.to_string()).collect(),
            png,
        })
    })
    .collect()
}

/// Decode the payload part of a `data:` URL
pub fn data_url_to_bytes(data_url: &str) -> Option<Vec<u8>> {
    let (_, encoded) = data_url.split_once(',')?;
    let bytes = BASE64.decode(encoded.trim()).ok()?;
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

fn join_non_empty(parts: &[String], sep: &str) -> String {
    parts
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(sep)
}
