//! End-to-end submission: fill both templates, merge, deliver, download

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use chrono::Local;
use referral_core::{
    apply_intake_defaults, consent_fields, consent_signatures, merged_file_name, referral_fields,
    validate_intake, IntakePayload, ReferralSummary,
};
use referral_pdf::{merge, TemplateId};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::handlers::{blocking, pdf_response};
use crate::state::AppState;

/// Tells the caller whether the email went out
pub const EMAIL_DELIVERY_HEADER: HeaderName = HeaderName::from_static("x-email-delivery");

/// Handler: POST /api/submit
///
/// The merged PDF is always returned; a failed email only changes the
/// delivery header.
pub async fn submit(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let mut payload = IntakePayload::from_slice(&body)?;
    let now = Local::now().naive_local();
    apply_intake_defaults(&mut payload, &state.profile, now);
    validate_intake(&payload, now.date())?;

    let referral_triples = referral_fields(&payload);
    let consent_triples = consent_fields(&payload, &state.ccu, now.date());
    let signatures = consent_signatures(&payload);

    let referral_store = state.templates.clone();
    let consent_store = state.templates.clone();
    let (referral, consent) = tokio::try_join!(
        blocking(move || referral_store.fill(TemplateId::Referral, &referral_triples, &[])),
        blocking(move || consent_store.fill(TemplateId::Consent, &consent_triples, &signatures)),
    )?;
    let merged = blocking(move || merge(&referral, &consent)).await?;

    let filename = merged_file_name(&payload);
    let summary = ReferralSummary::from_payload(&payload, now.date());
    let sent = state.delivery.send(&merged, &filename, &summary).await;
    if sent {
        info!(%filename, bytes = merged.len(), "Referral submitted");
    } else {
        warn!(%filename, "Referral generated but email delivery failed");
    }

    let delivery = HeaderValue::from_static(if sent { "sent" } else { "failed" });
    Ok(([(EMAIL_DELIVERY_HEADER, delivery)], pdf_response(merged, &filename)).into_response())
}
