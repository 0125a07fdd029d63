//! HTTP handlers for the fill, email and lead endpoints

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Local;
use referral_core::demo::{consent_demo, referral_demo};
use referral_core::{
    consent_fields, consent_signatures, referral_fields, FieldTriple, IntakePayload,
    ReferralSummary, SignatureImage,
};
use referral_mail::{compose_referral_email, DEFAULT_ATTACHMENT_NAME};
use referral_pdf::{PdfError, TemplateId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::lead::Lead;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "referral-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct DemoQuery {
    pub demo: Option<String>,
}

/// Run a PDF job on the blocking pool
pub(crate) async fn blocking<T, F>(job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PdfError> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(job).await??)
}

async fn fill_template(
    state: &AppState,
    id: TemplateId,
    triples: Vec<FieldTriple>,
    signatures: Vec<SignatureImage>,
) -> Result<Vec<u8>, ApiError> {
    let store = state.templates.clone();
    blocking(move || store.fill(id, &triples, &signatures)).await
}

/// `application/pdf` download response
pub(crate) fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// Handler: POST /api/fill-referral
pub async fn fill_referral(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = IntakePayload::from_slice(&body)?;
    render_referral(&state, &payload).await
}

/// Handler: GET /api/fill-referral?demo=1
pub async fn fill_referral_demo(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DemoQuery>,
) -> Result<Response, ApiError> {
    if query.demo.as_deref().map_or(true, str::is_empty) {
        return Err(ApiError::BadRequest(
            "POST a JSON payload, or GET with ?demo=1 for a sample".into(),
        ));
    }
    render_referral(&state, &referral_demo()).await
}

async fn render_referral(state: &AppState, payload: &IntakePayload) -> Result<Response, ApiError> {
    let id = TemplateId::Referral;
    let bytes = fill_template(state, id, referral_fields(payload), Vec::new()).await?;
    info!(bytes = bytes.len(), "Referral filled");
    Ok(pdf_response(bytes, id.output_name()))
}

/// Handler: POST /api/fill-consent
pub async fn fill_consent(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = IntakePayload::from_slice(&body)?;
    render_consent(&state, &payload).await
}

/// Handler: GET /api/fill-consent
pub async fn fill_consent_demo(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    render_consent(&state, &consent_demo(Local::now().date_naive())).await
}

async fn render_consent(state: &AppState, payload: &IntakePayload) -> Result<Response, ApiError> {
    let id = TemplateId::Consent;
    let today = Local::now().date_naive();
    let triples = consent_fields(payload, &state.ccu, today);
    let bytes = fill_template(state, id, triples, consent_signatures(payload)).await?;
    info!(bytes = bytes.len(), zip = %payload.text("individual_zip"), "Consent filled");
    Ok(pdf_response(bytes, id.output_name()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReferralRequest {
    pub filename: Option<String>,
    pub pdf_base64: Option<String>,
    pub recipients: Option<Vec<String>>,
    pub payload: Option<Value>,
}

/// Handler: POST /api/email-referral
///
/// Sends a PDF the caller already holds. One attempt; the retrying path is
/// `/api/submit`.
pub async fn email_referral(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: EmailReferralRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let encoded = request
        .pdf_base64
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing pdfBase64".into()))?;
    let pdf = BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid pdfBase64: {}", e)))?;

    let recipients = request
        .recipients
        .filter(|list| !list.is_empty())
        .unwrap_or_else(|| state.delivery.recipients().to_vec());
    let filename = request
        .filename
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string());
    let payload = request
        .payload
        .and_then(|v| IntakePayload::from_value(v).ok())
        .unwrap_or_default();

    let today = Local::now().date_naive();
    let summary = ReferralSummary::from_payload(&payload, today);
    let email = compose_referral_email(
        &summary,
        &filename,
        pdf,
        recipients,
        state.delivery.from_address(),
        today,
    );

    let message_id = state.delivery.transport().send(&email).await?;
    info!(%message_id, %filename, "Referral emailed on request");
    Ok(Json(json!({ "ok": true, "messageId": message_id })))
}

/// Handler: POST /api/submit-lead
pub async fn submit_lead(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let payload = IntakePayload::from_slice(&body).map_err(|e| ApiError::Lead(e.to_string()))?;
    let lead = Lead::from_payload(&payload);
    state.leads.forward(&lead).await.map_err(ApiError::Lead)?;
    Ok(Json(json!({ "message": "Lead submitted successfully" })))
}
