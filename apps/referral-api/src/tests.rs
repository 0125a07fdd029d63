//! HTTP tests against in-memory templates and a recording mail transport

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Local;
use lopdf::{Document, Object};
use pretty_assertions::assert_eq;
use referral_core::demo::consent_demo;
use referral_mail::{MailError, MailTransport, ReferralEmail};
use referral_pdf::testing::{FixtureField, FixtureForm};
use serde_json::{json, Value};

use crate::config::Config;
use crate::state::AppState;
use crate::build_router;

/// Fails the first `failures` sends, records the rest
struct RecordingTransport {
    failures: u32,
    attempts: AtomicU32,
    sent: Mutex<Vec<ReferralEmail>>,
}

impl RecordingTransport {
    fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            attempts: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &ReferralEmail) -> Result<String, MailError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(MailError::Transport("connection refused".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(format!("msg-{}", attempt))
    }
}

fn referral_template() -> Vec<u8> {
    FixtureForm::new(2)
        .label("Referral")
        .field(FixtureField::text("Name_2", 0, [72.0, 700.0, 300.0, 716.0]))
        .field(FixtureField::text("Zip Code", 0, [320.0, 700.0, 400.0, 716.0]))
        .field(FixtureField::checkbox("Cell", 0, [72.0, 680.0, 82.0, 690.0]))
        .build()
}

fn consent_template() -> Vec<u8> {
    FixtureForm::new(1)
        .label("Consent")
        .field(FixtureField::text("client_Name", 0, [72.0, 700.0, 300.0, 716.0]))
        .field(FixtureField::text("CCU_Name", 0, [72.0, 520.0, 540.0, 536.0]))
        .field(FixtureField::text("CCU_contact", 0, [72.0, 500.0, 300.0, 516.0]))
        .field(FixtureField::signature(
            "Signature Block70_es_:signer:signatureblock",
            0,
            [72.0, 200.0, 300.0, 240.0],
        ))
        .field(FixtureField::signature(
            "Signature Block71_es_:signer:signatureblock",
            0,
            [320.0, 200.0, 540.0, 240.0],
        ))
        .build()
}

struct Harness {
    server: TestServer,
    transport: Arc<RecordingTransport>,
    _assets: tempfile::TempDir,
}

fn harness_with(failures: u32, with_templates: bool, config: Config) -> Harness {
    let assets = tempfile::tempdir().unwrap();
    let dir = assets.path().join("assets");
    std::fs::create_dir_all(&dir).unwrap();
    if with_templates {
        std::fs::write(dir.join("ccp-referral-fillable.pdf"), referral_template()).unwrap();
        std::fs::write(dir.join("Consent-for-Referral-and-Release.pdf"), consent_template()).unwrap();
    }
    std::fs::write(
        dir.join("ccu_lookup.json"),
        include_str!("../../../assets/ccu_lookup.json"),
    )
    .unwrap();

    let transport = RecordingTransport::new(failures);
    let state = AppState::with_transport(&config, assets.path(), transport.clone()).shared();
    let server = TestServer::new(build_router(state)).unwrap();
    Harness {
        server,
        transport,
        _assets: assets,
    }
}

fn test_config() -> Config {
    Config {
        recipients: vec!["intake@example.org".into()],
        retry_delay: Duration::from_millis(1),
        ..Config::default()
    }
}

fn harness(failures: u32) -> Harness {
    harness_with(failures, true, test_config())
}

/// Every stream's decoded content, concatenated
fn all_stream_text(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    doc.objects
        .values()
        .filter_map(|obj| match obj {
            Object::Stream(stream) => Some(
                stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone()),
            ),
            _ => None,
        })
        .map(|content| String::from_utf8_lossy(&content).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

fn submission() -> Value {
    let mut payload = consent_demo(Local::now().date_naive()).into_value();
    payload["individual_dob"] = json!("1946-01-10");
    payload["consent_agree"] = json!("yes");
    payload
}

#[tokio::test]
async fn test_health() {
    let h = harness(0);
    let response = h.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], json!("healthy"));
}

#[tokio::test]
async fn test_fill_referral_returns_flat_pdf() {
    let h = harness(0);
    let response = h
        .server
        .post("/api/fill-referral")
        .json(&json!({"individual_name": "Jane Smith", "individual_zip": "60616", "referrer_phone_type": "Cell"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"Referral-Filled.pdf\""
    );

    let bytes = response.as_bytes().to_vec();
    let doc = Document::load_mem(&bytes).unwrap();
    assert!(doc.catalog().unwrap().get(b"AcroForm").is_err());
    assert!(all_stream_text(&bytes).contains("(Jane Smith) Tj"));
}

#[tokio::test]
async fn test_fill_referral_get_requires_demo() {
    let h = harness(0);
    h.server
        .get("/api/fill-referral")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = h
        .server
        .get("/api/fill-referral")
        .add_query_param("demo", "1")
        .await;
    response.assert_status_ok();
    assert_eq!(page_count(response.as_bytes()), 2);
}

#[tokio::test]
async fn test_fill_rejects_malformed_json() {
    let h = harness(0);
    let response = h
        .server
        .post("/api/fill-consent")
        .bytes("{not json".into())
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fill_consent_demo_uses_lookup() {
    let h = harness(0);
    let response = h.server.get("/api/fill-consent").await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"Consent-Filled.pdf\""
    );
    let text = all_stream_text(response.as_bytes());
    assert!(text.contains("(Senior Services of DuPage County) Tj"));
    assert!(text.contains("(ccu.intake@dupage.example.org) Tj"));
}

#[tokio::test]
async fn test_missing_template_is_server_error() {
    let h = harness_with(0, false, test_config());
    let response = h.server.post("/api/fill-referral").json(&json!({})).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(
        body["error"],
        json!("Template not found: Missing ccp-referral-fillable.pdf in assets")
    );
}

#[tokio::test]
async fn test_email_referral_requires_pdf() {
    let h = harness(0);
    let response = h
        .server
        .post("/api/email-referral")
        .json(&json!({"filename": "x.pdf"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], json!("Missing pdfBase64"));
    assert_eq!(h.transport.attempts(), 0);
}

#[tokio::test]
async fn test_email_referral_sends_to_default_recipients() {
    let h = harness(0);
    let response = h
        .server
        .post("/api/email-referral")
        .json(&json!({
            "pdfBase64": BASE64.encode(b"%PDF-1.7 test"),
            "payload": {"individual_name": "Jane Doe", "individual_zip": "60148"}
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"ok": true, "messageId": "msg-1"}));

    let sent = h.transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["intake@example.org".to_string()]);
    assert_eq!(sent[0].attachment.filename, "Referral_Form.pdf");
    assert_eq!(sent[0].attachment.content, b"%PDF-1.7 test".to_vec());
    assert!(sent[0].text.contains("Individual: Jane Doe"));
    assert!(sent[0].text.contains("ZIP: 60148"));
}

#[tokio::test]
async fn test_email_referral_failure_is_500() {
    let h = harness(1);
    let response = h
        .server
        .post("/api/email-referral")
        .json(&json!({"pdfBase64": BASE64.encode(b"%PDF"), "recipients": ["a@example.org"]}))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Email send failed: "), "{}", error);
    assert_eq!(h.transport.attempts(), 1);
}

#[tokio::test]
async fn test_submit_lead_without_webhook() {
    let h = harness(0);
    let response = h.server.post("/api/submit-lead").json(&json!({"name": "Jane"})).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("LEAD_WEBHOOK_URL"));
}

#[tokio::test]
async fn test_submit_lead_forwards_fields() {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();
    let sink = received.clone();
    let webhook = Router::new().route(
        "/exec",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(body);
                Json(json!({"result": "ok"}))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, webhook).await.unwrap();
    });

    let config = Config {
        lead_webhook_url: Some(format!("http://{}/exec", addr)),
        ..test_config()
    };
    let h = harness_with(0, true, config);
    let response = h
        .server
        .post("/api/submit-lead")
        .json(&json!({"name": "Jane", "relation": "Self", "zip": "60148", "medicaid": "Yes"}))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"message": "Lead submitted successfully"})
    );

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["name"], json!("Jane"));
    assert_eq!(received[0]["zip"], json!("60148"));
    assert_eq!(received[0]["county"], json!(""));
}

#[tokio::test]
async fn test_submit_returns_merged_pdf_and_emails_it() {
    let h = harness(0);
    let response = h.server.post("/api/submit").json(&submission()).await;
    response.assert_status_ok();
    assert_eq!(response.header("x-email-delivery"), "sent");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"Jane_Doe_Referral_Form.pdf\""
    );

    let merged = response.as_bytes().to_vec();
    assert_eq!(page_count(&merged), 3);
    assert!(all_stream_text(&merged).contains("(Senior Services of DuPage County) Tj"));

    let sent = h.transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "CCP: Auto Referral Generated!");
    assert_eq!(sent[0].attachment.content, merged);
}

#[tokio::test]
async fn test_submit_retries_email_once() {
    let h = harness(1);
    let response = h.server.post("/api/submit").json(&submission()).await;
    response.assert_status_ok();
    assert_eq!(response.header("x-email-delivery"), "sent");
    assert_eq!(h.transport.attempts(), 2);
}

#[tokio::test]
async fn test_submit_still_downloads_when_email_fails() {
    let h = harness(5);
    let response = h.server.post("/api/submit").json(&submission()).await;
    response.assert_status_ok();
    assert_eq!(response.header("x-email-delivery"), "failed");
    assert_eq!(page_count(response.as_bytes()), 3);
    assert_eq!(h.transport.attempts(), 2);
}

#[tokio::test]
async fn test_submit_validates_before_filling() {
    let h = harness(0);
    let mut payload = submission();
    payload["individual_dob"] = json!("");
    let response = h.server.post("/api/submit").json(&payload).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["field"], json!("individual_dob"));
    assert_eq!(h.transport.attempts(), 0);
}
