//! Resend HTTP API client
//!
//! Sends email through `POST {api_url}` with a bearer API key. Attachments
//! travel base64-encoded inside the JSON body.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::MailError;
use crate::transport::MailTransport;
use crate::types::ReferralEmail;

/// Resend API endpoint
pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Resend API configuration
#[derive(Debug, Clone)]
pub struct ResendConfig {
    /// Resend API key (re_xxxxxxxxxx); sending fails without one
    pub api_key: Option<String>,
    pub api_url: String,
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: RESEND_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    attachments: Vec<ResendAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendSuccessResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResendErrorResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct ResendTransport {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendTransport {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    #[instrument(skip(self, email), fields(to = ?email.to, subject = %email.subject))]
    async fn send(&self, email: &ReferralEmail) -> Result<String, MailError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(MailError::NotConfigured(
                    "Please set RESEND_API_KEY (and optional EMAIL_FROM)".into(),
                ))
            }
        };
        email.validate()?;

        let payload = ResendPayload {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            attachments: vec![ResendAttachment {
                filename: &email.attachment.filename,
                content: BASE64.encode(&email.attachment.content),
                content_type: &email.attachment.content_type,
            }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let id = match response.json::<ResendSuccessResponse>().await {
                Ok(success) => success.id,
                Err(e) => {
                    // Accepted but unreadable; the message is on its way
                    warn!(error = %e, "Resend response parse error");
                    "resend:unknown".to_string()
                }
            };
            info!(message_id = %id, "Email sent via Resend");
            return Ok(id);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ResendErrorResponse>(&body)
            .ok()
            .and_then(|err| err.message.or(err.name))
            .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), body));
        warn!(status = status.as_u16(), %message, "Resend rejected email");
        Err(MailError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
