//! Lead forwarding to the external intake sheet

use referral_core::IntakePayload;
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lead {
    pub name: String,
    pub relation: String,
    pub birthdate: String,
    pub age: String,
    pub medicaid: String,
    pub medicaid_number: String,
    pub email: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub county: String,
    pub info: String,
}

impl Lead {
    pub fn from_payload(p: &IntakePayload) -> Self {
        Self {
            name: p.text("name"),
            relation: p.text("relation"),
            birthdate: p.text("birthdate"),
            age: p.text("age"),
            medicaid: p.text("medicaid"),
            medicaid_number: p.text("medicaid_number"),
            email: p.text("email"),
            address_line1: p.text("address_line1"),
            address_line2: p.text("address_line2"),
            city: p.text("city"),
            state: p.text("state"),
            zip: p.text("zip"),
            county: p.text("county"),
            info: p.text("info"),
        }
    }
}

#[derive(Clone)]
pub struct LeadForwarder {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl LeadForwarder {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    #[instrument(skip(self, lead), fields(zip = %lead.zip))]
    pub async fn forward(&self, lead: &Lead) -> Result<(), String> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| "Lead webhook not configured: set LEAD_WEBHOOK_URL".to_string())?;

        let response = self
            .client
            .post(url)
            .json(lead)
            .send()
            .await
            .map_err(|e| format!("Lead webhook unreachable: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "Lead webhook error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            ));
        }
        info!("Lead forwarded");
        Ok(())
    }
}
