//! Human-readable summary for the notification email

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::format_mm_dd_yyyy;
use crate::payload::IntakePayload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralSummary {
    pub individual_name: String,
    pub referral_date: String,
    pub zip: Option<String>,
}

impl ReferralSummary {
    pub fn from_payload(payload: &IntakePayload, today: NaiveDate) -> Self {
        let individual_name = match payload.text("individual_name") {
            n if n.is_empty() => "(Unknown Individual)".to_string(),
            n => n,
        };
        let referral_date = match payload.text("referral_date") {
            d if d.is_empty() => format_mm_dd_yyyy(today),
            d => d,
        };
        let zip = Some(payload.text("individual_zip")).filter(|z| !z.is_empty());

        Self {
            individual_name,
            referral_date,
            zip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults_for_empty_payload() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 12).unwrap();
        assert_eq!(
            ReferralSummary::from_payload(&IntakePayload::new(), today),
            ReferralSummary {
                individual_name: "(Unknown Individual)".into(),
                referral_date: "08/12/2025".into(),
                zip: None,
            }
        );
    }

    #[test]
    fn test_reads_payload_fields() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 12).unwrap();
        let payload = IntakePayload::from_value(json!({
            "individual_name": "Jane Doe",
            "referral_date": "08/01/2025",
            "individual_zip": "60148"
        }))
        .unwrap();
        let summary = ReferralSummary::from_payload(&payload, today);
        assert_eq!(summary.individual_name, "Jane Doe");
        assert_eq!(summary.referral_date, "08/01/2025");
        assert_eq!(summary.zip.as_deref(), Some("60148"));
    }
}
