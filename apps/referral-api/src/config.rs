//! Startup configuration read from the environment

use std::path::PathBuf;
use std::time::Duration;

use referral_core::AgencyProfile;
use referral_mail::{default_recipients, parse_recipients, ResendConfig, DEFAULT_RETRY_DELAY, RESEND_API_URL};

/// Sender used when `EMAIL_FROM` is not set
pub const DEFAULT_FROM: &str = "Safe Life CCP <referrals@safelifehomehealth.com>";

#[derive(Debug, Clone)]
pub struct Config {
    pub recipients: Vec<String>,
    pub resend: ResendConfig,
    pub email_from: String,
    pub lead_webhook_url: Option<String>,
    pub ccu_lookup_path: Option<PathBuf>,
    pub retry_delay: Duration,
    pub profile: AgencyProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recipients: default_recipients(),
            resend: ResendConfig::default(),
            email_from: DEFAULT_FROM.to_string(),
            lead_webhook_url: None,
            ccu_lookup_path: None,
            retry_delay: DEFAULT_RETRY_DELAY,
            profile: AgencyProfile::default(),
        }
    }
}

impl Config {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();
        let profile = defaults.profile;

        let recipients = var("REFERRAL_RECIPIENTS")
            .map(|raw| parse_recipients(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.recipients);

        Self {
            recipients,
            resend: ResendConfig {
                api_key: var("RESEND_API_KEY"),
                api_url: var("RESEND_API_URL").unwrap_or_else(|| RESEND_API_URL.to_string()),
            },
            email_from: var("EMAIL_FROM").unwrap_or(defaults.email_from),
            lead_webhook_url: var("LEAD_WEBHOOK_URL"),
            ccu_lookup_path: var("CCU_LOOKUP_PATH").map(PathBuf::from),
            retry_delay: var("EMAIL_RETRY_DELAY_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            profile: AgencyProfile {
                agency_name: var("AGENCY_NAME").unwrap_or(profile.agency_name),
                staff_person: var("STAFF_PERSON").unwrap_or(profile.staff_person),
                referrer_name: var("REFERRER_NAME").unwrap_or(profile.referrer_name),
                referrer_phone: var("REFERRER_PHONE").unwrap_or(profile.referrer_phone),
                referrer_phone_type: var("REFERRER_PHONE_TYPE").unwrap_or(profile.referrer_phone_type),
                referrer_email: var("REFERRER_EMAIL").unwrap_or(profile.referrer_email),
                referrer_relationship: var("REFERRER_RELATIONSHIP")
                    .unwrap_or(profile.referrer_relationship),
            },
        }
    }
}
