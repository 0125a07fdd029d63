//! Retrying delivery of the merged referral
//!
//! Delivery never fails the submission: the caller always gets the PDF back
//! and only learns whether the email went out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use referral_core::ReferralSummary;
use tracing::{info, warn};

use crate::compose::compose_referral_email;
use crate::transport::MailTransport;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Attempts per delivery: the first send plus one retry
pub const MAX_ATTEMPTS: u32 = 2;

#[derive(Clone)]
pub struct DeliveryService {
    transport: Arc<dyn MailTransport>,
    recipients: Vec<String>,
    from: String,
    retry_delay: Duration,
}

impl DeliveryService {
    pub fn new(transport: Arc<dyn MailTransport>, recipients: Vec<String>, from: impl Into<String>) -> Self {
        Self {
            transport,
            recipients,
            from: from.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn transport(&self) -> &Arc<dyn MailTransport> {
        &self.transport
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// Email the merged PDF to the configured recipients.
    /// Returns whether any attempt succeeded.
    pub async fn send(&self, merged: &[u8], filename: &str, summary: &ReferralSummary) -> bool {
        let email = compose_referral_email(
            summary,
            filename,
            merged.to_vec(),
            self.recipients.clone(),
            &self.from,
            Local::now().date_naive(),
        );

        for attempt in 1..=MAX_ATTEMPTS {
            match self.transport.send(&email).await {
                Ok(message_id) => {
                    info!(%message_id, attempt, filename, "Referral emailed");
                    return true;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Email attempt failed");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailError;
    use crate::types::ReferralEmail;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` sends, then succeeds
    struct FlakyTransport {
        failures: u32,
        attempts: AtomicU32,
        sent: Mutex<Vec<ReferralEmail>>,
    }

    impl FlakyTransport {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures,
                attempts: AtomicU32::new(0),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MailTransport for FlakyTransport {
        async fn send(&self, email: &ReferralEmail) -> Result<String, MailError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                return Err(MailError::Transport("connection reset".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(format!("msg-{}", attempt))
        }
    }

    fn summary() -> ReferralSummary {
        ReferralSummary {
            individual_name: "Jane Doe".into(),
            referral_date: "08/12/2025".into(),
            zip: Some("60148".into()),
        }
    }

    fn service(transport: Arc<FlakyTransport>) -> DeliveryService {
        DeliveryService::new(transport, vec!["intake@example.org".into()], "noreply@example.org")
            .with_retry_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_first_failure_then_success() {
        let transport = FlakyTransport::new(1);
        let sent = service(transport.clone())
            .send(b"%PDF", "Jane_Doe-CCP-Referral.pdf", &summary())
            .await;
        assert!(sent);
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);

        let delivered = transport.sent.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].attachment.filename, "Jane_Doe-CCP-Referral.pdf");
        assert_eq!(delivered[0].to, vec!["intake@example.org".to_string()]);
    }

    #[tokio::test]
    async fn test_success_first_time_sends_once() {
        let transport = FlakyTransport::new(0);
        assert!(service(transport.clone()).send(b"%PDF", "r.pdf", &summary()).await);
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_two_attempts() {
        let transport = FlakyTransport::new(5);
        assert!(!service(transport.clone()).send(b"%PDF", "r.pdf", &summary()).await);
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_delay_between_attempts() {
        let transport = FlakyTransport::new(1);
        let service = DeliveryService::new(transport.clone(), vec!["intake@example.org".into()], "noreply@example.org");
        let started = std::time::Instant::now();
        assert!(service.send(b"%PDF", "r.pdf", &summary()).await);
        assert!(started.elapsed() >= DEFAULT_RETRY_DELAY);
    }
}
