use async_trait::async_trait;

use crate::error::MailError;
use crate::types::ReferralEmail;

/// Something that can hand an email to a provider.
/// Returns the provider's message id.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &ReferralEmail) -> Result<String, MailError>;
}
