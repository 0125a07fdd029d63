//! Referral Mail
//!
//! Renders the referral notification, sends it through the Resend HTTP API
//! and retries a failed delivery once.

pub mod compose;
pub mod delivery;
pub mod error;
pub mod resend;
pub mod transport;
pub mod types;

pub use compose::{compose_referral_email, escape_html};
pub use delivery::{DeliveryService, DEFAULT_RETRY_DELAY};
pub use error::MailError;
pub use resend::{ResendConfig, ResendTransport, RESEND_API_URL};
pub use transport::MailTransport;
pub use types::{
    default_recipients, parse_recipients, Attachment, ReferralEmail, DEFAULT_ATTACHMENT_NAME,
    DEFAULT_RECIPIENTS,
};
