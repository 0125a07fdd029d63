//! Outbound email structures

use crate::error::MailError;

/// Recipients used when a request does not name any
pub const DEFAULT_RECIPIENTS: &[&str] = &[
    "asad.safelife@gmail.com",
    "faisal.safelife@gmail.com",
    "safelifehomehealth@gmail.com",
    "usama.safelife@gmail.com",
];

/// Attachment name used when a request does not name one
pub const DEFAULT_ATTACHMENT_NAME: &str = "Referral_Form.pdf";

/// Email attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,

    /// Raw bytes; base64-encoded on the wire
    pub content: Vec<u8>,

    /// MIME type (e.g., "application/pdf")
    pub content_type: String,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            content_type: "application/pdf".to_string(),
        }
    }
}

/// A fully rendered notification, ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachment: Attachment,
}

impl ReferralEmail {
    pub fn validate(&self) -> Result<(), MailError> {
        if self.from.trim().is_empty() {
            return Err(MailError::Invalid("missing sender".into()));
        }
        if self.to.is_empty() {
            return Err(MailError::Invalid("no recipients".into()));
        }
        if let Some(bad) = self.to.iter().find(|addr| !looks_like_email(addr)) {
            return Err(MailError::Invalid(format!("bad recipient address: {}", bad)));
        }
        if self.attachment.content.is_empty() {
            return Err(MailError::Invalid("empty attachment".into()));
        }
        Ok(())
    }
}

/// `local@domain.tld` shape check; delivery is left to the provider
fn looks_like_email(addr: &str) -> bool {
    let Some((local, domain)) = addr.trim().rsplit_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Split a comma separated recipient list, dropping blanks
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn default_recipients() -> Vec<String> {
    DEFAULT_RECIPIENTS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn email(to: &[&str]) -> ReferralEmail {
        ReferralEmail {
            from: "Safe Life CCP <noreply@example.com>".into(),
            to: to.iter().map(|s| s.to_string()).collect(),
            subject: "s".into(),
            text: "t".into(),
            html: "h".into(),
            attachment: Attachment::pdf("a.pdf", b"%PDF".to_vec()),
        }
    }

    #[test]
    fn test_parse_recipients() {
        assert_eq!(
            parse_recipients(" a@x.org, ,b@y.org,"),
            vec!["a@x.org".to_string(), "b@y.org".to_string()]
        );
        assert!(parse_recipients("").is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(email(&["intake@example.org"]).validate().is_ok());
        assert!(matches!(email(&[]).validate(), Err(MailError::Invalid(_))));
        assert!(email(&["not-an-address"]).validate().is_err());
        assert!(email(&["a@localhost"]).validate().is_err());
    }

    #[test]
    fn test_empty_attachment_rejected() {
        let mut e = email(&["intake@example.org"]);
        e.attachment.content.clear();
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_defaults_are_valid_addresses() {
        assert!(default_recipients().iter().all(|a| looks_like_email(a)));
    }
}
