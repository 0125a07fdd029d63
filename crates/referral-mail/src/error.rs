use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid email: {0}")]
    Invalid(String),

    #[error("Failed to connect to email service: {0}")]
    Transport(String),

    #[error("Email service rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for MailError {
    fn from(e: reqwest::Error) -> Self {
        MailError::Transport(e.to_string())
    }
}
