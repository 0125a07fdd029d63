use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
}

impl CoreError {
    /// Field name for validation failures, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CoreError::Validation { field, .. } => Some(field),
            CoreError::InvalidPayload(_) => None,
        }
    }
}
