use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Template not found: {0}")]
    ResourceNotFound(String),

    #[error("Failed to parse PDF: {0}")]
    MalformedDocument(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid image: {0}")]
    Image(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Operation(e.to_string())
    }
}
