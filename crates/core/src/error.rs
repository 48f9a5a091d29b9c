//! Error types for deck generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating, rendering or storing a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a local file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Model output could not be recovered as a slide outline.
    #[error("Outline parse error: {0}")]
    OutlineParse(String),

    /// A plan slot references a layout slide the template does not have.
    #[error("Template has no layout slide {index} (template has {available} slides)")]
    TemplateLayoutMissing { index: usize, available: usize },

    /// A remote call (model, search or image download) failed.
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    /// No persisted deck exists for the identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request itself is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or corrupted template file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Image decoding or transcoding error.
    #[error("Image error: {0}")]
    ImageError(String),
}

impl Error {
    /// Whether the error was caused by the caller rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidRequest(_) | Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidRequest("empty".into()).is_client_error());
        assert!(Error::NotFound("abc".into()).is_client_error());
        assert!(!Error::OutlineParse("bad".into()).is_client_error());
        assert!(!Error::RemoteFetch("503".into()).is_client_error());
    }

    #[test]
    fn test_layout_missing_message() {
        let err = Error::TemplateLayoutMissing {
            index: 2,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Template has no layout slide 2 (template has 2 slides)"
        );
    }
}
