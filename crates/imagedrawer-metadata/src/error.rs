//! Error types for imagedrawer-metadata

/// Result type for metadata extraction.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Reasons an embedded metadata block could not be decoded.
///
/// Apart from [`MetadataError::Io`], every variant is a decode failure scoped
/// to a single item. [`crate::extract`] logs these and turns them into "no
/// metadata"; [`crate::try_extract`] hands them to callers that want the reason.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// IO error while reading a local file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The PNG stream or one of its text chunks is malformed
    #[error("Malformed PNG: {0}")]
    Png(String),

    /// The RIFF/WEBP container is malformed
    #[error("Malformed WEBP container: {0}")]
    Riff(String),

    /// The EXIF block could not be parsed
    #[error("Malformed EXIF: {0}")]
    Exif(#[from] exif::Error),

    /// The UserComment payload is not valid text
    #[error("Invalid UserComment text: {0}")]
    Text(String),

    /// The decoded payload is not valid JSON
    #[error("Invalid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded JSON is valid but not an object
    #[error("Metadata JSON is not an object (found {0})")]
    NotAnObject(&'static str),
}

impl MetadataError {
    /// Whether this error came from decoding the blob rather than reading it.
    pub fn is_decode_failure(&self) -> bool {
        !matches!(self, Self::Io(_))
    }

    /// Create a malformed PNG error.
    pub fn png(msg: impl Into<String>) -> Self {
        Self::Png(msg.into())
    }

    /// Create a malformed RIFF error.
    pub fn riff(msg: impl Into<String>) -> Self {
        Self::Riff(msg.into())
    }

    /// Create an invalid text error.
    pub fn text(msg: impl Into<String>) -> Self {
        Self::Text(msg.into())
    }
}

impl From<png::DecodingError> for MetadataError {
    fn from(err: png::DecodingError) -> Self {
        Self::Png(err.to_string())
    }
}
