use thiserror::Error;

/// Stable classification of an [`AdvisoryError`], for callers that map
/// failures onto their own transport-level status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    InvalidInput,
    UnsupportedMedia,
    Internal,
}

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Internal error while {context}: {message}")]
    Internal { context: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdvisoryError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn internal(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Internal {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BadRequest(_) | Self::Serialization(_) => ErrorKind::BadRequest,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UnsupportedMedia(_) => ErrorKind::UnsupportedMedia,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisoryError>;
