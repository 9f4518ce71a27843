use thiserror::Error;

#[derive(Error, Debug)]
pub enum PerzipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid extraction pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Data integrity error: {0}")]
    IntegrityError(String),

    #[error("Input is empty")]
    EmptyInput,
}

impl PerzipError {
    /// Whether a per-file or per-entry loop may log this error and move on.
    ///
    /// Configuration problems and bad extraction patterns affect every item
    /// equally, so they always abort the whole operation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PerzipError::Configuration(_) | PerzipError::InvalidPattern(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PerzipError>;
