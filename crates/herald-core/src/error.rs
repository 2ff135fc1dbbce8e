use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid endpoint {name}: {reason}")]
    InvalidEndpoint { name: String, reason: String },
}

impl HeraldError {
    /// Short error code string, stable across releases for scripting.
    pub fn code(&self) -> &'static str {
        match self {
            HeraldError::Config(_) => "CONFIG_ERROR",
            HeraldError::InvalidEndpoint { .. } => "INVALID_ENDPOINT",
        }
    }
}

pub type Result<T> = std::result::Result<T, HeraldError>;
