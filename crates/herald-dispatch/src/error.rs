use herald_core::HeraldError;
use thiserror::Error;

/// Errors that stop a campaign before any endpoint is contacted.
///
/// Per-endpoint failures never appear here; they are recorded as
/// [`DispatchOutcome`](herald_core::DispatchOutcome)s instead.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// Caller-supplied payload fields failed validation.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Registry or settings are unusable (e.g. no endpoints).
    #[error(transparent)]
    Config(#[from] HeraldError),
}

pub type Result<T> = std::result::Result<T, CampaignError>;
