use thiserror::Error;

/// Errors that terminate a tribunal request.
///
/// Analyzer, backend and bookkeeping failures are recovered inside the
/// pipeline and never surface here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TribunalError {
    /// Required input missing or empty.
    #[error("{0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TribunalError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
