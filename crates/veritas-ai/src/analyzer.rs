use async_trait::async_trait;
use thiserror::Error;
use veritas_core::{AnalyzerKind, AnalyzerRequest, AnalyzerResult};

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// No credential or client configured; nothing was attempted.
    #[error("unavailable")]
    Unavailable,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("run {run_id} finished with status {status}")]
    RunFailed { run_id: String, status: String },

    #[error("run {run_id} still {status} after {attempts} polls")]
    PollExhausted {
        run_id: String,
        status: String,
        attempts: u32,
    },

    #[error("malformed analyzer output: {0}")]
    Malformed(String),

    #[error("analyzer produced no output")]
    NoOutput,
}

/// A pluggable component producing a typed partial result from a case
/// narrative.
///
/// Implementations are either local heuristics or remote hosted-actor runs;
/// the pipeline treats them identically.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalyzerKind;

    /// Identifier used in logs (actor id or local heuristic name).
    fn id(&self) -> &str;

    async fn analyze(&self, request: &AnalyzerRequest) -> Result<AnalyzerResult, AnalyzerError>;
}
