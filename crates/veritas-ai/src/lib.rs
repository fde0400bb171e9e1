//! Analysis layer: keyword analyzers for grief themes, fairness and ritual,
//! plus the JUNO decision prompt executed by an LLM backend.

mod analyzer;
pub mod backend;
mod fairness;
pub mod prompt;
mod ritual;
mod synthesizer;
mod themes;

pub use analyzer::{Analyzer, AnalyzerError};
pub use backend::{BackendError, DecisionBackend, OpenAiBackend, StubBackend};
pub use fairness::FairnessAuditor;
pub use prompt::DecisionRequest;
pub use ritual::RitualSuggestor;
pub use synthesizer::VerdictSynthesizer;
pub use themes::ThemeScanner;
