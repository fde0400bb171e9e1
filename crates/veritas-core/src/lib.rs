pub mod analysis;
pub mod case;
pub mod config;
pub mod error;
pub mod tier;
pub mod verdict;

pub use analysis::{
    AnalyzerContext, AnalyzerKind, AnalyzerRequest, AnalyzerResult, FairnessResult, RitualResult,
    ThemeResult,
};
pub use case::{CaseInput, CaseNarrative, CaseOptions};
pub use config::{ActorIds, AnalyzerMode, Credentials, PollPolicy, TribunalConfig};
pub use error::TribunalError;
pub use tier::Tier;
pub use verdict::{AnalyzerDiagnostic, Diagnostics, VerdictRecord};
