//! AEGIS: fairness heuristic over protected-characteristic mentions.
//!
//! Each distinct protected-characteristic keyword found in the narrative
//! lowers the score by a third, bottoming out at zero. The score is
//! rounded to three decimals so repeated runs compare equal.

use async_trait::async_trait;
use veritas_core::analysis::MAX_CITATIONS;
use veritas_core::{AnalyzerKind, AnalyzerRequest, AnalyzerResult, FairnessResult};

use crate::{Analyzer, AnalyzerError};

const BIAS_KEYWORDS: &[&str] = &[
    "race",
    "gender",
    "disability",
    "class",
    "immigrant",
    "religion",
];

/// Hits at which the score reaches zero.
const SATURATION_HITS: f64 = 3.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct FairnessAuditor;

impl FairnessAuditor {
    pub fn audit(text: &str, max_sources: Option<u64>) -> FairnessResult {
        let lower = text.to_lowercase();
        let hits: Vec<&str> = BIAS_KEYWORDS
            .iter()
            .copied()
            .filter(|k| lower.contains(k))
            .collect();

        let penalty = (hits.len() as f64 / SATURATION_HITS).min(1.0);
        let score = ((1.0 - penalty).max(0.0) * 1000.0).round() / 1000.0;

        let cap = max_sources
            .map(|m| (m as usize).min(MAX_CITATIONS))
            .unwrap_or(MAX_CITATIONS);
        let citations = hits
            .iter()
            .take(cap)
            .map(|k| format!("note: potential mention of '{k}'"))
            .collect();

        FairnessResult {
            fairness_score: score,
            citations,
            notes: Some("AEGIS: keyword fairness heuristic".into()),
        }
    }
}

#[async_trait]
impl Analyzer for FairnessAuditor {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Fairness
    }

    fn id(&self) -> &str {
        "local:aegis"
    }

    async fn analyze(&self, request: &AnalyzerRequest) -> Result<AnalyzerResult, AnalyzerError> {
        Ok(AnalyzerResult::Fairness(Self::audit(
            request.narrative().as_str(),
            request.max_sources(),
        )))
    }
}
