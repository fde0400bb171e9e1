//! Analyzer requests and typed results shared by local and remote analyzers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::CaseNarrative;

/// Maximum number of citation notes a fairness result carries.
pub const MAX_CITATIONS: usize = 3;

/// The three helper analyzers the judge delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// LYRA: grief and narrative themes.
    Themes,
    /// AEGIS: fairness and bias audit.
    Fairness,
    /// VESTA: ritual and repair plan.
    Ritual,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 3] = [Self::Themes, Self::Fairness, Self::Ritual];

    pub fn codename(&self) -> &'static str {
        match self {
            Self::Themes => "LYRA",
            Self::Fairness => "AEGIS",
            Self::Ritual => "VESTA",
        }
    }

    /// Key under which this analyzer's output is substituted into the prompt.
    pub fn context_key(&self) -> &'static str {
        match self {
            Self::Themes => "lyra",
            Self::Fairness => "aegis",
            Self::Ritual => "vesta",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

/// Input for one analyzer invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerRequest {
    narrative: CaseNarrative,
    tier_hint: Option<String>,
    max_sources: Option<u64>,
}

impl AnalyzerRequest {
    pub fn new(narrative: CaseNarrative) -> Self {
        Self {
            narrative,
            tier_hint: None,
            max_sources: None,
        }
    }

    pub fn with_tier_hint(mut self, tier: Option<String>) -> Self {
        self.tier_hint = tier;
        self
    }

    pub fn with_max_sources(mut self, max_sources: u64) -> Self {
        self.max_sources = Some(max_sources);
        self
    }

    pub fn narrative(&self) -> &CaseNarrative {
        &self.narrative
    }

    pub fn tier_hint(&self) -> Option<&str> {
        self.tier_hint.as_deref()
    }

    pub fn max_sources(&self) -> Option<u64> {
        self.max_sources
    }

    /// Actor input body for a remote run of `kind`.
    pub fn to_actor_input(&self, kind: AnalyzerKind) -> Value {
        match kind {
            AnalyzerKind::Themes => json!({ "caseNarrative": self.narrative }),
            AnalyzerKind::Fairness => json!({
                "caseNarrative": self.narrative,
                "maxSources": self.max_sources.unwrap_or(crate::case::DEFAULT_MAX_SOURCES),
            }),
            AnalyzerKind::Ritual => json!({
                "caseNarrative": self.narrative,
                "tier": self.tier_hint,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeResult {
    /// Deduplicated, sorted theme labels.
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub snippets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ThemeResult {
    pub fn new(themes: impl IntoIterator<Item = String>, snippets: Vec<String>) -> Self {
        let mut themes: Vec<String> = themes.into_iter().collect();
        themes.sort();
        themes.dedup();
        Self {
            themes,
            snippets,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessResult {
    pub fairness_score: f64,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FairnessResult {
    /// Clamp the score into `[0, 1]` and cap citations.
    pub fn normalized(mut self) -> Self {
        self.fairness_score = if self.fairness_score.is_finite() {
            self.fairness_score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.citations.truncate(MAX_CITATIONS);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualResult {
    pub ritual: String,
    #[serde(default)]
    pub repair_plan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Result of one analyzer, tagged by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerResult {
    Themes(ThemeResult),
    Fairness(FairnessResult),
    Ritual(RitualResult),
}

impl AnalyzerResult {
    pub fn kind(&self) -> AnalyzerKind {
        match self {
            Self::Themes(_) => AnalyzerKind::Themes,
            Self::Fairness(_) => AnalyzerKind::Fairness,
            Self::Ritual(_) => AnalyzerKind::Ritual,
        }
    }

    /// Decode an analyzer's persisted output value into the typed result
    /// for `kind`.
    pub fn from_output(kind: AnalyzerKind, output: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            AnalyzerKind::Themes => {
                let raw: ThemeResult = serde_json::from_value(output)?;
                let mut result = ThemeResult::new(raw.themes, raw.snippets);
                result.notes = raw.notes;
                Self::Themes(result)
            }
            AnalyzerKind::Fairness => {
                Self::Fairness(serde_json::from_value::<FairnessResult>(output)?.normalized())
            }
            AnalyzerKind::Ritual => Self::Ritual(serde_json::from_value(output)?),
        })
    }

    pub fn to_value(&self) -> Value {
        let encoded = match self {
            Self::Themes(r) => serde_json::to_value(r),
            Self::Fairness(r) => serde_json::to_value(r),
            Self::Ritual(r) => serde_json::to_value(r),
        };
        encoded.unwrap_or_else(|_| json!({}))
    }
}

/// The resolved analyzer outputs for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzerContext {
    pub themes: Option<ThemeResult>,
    pub fairness: Option<FairnessResult>,
    pub ritual: Option<RitualResult>,
}

impl AnalyzerContext {
    pub fn insert(&mut self, result: AnalyzerResult) {
        match result {
            AnalyzerResult::Themes(r) => self.themes = Some(r),
            AnalyzerResult::Fairness(r) => self.fairness = Some(r),
            AnalyzerResult::Ritual(r) => self.ritual = Some(r),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_none() && self.fairness.is_none() && self.ritual.is_none()
    }

    pub fn contains(&self, kind: AnalyzerKind) -> bool {
        match kind {
            AnalyzerKind::Themes => self.themes.is_some(),
            AnalyzerKind::Fairness => self.fairness.is_some(),
            AnalyzerKind::Ritual => self.ritual.is_some(),
        }
    }

    /// JSON for prompt substitution; `{}` when the analyzer produced nothing.
    pub fn context_value(&self, kind: AnalyzerKind) -> Value {
        let value = match kind {
            AnalyzerKind::Themes => self.themes.as_ref().map(serde_json::to_value),
            AnalyzerKind::Fairness => self.fairness.as_ref().map(serde_json::to_value),
            AnalyzerKind::Ritual => self.ritual.as_ref().map(serde_json::to_value),
        };
        match value {
            Some(Ok(v)) => v,
            _ => json!({}),
        }
    }
}
