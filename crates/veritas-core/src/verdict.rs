//! The canonical verdict record and its normalisation from backend output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AnalyzerKind;

/// Canonical output of one tribunal run.
///
/// Every field is always serialized, `null` included: consumers rely on a
/// fixed key set. `diagnostics` is the one exception and only appears when
/// enabled in the tribunal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRecord {
    pub tier: Option<String>,
    pub remedy: Option<String>,
    pub fairness_score: Option<f64>,
    pub ritual: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub citations: Vec<String>,
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl VerdictRecord {
    /// Keys present in every serialized record.
    pub const KEYS: [&'static str; 7] = [
        "tier",
        "remedy",
        "fairnessScore",
        "ritual",
        "notes",
        "citations",
        "jurisdiction",
    ];

    /// A record whose only populated field is `notes`.
    pub fn notes_only(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Default::default()
        }
    }

    /// Normalise free text from the decision backend.
    ///
    /// The text must be a single JSON object. Anything else (invalid JSON,
    /// arrays, scalars) yields a notes-only record carrying the raw text
    /// verbatim. This never fails.
    pub fn from_backend_text(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => Self::from_object(&obj),
            Ok(_) => {
                tracing::debug!("decision output is JSON but not an object");
                Self::notes_only(raw)
            }
            Err(e) => {
                tracing::debug!(error = %e, "decision output is not JSON");
                Self::notes_only(raw)
            }
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            tier: string_field(obj, "tier"),
            remedy: string_field(obj, "remedy"),
            fairness_score: obj.get("fairnessScore").and_then(Value::as_f64),
            ritual: string_field(obj, "ritual"),
            notes: string_field(obj, "notes"),
            citations: citations_field(obj),
            jurisdiction: None,
            diagnostics: None,
        }
    }

    pub fn with_jurisdiction(mut self, jurisdiction: Option<String>) -> Self {
        self.jurisdiction = jurisdiction;
        self
    }

    /// Serialize with the canonical key set.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn citations_field(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("citations") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Outcome of one analyzer as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerDiagnostic {
    pub skipped: bool,
    pub contributed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-analyzer diagnostics keyed by codename (`LYRA`, `AEGIS`, `VESTA`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(pub BTreeMap<String, AnalyzerDiagnostic>);

impl Diagnostics {
    pub fn record(&mut self, kind: AnalyzerKind, diagnostic: AnalyzerDiagnostic) {
        self.0.insert(kind.codename().to_string(), diagnostic);
    }

    pub fn get(&self, kind: AnalyzerKind) -> Option<&AnalyzerDiagnostic> {
        self.0.get(kind.codename())
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(k, d)| d.error.as_deref().map(|e| (k.as_str(), e)))
    }
}
