//! Case intake: the request body accepted by every invocation surface.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::TribunalError;

/// Default bound on sources the fairness audit may consult.
pub const DEFAULT_MAX_SOURCES: u64 = 10;

/// Raw tribunal request as received from the CLI or the HTTP endpoint.
///
/// Intake forms label their fields for humans ("Case Narrative",
/// "Jurisdiction", ...); those labels are accepted as aliases of the
/// canonical camelCase keys. When both spellings are present the canonical
/// key wins and the label is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseInput {
    #[serde(rename = "caseNarrative", skip_serializing_if = "Option::is_none")]
    pub case_narrative: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,

    #[serde(rename = "modelName", skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

const NARRATIVE_KEYS: &[&str] = &["caseNarrative", "Case Narrative"];
const JURISDICTION_KEYS: &[&str] = &["jurisdiction", "Jurisdiction"];
const MODEL_KEYS: &[&str] = &["modelName", "Model", "model"];
const OPTIONS_KEYS: &[&str] = &[
    "options",
    "Processing Options (optional)",
    "processingOptions",
];

impl<'de> Deserialize<'de> for CaseInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw = Map::<String, Value>::deserialize(deserializer)?;
        let options = match take_first(&mut raw, OPTIONS_KEYS) {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => return Err(wrong_type(OPTIONS_KEYS[0], "an object", &other)),
        };
        Ok(Self {
            case_narrative: take_string::<D::Error>(&mut raw, NARRATIVE_KEYS)?,
            jurisdiction: take_string::<D::Error>(&mut raw, JURISDICTION_KEYS)?,
            model_name: take_string::<D::Error>(&mut raw, MODEL_KEYS)?,
            options,
        })
    }
}

/// First non-null value among `keys`, in priority order.
fn take_first(raw: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|k| raw.remove(*k))
        .find(|v| !v.is_null())
}

fn take_string<E: de::Error>(
    raw: &mut Map<String, Value>,
    keys: &[&str],
) -> Result<Option<String>, E> {
    match take_first(raw, keys) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(wrong_type(keys[0], "a string", &other)),
    }
}

fn wrong_type<E: de::Error>(key: &str, expected: &str, got: &Value) -> E {
    E::custom(format!("invalid type for \"{key}\": expected {expected}, got {got}"))
}

impl CaseInput {
    pub fn from_narrative(narrative: impl Into<String>) -> Self {
        Self {
            case_narrative: Some(narrative.into()),
            ..Default::default()
        }
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    pub fn with_option(mut self, key: &str, value: Value) -> Self {
        self.options
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        self
    }

    /// Validated, trimmed narrative.
    pub fn narrative(&self) -> Result<CaseNarrative, TribunalError> {
        CaseNarrative::parse(self.case_narrative.as_deref().unwrap_or_default())
    }

    /// Trimmed jurisdiction; blank becomes `None`.
    pub fn jurisdiction(&self) -> Option<String> {
        non_blank(self.jurisdiction.as_deref())
    }

    /// Trimmed model name; blank becomes `None`.
    pub fn model_name(&self) -> Option<String> {
        non_blank(self.model_name.as_deref())
    }

    pub fn options(&self) -> CaseOptions {
        CaseOptions::new(self.options.clone().unwrap_or_default())
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A case narrative that is guaranteed non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CaseNarrative(String);

impl CaseNarrative {
    pub fn parse(raw: &str) -> Result<Self, TribunalError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TribunalError::Validation(
                "Missing \"caseNarrative\".".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased copy used by keyword heuristics.
    pub fn lowercase(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for CaseNarrative {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Free-form processing options with typed accessors for the keys the
/// pipeline understands. The raw map is kept intact for the decision prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseOptions {
    raw: Map<String, Value>,
}

impl CaseOptions {
    pub fn new(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    /// Run the LYRA grief/theme scan (default on).
    pub fn grief_scan(&self) -> bool {
        self.flag("griefScan")
    }

    /// Run the AEGIS fairness audit (default on).
    pub fn run_fairness_audit(&self) -> bool {
        self.flag("runFairnessAudit")
    }

    /// Run the VESTA ritual suggestion (default on).
    pub fn ritual_suggest(&self) -> bool {
        self.flag("ritualSuggest")
    }

    pub fn max_sources(&self) -> u64 {
        self.raw
            .get("maxSources")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_SOURCES)
    }

    /// Optional severity hint forwarded to the ritual analyzer.
    pub fn tier_hint(&self) -> Option<String> {
        self.raw
            .get("tier")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }

    fn flag(&self, key: &str) -> bool {
        self.raw.get(key).and_then(Value::as_bool).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camel_case_body_parses() {
        let input: CaseInput = serde_json::from_value(json!({
            "caseNarrative": "  A neighbour damaged the community garden.  ",
            "jurisdiction": "NZ",
            "modelName": "gpt-4o",
            "options": { "griefScan": false }
        }))
        .unwrap();
        assert_eq!(
            input.narrative().unwrap().as_str(),
            "A neighbour damaged the community garden."
        );
        assert_eq!(input.jurisdiction().as_deref(), Some("NZ"));
        assert_eq!(input.model_name().as_deref(), Some("gpt-4o"));
        assert!(!input.options().grief_scan());
    }

    #[test]
    fn intake_form_labels_are_aliases() {
        let input: CaseInput = serde_json::from_value(json!({
            "Case Narrative": "Harm was done.",
            "Jurisdiction": "AU",
            "Model": "gpt-4.1",
            "Processing Options (optional)": { "maxSources": 3 }
        }))
        .unwrap();
        assert_eq!(input.narrative().unwrap().as_str(), "Harm was done.");
        assert_eq!(input.jurisdiction().as_deref(), Some("AU"));
        assert_eq!(input.model_name().as_deref(), Some("gpt-4.1"));
        assert_eq!(input.options().max_sources(), 3);
    }

    #[test]
    fn canonical_key_wins_over_intake_label() {
        let input: CaseInput = serde_json::from_value(json!({
            "caseNarrative": "Canonical text.",
            "Case Narrative": "Label text.",
            "Jurisdiction": "AU",
            "jurisdiction": "NZ"
        }))
        .unwrap();
        assert_eq!(input.narrative().unwrap().as_str(), "Canonical text.");
        assert_eq!(input.jurisdiction().as_deref(), Some("NZ"));
    }

    #[test]
    fn null_canonical_key_falls_back_to_label() {
        let input: CaseInput = serde_json::from_value(json!({
            "caseNarrative": null,
            "Case Narrative": "Label text."
        }))
        .unwrap();
        assert_eq!(input.narrative().unwrap().as_str(), "Label text.");
    }

    #[test]
    fn wrong_field_types_are_rejected() {
        assert!(serde_json::from_value::<CaseInput>(json!({ "caseNarrative": 42 })).is_err());
        assert!(serde_json::from_value::<CaseInput>(json!({ "caseNarrative": "x", "options": [] })).is_err());
        assert!(serde_json::from_value::<CaseInput>(json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn missing_narrative_is_validation_error() {
        let input: CaseInput = serde_json::from_value(json!({ "jurisdiction": "NZ" })).unwrap();
        let err = input.narrative().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Missing \"caseNarrative\".");
    }

    #[test]
    fn whitespace_narrative_is_validation_error() {
        assert!(CaseNarrative::parse(" \n\t ").unwrap_err().is_validation());
    }

    #[test]
    fn blank_jurisdiction_becomes_none() {
        let input = CaseInput::from_narrative("x").with_jurisdiction("   ");
        assert_eq!(input.jurisdiction(), None);
    }

    #[test]
    fn options_default_to_enabled() {
        let opts = CaseOptions::default();
        assert!(opts.grief_scan());
        assert!(opts.run_fairness_audit());
        assert!(opts.ritual_suggest());
        assert_eq!(opts.max_sources(), DEFAULT_MAX_SOURCES);
        assert_eq!(opts.tier_hint(), None);
    }

    #[test]
    fn unknown_option_keys_survive() {
        let input = CaseInput::from_narrative("x").with_option("tone", json!("gentle"));
        assert_eq!(input.options().to_value(), json!({ "tone": "gentle" }));
    }
}
