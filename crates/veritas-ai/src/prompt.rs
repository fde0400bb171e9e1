//! JUNO decision prompt.

use serde_json::Value;
use veritas_core::{AnalyzerContext, AnalyzerKind, CaseNarrative};

// ── Prompt templates ──

pub const ROLE: &str = "JUNO, Veritas Tribunal";
pub const GOAL: &str =
    "Assign a proportional JSS tier; ensure grief/fairness; propose restoration.";
pub const BACKSTORY: &str =
    "Lead judicial agent in Veritas.O; restoration-first; consent & safety; reversibility.";

/// System message carrying JUNO's role, goal and backstory.
pub fn system_prompt() -> String {
    format!("You are {ROLE}.\nGoal: {GOAL}\nBackstory: {BACKSTORY}")
}

const INSTRUCTIONS: &str = "\
Instructions:
1) Summarize harm, needs, safety constraints (short).
2) Assign a JSS tier (S1, S2, S3, ...) with a 1-2 sentence justification.
3) Use LYRA output to explain grief or narrative themes when present.
4) Use AEGIS output to report a fairnessScore between 0 and 1 and list any top citations.
5) Use VESTA output to choose or refine a ritual suggestion and a short repair plan.

Output JSON schema:
{
  \"tier\": string,            // e.g. \"S2\"
  \"remedy\": string,          // recommended remedy
  \"fairnessScore\": number|null,
  \"ritual\": string|null,
  \"notes\": string,
  \"citations\": [string]
}

Example output:
{
  \"tier\": \"S2\",
  \"remedy\": \"Shared Soil + 20 hrs community repair\",
  \"fairnessScore\": 0.92,
  \"ritual\": \"Shared Soil\",
  \"notes\": \"Restoration-first; safety plan present.\",
  \"citations\": [\"source1\", \"source2\"]
}

Produce the JSON object and nothing else.";

/// Everything the decision backend needs for one case. Built after all
/// analyzers have resolved.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub narrative: CaseNarrative,
    pub jurisdiction: Option<String>,
    pub options: Value,
    pub model: String,
    pub context: AnalyzerContext,
}

impl DecisionRequest {
    /// Render the user prompt with analyzer outputs substituted as JSON.
    pub fn user_prompt(&self) -> String {
        let options = serde_json::to_string(&self.options).unwrap_or_else(|_| "{}".into());
        let [lyra, aegis, vesta] = AnalyzerKind::ALL.map(|kind| self.context_value(kind));
        format!(
            "You are JUNO, the Veritas.O judicial agent. You will produce ONLY a JSON object matching the schema at the end.\n\
             \n\
             CASE:\n\
             {case}\n\
             \n\
             JURISDICTION: {jurisdiction}\n\
             OPTIONS: {options}\n\
             \n\
             Context: If available, you will be provided with outputs from helper actors:\n\
             - LYRA (grief/narrative themes): {lyra}\n\
             - AEGIS (fairness audit): {aegis}\n\
             - VESTA (ritual suggestion): {vesta}\n\
             \n\
             {INSTRUCTIONS}\n",
            case = self.narrative.as_str(),
            jurisdiction = self.jurisdiction.as_deref().unwrap_or("unspecified"),
        )
    }

    fn context_value(&self, kind: AnalyzerKind) -> String {
        serde_json::to_string(&self.context.context_value(kind)).unwrap_or_else(|_| "{}".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use veritas_core::FairnessResult;

    fn request(context: AnalyzerContext) -> DecisionRequest {
        DecisionRequest {
            narrative: CaseNarrative::parse("A fence was burned down.").unwrap(),
            jurisdiction: None,
            options: json!({}),
            model: "gpt-4.1-mini".into(),
            context,
        }
    }

    #[test]
    fn absent_analyzers_render_as_empty_objects() {
        let prompt = request(AnalyzerContext::default()).user_prompt();
        assert!(prompt.contains("- LYRA (grief/narrative themes): {}"));
        assert!(prompt.contains("- AEGIS (fairness audit): {}"));
        assert!(prompt.contains("- VESTA (ritual suggestion): {}"));
    }

    #[test]
    fn jurisdiction_defaults_to_unspecified() {
        let prompt = request(AnalyzerContext::default()).user_prompt();
        assert!(prompt.contains("JURISDICTION: unspecified"));
        assert!(prompt.contains("CASE:\nA fence was burned down."));
    }

    #[test]
    fn analyzer_output_is_embedded_as_json() {
        let context = AnalyzerContext {
            fairness: Some(FairnessResult {
                fairness_score: 0.667,
                citations: vec!["note: potential mention of 'class'".into()],
                notes: None,
            }),
            ..Default::default()
        };
        let prompt = request(context).user_prompt();
        let aegis_line = prompt
            .lines()
            .find(|l| l.starts_with("- AEGIS (fairness audit): "))
            .unwrap();
        assert!(aegis_line.contains(r#""fairnessScore":0.667"#));
        assert!(aegis_line.contains(r#""citations":["note: potential mention of 'class'"]"#));
    }

    #[test]
    fn schema_and_example_present() {
        let prompt = request(AnalyzerContext::default()).user_prompt();
        assert!(prompt.contains("Output JSON schema:"));
        assert!(prompt.ends_with("Produce the JSON object and nothing else.\n"));
        assert!(system_prompt().contains("restoration-first"));
    }
}
