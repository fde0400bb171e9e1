//! VESTA: ritual and repair-plan suggestion keyed by tier.

use async_trait::async_trait;
use veritas_core::{AnalyzerKind, AnalyzerRequest, AnalyzerResult, RitualResult, Tier};

use crate::{Analyzer, AnalyzerError};

const ECOLOGICAL_CUES: &[&str] = &["community", "garden"];
const ECOLOGICAL_REPAIR: &str = "; include community soil/planting activity";

fn ritual_for(tier: Tier) -> (&'static str, &'static str) {
    match tier {
        Tier::S1 => ("Quiet Witness", "Low-risk family/community repair, <=10 hrs"),
        Tier::S2 => ("Shared Soil", "Community-mediated repair, 10-40 hrs"),
        Tier::S3 => (
            "Circle of Return",
            "High-stakes mentor circle + long-form repair",
        ),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RitualSuggestor;

impl RitualSuggestor {
    /// Suggest a ritual for the hinted tier (unknown hints count as `S2`).
    pub fn suggest(tier_hint: Option<&str>, narrative: &str) -> RitualResult {
        let (ritual, repair) = ritual_for(Tier::from_hint(tier_hint));
        let mut repair_plan = repair.to_string();
        let lower = narrative.to_lowercase();
        if ECOLOGICAL_CUES.iter().any(|cue| lower.contains(cue)) {
            repair_plan.push_str(ECOLOGICAL_REPAIR);
        }
        RitualResult {
            ritual: ritual.to_string(),
            repair_plan,
            notes: Some("VESTA: tier-keyed ritual table".into()),
        }
    }
}

#[async_trait]
impl Analyzer for RitualSuggestor {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Ritual
    }

    fn id(&self) -> &str {
        "local:vesta"
    }

    async fn analyze(&self, request: &AnalyzerRequest) -> Result<AnalyzerResult, AnalyzerError> {
        Ok(AnalyzerResult::Ritual(Self::suggest(
            request.tier_hint(),
            request.narrative().as_str(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tier_is_shared_soil() {
        let r = RitualSuggestor::suggest(None, "A window was broken.");
        assert_eq!(r.ritual, "Shared Soil");
        assert_eq!(r.repair_plan, "Community-mediated repair, 10-40 hrs");
    }

    #[test]
    fn tier_hint_selects_ritual() {
        assert_eq!(RitualSuggestor::suggest(Some("S1"), "x").ritual, "Quiet Witness");
        assert_eq!(RitualSuggestor::suggest(Some("s3"), "x").ritual, "Circle of Return");
        assert_eq!(RitualSuggestor::suggest(Some("S7"), "x").ritual, "Shared Soil");
    }

    #[test]
    fn garden_narrative_adds_planting() {
        let r = RitualSuggestor::suggest(Some("S1"), "They trampled the Garden beds.");
        assert_eq!(
            r.repair_plan,
            "Low-risk family/community repair, <=10 hrs; include community soil/planting activity"
        );
    }
}
