use std::sync::Arc;

use tracing::{info, warn};
use veritas_core::VerdictRecord;

use crate::backend::DecisionBackend;
use crate::prompt::DecisionRequest;

/// Turns a resolved [`DecisionRequest`] into a normalised [`VerdictRecord`].
///
/// Never fails: a backend error or a non-conforming response degrades to a
/// notes-only record.
#[derive(Clone)]
pub struct VerdictSynthesizer {
    backend: Arc<dyn DecisionBackend>,
}

impl VerdictSynthesizer {
    pub fn new(backend: Arc<dyn DecisionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn synthesize(&self, request: &DecisionRequest) -> VerdictRecord {
        let record = match self.backend.decide(request).await {
            Ok(raw) => VerdictRecord::from_backend_text(&raw),
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "decision backend failed");
                VerdictRecord::notes_only(format!("decision backend unavailable: {e}"))
            }
        };
        info!(
            backend = self.backend.name(),
            tier = record.tier.as_deref().unwrap_or("-"),
            "verdict synthesized"
        );
        record.with_jurisdiction(request.jurisdiction.clone())
    }
}
