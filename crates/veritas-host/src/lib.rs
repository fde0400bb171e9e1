//! Tribunal host: fans a case out to the LYRA, AEGIS and VESTA analyzers,
//! hands their combined context to JUNO, and returns the verdict record.

pub mod bookkeeping;
mod invoker;

use std::sync::Arc;

use futures::future::OptionFuture;
use tracing::{info, warn};
use veritas_ai::{
    Analyzer, DecisionBackend, DecisionRequest, FairnessAuditor, OpenAiBackend, RitualSuggestor,
    StubBackend, ThemeScanner, VerdictSynthesizer,
};
use veritas_core::{
    AnalyzerContext, AnalyzerDiagnostic, AnalyzerKind, AnalyzerRequest, CaseInput, Diagnostics,
    TribunalConfig, TribunalError, VerdictRecord,
};
use veritas_sync::{ActorClient, RemoteAnalyzer};

pub use bookkeeping::{Bookkeeper, BookkeepingError, StoreBookkeeper};
pub use invoker::{Invocation, invoke};

/// One analyzer per kind.
#[derive(Clone)]
pub struct Analyzers {
    pub themes: Arc<dyn Analyzer>,
    pub fairness: Arc<dyn Analyzer>,
    pub ritual: Arc<dyn Analyzer>,
}

impl Analyzers {
    /// Keyword heuristics; no network I/O.
    pub fn local() -> Self {
        Self {
            themes: Arc::new(ThemeScanner),
            fairness: Arc::new(FairnessAuditor),
            ritual: Arc::new(RitualSuggestor),
        }
    }

    /// Hosted actor runs. Without an actor credential every analyzer
    /// reports `unavailable`.
    pub fn remote(config: &TribunalConfig) -> Self {
        let client = config
            .actor_credentials
            .token()
            .map(|token| ActorClient::with_base_url(config.actor_api_url.clone(), token.to_string()));
        let build = |kind: AnalyzerKind| -> Arc<dyn Analyzer> {
            Arc::new(RemoteAnalyzer::new(
                kind,
                config.actors.for_kind(kind),
                client.clone(),
                config.poll,
            ))
        };
        Self {
            themes: build(AnalyzerKind::Themes),
            fairness: build(AnalyzerKind::Fairness),
            ritual: build(AnalyzerKind::Ritual),
        }
    }

    pub fn get(&self, kind: AnalyzerKind) -> &dyn Analyzer {
        match kind {
            AnalyzerKind::Themes => self.themes.as_ref(),
            AnalyzerKind::Fairness => self.fairness.as_ref(),
            AnalyzerKind::Ritual => self.ritual.as_ref(),
        }
    }
}

/// The case-processing pipeline. Cheap to clone and safe to share between
/// concurrent requests.
#[derive(Clone)]
pub struct Tribunal {
    config: Arc<TribunalConfig>,
    analyzers: Analyzers,
    synthesizer: VerdictSynthesizer,
}

impl Tribunal {
    pub fn new(
        config: Arc<TribunalConfig>,
        analyzers: Analyzers,
        synthesizer: VerdictSynthesizer,
    ) -> Self {
        Self {
            config,
            analyzers,
            synthesizer,
        }
    }

    /// Wire analyzers and the decision backend from configuration.
    pub fn from_config(config: Arc<TribunalConfig>) -> Self {
        let remote = config.uses_remote_analyzers();
        let analyzers = if remote {
            Analyzers::remote(&config)
        } else {
            Analyzers::local()
        };
        let backend: Arc<dyn DecisionBackend> = match config.model_credentials.token() {
            Some(key) => Arc::new(OpenAiBackend::with_base_url(
                config.openai_api_url.clone(),
                key.to_string(),
            )),
            None => Arc::new(StubBackend),
        };
        info!(
            mode = ?config.analyzer_mode,
            remote_analyzers = remote,
            backend = backend.name(),
            "tribunal configured"
        );
        Self::new(config, analyzers, VerdictSynthesizer::new(backend))
    }

    pub fn config(&self) -> &TribunalConfig {
        &self.config
    }

    /// Process one case into a verdict record.
    ///
    /// Only a missing or blank narrative is an error. Analyzer and backend
    /// failures reduce the record's content instead.
    pub async fn process_case(&self, input: CaseInput) -> Result<VerdictRecord, TribunalError> {
        let narrative = input.narrative()?;
        let options = input.options();
        let request = AnalyzerRequest::new(narrative.clone())
            .with_tier_hint(options.tier_hint())
            .with_max_sources(options.max_sources());

        let (themes, fairness, ritual) = tokio::join!(
            self.run_enabled(AnalyzerKind::Themes, options.grief_scan(), &request),
            self.run_enabled(AnalyzerKind::Fairness, options.run_fairness_audit(), &request),
            self.run_enabled(AnalyzerKind::Ritual, options.ritual_suggest(), &request),
        );

        let mut context = AnalyzerContext::default();
        let mut diagnostics = Diagnostics::default();
        for (kind, outcome) in [
            (AnalyzerKind::Themes, themes),
            (AnalyzerKind::Fairness, fairness),
            (AnalyzerKind::Ritual, ritual),
        ] {
            diagnostics.record(kind, absorb(kind, outcome, &mut context));
        }

        let requested_model = input.model_name();
        let decision = DecisionRequest {
            narrative,
            jurisdiction: input.jurisdiction(),
            options: options.to_value(),
            model: self
                .config
                .resolve_model(requested_model.as_deref())
                .to_string(),
            context,
        };

        let mut record = self.synthesizer.synthesize(&decision).await;
        if self.config.include_diagnostics {
            record.diagnostics = Some(diagnostics);
        }
        Ok(record)
    }

    /// [`process_case`](Self::process_case) followed by usage charging and
    /// output persistence. Bookkeeping failures never reach the caller.
    pub async fn process_and_record(
        &self,
        input: CaseInput,
        bookkeeper: &dyn Bookkeeper,
    ) -> Result<VerdictRecord, TribunalError> {
        let record = self.process_case(input).await?;
        bookkeeping::record_verdict(&record, bookkeeper);
        Ok(record)
    }

    async fn run_enabled(
        &self,
        kind: AnalyzerKind,
        enabled: bool,
        request: &AnalyzerRequest,
    ) -> Option<Invocation> {
        let timeout = self.config.analyzer_timeout;
        OptionFuture::from(enabled.then(|| invoke(self.analyzers.get(kind), request, timeout))).await
    }
}

/// Fold one analyzer outcome into the context and describe it.
fn absorb(
    kind: AnalyzerKind,
    outcome: Option<Invocation>,
    context: &mut AnalyzerContext,
) -> AnalyzerDiagnostic {
    let Some(invocation) = outcome else {
        return AnalyzerDiagnostic {
            skipped: true,
            contributed: false,
            error: None,
        };
    };
    if let Some(error) = &invocation.error {
        warn!(analyzer = kind.codename(), error = %error, "analyzer degraded");
    }
    let contributed = invocation.result.is_some();
    if let Some(result) = invocation.result {
        context.insert(result);
    }
    AnalyzerDiagnostic {
        skipped: false,
        contributed,
        error: invocation.error,
    }
}
