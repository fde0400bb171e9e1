use std::time::Duration;

use tracing::debug;
use veritas_ai::Analyzer;
use veritas_core::{AnalyzerRequest, AnalyzerResult};

/// Outcome of one analyzer invocation. Exactly one side is populated.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub result: Option<AnalyzerResult>,
    pub error: Option<String>,
}

impl Invocation {
    fn succeeded(result: AnalyzerResult) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Run `analyzer` against `request`, bounded by `timeout`.
///
/// Never fails: errors, timeouts and results of the wrong kind all come
/// back as an [`Invocation`] carrying only a message.
pub async fn invoke(
    analyzer: &dyn Analyzer,
    request: &AnalyzerRequest,
    timeout: Duration,
) -> Invocation {
    let kind = analyzer.kind();
    match tokio::time::timeout(timeout, analyzer.analyze(request)).await {
        Ok(Ok(result)) if result.kind() == kind => {
            debug!(analyzer = kind.codename(), id = analyzer.id(), "analyzer contributed");
            Invocation::succeeded(result)
        }
        Ok(Ok(result)) => Invocation::failed(format!(
            "expected {} output, got {}",
            kind.codename(),
            result.kind().codename()
        )),
        Ok(Err(e)) => Invocation::failed(e.to_string()),
        Err(_) => Invocation::failed(format!("timed out after {}ms", timeout.as_millis())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use veritas_ai::{AnalyzerError, ThemeScanner};
    use veritas_core::{AnalyzerKind, CaseNarrative, RitualResult};

    struct Sleepy;

    #[async_trait]
    impl Analyzer for Sleepy {
        fn kind(&self) -> AnalyzerKind {
            AnalyzerKind::Themes
        }

        fn id(&self) -> &str {
            "sleepy"
        }

        async fn analyze(&self, _: &AnalyzerRequest) -> Result<AnalyzerResult, AnalyzerError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(AnalyzerError::NoOutput)
        }
    }

    struct Confused;

    #[async_trait]
    impl Analyzer for Confused {
        fn kind(&self) -> AnalyzerKind {
            AnalyzerKind::Fairness
        }

        fn id(&self) -> &str {
            "confused"
        }

        async fn analyze(&self, _: &AnalyzerRequest) -> Result<AnalyzerResult, AnalyzerError> {
            Ok(AnalyzerResult::Ritual(RitualResult::default()))
        }
    }

    fn request() -> AnalyzerRequest {
        AnalyzerRequest::new(CaseNarrative::parse("She was afraid.").unwrap())
    }

    #[tokio::test]
    async fn success_carries_result_only() {
        let inv = invoke(&ThemeScanner, &request(), Duration::from_secs(1)).await;
        assert!(inv.error.is_none());
        assert!(matches!(inv.result, Some(AnalyzerResult::Themes(_))));
    }

    #[tokio::test]
    async fn timeout_message_names_the_budget() {
        let inv = invoke(&Sleepy, &request(), Duration::from_millis(20)).await;
        assert_eq!(inv, Invocation::failed("timed out after 20ms"));
    }

    #[tokio::test]
    async fn wrong_kind_is_rejected() {
        let inv = invoke(&Confused, &request(), Duration::from_secs(1)).await;
        assert!(inv.result.is_none());
        assert_eq!(inv.error.as_deref(), Some("expected AEGIS output, got VESTA"));
    }
}
