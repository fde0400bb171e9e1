use async_trait::async_trait;
use tracing::{debug, warn};
use veritas_ai::{Analyzer, AnalyzerError};
use veritas_core::{AnalyzerKind, AnalyzerRequest, AnalyzerResult, PollPolicy};

use crate::http::{ActorClient, ActorRun, RunStatus, SyncError};

/// Key under which an actor persists its final result.
pub const OUTPUT_KEY: &str = "OUTPUT";

/// An analyzer executed as a hosted actor run.
///
/// Without a client (no credential configured) every call fails fast with
/// [`AnalyzerError::Unavailable`] and performs no network I/O.
pub struct RemoteAnalyzer {
    kind: AnalyzerKind,
    actor_id: String,
    client: Option<ActorClient>,
    poll: PollPolicy,
}

impl RemoteAnalyzer {
    pub fn new(
        kind: AnalyzerKind,
        actor_id: impl Into<String>,
        client: Option<ActorClient>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            kind,
            actor_id: actor_id.into(),
            client,
            poll,
        }
    }

    async fn wait_for_terminal(
        &self,
        client: &ActorClient,
        mut run: ActorRun,
    ) -> Result<ActorRun, AnalyzerError> {
        for _ in 0..self.poll.attempts {
            if run.run_status().is_terminal() {
                break;
            }
            tokio::time::sleep(self.poll.interval).await;
            run = client.get_run(&run.id).await.map_err(transport)?;
        }
        Ok(run)
    }
}

fn transport(e: SyncError) -> AnalyzerError {
    AnalyzerError::Transport(e.to_string())
}

#[async_trait]
impl Analyzer for RemoteAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    fn id(&self) -> &str {
        &self.actor_id
    }

    async fn analyze(&self, request: &AnalyzerRequest) -> Result<AnalyzerResult, AnalyzerError> {
        let Some(client) = &self.client else {
            return Err(AnalyzerError::Unavailable);
        };

        let input = request.to_actor_input(self.kind);
        let run = client
            .start_run(&self.actor_id, &input)
            .await
            .map_err(transport)?;
        let run = self.wait_for_terminal(client, run).await?;

        match run.run_status() {
            RunStatus::Succeeded => {}
            status if status.is_terminal() => {
                warn!(actor = %self.actor_id, run_id = %run.id, status = %run.status, "actor run did not succeed");
                return Err(AnalyzerError::RunFailed {
                    run_id: run.id,
                    status: run.status,
                });
            }
            _ => {
                return Err(AnalyzerError::PollExhausted {
                    run_id: run.id,
                    status: run.status,
                    attempts: self.poll.attempts,
                });
            }
        }

        let store_id = run
            .default_key_value_store_id
            .as_deref()
            .ok_or(AnalyzerError::NoOutput)?;
        let output = client
            .get_record(store_id, OUTPUT_KEY)
            .await
            .map_err(transport)?
            .ok_or(AnalyzerError::NoOutput)?;
        debug!(actor = %self.actor_id, run_id = %run.id, "fetched actor output");

        AnalyzerResult::from_output(self.kind, output)
            .map_err(|e| AnalyzerError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use veritas_core::CaseNarrative;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_poll(attempts: u32) -> PollPolicy {
        PollPolicy {
            attempts,
            interval: Duration::from_millis(5),
        }
    }

    fn request() -> AnalyzerRequest {
        AnalyzerRequest::new(CaseNarrative::parse("He was afraid after the threats.").unwrap())
    }

    async fn mount_run(server: &MockServer, actor: &str, start_status: &str, poll_status: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v2/acts/{actor}/runs")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "id": "run1", "status": start_status, "defaultKeyValueStoreId": "kv1" }
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/actor-runs/run1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "run1", "status": poll_status, "defaultKeyValueStoreId": "kv1" }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn no_client_is_unavailable() {
        let analyzer = RemoteAnalyzer::new(AnalyzerKind::Themes, "lyra", None, fast_poll(3));
        let err = analyzer.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Unavailable));
        assert_eq!(err.to_string(), "unavailable");
    }

    #[tokio::test]
    async fn succeeded_run_yields_typed_output() {
        let server = MockServer::start().await;
        mount_run(&server, "veritas-reflection-intake", "RUNNING", "SUCCEEDED").await;
        Mock::given(method("GET"))
            .and(path("/v2/key-value-stores/kv1/records/OUTPUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "themes": ["fear"],
                "snippets": ["afraid"],
                "notes": "LYRA stub"
            })))
            .mount(&server)
            .await;

        let client = ActorClient::with_base_url(server.uri(), "tok".into());
        let analyzer = RemoteAnalyzer::new(
            AnalyzerKind::Themes,
            "veritas-reflection-intake",
            Some(client),
            fast_poll(5),
        );
        let result = analyzer.analyze(&request()).await.unwrap();
        let AnalyzerResult::Themes(themes) = result else {
            panic!("expected themes");
        };
        assert_eq!(themes.themes, vec!["fear"]);
    }

    #[tokio::test]
    async fn failed_run_is_error() {
        let server = MockServer::start().await;
        mount_run(&server, "veritas-fairness-audit", "RUNNING", "FAILED").await;

        let client = ActorClient::with_base_url(server.uri(), "tok".into());
        let analyzer = RemoteAnalyzer::new(
            AnalyzerKind::Fairness,
            "veritas-fairness-audit",
            Some(client),
            fast_poll(5),
        );
        let err = analyzer.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::RunFailed { ref status, .. } if status == "FAILED"));
    }

    #[tokio::test]
    async fn run_that_never_finishes_exhausts_polls() {
        let server = MockServer::start().await;
        mount_run(&server, "veritas-ritual-suggestor", "READY", "RUNNING").await;

        let client = ActorClient::with_base_url(server.uri(), "tok".into());
        let analyzer = RemoteAnalyzer::new(
            AnalyzerKind::Ritual,
            "veritas-ritual-suggestor",
            Some(client),
            fast_poll(3),
        );
        let err = analyzer.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::PollExhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn malformed_output_is_error() {
        let server = MockServer::start().await;
        mount_run(&server, "veritas-ritual-suggestor", "SUCCEEDED", "SUCCEEDED").await;
        Mock::given(method("GET"))
            .and(path("/v2/key-value-stores/kv1/records/OUTPUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
            .mount(&server)
            .await;

        let client = ActorClient::with_base_url(server.uri(), "tok".into());
        let analyzer = RemoteAnalyzer::new(
            AnalyzerKind::Ritual,
            "veritas-ritual-suggestor",
            Some(client),
            fast_poll(3),
        );
        let err = analyzer.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Malformed(_)));
    }
}
