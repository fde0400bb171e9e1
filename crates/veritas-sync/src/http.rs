//! HTTP client for the hosted actor runtime's run API.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use veritas_core::config::DEFAULT_ACTOR_API_URL;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lifecycle state of an actor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    Aborting,
    Aborted,
    TimingOut,
    TimedOut,
    Unknown,
}

impl RunStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "READY" => Self::Ready,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "ABORTING" => Self::Aborting,
            "ABORTED" => Self::Aborted,
            "TIMING-OUT" => Self::TimingOut,
            "TIMED-OUT" => Self::TimedOut,
            _ => Self::Unknown,
        }
    }

    /// Whether the run will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Aborted | Self::TimedOut
        )
    }
}

/// The subset of run metadata the pipeline needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRun {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub default_key_value_store_id: Option<String>,
}

impl ActorRun {
    pub fn run_status(&self) -> RunStatus {
        RunStatus::parse(&self.status)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Client for the hosted actor runtime: start runs, poll them, and read the
/// `OUTPUT` record they persist.
#[derive(Clone)]
pub struct ActorClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ActorClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(DEFAULT_ACTOR_API_URL.to_string(), token)
    }

    /// `base_url` should be like `https://api.apify.com` (no trailing slash).
    pub fn with_base_url(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a run of `actor_id` with `input` as the run input.
    pub async fn start_run(&self, actor_id: &str, input: &Value) -> Result<ActorRun, SyncError> {
        let url = format!("{}/v2/acts/{}/runs", self.base_url, path_actor_id(actor_id));

        info!(url = %url, actor = actor_id, "starting actor run");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;
        let run: Envelope<ActorRun> = Self::check(resp).await?.json().await?;
        info!(run_id = %run.data.id, status = %run.data.status, "actor run started");
        Ok(run.data)
    }

    /// Fetch the current state of a run.
    pub async fn get_run(&self, run_id: &str) -> Result<ActorRun, SyncError> {
        let url = format!("{}/v2/actor-runs/{}", self.base_url, run_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let run: Envelope<ActorRun> = Self::check(resp).await?.json().await?;
        debug!(run_id, status = %run.data.status, "polled actor run");
        Ok(run.data)
    }

    /// Read a record from a key-value store. `None` when the key is absent.
    pub async fn get_record(&self, store_id: &str, key: &str) -> Result<Option<Value>, SyncError> {
        let url = format!(
            "{}/v2/key-value-stores/{}/records/{}",
            self.base_url, store_id, key
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = Self::check(resp).await?.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

/// The run API addresses `user/actor` ids as `user~actor`.
fn path_actor_id(actor_id: &str) -> String {
    actor_id.replace('/', "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn terminal_states() {
        for s in ["SUCCEEDED", "FAILED", "ABORTED", "TIMED-OUT"] {
            assert!(RunStatus::parse(s).is_terminal(), "{s} should be terminal");
        }
        for s in ["READY", "RUNNING", "ABORTING", "TIMING-OUT", "weird"] {
            assert!(!RunStatus::parse(s).is_terminal(), "{s} should not be terminal");
        }
    }

    #[test]
    fn actor_id_slash_becomes_tilde() {
        assert_eq!(path_actor_id("veritas/fairness-audit"), "veritas~fairness-audit");
        assert_eq!(path_actor_id("veritas-fairness-audit"), "veritas-fairness-audit");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ActorClient::with_base_url("http://localhost:4000/".into(), "t".into());
        assert_eq!(client.base_url(), "http://localhost:4000");
    }

    #[tokio::test]
    async fn start_run_posts_input_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/acts/veritas-fairness-audit/runs"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({ "caseNarrative": "x", "maxSources": 10 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "id": "run1", "status": "READY", "defaultKeyValueStoreId": "kv1" }
            })))
            .mount(&server)
            .await;

        let client = ActorClient::with_base_url(server.uri(), "tok".into());
        let run = client
            .start_run(
                "veritas-fairness-audit",
                &json!({ "caseNarrative": "x", "maxSources": 10 }),
            )
            .await
            .unwrap();
        assert_eq!(run.id, "run1");
        assert_eq!(run.run_status(), RunStatus::Ready);
        assert_eq!(run.default_key_value_store_id.as_deref(), Some("kv1"));
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/key-value-stores/kv1/records/OUTPUT"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = ActorClient::with_base_url(server.uri(), "tok".into());
        assert!(client.get_record("kv1", "OUTPUT").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/actor-runs/run1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ActorClient::with_base_url(server.uri(), "tok".into());
        match client.get_run("run1").await {
            Err(SyncError::Server { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }
}
