//! Immutable tribunal configuration.
//!
//! Built once per process (defaults, then environment, then CLI flags) and
//! shared read-only by every request.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{AnalyzerKind, TribunalError};

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const ALLOWED_MODELS: &[&str] = &["gpt-4.1", "gpt-4.1-mini", "gpt-4o", "gpt-4o-mini"];
pub const DEFAULT_ACTOR_API_URL: &str = "https://api.apify.com";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com";

pub const ENV_ACTOR_TOKEN: &str = "APIFY_TOKEN";
pub const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ACTOR_API_URL: &str = "VERITAS_API_BASE_URL";
pub const ENV_ANALYZER_MODE: &str = "VERITAS_ANALYZER_MODE";
pub const ENV_DIAGNOSTICS: &str = "VERITAS_DIAGNOSTICS";

/// A bearer-style secret. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials(Option<String>);

impl Credentials {
    pub fn new(token: Option<String>) -> Self {
        Self(token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credentials(***)"),
            None => f.write_str("Credentials(None)"),
        }
    }
}

/// Which analyzer implementations the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyzerMode {
    /// Hosted actors when a credential is configured, local heuristics otherwise.
    #[default]
    Auto,
    /// Hosted actors only; without a credential every analyzer is unavailable.
    Remote,
    /// Local keyword heuristics only.
    Local,
}

impl FromStr for AnalyzerMode {
    type Err = TribunalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(TribunalError::Config(format!(
                "unknown analyzer mode {other:?} (expected auto, remote or local)"
            ))),
        }
    }
}

/// Poll schedule for asynchronous actor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        // ~30s ceiling.
        Self {
            attempts: 30,
            interval: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    pub fn ceiling(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// Hosted actor identifiers for the three analyzers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorIds {
    pub themes: String,
    pub fairness: String,
    pub ritual: String,
}

impl Default for ActorIds {
    fn default() -> Self {
        Self {
            themes: "veritas-reflection-intake".into(),
            fairness: "veritas-fairness-audit".into(),
            ritual: "veritas-ritual-suggestor".into(),
        }
    }
}

impl ActorIds {
    pub fn for_kind(&self, kind: AnalyzerKind) -> &str {
        match kind {
            AnalyzerKind::Themes => &self.themes,
            AnalyzerKind::Fairness => &self.fairness,
            AnalyzerKind::Ritual => &self.ritual,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TribunalConfig {
    pub actors: ActorIds,
    pub actor_api_url: String,
    pub actor_credentials: Credentials,
    pub analyzer_mode: AnalyzerMode,
    pub poll: PollPolicy,
    /// Per-analyzer ceiling covering run start, polling and output fetch.
    pub analyzer_timeout: Duration,
    pub openai_api_url: String,
    pub model_credentials: Credentials,
    pub allowed_models: Vec<String>,
    pub default_model: String,
    pub include_diagnostics: bool,
}

impl Default for TribunalConfig {
    fn default() -> Self {
        let poll = PollPolicy::default();
        Self {
            actors: ActorIds::default(),
            actor_api_url: DEFAULT_ACTOR_API_URL.into(),
            actor_credentials: Credentials::none(),
            analyzer_mode: AnalyzerMode::default(),
            analyzer_timeout: poll.ceiling() + Duration::from_secs(5),
            poll,
            openai_api_url: DEFAULT_OPENAI_API_URL.into(),
            model_credentials: Credentials::none(),
            allowed_models: ALLOWED_MODELS.iter().map(|m| m.to_string()).collect(),
            default_model: DEFAULT_MODEL.into(),
            include_diagnostics: false,
        }
    }
}

impl TribunalConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, TribunalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TribunalError> {
        let mut config = Self {
            actor_credentials: Credentials::new(lookup(ENV_ACTOR_TOKEN)),
            model_credentials: Credentials::new(lookup(ENV_OPENAI_KEY)),
            ..Self::default()
        };
        if let Some(url) = lookup(ENV_ACTOR_API_URL).filter(|u| !u.trim().is_empty()) {
            config.actor_api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(mode) = lookup(ENV_ANALYZER_MODE) {
            config.analyzer_mode = mode.parse()?;
        }
        if let Some(flag) = lookup(ENV_DIAGNOSTICS) {
            config.include_diagnostics = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        Ok(config)
    }

    /// Resolve a requested model against the allow-list.
    pub fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(name) if self.allowed_models.iter().any(|m| m == name) => name,
            Some(name) => {
                tracing::debug!(requested = name, fallback = %self.default_model, "model not allowed");
                &self.default_model
            }
            None => &self.default_model,
        }
    }

    /// Whether hosted actors back the analyzers for this configuration.
    pub fn uses_remote_analyzers(&self) -> bool {
        match self.analyzer_mode {
            AnalyzerMode::Remote => true,
            AnalyzerMode::Local => false,
            AnalyzerMode::Auto => self.actor_credentials.is_configured(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_thirty_second_poll_ceiling() {
        let config = TribunalConfig::default();
        assert_eq!(config.poll.attempts, 30);
        assert_eq!(config.poll.ceiling(), Duration::from_secs(30));
        assert!(config.analyzer_timeout > config.poll.ceiling());
        assert!(!config.include_diagnostics);
    }

    #[test]
    fn model_outside_allow_list_falls_back() {
        let config = TribunalConfig::default();
        assert_eq!(config.resolve_model(Some("gpt-4o")), "gpt-4o");
        assert_eq!(config.resolve_model(Some("llama-3")), DEFAULT_MODEL);
        assert_eq!(config.resolve_model(None), DEFAULT_MODEL);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = TribunalConfig::from_lookup(lookup(&[
            (ENV_ACTOR_TOKEN, "tok"),
            (ENV_ACTOR_API_URL, "http://localhost:9000/"),
            (ENV_ANALYZER_MODE, "remote"),
            (ENV_DIAGNOSTICS, "true"),
        ]))
        .unwrap();
        assert_eq!(config.actor_credentials.token(), Some("tok"));
        assert_eq!(config.actor_api_url, "http://localhost:9000");
        assert_eq!(config.analyzer_mode, AnalyzerMode::Remote);
        assert!(config.include_diagnostics);
        assert!(!config.model_credentials.is_configured());
    }

    #[test]
    fn bad_analyzer_mode_is_config_error() {
        let err = TribunalConfig::from_lookup(lookup(&[(ENV_ANALYZER_MODE, "cloud")])).unwrap_err();
        assert!(matches!(err, TribunalError::Config(_)));
    }

    #[test]
    fn blank_token_is_not_a_credential() {
        assert!(!Credentials::new(Some("   ".into())).is_configured());
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = Credentials::new(Some("secret".into()));
        assert_eq!(format!("{creds:?}"), "Credentials(***)");
    }

    #[test]
    fn auto_mode_follows_credential() {
        let mut config = TribunalConfig::default();
        assert!(!config.uses_remote_analyzers());
        config.actor_credentials = Credentials::new(Some("tok".into()));
        assert!(config.uses_remote_analyzers());
        config.analyzer_mode = AnalyzerMode::Local;
        assert!(!config.uses_remote_analyzers());
    }
}
