//! LYRA: grief and narrative theme extraction by keyword lookup.

use async_trait::async_trait;
use veritas_core::{AnalyzerKind, AnalyzerRequest, AnalyzerResult, ThemeResult};

use crate::{Analyzer, AnalyzerError};

/// Theme label and the keywords that signal it, checked in order.
const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "bereavement",
        &["loss", "death", "bereavement", "funeral", "lost"],
    ),
    ("anger", &["angry", "rage", "fight", "violence", "assault"]),
    ("fear", &["threat", "afraid", "unsafe", "fear", "threats"]),
    ("guilt", &["sorry", "guilty", "remorse", "remorseful"]),
];

/// Local LYRA analyzer. Deterministic; makes no network calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThemeScanner;

impl ThemeScanner {
    /// Scan `text` for theme keywords. The first keyword hit per theme is
    /// kept as the snippet for that theme.
    pub fn scan(text: &str) -> ThemeResult {
        let lower = text.to_lowercase();
        let mut themes = Vec::new();
        let mut snippets = Vec::new();
        for (theme, keywords) in THEME_KEYWORDS {
            if let Some(hit) = keywords.iter().find(|k| lower.contains(*k)) {
                themes.push(theme.to_string());
                snippets.push(hit.to_string());
            }
        }
        let mut result = ThemeResult::new(themes, snippets);
        result.notes = Some("LYRA: lightweight theme extraction (no LLM)".into());
        result
    }
}

#[async_trait]
impl Analyzer for ThemeScanner {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Themes
    }

    fn id(&self) -> &str {
        "local:lyra"
    }

    async fn analyze(&self, request: &AnalyzerRequest) -> Result<AnalyzerResult, AnalyzerError> {
        Ok(AnalyzerResult::Themes(Self::scan(
            request.narrative().as_str(),
        )))
    }
}
