use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("manifest not found: {0}")]
    ManifestNotFound(std::path::PathBuf),

    #[error("manifest parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store key: {0:?}")]
    InvalidKey(String),
}
