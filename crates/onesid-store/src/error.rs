use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file I/O failed at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no configuration directory available for the session file")]
    NoConfigDir,

    #[error("{0}")]
    Other(String),
}
