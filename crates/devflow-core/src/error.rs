use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevflowError {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Content service errors
    #[error("Content service request failed: {0}")]
    ContentService(String),

    #[error("Content service returned wrong shape for {template}: expected {expected}")]
    SchemaMismatch { template: String, expected: String },

    // Graph errors
    #[error("No edge for label '{label}' out of node '{node}'")]
    UnknownBranch { node: String, label: String },

    #[error("Run exceeded the node visit ceiling ({limit})")]
    LoopLimitExceeded { limit: usize },

    #[error("Run cancelled")]
    Cancelled,

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DevflowError>;
