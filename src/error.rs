use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    // Lookup errors
    #[error("Unknown category '{category}'. Valid categories: {}", .valid.join(", "))]
    UnknownCategory { category: String, valid: Vec<String> },

    #[error("Tool '{tool}' not found in category '{category}'")]
    ToolNotFound { category: String, tool: String },

    // Wiring errors
    #[error("No executor registered for category '{0}'")]
    ExecutorMissing(String),

    #[error("Invalid alias table: {0}")]
    InvalidAlias(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // Request errors
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Rate limit exceeded for '{key}', retry in {reset_in}s")]
    RateLimitExceeded { key: String, reset_in: u64 },

    // Executor failures
    #[error("Tool execution failed: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// Short machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCategory { .. } => "unknown_category",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::ExecutorMissing(_) => "executor_missing",
            Self::InvalidAlias(_) => "invalid_alias",
            Self::Config(_) => "invalid_config",
            Self::InvalidParams(_) | Self::Json(_) => "invalid_params",
            Self::RateLimitExceeded { .. } => "rate_limited",
            Self::Execution(_) => "execution_failed",
            Self::Io(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status the transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownCategory { .. } | Self::ToolNotFound { .. } => 404,
            Self::InvalidParams(_) | Self::Json(_) => 400,
            Self::RateLimitExceeded { .. } => 429,
            Self::ExecutorMissing(_) => 501,
            Self::Execution(_) => 502,
            _ => 500,
        }
    }

    /// Serialize as an error body, including the details callers need to self-correct.
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "code": self.code(),
            "message": self.to_string(),
        });

        match self {
            Self::UnknownCategory { category, valid } => {
                error["category"] = json!(category);
                error["validCategories"] = json!(valid);
            }
            Self::ToolNotFound { category, tool } => {
                error["category"] = json!(category);
                error["tool"] = json!(tool);
            }
            Self::RateLimitExceeded { reset_in, .. } => {
                error["resetIn"] = json!(reset_in);
            }
            _ => {}
        }

        json!({ "error": error })
    }
}

// Result type alias for convenience
pub type BrokerResult<T> = Result<T, BrokerError>;

// Executors report failures through anyhow
impl From<anyhow::Error> for BrokerError {
    fn from(err: anyhow::Error) -> Self {
        BrokerError::Execution(format!("{err:#}"))
    }
}
