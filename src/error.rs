//! Error types shared across the crate

use thiserror::Error;

use crate::config::Environment;

/// Failures of a single call to the generation proxy
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// Deadline exceeded; the in-flight request was dropped
    #[error("{}", timeout_message(*environment))]
    Timeout { environment: Environment },

    /// Upstream model overloaded (HTTP 503 or "overloaded" payload)
    #[error("Model overloaded ({status}): {body}")]
    Overloaded { status: u16, body: String },

    #[error("Backend error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Timeouts and overloads are worth another attempt; everything else is final
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Overloaded { .. })
    }

    /// Classify a non-2xx response
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 503 || body.to_lowercase().contains("overloaded") {
            Self::Overloaded { status, body }
        } else {
            Self::Http { status, body }
        }
    }
}

fn timeout_message(environment: Environment) -> &'static str {
    match environment {
        Environment::Production => {
            "O servidor demorou muito para responder. Tente novamente em alguns instantes."
        }
        Environment::Development => {
            "Tempo esgotado. Verifique se o servidor local está rodando."
        }
    }
}

/// Failures inside the structured generation pipeline
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Response is not valid JSON for the expected shape: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response violates the expected shape: {0}")]
    Schema(String),

    #[error("Request kind not supported here: {0}")]
    Unsupported(&'static str),
}

/// Failures of the image acquisition paths (never surfaced to callers)
#[derive(Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("No image in model response")]
    MissingImage,

    #[error("Image payload too small ({0} chars)")]
    TooSmall(usize),

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local persistence failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Store entitlements selected but no store bridge was provided")]
    MissingStoreBridge,
}

/// Failures while assembling the application state
#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Failures of the caller layer
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            BackendError::from_status(503, "unavailable".into()),
            BackendError::Overloaded { status: 503, .. }
        ));
        assert!(matches!(
            BackendError::from_status(500, "{\"error\":\"The model is overloaded\"}".into()),
            BackendError::Overloaded { status: 500, .. }
        ));
        assert!(matches!(
            BackendError::from_status(400, "bad request".into()),
            BackendError::Http { status: 400, .. }
        ));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(BackendError::Timeout { environment: Environment::Production }.is_retryable());
        assert!(BackendError::from_status(503, String::new()).is_retryable());
        assert!(!BackendError::from_status(400, String::new()).is_retryable());
        assert!(!BackendError::Network("reset".into()).is_retryable());
    }

    #[test]
    fn test_timeout_message_per_environment() {
        let prod = BackendError::Timeout { environment: Environment::Production }.to_string();
        let dev = BackendError::Timeout { environment: Environment::Development }.to_string();
        assert!(prod.contains("Tente novamente"));
        assert!(dev.contains("servidor local"));
    }
}
