//! Client for the generation proxy
//!
//! One POST endpoint fronts the generative model. Each call races the
//! request against a hard deadline (dropping the request aborts it) and, for
//! the production deployment, against a cold-start notice timer that only
//! fires while the request is still pending.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use super::http_client::Transport;
use super::progress::{GenerationPhase, GenerationProgress, ProgressSink};
use crate::config::Environment;
use crate::error::BackendError;

/// The proxy's only endpoint; the model is chosen in the body
pub const GENERATE_ENDPOINT: &str = "/api/generate-recipe";

/// How long a production request may stay silent before we warn about a cold start
pub const COLD_START_NOTICE: Duration = Duration::from_secs(5);

const CONNECTING_FRACTION: f32 = 0.05;
const COLD_START_FRACTION: f32 = 0.10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}

impl GenerationConfig {
    /// JSON output constrained by `schema`
    pub fn structured(schema: Value, temperature: f64) -> Self {
        Self {
            response_mime_type: Some("application/json".into()),
            response_schema: Some(schema),
            temperature: Some(temperature),
            response_modalities: None,
        }
    }

    /// Image output
    pub fn image() -> Self {
        Self {
            response_modalities: Some(vec!["IMAGE".into()]),
            ..Default::default()
        }
    }
}

/// Body of a proxy call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub model: String,
    /// Plain prompt string or a model-specific content array
    pub contents: Value,
    pub config: GenerationConfig,
}

impl BackendRequest {
    pub fn text(model: &str, prompt: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            model: model.to_string(),
            contents: Value::String(prompt.into()),
            config,
        }
    }

    /// Prompt plus one inline image part
    pub fn with_inline_image(
        model: &str,
        prompt: &str,
        mime_type: &str,
        data_base64: &str,
        config: GenerationConfig,
    ) -> Self {
        let contents = serde_json::json!([{
            "role": "user",
            "parts": [
                { "inlineData": { "mimeType": mime_type, "data": data_base64 } },
                { "text": prompt }
            ]
        }]);
        Self {
            model: model.to_string(),
            contents,
            config,
        }
    }
}

/// Parsed proxy response, kept verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse(pub Value);

impl BackendResponse {
    /// The model's text output (`.text`)
    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }

    /// First inline image as `(mime_type, base64_data)`
    pub fn inline_image(&self) -> Option<(&str, &str)> {
        if let Some(data) = self.0.get("image").and_then(Value::as_str) {
            let mime = self
                .0
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or("image/png");
            return Some((mime, data));
        }

        self.0
            .get("candidates")?
            .as_array()?
            .iter()
            .filter_map(|c| c.pointer("/content/parts")?.as_array())
            .flatten()
            .find_map(|part| {
                let inline = part.get("inlineData")?;
                let data = inline.get("data")?.as_str()?;
                let mime = inline
                    .get("mimeType")
                    .and_then(Value::as_str)
                    .unwrap_or("image/png");
                Some((mime, data))
            })
    }
}

/// Proxy client bound to one base URL
#[derive(Clone)]
pub struct BackendClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    environment: Environment,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        let environment = Environment::detect(base_url);
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            environment,
            timeout: environment.request_timeout(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// POST `request` to `endpoint`, returning the parsed JSON body
    pub async fn call_backend(
        &self,
        endpoint: &str,
        request: &BackendRequest,
        progress: &dyn ProgressSink,
    ) -> Result<BackendResponse, BackendError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let body = serde_json::to_value(request)
            .map_err(|e| BackendError::InvalidResponse(format!("Unencodable request: {}", e)))?;

        let production = self.environment.is_production();
        if production {
            progress.report(GenerationProgress::new(
                GenerationPhase::Connecting,
                CONNECTING_FRACTION,
            ));
        }

        debug!(model = %request.model, "[Backend] POST {}", url);

        let call = self.transport.post_json(&url, &body);
        let deadline = sleep(self.timeout);
        let cold_start = sleep(COLD_START_NOTICE);
        tokio::pin!(call, deadline, cold_start);
        let mut cold_start_pending = production;

        let result = loop {
            tokio::select! {
                biased;
                result = &mut call => break result,
                _ = &mut deadline => {
                    warn!(
                        "[Backend] Request to {} timed out after {}s",
                        endpoint,
                        self.timeout.as_secs()
                    );
                    return Err(BackendError::Timeout { environment: self.environment });
                }
                _ = &mut cold_start, if cold_start_pending => {
                    cold_start_pending = false;
                    progress.report(GenerationProgress::new(
                        GenerationPhase::ColdStart,
                        COLD_START_FRACTION,
                    ));
                }
            }
        };

        let response = result.map_err(BackendError::Network)?;
        if !response.is_success() {
            warn!("[Backend] {} returned {}", endpoint, response.status);
            return Err(BackendError::from_status(response.status, response.body));
        }

        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(BackendResponse(value))
    }

    /// Call the generation endpoint
    pub async fn generate(
        &self,
        request: &BackendRequest,
        progress: &dyn ProgressSink,
    ) -> Result<BackendResponse, BackendError> {
        self.call_backend(GENERATE_ENDPOINT, request, progress).await
    }
}
