//! HTTP client for a Converse-style model endpoint.
//!
//! The loop only sees the [`RemoteModel`] trait: one suspending call that
//! returns a response or a typed fault. No retries here; a caller wanting
//! timeouts or backoff wraps the trait.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wire::WireMessage;

/// Faults raised at the remote-call boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("throttled (retry after {retry_after:?}s)")]
    Throttled { retry_after: Option<u64> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

/// Request body for a converse call. The model id rides in the URL, not
/// the body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(skip)]
    pub model_id: String,
    pub messages: Vec<WireMessage>,
    pub system: Vec<SystemBlock>,
    pub inference_config: InferenceConfig,
    pub additional_model_request_fields: Value,
    pub tool_config: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemBlock {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Response from a converse call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub output: ConverseOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverseOutput {
    pub message: WireMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// One suspending call with no partial results.
#[async_trait]
pub trait RemoteModel: Send + Sync {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, ApiError>;
}

/// Production [`RemoteModel`] over HTTP.
#[derive(Debug)]
pub struct ConverseClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl ConverseClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Read the API key from `CONVERSE_API_KEY`.
    pub fn from_env(base_url: String) -> Result<Self, ApiError> {
        let api_key = std::env::var("CONVERSE_API_KEY").map_err(|_| {
            ApiError::MissingApiKey("CONVERSE_API_KEY environment variable not set".into())
        })?;
        Ok(Self::new(api_key, base_url))
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/model/{}/converse", self.base_url, model_id)
    }
}

#[async_trait]
impl RemoteModel for ConverseClient {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, ApiError> {
        let url = self.endpoint(&request.model_id);
        tracing::debug!(model = %request.model_id, turns = request.messages.len(), "converse call");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ApiError::Throttled { retry_after });
        }

        if status >= 400 {
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(ApiError::Api {
                status,
                message: body,
            });
        }

        let resp: ConverseResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("failed to parse response: {e}")))?;

        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_embeds_model_id() {
        let client = ConverseClient::new("k".into(), "http://localhost:8080".into());
        assert_eq!(
            client.endpoint("anthropic.claude-sonnet-4-20250514-v1:0"),
            "http://localhost:8080/model/anthropic.claude-sonnet-4-20250514-v1:0/converse"
        );
    }

    #[test]
    fn from_env_missing_key() {
        std::env::remove_var("CONVERSE_API_KEY");
        let err = ConverseClient::from_env("http://localhost:1".into()).unwrap_err();
        assert!(err.to_string().contains("CONVERSE_API_KEY"));
    }

    #[test]
    fn request_body_excludes_model_id() {
        let request = ConverseRequest {
            model_id: "model-x".into(),
            messages: vec![],
            system: vec![SystemBlock { text: "sys".into() }],
            inference_config: InferenceConfig {
                max_tokens: 4096,
                temperature: 0.7,
                top_p: 1.0,
            },
            additional_model_request_fields: json!({}),
            tool_config: json!({}),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("modelId").is_none());
        assert!(body.get("model_id").is_none());
        assert_eq!(body["inferenceConfig"]["maxTokens"], 4096);
        assert_eq!(body["system"][0]["text"], "sys");
    }

    #[test]
    fn response_deserializes_from_converse_shape() {
        let json = r#"{
            "output": {
                "message": {
                    "role": "assistant",
                    "content": [
                        {"text": "Hello back!"},
                        {"toolUse": {"toolUseId": "t1", "name": "bash", "input": {"command": "ls"}}}
                    ]
                }
            },
            "stopReason": "tool_use",
            "usage": {"inputTokens": 10, "outputTokens": 5}
        }"#;

        let resp: ConverseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.output.message.role, "assistant");
        assert_eq!(resp.output.message.content.len(), 2);
        assert_eq!(resp.stop_reason.as_deref(), Some("tool_use"));
        assert_eq!(resp.usage.unwrap().input_tokens, 10);
    }

    #[test]
    fn error_display() {
        let err = ApiError::Api {
            status: 401,
            message: "invalid api key".into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));

        let err = ApiError::Throttled {
            retry_after: Some(30),
        };
        assert!(err.to_string().contains("throttled"));
    }
}
