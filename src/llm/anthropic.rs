use serde::Deserialize;
use serde_json::json;

use super::{Completion, CompletionRequest};
use crate::agent::Failure;
use crate::tools::http_post_json;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Blocking client for the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    endpoint: String,
}

impl AnthropicClient {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com/v1/messages";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a proxy or a compatible gateway.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Completion for AnthropicClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, Failure> {
        let body = request_body(request);
        let raw = http_post_json(
            &self.endpoint,
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", ANTHROPIC_VERSION),
            ],
            &body,
            request.timeout,
        )?;
        response_text(&raw)
    }
}

fn request_body(request: &CompletionRequest) -> serde_json::Value {
    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "messages": request.messages,
    });
    if let Some(system) = &request.system {
        body["system"] = json!(system);
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    body
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Concatenate the text blocks of a Messages API response.
fn response_text(raw: &str) -> Result<String, Failure> {
    let parsed: MessagesResponse = serde_json::from_str(raw)
        .map_err(|e| Failure::malformed(format!("unexpected messages payload: {e}")))?;

    let text: String = parsed
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect();

    if text.is_empty() {
        return Err(Failure::malformed("response had no text content"));
    }
    Ok(text)
}
