// StudioScript OpenRouter Bridge
// Copyright (c) 2026 StudioScript
//
// Single-shot calls to an OpenAI-compatible chat completion endpoint and an
// image generation endpoint. No retries, no streaming.

use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::StudioConfig;

const TEMPERATURE: f64 = 0.7;
const IMAGE_SIZE: &str = "1024x1024";

/// Failure of a remote call, kept structured so the HTTP layer can map it.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// No credential configured for the endpoint.
    MissingKey,
    /// Transport failure before a status was received.
    Transport(String),
    /// Non-2xx status with the response body text.
    Status { status: u16, body: String },
    /// The response was not the JSON shape we expect.
    Decode(String),
    /// `choices[0].message.content` (or `data[0].b64_json`) was missing or blank.
    EmptyContent,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::MissingKey => write!(f, "No API key configured"),
            UpstreamError::Transport(e) => write!(f, "Connection failed: {}", e),
            UpstreamError::Status { status, body } => {
                write!(f, "OpenRouter request failed: {} {}", status, body)
            }
            UpstreamError::Decode(e) => write!(f, "Unreadable response: {}", e),
            UpstreamError::EmptyContent => write!(f, "OpenRouter returned no content"),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Result of a chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub model: Option<String>,
    pub usage: Option<Value>,
}

#[derive(Clone)]
pub struct OpenRouterBridge {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
    image_api_url: String,
    image_model: String,
    image_api_key: Option<String>,
}

impl OpenRouterBridge {
    pub fn new(config: &StudioConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        let image_api_key = config
            .image_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| api_key.clone());

        Self {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_key,
            image_api_url: config.image_api_url.clone(),
            image_model: config.image_model.clone(),
            image_api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn has_image_key(&self) -> bool {
        self.image_api_key.is_some()
    }

    /// One chat completion. `title` becomes `X-Title`; `referer` becomes `HTTP-Referer`.
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        title: &str,
        referer: Option<&str>,
    ) -> Result<ChatCompletion, UpstreamError> {
        let key = self.api_key.as_deref().ok_or(UpstreamError::MissingKey)?;
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": TEMPERATURE
        });

        let endpoint = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        info!("[BRIDGE] Chat completion via {} ({})", self.model, title);

        let mut request = self
            .client
            .post(&endpoint)
            .bearer_auth(key.trim())
            .header("X-Title", title)
            .json(&payload);
        if let Some(referer) = referer {
            request = request.header("HTTP-Referer", referer);
        }

        let resp = request.send().await.map_err(|e| {
            error!("[BRIDGE] LLM connection failed: {}", e);
            UpstreamError::Transport(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("[BRIDGE] OpenRouter error {}: {}", status.as_u16(), body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let completion = completion_from_value(&data)?;
        debug!(
            "[BRIDGE] Received {} chars from {:?}",
            completion.content.len(),
            completion.model
        );
        Ok(completion)
    }

    /// One image generation call; returns the base64 payload.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, UpstreamError> {
        let key = self
            .image_api_key
            .as_deref()
            .ok_or(UpstreamError::MissingKey)?;
        let payload = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": IMAGE_SIZE,
            "response_format": "b64_json"
        });
        let endpoint = format!(
            "{}/images/generations",
            self.image_api_url.trim_end_matches('/')
        );
        info!("[BRIDGE] Image generation via {}", self.image_model);

        let resp = self
            .client
            .post(&endpoint)
            .bearer_auth(key.trim())
            .header("X-Title", crate::agent::prompts::IMAGES_TITLE)
            .json(&payload)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("[BRIDGE] Image endpoint error {}: {}", status.as_u16(), body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        image_from_value(&data)
    }
}

/// Extracts `choices[0].message.content` (trimmed) plus model and usage.
pub fn completion_from_value(data: &Value) -> Result<ChatCompletion, UpstreamError> {
    let content = data["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(UpstreamError::EmptyContent)?;

    Ok(ChatCompletion {
        content: content.to_string(),
        model: data["model"].as_str().map(str::to_string),
        usage: data.get("usage").filter(|u| !u.is_null()).cloned(),
    })
}

/// Extracts `data[0].b64_json`.
pub fn image_from_value(data: &Value) -> Result<String, UpstreamError> {
    data["data"][0]["b64_json"]
        .as_str()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .ok_or(UpstreamError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_from_value() {
        let data = json!({
            "model": "z-ai/glm-4.5-air:free",
            "choices": [{ "message": { "role": "assistant", "content": "  FADE IN:\n " } }],
            "usage": { "total_tokens": 12 }
        });
        let c = completion_from_value(&data).unwrap();
        assert_eq!(c.content, "FADE IN:");
        assert_eq!(c.model.as_deref(), Some("z-ai/glm-4.5-air:free"));
        assert_eq!(c.usage, Some(json!({ "total_tokens": 12 })));
    }

    #[test]
    fn test_blank_or_missing_content_is_empty() {
        let blank = json!({ "choices": [{ "message": { "content": "   " } }] });
        assert_eq!(completion_from_value(&blank), Err(UpstreamError::EmptyContent));
        assert_eq!(completion_from_value(&json!({})), Err(UpstreamError::EmptyContent));
    }

    #[test]
    fn test_image_from_value() {
        let data = json!({ "data": [{ "b64_json": "iVBORw0KGgo=" }] });
        assert_eq!(image_from_value(&data).unwrap(), "iVBORw0KGgo=");
        assert!(image_from_value(&json!({ "data": [] })).is_err());
    }

    #[test]
    fn test_status_error_message() {
        let e = UpstreamError::Status {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(e.to_string(), "OpenRouter request failed: 429 rate limited");
    }
}
