// StudioScript Functions Client
// Copyright (c) 2026 StudioScript
//
// Calls a running `studioscript serve` the way the web client invoked its
// edge functions: same routes, same JSON bodies.

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

use crate::agent::scene_prompts::{scenes_from_value, ExtractedPrompts, ScenePromptResult};
use crate::script::{AdScriptInput, ScriptInput};

#[derive(Debug, Deserialize)]
struct ScreenplayReply {
    screenplay: String,
}

#[derive(Debug, Deserialize)]
struct AdReply {
    script: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageReply {
    image: String,
}

#[derive(Clone)]
pub struct FunctionsClient {
    client: reqwest::Client,
    base_url: String,
}

impl FunctionsClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn generate_script(&self, input: &ScriptInput) -> Result<String> {
        let reply: ScreenplayReply = self
            .invoke("generate-script", &serde_json::to_value(input)?)
            .await?;
        Ok(reply.screenplay)
    }

    pub async fn generate_ads_script(&self, input: &AdScriptInput) -> Result<String> {
        let reply: AdReply = self
            .invoke("generate-ads-script", &serde_json::to_value(input)?)
            .await?;
        reply
            .script
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("No ad script returned"))
    }

    pub async fn generate_prompts(&self, screenplay: &str) -> Result<ExtractedPrompts> {
        let data: Value = self
            .invoke("generate-prompts", &json!({ "screenplay": screenplay }))
            .await?;
        let model = data["model"].as_str().unwrap_or_default().to_string();

        if let Some(scenes) = scenes_from_value(&data) {
            return Ok(ExtractedPrompts {
                result: ScenePromptResult::Scenes(scenes),
                model,
            });
        }
        match data["raw"].as_str() {
            Some(raw) => Ok(ExtractedPrompts {
                result: ScenePromptResult::Raw(raw.to_string()),
                model,
            }),
            None => bail!("Unexpected response format."),
        }
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let reply: ImageReply = self
            .invoke("generate-image", &json!({ "prompt": prompt }))
            .await?;
        Ok(reply.image)
    }

    async fn invoke<T: DeserializeOwned>(&self, function: &str, body: &Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, function);
        info!("[FUNCTIONS] Invoking {}", url);

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = resp.status();
        let data: Value = resp.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let message = data["error"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} returned {}", function, status));
            match data["details"].as_str().filter(|d| !d.is_empty()) {
                Some(details) => bail!("{} ({})", message, details),
                None => bail!("{}", message),
            }
        }

        serde_json::from_value(data)
            .with_context(|| format!("Unexpected response format from {}", function))
    }
}
