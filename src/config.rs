// StudioScript Configuration
// Copyright (c) 2026 StudioScript
//
// Environment-driven settings. `.env` is loaded by the binary before this runs.

use anyhow::{Context, Result};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "z-ai/glm-4.5-air:free";
pub const DEFAULT_IMAGE_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_REFERER: &str = "https://studioscript.ai";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    /// Server-side credential (`OPENROUTER_API_KEY`).
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub image_api_url: String,
    pub image_model: String,
    pub image_api_key: Option<String>,
    pub referer: String,
    pub data_dir: PathBuf,
    /// Base URL of a running `studioscript serve` (`.../functions/v1`).
    pub functions_url: Option<String>,
    pub web_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            image_api_url: DEFAULT_IMAGE_API_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_api_key: None,
            referer: DEFAULT_REFERER.to_string(),
            data_dir: default_data_dir(),
            functions_url: None,
            web_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_url = get("STUDIOSCRIPT_API_URL").unwrap_or(defaults.api_url);
        let image_api_url = get("STUDIOSCRIPT_IMAGE_API_URL").unwrap_or(defaults.image_api_url);
        let referer = get("STUDIOSCRIPT_REFERER").unwrap_or(defaults.referer);
        let functions_url = get("STUDIOSCRIPT_FUNCTIONS_URL");

        validate_url("STUDIOSCRIPT_API_URL", &api_url)?;
        validate_url("STUDIOSCRIPT_IMAGE_API_URL", &image_api_url)?;
        validate_url("STUDIOSCRIPT_REFERER", &referer)?;
        if let Some(functions_url) = &functions_url {
            validate_url("STUDIOSCRIPT_FUNCTIONS_URL", functions_url)?;
        }

        let timeout_secs = match get("STUDIOSCRIPT_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("STUDIOSCRIPT_TIMEOUT_SECS is not a number: {}", raw))?,
            None => defaults.timeout_secs,
        };

        Ok(Self {
            api_key: get("OPENROUTER_API_KEY"),
            api_url,
            model: get("STUDIOSCRIPT_MODEL").unwrap_or(defaults.model),
            image_api_url,
            image_model: get("STUDIOSCRIPT_IMAGE_MODEL").unwrap_or(defaults.image_model),
            image_api_key: get("STUDIOSCRIPT_IMAGE_API_KEY"),
            referer,
            data_dir: get("STUDIOSCRIPT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            functions_url,
            web_dir: get("STUDIOSCRIPT_WEB_DIR").map(PathBuf::from),
            timeout_secs,
        })
    }
}

fn validate_url(name: &str, raw: &str) -> Result<()> {
    let parsed = Url::parse(raw).with_context(|| format!("{} is not a valid URL: {}", name, raw))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https: {}", name, raw);
    }
    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("studioscript"))
        .unwrap_or_else(|| PathBuf::from(".studioscript"))
}
