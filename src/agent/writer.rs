// StudioScript Writer - Script Generation with Offline Fallback
// Copyright (c) 2026 StudioScript
//
// Every path ends in a script: the LLM when it answers, the offline template
// generator otherwise.

use serde::Serialize;
use tracing::{info, warn};

use crate::agent::functions_client::FunctionsClient;
use crate::agent::openrouter_bridge::OpenRouterBridge;
use crate::agent::prompts::{ad_prompt, screenplay_prompt, ADS_TITLE, SCREENPLAY_TITLE};
use crate::script::{generate_ad_script, generate_script, AdScriptInput, ScriptInput};

pub const OFFLINE_NOTICE: &str =
    "Using offline demo generator. Add your OpenRouter key with `studioscript key set`.";

/// Where the text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "reason", rename_all = "snake_case")]
pub enum GenerationSource {
    /// Direct chat completion.
    Remote,
    /// Through a `studioscript serve` instance.
    Proxy,
    /// Template fallback, with the reason it was used.
    Offline(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generated {
    pub text: String,
    #[serde(flatten)]
    pub source: GenerationSource,
}

impl Generated {
    pub fn is_offline(&self) -> bool {
        matches!(self.source, GenerationSource::Offline(_))
    }
}

enum Route<'a> {
    Proxy(&'a FunctionsClient),
    Direct(&'a OpenRouterBridge),
    Offline,
}

pub struct ScriptWriter {
    bridge: OpenRouterBridge,
    functions: Option<FunctionsClient>,
    referer: Option<String>,
}

impl ScriptWriter {
    pub fn new(bridge: OpenRouterBridge, functions: Option<FunctionsClient>) -> Self {
        Self {
            bridge,
            functions,
            referer: None,
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    fn route(&self) -> Route<'_> {
        if let Some(functions) = &self.functions {
            Route::Proxy(functions)
        } else if self.bridge.has_key() {
            Route::Direct(&self.bridge)
        } else {
            Route::Offline
        }
    }

    pub async fn write_screenplay(&self, input: &ScriptInput) -> Generated {
        let attempt = match self.route() {
            Route::Proxy(functions) => functions
                .generate_script(input)
                .await
                .map(|text| (text, GenerationSource::Proxy)),
            Route::Direct(bridge) => {
                let pair = screenplay_prompt(input);
                bridge
                    .chat(&pair.system, &pair.user, SCREENPLAY_TITLE, self.referer.as_deref())
                    .await
                    .map(|c| (c.content, GenerationSource::Remote))
                    .map_err(anyhow::Error::from)
            }
            Route::Offline => {
                info!("[WRITER] {}", OFFLINE_NOTICE);
                return Generated {
                    text: generate_script(input),
                    source: GenerationSource::Offline(OFFLINE_NOTICE.to_string()),
                };
            }
        };

        match attempt {
            Ok((text, source)) => {
                info!("[WRITER] ✅ Screenplay generated ({} chars)", text.len());
                Generated { text, source }
            }
            Err(e) => {
                warn!("[WRITER] Generation failed. Falling back to demo: {:#}", e);
                Generated {
                    text: generate_script(input),
                    source: GenerationSource::Offline(format!("Generation failed: {:#}", e)),
                }
            }
        }
    }

    pub async fn write_ad(&self, input: &AdScriptInput) -> Generated {
        let attempt = match self.route() {
            Route::Proxy(functions) => functions
                .generate_ads_script(input)
                .await
                .map(|text| (text, GenerationSource::Proxy)),
            Route::Direct(bridge) => {
                let pair = ad_prompt(input);
                bridge
                    .chat(&pair.system, &pair.user, ADS_TITLE, self.referer.as_deref())
                    .await
                    .map(|c| (c.content, GenerationSource::Remote))
                    .map_err(anyhow::Error::from)
            }
            Route::Offline => {
                info!("[WRITER] {}", OFFLINE_NOTICE);
                return Generated {
                    text: generate_ad_script(input),
                    source: GenerationSource::Offline(OFFLINE_NOTICE.to_string()),
                };
            }
        };

        match attempt {
            Ok((text, source)) => {
                info!("[WRITER] ✅ Ad script generated ({} chars)", text.len());
                Generated { text, source }
            }
            Err(e) => {
                warn!("[WRITER] Ad generation failed. Falling back to demo: {:#}", e);
                Generated {
                    text: generate_ad_script(input),
                    source: GenerationSource::Offline(format!("Ad generation failed: {:#}", e)),
                }
            }
        }
    }
}
