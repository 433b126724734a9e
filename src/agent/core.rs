// StudioScript Core
// Copyright (c) 2026 StudioScript
//
// The shared kernel behind the CLI: config, HTTP clients and the local store,
// plus the create/edit/prompt flows that tie them together.

use anyhow::{bail, Context, Result};
use std::sync::Mutex;
use tracing::info;

use crate::agent::functions_client::FunctionsClient;
use crate::agent::image_gen::ImageClient;
use crate::agent::openrouter_bridge::OpenRouterBridge;
use crate::agent::scene_prompts::{extract_scene_prompts, ExtractedPrompts};
use crate::agent::writer::{Generated, ScriptWriter};
use crate::config::StudioConfig;
use crate::editor::{self, ScriptKind};
use crate::script::{AdScriptInput, ScriptInput};
use crate::store::{AdPayload, LocalStore, ScreenplayPayload};

pub struct StudioCore {
    pub config: StudioConfig,
    pub store: Mutex<LocalStore>,
    bridge: OpenRouterBridge,
    functions: Option<FunctionsClient>,
}

impl StudioCore {
    /// Opens the store and resolves the credential: the saved key first,
    /// then `OPENROUTER_API_KEY`.
    pub fn new(config: StudioConfig) -> Result<Self> {
        let store = LocalStore::open(&config.data_dir)?;
        let api_key = store.api_key().or_else(|| config.api_key.clone());
        let bridge = OpenRouterBridge::new(&config, api_key);
        let functions = config
            .functions_url
            .as_deref()
            .map(|url| FunctionsClient::new(url, config.timeout_secs));

        info!(
            "[CORE] Store at {:?} | credential: {} | proxy: {}",
            store.path(),
            if bridge.has_key() { "set" } else { "none" },
            config.functions_url.as_deref().unwrap_or("off")
        );

        Ok(Self {
            config,
            store: Mutex::new(store),
            bridge,
            functions,
        })
    }

    fn writer(&self) -> ScriptWriter {
        ScriptWriter::new(self.bridge.clone(), self.functions.clone())
            .with_referer(self.config.referer.clone())
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut LocalStore) -> Result<T>) -> Result<T> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("Store lock poisoned"))?;
        f(&mut store)
    }

    /// Generates a screenplay (remote or offline) and saves it as the last payload.
    pub async fn create_screenplay(&self, input: ScriptInput) -> Result<Generated> {
        input.validate().map_err(anyhow::Error::msg)?;
        let generated = self.writer().write_screenplay(&input).await;
        let payload = ScreenplayPayload {
            screenplay: generated.text.clone(),
            meta: input,
            expanded: false,
        };
        self.with_store(|s| s.save_screenplay(&payload))?;
        Ok(generated)
    }

    /// Generates an ad script (remote or offline) and saves it as the last payload.
    pub async fn create_ad(&self, input: AdScriptInput) -> Result<Generated> {
        input.validate().map_err(anyhow::Error::msg)?;
        let generated = self.writer().write_ad(&input).await;
        let payload = AdPayload {
            script: generated.text.clone(),
            meta: input,
            expanded: false,
        };
        self.with_store(|s| s.save_ad(&payload))?;
        Ok(generated)
    }

    /// Text of the last saved script of the given kind.
    pub fn last_text(&self, kind: ScriptKind) -> Result<String> {
        self.with_store(|s| {
            let text = match kind {
                ScriptKind::Screenplay => s.last_screenplay().map(|p| p.screenplay),
                ScriptKind::Ad => s.last_ad().map(|p| p.script),
            };
            text.context(match kind {
                ScriptKind::Screenplay => "No screenplay found. Run `studioscript create` first.",
                ScriptKind::Ad => "No ad script found. Run `studioscript ads` first.",
            })
        })
    }

    /// Applies an edit to the last saved script and stores the result.
    /// The closure receives the text and the scale flag and returns both.
    pub fn edit<F>(&self, kind: ScriptKind, f: F) -> Result<String>
    where
        F: FnOnce(&str, bool) -> (String, bool),
    {
        self.with_store(|s| match kind {
            ScriptKind::Screenplay => {
                let mut payload = s
                    .last_screenplay()
                    .context("No screenplay found. Run `studioscript create` first.")?;
                let (text, expanded) = f(&payload.screenplay, payload.expanded);
                payload.screenplay = text.clone();
                payload.expanded = expanded;
                s.save_screenplay(&payload)?;
                Ok(text)
            }
            ScriptKind::Ad => {
                let mut payload = s
                    .last_ad()
                    .context("No ad script found. Run `studioscript ads` first.")?;
                let (text, expanded) = f(&payload.script, payload.expanded);
                payload.script = text.clone();
                payload.expanded = expanded;
                s.save_ad(&payload)?;
                Ok(text)
            }
        })
    }

    pub fn save_api_key(&self, key: &str) -> Result<()> {
        self.with_store(|s| s.save_api_key(key))
    }

    pub fn saved_api_key(&self) -> Result<Option<String>> {
        self.with_store(|s| Ok(s.api_key()))
    }

    /// Scene prompts for a script, through the proxy when configured.
    pub async fn extract_prompts(&self, text: &str, kind: ScriptKind) -> Result<ExtractedPrompts> {
        editor::require_text(text, kind)?;
        match &self.functions {
            Some(functions) => functions.generate_prompts(text).await,
            None => {
                if !self.bridge.has_key() {
                    bail!("No API key configured. Run `studioscript key set <KEY>` first.");
                }
                extract_scene_prompts(&self.bridge, text, Some(&self.config.referer)).await
            }
        }
    }

    pub fn image_client(&self) -> ImageClient {
        match &self.functions {
            Some(functions) => ImageClient::Proxy(functions.clone()),
            None => ImageClient::Direct(self.bridge.clone()),
        }
    }
}
