// StudioScript Local Store
// Copyright (c) 2026 StudioScript
//
// A flat string key/value file that plays the role of browser local storage.
// Payloads are stored as JSON strings under the same keys the web client used.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::script::{AdScriptInput, ScriptInput};

pub const STORE_FILE: &str = "store.json";
pub const LAST_SCREENPLAY_KEY: &str = "studioscript:last";
pub const LAST_AD_KEY: &str = "studioscript:ads:last";
pub const API_KEY_KEY: &str = "openrouter:key";

/// Last generated screenplay plus the form values that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenplayPayload {
    pub screenplay: String,
    pub meta: ScriptInput,
    /// Editor scale toggle.
    #[serde(default, skip_serializing_if = "is_false")]
    pub expanded: bool,
}

/// Last generated ad script plus the form values that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdPayload {
    pub script: String,
    pub meta: AdScriptInput,
    #[serde(default, skip_serializing_if = "is_false")]
    pub expanded: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Opens `store.json` inside `data_dir`. A missing file is an empty store;
    /// an unreadable one is logged and treated as empty.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(STORE_FILE);
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store {:?}", path))?;
            match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("[STORE] ⚠️ Corrupt store at {:?}, starting empty: {}", path, e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    pub fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    pub fn last_screenplay(&self) -> Option<ScreenplayPayload> {
        self.get_json(LAST_SCREENPLAY_KEY)
    }

    pub fn save_screenplay(&mut self, payload: &ScreenplayPayload) -> Result<()> {
        self.set_json(LAST_SCREENPLAY_KEY, payload)
    }

    pub fn last_ad(&self) -> Option<AdPayload> {
        self.get_json(LAST_AD_KEY)
    }

    pub fn save_ad(&mut self, payload: &AdPayload) -> Result<()> {
        self.set_json(LAST_AD_KEY, payload)
    }

    /// Saved credential, trimmed; blank counts as absent.
    pub fn api_key(&self) -> Option<String> {
        self.get_item(API_KEY_KEY)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }

    /// Saves the trimmed key. A blank key clears the entry.
    pub fn save_api_key(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            self.remove_item(API_KEY_KEY)
        } else {
            info!("[STORE] OpenRouter API key saved.");
            self.set_item(API_KEY_KEY, key)
        }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let raw = self.get_item(key)?;
        match serde_json::from_str(raw) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("[STORE] Ignoring unreadable '{}' entry: {}", key, e);
                None
            }
        }
    }

    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).context("Failed to serialize payload")?;
        self.set_item(key, &raw)
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data dir {:?}", dir))?;
        }
        let json = serde_json::to_string_pretty(&self.entries).context("Serialization error")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace store {:?}", self.path))?;
        Ok(())
    }
}

/// Shows the first and last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
