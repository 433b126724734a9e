// StudioScript Scene Prompts
// Copyright (c) 2026 StudioScript
//
// Turns a script into per-scene visual prompts via the LLM, and tracks the
// per-scene image state for the prompts view.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::agent::openrouter_bridge::OpenRouterBridge;
use crate::agent::prompts::{scene_prompts_prompt, SCENE_PROMPTS_TITLE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePrompt {
    #[serde(default)]
    pub scene_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt: String,
}

/// What the model gave back: parsed scenes, or the raw text when it was not
/// the JSON we asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenePromptResult {
    Scenes(Vec<ScenePrompt>),
    Raw(String),
}

/// Outcome of an extraction call, shaped like the `generate-prompts` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPrompts {
    #[serde(flatten)]
    pub result: ScenePromptResult,
    pub model: String,
}

/// Tolerant parse of the model output.
///
/// Strips a leading ```` ```json ```` fence and a trailing ```` ``` ````, then
/// parses. If that fails, the span from the first `{` to the last `}` is tried.
/// Anything without a `scenes` array comes back as `Raw` with the original text.
pub fn parse_scene_prompts(content: &str) -> ScenePromptResult {
    let trimmed = content.trim();
    let mut candidate = trimmed;
    if let Some(rest) = candidate.strip_prefix("```json") {
        candidate = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if let Some(rest) = candidate.strip_suffix("```") {
        candidate = rest;
    }

    let parsed = match serde_json::from_str::<Value>(candidate) {
        Ok(v) => Some(v),
        Err(_) => match (candidate.find('{'), candidate.rfind('}')) {
            (Some(first), Some(last)) if last > first => {
                serde_json::from_str::<Value>(&candidate[first..=last]).ok()
            }
            _ => None,
        },
    };

    parsed
        .and_then(|v| scenes_from_value(&v))
        .map(ScenePromptResult::Scenes)
        .unwrap_or_else(|| ScenePromptResult::Raw(content.to_string()))
}

/// Any `scenes` array is accepted; each element is read leniently.
pub(crate) fn scenes_from_value(v: &Value) -> Option<Vec<ScenePrompt>> {
    let scenes = v.get("scenes")?.as_array()?;
    Some(scenes.iter().map(scene_from_value).collect())
}

/// Missing or null fields take their defaults; numbers may arrive as strings.
fn scene_from_value(v: &Value) -> ScenePrompt {
    let text = |key: &str| match &v[key] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let scene_number = match &v["scene_number"] {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .and_then(|n| u32::try_from(n).ok())
    .unwrap_or_default();

    ScenePrompt {
        scene_number,
        title: text("title"),
        prompt: text("prompt"),
    }
}

/// `Scene {n} - {title}\n\n{prompt}` blocks separated by `---` rules.
pub fn combined_prompts(scenes: &[ScenePrompt]) -> String {
    scenes
        .iter()
        .map(|s| format!("Scene {} - {}\n\n{}", s.scene_number, s.title, s.prompt))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Asks the model for scene prompts. Blank input never reaches the network.
pub async fn extract_scene_prompts(
    bridge: &OpenRouterBridge,
    screenplay: &str,
    referer: Option<&str>,
) -> Result<ExtractedPrompts> {
    if screenplay.trim().is_empty() {
        bail!("Missing 'screenplay' in request body");
    }

    let pair = scene_prompts_prompt(screenplay);
    let completion = bridge
        .chat(&pair.system, &pair.user, SCENE_PROMPTS_TITLE, referer)
        .await;

    // A blank reply is not an error here: it is reported as empty raw text.
    // The bridge trims content, so whitespace-only replies land here as well.
    let (content, model) = match completion {
        Ok(c) => (c.content, c.model),
        Err(crate::agent::openrouter_bridge::UpstreamError::EmptyContent) => (String::new(), None),
        Err(e) => return Err(e.into()),
    };

    let result = if content.is_empty() {
        ScenePromptResult::Raw(String::new())
    } else {
        parse_scene_prompts(&content)
    };
    match &result {
        ScenePromptResult::Scenes(s) => info!("[PROMPTS] ✅ Extracted {} scene prompts", s.len()),
        ScenePromptResult::Raw(_) => warn!("[PROMPTS] Model reply was not scene JSON; keeping raw text"),
    }

    Ok(ExtractedPrompts {
        result,
        model: model.unwrap_or_else(|| bridge.model().to_string()),
    })
}

/// A scene prompt plus its image state in the prompts view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneWithImage {
    #[serde(flatten)]
    pub scene: ScenePrompt,
    #[serde(rename = "generatedImage", skip_serializing_if = "Option::is_none", default)]
    pub generated_image: Option<String>,
    #[serde(rename = "isGeneratingImage", default)]
    pub is_generating_image: bool,
}

impl From<ScenePrompt> for SceneWithImage {
    fn from(scene: ScenePrompt) -> Self {
        Self {
            scene,
            generated_image: None,
            is_generating_image: false,
        }
    }
}

/// Ordered scene list; updates replace the element(s) whose scene number matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneBoard {
    pub scenes: Vec<SceneWithImage>,
}

impl SceneBoard {
    pub fn new(scenes: Vec<ScenePrompt>) -> Self {
        Self {
            scenes: scenes.into_iter().map(SceneWithImage::from).collect(),
        }
    }

    pub fn get(&self, scene_number: u32) -> Option<&SceneWithImage> {
        self.scenes.iter().find(|s| s.scene.scene_number == scene_number)
    }

    pub fn prompt_for(&self, scene_number: u32) -> Option<String> {
        self.get(scene_number).map(|s| s.scene.prompt.clone())
    }

    pub fn begin(&mut self, scene_number: u32) {
        self.update(scene_number, |s| s.is_generating_image = true);
    }

    pub fn complete(&mut self, scene_number: u32, data_url: String) {
        self.update(scene_number, |s| {
            s.generated_image = Some(data_url.clone());
            s.is_generating_image = false;
        });
    }

    pub fn fail(&mut self, scene_number: u32) {
        self.update(scene_number, |s| s.is_generating_image = false);
    }

    pub fn scene_prompts(&self) -> Vec<ScenePrompt> {
        self.scenes.iter().map(|s| s.scene.clone()).collect()
    }

    fn update<F: FnMut(&mut SceneWithImage)>(&mut self, scene_number: u32, mut f: F) {
        self.scenes = std::mem::take(&mut self.scenes)
            .into_iter()
            .map(|mut s| {
                if s.scene.scene_number == scene_number {
                    f(&mut s);
                }
                s
            })
            .collect();
    }
}
