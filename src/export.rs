// StudioScript Export
// Copyright (c) 2026 StudioScript

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::agent::image_gen::decode_image;
use crate::agent::scene_prompts::{combined_prompts, SceneBoard, ScenePrompt, SceneWithImage};
use crate::editor::ScriptKind;

pub const PROMPTS_TEXT_FILE: &str = "scene-prompts.txt";
pub const PROMPTS_JSON_FILE: &str = "scene-prompts.json";

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    info!("[EXPORT] 💾 Saved {:?}", path);
    Ok(path)
}

/// `screenplay.fountain` or `ad-script.txt` depending on the kind.
fn export_script(text: &str, kind: ScriptKind, dir: &Path) -> Result<PathBuf> {
    write_file(dir, kind.export_file_name(), text.as_bytes())
}

pub fn export_fountain(text: &str, dir: &Path) -> Result<PathBuf> {
    export_script(text, ScriptKind::Screenplay, dir)
}

pub fn export_ad_text(text: &str, dir: &Path) -> Result<PathBuf> {
    export_script(text, ScriptKind::Ad, dir)
}

/// Combined prompt text plus the JSON scene list.
pub fn export_prompts(scenes: &[ScenePrompt], dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let text = write_file(dir, PROMPTS_TEXT_FILE, combined_prompts(scenes).as_bytes())?;
    let json = serde_json::to_vec_pretty(&serde_json::json!({ "scenes": scenes }))
        .context("Failed to serialize scenes")?;
    let json = write_file(dir, PROMPTS_JSON_FILE, &json)?;
    Ok((text, json))
}

/// Writes `scene-{n}.{ext}` for a scene that has an image; `None` otherwise.
pub fn export_scene_image(scene: &SceneWithImage, dir: &Path) -> Result<Option<PathBuf>> {
    let Some(data) = &scene.generated_image else {
        return Ok(None);
    };
    let (bytes, ext) = decode_image(data)?;
    let name = format!("scene-{}.{}", scene.scene.scene_number, ext);
    write_file(dir, &name, &bytes).map(Some)
}

pub fn export_board_images(board: &SceneBoard, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for scene in &board.scenes {
        if let Some(path) = export_scene_image(scene, dir)? {
            written.push(path);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    #[test]
    fn test_script_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let f = export_fountain("FADE IN:", dir.path()).unwrap();
        assert_eq!(f.file_name().unwrap(), "screenplay.fountain");
        assert_eq!(fs::read_to_string(&f).unwrap(), "FADE IN:");

        let nested = dir.path().join("out/ads");
        let a = export_ad_text("AD TITLE: X", &nested).unwrap();
        assert_eq!(a, nested.join("ad-script.txt"));
    }

    #[test]
    fn test_prompts_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let scenes = vec![
            ScenePrompt { scene_number: 1, title: "A".into(), prompt: "one".into() },
            ScenePrompt { scene_number: 2, title: "B".into(), prompt: "two".into() },
        ];
        let (text, json) = export_prompts(&scenes, dir.path()).unwrap();
        assert!(fs::read_to_string(text).unwrap().contains("\n\n---\n\n"));
        let parsed: serde_json::Value = serde_json::from_slice(&fs::read(json).unwrap()).unwrap();
        assert_eq!(parsed["scenes"][1]["title"], "B");

        let mut board = SceneBoard::new(scenes);
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        board.complete(2, format!("data:image/png;base64,{}", BASE64.encode(png)));
        let written = export_board_images(&board, dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("scene-2.png")]);
    }
}
