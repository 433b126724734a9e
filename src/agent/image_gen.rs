// StudioScript Scene Image Rendering
// Copyright (c) 2026 StudioScript

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::ImageFormat;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::agent::functions_client::FunctionsClient;
use crate::agent::openrouter_bridge::OpenRouterBridge;
use crate::agent::scene_prompts::SceneBoard;

/// Where image requests go: straight to the provider or through the proxy.
#[derive(Clone)]
pub enum ImageClient {
    Direct(OpenRouterBridge),
    Proxy(FunctionsClient),
}

impl ImageClient {
    /// Base64 payload for one prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            anyhow::bail!("Missing 'prompt' in request body");
        }
        match self {
            ImageClient::Direct(bridge) => Ok(bridge.generate_image(prompt).await?),
            ImageClient::Proxy(functions) => functions.generate_image(prompt).await,
        }
    }
}

/// Mime type and file extension for a decoded image; PNG when unrecognised.
pub fn sniff(bytes: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => ("image/jpeg", "jpg"),
        Ok(ImageFormat::WebP) => ("image/webp", "webp"),
        Ok(ImageFormat::Gif) => ("image/gif", "gif"),
        _ => ("image/png", "png"),
    }
}

/// Wraps a base64 payload as a `data:` URL, validating the payload on the way.
pub fn to_data_url(b64: &str) -> Result<String> {
    let bytes = BASE64
        .decode(b64.trim())
        .context("Image payload is not valid base64")?;
    let (mime, _) = sniff(&bytes);
    Ok(format!("data:{};base64,{}", mime, b64.trim()))
}

/// Accepts a `data:` URL or bare base64 and returns the bytes plus extension.
pub fn decode_image(data: &str) -> Result<(Vec<u8>, &'static str)> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let bytes = BASE64
        .decode(payload.trim())
        .context("Image payload is not valid base64")?;
    let (_, ext) = sniff(&bytes);
    Ok((bytes, ext))
}

/// Renders one scene: marks it busy, calls the image endpoint, and stores the
/// result (or clears the busy flag on failure).
pub async fn render_scene(
    client: &ImageClient,
    board: &mut SceneBoard,
    scene_number: u32,
) -> Result<()> {
    let prompt = board
        .prompt_for(scene_number)
        .ok_or_else(|| anyhow!("No scene {} on the board", scene_number))?;

    board.begin(scene_number);
    match fetch_data_url(client, &prompt).await {
        Ok(url) => {
            board.complete(scene_number, url);
            info!("[IMAGES] 🖼️ Scene {} image has been created.", scene_number);
            Ok(())
        }
        Err(e) => {
            board.fail(scene_number);
            error!("[IMAGES] Failed to generate image for scene {}: {}", scene_number, e);
            Err(e)
        }
    }
}

/// Renders every scene with at most `concurrency` requests in flight.
/// Returns the scene numbers that failed with their messages.
pub async fn render_all(
    client: &ImageClient,
    board: &mut SceneBoard,
    concurrency: usize,
) -> Vec<(u32, String)> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for scene in board.scene_prompts() {
        board.begin(scene.scene_number);
        let client = client.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = fetch_data_url(&client, &scene.prompt).await;
            (scene.scene_number, result)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((n, Ok(url))) => {
                board.complete(n, url);
                info!("[IMAGES] 🖼️ Scene {} image has been created.", n);
            }
            Ok((n, Err(e))) => {
                board.fail(n);
                error!("[IMAGES] Failed to generate image for scene {}: {}", n, e);
                failures.push((n, e.to_string()));
            }
            Err(e) => error!("[IMAGES] Render task aborted: {}", e),
        }
    }

    // Anything still flagged belongs to an aborted task.
    let stuck: Vec<u32> = board
        .scenes
        .iter()
        .filter(|s| s.is_generating_image)
        .map(|s| s.scene.scene_number)
        .collect();
    for n in stuck {
        board.fail(n);
        failures.push((n, "Render task aborted".to_string()));
    }

    failures.sort_by_key(|(n, _)| *n);
    failures
}

async fn fetch_data_url(client: &ImageClient, prompt: &str) -> Result<String> {
    let b64 = client.generate(prompt).await?;
    to_data_url(&b64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_sniff_formats() {
        assert_eq!(sniff(&PNG_HEADER), ("image/png", "png"));
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), ("image/jpeg", "jpg"));
        assert_eq!(sniff(b"not an image"), ("image/png", "png"));
    }

    #[test]
    fn test_data_url_round_trip() {
        let b64 = BASE64.encode(PNG_HEADER);
        let url = to_data_url(&b64).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let (bytes, ext) = decode_image(&url).unwrap();
        assert_eq!(bytes, PNG_HEADER);
        assert_eq!(ext, "png");

        let (bare, _) = decode_image(&b64).unwrap();
        assert_eq!(bare, PNG_HEADER);
    }

    #[test]
    fn test_invalid_base64() {
        assert!(to_data_url("@@@not base64@@@").is_err());
        assert!(decode_image("data:image/png;base64,%%%").is_err());
    }
}
