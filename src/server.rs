// StudioScript Functions Server
// Copyright (c) 2026 StudioScript
//
// HTTP equivalents of the hosted edge functions: validate the form payload,
// forward one request to the provider, reshape the reply or the error.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::agent::openrouter_bridge::UpstreamError;
use crate::agent::prompts::{ad_prompt, screenplay_prompt, ADS_TITLE, SCREENPLAY_TITLE};
use crate::agent::scene_prompts::extract_scene_prompts;
use crate::script::{AdDuration, AdScriptInput, FeatureDuration, Genre, ScriptInput, Tone};
use crate::state::{HealthStatus, ServerState};

pub type AppState = Arc<ServerState>;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// JSON error body: `{ "error": ..., "details"?: ... }`.
#[derive(Debug)]
pub struct FunctionError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl FunctionError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.error });
        if let Some(details) = self.details {
            body["details"] = Value::String(details);
        }
        (self.status, Json(body)).into_response()
    }
}

type FunctionResult = Result<Json<Value>, FunctionError>;

pub fn create_router(state: AppState) -> Router {
    let functions = Router::new()
        .route(
            "/generate-script",
            post(generate_script).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/generate-ads-script",
            post(generate_ads_script).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/generate-prompts",
            post(generate_prompts).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/generate-image",
            post(generate_image).options(preflight).fallback(method_not_allowed),
        );

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/functions/v1", functions);

    if let Some(web_dir) = &state.config.web_dir {
        info!("[SERVER] Serving static files from {:?}", web_dir);
        app = app.fallback_service(ServeDir::new(web_dir));
    }

    app.with_state(state).layer(CorsLayer::permissive())
}

pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let display_addr = if addr.ip().is_unspecified() {
        format!("127.0.0.1:{}", port)
    } else {
        addr.to_string()
    };
    info!("[SERVER] 🚀 StudioScript functions running on http://{}/functions/v1", display_addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("[SERVER] 🛑 Shutting down.");
        })
        .await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.health())
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        ],
    )
}

async fn method_not_allowed() -> FunctionError {
    FunctionError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Unparseable bodies behave like empty ones: every field is missing.
fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

fn number_field(body: &Value, key: &str) -> Option<u32> {
    match body.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| *n != 0)
}

fn referer(headers: &HeaderMap, state: &ServerState) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.referer.clone())
}

fn require_key(state: &ServerState) -> Result<(), FunctionError> {
    if state.bridge.has_key() {
        Ok(())
    } else {
        error!("[SERVER] OPENROUTER_API_KEY is not set");
        Err(FunctionError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "OPENROUTER_API_KEY is not set in the server environment",
        ))
    }
}

fn parse_tone_genre(tone: &str, genre: &str) -> Result<(Tone, Genre), FunctionError> {
    let tone = tone.parse::<Tone>().map_err(FunctionError::bad_request)?;
    let genre = genre.parse::<Genre>().map_err(FunctionError::bad_request)?;
    Ok((tone, genre))
}

async fn generate_script(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> FunctionResult {
    require_key(&state)?;
    let body = parse_body(&body);

    let (Some(summary), Some(duration), Some(tone), Some(genre)) = (
        text_field(&body, "summary"),
        number_field(&body, "duration"),
        text_field(&body, "tone"),
        text_field(&body, "genre"),
    ) else {
        return Err(FunctionError::bad_request(
            "Missing required fields: summary, duration, tone, genre",
        ));
    };
    let duration = FeatureDuration::try_from(duration).map_err(FunctionError::bad_request)?;
    let (tone, genre) = parse_tone_genre(&tone, &genre)?;
    let input = ScriptInput {
        summary,
        duration,
        tone,
        genre,
    };

    let pair = screenplay_prompt(&input);
    let referer = referer(&headers, &state);
    let result = state
        .bridge
        .chat(&pair.system, &pair.user, SCREENPLAY_TITLE, Some(&referer))
        .await;
    state.record(result.is_ok());

    match result {
        Ok(c) => Ok(Json(json!({
            "screenplay": c.content,
            "model": c.model,
            "usage": c.usage,
        }))),
        Err(UpstreamError::Status { status, body }) => Err(FunctionError::new(
            StatusCode::BAD_GATEWAY,
            format!("OpenRouter request failed: {}", status),
        )
        .with_details(body)),
        Err(UpstreamError::EmptyContent) => Err(FunctionError::new(
            StatusCode::BAD_GATEWAY,
            "OpenRouter returned no content",
        )),
        Err(e) => {
            error!("[SERVER] generate-script error: {}", e);
            Err(FunctionError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn generate_ads_script(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> FunctionResult {
    require_key(&state)?;
    let body = parse_body(&body);

    let (Some(summary), Some(seconds), Some(tone), Some(genre)) = (
        text_field(&body, "summary"),
        number_field(&body, "durationSeconds"),
        text_field(&body, "tone"),
        text_field(&body, "genre"),
    ) else {
        return Err(FunctionError::bad_request(
            "Missing required fields: summary, durationSeconds, tone, genre",
        ));
    };
    let duration_seconds = AdDuration::try_from(seconds).map_err(FunctionError::bad_request)?;
    let (tone, genre) = parse_tone_genre(&tone, &genre)?;
    let input = AdScriptInput {
        summary,
        duration_seconds,
        tone,
        genre,
    };

    let pair = ad_prompt(&input);
    let referer = referer(&headers, &state);
    let result = state
        .bridge
        .chat(&pair.system, &pair.user, ADS_TITLE, Some(&referer))
        .await;
    state.record(result.is_ok());

    match result {
        Ok(c) => Ok(Json(json!({
            "script": c.content,
            "model": state.bridge.model(),
        }))),
        Err(UpstreamError::Status { status, body }) => Err(FunctionError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("OpenRouter request failed: {}", status),
        )
        .with_details(body)),
        Err(UpstreamError::EmptyContent) => Err(FunctionError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "No content returned",
        )),
        Err(e) => {
            error!("[SERVER] generate-ads-script error: {}", e);
            Err(FunctionError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn generate_prompts(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> FunctionResult {
    let body = parse_body(&body);
    require_key(&state)?;

    let screenplay = body
        .get("screenplay")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if screenplay.trim().is_empty() {
        return Err(FunctionError::bad_request(
            "Missing 'screenplay' in request body",
        ));
    }

    let referer = referer(&headers, &state);
    let result = extract_scene_prompts(&state.bridge, screenplay, Some(&referer)).await;
    state.record(result.is_ok());

    match result {
        Ok(extracted) => serde_json::to_value(&extracted).map(Json).map_err(|e| {
            FunctionError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }),
        Err(e) => match e.downcast_ref::<UpstreamError>() {
            Some(UpstreamError::Status { status, body }) => {
                warn!("[SERVER] OpenRouter error: {} {}", status, body);
                Err(FunctionError::new(
                    StatusCode::BAD_GATEWAY,
                    format!("OpenRouter failed: {}", status),
                )
                .with_details(body.clone()))
            }
            _ => {
                error!("[SERVER] generate-prompts error: {:#}", e);
                Err(FunctionError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{:#}", e),
                ))
            }
        },
    }
}

async fn generate_image(State(state): State<AppState>, body: Bytes) -> FunctionResult {
    let body = parse_body(&body);
    if !state.bridge.has_image_key() {
        return Err(FunctionError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "No image API key is set in the server environment",
        ));
    }

    let Some(prompt) = text_field(&body, "prompt") else {
        return Err(FunctionError::bad_request("Missing 'prompt' in request body"));
    };

    let result = state.bridge.generate_image(&prompt).await;
    state.record(result.is_ok());

    match result {
        Ok(image) => Ok(Json(json!({ "image": image }))),
        Err(UpstreamError::Status { status, body }) => Err(FunctionError::new(
            StatusCode::BAD_GATEWAY,
            format!("Image generation failed: {}", status),
        )
        .with_details(body)),
        Err(UpstreamError::EmptyContent) => Err(FunctionError::new(
            StatusCode::BAD_GATEWAY,
            "No image returned",
        )),
        Err(e) => {
            error!("[SERVER] generate-image error: {}", e);
            Err(FunctionError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_field_accepts_numbers_and_numeric_strings() {
        let body = json!({ "a": 90, "b": "45", "c": 0, "d": "soon", "e": -3 });
        assert_eq!(number_field(&body, "a"), Some(90));
        assert_eq!(number_field(&body, "b"), Some(45));
        assert_eq!(number_field(&body, "c"), None);
        assert_eq!(number_field(&body, "d"), None);
        assert_eq!(number_field(&body, "e"), None);
        assert_eq!(number_field(&body, "missing"), None);

        let floats = json!({ "whole": 90.0, "part": 90.5 });
        assert_eq!(number_field(&floats, "whole"), Some(90));
        assert_eq!(number_field(&floats, "part"), None);
    }

    #[test]
    fn test_text_field_treats_blank_as_missing() {
        let body = json!({ "summary": "  ", "tone": "Dark", "n": 3 });
        assert_eq!(text_field(&body, "summary"), None);
        assert_eq!(text_field(&body, "tone").as_deref(), Some("Dark"));
        assert_eq!(text_field(&body, "n"), None);
    }

    #[test]
    fn test_garbage_body_is_null() {
        assert_eq!(parse_body(&Bytes::from_static(b"{oops")), Value::Null);
    }
}
