//! Fake provider for the chat and image endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

/// How the fake provider answers.
#[allow(dead_code)]
#[derive(Clone, Copy)]
pub enum Upstream {
    Ok,
    Fail(u16),
    Empty,
    /// Content made of whitespace only.
    Blank,
}

pub const FENCED_SCENES: &str = "```json\n{\"scenes\":[{\"scene_number\":1,\"title\":\"Rooftop\",\"prompt\":\"Wide shot of a rooftop at dusk\"},{\"scene_number\":2,\"title\":\"Alley\",\"prompt\":\"Neon alley in rain\"}]}\n```";

async fn fake_chat(
    State(mode): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    match mode {
        Upstream::Fail(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "error": "upstream says no" })),
        ),
        Upstream::Empty => (StatusCode::OK, Json(json!({ "choices": [] }))),
        Upstream::Blank => (
            StatusCode::OK,
            Json(json!({ "choices": [{ "message": { "content": "  \n  " } }] })),
        ),
        Upstream::Ok => {
            let title = header("x-title");
            let content = if title == "StudioScript AI - Scene Prompts" {
                FENCED_SCENES.to_string()
            } else {
                format!("{}|{}|{}", title, header("http-referer"), body["model"].as_str().unwrap_or(""))
            };
            (
                StatusCode::OK,
                Json(json!({
                    "model": "fake/model",
                    "choices": [{ "message": { "content": content } }],
                    "usage": { "total_tokens": 42 }
                })),
            )
        }
    }
}

async fn fake_images(State(mode): State<Upstream>) -> impl IntoResponse {
    match mode {
        Upstream::Fail(code) => (StatusCode::from_u16(code).unwrap(), Json(json!({}))),
        Upstream::Empty | Upstream::Blank => (StatusCode::OK, Json(json!({ "data": [] }))),
        Upstream::Ok => (
            StatusCode::OK,
            Json(json!({ "data": [{ "b64_json": "iVBORw0KGgo=" }] })),
        ),
    }
}

pub async fn spawn_upstream(mode: Upstream) -> String {
    let app = Router::new()
        .route("/chat/completions", post(fake_chat))
        .route("/images/generations", post(fake_images))
        .with_state(mode);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
