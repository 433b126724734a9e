mod common;

use common::{spawn_upstream, Upstream};
use std::path::Path;
use std::sync::Arc;
use studioscript_core::agent::core::StudioCore;
use studioscript_core::agent::image_gen::{self, ImageClient};
use studioscript_core::agent::openrouter_bridge::OpenRouterBridge;
use studioscript_core::agent::scene_prompts::{SceneBoard, ScenePrompt, ScenePromptResult};
use studioscript_core::agent::writer::{GenerationSource, OFFLINE_NOTICE};
use studioscript_core::config::StudioConfig;
use studioscript_core::editor::{self, ScriptKind, NEW_BEAT};
use studioscript_core::export;
use studioscript_core::script::{AdDuration, AdScriptInput, FeatureDuration, Genre, ScriptInput, Tone};
use studioscript_core::server;
use studioscript_core::state::ServerState;

fn offline_core(dir: &Path) -> StudioCore {
    StudioCore::new(StudioConfig {
        api_key: None,
        functions_url: None,
        data_dir: dir.to_path_buf(),
        ..StudioConfig::default()
    })
    .unwrap()
}

fn screenplay_input() -> ScriptInput {
    ScriptInput {
        summary: "A retired astronaut\nreturns to the launch site.".to_string(),
        duration: FeatureDuration::try_from(60).unwrap(),
        tone: Tone::Serious,
        genre: Genre::SciFi,
    }
}

fn ad_input() -> AdScriptInput {
    AdScriptInput {
        summary: "Trail shoes that grip wet rock.".to_string(),
        duration_seconds: AdDuration::try_from(45).unwrap(),
        tone: Tone::Lighthearted,
        genre: Genre::Action,
    }
}

/// Serves the functions router on a random port and returns its `/functions/v1` base.
async fn spawn_functions(upstream: &str) -> String {
    let state = Arc::new(ServerState::new(StudioConfig {
        api_key: Some("sk-server".to_string()),
        api_url: upstream.to_string(),
        image_api_url: upstream.to_string(),
        timeout_secs: 5,
        ..StudioConfig::default()
    }));
    let app = server::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/functions/v1", addr)
}

#[tokio::test]
async fn test_offline_create_is_saved_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let core = offline_core(dir.path());

    let generated = core.create_screenplay(screenplay_input()).await.unwrap();
    assert_eq!(
        generated.source,
        GenerationSource::Offline(OFFLINE_NOTICE.to_string())
    );
    assert!(generated.text.contains("VOICE OVER\nA retired astronaut returns to the launch site."));
    assert!(generated.text.contains("Generated 12 scenes for 60 minutes"));

    let reopened = offline_core(dir.path());
    assert_eq!(reopened.last_text(ScriptKind::Screenplay).unwrap(), generated.text);
    assert!(reopened.last_text(ScriptKind::Ad).is_err());
}

#[tokio::test]
async fn test_offline_ad_and_blank_summary() {
    let dir = tempfile::tempdir().unwrap();
    let core = offline_core(dir.path());

    let generated = core.create_ad(ad_input()).await.unwrap();
    assert!(generated.is_offline());
    assert!(generated.text.starts_with("AD TITLE: Untitled Action Spot"));
    assert!(generated.text.contains("SHOT 9 (40s–45s)"));
    assert_eq!(core.last_text(ScriptKind::Ad).unwrap(), generated.text);

    let mut blank = ad_input();
    blank.summary = "  \n ".to_string();
    assert!(core.create_ad(blank).await.is_err());
}

#[tokio::test]
async fn test_edits_persist() {
    let dir = tempfile::tempdir().unwrap();
    let core = offline_core(dir.path());
    let original = core.create_screenplay(screenplay_input()).await.unwrap().text;

    let with_beat = core
        .edit(ScriptKind::Screenplay, |t, e| (editor::append_beat(t), e))
        .unwrap();
    assert_eq!(with_beat, format!("{}{}", original, NEW_BEAT));

    let expanded = core
        .edit(ScriptKind::Screenplay, |t, e| {
            editor::toggle_scale(t, e, ScriptKind::Screenplay)
        })
        .unwrap();
    assert!(expanded.ends_with("[Expanded content... add more dialogues and descriptions]"));

    let shrunk = core
        .edit(ScriptKind::Screenplay, |t, e| {
            editor::toggle_scale(t, e, ScriptKind::Screenplay)
        })
        .unwrap();
    assert_eq!(shrunk.chars().count(), expanded.chars().count() * 9 / 10);

    let reopened = offline_core(dir.path());
    assert_eq!(reopened.last_text(ScriptKind::Screenplay).unwrap(), shrunk);

    let out = dir.path().join("exports");
    let path = export::export_fountain(&shrunk, &out).unwrap();
    assert_eq!(path, out.join("screenplay.fountain"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), shrunk);
}

#[tokio::test]
async fn test_saved_key_and_missing_credential() {
    let dir = tempfile::tempdir().unwrap();
    let core = offline_core(dir.path());

    let err = core
        .extract_prompts("INT. ROOM - DAY", ScriptKind::Screenplay)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No API key configured"));

    let err = core.extract_prompts("   ", ScriptKind::Ad).await.unwrap_err();
    assert_eq!(err.to_string(), "Please add ad script text first.");

    core.save_api_key("  sk-or-saved  ").unwrap();
    assert_eq!(core.saved_api_key().unwrap().as_deref(), Some("sk-or-saved"));
    core.save_api_key("").unwrap();
    assert_eq!(core.saved_api_key().unwrap(), None);
}

#[tokio::test]
async fn test_unreachable_provider_falls_back_to_template() {
    let dir = tempfile::tempdir().unwrap();
    let core = StudioCore::new(StudioConfig {
        api_key: Some("sk-test".to_string()),
        api_url: "http://127.0.0.1:9".to_string(),
        functions_url: None,
        data_dir: dir.path().to_path_buf(),
        timeout_secs: 5,
        ..StudioConfig::default()
    })
    .unwrap();

    let generated = core.create_screenplay(screenplay_input()).await.unwrap();
    match &generated.source {
        GenerationSource::Offline(reason) => assert!(reason.starts_with("Generation failed:")),
        other => panic!("expected offline fallback, got {:?}", other),
    }
    assert!(generated.text.starts_with("Title: Untitled Sci-Fi Project"));
}

#[tokio::test]
async fn test_proxy_round_trip_with_images() {
    let upstream = spawn_upstream(Upstream::Ok).await;
    let functions_url = spawn_functions(&upstream).await;
    let dir = tempfile::tempdir().unwrap();
    let core = StudioCore::new(StudioConfig {
        api_key: None,
        functions_url: Some(functions_url),
        data_dir: dir.path().to_path_buf(),
        timeout_secs: 5,
        ..StudioConfig::default()
    })
    .unwrap();

    let generated = core.create_screenplay(screenplay_input()).await.unwrap();
    assert_eq!(generated.source, GenerationSource::Proxy);
    assert!(generated.text.starts_with("StudioScript AI|"));

    let ad = core.create_ad(ad_input()).await.unwrap();
    assert!(ad.text.starts_with("StudioScript AI - Ads|"));

    let extracted = core
        .extract_prompts(&generated.text, ScriptKind::Screenplay)
        .await
        .unwrap();
    assert_eq!(extracted.model, "fake/model");
    let ScenePromptResult::Scenes(scenes) = extracted.result else {
        panic!("expected parsed scenes");
    };
    assert_eq!(scenes.len(), 2);

    let mut board = SceneBoard::new(scenes);
    let failures = image_gen::render_all(&core.image_client(), &mut board, 2).await;
    assert!(failures.is_empty());
    assert!(board.scenes.iter().all(|s| !s.is_generating_image));
    assert_eq!(
        board.get(1).unwrap().generated_image.as_deref(),
        Some("data:image/png;base64,iVBORw0KGgo=")
    );

    let out = dir.path().join("images");
    let written = export::export_board_images(&board, &out).unwrap();
    assert_eq!(written, vec![out.join("scene-1.png"), out.join("scene-2.png")]);
}

#[tokio::test]
async fn test_proxy_errors_fall_back_and_surface() {
    let upstream = spawn_upstream(Upstream::Fail(503)).await;
    let functions_url = spawn_functions(&upstream).await;
    let dir = tempfile::tempdir().unwrap();
    let core = StudioCore::new(StudioConfig {
        functions_url: Some(functions_url),
        data_dir: dir.path().to_path_buf(),
        timeout_secs: 5,
        ..StudioConfig::default()
    })
    .unwrap();

    let generated = core.create_screenplay(screenplay_input()).await.unwrap();
    match &generated.source {
        GenerationSource::Offline(reason) => {
            assert!(reason.contains("OpenRouter request failed: 503"))
        }
        other => panic!("expected offline fallback, got {:?}", other),
    }

    let err = core
        .extract_prompts("INT. ROOM - DAY", ScriptKind::Screenplay)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("OpenRouter failed: 503"));

    let mut board = SceneBoard::new(vec![ScenePrompt {
        scene_number: 4,
        title: "Roof".to_string(),
        prompt: "Rooftop at dusk".to_string(),
    }]);
    let failures = image_gen::render_all(&core.image_client(), &mut board, 1).await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 4);
    assert!(!board.get(4).unwrap().is_generating_image);
    assert!(board.get(4).unwrap().generated_image.is_none());
}

fn direct_images(upstream: &str) -> ImageClient {
    let config = StudioConfig {
        image_api_url: upstream.to_string(),
        timeout_secs: 5,
        ..StudioConfig::default()
    };
    ImageClient::Direct(OpenRouterBridge::new(&config, Some("sk-test".to_string())))
}

fn single_scene_board() -> SceneBoard {
    SceneBoard::new(vec![ScenePrompt {
        scene_number: 2,
        title: "Alley".to_string(),
        prompt: "Neon alley in rain".to_string(),
    }])
}

#[tokio::test]
async fn test_render_scene_stores_image_or_clears_flag() {
    let ok = direct_images(&spawn_upstream(Upstream::Ok).await);
    let mut board = single_scene_board();
    image_gen::render_scene(&ok, &mut board, 2).await.unwrap();
    let scene = board.get(2).unwrap();
    assert_eq!(
        scene.generated_image.as_deref(),
        Some("data:image/png;base64,iVBORw0KGgo=")
    );
    assert!(!scene.is_generating_image);

    let missing = image_gen::render_scene(&ok, &mut board, 9).await.unwrap_err();
    assert!(missing.to_string().contains("No scene 9"));

    let failing = direct_images(&spawn_upstream(Upstream::Fail(500)).await);
    let mut board = single_scene_board();
    assert!(image_gen::render_scene(&failing, &mut board, 2).await.is_err());
    let scene = board.get(2).unwrap();
    assert!(!scene.is_generating_image);
    assert!(scene.generated_image.is_none());
}
