// StudioScript Main Entry Point
// Copyright (c) 2026 StudioScript

use studioscript_core::agent::core::StudioCore;
use studioscript_core::agent::image_gen;
use studioscript_core::agent::scene_prompts::{
    combined_prompts, SceneBoard, ScenePrompt, ScenePromptResult,
};
use studioscript_core::agent::writer::GenerationSource;
use studioscript_core::config::StudioConfig;
use studioscript_core::editor::{self, ScriptKind};
use studioscript_core::export;
use studioscript_core::script::{AdDuration, AdScriptInput, FeatureDuration, Genre, ScriptInput, Tone};
use studioscript_core::server;
use studioscript_core::state::ServerState;
use studioscript_core::store::mask_key;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studioscript")]
#[command(about = "StudioScript: screenplays, ad scripts and scene prompts", long_about = None)]
struct Cli {
    /// Store directory (overrides STUDIOSCRIPT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Route generation through a running `studioscript serve` (…/functions/v1)
    #[arg(long, global = true)]
    functions_url: Option<String>,

    /// Chat model (overrides STUDIOSCRIPT_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SummaryArgs {
    /// Story or product summary
    #[arg(short, long, conflicts_with = "summary_file")]
    summary: Option<String>,

    /// Read the summary from a file
    #[arg(long)]
    summary_file: Option<PathBuf>,
}

impl SummaryArgs {
    fn resolve(&self) -> anyhow::Result<String> {
        match (&self.summary, &self.summary_file) {
            (Some(s), _) => Ok(s.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read summary from {:?}", path)),
            (None, None) => bail!("Provide --summary or --summary-file"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a screenplay in Fountain format
    Create {
        #[command(flatten)]
        summary: SummaryArgs,

        /// Length in minutes: 60, 90, 120 or 150
        #[arg(short, long, default_value = "90")]
        duration: FeatureDuration,

        #[arg(short, long, default_value = "Serious")]
        tone: Tone,

        #[arg(short, long, default_value = "Drama")]
        genre: Genre,
    },

    /// Generate an advertising script
    Ads {
        #[command(flatten)]
        summary: SummaryArgs,

        /// Length in seconds: 30, 45, 60, 90 or 120
        #[arg(short, long, default_value = "30")]
        duration: AdDuration,

        #[arg(short, long, default_value = "Serious")]
        tone: Tone,

        #[arg(short, long, default_value = "Drama")]
        genre: Genre,
    },

    /// Print the last screenplay (or ad script)
    Show {
        #[arg(long)]
        ad: bool,
    },

    /// Edit the last screenplay (or ad script)
    Edit {
        #[arg(long, global = true)]
        ad: bool,

        #[command(subcommand)]
        action: EditAction,
    },

    /// Write the last script to disk (screenplay.fountain / ad-script.txt)
    Export {
        #[arg(long)]
        ad: bool,

        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Derive per-scene visual prompts
    Prompts {
        /// Use the last ad script instead of the screenplay
        #[arg(long)]
        ad: bool,

        /// Read the script from a file instead of the store
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Directory for scene-prompts.txt/.json (and images)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Render an image for every scene
        #[arg(long)]
        images: bool,

        /// Image requests in flight at once
        #[arg(long, default_value_t = 3)]
        concurrency: usize,
    },

    /// Render a single image from a prompt
    Image {
        #[arg(short, long)]
        prompt: String,

        /// Scene number used for the file name
        #[arg(long, default_value_t = 1)]
        scene: u32,

        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Manage the saved OpenRouter API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Start the functions server
    Serve {
        /// Port to run the server on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Subcommand)]
enum EditAction {
    /// Append a new insert beat (screenplay)
    Beat,
    /// Append a placeholder shot (ad)
    Shot,
    /// Toggle the expand/shrink scale
    Scale,
    /// Replace the text with a file's contents
    Set {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    Set { key: String },
    Clear,
    Show,
}

fn kind(ad: bool) -> ScriptKind {
    if ad {
        ScriptKind::Ad
    } else {
        ScriptKind::Screenplay
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,hyper=warn,reqwest=warn");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("🚨 [STUDIOSCRIPT PANIC] at {}: {}", location, message);
    }));

    let args = Cli::parse();

    let mut config = StudioConfig::from_env()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(url) = args.functions_url {
        config.functions_url = Some(url);
    }
    if let Some(model) = args.model {
        config.model = model;
    }

    if let Commands::Serve { port } = args.command {
        let state = Arc::new(ServerState::new(config));
        if !state.bridge.has_key() {
            warn!("[SERVER] ⚠️ OPENROUTER_API_KEY is not set; function calls will fail with 500.");
        }
        return server::start_server(port, state).await;
    }

    let core = StudioCore::new(config)?;

    match args.command {
        Commands::Create {
            summary,
            duration,
            tone,
            genre,
        } => {
            let input = ScriptInput {
                summary: summary.resolve()?,
                duration,
                tone,
                genre,
            };
            let generated = core.create_screenplay(input).await?;
            if let GenerationSource::Offline(reason) = &generated.source {
                eprintln!("ℹ️  {}", reason);
            }
            println!("{}", generated.text);
        }
        Commands::Ads {
            summary,
            duration,
            tone,
            genre,
        } => {
            let input = AdScriptInput {
                summary: summary.resolve()?,
                duration_seconds: duration,
                tone,
                genre,
            };
            let generated = core.create_ad(input).await?;
            if generated.is_offline() {
                eprintln!("ℹ️  Ad generation fell back to the demo generator.");
            }
            println!("{}", generated.text);
        }
        Commands::Show { ad } => {
            let text = core.last_text(kind(ad))?;
            println!("{}", text);
            eprintln!("── {} lines", editor::line_count(&text));
        }
        Commands::Edit { ad, action } => {
            let kind = kind(ad);
            let text = match action {
                EditAction::Beat => {
                    let t = core.edit(kind, |t, e| (editor::append_beat(t), e))?;
                    info!("[EDITOR] Added a new beat. Tweak as needed.");
                    t
                }
                EditAction::Shot => {
                    let t = core.edit(kind, |t, e| (editor::append_shot(t), e))?;
                    info!("[EDITOR] Added a new shot. Tweak as needed.");
                    t
                }
                EditAction::Scale => core.edit(kind, |t, e| editor::toggle_scale(t, e, kind))?,
                EditAction::Set { file } => {
                    let replacement = std::fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read {:?}", file))?;
                    core.edit(kind, |_, e| (replacement, e))?
                }
            };
            eprintln!("── {} lines", editor::line_count(&text));
        }
        Commands::Export { ad, dir } => {
            let path = if ad {
                export::export_ad_text(&core.last_text(ScriptKind::Ad)?, &dir)?
            } else {
                export::export_fountain(&core.last_text(ScriptKind::Screenplay)?, &dir)?
            };
            println!("{}", path.display());
        }
        Commands::Prompts {
            ad,
            file,
            out,
            images,
            concurrency,
        } => {
            let kind = kind(ad);
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {:?}", path))?,
                None => core.last_text(kind)?,
            };

            let extracted = core
                .extract_prompts(&text, kind)
                .await
                .context("Failed to generate prompts.")?;

            let scenes = match extracted.result {
                ScenePromptResult::Scenes(scenes) => scenes,
                ScenePromptResult::Raw(raw) => {
                    warn!("The model did not return scene JSON; showing its raw reply.");
                    println!("{}", raw);
                    return Ok(());
                }
            };
            println!("{}", combined_prompts(&scenes));

            if let Some(dir) = &out {
                export::export_prompts(&scenes, dir)?;
            }

            if images {
                let mut board = SceneBoard::new(scenes);
                let failures =
                    image_gen::render_all(&core.image_client(), &mut board, concurrency).await;
                for (n, message) in &failures {
                    error!("Failed to generate image for scene {}: {}", n, message);
                }
                let dir = out.unwrap_or_else(|| PathBuf::from("."));
                for path in export::export_board_images(&board, &dir)? {
                    println!("{}", path.display());
                }
            }
        }
        Commands::Image { prompt, scene, out } => {
            let mut board = SceneBoard::new(vec![ScenePrompt {
                scene_number: scene,
                title: String::new(),
                prompt,
            }]);
            image_gen::render_scene(&core.image_client(), &mut board, scene)
                .await
                .context("Failed to generate image")?;
            for path in export::export_board_images(&board, &out)? {
                println!("{}", path.display());
            }
        }
        Commands::Key { action } => match action {
            KeyAction::Set { key } => {
                core.save_api_key(&key)?;
                println!("OpenRouter API key saved.");
            }
            KeyAction::Clear => {
                core.save_api_key("")?;
                println!("OpenRouter API key cleared.");
            }
            KeyAction::Show => match core.saved_api_key()? {
                Some(key) => println!("{}", mask_key(&key)),
                None => println!("No key saved."),
            },
        },
        // Dispatched above, before the store is opened.
        Commands::Serve { .. } => {}
    }

    Ok(())
}
