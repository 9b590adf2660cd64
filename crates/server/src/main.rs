//! Vanguard Server
//!
//! Axum server exposing the forge, the chat assistant and configuration over
//! `/api/v1`, plus a headless `forge` command for one-shot runs.

mod api;

use anyhow::Context;
use axum::{
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc, Mutex, RwLock},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use vanguard_core::chat::ChatAssistant;
use vanguard_core::config::ForgeConfig;
use vanguard_core::export::{build_archive, write_archive};
use vanguard_core::generator::{GeminiGenerator, ImagePayload};
use vanguard_core::state::Session;
use vanguard_core::swarm::{Coordinator, ForgeEvent};

use api::config::PersistedConfig;

/// Application state
pub struct AppState {
    coordinator: Arc<Coordinator>,
    event_tx: broadcast::Sender<ForgeEvent>,
    chat: Mutex<ChatAssistant>,
    /// Token of the in-flight run or refinement
    cancel: RwLock<Option<Arc<CancellationToken>>>,
}

impl AppState {
    fn new(
        coordinator: Coordinator,
        event_tx: broadcast::Sender<ForgeEvent>,
        chat: ChatAssistant,
    ) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            event_tx,
            chat: Mutex::new(chat),
            cancel: RwLock::new(None),
        }
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Parser, Clone)]
#[command(author, version, about = "Vanguard - UI screenshot forge")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Vanguard server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Forge one screenshot without a server and write the archive
    Forge {
        /// Path to the screenshot
        image: PathBuf,
        /// Extra context for the analysis
        #[arg(short, long, default_value = "")]
        instruction: String,
        /// Directory the archive is written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Skip the pacing between agents
        #[arg(long)]
        fast: bool,
    },
}

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vanguard API",
        version = "1.0.0",
        description = "API for the Vanguard Infinity screenshot forge"
    ),
    paths(
        api::forge::get_status,
        api::forge::get_roster,
        api::forge::run_forge,
        api::forge::refine_forge,
        api::forge::cancel_forge,
        api::forge::set_query,
        api::forge::get_result,
        api::forge::export_archive,
        api::chat::send_message,
        api::chat::get_history,
        api::config::get_config,
        api::config::update_config,
        api::config::get_providers
    ),
    components(
        schemas(
            api::ApiResponse,
            api::forge::RunRequest,
            api::forge::RefineRequest,
            api::forge::QueryRequest,
            api::chat::ChatRequest,
            api::chat::ChatResponse,
            api::config::PersistedConfig,
            api::config::ConfigResponse,
            api::config::ConfigDefaults,
            api::config::ProvidersResponse,
            api::config::ProviderInfo
        )
    ),
    tags(
        (name = "forge", description = "Forge pipeline, results and export"),
        (name = "chat", description = "Control Tower assistant"),
        (name = "config", description = "Configuration management"),
        (name = "providers", description = "LLM provider discovery")
    )
)]
struct ApiDoc;

async fn serve_openapi() -> impl IntoResponse {
    let spec = ApiDoc::openapi().to_json().unwrap_or_default();
    ([(header::CONTENT_TYPE, "application/json")], spec)
}

fn router(state: SharedState) -> Router {
    Router::new()
        .nest("/api/v1/forge", api::forge::forge_routes())
        .route("/api/v1/chat", post(api::chat::send_message))
        .route("/api/v1/chat/history", get(api::chat::get_history))
        .route(
            "/api/v1/config",
            get(api::config::get_config).patch(api::config::update_config),
        )
        .route("/api/v1/providers", get(api::config::get_providers))
        .route("/api/v1/openapi.json", get(serve_openapi))
        .with_state(state)
}

fn build_generator(config: &ForgeConfig) -> anyhow::Result<GeminiGenerator> {
    GeminiGenerator::from_env(&config.analysis_model)
        .context("Set GEMINI_API_KEY (or API_KEY) to reach the content generator")
}

// === Server Entry ===

async fn run_server(port: u16) -> anyhow::Result<()> {
    let config = PersistedConfig::load().await.apply(ForgeConfig::default());
    let generator = build_generator(&config)?;

    // Bridge coordinator events to every SSE subscriber
    let (event_mpsc_tx, mut event_mpsc_rx) = mpsc::channel::<ForgeEvent>(256);
    let (event_tx, _) = broadcast::channel::<ForgeEvent>(256);
    let broadcast_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = event_mpsc_rx.recv().await {
            let _ = broadcast_tx.send(event);
        }
    });

    let chat = ChatAssistant::with_model(config.chat.clone());
    let session = Session::new(&config).shared();
    let coordinator = Coordinator::new(config, session, Arc::new(generator))
        .with_event_channel(event_mpsc_tx);

    let state: SharedState = Arc::new(AppState::new(coordinator, event_tx, chat));

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Vanguard server running at http://{}", addr);
    tracing::info!("Forge:     /api/v1/forge/status, /run, /refine, /events, /export");
    tracing::info!("Chat:      /api/v1/chat");
    tracing::info!("Config:    /api/v1/config (GET, PATCH)");
    tracing::info!("OpenAPI:   /api/v1/openapi.json");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// === Headless Forge ===

async fn run_headless(
    image: PathBuf,
    instruction: String,
    out: PathBuf,
    fast: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let mime = mime_guess::from_path(&image).first_or(mime_guess::mime::IMAGE_PNG);
    let payload = ImagePayload::from_bytes(&bytes, mime.essence_str())?;

    let mut config = PersistedConfig::load().await.apply(ForgeConfig::default());
    if fast {
        config.activation_delay_ms = 0;
        config.certification_delay_ms = 0;
    }
    let generator = build_generator(&config)?;

    let (tx, mut rx) = mpsc::channel::<ForgeEvent>(256);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(entry) = event.log_entry() {
                println!("[{}] {}", entry.source(), entry.message);
            }
        }
    });

    let session = Session::new(&config).shared();
    let coordinator =
        Coordinator::new(config, session, Arc::new(generator)).with_event_channel(tx);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = coordinator
        .run(&payload.to_data_url(), &instruction, &cancel)
        .await;
    ctrl_c.abort();
    // Closes the event channel so the printer drains and exits
    drop(coordinator);
    let _ = printer.await;

    let result = outcome?;
    let archive = build_archive(Some(&result))?
        .context("Forge produced no archive")?;
    let path = write_archive(&archive, &out).await?;
    println!("Archive written to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vanguard=info,vanguard_core=info,vanguard_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match args.command {
        Some(CliCommand::Forge {
            image,
            instruction,
            out,
            fast,
        }) => run_headless(image, instruction, out, fast).await,
        Some(CliCommand::Serve { port }) => run_server(port).await,
        None => run_server(8080).await,
    }
}
