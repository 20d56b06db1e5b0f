use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stickerforge_core::config::config_path_from_env;
use stickerforge_core::{
    create_upscaler, load_config, validate_config, AdmissionController, FfmpegEncoder,
    FrameSourceResolver, Gallery, HttpGallery, HttpRegistry, InboxNotifier, JobManager,
    JobRunner, MultiNotifier, Notifier, SetPublisher, SizeConstrainedEncoder, StickerPublisher,
    StickerRegistry, TelegramClient, Upscaler, VideoEncoder, Workspace,
};

use stickerforge_server::api::create_router;
use stickerforge_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = config_path_from_env();

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );

    // Leftovers from a previous run are never resumed.
    let workspace = Workspace::new(&config.workspace);
    workspace
        .reset()
        .await
        .with_context(|| format!("Failed to reset workspace {:?}", config.workspace.root))?;
    info!("Workspace ready at {:?}", config.workspace.root);

    let gallery: Arc<dyn Gallery> = Arc::new(
        HttpGallery::new(config.gallery.clone()).context("Failed to create gallery client")?,
    );
    let upscaler = create_upscaler(&config.upscaler);
    info!("Using upscaler: {}", upscaler.name());

    let ffmpeg: Arc<dyn VideoEncoder> = Arc::new(FfmpegEncoder::new(config.encoder.clone()));
    if let Err(e) = ffmpeg.validate().await {
        warn!(error = %e, "Video encoder unavailable, animated sources will fail");
    }
    let encoder = Arc::new(SizeConstrainedEncoder::new(ffmpeg, config.encoder.clone()));

    let runner = Arc::new(JobRunner::new(
        config.runner.clone(),
        gallery,
        upscaler,
        FrameSourceResolver::new(config.resolver.clone()),
        encoder,
        workspace,
    ));

    let registry: Arc<dyn StickerRegistry> = Arc::new(
        HttpRegistry::new(config.registry.clone()).context("Failed to create registry client")?,
    );
    let telegram = Arc::new(
        TelegramClient::new(config.telegram.clone()).context("Failed to create Telegram client")?,
    );
    let publisher = Arc::new(SetPublisher::new(
        Arc::clone(&telegram) as Arc<dyn StickerPublisher>,
        Arc::clone(&registry),
        &config.telegram,
    ));

    let inbox = Arc::new(InboxNotifier::new());
    let notifier: Arc<dyn Notifier> = Arc::new(MultiNotifier::new(vec![
        Arc::clone(&inbox) as Arc<dyn Notifier>,
        telegram as Arc<dyn Notifier>,
    ]));

    let admission = Arc::new(AdmissionController::new(config.admission.clone()));
    info!(
        max_concurrent_jobs = config.admission.max_concurrent_jobs,
        "Admission controller initialized"
    );

    let manager = JobManager::new(
        config.session.clone(),
        admission,
        runner,
        publisher,
        registry,
        notifier,
    );

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), manager.clone(), inbox));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down, cancelling in-flight jobs...");
    manager.shutdown().await;
    info!("All jobs cleaned up");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
