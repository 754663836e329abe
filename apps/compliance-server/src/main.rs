//! Packaging Compliance Server
//!
//! Hosts the compliance engine behind a small REST API. A caller posts the
//! labeling requirements for a product together with the texts and symbols
//! an upstream detector found on the packaging image, and gets back a
//! validation report.
//!
//! - Validation (JSON report or plain-text review rendering)
//! - Requirement preview
//! - Synonym table listing
//!
//! ## Architecture
//!
//! The engine is synchronous and stateless. Each request runs it on the
//! blocking pool under a per-request timeout, with per-IP rate limiting
//! via tower-governor in front.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use compliance_engine::{ComplianceEngine, EngineConfig, LayoutPolicy, SynonymTable};

mod api;
mod error;

use api::{handle_health, handle_list_synonyms, handle_preview_requirements, handle_validate};

/// Command-line arguments for the compliance server
#[derive(Parser, Debug)]
#[command(name = "compliance-server")]
#[command(about = "Packaging compliance validation server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Validation timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON synonym table replacing the built-in families
    #[arg(long)]
    synonyms: Option<String>,

    /// How layout requirements are judged: assume-satisfied or match-evidence
    #[arg(long, default_value = "assume-satisfied")]
    layout_policy: LayoutPolicy,

    /// Ignore symbol detections scored below this confidence
    #[arg(long, default_value = "0.0")]
    min_symbol_confidence: f64,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ComplianceEngine>,
    /// Validation timeout in milliseconds
    pub timeout_ms: u64,
}

/// Routes and CORS; rate limiting is added by `main` since it needs peer addresses
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/validate", post(handle_validate))
        .route("/api/requirements/preview", post(handle_preview_requirements))
        .route("/api/synonyms", get(handle_list_synonyms))
        .layer(cors)
        .with_state(state)
}

fn load_synonyms(path: Option<&str>) -> anyhow::Result<Arc<SynonymTable>> {
    let Some(path) = path else {
        return Ok(SynonymTable::builtin());
    };

    let json = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read synonym table {}", path))?;
    let table = SynonymTable::from_json_str(&json)
        .with_context(|| format!("Invalid synonym table {}", path))?;
    info!(
        "Loaded {} synonym families from {}",
        table.families().len(),
        path
    );
    Ok(Arc::new(table))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting compliance server on {}:{}", args.host, args.port);

    let config = EngineConfig {
        layout_policy: args.layout_policy,
        min_symbol_confidence: args.min_symbol_confidence,
    };
    let synonyms = load_synonyms(args.synonyms.as_deref())?;

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .context("Failed to create rate limiter config")?,
    );

    // Create shared state
    let state = AppState {
        engine: Arc::new(ComplianceEngine::with_config(config, synonyms)),
        timeout_ms: args.timeout_ms,
    };

    let app = router(state).layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    }));

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Validation timeout: {}ms", args.timeout_ms);
    info!("Layout policy: {}", args.layout_policy);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
