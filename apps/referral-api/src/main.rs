//! CCP Referral Server
//!
//! Fills the CCP referral and consent templates from intake payloads,
//! merges them and emails the packet to the intake team. Provides:
//!
//! - Single-template fill endpoints (with demo payloads)
//! - Emailing a PDF the caller already holds
//! - Lead forwarding to the intake sheet webhook
//! - The end-to-end submit flow the intake form uses

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::{Args, Parser, Subcommand};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod inspect;
mod lead;
mod state;
mod submission;
#[cfg(test)]
mod tests;

use config::Config;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "referral-api")]
#[command(about = "CCP referral intake server")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the fields of a fillable PDF as CSV
    InspectTemplate(inspect::InspectArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Directory holding the templates and the CCU lookup
    #[arg(long, env = "ASSETS_DIR", default_value = ".")]
    assets_dir: PathBuf,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/fill-referral",
            post(handlers::fill_referral).get(handlers::fill_referral_demo),
        )
        .route(
            "/api/fill-consent",
            post(handlers::fill_consent).get(handlers::fill_consent_demo),
        )
        .route("/api/email-referral", post(handlers::email_referral))
        .route("/api/submit-lead", post(handlers::submit_lead))
        .route("/api/submit", post(submission::submit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "referral_api=debug,referral_pdf=debug,referral_mail=debug,referral_core=debug,tower_http=debug"
    } else {
        "referral_api=info,tower_http=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Some(Command::InspectTemplate(args)) => inspect::run(&args),
        Some(Command::Serve) | None => serve(cli.serve).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = Config::from_env();
    let state = AppState::new(&config, &args.assets_dir).shared();
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Referral server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
