use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scholar_digest_api::{build_router, AppState};
use scholar_digest_core::{AppConfig, Interests};

#[derive(Parser)]
#[command(
    name = "scholar-digest",
    about = "Turns a handful of interests into one summarized scholarly article"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Run the pipeline once and print the result as JSON
    Digest {
        /// One or more interest tags, e.g. `AI climate`
        #[arg(required = true)]
        interests: Vec<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scholar_digest=info,tower_http=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let state = Arc::new(AppState::from_config(&config));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve(state, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Digest { interests } => {
            let interests = Interests::new(interests)?;
            let outcome = state.pipeline.run(&interests).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn serve(state: Arc<AppState>, config: &AppConfig) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Scholar Digest API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
