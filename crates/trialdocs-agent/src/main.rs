//! trialdocs: question answering over clinical-trial documents.
//!
//! Usage:
//!   trialdocs serve [--bind addr]
//!   trialdocs ask --nct <id> <question...>
//!   trialdocs download [--only-empty] [--report path]

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trialdocs_ingestion::downloader::{DownloadTargets, Downloader};
use trialdocs_ingestion::{load_ris, load_trial_rows, HttpFetcher};
use trialdocs_llm::backend::DEFAULT_BASE_URL;
use trialdocs_llm::OpenAiBackend;
use trialdocs_rag::{AnswerService, TrialCatalog};
use trialdocs_web::{build_router, AppState};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "trialdocs",
    version,
    about = "Answer questions about clinical trials from their registry documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (/health, /chat)
    Serve {
        /// Address to bind (overrides server.bind and TRIALDOCS_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Answer one question and print the JSON response
    Ask {
        /// Trial identifier in any spelling (e.g. nct4019)
        #[arg(long)]
        nct: String,
        /// The question; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Download every document referenced by the CSV export
    Download {
        /// Only retry trials whose download directory exists but is empty
        #[arg(long)]
        only_empty: bool,
        /// Write failed downloads to this JSON file
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trialdocs=debug,info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load().context("could not load configuration")?;
    info!(version = env!("CARGO_PKG_VERSION"), "trialdocs starting");

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let service = build_answer_service(&mut config)?;
            serve(service, &bind).await
        }
        Commands::Ask { nct, question } => {
            let service = build_answer_service(&mut config)?;
            let answer = service.answer(&nct, &question.join(" ")).await?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
            Ok(())
        }
        Commands::Download { only_empty, report } => download(&config, only_empty, report).await,
    }
}

/// Catalog, fetcher and LLM backend wired into one orchestrator.
fn build_answer_service(config: &mut Config) -> anyhow::Result<AnswerService> {
    let catalog = TrialCatalog::load(
        &config.data.csv_path,
        &config.data.ris_path,
        config.data.download_dir.clone(),
    )
    .with_context(|| format!("failed to load trial catalog from {}", config.data.csv_path.display()))?;

    let fetcher = HttpFetcher::new(config.fetch_timeout()).context("failed to build document fetcher")?;

    let api_key = config.llm.api_key.take();
    if api_key.is_none() && config.llm.base_url == DEFAULT_BASE_URL {
        warn!("No API key configured (set llm.api_key or OPENAI_API_KEY); requests will be rejected");
    }
    let llm = OpenAiBackend::new(
        config.llm.base_url.clone(),
        config.llm.chat_model.clone(),
        api_key,
        config.request_timeout(),
    )
    .context("failed to build LLM client")?
    .with_embedding_model(config.llm.embedding_model.clone());
    info!(
        chat_model = %config.llm.chat_model,
        embedding_model = %config.llm.embedding_model,
        trials = catalog.len(),
        "Answer service ready"
    );

    Ok(AnswerService::new(
        Arc::new(catalog),
        Arc::new(fetcher),
        Arc::new(llm),
        config.rag_config(),
    ))
}

async fn serve(service: AnswerService, bind: &str) -> anyhow::Result<()> {
    let router = build_router(AppState::new(Arc::new(service)));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("Listening on http://{}", bind);
    info!("   Health: http://{}/health", bind);
    info!("   Chat:   POST http://{}/chat", bind);

    axum::serve(listener, router).await?;
    Ok(())
}

async fn download(config: &Config, only_empty: bool, report: Option<PathBuf>) -> anyhow::Result<()> {
    let rows = load_trial_rows(&config.data.csv_path)
        .with_context(|| format!("failed to read {}", config.data.csv_path.display()))?;
    let bibliography = load_ris(&config.data.ris_path)?;

    let targets = if only_empty { DownloadTargets::OnlyEmpty } else { DownloadTargets::All };
    let downloader = Downloader::new(config.download_config())?;
    let summary = downloader.run(&rows, &bibliography, targets).await?;

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped_missing = summary.skipped_missing,
        "Download run finished"
    );
    if let Some(path) = report {
        if summary.write_report(&path)? {
            info!(path = %path.display(), "Failure report written");
        }
    }
    println!(
        "downloaded: {}  failed: {}  skipped (not in CSV): {}",
        summary.succeeded, summary.failed, summary.skipped_missing
    );
    Ok(())
}
