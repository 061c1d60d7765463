//! Greenroom binary: configuration, wiring, and the serve loop.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use greenroom::Config;
use greenroom::llm::create_model_invoker;
use greenroom::orchestrator::Orchestrator;
use greenroom::orchestrator::api::{Gateway, GatewayState};
use greenroom::store::{LibSqlStore, MemoryStore, PipelineStore};
use greenroom::transcription::TranscriptionProvider;
use greenroom::transcription::openai::OpenAiWhisper;

#[derive(Parser)]
#[command(name = "greenroom", about = "Mock-interview practice service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (the default).
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("greenroom=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    let store: Arc<dyn PipelineStore> = match &config.store.database_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using libSQL store");
            Arc::new(
                LibSqlStore::open(path)
                    .await
                    .context("opening pipeline store")?,
            )
        }
        None => {
            tracing::warn!("GREENROOM_DB not set; sessions are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let model = create_model_invoker(&config.model).context("creating model invoker")?;

    let transcription: Option<Arc<dyn TranscriptionProvider>> =
        config.transcription.api_key.clone().map(|key| {
            let provider = OpenAiWhisper::new(key, config.transcription.model.clone());
            Arc::new(provider) as Arc<dyn TranscriptionProvider>
        });
    if transcription.is_none() {
        tracing::info!("Transcription disabled; answers must include transcripts");
    }

    let state = GatewayState {
        orchestrator: Arc::new(Orchestrator::new(Arc::clone(&store))),
        store,
        model,
        transcription,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("parsing bind address")?;

    Gateway::start(state, addr).await
}
