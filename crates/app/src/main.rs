use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use paper_memory_core::{
    fetch_pdf, CharacterNgramEmbedder, Embedder, IngestOptions, IngestPipeline, LopdfExtractor,
    OpenAiConfig, OpenAiEmbedder, QdrantStore, QueryEngine, Service, ToolRequest, ToolResponse,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "paper-memory", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant collection holding the paper chunks
    #[arg(long, default_value = "papers")]
    collection: String,

    /// Use the local hashing embedder instead of the OpenAI API.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// OpenAI-compatible base URL for the embedding provider
    #[arg(
        long,
        default_value = "https://api.openai.com/v1",
        env = "OPENAI_BASE_URL"
    )]
    openai_base_url: String,

    /// Embedding model name
    #[arg(long, default_value = "text-embedding-3-small")]
    model: String,

    /// Embedding dimensionality; must stay constant for one collection.
    #[arg(long, default_value_t = 1536)]
    dimensions: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a folder of PDFs into the vector store.
    Ingest {
        /// Folder that contains PDFs recursively.
        #[arg(long)]
        folder: String,
    },
    /// Query the memory for top-k supporting chunks.
    Query {
        /// Natural-language question
        #[arg(long)]
        question: String,
        /// Number of passages to return.
        #[arg(long, default_value = "5")]
        top_k: usize,
    },
    /// Download a PDF by URL into the download directory.
    Fetch {
        /// PDF URL
        #[arg(long)]
        url: String,
        /// Directory downloaded PDFs are saved to.
        #[arg(long, default_value = "data/papers")]
        download_dir: String,
    },
    /// Clear the vector store. Irreversible.
    Reset,
    /// Liveness check against the store.
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Command::Fetch { url, download_dir } = &cli.command {
        let saved = fetch_pdf(url, Path::new(download_dir)).await?;
        println!("saved {}", saved.display());
        return Ok(());
    }

    let embedder: Arc<dyn Embedder> = if cli.offline {
        Arc::new(CharacterNgramEmbedder::default())
    } else {
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY is not set; pass --offline to use the local embedder")?;
        let config = OpenAiConfig {
            base_url: cli.openai_base_url.clone(),
            model: cli.model.clone(),
            dimensions: cli.dimensions,
            ..OpenAiConfig::new(api_key)
        };
        Arc::new(OpenAiEmbedder::new(config)?)
    };

    let store = Arc::new(QdrantStore::new(
        &cli.qdrant_url,
        &cli.collection,
        embedder.dimensions(),
    ));
    store.ensure_collection().await?;

    let options = IngestOptions::default();
    let pipeline = IngestPipeline::new(
        Arc::new(LopdfExtractor),
        embedder.clone(),
        store.clone(),
        options.clone(),
    );
    let engine = QueryEngine::new(embedder, store.clone(), options.max_embed_attempts);
    let service = Service::new(pipeline, engine, store);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "paper-memory boot"
    );

    match cli.command {
        Command::Ingest { folder } => {
            let response = service
                .dispatch(ToolRequest::IngestFolder { path: folder })
                .await?;
            if let ToolResponse::Ingest(report) = response {
                for failure in &report.errors {
                    warn!(path = %failure.source_path, reason = %failure.reason, "skipped pdf");
                }
                println!(
                    "{} chunks written, {} skipped, {} failed documents at {}",
                    report.chunks_written,
                    report.chunks_skipped,
                    report.errors.len(),
                    Utc::now().to_rfc3339()
                );
            }
        }
        Command::Query { question, top_k } => {
            let response = service
                .dispatch(ToolRequest::Query { question, top_k })
                .await?;
            if let ToolResponse::Query(result) = response {
                println!("question: {}", result.question);
                if result.hits.is_empty() {
                    println!("no supporting passages found");
                }
                for hit in result.hits {
                    println!(
                        "[chunk {}] score={:.4} source={}",
                        hit.chunk_index, hit.score, hit.source_path
                    );
                    println!("{}", hit.text);
                }
            }
        }
        Command::Reset => {
            if let ToolResponse::Reset { records_removed } =
                service.dispatch(ToolRequest::Reset).await?
            {
                println!("store reset, {records_removed} records removed");
            }
        }
        Command::Ping => {
            if let ToolResponse::Pong { records } = service.dispatch(ToolRequest::Ping).await? {
                println!("pong ({records} records)");
            }
        }
        // fetch returns before the store is set up
        Command::Fetch { .. } => {}
    }

    Ok(())
}
