use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indexer::load::load_posts;
use indexer::EsClient;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use suggest_core::bulk::suggest_index_mapping;
use suggest_core::config::{StoreConfig, DEFAULT_ES_URL, DEFAULT_SOURCE_INDEX, DEFAULT_SUGGEST_INDEX};
use suggest_core::persist::DumpFile;
use suggest_core::{build_suggestions, RunStats};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the search-as-you-type suggestion index", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Search backend base URL
    #[arg(long, env = "ES_URL", default_value = DEFAULT_ES_URL, global = true)]
    es_url: String,
    /// Index holding the source documents
    #[arg(long, env = "SOURCE_INDEX", default_value = DEFAULT_SOURCE_INDEX, global = true)]
    source_index: String,
    /// Index receiving the aggregated suggestions
    #[arg(long, env = "SUGGEST_INDEX", default_value = DEFAULT_SUGGEST_INDEX, global = true)]
    suggest_index: String,
}

impl From<StoreArgs> for StoreConfig {
    fn from(a: StoreArgs) -> Self {
        StoreConfig { es_url: a.es_url, source_index: a.source_index, suggest_index: a.suggest_index }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild suggestions from every document in the source index
    Build {
        /// Write the bulk stream to this file instead of the suggestion index
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Load a Stack Exchange Posts.xml dump into the source index
    Load {
        /// Path to Posts.xml
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = StoreConfig::from(cli.store);

    match cli.command {
        Commands::Build { dump } => {
            let stats = build(&config, dump).await?;
            tracing::info!(documents = stats.documents, shingles = stats.shingles, batches = stats.batches, "done");
            Ok(())
        }
        Commands::Load { input } => {
            let client = EsClient::new(config.base_url())?;
            let f = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
            let mut sink = client.bulk();
            load_posts(BufReader::new(f), &mut sink, &config.source_index).await?;
            Ok(())
        }
    }
}

async fn build(config: &StoreConfig, dump: Option<PathBuf>) -> Result<RunStats> {
    let client = EsClient::new(config.base_url())?;
    let mut source = client.scroll(&config.source_index);
    match dump {
        Some(path) => {
            let mut sink = DumpFile::create(&path)?;
            let stats = build_suggestions(&mut source, &mut sink, &config.suggest_index).await?;
            sink.close()?;
            tracing::info!(path = %path.display(), "bulk stream written");
            Ok(stats)
        }
        None => {
            client.ensure_index(&config.suggest_index, &suggest_index_mapping()).await?;
            let mut sink = client.bulk();
            build_suggestions(&mut source, &mut sink, &config.suggest_index).await
        }
    }
}
