use anyhow::Result;
use axum::Router;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use suggest_core::config::{DEFAULT_ES_URL, DEFAULT_SUGGEST_INDEX};
use suggest_core::persist::load_dump;
use suggest_core::SuggestionQuery;
use suggester::{build_app, SuggestClient};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "suggester")]
#[command(about = "Answer search-as-you-type queries from the suggestion index")]
struct Args {
    /// Search backend base URL
    #[arg(long, env = "ES_URL", default_value = DEFAULT_ES_URL, global = true)]
    es_url: String,
    /// Suggestion index name
    #[arg(long, env = "SUGGEST_INDEX", default_value = DEFAULT_SUGGEST_INDEX, global = true)]
    suggest_index: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print suggestions for a partial input, one per line
    Query {
        partial: String,
        min_views: i64,
        min_answers: i64,
        /// Answer from a bulk dump written by `indexer build --dump` instead of the backend
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Serve suggestions over HTTP
    Serve {
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    match args.command {
        Command::Query { partial, min_views, min_answers, dump } => {
            let query = SuggestionQuery::new(&partial, min_views, min_answers);
            let suggestions = match dump {
                Some(path) => load_dump(path)?.search(&query),
                None => SuggestClient::new(&args.es_url, &args.suggest_index)?.suggest(&query).await?,
            };
            for s in suggestions {
                println!("{s}");
            }
        }
        Command::Serve { host, port } => {
            let app: Router = build_app(SuggestClient::new(&args.es_url, &args.suggest_index)?);
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
