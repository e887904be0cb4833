use std::sync::Arc;

use clap::{Parser, Subcommand};

use forage::api;
use forage::config::CONFIG;
use forage::data_models::SearchOutcome;
use forage::loadtest;
use forage::scrapper::Scrapper;

const DEFAULT_QUERY: &str = "rust web scraping";

#[derive(Parser)]
#[command(name = "forage", about = "Brave Search results scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve,
    /// Run a single search and print the results
    Query {
        /// Search terms, joined with spaces
        terms: Vec<String>,
    },
    /// Load-test a running server
    Loadtest {
        /// API base URL
        #[arg(long, default_value = "http://localhost:8000")]
        url: String,
        /// Number of queries to send
        #[arg(long, default_value_t = 1000)]
        queries: usize,
        /// Concurrent requests
        #[arg(long, default_value_t = 10)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    match Cli::parse().command {
        Some(Command::Serve) => serve().await,
        Some(Command::Query { terms }) => query(terms).await,
        Some(Command::Loadtest {
            url,
            queries,
            concurrency,
        }) => run_loadtest(url, queries, concurrency).await,
        None => query(Vec::new()).await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let scrapper = Arc::new(Scrapper::new()?);
    let router = api::create_router(scrapper);
    let listener = tokio::net::TcpListener::bind(&CONFIG.bind_addr).await?;
    tracing::info!("listening on {}", CONFIG.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn query(terms: Vec<String>) -> anyhow::Result<()> {
    let query = if terms.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        terms.join(" ")
    };
    println!("Searching Brave for: {query}\n");

    let scrapper = Scrapper::new()?;
    let outcome = scrapper.search(&query).await;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome) {
    println!("{}", "=".repeat(60));
    println!("Query: \"{}\"", outcome.query);
    println!("Status: {}", outcome.status);

    if let Some(error) = &outcome.error_message {
        println!("Error: {error}");
        return;
    }

    println!("Results: {}", outcome.results.len());
    println!();

    for result in &outcome.results {
        println!("  #{}: {}", result.rank, result.title);
        println!("      {}", result.url);
        if !result.snippet.is_empty() {
            // Truncate long snippets for display
            let snippet = if result.snippet.chars().count() > 100 {
                format!("{}...", result.snippet.chars().take(100).collect::<String>())
            } else {
                result.snippet.clone()
            };
            println!("      {snippet}");
        }
        println!();
    }
}

async fn run_loadtest(url: String, queries: usize, concurrency: usize) -> anyhow::Result<()> {
    if let Err(e) = loadtest::check_health(&url).await {
        eprintln!("Error: {e}");
        eprintln!("Make sure the server is running:");
        eprintln!("  forage serve");
        std::process::exit(1);
    }
    loadtest::run_load_test(&url, queries, concurrency).await?;
    Ok(())
}
