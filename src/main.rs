//! reel-relay CLI - republish one reel per invocation

use clap::Parser;
use reel_relay::{Config, Pipeline, PostOptions};
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Republish a short-form video: fetch the reel, upload it, create the post.
#[derive(Parser)]
#[command(name = "reel-relay", version, about)]
struct Cli {
    /// Source platform reel URL
    url: String,

    /// Explicit post title (overrides any downloaded caption)
    #[arg(short, long)]
    title: Option<String>,

    /// Destination category identifier
    #[arg(short, long, default_value_t = 25)]
    category_id: u32,

    /// Show download tool output and debug-level diagnostics
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over the verbosity flag
    let default_directive = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    let mut config = Config::from_env();
    if cli.verbose {
        config.fetcher.quiet = false;
    }

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "failed to initialize pipeline");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let options = PostOptions {
        title: cli.title,
        category_id: Some(cli.category_id),
        ..Default::default()
    };

    match pipeline.process_url(&cli.url, &options).await {
        Ok(()) => {
            println!(
                "Republished {}: video uploaded and post created.",
                cli.url
            );
        }
        Err(e) => {
            error!(url = %cli.url, error = %e, "failed to republish reel");
            eprintln!("Error: failed to process {}: {}", cli.url, e);
            process::exit(1);
        }
    }
}
