//! Speaking URL decoder service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                SPEAKING URL DECODER               │
//!                    │                                                   │
//!  GET /news/item/42 │  ┌─────────┐    ┌─────────────┐    ┌───────────┐  │
//!  ──────────────────┼─▶│  http   │───▶│   decoder   │───▶│ url_cache │  │
//!                    │  │ server  │    │orchestrator │    └─────┬─────┘  │
//!                    │  └────┬────┘    └──────┬──────┘          │ miss   │
//!                    │       │                │                 ▼        │
//!                    │       │                │          ┌────────────┐  │
//!                    │       │                │          │  resolver  │  │
//!                    │       │                │          │ path_cache │  │
//!                    │       │                │          │ + tree     │  │
//!  200 JSON / 30x /  │       │                │          └────────────┘  │
//!  404 diagnostic    │       ▼                ▼                          │
//!  ◀─────────────────┼── response ◀──── DecodeOutcome                    │
//!                    │                                                   │
//!                    │  config (TOML + watcher) · observability · admin  │
//!                    └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use speaking_url::lifecycle::startup;

#[derive(Parser)]
#[command(name = "speaking-url")]
#[command(about = "Decodes speaking URLs into page ids and query parameters", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    startup::run(args.config.as_deref()).await?;
    Ok(())
}
