use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "decoder-cli")]
#[command(about = "Management CLI for the speaking URL decoder", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a speaking URL and show the result
    Decode {
        /// Site-relative path, e.g. `news/item/42/?L=1`
        path: String,
    },
    /// Check decoder status
    Status,
    /// Show cache row counts
    Cache,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    match cli.command {
        Commands::Decode { path } => {
            let res = client
                .get(format!("{}/{}", base, path.trim_start_matches('/')))
                .send()
                .await?;
            print_decode(res).await?;
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", base))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Cache => {
            let res = client
                .get(format!("{}/admin/cache", base))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_decode(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_redirection() {
        let location = res
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<none>");
        println!("Redirect {} -> {}", status.as_u16(), location);
        return Ok(());
    }
    if !status.is_success() {
        println!("{}: {}", status, res.text().await?);
        return Ok(());
    }
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
