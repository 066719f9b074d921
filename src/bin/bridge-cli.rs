use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Drive asbplayer clients through a running anki-bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8766")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connected clients and outstanding replies
    Status,
    /// Seek connected players to a timestamp (seconds)
    Seek { timestamp: f64 },
    /// Load subtitle files into connected players
    LoadSubtitles {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/bridge/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Seek { timestamp } => {
            let res = client
                .post(format!("{}/asbplayer/seek", cli.url))
                .json(&json!({ "timestamp": timestamp }))
                .send()
                .await?;
            print_ack(res).await;
        }
        Commands::LoadSubtitles { files } => {
            let mut encoded = Vec::with_capacity(files.len());
            for path in &files {
                let bytes = std::fs::read(path)?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                encoded.push(json!({ "name": name, "base64": STANDARD.encode(bytes) }));
            }

            let res = client
                .post(format!("{}/asbplayer/load-subtitles", cli.url))
                .json(&json!({ "files": encoded }))
                .send()
                .await?;
            print_ack(res).await;
        }
    }

    Ok(())
}

async fn print_ack(res: reqwest::Response) {
    if res.status().is_success() {
        println!("Acknowledged by a client");
    } else {
        eprintln!("Error: no client acknowledged (status {})", res.status());
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: bridge returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
