//! Fetches a join token from a Sunroom token server and prints the
//! connection details as JSON, ready to paste into a LiveKit client.

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use sunroom_client::{JoinOptions, TokenClient, DEFAULT_ROOM};
use tracing_subscriber::EnvFilter;

/// Request a LiveKit join token from a Sunroom server
#[derive(Parser, Debug)]
#[command(name = "sunroom-join")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the token server
    #[arg(short, long, env = "SUNROOM_TOKEN_SERVER", default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Room to join
    #[arg(short, long, default_value = DEFAULT_ROOM)]
    room: String,

    /// Username; a random one is generated when omitted
    #[arg(short, long)]
    username: Option<String>,

    /// LiveKit URL the token is meant for
    #[arg(long, env = "LIVEKIT_URL", default_value = "")]
    livekit_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut options = JoinOptions {
        room: cli.room,
        ..JoinOptions::default()
    };
    if let Some(username) = cli.username {
        options.username = username;
    }
    options.validate()?;

    let client = TokenClient::new(&cli.server);
    let token = match client.fetch(&options.room, &options.username).await {
        Ok(token) => token,
        Err(e) => {
            eprintln!("{}", e.alert_message());
            return Err(e).context(format!("requesting token from {}", client.endpoint()));
        }
    };

    let details = json!({
        "url": cli.livekit_url,
        "room": options.room,
        "username": options.username,
        "token": token,
    });
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}
