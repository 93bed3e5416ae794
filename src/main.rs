use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use backscroll::app::{App, AppEvent};
use backscroll::config::Config;
use backscroll::ui;

/// Get the config directory path (~/.config/backscroll/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("backscroll"))
}

#[derive(Parser, Debug)]
#[command(
    name = "backscroll",
    about = "Terminal conversation viewer with lazy-loaded history"
)]
struct Args {
    /// Base URL of the paged message endpoint (overrides config)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Items per page (overrides config)
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    /// Conversation to open first (added to the cycle if unknown)
    #[arg(long, value_name = "ID")]
    conversation: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let mut config = Config::load(&config_dir.join("config.toml"))
        .context("Failed to load configuration")?;

    // CLI overrides
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(conversation) = args.conversation {
        match config.conversations.iter().position(|c| *c == conversation) {
            Some(index) => config.conversations.swap(0, index),
            None => config.conversations.insert(0, conversation),
        }
    }
    config.validate().context("Invalid configuration")?;

    let mut app = App::new(config).context("Failed to create application")?;

    // Channel for fetch-task completions
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
