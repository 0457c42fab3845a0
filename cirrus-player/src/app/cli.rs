use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cirrus", version)]
#[command(about = "Play OneDrive videos in mpv without the download link expiring")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a drive item and play it
    Play(PlayArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlayArgs {
    /// Drive that holds the item (Graph `driveId`)
    pub drive_id: String,

    /// Item to play (Graph `itemId`)
    pub item_id: String,

    /// Start position, e.g. 90s or 1h2m
    #[arg(long, value_parser = humantime::parse_duration)]
    pub start: Option<Duration>,

    /// Graph access token (overrides CIRRUS_GRAPH_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Graph API base URL (overrides CIRRUS_GRAPH_URL)
    #[arg(long)]
    pub graph_url: Option<String>,

    /// mpv binary (overrides CIRRUS_MPV)
    #[arg(long)]
    pub mpv: Option<PathBuf>,

    /// How long a download URL is trusted before it is refreshed on the
    /// next seek
    #[arg(long, value_parser = parse_interval)]
    pub reload_interval: Option<Duration>,

    /// Settings file holding the persisted volume
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

fn parse_interval(raw: &str) -> Result<Duration, String> {
    let interval =
        humantime::parse_duration(raw).map_err(|err| err.to_string())?;
    if interval.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(interval)
}
