use std::path::PathBuf;
use std::time::Duration;

use cirrus_core::DEFAULT_RELOAD_INTERVAL;

use crate::app::cli::PlayArgs;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_MPV_BINARY: &str = "mpv";

/// Runtime configuration, assembled from `CIRRUS_*` environment variables
/// and then overridden by command-line flags.
#[derive(Clone)]
pub struct AppConfig {
    pub graph_url: String,
    pub access_token: Option<String>,
    pub mpv_binary: PathBuf,
    pub reload_interval: Duration,
    pub settings_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("graph_url", &self.graph_url)
            .field("has_token", &self.access_token.is_some())
            .field("mpv_binary", &self.mpv_binary)
            .field("reload_interval", &self.reload_interval)
            .field("settings_path", &self.settings_path)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            graph_url: DEFAULT_GRAPH_URL.to_string(),
            access_token: None,
            mpv_binary: PathBuf::from(DEFAULT_MPV_BINARY),
            reload_interval: DEFAULT_RELOAD_INTERVAL,
            settings_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_environment() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = var("CIRRUS_GRAPH_URL") {
            config.graph_url = url;
        }
        config.access_token = var("CIRRUS_GRAPH_TOKEN");
        if let Some(mpv) = var("CIRRUS_MPV") {
            config.mpv_binary = PathBuf::from(mpv);
        }
        if let Some(raw) = var("CIRRUS_RELOAD_INTERVAL") {
            match humantime::parse_duration(raw.trim()) {
                Ok(interval) if !interval.is_zero() => {
                    config.reload_interval = interval
                }
                _ => log::warn!(
                    "[Config] Ignoring invalid CIRRUS_RELOAD_INTERVAL '{}', using {}",
                    raw,
                    humantime::format_duration(DEFAULT_RELOAD_INTERVAL)
                ),
            }
        }
        config.settings_path = var("CIRRUS_SETTINGS").map(PathBuf::from);

        config
    }

    /// Apply flags given on the command line; they win over the environment.
    pub fn with_play_args(mut self, args: &PlayArgs) -> Self {
        if let Some(url) = &args.graph_url {
            self.graph_url = url.clone();
        }
        if let Some(token) = &args.token {
            self.access_token = Some(token.clone());
        }
        if let Some(mpv) = &args.mpv {
            self.mpv_binary = mpv.clone();
        }
        if let Some(interval) = args.reload_interval {
            self.reload_interval = interval;
        }
        if let Some(path) = &args.settings {
            self.settings_path = Some(path.clone());
        }
        self
    }

    /// Explicit settings path, or `<config dir>/cirrus/settings.json`.
    pub fn resolved_settings_path(&self) -> Option<PathBuf> {
        self.settings_path
            .clone()
            .or_else(crate::infra::settings::default_settings_path)
    }
}
