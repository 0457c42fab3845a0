pub mod config;
pub mod graph;
pub mod mpv;
pub mod settings;

pub use config::AppConfig;
