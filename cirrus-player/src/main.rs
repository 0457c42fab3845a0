use anyhow::Context;
use cirrus_core::model::MediaReference;
use cirrus_player::app::{
    self,
    cli::{Cli, Command},
};
use cirrus_player::infra::AppConfig;

use clap::Parser;
use env_logger::{Builder, Target};
use log::LevelFilter;

fn init_logger() {
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("cirrus_core", LevelFilter::Info)
        .filter_module("cirrus_player", LevelFilter::Info)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Play(args) => {
            let media = MediaReference::parse(&args.drive_id, &args.item_id)
                .context("invalid drive item")?;
            let config = AppConfig::from_environment().with_play_args(&args);
            log::debug!("[Player] {:?}", config);
            app::run(config, media, args.start.unwrap_or_default()).await
        }
    }
}
