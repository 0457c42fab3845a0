use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cirrus_core::model::MediaReference;
use cirrus_core::{
    EngineEvent, KeepAlive, LocationResolver, PlaybackEngine,
    SessionController, SessionError, VolumeStore,
};
use log::{error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use super::status;
use crate::infra::config::AppConfig;
use crate::infra::graph::GraphResolver;
use crate::infra::settings::{JsonVolumeStore, MemoryVolumeStore};
use crate::keymap::{self, Command, KeymapError};

const EVENT_BUFFER: usize = 64;

/// Whether the host loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The single owner of the session. User commands, engine events and
/// keep-alive expiry are all applied here, one at a time.
#[derive(Debug)]
pub struct Host {
    session: SessionController,
    media: MediaReference,
    start_at: Duration,
}

impl Host {
    pub fn new(
        session: SessionController,
        media: MediaReference,
        start_at: Duration,
    ) -> Self {
        Self {
            session,
            media,
            start_at,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.session.start(self.media.clone(), self.start_at).await
    }

    /// Apply one user command to the session.
    pub async fn dispatch(
        &mut self,
        command: Command,
    ) -> Result<Flow, SessionError> {
        let session = &mut self.session;
        match command {
            Command::TogglePause => session.toggle_pause().await?,
            Command::SeekRelative(delta_ms) => {
                session.seek_relative(delta_ms).await?
            }
            Command::SeekTo(position) => session.seek_to(position).await?,
            Command::VolumeUp => {
                let level = session.volume().increase();
                session.set_volume(level).await?
            }
            Command::VolumeDown => {
                let level = session.volume().decrease();
                session.set_volume(level).await?
            }
            Command::SetVolume(percent) => {
                session.set_volume_percent(percent).await?
            }
            Command::Reload if session.phase().is_active() => {
                session.reload().await?
            }
            // Nothing loaded (the first start failed): try again from the
            // requested position
            Command::Reload => {
                session.start(self.media.clone(), self.start_at).await?
            }
            Command::ScrubStart => {
                if !session.begin_scrub() {
                    return Err(SessionError::NotStarted);
                }
            }
            Command::ScrubTo(position) => session.scrub_to(position),
            Command::ScrubCommit => session.commit_scrub().await?,
            Command::ScrubCancel => session.end_scrub(),
            Command::Status => {}
            Command::Help => println!("{}", keymap::HELP),
            Command::Stop => {
                session.stop().await?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Apply one engine notification. Exits once the engine is gone.
    pub async fn on_engine_event(&mut self, event: EngineEvent) -> Flow {
        if let Err(err) = self.session.handle_event(event).await {
            report(&err);
        }
        if event == EngineEvent::Exited {
            Flow::Exit
        } else {
            Flow::Continue
        }
    }

    pub fn on_keepalive(&mut self) {
        self.session.on_timer_expired();
    }

    /// Run until the user stops, input ends or the engine exits.
    pub async fn run<R>(
        &mut self,
        input: R,
        mut events: mpsc::Receiver<EngineEvent>,
    ) where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            let deadline = self.session.keepalive_deadline();
            let flow = tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.on_input(&line).await,
                    Ok(None) => {
                        info!("[Player] Input closed, stopping");
                        self.stop_quietly().await;
                        Flow::Exit
                    }
                    Err(err) => {
                        warn!("[Player] Failed to read input: {}", err);
                        self.stop_quietly().await;
                        Flow::Exit
                    }
                },
                Some(event) = events.recv() => self.on_engine_event(event).await,
                _ = KeepAlive::wait(deadline) => {
                    self.on_keepalive();
                    Flow::Continue
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("[Player] Interrupted");
                    self.stop_quietly().await;
                    Flow::Exit
                }
            };
            if flow == Flow::Exit {
                break;
            }
        }
    }

    pub async fn shutdown(self) {
        self.session.shutdown().await;
    }

    async fn on_input(&mut self, line: &str) -> Flow {
        let command = match keymap::parse(line) {
            Ok(command) => command,
            Err(KeymapError::Empty) => return Flow::Continue,
            Err(err) => {
                eprintln!("{}", err);
                return Flow::Continue;
            }
        };

        let flow = match self.dispatch(command).await {
            Ok(flow) => flow,
            Err(err) => {
                report(&err);
                // A failed stop still ends the program
                if command == Command::Stop {
                    Flow::Exit
                } else {
                    Flow::Continue
                }
            }
        };
        if flow == Flow::Continue {
            println!("{}", status::render(&self.session.snapshot()));
        }
        flow
    }

    async fn stop_quietly(&mut self) {
        if let Err(err) = self.session.stop().await {
            report(&err);
        }
    }
}

fn report(err: &SessionError) {
    match err {
        SessionError::NotStarted => info!("[Player] {}", err),
        _ => error!("[Player] {}", err),
    }
    eprintln!("error: {}", err);
    if let Some(hint) = retry_hint(err) {
        eprintln!("{}", hint);
    }
}

/// Only transient failures are worth a manual reload.
fn retry_hint(err: &SessionError) -> Option<&'static str> {
    err.is_retryable().then_some("press r to retry")
}

/// Wire the real adapters together and play `media` until the user quits.
pub async fn run(
    config: AppConfig,
    media: MediaReference,
    start_at: Duration,
) -> anyhow::Result<()> {
    let token = config.access_token.clone().context(
        "no Graph access token; pass --token or set CIRRUS_GRAPH_TOKEN",
    )?;
    let resolver: Arc<dyn LocationResolver> =
        Arc::new(GraphResolver::new(&config.graph_url, token)?);
    let volume_store = volume_store(&config);

    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let engine = spawn_engine(&config, event_tx).await?;

    let session = SessionController::new(
        resolver,
        engine,
        volume_store,
        config.reload_interval,
    );
    let mut host = Host::new(session, media, start_at);

    match host.start().await {
        Ok(()) => println!("{}", status::render(&host.session().snapshot())),
        Err(err) => {
            report(&err);
            if retry_hint(&err).is_none() {
                eprintln!("press q to quit");
            }
        }
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    host.run(stdin, event_rx).await;
    host.shutdown().await;
    Ok(())
}

fn volume_store(config: &AppConfig) -> Arc<dyn VolumeStore> {
    match config.resolved_settings_path() {
        Some(path) => {
            info!("[Player] Settings at {}", path.display());
            Arc::new(JsonVolumeStore::new(path))
        }
        None => {
            warn!("[Player] No config directory, volume will not be saved");
            Arc::new(MemoryVolumeStore::default())
        }
    }
}

#[cfg(unix)]
async fn spawn_engine(
    config: &AppConfig,
    events: mpsc::Sender<EngineEvent>,
) -> anyhow::Result<Box<dyn PlaybackEngine>> {
    let engine =
        crate::infra::mpv::MpvEngine::spawn(&config.mpv_binary, events)
            .await
            .with_context(|| {
                format!("failed to start {}", config.mpv_binary.display())
            })?;
    Ok(Box::new(engine))
}

#[cfg(not(unix))]
async fn spawn_engine(
    _config: &AppConfig,
    _events: mpsc::Sender<EngineEvent>,
) -> anyhow::Result<Box<dyn PlaybackEngine>> {
    anyhow::bail!("the mpv engine needs Unix domain sockets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::{EngineError, ResolveError};

    #[test]
    fn retry_is_offered_for_transient_failures_only() {
        assert_eq!(
            retry_hint(&ResolveError::Transport("timed out".into()).into()),
            Some("press r to retry")
        );
        assert_eq!(
            retry_hint(&EngineError::Ipc("broken frame".into()).into()),
            Some("press r to retry")
        );
        assert_eq!(retry_hint(&ResolveError::Unauthorized.into()), None);
        assert_eq!(retry_hint(&EngineError::Closed.into()), None);
        assert_eq!(retry_hint(&SessionError::NotStarted), None);
    }
}
