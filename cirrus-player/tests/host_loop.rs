use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cirrus_core::model::{DriveId, ItemId, MediaReference, VolumeLevel};
use cirrus_core::{
    EngineError, EngineEvent, LocationResolver, PlaybackEngine, ResolveError,
    SessionController, SessionError, SessionPhase,
};
use cirrus_player::app::{Flow, Host};
use cirrus_player::infra::settings::MemoryVolumeStore;
use cirrus_player::keymap::Command;
use tokio::sync::mpsc;
use url::Url;

type Log = Arc<Mutex<Vec<String>>>;

struct CountingResolver {
    log: Log,
    fail: bool,
}

#[async_trait]
impl LocationResolver for CountingResolver {
    async fn resolve_download_location(
        &self,
        _drive_id: &DriveId,
        item_id: &ItemId,
    ) -> Result<Url, ResolveError> {
        self.log.lock().unwrap().push(format!("resolve {item_id}"));
        if self.fail {
            return Err(ResolveError::Unauthorized);
        }
        Ok(Url::parse("https://cdn.example.com/v.mp4").unwrap())
    }
}

struct LoggingEngine {
    log: Log,
}

impl LoggingEngine {
    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl PlaybackEngine for LoggingEngine {
    async fn play(
        &mut self,
        _location: &Url,
        start: Duration,
    ) -> Result<(), EngineError> {
        self.push(format!("play {}", start.as_secs()));
        Ok(())
    }

    async fn set_paused(&mut self, paused: bool) -> Result<(), EngineError> {
        self.push(format!("pause {paused}"));
        Ok(())
    }

    async fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        self.push(format!("seek {}", position.as_secs()));
        Ok(())
    }

    async fn set_volume(
        &mut self,
        level: VolumeLevel,
    ) -> Result<(), EngineError> {
        self.push(format!("volume {}", level.value()));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.push("stop".into());
        Ok(())
    }

    async fn release(&mut self) {
        self.push("release".into());
    }
}

fn host(log: &Log, fail_resolve: bool) -> Host {
    let session = SessionController::new(
        Arc::new(CountingResolver {
            log: log.clone(),
            fail: fail_resolve,
        }),
        Box::new(LoggingEngine { log: log.clone() }),
        Arc::new(MemoryVolumeStore::with_level(VolumeLevel::new(50))),
        Duration::from_secs(120),
    );
    Host::new(
        session,
        MediaReference::parse("drive", "item").unwrap(),
        Duration::from_secs(10),
    )
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[tokio::test(start_paused = true)]
async fn scripted_input_drives_the_session() {
    let log: Log = Arc::default();
    let mut host = host(&log, false);
    host.start().await.unwrap();
    let (_tx, rx) = mpsc::channel(8);

    let input: &[u8] = b" \nseek 30\nvolume 40\n+\nl\nq\n";
    host.run(tokio::io::BufReader::new(input), rx).await;

    assert_eq!(
        entries(&log),
        vec![
            "resolve item",
            "play 10",
            "pause true",
            "seek 30",
            "volume 40",
            "volume 45",
            "seek 40",
            "stop",
        ]
    );
    assert_eq!(host.session().phase(), SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn unknown_input_and_errors_do_not_end_the_loop() {
    let log: Log = Arc::default();
    let mut host = host(&log, false);
    host.start().await.unwrap();
    let (_tx, rx) = mpsc::channel(8);

    let input: &[u8] = b"rewind\nvolume 300\n\nseek 5\n";
    host.run(tokio::io::BufReader::new(input), rx).await;

    // end of input stops the session
    assert_eq!(
        entries(&log),
        vec!["resolve item", "play 10", "seek 5", "stop"]
    );
}

#[tokio::test(start_paused = true)]
async fn keepalive_expiry_makes_next_seek_resolve() {
    let log: Log = Arc::default();
    let mut host = host(&log, false);
    host.start().await.unwrap();

    host.on_keepalive();
    assert!(host.session().is_stale());
    host.dispatch(Command::SeekTo(Duration::from_secs(60)))
        .await
        .unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "resolve item",
            "play 10",
            "resolve item",
            "play 10",
            "seek 60",
        ]
    );
    assert!(!host.session().is_stale());
}

#[tokio::test(start_paused = true)]
async fn timer_fires_inside_the_loop() {
    let log: Log = Arc::default();
    let mut host = host(&log, false);
    host.start().await.unwrap();
    let (tx, rx) = mpsc::channel(8);

    let (mut writer, reader) = tokio::io::duplex(64);
    let driver = tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;
        tokio::time::sleep(Duration::from_secs(121)).await;
        writer.write_all(b"seek 20\n").await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(tx);
        writer.write_all(b"q\n").await.unwrap();
    });

    host.run(tokio::io::BufReader::new(reader), rx).await;
    driver.await.unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "resolve item",
            "play 10",
            "resolve item",
            "play 10",
            "seek 20",
            "stop",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn engine_exit_ends_the_loop() {
    let log: Log = Arc::default();
    let mut host = host(&log, false);
    host.start().await.unwrap();
    let (tx, rx) = mpsc::channel(8);
    tx.send(EngineEvent::Playing).await.unwrap();
    tx.send(EngineEvent::Exited).await.unwrap();

    let (_writer, reader) = tokio::io::duplex(64);
    host.run(tokio::io::BufReader::new(reader), rx).await;

    assert_eq!(
        entries(&log),
        vec!["resolve item", "play 10", "volume 50"]
    );
    assert_eq!(host.session().phase(), SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn reload_retries_a_failed_start() {
    let log: Log = Arc::default();
    let mut host = host(&log, true);

    assert!(host.start().await.is_err());
    let err = host.dispatch(Command::Reload).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Resolution(ResolveError::Unauthorized)
    ));
    assert_eq!(entries(&log), vec!["resolve item", "resolve item"]);
}

#[tokio::test(start_paused = true)]
async fn stop_command_exits_and_grab_needs_a_session() {
    let log: Log = Arc::default();
    let mut host = host(&log, false);

    assert!(matches!(
        host.dispatch(Command::ScrubStart).await,
        Err(SessionError::NotStarted)
    ));
    assert_eq!(host.dispatch(Command::Stop).await.unwrap(), Flow::Exit);

    host.start().await.unwrap();
    host.dispatch(Command::ScrubStart).await.unwrap();
    host.dispatch(Command::ScrubTo(Duration::from_secs(90)))
        .await
        .unwrap();
    host.dispatch(Command::ScrubCommit).await.unwrap();
    host.shutdown().await;

    assert_eq!(
        entries(&log),
        vec!["resolve item", "play 10", "seek 90", "stop", "release"]
    );
}
