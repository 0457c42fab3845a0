use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cirrus_core::model::VolumeLevel;
use cirrus_core::{EngineError, EngineEvent, PlaybackEngine};
use log::{debug, info, warn};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::UnixStream;
use tokio::net::unix::OwnedWriteHalf;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use url::Url;

use super::protocol::{
    Incoming, LoadGate, MpvCommand, OBSERVED_PROPERTIES, decode_line,
};

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);
const QUIT_GRACE: Duration = Duration::from_secs(2);

static NEXT_SOCKET: AtomicU32 = AtomicU32::new(0);

/// Handle to a running mpv process and its IPC connection.
///
/// mpv is started idle and kept for the lifetime of the handle; each
/// [`play`](PlaybackEngine::play) replaces the loaded file. Events are
/// forwarded to the channel given at spawn time.
#[derive(Debug)]
pub struct MpvEngine {
    process: Child,
    socket_path: PathBuf,
    link: Arc<Mutex<Link<OwnedWriteHalf>>>,
    reader: JoinHandle<()>,
    released: bool,
}

/// Write side of the IPC connection, shared with the reader task so a
/// seek held during a load goes out as soon as mpv reports the file.
#[derive(Debug)]
struct Link<W> {
    writer: W,
    request_id: u64,
    gate: LoadGate,
}

impl<W: AsyncWrite + Unpin> Link<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            request_id: 1,
            gate: LoadGate::default(),
        }
    }

    async fn send(&mut self, command: MpvCommand) -> Result<(), EngineError> {
        let line = command.encode(self.request_id);
        self.request_id += 1;
        debug!("[Mpv] -> {}", line.trim_end());

        write_line(&mut self.writer, &line)
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::ConnectionReset => EngineError::Closed,
                _ => EngineError::Ipc(err.to_string()),
            })
    }

    async fn load(
        &mut self,
        location: &Url,
        start: Duration,
    ) -> Result<(), EngineError> {
        self.send(MpvCommand::SetStart(start)).await?;
        self.send(MpvCommand::SetPause(false)).await?;
        self.gate.begin_load();
        let sent = self
            .send(MpvCommand::LoadFile {
                url: location.to_string(),
            })
            .await;
        if sent.is_err() {
            self.gate.abandon();
        }
        sent
    }

    async fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        match self.gate.seek(position) {
            Some(command) => self.send(command).await,
            None => {
                debug!(
                    "[Mpv] Holding seek to {:.1}s until the file loads",
                    position.as_secs_f64()
                );
                Ok(())
            }
        }
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.gate.abandon();
        self.send(MpvCommand::Stop).await
    }

    async fn on_loaded(&mut self) {
        if let Some(command) = self.gate.loaded()
            && let Err(err) = self.send(command).await
        {
            warn!("[Mpv] Held seek not delivered: {}", err);
        }
    }
}

impl MpvEngine {
    pub async fn spawn(
        binary: &Path,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Self, EngineError> {
        let socket_path = std::env::temp_dir().join(format!(
            "cirrus-mpv-{}-{}.sock",
            std::process::id(),
            NEXT_SOCKET.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new(binary);
        cmd.arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg("--idle=yes")
            .arg("--force-window=yes")
            .arg("--keep-open=no")
            .arg("--no-terminal")
            .arg("--osd-level=1")
            .arg("--hwdec=auto-safe")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        info!("[Mpv] Spawning {}", binary.display());
        let mut process = cmd.spawn().map_err(EngineError::Spawn)?;

        let stream = match connect(&socket_path, &mut process).await {
            Ok(stream) => stream,
            Err(err) => {
                let _ = process.start_kill();
                let _ = std::fs::remove_file(&socket_path);
                return Err(err);
            }
        };
        let (read_half, writer) = stream.into_split();
        let link = Arc::new(Mutex::new(Link::new(writer)));
        let reader =
            tokio::spawn(forward_events(read_half, link.clone(), events));

        let mut engine = Self {
            process,
            socket_path,
            link,
            reader,
            released: false,
        };
        for (id, name) in OBSERVED_PROPERTIES {
            engine
                .send(MpvCommand::ObserveProperty { id, name })
                .await?;
        }
        Ok(engine)
    }

    /// The IPC connection, unless the engine was released.
    fn open_link(
        &self,
    ) -> Result<&Arc<Mutex<Link<OwnedWriteHalf>>>, EngineError> {
        if self.released {
            Err(EngineError::Closed)
        } else {
            Ok(&self.link)
        }
    }

    async fn send(&mut self, command: MpvCommand) -> Result<(), EngineError> {
        self.open_link()?.lock().await.send(command).await
    }

    fn cleanup(&mut self) {
        self.reader.abort();
        let _ = self.process.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn write_line<W: AsyncWrite + Unpin>(
    writer: &mut W,
    line: &str,
) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Wait for mpv to create its socket.
async fn connect(
    socket_path: &Path,
    process: &mut Child,
) -> Result<UnixStream, EngineError> {
    let mut last_error = None;
    for _ in 0..CONNECT_ATTEMPTS {
        if let Ok(Some(status)) = process.try_wait() {
            warn!("[Mpv] Exited during startup with {}", status);
            return Err(EngineError::Closed);
        }
        match UnixStream::connect(socket_path).await {
            Ok(stream) => {
                debug!("[Mpv] Connected to {}", socket_path.display());
                return Ok(stream);
            }
            Err(err) => last_error = Some(err),
        }
        tokio::time::sleep(CONNECT_BACKOFF).await;
    }
    Err(EngineError::Ipc(format!(
        "no IPC socket at {}: {}",
        socket_path.display(),
        last_error.map_or_else(|| "timed out".to_string(), |e| e.to_string())
    )))
}

/// Read IPC lines until the socket closes, forwarding engine events.
async fn forward_events<R, W>(
    read_half: R,
    link: Arc<Mutex<Link<W>>>,
    events: mpsc::Sender<EngineEvent>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(read_half).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!("[Mpv] IPC read failed: {}", err);
                break;
            }
        };
        let event = match decode_line(&line) {
            Ok(Incoming::Event(event)) => event,
            Ok(Incoming::Loaded) => {
                link.lock().await.on_loaded().await;
                EngineEvent::Playing
            }
            Ok(Incoming::LoadFailed(reason)) => {
                warn!(
                    "[Mpv] Failed to load media: {}",
                    reason.as_deref().unwrap_or("unknown error")
                );
                link.lock().await.gate.abandon();
                continue;
            }
            Ok(Incoming::Reply {
                request_id,
                error: Some(error),
            }) => {
                warn!("[Mpv] Request {:?} failed: {}", request_id, error);
                continue;
            }
            Ok(_) => continue,
            Err(err) => {
                debug!("[Mpv] Skipping unparsable line: {}", err);
                continue;
            }
        };
        if events.send(event).await.is_err() {
            return;
        }
    }
    let _ = events.send(EngineEvent::Exited).await;
}

#[async_trait]
impl PlaybackEngine for MpvEngine {
    async fn play(
        &mut self,
        location: &Url,
        start: Duration,
    ) -> Result<(), EngineError> {
        info!("[Mpv] Loading media at {:.1}s", start.as_secs_f64());
        self.open_link()?.lock().await.load(location, start).await
    }

    async fn set_paused(&mut self, paused: bool) -> Result<(), EngineError> {
        self.send(MpvCommand::SetPause(paused)).await
    }

    async fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        self.open_link()?.lock().await.seek(position).await
    }

    async fn set_volume(
        &mut self,
        level: VolumeLevel,
    ) -> Result<(), EngineError> {
        self.send(MpvCommand::SetVolume(level.value())).await
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.open_link()?.lock().await.stop().await
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.send(MpvCommand::Quit).await {
            debug!("[Mpv] Quit not delivered: {}", err);
        }
        self.released = true;

        match tokio::time::timeout(QUIT_GRACE, self.process.wait()).await {
            Ok(Ok(status)) => info!("[Mpv] Exited with {}", status),
            Ok(Err(err)) => warn!("[Mpv] Failed to wait for exit: {}", err),
            Err(_) => warn!("[Mpv] Did not quit in time, killing"),
        }
        self.cleanup();
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        self.cleanup();
    }
}
