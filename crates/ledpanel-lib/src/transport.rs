//! WebSocket transport — a worker thread owning the device socket.
//!
//! The owner talks to the worker over two channels: outbound JSON frames in,
//! [`TransportEvent`]s out. The worker polls the socket with a short read
//! timeout so it can interleave sends, and reconnects after every close
//! using [`ReconnectState`].

use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tungstenite::{Message, WebSocket};

use crate::protocol::{Command, WireFormat, endpoint_url};
use crate::reconnect::{DEFAULT_RECONNECT_DELAY, ReconnectState, Schedule};

/// How long a socket read may block before the worker checks for outbound
/// frames and shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ── Error type ──

/// Transport errors.
///
/// String payloads follow the convention **"context: details"**.
#[derive(Debug)]
pub enum TransportError {
    /// No connection is open; the command was not sent.
    NotConnected,
    ConnectFailed(String),
    Timeout(String),
    /// The worker has stopped.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => write!(f, "WebSocket is not connected"),
            TransportError::ConnectFailed(e) => write!(f, "Failed to connect: {e}"),
            TransportError::Timeout(e) => write!(f, "Timed out: {e}"),
            TransportError::Closed => write!(f, "Transport closed"),
        }
    }
}

impl std::error::Error for TransportError {}

// ── Link trait ──

/// Something commands can be sent through.
///
/// A send never queues: when no connection is open it fails with
/// [`TransportError::NotConnected`].
pub trait Link {
    fn send(&self, command: &Command) -> Result<(), TransportError>;
    fn is_connected(&self) -> bool;
}

/// Events delivered from the worker to the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    /// The connection closed or a connect attempt failed.
    Closed { reason: String },
    /// An inbound text frame.
    Message(String),
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Device host, optionally with a port.
    pub host: String,
    pub format: WireFormat,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl TransportOptions {
    pub fn new(host: impl Into<String>) -> Self {
        TransportOptions {
            host: host.into(),
            format: WireFormat::default(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: Duration::from_secs(3),
        }
    }

    pub fn url(&self) -> String {
        endpoint_url(&self.host)
    }
}

// ── Transport ──

/// Handle to the transport worker. Dropping it shuts the worker down.
pub struct Transport {
    url: String,
    format: WireFormat,
    outbound: Option<Sender<String>>,
    events: Receiver<TransportEvent>,
    connected: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Transport {
    /// Spawn the worker. The first connect attempt starts immediately.
    pub fn connect(options: TransportOptions) -> Self {
        let (out_tx, out_rx) = mpsc::channel::<String>();
        let (ev_tx, ev_rx) = mpsc::channel::<TransportEvent>();
        let connected = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let url = options.url();
        let format = options.format;
        let worker = Worker {
            options,
            outbound: out_rx,
            events: ev_tx,
            connected: Arc::clone(&connected),
            running: Arc::clone(&running),
        };
        let handle = std::thread::Builder::new()
            .name("ledpanel-ws".into())
            .spawn(move || worker.run());
        let worker = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                log::error!("failed to spawn transport worker: {e}");
                running.store(false, Ordering::SeqCst);
                None
            }
        };

        Transport {
            url,
            format,
            outbound: Some(out_tx),
            events: ev_rx,
            connected,
            running,
            worker,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next pending event, without blocking.
    pub fn try_event(&self) -> Option<TransportEvent> {
        self.events.try_recv().ok()
    }

    /// Next event, waiting up to `timeout`.
    pub fn next_event(&self, timeout: Duration) -> Option<TransportEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the connection is open.
    ///
    /// Events other than `Opened` received while waiting are discarded.
    pub fn wait_open(&self, timeout: Duration) -> Result<(), TransportError> {
        let deadline = Instant::now() + timeout;
        let mut last_reason = None;
        loop {
            if self.is_connected() {
                return Ok(());
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                let detail = match last_reason {
                    Some(reason) => format!("{}: {reason}", self.url),
                    None => self.url.clone(),
                };
                return Err(TransportError::Timeout(detail));
            }
            match self.events.recv_timeout(left) {
                Ok(TransportEvent::Opened) => return Ok(()),
                Ok(TransportEvent::Closed { reason }) => last_reason = Some(reason),
                Ok(TransportEvent::Message(_)) => {}
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Closed),
            }
        }
    }

    /// Stop the worker. Commands already accepted by [`Link::send`] are
    /// written before the socket is closed.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.outbound.take();
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            log::warn!("transport worker panicked");
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Link for Transport {
    fn send(&self, command: &Command) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound
            .send(command.encode(self.format))
            .map_err(|_| TransportError::Closed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// ── Worker ──

/// Why a session ended.
enum SessionEnd {
    /// Peer closed or the socket failed.
    Lost(String),
    /// Owner asked us to stop.
    Shutdown,
}

struct Worker {
    options: TransportOptions,
    outbound: Receiver<String>,
    events: Sender<TransportEvent>,
    connected: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl Worker {
    fn run(self) {
        let url = self.options.url();
        let mut reconnect = ReconnectState::new(self.options.reconnect_delay);
        let mut first = true;

        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if !(first || reconnect.poll(now)) {
                self.drop_stale_outbound();
                let wait = reconnect
                    .remaining(now)
                    .unwrap_or(POLL_INTERVAL)
                    .min(POLL_INTERVAL);
                std::thread::sleep(wait);
                continue;
            }
            first = false;

            log::debug!("connecting to {url}");
            let reason = match self.open(&url) {
                Ok(mut socket) => {
                    reconnect.record_success();
                    self.connected.store(true, Ordering::SeqCst);
                    log::info!("connected to {url}");
                    let _ = self.events.send(TransportEvent::Opened);
                    let end = self.session(&mut socket);
                    self.connected.store(false, Ordering::SeqCst);
                    match end {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Lost(reason) => reason,
                    }
                }
                Err(e) => {
                    reconnect.record_failure();
                    e.to_string()
                }
            };

            let _ = self.events.send(TransportEvent::Closed {
                reason: reason.clone(),
            });
            if let Schedule::Scheduled(_) = reconnect.on_close(Instant::now()) {
                log::warn!(
                    "connection to {url} closed ({reason}), reconnecting in {:?} (failures: {})",
                    reconnect.delay(),
                    reconnect.consecutive_failures()
                );
            }
        }
        log::debug!("transport worker stopped");
    }

    fn open(&self, url: &str) -> Result<WebSocket<TcpStream>, TransportError> {
        let addr = resolve(&self.options.host)
            .map_err(|e| TransportError::ConnectFailed(format!("{}: {e}", self.options.host)))?;
        let stream = TcpStream::connect_timeout(&addr, self.options.connect_timeout)
            .map_err(|e| TransportError::ConnectFailed(format!("{addr}: {e}")))?;
        stream
            .set_read_timeout(Some(self.options.connect_timeout))
            .map_err(|e| TransportError::ConnectFailed(format!("set_read_timeout: {e}")))?;
        let _ = stream.set_nodelay(true);

        let (socket, _response) = tungstenite::client(url, stream)
            .map_err(|e| TransportError::ConnectFailed(format!("handshake: {e}")))?;
        socket
            .get_ref()
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(|e| TransportError::ConnectFailed(format!("set_read_timeout: {e}")))?;
        Ok(socket)
    }

    fn session(&self, socket: &mut WebSocket<TcpStream>) -> SessionEnd {
        loop {
            // Read the flag before draining: anything sent before a stop is
            // already queued and goes out in this pass.
            let mut stopping = !self.running.load(Ordering::SeqCst);
            loop {
                match self.outbound.try_recv() {
                    Ok(text) => {
                        if let Err(e) = socket.send(Message::text(text)) {
                            return SessionEnd::Lost(format!("send: {e}"));
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.running.store(false, Ordering::SeqCst);
                        stopping = true;
                        break;
                    }
                }
            }

            if stopping {
                let _ = socket.close(None);
                let _ = socket.flush();
                return SessionEnd::Shutdown;
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    let _ = self
                        .events
                        .send(TransportEvent::Message(text.as_str().to_owned()));
                }
                Ok(Message::Close(frame)) => {
                    log::debug!("close frame received: {frame:?}");
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(e))
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return SessionEnd::Lost("closed by peer".into());
                }
                Err(e) => return SessionEnd::Lost(e.to_string()),
            }
        }
    }

    /// Frames that raced a close. They are dropped, not replayed later.
    fn drop_stale_outbound(&self) {
        while let Ok(text) = self.outbound.try_recv() {
            log::warn!("dropping message sent while disconnected: {text}");
        }
    }
}

/// Resolve `host` or `host:port` (port 80 when absent).
fn resolve(host: &str) -> io::Result<SocketAddr> {
    let host = host.trim().trim_end_matches('/');
    let mut addrs = if host.contains(':') {
        host.to_socket_addrs()?
    } else {
        (host, 80).to_socket_addrs()?
    };
    addrs
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address"))
}

// ── Mock ──

pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// In-memory link for tests and dry runs. Records every command it
    /// accepts; rejects sends with `NotConnected` while disconnected.
    pub struct RecordingLink {
        pub sent: RefCell<Vec<Command>>,
        pub connected: Cell<bool>,
    }

    impl Default for RecordingLink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RecordingLink {
        pub fn new() -> Self {
            RecordingLink {
                sent: RefCell::new(Vec::new()),
                connected: Cell::new(true),
            }
        }

        pub fn disconnected() -> Self {
            let link = Self::new();
            link.connected.set(false);
            link
        }

        pub fn commands(&self) -> Vec<Command> {
            self.sent.borrow().clone()
        }

        /// Take everything recorded so far.
        pub fn take(&self) -> Vec<Command> {
            std::mem::take(&mut *self.sent.borrow_mut())
        }
    }

    impl Link for RecordingLink {
        fn send(&self, command: &Command) -> Result<(), TransportError> {
            if !self.connected.get() {
                return Err(TransportError::NotConnected);
            }
            self.sent.borrow_mut().push(command.clone());
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.get()
        }
    }
}
