//! Connection state and outbound traffic.
//!
//! One [`Connection`] exists per connection attempt; the supervisor builds
//! a fresh one for every retry. All outbound writes funnel through a
//! single lock so concurrently executing hooks can never interleave
//! partial lines.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::ConnectionError;

use super::transport::{LineReader, LineWriter, Transport};

/// Default maximum payload characters per outbound fragment.
pub const DEFAULT_FRAGMENT_LEN: usize = 400;

/// How long `disconnect` waits for the server to close our side.
const DRAIN_LIMIT: Duration = Duration::from_secs(5);

/// An active connection to an IRC server.
pub struct Connection {
    host: String,
    port: u16,
    reader: Mutex<LineReader>,
    writer: Mutex<LineWriter>,
    /// Our current nick. Written only by the nick-change hook, read by
    /// many concurrent handlers, so it sits behind a lock.
    nick: parking_lot::RwLock<String>,
    done: AtomicBool,
    timed_out: AtomicBool,
    /// Reference instant for the liveness clock.
    epoch: Instant,
    /// Milliseconds after `epoch` of the last successful read.
    last_read_ms: AtomicU64,
    /// Cancelled by the watchdog on timeout and by `disconnect`; unblocks
    /// a pending read.
    cancel: CancellationToken,
    watchdog: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Open a connection to `host:port`.
    pub async fn connect(
        host: &str,
        port: u16,
        secure: bool,
    ) -> Result<Arc<Self>, ConnectionError> {
        info!(host, port, secure, "connecting");
        let transport = Transport::connect(host, port, secure).await?;
        Ok(Self::from_transport(host, port, transport))
    }

    /// Wrap an already-connected transport.
    pub fn from_transport(host: &str, port: u16, transport: Transport) -> Arc<Self> {
        let (reader, writer) = transport.into_split();
        Arc::new(Self {
            host: host.to_string(),
            port,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            nick: parking_lot::RwLock::new(String::new()),
            done: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
            epoch: Instant::now(),
            last_read_ms: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            watchdog: parking_lot::Mutex::new(None),
        })
    }

    /// The host this connection was opened against.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port this connection was opened against.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Our current nick, as acknowledged by the server.
    pub fn current_nick(&self) -> String {
        self.nick.read().clone()
    }

    /// Record a server-acknowledged nick change.
    pub fn set_current_nick(&self, nick: &str) {
        *self.nick.write() = nick.to_string();
    }

    /// Whether the connection is shutting down deliberately.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Whether the watchdog declared the peer dead.
    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    fn mark_read(&self) {
        let elapsed = self.epoch.elapsed().as_millis() as u64;
        self.last_read_ms.store(elapsed, Ordering::SeqCst);
    }

    fn since_last_read(&self) -> Duration {
        let last = Duration::from_millis(self.last_read_ms.load(Ordering::SeqCst));
        self.epoch.elapsed().saturating_sub(last)
    }

    /// Read the next line from the server.
    ///
    /// Blocks the calling task only; a watchdog timeout or `disconnect`
    /// unblocks a pending read with an error.
    pub async fn read_line(&self) -> Result<String, ConnectionError> {
        let mut reader = self.reader.lock().await;
        tokio::select! {
            _ = self.cancel.cancelled() => {
                if self.timed_out() {
                    Err(ConnectionError::Timeout)
                } else {
                    Err(ConnectionError::Closed)
                }
            }
            line = reader.next() => match line {
                Some(Ok(line)) => {
                    self.mark_read();
                    debug!(line = %line, "recv");
                    Ok(line)
                }
                Some(Err(e)) => Err(e.into()),
                None => Err(ConnectionError::Closed),
            }
        }
    }

    /// Write one line verbatim, holding the shared write lock.
    pub async fn send_line(&self, line: &str) -> Result<(), ConnectionError> {
        let mut writer = self.writer.lock().await;
        debug!(line = %line, "send");
        writer.send(line.to_string()).await?;
        Ok(())
    }

    /// Split a long or multi-line payload into prefixed fragments and
    /// send each as its own command.
    ///
    /// The write lock is held per fragment, so fragments from concurrent
    /// callers may interleave but a single fragment is never torn.
    pub async fn send_cmd(&self, prefix: &str, content: &str) -> Result<(), ConnectionError> {
        self.send_cmd_limit(prefix, content, DEFAULT_FRAGMENT_LEN).await
    }

    /// Like [`send_cmd`](Self::send_cmd) with an explicit fragment limit.
    pub async fn send_cmd_limit(
        &self,
        prefix: &str,
        content: &str,
        max_len: usize,
    ) -> Result<(), ConnectionError> {
        for line in content.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            for chunk in char_chunks(line, max_len) {
                self.send_line(&format!("{prefix}{chunk}")).await?;
            }
        }
        Ok(())
    }

    /// Send a chat message to a channel or user.
    pub async fn send_message(&self, target: &str, content: &str) -> Result<(), ConnectionError> {
        self.send_cmd(&format!("PRIVMSG {target} :"), content).await
    }

    /// Send a notice to a channel or user. The protocol forbids clients
    /// from automatically replying to notices.
    pub async fn send_notice(&self, target: &str, content: &str) -> Result<(), ConnectionError> {
        self.send_cmd(&format!("NOTICE {target} :"), content).await
    }

    /// Send an emote (`/me`) to a channel or user.
    pub async fn send_emote(&self, target: &str, content: &str) -> Result<(), ConnectionError> {
        self.send_message(target, &basalt_proto::message::wrap_action(content))
            .await
    }

    /// Join one or more channels. Success or failure arrives later as a
    /// JOIN message or a failure numeric captured by the event loop.
    pub async fn join(&self, channels: &[String]) -> Result<(), ConnectionError> {
        self.send_line(&format!("JOIN {}", channels.join(","))).await
    }

    /// Part one or more channels.
    pub async fn part(&self, channels: &[String]) -> Result<(), ConnectionError> {
        self.send_line(&format!("PART {}", channels.join(","))).await
    }

    /// Request a nick change. The new nick only becomes current when the
    /// server's NICK echo is observed by the event loop.
    pub async fn set_nick(&self, nick: &str) -> Result<(), ConnectionError> {
        self.send_line(&format!("NICK {nick}")).await
    }

    /// Start the liveness watchdog. Called once, after registration.
    ///
    /// Every `timeout / 2` the watchdog checks how long the peer has been
    /// silent: past `timeout` it marks the connection timed out and
    /// cancels the pending read; past `timeout / 2` it sends an active
    /// probe. Any inbound traffic, including replies to probes, resets
    /// the clock.
    pub fn start_watchdog(self: &Arc<Self>, timeout: Duration) {
        let conn = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let half = timeout / 2;
            let mut index: u64 = 0;
            loop {
                let idle = conn.since_last_read();
                if idle > timeout {
                    error!(idle_secs = idle.as_secs(), "ping timeout");
                    conn.timed_out.store(true, Ordering::SeqCst);
                    conn.cancel.cancel();
                    break;
                } else if idle >= half {
                    index += 1;
                    if conn.send_line(&format!("PING {index}")).await.is_err() {
                        // Transport already dead; the read side will
                        // surface the error.
                        break;
                    }
                    tokio::time::sleep(half).await;
                } else {
                    tokio::time::sleep(half - idle).await;
                }
            }
        });
        *self.watchdog.lock() = Some(handle);
    }

    /// Disconnect from the server.
    ///
    /// Idempotent, and safe to call from a hook running concurrently with
    /// the read loop: the done flag is the signal the read loop checks
    /// before each read. Sends QUIT best-effort (skipped when the
    /// watchdog already declared the transport dead), drains remaining
    /// input briefly, then unblocks any pending read and stops the
    /// watchdog.
    pub async fn disconnect(&self, message: &str) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("disconnecting from server");

        let quitting = !self.timed_out();
        if quitting {
            let _ = self.send_line(&format!("QUIT :{message}")).await;
        }

        // Unblock a pending read before draining, or the reader lock
        // would be held against us until the drain limit expired.
        self.cancel.cancel();

        if quitting {
            let _ = tokio::time::timeout(DRAIN_LIMIT, async {
                loop {
                    let mut reader = self.reader.lock().await;
                    match reader.next().await {
                        Some(Ok(_)) => continue,
                        _ => break,
                    }
                }
            })
            .await;
        }

        if let Some(handle) = self.watchdog.lock().take() {
            handle.abort();
        }
    }

    /// Tear down without the QUIT exchange. Used when registration fails.
    pub(crate) fn force_close(&self) {
        self.done.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }
}

/// Split `s` into chunks of at most `max_chars` characters, never cutting
/// a UTF-8 sequence.
fn char_chunks(s: &str, max_chars: usize) -> Vec<&str> {
    if max_chars == 0 {
        return vec![s];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in s.char_indices() {
        if count == max_chars {
            chunks.push(&s[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < s.len() {
        chunks.push(&s[start..]);
    }
    chunks
}
