use crate::client::codec::{self, CodecError};
use crate::client::tag::Tag;
use crate::client::transport::{ChannelIdentity, TransportError};
use crate::logging::ChatLogger;
use crate::session::queue::InboundQueue;
use crate::session::signal::RedrawSignal;
use chrono::{DateTime, Local, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::watch;

/// Allocation key of a session. Unlike its position in the registry it never
/// changes while the session is alive and is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(pub u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("message of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
    #[error("admin messages are not available on this channel")]
    AdminUnavailable,
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Encodes a message body under `tag` and hands it to the transport.
pub type Sender = Box<dyn Fn(Tag, &[u8]) -> Result<(), SendError> + Send + Sync>;

/// A way of posting to a channel together with the largest body it takes.
pub struct Outbound {
    pub send: Sender,
    pub max_len: usize,
}

impl fmt::Debug for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbound")
            .field("max_len", &self.max_len)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub tag: Tag,
    pub username: String,
    pub sent: DateTime<Utc>,
    pub received: DateTime<Utc>,
    pub text: String,
}

impl TranscriptEntry {
    /// Name shown in front of the entry.
    pub fn display_name(&self) -> &str {
        match self.tag {
            Tag::Default | Tag::Join | Tag::Exit => &self.username,
            Tag::Admin => "[ADMIN]",
        }
    }

    /// Sentence appended to the name for membership notices.
    pub fn notice(&self) -> Option<&'static str> {
        match self.tag {
            Tag::Join => Some("has joined the channel."),
            Tag::Exit => Some("has left the channel."),
            Tag::Default | Tag::Admin => None,
        }
    }

    /// Message body, if this kind of entry carries one.
    pub fn body(&self) -> Option<&str> {
        match self.tag {
            Tag::Default | Tag::Admin => Some(&self.text),
            Tag::Join | Tag::Exit => None,
        }
    }

    pub fn timestamps(&self, format: &str) -> String {
        format!(
            "[sent {} / received {}]",
            self.sent.with_timezone(&Local).format(format),
            self.received.with_timezone(&Local).format(format),
        )
    }

    /// Single-line rendering without styling.
    pub fn plain_line(&self, format: &str) -> String {
        let head = match self.notice() {
            Some(notice) => format!("{} {}", self.display_name(), notice),
            None => self.display_name().to_string(),
        };
        match self.body() {
            Some(body) => format!("{} {} {}", head, self.timestamps(format), body),
            None => format!("{} {}", head, self.timestamps(format)),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    transcript: Vec<TranscriptEntry>,
    unread: bool,
    selected: bool,
    closed: bool,
}

/// Everything the client knows about one joined channel.
pub struct ChannelSession {
    handle: SessionHandle,
    identity: ChannelIdentity,
    state: Mutex<SessionState>,
    queue: Arc<InboundQueue>,
    outbound: Outbound,
    admin: Option<Outbound>,
    stop: watch::Sender<bool>,
    redraw: RedrawSignal,
    logger: Option<Arc<Mutex<ChatLogger>>>,
    max_transcript: usize,
}

/// Settings shared by every session a registry creates.
#[derive(Clone)]
pub struct SessionOptions {
    pub redraw: RedrawSignal,
    pub logger: Option<Arc<Mutex<ChatLogger>>>,
    /// Oldest entries beyond this count are discarded; zero keeps everything.
    pub max_transcript: usize,
}

impl ChannelSession {
    pub(crate) fn new(
        handle: SessionHandle,
        identity: ChannelIdentity,
        queue: Arc<InboundQueue>,
        outbound: Outbound,
        admin: Option<Outbound>,
        options: &SessionOptions,
    ) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            handle,
            identity,
            state: Mutex::new(SessionState::default()),
            queue,
            outbound,
            admin,
            stop,
            redraw: options.redraw.clone(),
            logger: options.logger.clone(),
            max_transcript: options.max_transcript,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start draining the inbound queue into the transcript until
    /// [`close`](Self::close) is called.
    pub(crate) fn spawn_delivery(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let session = Arc::clone(self);
        let mut stop = self.stop.subscribe();
        tokio::spawn(async move {
            if *stop.borrow() {
                return;
            }
            loop {
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                    payload = session.queue.pop() => session.deliver(&payload),
                }
            }
            tracing::debug!(channel = %session.identity.name, "delivery task stopped");
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn identity(&self) -> &ChannelIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn max_payload_len(&self) -> usize {
        self.outbound.max_len
    }

    pub fn admin_max_payload_len(&self) -> Option<usize> {
        self.admin.as_ref().map(|a| a.max_len)
    }

    #[cfg(test)]
    pub fn has_admin(&self) -> bool {
        self.admin.is_some()
    }

    pub fn queue(&self) -> &Arc<InboundQueue> {
        &self.queue
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock().transcript.clone()
    }

    #[cfg(test)]
    pub fn transcript_len(&self) -> usize {
        self.lock().transcript.len()
    }

    pub fn unread(&self) -> bool {
        self.lock().unread
    }

    #[cfg(test)]
    pub fn is_selected(&self) -> bool {
        self.lock().selected
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Only the registry calls this, under its write lock.
    pub(crate) fn set_selected(&self, selected: bool) {
        let mut state = self.lock();
        state.selected = selected;
        if selected {
            state.unread = false;
        }
    }

    /// Decode one raw broadcast and add it to the transcript.
    pub fn deliver(&self, raw: &[u8]) {
        let decoded = match codec::decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(channel = %self.identity.name, "dropping malformed broadcast: {}", e);
                return;
            }
        };
        tracing::debug!(
            channel = %self.identity.name,
            tag = %decoded.tag,
            from = %decoded.username,
            backlog = self.queue.len(),
            "broadcast received"
        );
        self.append(TranscriptEntry {
            tag: decoded.tag,
            username: decoded.username,
            sent: decoded.timestamp,
            received: Utc::now(),
            text: String::from_utf8_lossy(&decoded.payload).trim().to_string(),
        });
    }

    /// Record something we sent ourselves when the transport will not echo it.
    pub fn append_local(&self, tag: Tag, username: &str, text: &str) {
        let now = Utc::now();
        self.append(TranscriptEntry {
            tag,
            username: username.to_string(),
            sent: now,
            received: now,
            text: text.trim().to_string(),
        });
    }

    fn append(&self, entry: TranscriptEntry) {
        let line = {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            let line = self.logger.as_ref().map(|_| ChatLogger::format_line(&entry));
            state.transcript.push(entry);
            if self.max_transcript > 0 && state.transcript.len() > self.max_transcript {
                let excess = state.transcript.len() - self.max_transcript;
                state.transcript.drain(..excess);
            }
            if !state.selected {
                state.unread = true;
            }
            line
        };
        // Disk writes happen outside the session lock.
        if let (Some(logger), Some(line)) = (&self.logger, line) {
            let mut logger = logger.lock().unwrap_or_else(|e| e.into_inner());
            logger.log_line(&self.identity.name, &line);
        }
        self.redraw.notify();
    }

    pub fn send(&self, text: &str) -> Result<(), SendError> {
        Self::post(&self.outbound, Tag::Default, text)
    }

    pub fn send_admin(&self, text: &str) -> Result<(), SendError> {
        let admin = self.admin.as_ref().ok_or(SendError::AdminUnavailable)?;
        Self::post(admin, Tag::Admin, text)
    }

    /// Announce a membership change. The notice carries no body.
    pub fn send_notice(&self, tag: Tag) -> Result<(), SendError> {
        (self.outbound.send)(tag, &[])
    }

    fn post(outbound: &Outbound, tag: Tag, text: &str) -> Result<(), SendError> {
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }
        if text.len() > outbound.max_len {
            return Err(SendError::TooLarge {
                len: text.len(),
                max: outbound.max_len,
            });
        }
        (outbound.send)(tag, text.as_bytes())
    }

    /// Stop delivery. Once this returns the transcript no longer changes.
    pub fn close(&self) {
        self.lock().closed = true;
        self.stop.send_replace(true);
    }
}

impl fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSession")
            .field("handle", &self.handle)
            .field("name", &self.identity.name)
            .finish_non_exhaustive()
    }
}
