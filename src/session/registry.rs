use crate::client::manager::ChannelManager;
use crate::client::tag::Tag;
use crate::client::transport::ChannelIdentity;
use crate::logging::ChatLogger;
use crate::session::channel::{ChannelSession, Outbound, SessionHandle, SessionOptions};
use crate::session::queue::InboundQueue;
use crate::session::signal::RedrawSignal;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no session with handle {0}")]
    UnknownSession(SessionHandle),
    #[error("channel index {index} is out of range for {len} channels")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One row of the channel list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub handle: SessionHandle,
    pub name: String,
    pub unread: bool,
}

#[derive(Default)]
struct Inner {
    sessions: Vec<Arc<ChannelSession>>,
    /// Meaningful only while `sessions` is non-empty.
    current: usize,
    next_handle: u64,
}

impl Inner {
    fn position(&self, handle: SessionHandle) -> Option<usize> {
        self.sessions.iter().position(|s| s.handle() == handle)
    }

    fn select_at(&mut self, index: usize) {
        if let Some(previous) = self.sessions.get(self.current) {
            previous.set_selected(false);
        }
        self.current = index;
        self.sessions[index].set_selected(true);
    }
}

/// Ordered set of joined channels and the one currently on screen.
///
/// Lock order is registry first, then session. Sessions never read the
/// registry, so delivery only ever takes its own session lock.
pub struct SessionRegistry {
    inner: RwLock<Inner>,
    options: SessionOptions,
}

impl SessionRegistry {
    pub fn new(redraw: RedrawSignal) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            options: SessionOptions {
                redraw,
                logger: None,
                max_transcript: 0,
            },
        }
    }

    pub fn with_logger(mut self, logger: Arc<Mutex<ChatLogger>>) -> Self {
        self.options.logger = Some(logger);
        self
    }

    pub fn with_max_transcript(mut self, max: usize) -> Self {
        self.options.max_transcript = max;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a joined channel and start its delivery task. The first channel
    /// added becomes current.
    pub fn add(
        &self,
        identity: ChannelIdentity,
        queue: Arc<InboundQueue>,
        outbound: Outbound,
    ) -> SessionHandle {
        self.insert(identity, queue, outbound, None)
    }

    /// Like [`add`](Self::add), also binding a sender for admin messages.
    pub fn add_with_admin(
        &self,
        identity: ChannelIdentity,
        queue: Arc<InboundQueue>,
        outbound: Outbound,
        admin: Outbound,
    ) -> SessionHandle {
        self.insert(identity, queue, outbound, Some(admin))
    }

    fn insert(
        &self,
        identity: ChannelIdentity,
        queue: Arc<InboundQueue>,
        outbound: Outbound,
        admin: Option<Outbound>,
    ) -> SessionHandle {
        let session = {
            let mut inner = self.write();
            let handle = SessionHandle(inner.next_handle);
            inner.next_handle += 1;
            let session = Arc::new(ChannelSession::new(
                handle,
                identity,
                queue,
                outbound,
                admin,
                &self.options,
            ));
            inner.sessions.push(session.clone());
            if inner.sessions.len() == 1 {
                inner.current = 0;
                session.set_selected(true);
            }
            session
        };
        session.spawn_delivery();
        tracing::info!(channel = %session.name(), handle = %session.handle(), "channel added");
        self.options.redraw.notify();
        session.handle()
    }

    /// Detach and close a session. After this returns its transcript no
    /// longer changes.
    pub fn remove(&self, handle: SessionHandle) -> Result<(), RegistryError> {
        let session = {
            let mut inner = self.write();
            let index = inner
                .position(handle)
                .ok_or(RegistryError::UnknownSession(handle))?;
            let was_current = index == inner.current;
            let session = inner.sessions.remove(index);

            if inner.sessions.is_empty() {
                inner.current = 0;
            } else {
                if index < inner.current {
                    inner.current -= 1;
                }
                if inner.current >= inner.sessions.len() {
                    inner.current = inner.sessions.len() - 1;
                }
                if was_current {
                    let current = inner.current;
                    inner.sessions[current].set_selected(true);
                }
            }
            session.set_selected(false);
            session.close();
            session
        };
        tracing::info!(channel = %session.name(), %handle, "channel removed");
        self.options.redraw.notify();
        Ok(())
    }

    /// Make `handle` current and clear its unread marker.
    pub fn select(&self, handle: SessionHandle) -> Result<(), RegistryError> {
        {
            let mut inner = self.write();
            let index = inner
                .position(handle)
                .ok_or(RegistryError::UnknownSession(handle))?;
            inner.select_at(index);
        }
        self.options.redraw.notify();
        Ok(())
    }

    pub fn select_index(&self, index: usize) -> Result<SessionHandle, RegistryError> {
        let handle = {
            let mut inner = self.write();
            let len = inner.sessions.len();
            if index >= len {
                return Err(RegistryError::IndexOutOfRange { index, len });
            }
            inner.select_at(index);
            inner.sessions[index].handle()
        };
        self.options.redraw.notify();
        Ok(handle)
    }

    /// Select the channel after the current one, wrapping to the first.
    pub fn select_next(&self) -> Option<SessionHandle> {
        self.step(1)
    }

    /// Select the channel before the current one, wrapping to the last.
    pub fn select_prev(&self) -> Option<SessionHandle> {
        self.step(-1)
    }

    fn step(&self, delta: isize) -> Option<SessionHandle> {
        let handle = {
            let mut inner = self.write();
            let len = inner.sessions.len();
            if len == 0 {
                return None;
            }
            let index = (inner.current as isize + delta).rem_euclid(len as isize) as usize;
            inner.select_at(index);
            inner.sessions[index].handle()
        };
        self.options.redraw.notify();
        Some(handle)
    }

    /// Rejoin every channel the transport remembers from a previous run.
    ///
    /// Channels appear one at a time; one that fails is logged and skipped.
    /// Returns how many were restored.
    pub async fn replay(&self, manager: &ChannelManager) -> usize {
        let identities = match manager.previously_joined() {
            Ok(identities) => identities,
            Err(e) => {
                tracing::error!("could not list previously joined channels: {}", e);
                return 0;
            }
        };
        if identities.is_empty() {
            tracing::debug!("no channels to replay");
            return 0;
        }

        let mut restored = 0;
        for identity in identities {
            let name = identity.name.clone();
            match manager.join(self, identity) {
                Ok(handle) => {
                    restored += 1;
                    if let Some(session) = self.get(handle) {
                        if let Err(e) = session.send_notice(Tag::Join) {
                            tracing::warn!(channel = %name, "join notice failed: {}", e);
                        }
                    }
                }
                Err(e) => tracing::error!(channel = %name, "failed to rejoin channel: {}", e),
            }
            tokio::task::yield_now().await;
        }
        tracing::info!(restored, "replayed joined channels");
        restored
    }

    pub fn len(&self) -> usize {
        self.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().sessions.is_empty()
    }

    pub fn current(&self) -> Option<Arc<ChannelSession>> {
        let inner = self.read();
        inner.sessions.get(inner.current).cloned()
    }

    pub fn current_handle(&self) -> Option<SessionHandle> {
        self.current().map(|s| s.handle())
    }

    pub fn current_index(&self) -> Option<usize> {
        let inner = self.read();
        (!inner.sessions.is_empty()).then_some(inner.current)
    }

    pub fn get(&self, handle: SessionHandle) -> Option<Arc<ChannelSession>> {
        let inner = self.read();
        inner.position(handle).map(|i| inner.sessions[i].clone())
    }

    #[cfg(test)]
    pub fn index_of(&self, handle: SessionHandle) -> Option<usize> {
        self.read().position(handle)
    }

    pub fn contains_reception_id(&self, reception_id: &str) -> bool {
        self.read()
            .sessions
            .iter()
            .any(|s| s.identity().reception_id == reception_id)
    }

    /// All sessions in display order.
    pub fn sessions(&self) -> Vec<Arc<ChannelSession>> {
        self.read().sessions.clone()
    }

    pub fn snapshot(&self) -> Vec<SessionRow> {
        self.read()
            .sessions
            .iter()
            .map(|s| SessionRow {
                handle: s.handle(),
                name: s.name().to_string(),
                unread: s.unread(),
            })
            .collect()
    }
}
