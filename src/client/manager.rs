use crate::client::codec;
use crate::client::tag::Tag;
use crate::client::transport::{
    BroadcastMode, ChannelIdentity, ReceptionCallback, Transport, TransportError,
};
use crate::session::channel::{Outbound, SessionHandle};
use crate::session::queue::InboundQueue;
use crate::session::registry::{RegistryError, SessionRegistry};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

/// Longest pretty print accepted from the join dialog.
pub const MAX_PRETTY_PRINT_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("already a member of channel {0}")]
    AlreadyJoined(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Joins channels on the transport and turns them into registry sessions.
pub struct ChannelManager {
    transport: Arc<dyn Transport>,
    username: String,
    admin_key: Option<String>,
}

impl ChannelManager {
    pub fn new(transport: Arc<dyn Transport>, username: String, admin_key: Option<String>) -> Self {
        Self {
            transport,
            username,
            admin_key: admin_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn has_admin_key(&self) -> bool {
        self.admin_key.is_some()
    }

    /// When false, the caller has to add its own messages to the transcript.
    pub fn echoes_own_broadcasts(&self) -> bool {
        self.transport.echoes_own_broadcasts()
    }

    pub fn generate(&self, name: &str, description: &str) -> Result<ChannelIdentity, ManagerError> {
        let name = name.trim();
        let description = description.trim();
        if name.is_empty() {
            return Err(ManagerError::InvalidInput("channel name is required".into()));
        }
        if description.is_empty() {
            return Err(ManagerError::InvalidInput(
                "channel description is required".into(),
            ));
        }
        let identity = self.transport.generate_channel(name, description)?;
        tracing::info!(channel = %identity.name, id = %identity.reception_id, "generated channel");
        Ok(identity)
    }

    pub fn parse(&self, pretty_print: &str) -> Result<ChannelIdentity, ManagerError> {
        let pretty_print = pretty_print.trim();
        if pretty_print.is_empty() {
            return Err(ManagerError::InvalidInput(
                "channel pretty print is required".into(),
            ));
        }
        if pretty_print.len() > MAX_PRETTY_PRINT_LEN {
            return Err(ManagerError::InvalidInput(format!(
                "channel pretty print is longer than {} characters",
                MAX_PRETTY_PRINT_LEN
            )));
        }
        Ok(self.transport.parse_pretty_print(pretty_print)?)
    }

    /// Join `identity` on the transport and register it as a session.
    pub fn join(
        &self,
        registry: &SessionRegistry,
        identity: ChannelIdentity,
    ) -> Result<SessionHandle, ManagerError> {
        if registry.contains_reception_id(&identity.reception_id) {
            return Err(ManagerError::AlreadyJoined(identity.name));
        }

        let queue = Arc::new(InboundQueue::new());
        let callback: ReceptionCallback = {
            let queue = queue.clone();
            Arc::new(move |payload: &[u8]| queue.push(payload.to_vec()))
        };
        self.transport.join_channel(&identity, callback)?;

        let outbound = self.outbound(&identity, BroadcastMode::Symmetric, identity.max_symmetric);
        let handle = match &self.admin_key {
            Some(admin_key) => {
                let admin = self.outbound(
                    &identity,
                    BroadcastMode::Asymmetric {
                        admin_key: admin_key.clone(),
                    },
                    identity.max_asymmetric,
                );
                registry.add_with_admin(identity, queue, outbound, admin)
            }
            None => registry.add(identity, queue, outbound),
        };
        Ok(handle)
    }

    /// Generate a new channel, join it and make it current.
    pub fn create(
        &self,
        registry: &SessionRegistry,
        name: &str,
        description: &str,
    ) -> Result<SessionHandle, ManagerError> {
        let identity = self.generate(name, description)?;
        self.enter(registry, identity)
    }

    /// Join a channel from its pretty print and make it current.
    pub fn join_pretty(
        &self,
        registry: &SessionRegistry,
        pretty_print: &str,
    ) -> Result<SessionHandle, ManagerError> {
        let identity = self.parse(pretty_print)?;
        self.enter(registry, identity)
    }

    fn enter(
        &self,
        registry: &SessionRegistry,
        identity: ChannelIdentity,
    ) -> Result<SessionHandle, ManagerError> {
        let handle = self.join(registry, identity)?;
        registry.select(handle)?;
        if let Some(session) = registry.get(handle) {
            if let Err(e) = session.send_notice(Tag::Join) {
                tracing::warn!(channel = %session.name(), "join notice failed: {}", e);
            }
        }
        Ok(handle)
    }

    /// Say goodbye, leave on the transport, then drop the session.
    pub fn leave(&self, registry: &SessionRegistry, handle: SessionHandle) -> Result<(), ManagerError> {
        let session = registry
            .get(handle)
            .ok_or(RegistryError::UnknownSession(handle))?;
        if let Err(e) = session.send_notice(Tag::Exit) {
            tracing::warn!(channel = %session.name(), "exit notice failed: {}", e);
        }
        self.transport.leave_channel(session.identity())?;
        registry.remove(handle)?;
        tracing::info!(channel = %session.name(), "left channel");
        Ok(())
    }

    pub fn previously_joined(&self) -> Result<Vec<ChannelIdentity>, ManagerError> {
        Ok(self.transport.joined_channels()?)
    }

    fn outbound(&self, identity: &ChannelIdentity, mode: BroadcastMode, max_wire: usize) -> Outbound {
        let transport = self.transport.clone();
        let username = self.username.clone();
        let reception_id = identity.reception_id.clone();
        let channel = identity.name.clone();
        let max_len = codec::max_payload_size(max_wire, &self.username);
        Outbound {
            send: Box::new(move |tag, body| {
                let payload = codec::encode(max_wire, tag, Utc::now(), &username, body)?;
                let (round, ephemeral) = transport.broadcast(&reception_id, &payload, mode.clone())?;
                tracing::info!(%channel, %tag, %round, %ephemeral, "broadcast sent");
                Ok(())
            }),
            max_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::loopback::{LoopbackTransport, DEFAULT_MAX_PAYLOAD};
    use crate::session::signal::RedrawSignal;
    use std::time::Duration;

    fn setup(admin_key: Option<&str>) -> (ChannelManager, SessionRegistry, tokio::sync::mpsc::Receiver<()>) {
        let transport = Arc::new(LoopbackTransport::new(DEFAULT_MAX_PAYLOAD));
        let manager = ChannelManager::new(transport, "alice".into(), admin_key.map(String::from));
        let (redraw, rx) = RedrawSignal::channel();
        (manager, SessionRegistry::new(redraw), rx)
    }

    async fn wait_for_entries(registry: &SessionRegistry, handle: SessionHandle, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while registry.get(handle).map(|s| s.transcript_len()).unwrap_or(0) < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_announces_join() {
        let (manager, registry, _rx) = setup(None);
        let handle = manager.create(&registry, "general", "everything").unwrap();
        assert_eq!(registry.current_handle(), Some(handle));

        wait_for_entries(&registry, handle, 1).await;
        let transcript = registry.get(handle).unwrap().transcript();
        assert_eq!(transcript[0].tag, Tag::Join);
        assert_eq!(transcript[0].username, "alice");
    }

    #[tokio::test]
    async fn test_send_round_trips_through_loopback() {
        let (manager, registry, _rx) = setup(None);
        let handle = manager.create(&registry, "general", "everything").unwrap();
        let session = registry.get(handle).unwrap();
        assert_eq!(
            session.max_payload_len(),
            codec::max_payload_size(DEFAULT_MAX_PAYLOAD, "alice")
        );

        session.send("hello there").unwrap();
        wait_for_entries(&registry, handle, 2).await;
        let last = session.transcript().pop().unwrap();
        assert_eq!(last.tag, Tag::Default);
        assert_eq!(last.text, "hello there");
    }

    #[tokio::test]
    async fn test_admin_sender_bound_only_with_key() {
        let (manager, registry, _rx) = setup(None);
        let handle = manager.create(&registry, "general", "x").unwrap();
        assert!(!registry.get(handle).unwrap().has_admin());

        let (manager, registry, _rx) = setup(Some("key"));
        let handle = manager.create(&registry, "general", "x").unwrap();
        let session = registry.get(handle).unwrap();
        assert!(session.has_admin());
        session.send_admin("listen up").unwrap();
        wait_for_entries(&registry, handle, 2).await;
        assert_eq!(session.transcript().pop().unwrap().tag, Tag::Admin);
    }

    #[tokio::test]
    async fn test_generate_requires_fields() {
        let (manager, _registry, _rx) = setup(None);
        assert!(matches!(
            manager.generate("", "desc"),
            Err(ManagerError::InvalidInput(_))
        ));
        assert!(matches!(
            manager.generate("name", "  "),
            Err(ManagerError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_parse_checks_length_locally() {
        let (manager, _registry, _rx) = setup(None);
        assert!(matches!(manager.parse(""), Err(ManagerError::InvalidInput(_))));
        let long = "x".repeat(MAX_PRETTY_PRINT_LEN + 1);
        assert!(matches!(manager.parse(&long), Err(ManagerError::InvalidInput(_))));
        assert!(matches!(
            manager.parse("not a channel"),
            Err(ManagerError::Transport(TransportError::InvalidPrettyPrint(_)))
        ));
    }

    #[tokio::test]
    async fn test_join_twice_rejected() {
        let (manager, registry, _rx) = setup(None);
        let identity = manager.generate("general", "x").unwrap();
        manager.join(&registry, identity.clone()).unwrap();
        assert!(matches!(
            manager.join(&registry, identity),
            Err(ManagerError::AlreadyJoined(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_removes_session() {
        let (manager, registry, _rx) = setup(None);
        let a = manager.create(&registry, "a", "x").unwrap();
        let b = manager.create(&registry, "b", "y").unwrap();
        manager.leave(&registry, b).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.current_handle(), Some(a));
        assert!(matches!(
            manager.leave(&registry, b),
            Err(ManagerError::Registry(RegistryError::UnknownSession(_)))
        ));
    }

    #[tokio::test]
    async fn test_leave_retry_after_state_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");
        let transport =
            Arc::new(LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path.clone()).unwrap());
        let manager = ChannelManager::new(transport, "alice".into(), None);
        let (redraw, _rx) = RedrawSignal::channel();
        let registry = SessionRegistry::new(redraw);
        let handle = manager.create(&registry, "a", "first").unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(matches!(
            manager.leave(&registry, handle),
            Err(ManagerError::Transport(TransportError::Io(_)))
        ));
        assert_eq!(registry.len(), 1);

        std::fs::remove_dir(&path).unwrap();
        manager.leave(&registry, handle).unwrap();
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_create_retry_after_state_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");
        let transport =
            Arc::new(LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path.clone()).unwrap());
        let manager = ChannelManager::new(transport, "alice".into(), None);
        let (redraw, _rx) = RedrawSignal::channel();
        let registry = SessionRegistry::new(redraw);
        let identity = manager.generate("a", "first").unwrap();

        std::fs::create_dir(&path).unwrap();
        assert!(manager.join(&registry, identity.clone()).is_err());
        assert_eq!(registry.len(), 0);

        std::fs::remove_dir(&path).unwrap();
        manager.join(&registry, identity).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_restores_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");
        {
            let transport =
                Arc::new(LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path.clone()).unwrap());
            let manager = ChannelManager::new(transport, "alice".into(), None);
            let (redraw, _rx) = RedrawSignal::channel();
            let registry = SessionRegistry::new(redraw);
            manager.create(&registry, "a", "first").unwrap();
            manager.create(&registry, "b", "second").unwrap();
        }

        let transport = Arc::new(LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path).unwrap());
        let manager = ChannelManager::new(transport, "alice".into(), None);
        let (redraw, _rx) = RedrawSignal::channel();
        let registry = SessionRegistry::new(redraw);
        assert_eq!(registry.replay(&manager).await, 2);
        let names: Vec<String> = registry.snapshot().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_replay_with_nothing_saved() {
        let (manager, registry, _rx) = setup(None);
        assert_eq!(registry.replay(&manager).await, 0);
        assert!(registry.is_empty());
    }
}
