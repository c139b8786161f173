use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Called once per payload that arrives on a joined channel.
///
/// Implementations must not block: the transport invokes it from its own
/// delivery context.
pub type ReceptionCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Identity of a broadcast channel as handed out by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentity {
    pub reception_id: String,
    pub name: String,
    pub description: String,
    pub max_symmetric: usize,
    pub max_asymmetric: usize,
    /// Shareable text form that [`Transport::parse_pretty_print`] accepts.
    pub pretty_print: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastMode {
    Symmetric,
    Asymmetric { admin_key: String },
}

/// Round the transport scheduled a broadcast in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoundRef(pub u64);

/// Ephemeral address a broadcast was sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EphemeralId(pub i64);

impl fmt::Display for RoundRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}", self.0)
    }
}

impl fmt::Display for EphemeralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to parse channel pretty print: {0}")]
    InvalidPrettyPrint(String),
    #[error("invalid channel: {0}")]
    InvalidChannel(String),
    #[error("channel {0} is already joined")]
    AlreadyJoined(String),
    #[error("channel {0} is not joined")]
    NotJoined(String),
    #[error("broadcast of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("admin key rejected for channel {0}")]
    AdminKeyRejected(String),
    #[error("transport state file: {0}")]
    Io(#[from] std::io::Error),
}

/// The anonymous-messaging network as seen by the client.
pub trait Transport: Send + Sync {
    /// Create a brand new channel; the caller becomes its admin.
    fn generate_channel(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ChannelIdentity, TransportError>;

    fn parse_pretty_print(&self, text: &str) -> Result<ChannelIdentity, TransportError>;

    /// Start receiving on `identity`. `callback` sees every payload for it.
    fn join_channel(
        &self,
        identity: &ChannelIdentity,
        callback: ReceptionCallback,
    ) -> Result<(), TransportError>;

    fn leave_channel(&self, identity: &ChannelIdentity) -> Result<(), TransportError>;

    fn broadcast(
        &self,
        reception_id: &str,
        payload: &[u8],
        mode: BroadcastMode,
    ) -> Result<(RoundRef, EphemeralId), TransportError>;

    /// Channels joined in an earlier run, in join order.
    fn joined_channels(&self) -> Result<Vec<ChannelIdentity>, TransportError>;

    /// Whether our own broadcasts come back through the reception callback.
    fn echoes_own_broadcasts(&self) -> bool;
}
