//! Live state of joined channels.
//!
//! Each [`channel::ChannelSession`] owns a transcript and a delivery task fed
//! by its [`queue::InboundQueue`]. The [`registry::SessionRegistry`] keeps them
//! in display order and tracks which one is on screen.

pub mod channel;
pub mod queue;
pub mod registry;
pub mod signal;

pub use channel::{ChannelSession, SessionHandle, TranscriptEntry};
pub use queue::InboundQueue;
pub use registry::{RegistryError, SessionRegistry};
pub use signal::RedrawSignal;
