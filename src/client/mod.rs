//! Broadcast client layer: wire codec, transport collaborator, and the
//! channel manager that joins the two to channel sessions.

pub mod codec;
pub mod loopback;
pub mod manager;
pub mod tag;
pub mod transport;
