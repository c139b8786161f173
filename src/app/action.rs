use crate::session::SessionHandle;

/// Work the handler asks the run loop to carry out against the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SendMessage { handle: SessionHandle, text: String, admin: bool },
    CreateChannel { name: String, description: String },
    JoinChannel { pretty_print: String },
    LeaveChannel { handle: SessionHandle },
    CopyToClipboard { text: String },
    Quit,
}
