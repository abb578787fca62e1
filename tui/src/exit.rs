use quill_protocol::ConversationId;

/// Summary information produced when a composer session exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppExitInfo {
    /// Number of messages handed to the host during the session.
    pub messages_sent: usize,
    /// The conversation the composer was targeting when it exited, if any.
    pub conversation_id: Option<ConversationId>,
    /// Why the session ended.
    pub exit_reason: ExitReason,
}

/// Reason why the composer session terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The user pressed the quit shortcut twice on an empty composer.
    UserRequested,
    /// The terminal input stream closed.
    InputClosed,
}
