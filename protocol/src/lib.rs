mod conversation_id;
pub use conversation_id::ConversationId;
pub use conversation_id::ConversationIdError;
pub mod message;
