//! Delivery boundary between the composer and the application that owns conversations.

use quill_protocol::ConversationId;
use quill_protocol::message::MessageContent;
use quill_protocol::message::OutgoingMessage;
use quill_protocol::message::Route;

/// The two host entry points a finished message can land in.
///
/// They differ only in whether the message continues an existing conversation; the content
/// shape is the same for both.
pub trait ConversationHost {
    fn reply(
        &mut self,
        content: MessageContent,
        conversation_id: &ConversationId,
    ) -> anyhow::Result<()>;

    /// Start a new conversation. Returns the id the host assigned to it, if it has one.
    fn start_conversation(
        &mut self,
        content: MessageContent,
    ) -> anyhow::Result<Option<ConversationId>>;
}

/// Deliver `message` through the entry point its target selects.
///
/// Returns the id of the conversation the message ended up in, when known.
pub fn deliver(
    host: &mut dyn ConversationHost,
    message: OutgoingMessage,
) -> anyhow::Result<Option<ConversationId>> {
    let route = match message.route() {
        Route::Reply(id) => Some(id.clone()),
        Route::NewConversation => None,
    };
    match route {
        Some(id) => {
            tracing::info!("delivering reply to conversation {id}");
            host.reply(message.content, &id)?;
            Ok(Some(id))
        }
        None => {
            tracing::info!("delivering message as a new conversation");
            host.start_conversation(message.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingHost {
        replies: Vec<(MessageContent, ConversationId)>,
        started: Vec<MessageContent>,
    }

    impl ConversationHost for RecordingHost {
        fn reply(
            &mut self,
            content: MessageContent,
            conversation_id: &ConversationId,
        ) -> anyhow::Result<()> {
            self.replies.push((content, conversation_id.clone()));
            Ok(())
        }

        fn start_conversation(
            &mut self,
            content: MessageContent,
        ) -> anyhow::Result<Option<ConversationId>> {
            self.started.push(content);
            Ok(Some(ConversationId::from("minted")))
        }
    }

    #[test]
    fn targeted_message_is_a_reply() {
        let mut host = RecordingHost::default();
        let content = MessageContent::from_draft("Look", Some("data:image/png;base64,AAAA"));
        let id = deliver(
            &mut host,
            OutgoingMessage::new(content.clone(), Some(ConversationId::from("conv-1"))),
        )
        .unwrap();

        assert_eq!(id, Some(ConversationId::from("conv-1")));
        assert_eq!(
            host.replies,
            vec![(content, ConversationId::from("conv-1"))]
        );
        assert!(host.started.is_empty());
    }

    #[test]
    fn untargeted_message_starts_a_conversation() {
        let mut host = RecordingHost::default();
        let content = MessageContent::from_draft("Hello", None);
        let id = deliver(&mut host, OutgoingMessage::new(content.clone(), None)).unwrap();

        assert_eq!(id, Some(ConversationId::from("minted")));
        assert_eq!(host.started, vec![content]);
        assert!(host.replies.is_empty());
    }

    #[test]
    fn blank_target_starts_a_conversation() {
        let mut host = RecordingHost::default();
        let content = MessageContent::from_draft("Hello", None);
        let id = deliver(
            &mut host,
            OutgoingMessage::new(content.clone(), Some(ConversationId::from(""))),
        )
        .unwrap();

        assert_eq!(id, Some(ConversationId::from("minted")));
        assert_eq!(host.started, vec![content]);
        assert!(host.replies.is_empty());
    }
}
