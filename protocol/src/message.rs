use serde::Deserialize;
use serde::Serialize;

use crate::ConversationId;

/// Content of one outgoing chat message.
///
/// Serializes either as a bare JSON string (text only) or as an ordered array of
/// [`ContentPart`]s when an image travels with the text.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single tagged part of a multi-part message.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageUrl {
    /// Encoded image reference, usually a `data:` URI.
    pub url: String,
}

impl MessageContent {
    /// Build the content for a draft and an optional encoded image.
    ///
    /// The draft is used verbatim (untrimmed). With an image the result is always exactly two
    /// parts: the text first, then the image.
    pub fn from_draft(draft: &str, attachment: Option<&str>) -> Self {
        match attachment {
            None => MessageContent::Text(draft.to_string()),
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: draft.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: url.to_string(),
                    },
                },
            ]),
        }
    }

    /// The text carried by this content (the first text part for multi-part content).
    pub fn text(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .iter()
                .find_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .unwrap_or_default(),
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            MessageContent::Text(_) => None,
            MessageContent::Parts(parts) => parts.iter().find_map(|part| match part {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
                ContentPart::Text { .. } => None,
            }),
        }
    }
}

/// A finished message together with the conversation it should be delivered to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ConversationId>,
}

/// Which host entry point receives an [`OutgoingMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Reply in an existing conversation.
    Reply(&'a ConversationId),
    /// Start a new conversation with this message.
    NewConversation,
}

impl OutgoingMessage {
    pub fn new(content: MessageContent, target: Option<ConversationId>) -> Self {
        Self { content, target }
    }

    /// A blank target counts as no target.
    pub fn route(&self) -> Route<'_> {
        match &self.target {
            Some(id) if !id.is_blank() => Route::Reply(id),
            _ => Route::NewConversation,
        }
    }
}
