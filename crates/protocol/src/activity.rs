use {
    bytes::Bytes,
    serde::{Deserialize, Serialize},
};

/// A structured conversational message exchanged with the downstream agent.
///
/// Activities are constructed by the inbound channel and treated as
/// immutable by the bridge, with one exception: the relay overwrites
/// `service_url` with its origin marker before forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "serviceUrl", default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(rename = "channelId", default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
    #[serde(
        rename = "conversationType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub conversation_type: Option<String>,
}

/// A single activity attachment.
///
/// Outbound attachments are reference-based (`content_url`) or inline JSON
/// (`content`) and travel inside the activity body. `raw` is only populated
/// when the attachment was reconstructed from an auxiliary wire stream on
/// the inbound path; it is never re-serialized inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "contentUrl", default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(skip)]
    pub raw: Option<Bytes>,
}

impl Attachment {
    /// An attachment reconstructed from an auxiliary frame stream.
    #[must_use]
    pub fn from_stream(content_type: impl Into<String>, body: Bytes) -> Self {
        Self {
            content_type: content_type.into(),
            content_url: None,
            content: None,
            raw: Some(body),
        }
    }
}

impl Activity {
    /// A plain message activity.
    #[must_use]
    pub fn message(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            activity_type: "message".into(),
            id: None,
            text: Some(text.into()),
            service_url: None,
            channel_id: None,
            from: Some(ChannelAccount {
                id: sender_id.into(),
                name: None,
            }),
            recipient: None,
            conversation: Some(ConversationAccount {
                id: conversation_id.into(),
                conversation_type: None,
            }),
            attachments: Vec::new(),
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.id.as_str())
    }

    pub fn sender_id(&self) -> Option<&str> {
        self.from.as_ref().map(|a| a.id.as_str())
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|a| a.id.as_str())
    }

    /// Whether the sender is the bridge's own bot account. On inbound
    /// conversation updates the bot is the recipient, so a member whose id
    /// matches the recipient id is the bot observing itself join.
    pub fn is_self_originated(&self) -> bool {
        match (self.sender_id(), self.recipient_id()) {
            (Some(sender), Some(recipient)) => sender == recipient,
            _ => false,
        }
    }
}
