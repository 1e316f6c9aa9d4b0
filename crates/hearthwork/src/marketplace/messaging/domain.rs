use std::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::marketplace::jobs::domain::{JobId, UserId};

/// Deterministic identity of a two-party thread. The same pair of users
/// always resolves to the same id, regardless of who writes first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the conversation id for a pair of participants. Order-independent:
/// the pair is sorted before hashing, with a separator byte so distinct
/// pairs cannot collide by concatenation.
pub fn conversation_id_for(a: &UserId, b: &UserId) -> ConversationId {
    let (first, second) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(first.0.as_bytes());
    hasher.update([0u8]);
    hasher.update(second.0.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(32);
    for byte in &digest[..16] {
        let _ = write!(hex, "{byte:02x}");
    }
    ConversationId(hex)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    File,
}

impl Default for MessageKind {
    fn default() -> Self {
        Self::Text
    }
}

impl MessageKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
        }
    }
}

/// One message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub kind: MessageKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub job_id: Option<JobId>,
}

/// Thread summary. The summary fields always reflect the most recently
/// appended message for the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: [UserId; 2],
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub last_sender_id: UserId,
}

/// Inbound payload for sending a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub job_id: Option<JobId>,
}
