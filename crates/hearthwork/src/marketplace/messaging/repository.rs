use chrono::{DateTime, Utc};

use super::domain::{Conversation, ConversationId, Message};
use crate::marketplace::jobs::domain::UserId;
use crate::marketplace::store::RepositoryError;

/// Storage abstraction for conversations and their messages.
pub trait ConversationRepository: Send + Sync {
    /// Idempotent write keyed by the deterministic conversation id: creates
    /// the thread if absent, otherwise replaces the summary fields. No
    /// read-then-branch, so two racing first messages both land on the same
    /// document.
    fn upsert_conversation(&self, conversation: Conversation) -> Result<(), RepositoryError>;

    fn append_message(&self, message: Message) -> Result<Message, RepositoryError>;

    fn conversation(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError>;

    /// Oldest-first window of messages. With `before` set, only messages
    /// created strictly earlier than the cursor are considered; the window
    /// is the most recent `limit` of those, still oldest-first.
    fn messages(
        &self,
        id: &ConversationId,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// A user's threads, most recent activity first.
    fn conversations_for(&self, user_id: &UserId) -> Result<Vec<Conversation>, RepositoryError>;
}
