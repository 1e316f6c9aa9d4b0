use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::domain::{
    conversation_id_for, Conversation, ConversationId, Message, MessageDraft, MessageId,
};
use super::repository::ConversationRepository;
use crate::marketplace::events::{publish_after_commit, DispatchReport, DomainEvent, EventSink};
use crate::marketplace::jobs::domain::UserId;
use crate::marketplace::store::RepositoryError;

const PREVIEW_MAX_CHARS: usize = 80;

/// Appends messages and keeps the conversation summary in step, emitting
/// `MessageSent` for the notification dispatcher.
pub struct ConversationRouter<M, S> {
    repository: Arc<M>,
    events: Arc<S>,
}

/// Result of a committed send: the stored message, the upserted summary, and
/// the secondary dispatch outcome.
#[derive(Debug)]
pub struct SentMessage {
    pub message: Message,
    pub conversation: Conversation,
    pub dispatch: DispatchReport,
}

/// Error raised by the messaging surface.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("message content must not be empty")]
    EmptyContent,
    #[error("sender and receiver must be different users")]
    SelfConversation,
    #[error("conversation not found")]
    ConversationNotFound,
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl<M, S> ConversationRouter<M, S>
where
    M: ConversationRepository + 'static,
    S: EventSink + 'static,
{
    pub fn new(repository: Arc<M>, events: Arc<S>) -> Self {
        Self { repository, events }
    }

    /// Append a message to the pair's thread. The conversation summary is a
    /// single idempotent upsert keyed by the deterministic id, so two racing
    /// first messages converge on one document.
    pub fn send_message(&self, draft: MessageDraft) -> Result<SentMessage, MessagingError> {
        if draft.content.trim().is_empty() {
            return Err(MessagingError::EmptyContent);
        }
        if draft.sender_id == draft.receiver_id {
            return Err(MessagingError::SelfConversation);
        }

        let now = Utc::now();
        let conversation_id = conversation_id_for(&draft.sender_id, &draft.receiver_id);
        let message = Message {
            id: MessageId(Uuid::new_v4().to_string()),
            conversation_id: conversation_id.clone(),
            sender_id: draft.sender_id.clone(),
            receiver_id: draft.receiver_id.clone(),
            content: draft.content,
            kind: draft.kind,
            read: false,
            created_at: now,
            job_id: draft.job_id,
        };
        let message = self.repository.append_message(message)?;

        let mut participants = [draft.sender_id.clone(), draft.receiver_id.clone()];
        participants.sort();
        let conversation = Conversation {
            id: conversation_id.clone(),
            participants,
            last_message: message.content.clone(),
            last_message_at: message.created_at,
            last_sender_id: message.sender_id.clone(),
        };
        self.repository.upsert_conversation(conversation.clone())?;
        info!(conversation_id = %conversation_id, sender = %message.sender_id, "message sent");

        let event = DomainEvent::MessageSent {
            message_id: message.id.0.clone(),
            conversation_id: conversation_id.0.clone(),
            sender_id: message.sender_id.clone(),
            receiver_id: message.receiver_id.clone(),
            preview: preview(&message.content),
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(SentMessage {
            message,
            conversation,
            dispatch,
        })
    }

    pub fn list_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, MessagingError> {
        if self.repository.conversation(conversation_id)?.is_none() {
            return Err(MessagingError::ConversationNotFound);
        }
        Ok(self.repository.messages(conversation_id, limit, before)?)
    }

    pub fn list_conversations(&self, user_id: &UserId) -> Result<Vec<Conversation>, MessagingError> {
        Ok(self.repository.conversations_for(user_id)?)
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_MAX_CHARS {
        return content.to_string();
    }
    let truncated: String = content.chars().take(PREVIEW_MAX_CHARS).collect();
    format!("{truncated}…")
}
