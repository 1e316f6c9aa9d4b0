use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::marketplace::events::{DispatchError, DomainEvent, EventSink};
use crate::marketplace::jobs::domain::UserId;
use crate::marketplace::messaging::domain::{
    Conversation, ConversationId, Message, MessageDraft, MessageKind,
};
use crate::marketplace::messaging::repository::ConversationRepository;
use crate::marketplace::messaging::service::ConversationRouter;
use crate::marketplace::store::RepositoryError;

pub(super) fn alice() -> UserId {
    UserId("alice".to_string())
}

pub(super) fn bob() -> UserId {
    UserId("bob".to_string())
}

pub(super) fn draft(content: &str) -> MessageDraft {
    MessageDraft {
        sender_id: alice(),
        receiver_id: bob(),
        content: content.to_string(),
        kind: MessageKind::Text,
        job_id: None,
    }
}

/// In-memory conversation store keyed by the deterministic id.
#[derive(Default, Clone)]
pub(super) struct MemoryConversations {
    conversations: Arc<Mutex<HashMap<String, Conversation>>>,
    messages: Arc<Mutex<Vec<Message>>>,
}

impl MemoryConversations {
    pub(super) fn conversation_count(&self) -> usize {
        self.conversations
            .lock()
            .expect("conversation mutex poisoned")
            .len()
    }
}

impl ConversationRepository for MemoryConversations {
    fn upsert_conversation(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        let mut guard = self
            .conversations
            .lock()
            .expect("conversation mutex poisoned");
        guard.insert(conversation.id.0.clone(), conversation);
        Ok(())
    }

    fn append_message(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut guard = self.messages.lock().expect("message mutex poisoned");
        guard.push(message.clone());
        Ok(message)
    }

    fn conversation(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let guard = self
            .conversations
            .lock()
            .expect("conversation mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn messages(
        &self,
        id: &ConversationId,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let guard = self.messages.lock().expect("message mutex poisoned");
        let mut messages: Vec<Message> = guard
            .iter()
            .filter(|message| &message.conversation_id == id)
            .filter(|message| before.map_or(true, |cursor| message.created_at < cursor))
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
        Ok(messages)
    }

    fn conversations_for(&self, user_id: &UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let guard = self
            .conversations
            .lock()
            .expect("conversation mutex poisoned");
        let mut conversations: Vec<Conversation> = guard
            .values()
            .filter(|conversation| conversation.participants.contains(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(conversations)
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl RecordingSink {
    pub(super) fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &DomainEvent) -> Result<usize, DispatchError> {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(event.clone());
        Ok(1)
    }
}

pub(super) fn build_service() -> (
    ConversationRouter<MemoryConversations, RecordingSink>,
    Arc<MemoryConversations>,
    Arc<RecordingSink>,
) {
    let repository = Arc::new(MemoryConversations::default());
    let sink = Arc::new(RecordingSink::default());
    let service = ConversationRouter::new(repository.clone(), sink.clone());
    (service, repository, sink)
}
