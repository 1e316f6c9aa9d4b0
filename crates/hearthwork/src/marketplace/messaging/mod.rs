//! Two-party messaging keyed by deterministic conversation identity.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    conversation_id_for, Conversation, ConversationId, Message, MessageDraft, MessageId,
    MessageKind,
};
pub use repository::ConversationRepository;
pub use router::messaging_router;
pub use service::{ConversationRouter, MessagingError, SentMessage};
