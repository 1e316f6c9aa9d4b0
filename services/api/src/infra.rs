use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use uuid::Uuid;

use hearthwork::marketplace::jobs::domain::{Job, JobId, UserId};
use hearthwork::marketplace::jobs::repository::{JobFilter, JobRepository};
use hearthwork::marketplace::jobs::{ApplicationRegistry, JobLifecycleEngine};
use hearthwork::marketplace::messaging::domain::{Conversation, ConversationId, Message};
use hearthwork::marketplace::messaging::repository::ConversationRepository;
use hearthwork::marketplace::messaging::ConversationRouter;
use hearthwork::marketplace::notifications::domain::{Notification, NotificationId};
use hearthwork::marketplace::notifications::repository::{NotificationRepository, UpsertOutcome};
use hearthwork::marketplace::notifications::NotificationDispatcher;
use hearthwork::marketplace::store::RepositoryError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Dispatcher = NotificationDispatcher<InMemoryNotificationStore>;
pub(crate) type Engine = JobLifecycleEngine<InMemoryJobStore, Dispatcher>;
pub(crate) type Registry = ApplicationRegistry<InMemoryJobStore, Dispatcher>;
pub(crate) type Messaging = ConversationRouter<InMemoryConversationStore, Dispatcher>;

/// The wired-up marketplace over in-memory adapters. The managed document
/// store slots in behind the same traits in deployment.
pub(crate) struct Marketplace {
    pub(crate) engine: Arc<Engine>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) messaging: Arc<Messaging>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) notifications: Arc<InMemoryNotificationStore>,
}

pub(crate) fn build_marketplace() -> Marketplace {
    let jobs = Arc::new(InMemoryJobStore::default());
    let notifications = Arc::new(InMemoryNotificationStore::default());
    let conversations = Arc::new(InMemoryConversationStore::default());
    let dispatcher = Arc::new(NotificationDispatcher::new(notifications.clone()));

    Marketplace {
        engine: Arc::new(JobLifecycleEngine::new(jobs.clone(), dispatcher.clone())),
        registry: Arc::new(ApplicationRegistry::new(jobs, dispatcher.clone())),
        messaging: Arc::new(ConversationRouter::new(conversations, dispatcher.clone())),
        dispatcher,
        notifications,
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobStore {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobRepository for InMemoryJobStore {
    fn insert(&self, mut job: Job) -> Result<Job, RepositoryError> {
        job.id = JobId(Uuid::new_v4().to_string());
        job.version = 1;
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        guard.insert(job.id.0.clone(), job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn update(&self, mut job: Job, expected_version: u64) -> Result<Job, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        match guard.get(&job.id.0) {
            None => Err(RepositoryError::NotFound),
            Some(stored) if stored.version != expected_version => Err(RepositoryError::Conflict),
            Some(_) => {
                job.version = expected_version + 1;
                guard.insert(job.id.0.clone(), job.clone());
                Ok(job)
            }
        }
    }

    fn increment_view_count(&self, id: &JobId) -> Result<u64, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        let job = guard.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;
        job.view_count += 1;
        Ok(job.view_count)
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        let mut jobs: Vec<Job> = guard
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationStore {
    records: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationRepository for InMemoryNotificationStore {
    fn upsert(&self, notification: Notification) -> Result<UpsertOutcome, RepositoryError> {
        let mut guard = self.records.lock().expect("notification mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.dedup_key == notification.dedup_key)
        {
            return Ok(UpsertOutcome::AlreadyDelivered);
        }
        guard.push(notification);
        Ok(UpsertOutcome::Created)
    }

    fn list_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let guard = self.records.lock().expect("notification mutex poisoned");
        let mut notifications: Vec<Notification> = guard
            .iter()
            .filter(|notification| &notification.recipient_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit);
        Ok(notifications)
    }

    fn unread_count(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let guard = self.records.lock().expect("notification mutex poisoned");
        Ok(guard
            .iter()
            .filter(|notification| &notification.recipient_id == user_id && !notification.read)
            .count())
    }

    fn mark_read(
        &self,
        user_id: &UserId,
        ids: &[NotificationId],
        read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("notification mutex poisoned");
        let mut marked = 0;
        for notification in guard.iter_mut() {
            if &notification.recipient_id == user_id
                && ids.contains(&notification.id)
                && !notification.read
            {
                notification.read = true;
                notification.read_at = Some(read_at);
                marked += 1;
            }
        }
        Ok(marked)
    }

    fn mark_all_read(
        &self,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("notification mutex poisoned");
        let mut marked = 0;
        for notification in guard.iter_mut() {
            if &notification.recipient_id == user_id && !notification.read {
                notification.read = true;
                notification.read_at = Some(read_at);
                marked += 1;
            }
        }
        Ok(marked)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryConversationStore {
    conversations: Arc<Mutex<HashMap<String, Conversation>>>,
    messages: Arc<Mutex<Vec<Message>>>,
}

impl ConversationRepository for InMemoryConversationStore {
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
