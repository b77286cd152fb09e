//! In-memory storage backend

use super::traits::{MessageStore, StoreError};
use crate::model::{Action, GetOptions, Message, NewMessage, OptionsError, QueueName, QueueSummary};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use tokio::time::Instant;
use tracing::info;

/// One queue: messages in cursor order
#[derive(Debug)]
struct Queue {
    messages: VecDeque<Message>,
    next_cursor: u64,
}

impl Queue {
    fn new() -> Self {
        Self {
            messages: VecDeque::new(),
            next_cursor: 1,
        }
    }

    fn push(&mut self, new: NewMessage, now: Instant) -> Message {
        let message = Message::new(self.next_cursor, new, now);
        self.next_cursor += 1;
        self.messages.push_back(message.clone());
        message
    }

    fn drop_expired(&mut self, now: Instant) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| !m.is_expired_at(now));
        before - self.messages.len()
    }

    fn position(&self, pred: impl Fn(&Message) -> bool) -> Option<usize> {
        self.messages.iter().position(pred)
    }

    fn summary(&self, name: &QueueName, now: Instant) -> QueueSummary {
        let live = self.messages.iter().filter(|m| !m.is_expired_at(now));
        let (depth, reserved) = live.fold((0, 0), |(depth, reserved), m| {
            (depth + 1, reserved + usize::from(m.is_reserved_at(now)))
        });
        QueueSummary {
            queue_name: name.to_string(),
            depth,
            reserved,
        }
    }
}

/// Ephemeral (in-memory) queue store
#[derive(Debug, Default)]
pub struct MemoryStore {
    queues: DashMap<QueueName, Queue>,
    max_content_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject messages whose content is longer than `limit` bytes
    #[must_use]
    pub fn with_max_content_bytes(mut self, limit: usize) -> Self {
        self.max_content_bytes = Some(limit);
        self
    }

    /// Messages currently held, expired ones not yet swept included
    pub fn stored_messages(&self) -> usize {
        self.queues.iter().map(|q| q.messages.len()).sum()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(
        &self,
        queue_name: &QueueName,
        message: NewMessage,
    ) -> Result<Message, StoreError> {
        if let Some(limit) = self.max_content_bytes {
            let size = message.content().len();
            if size > limit {
                return Err(StoreError::ContentTooLarge { size, limit });
            }
        }

        let now = Instant::now();
        let mut queue = self
            .queues
            .entry(queue_name.clone())
            .or_insert_with(Queue::new);
        queue.drop_expired(now);
        let message = queue.push(message, now);

        info!(
            queue = %queue_name,
            mid = %message.mid(),
            cursor = message.cursor(),
            "Created message"
        );
        Ok(message)
    }

    async fn get_message(&self, options: &GetOptions) -> Result<Message, StoreError> {
        let queue_name = options.queue_name();
        let no_message = || StoreError::NoMessage(queue_name.to_string());
        let now = Instant::now();

        let mut queue = self.queues.get_mut(queue_name).ok_or_else(no_message)?;
        queue.drop_expired(now);

        match options.action() {
            Action::Browse => {
                let i = queue
                    .position(|m| options.matches_visible(m, now))
                    .ok_or_else(no_message)?;
                Ok(queue.messages[i].clone())
            }
            Action::Get => {
                let i = queue
                    .position(|m| options.matches_visible(m, now))
                    .ok_or_else(no_message)?;
                let message = queue.messages.remove(i).ok_or_else(no_message)?;
                info!(queue = %queue_name, mid = %message.mid(), "Got message");
                Ok(message)
            }
            Action::Reserve => {
                let duration = options
                    .reservation()
                    .ok_or(OptionsError::MissingParameter("reservation_seconds"))?;
                let until = now
                    .checked_add(duration)
                    .ok_or(OptionsError::InvalidParameter("reservation_seconds"))?;
                let i = queue
                    .position(|m| options.matches_visible(m, now))
                    .ok_or_else(no_message)?;
                let message = &mut queue.messages[i];
                message.reserve_until(until);
                info!(
                    queue = %queue_name,
                    mid = %message.mid(),
                    seconds = duration.as_secs(),
                    "Reserved message"
                );
                Ok(message.clone())
            }
            Action::Confirm => {
                let i = queue
                    .position(|m| options.matches_reserved(m, now))
                    .ok_or_else(no_message)?;
                let message = queue.messages.remove(i).ok_or_else(no_message)?;
                info!(queue = %queue_name, mid = %message.mid(), "Confirmed message");
                Ok(message)
            }
            Action::Return => {
                let i = queue
                    .position(|m| options.matches_reserved(m, now))
                    .ok_or_else(no_message)?;
                let message = &mut queue.messages[i];
                message.release();
                info!(queue = %queue_name, mid = %message.mid(), "Returned message");
                Ok(message.clone())
            }
            Action::Query => Err(OptionsError::InvalidParameter("action").into()),
        }
    }

    async fn queue_summary(&self, queue_name: &QueueName) -> Result<QueueSummary, StoreError> {
        self.queues
            .get(queue_name)
            .map(|q| q.summary(queue_name, Instant::now()))
            .ok_or_else(|| StoreError::QueueNotFound(queue_name.to_string()))
    }

    async fn queue_summaries(&self) -> Result<Vec<QueueSummary>, StoreError> {
        let now = Instant::now();
        let mut summaries: Vec<QueueSummary> = self
            .queues
            .iter()
            .map(|q| q.value().summary(q.key(), now))
            .collect();
        summaries.sort_by(|a, b| a.queue_name.cmp(&b.queue_name));
        Ok(summaries)
    }

    async fn list_queues(&self) -> Result<Vec<QueueName>, StoreError> {
        let mut names: Vec<QueueName> = self.queues.iter().map(|q| q.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        Ok(self
            .queues
            .iter_mut()
            .map(|mut q| q.value_mut().drop_expired(now))
            .sum())
    }
}
