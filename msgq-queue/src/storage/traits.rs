//! Storage backend traits

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{GetOptions, Message, NewMessage, OptionsError, QueueName, QueueSummary};

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching message in queue {0}")]
    NoMessage(String),

    #[error("queue does not exist: {0}")]
    QueueNotFound(String),

    #[error("message content is {size} bytes, limit is {limit}")]
    ContentTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("storage failure: {0}")]
    Internal(String),
}

/// Backend holding the queues.
///
/// Every method is atomic with respect to the queue it touches.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message, creating the queue if needed
    async fn create_message(
        &self,
        queue_name: &QueueName,
        message: NewMessage,
    ) -> Result<Message, StoreError>;

    /// Run a browse, get, reserve, confirm or return action
    async fn get_message(&self, options: &GetOptions) -> Result<Message, StoreError>;

    /// Depth of one queue
    async fn queue_summary(&self, queue_name: &QueueName) -> Result<QueueSummary, StoreError>;

    /// Depth of every queue, sorted by name
    async fn queue_summaries(&self) -> Result<Vec<QueueSummary>, StoreError>;

    /// Names of every queue, sorted
    async fn list_queues(&self) -> Result<Vec<QueueName>, StoreError>;

    /// Drop expired messages from every queue, returning how many went
    async fn purge_expired(&self) -> Result<usize, StoreError>;
}
