//! Message queue engine for msgq
//!
//! Provides named in-memory queues with support for:
//! - Create (append) messages with optional correlation id and expiry
//! - Browse, Get, Reserve, Confirm, Return and Query actions
//! - Queue listing and summaries
//! - Background sweeping of expired messages

pub mod handlers;
pub mod model;
pub mod storage;
mod sweeper;

pub use handlers::QueueState;
pub use model::{
    Action, GetOptions, Message, NewMessage, OptionsError, QueueName, QueueNameEmptyError,
    QueueSummary, MAX_DURATION_SECS,
};
pub use storage::{MemoryStore, MessageStore, StoreError};
pub use sweeper::spawn_sweeper;
