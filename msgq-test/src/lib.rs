//! Test utilities for msgq
//!
//! Provides utilities for end-to-end testing against a real socket:
//! - Start/stop the server in-process on a random port
//! - A typed client for the HTTP API
//!
//! ## Usage
//!
//! ```rust,no_run
//! use msgq_test::TestServer;
//!
//! #[tokio::test]
//! async fn test_queue() {
//!     let server = TestServer::start().await.unwrap();
//!     let client = server.client();
//!
//!     client.create("orders", "hello").await.unwrap();
//!     let message = client.get("orders").await.unwrap();
//!     assert_eq!(message.unwrap().content, "hello");
//! }
//! ```

pub mod client;
pub mod server;

pub use client::{ClientError, CreateOptions, Created, MsgQClient, QueueMessage, QueueSummary};
pub use server::{TestError, TestServer};

/// Timeout for waiting on the server
pub const STARTUP_TIMEOUT_SECS: u64 = 10;
