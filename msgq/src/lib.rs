//! msgq - in-memory HTTP message queue server
//!
//! The binary `msg_q_server` wires these pieces together; they are exposed
//! as a library so tests can build the same router in-process.

pub mod config;
pub mod router;

pub use config::Config;
pub use router::create_router;
