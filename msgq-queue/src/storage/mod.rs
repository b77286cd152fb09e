//! Queue storage backends

mod memory;
mod traits;


pub use memory::MemoryStore;
pub use traits::{MessageStore, StoreError};
