//! Storage contract for pulse.
//!
//! The persistence technology is an external collaborator; this crate pins
//! down the interface the core consumes and ships an in-memory reference
//! backend used by the standalone server and the test suites.
//!
//! # Example
//!
//! ```
//! use pulse_store::{MemoryStore, NewMessage, SeedUser, Store};
//!
//! # async fn example() -> Result<(), pulse_store::StoreError> {
//! let store = MemoryStore::from_seed([SeedUser::new("u1", "Ada"), SeedUser::new("u2", "Ben")]);
//!
//! let message = store
//!     .create_message(NewMessage::new("u1", "u2", "hello", false))
//!     .await?;
//! assert_eq!(message.sender_id, "u1");
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod models;
mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{Message, NewMessage, SeedUser, User};
pub use traits::Store;
