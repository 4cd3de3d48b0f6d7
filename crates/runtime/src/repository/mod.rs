//! Repository layer for saved games.
//!
//! A saved game is a [`StateSnapshot`](stellar_protocol::StateSnapshot)
//! sealed in the same hash-checked envelope used on the wire, so a damaged
//! save is detected on load exactly like a corrupted message.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileSnapshotRepository;
pub use memory::InMemorySnapshotRepository;
pub use traits::{SnapshotRepository, validate_name};
