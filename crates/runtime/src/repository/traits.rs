//! Repository contract for saving and loading game snapshots.

use stellar_protocol::StateSnapshot;

use super::{RepositoryError, Result};

/// Named snapshot storage.
///
/// Names double as file stems, so they are restricted to ASCII letters,
/// digits, `-` and `_` (see [`validate_name`]).
pub trait SnapshotRepository: Send + Sync {
    /// Save a snapshot, replacing any previous one with the same name.
    fn save(&self, name: &str, snapshot: &StateSnapshot) -> Result<()>;

    /// Load a snapshot; `None` if nothing is saved under `name`.
    fn load(&self, name: &str) -> Result<Option<StateSnapshot>>;

    fn exists(&self, name: &str) -> bool;

    fn delete(&self, name: &str) -> Result<()>;

    /// List saved snapshot names in lexical order.
    fn list_names(&self) -> Result<Vec<String>>;
}

pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidName(name.to_string()))
    }
}
