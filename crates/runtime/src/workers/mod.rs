//! Worker tasks that back the runtime orchestration.
//!
//! The authority worker owns the registry; everything else talks to it
//! through [`Command`]s.

mod authority;

pub use authority::{AuthorityWorker, Command, SessionSettings};
