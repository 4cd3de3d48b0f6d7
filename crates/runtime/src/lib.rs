//! Authoritative runtime for the turn-based simulation.
//!
//! This crate wires the core rules into a single authority task, turn
//! aggregation, event broadcast and snapshot persistence. The server embeds
//! [`Runtime`] and hands a [`RuntimeHandle`] to every connection; clients
//! keep a [`ClientReplica`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream callers interact with
//! - [`events`] provides a topic-based event bus
//! - [`aggregator`] folds per-player submissions into one turn
//! - [`replica`] is the client-side state copy
//! - [`repository`] stores named snapshots
//! - [`workers`] keeps background tasks internal to the crate
pub mod aggregator;
pub mod api;
pub mod config;
pub mod events;
pub mod replica;
pub mod repository;
pub mod runtime;

mod workers;

pub use aggregator::TurnAggregator;
pub use api::{JoinRejection, Result, RuntimeError, RuntimeHandle};
pub use config::RuntimeConfig;
pub use events::{Event, EventBus, LobbyEvent, Topic, TurnEvent};
pub use replica::{ClientReplica, ReplicaError, ReplicaUpdate};
pub use repository::{
    FileSnapshotRepository, InMemorySnapshotRepository, RepositoryError, SnapshotRepository,
};
pub use runtime::{Runtime, RuntimeBuilder};
