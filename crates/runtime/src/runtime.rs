//! High-level runtime orchestrator.
//!
//! The runtime owns the authority worker, wires up command/event channels,
//! and exposes a builder-based API for the server to drive the simulation.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use stellar_core::{Registry, TurnNumber};
use stellar_protocol::StateSnapshot;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::repository::{InMemorySnapshotRepository, SnapshotRepository};
use crate::workers::{AuthorityWorker, Command, SessionSettings};

/// Main runtime that owns the authoritative simulation
///
/// [`RuntimeHandle`] provides a cloneable façade for connection tasks.
pub struct Runtime {
    handle: RuntimeHandle,
    repository: Arc<dyn SnapshotRepository>,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    pub fn repository(&self) -> &Arc<dyn SnapshotRepository> {
        &self.repository
    }

    /// Persist the current authoritative state under `name`.
    pub async fn save_snapshot(&self, name: &str) -> Result<StateSnapshot> {
        let snapshot = self.handle.query_snapshot().await?;
        self.repository.save(name, &snapshot)?;
        info!(
            target: "runtime",
            name,
            next_turn = snapshot.next_turn.0,
            "snapshot saved"
        );
        Ok(snapshot)
    }

    /// Replace the authoritative state with the snapshot saved under `name`.
    pub async fn restore_snapshot(&self, name: &str) -> Result<StateSnapshot> {
        let snapshot = self
            .repository
            .load(name)?
            .ok_or_else(|| RuntimeError::SnapshotNotFound(name.to_string()))?;
        self.handle.load_snapshot(snapshot.clone()).await?;
        Ok(snapshot)
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker exits once every clone of the handle is dropped, so
    /// outstanding clones held by connection tasks delay completion.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    state: Option<StateSnapshot>,
    repository: Option<Arc<dyn SnapshotRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            state: None,
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide the initial state; defaults to an empty registry at turn 1.
    pub fn initial_state(mut self, snapshot: StateSnapshot) -> Self {
        self.state = Some(snapshot);
        self
    }

    /// Start from `registry` at turn 1.
    pub fn initial_registry(self, registry: Registry) -> Self {
        self.initial_state(StateSnapshot {
            next_turn: TurnNumber(1),
            registry,
        })
    }

    /// Set snapshot storage; defaults to an in-memory repository.
    pub fn repository(mut self, repository: impl SnapshotRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Build the runtime and spawn its worker. Must run inside a tokio
    /// runtime.
    pub async fn build(self) -> Result<Runtime> {
        let initial_state = self.state.unwrap_or_else(|| StateSnapshot {
            next_turn: TurnNumber(1),
            registry: Registry::new(),
        });

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let worker = AuthorityWorker::new(
            initial_state,
            SessionSettings {
                server_name: self.config.server_name,
                max_players: self.config.max_players,
                max_actions_per_step: self.config.max_actions_per_step,
            },
            command_rx,
            event_bus,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemorySnapshotRepository::new()));

        Ok(Runtime {
            handle,
            repository,
            worker_handle,
        })
    }
}
