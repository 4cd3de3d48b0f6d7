//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing. Envelope verification runs on
//! the caller's task, so a corrupted message is rejected before it ever
//! reaches the authority worker.
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::warn;

use stellar_core::{Action, PlayerName, Turn, TurnReport};
use stellar_protocol::{Envelope, EnvelopeKind, JoinAccepted, ServerInfo, StateSnapshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Buffer `player`'s actions for the current step.
    ///
    /// Every action must be created by `player`. Returns how many actions the
    /// player now has pending.
    pub async fn submit_actions(&self, player: &PlayerName, actions: Vec<Action>) -> Result<usize> {
        if let Some(foreign) = actions.iter().find(|action| &action.creator != player) {
            return Err(RuntimeError::ForeignCreator {
                player: player.clone(),
                creator: foreign.creator.clone(),
            });
        }

        self.request(|reply| Command::SubmitActions {
            player: player.clone(),
            actions,
            reply,
        })
        .await?
    }

    /// Verify a turn envelope received from `player` and buffer its actions.
    ///
    /// The client's turn number is advisory; the server decides which turn
    /// the actions land in.
    pub async fn submit_envelope(&self, player: &PlayerName, envelope: &Envelope) -> Result<usize> {
        if envelope.kind != EnvelopeKind::Turn {
            return Err(RuntimeError::UnexpectedMessage {
                expected: EnvelopeKind::Turn,
                received: envelope.kind,
            });
        }

        let turn = envelope.decode::<Turn>().map_err(|error| {
            warn!(
                target: "runtime::handle",
                player = %player,
                %error,
                "rejecting turn envelope"
            );
            RuntimeError::from(error)
        })?;

        self.submit_actions(player, turn.actions).await
    }

    /// Close the current step: flush buffered actions into the next turn
    /// and apply it.
    pub async fn close_step(&self) -> Result<TurnReport> {
        self.request(|reply| Command::CloseStep { reply }).await
    }

    /// Apply a complete turn. Its number must follow the last applied turn.
    pub async fn apply_turn(&self, turn: Turn) -> Result<TurnReport> {
        self.request(|reply| Command::ApplyTurn { turn, reply })
            .await?
    }

    pub async fn join(&self, nickname: impl Into<String>) -> Result<JoinAccepted> {
        let nickname = nickname.into();
        self.request(|reply| Command::Join { nickname, reply })
            .await?
    }

    /// Forget `player`'s buffered actions. Returns how many were dropped.
    pub async fn leave(&self, player: &PlayerName) -> Result<usize> {
        self.request(|reply| Command::Leave {
            player: player.clone(),
            reply,
        })
        .await
    }

    /// Query the current registry and turn counter (read-only copy)
    pub async fn query_snapshot(&self) -> Result<StateSnapshot> {
        self.request(|reply| Command::QuerySnapshot { reply }).await
    }

    /// Replace the authoritative state. Buffered submissions are discarded.
    pub async fn load_snapshot(&self, snapshot: StateSnapshot) -> Result<()> {
        self.request(|reply| Command::LoadSnapshot { snapshot, reply })
            .await
    }

    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.request(|reply| Command::QueryServerInfo { reply })
            .await
    }

    /// Subscribe to events from a specific topic
    ///
    /// - `Topic::Turn` - applied turns and snapshot replacements
    /// - `Topic::Lobby` - players joining and leaving
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
