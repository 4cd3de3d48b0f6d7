//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, envelope verification and
//! repositories so connection tasks can bubble them up with consistent
//! context.
use thiserror::Error;
use tokio::sync::oneshot;

use stellar_core::{PlayerName, RegistryError, TurnNumber};
use stellar_protocol::{EnvelopeError, EnvelopeKind};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("authority worker command channel closed")]
    CommandChannelClosed,

    #[error("authority worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("authority worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{kind} envelope failed its integrity check")]
    IntegrityCheckFailed { kind: EnvelopeKind },

    #[error("envelope payload could not be decoded")]
    MalformedPayload(#[source] EnvelopeError),

    #[error("expected a {expected} envelope, received {received}")]
    UnexpectedMessage {
        expected: EnvelopeKind,
        received: EnvelopeKind,
    },

    #[error("expected {expected}, received {received}")]
    TurnOutOfSequence {
        expected: TurnNumber,
        received: TurnNumber,
    },

    #[error("join rejected: {0}")]
    JoinRejected(#[from] JoinRejection),

    #[error("{player} submitted an action created by {creator}")]
    ForeignCreator {
        player: PlayerName,
        creator: PlayerName,
    },

    #[error("player {0} has not joined")]
    UnknownPlayer(PlayerName),

    /// The submission would put more than `limit` actions in the player's
    /// queue for the current step. Nothing from it was buffered.
    #[error("{player} already has {pending} actions pending this step (limit {limit})")]
    StepLimitExceeded {
        player: PlayerName,
        pending: usize,
        limit: usize,
    },

    #[error("no snapshot saved under {0:?}")]
    SnapshotNotFound(String),
}

impl From<EnvelopeError> for RuntimeError {
    fn from(error: EnvelopeError) -> Self {
        match error {
            EnvelopeError::IntegrityMismatch { kind, .. } => {
                RuntimeError::IntegrityCheckFailed { kind }
            }
            malformed @ EnvelopeError::Malformed { .. } => RuntimeError::MalformedPayload(malformed),
        }
    }
}

/// Reasons a join request is turned away. The display text is sent back to
/// the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRejection {
    #[error("nickname must contain at least one letter or digit")]
    EmptyNickname,

    #[error("session is full ({max} players)")]
    SessionFull { max: usize },
}
