//! Event payloads published by the authority worker.

use serde::{Deserialize, Serialize};
use stellar_core::{PlayerName, Turn, TurnNumber, TurnReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A turn was applied to the authoritative registry.
    ///
    /// `turn` holds every action that was attempted, in application order;
    /// clients replay it against their replica.
    Applied { turn: Turn, report: TurnReport },

    /// The registry was replaced wholesale; subscribers must resync.
    SnapshotLoaded { next_turn: TurnNumber },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyEvent {
    PlayerJoined {
        player: PlayerName,
        nickname: String,
    },
    PlayerLeft {
        player: PlayerName,
    },
}
