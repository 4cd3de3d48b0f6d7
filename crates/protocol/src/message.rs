//! Typed payloads for every envelope kind.
//!
//! [`Message`] is the closed set of things that travel in an [`Envelope`].
//! `seal` wraps a message under its kind; `Envelope::open` verifies and
//! decodes the payload type the kind names.

use serde::{Deserialize, Serialize};
use stellar_core::{PlayerName, Registry, Serializable, Turn, TurnNumber, TurnReport};

use crate::envelope::{Envelope, EnvelopeKind};

/// Full state used on join and resync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Number the next applied turn will carry.
    pub next_turn: TurnNumber,
    pub registry: Registry,
}

impl Serializable for StateSnapshot {}

/// Lobby handshake. Carries the nickname only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub nickname: String,
}

impl Serializable for JoinRequest {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAccepted {
    /// Identity assigned by the server.
    pub player: PlayerName,
}

impl Serializable for JoinAccepted {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRejected {
    pub reason: String,
}

impl Serializable for JoinRejected {}

/// Empty payload; renders as `{}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfoQuery {}

impl Serializable for ServerInfoQuery {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub players: usize,
    pub max_players: usize,
    pub next_turn: TurnNumber,
}

impl Serializable for ServerInfo {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: PlayerName,
    pub nickname: String,
    pub defeated: bool,
}

/// Lobby player-list update, in join order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerList {
    pub players: Vec<PlayerEntry>,
}

impl Serializable for PlayerList {}

impl PlayerList {
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            players: registry
                .players()
                .map(|player| PlayerEntry {
                    name: player.name.clone(),
                    nickname: player.nickname.clone(),
                    defeated: player.defeated,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Snapshot(StateSnapshot),
    Turn(Turn),
    TurnReport(TurnReport),
    JoinRequest(JoinRequest),
    JoinAccepted(JoinAccepted),
    JoinRejected(JoinRejected),
    ServerInfoQuery(ServerInfoQuery),
    ServerInfo(ServerInfo),
    PlayerList(PlayerList),
}

impl Message {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Message::Snapshot(_) => EnvelopeKind::Snapshot,
            Message::Turn(_) => EnvelopeKind::Turn,
            Message::TurnReport(_) => EnvelopeKind::TurnReport,
            Message::JoinRequest(_) => EnvelopeKind::JoinRequest,
            Message::JoinAccepted(_) => EnvelopeKind::JoinAccepted,
            Message::JoinRejected(_) => EnvelopeKind::JoinRejected,
            Message::ServerInfoQuery(_) => EnvelopeKind::ServerInfoQuery,
            Message::ServerInfo(_) => EnvelopeKind::ServerInfo,
            Message::PlayerList(_) => EnvelopeKind::PlayerList,
        }
    }

    /// Wraps the payload under this message's kind.
    pub fn seal(&self) -> Envelope {
        let kind = self.kind();
        match self {
            Message::Snapshot(payload) => Envelope::wrap(kind, payload),
            Message::Turn(payload) => Envelope::wrap(kind, payload),
            Message::TurnReport(payload) => Envelope::wrap(kind, payload),
            Message::JoinRequest(payload) => Envelope::wrap(kind, payload),
            Message::JoinAccepted(payload) => Envelope::wrap(kind, payload),
            Message::JoinRejected(payload) => Envelope::wrap(kind, payload),
            Message::ServerInfoQuery(payload) => Envelope::wrap(kind, payload),
            Message::ServerInfo(payload) => Envelope::wrap(kind, payload),
            Message::PlayerList(payload) => Envelope::wrap(kind, payload),
        }
    }
}

impl Envelope {
    /// Verifies and decodes the payload named by `kind`.
    ///
    /// `None` means the message must be treated as not received.
    pub fn open(&self) -> Option<Message> {
        Some(match self.kind {
            EnvelopeKind::Snapshot => Message::Snapshot(self.unwrap()?),
            EnvelopeKind::Turn => Message::Turn(self.unwrap()?),
            EnvelopeKind::TurnReport => Message::TurnReport(self.unwrap()?),
            EnvelopeKind::JoinRequest => Message::JoinRequest(self.unwrap()?),
            EnvelopeKind::JoinAccepted => Message::JoinAccepted(self.unwrap()?),
            EnvelopeKind::JoinRejected => Message::JoinRejected(self.unwrap()?),
            EnvelopeKind::ServerInfoQuery => Message::ServerInfoQuery(self.unwrap()?),
            EnvelopeKind::ServerInfo => Message::ServerInfo(self.unwrap()?),
            EnvelopeKind::PlayerList => Message::PlayerList(self.unwrap()?),
        })
    }
}

impl From<Turn> for Message {
    fn from(turn: Turn) -> Self {
        Message::Turn(turn)
    }
}

impl From<StateSnapshot> for Message {
    fn from(snapshot: StateSnapshot) -> Self {
        Message::Snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_core::Player;

    #[test]
    fn server_info_query_has_empty_payload() {
        let envelope = Message::ServerInfoQuery(ServerInfoQuery {}).seal();
        assert_eq!(envelope.payload, "{}");
        assert_eq!(
            envelope.open(),
            Some(Message::ServerInfoQuery(ServerInfoQuery {}))
        );
    }

    #[test]
    fn join_request_carries_only_the_nickname() {
        let envelope = Message::JoinRequest(JoinRequest {
            nickname: "Alice".into(),
        })
        .seal();
        assert_eq!(envelope.payload, r#"{"nickname":"Alice"}"#);
    }

    #[test]
    fn snapshot_opens_into_a_registry() {
        let mut registry = Registry::new();
        registry.add_player(Player::new("alice", "Alice")).unwrap();
        let message = Message::Snapshot(StateSnapshot {
            next_turn: TurnNumber(3),
            registry,
        });

        assert_eq!(message.seal().open(), Some(message));
    }

    #[test]
    fn kind_decides_payload_type() {
        let mut envelope = Message::JoinRequest(JoinRequest {
            nickname: "Alice".into(),
        })
        .seal();
        envelope.kind = EnvelopeKind::Snapshot;
        assert_eq!(envelope.open(), None);
    }

    #[test]
    fn player_list_follows_join_order() {
        let mut registry = Registry::new();
        registry.add_player(Player::new("zed", "Zed")).unwrap();
        registry.add_player(Player::new("amy", "Amy")).unwrap();

        let list = PlayerList::from_registry(&registry);
        let names: Vec<_> = list.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zed", "amy"]);
    }
}
