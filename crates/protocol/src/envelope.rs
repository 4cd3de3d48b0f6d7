//! Integrity-checked transport unit.
//!
//! An [`Envelope`] carries the canonical string of a payload's value tree and
//! the content hash of that exact string. The receiver recomputes the hash
//! over the string as received; any mismatch means the payload is treated as
//! not received. There is no key involved, so this detects corruption and
//! truncation only.

use serde::{Deserialize, Serialize};
use stellar_core::{ContentHash, Json, JsonError, Serializable};
use tracing::warn;

/// What an envelope carries; decides the payload type on receipt.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnvelopeKind {
    /// Full registry state, sent on join and resync.
    Snapshot,
    Turn,
    TurnReport,
    JoinRequest,
    JoinAccepted,
    JoinRejected,
    ServerInfoQuery,
    ServerInfo,
    PlayerList,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("{kind} payload hash mismatch (sent {sent}, computed {computed})")]
    IntegrityMismatch {
        kind: EnvelopeKind,
        sent: String,
        computed: String,
    },

    #[error("{kind} payload is malformed: {source}")]
    Malformed {
        kind: EnvelopeKind,
        #[source]
        source: JsonError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: EnvelopeKind,
    /// Canonical rendering of the payload's value tree.
    pub payload: String,
    /// Hash of `payload` taken at wrap time.
    pub hash: ContentHash,
}

impl Envelope {
    /// Captures the canonical form of `entity` and its hash.
    pub fn wrap<T: Serializable>(kind: EnvelopeKind, entity: &T) -> Self {
        let payload = entity.to_json().render();
        let hash = ContentHash::of(&payload);
        Self {
            kind,
            payload,
            hash,
        }
    }

    pub fn is_intact(&self) -> bool {
        ContentHash::of(&self.payload) == self.hash
    }

    /// Verifies the hash and decodes the payload, reporting why it failed.
    pub fn decode<T: Serializable>(&self) -> Result<T, EnvelopeError> {
        let computed = ContentHash::of(&self.payload);
        if computed != self.hash {
            return Err(EnvelopeError::IntegrityMismatch {
                kind: self.kind,
                sent: self.hash.short().to_string(),
                computed: computed.short().to_string(),
            });
        }
        Json::parse(&self.payload)
            .and_then(|tree| T::from_json(&tree))
            .map_err(|source| EnvelopeError::Malformed {
                kind: self.kind,
                source,
            })
    }

    /// The payload, or `None` when it must be treated as not received.
    pub fn unwrap<T: Serializable>(&self) -> Option<T> {
        match self.decode() {
            Ok(entity) => Some(entity),
            Err(error) => {
                warn!(
                    target: "protocol::envelope",
                    kind = %self.kind,
                    %error,
                    "discarding envelope payload"
                );
                None
            }
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_core::{Action, ReceiveIncome, ResourceAmount, Turn, TurnNumber};

    fn turn() -> Turn {
        Turn::with_actions(
            TurnNumber(4),
            vec![Action::new(
                "alice",
                ReceiveIncome::new(ResourceAmount::from_iter([("metal", 5), ("gas", -2)])),
            )],
        )
    }

    #[test]
    fn wrap_then_unwrap_returns_the_entity() {
        let envelope = Envelope::wrap(EnvelopeKind::Turn, &turn());
        assert!(envelope.is_intact());
        assert_eq!(envelope.unwrap::<Turn>(), Some(turn()));
    }

    #[test]
    fn any_single_character_flip_is_rejected() {
        let envelope = Envelope::wrap(EnvelopeKind::Turn, &turn());
        let original = envelope.payload.clone().into_bytes();

        for index in 0..original.len() {
            let mut corrupted = original.clone();
            corrupted[index] = if corrupted[index] == b'x' { b'y' } else { b'x' };
            let tampered = Envelope {
                payload: String::from_utf8(corrupted).unwrap(),
                ..envelope.clone()
            };
            assert_eq!(tampered.unwrap::<Turn>(), None, "flip at {index} accepted");
        }
    }

    #[test]
    fn wrong_payload_type_is_malformed() {
        let envelope = Envelope::wrap(EnvelopeKind::Turn, &turn());
        assert!(matches!(
            envelope.decode::<stellar_core::Registry>(),
            Err(EnvelopeError::Malformed { .. })
        ));
    }

    #[test]
    fn wire_form_names_kind_in_snake_case() {
        let envelope = Envelope::wrap(EnvelopeKind::TurnReport, &stellar_core::TurnReport::default());
        let bytes = envelope.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(r#"{"kind":"turn_report","payload":"#));
        assert_eq!(Envelope::from_bytes(&bytes).unwrap(), envelope);
    }
}
