//! Wire protocol between the authoritative server and game clients.
//!
//! - `envelope`: payload canonical string plus content hash, verified on
//!   receipt
//! - `message`: typed payloads for every envelope kind
//! - `framing`: 4-byte big-endian length prefix followed by the JSON envelope
//!
//! The transport underneath is the caller's concern; framing works on any
//! tokio `AsyncRead`/`AsyncWrite`.

pub mod envelope;
pub mod framing;
pub mod message;

pub use envelope::{Envelope, EnvelopeError, EnvelopeKind};
pub use framing::{
    FrameError, MAX_FRAME_SIZE, read_envelope, read_frame, write_envelope, write_frame,
};
pub use message::{
    JoinAccepted, JoinRejected, JoinRequest, Message, PlayerEntry, PlayerList, ServerInfo,
    ServerInfoQuery, StateSnapshot,
};

/// Reliable, ordered channel for control and game traffic.
pub const DEFAULT_GAME_PORT: u16 = 51255;

/// Secondary channel for latency-sensitive traffic.
pub const DEFAULT_FAST_PORT: u16 = 51256;
