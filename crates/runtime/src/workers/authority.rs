//! Authority worker that owns the authoritative [`Registry`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), applies
//! turns one at a time, and publishes events to the EventBus. The command
//! channel is the only way in, so turn application is never interleaved.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use stellar_core::{Action, Player, PlayerName, Registry, Turn, TurnNumber, TurnReport};
use stellar_protocol::{JoinAccepted, ServerInfo, StateSnapshot};

use crate::aggregator::TurnAggregator;
use crate::api::{JoinRejection, Result, RuntimeError};
use crate::events::{Event, EventBus, LobbyEvent, TurnEvent};

/// Commands that can be sent to the authority worker
pub enum Command {
    /// Buffer a player's actions for the current step.
    SubmitActions {
        player: PlayerName,
        actions: Vec<Action>,
        reply: oneshot::Sender<Result<usize>>,
    },
    /// Flush the aggregator into the next turn and apply it.
    CloseStep {
        reply: oneshot::Sender<TurnReport>,
    },
    /// Apply a ready-made turn; its number must be the next expected one.
    ApplyTurn {
        turn: Turn,
        reply: oneshot::Sender<Result<TurnReport>>,
    },
    Join {
        nickname: String,
        reply: oneshot::Sender<Result<JoinAccepted>>,
    },
    /// Drop a departed player's buffered actions.
    Leave {
        player: PlayerName,
        reply: oneshot::Sender<usize>,
    },
    /// Query the current state (read-only copy).
    QuerySnapshot {
        reply: oneshot::Sender<StateSnapshot>,
    },
    /// Replace the registry and turn counter wholesale.
    LoadSnapshot {
        snapshot: StateSnapshot,
        reply: oneshot::Sender<()>,
    },
    QueryServerInfo {
        reply: oneshot::Sender<ServerInfo>,
    },
}

/// Lobby-level limits the worker enforces.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub server_name: String,
    pub max_players: usize,
    pub max_actions_per_step: usize,
}

/// Background task that processes gameplay commands.
pub struct AuthorityWorker {
    registry: Registry,
    next_turn: TurnNumber,
    aggregator: TurnAggregator,
    settings: SessionSettings,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl AuthorityWorker {
    pub fn new(
        snapshot: StateSnapshot,
        settings: SessionSettings,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            target: "runtime::authority",
            players = snapshot.registry.player_count(),
            next_turn = snapshot.next_turn.0,
            "AuthorityWorker initialized"
        );

        Self {
            registry: snapshot.registry,
            next_turn: snapshot.next_turn,
            aggregator: TurnAggregator::with_limit(settings.max_actions_per_step),
            settings,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop. Ends once every handle has been dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }

        debug!(target: "runtime::authority", "command channel closed, worker exiting");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SubmitActions {
                player,
                actions,
                reply,
            } => {
                let result = self.handle_submission(player, actions);
                if reply.send(result).is_err() {
                    debug!("SubmitActions reply channel closed (caller dropped)");
                }
            }
            Command::CloseStep { reply } => {
                let turn = self.aggregator.flush(self.next_turn, &self.registry);
                let report = self.apply(turn);
                if reply.send(report).is_err() {
                    debug!("CloseStep reply channel closed (caller dropped)");
                }
            }
            Command::ApplyTurn { turn, reply } => {
                let result = self.handle_turn(turn);
                if reply.send(result).is_err() {
                    debug!("ApplyTurn reply channel closed (caller dropped)");
                }
            }
            Command::Join { nickname, reply } => {
                let result = self.handle_join(&nickname);
                if reply.send(result).is_err() {
                    debug!("Join reply channel closed (caller dropped)");
                }
            }
            Command::Leave { player, reply } => {
                let dropped = self.aggregator.discard(&player);
                info!(
                    target: "runtime::authority",
                    player = %player,
                    dropped,
                    "player left"
                );
                self.event_bus
                    .publish(Event::Lobby(LobbyEvent::PlayerLeft { player }));
                if reply.send(dropped).is_err() {
                    debug!("Leave reply channel closed (caller dropped)");
                }
            }
            Command::QuerySnapshot { reply } => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("QuerySnapshot reply channel closed (caller dropped)");
                }
            }
            Command::LoadSnapshot { snapshot, reply } => {
                self.handle_load(snapshot);
                if reply.send(()).is_err() {
                    debug!("LoadSnapshot reply channel closed (caller dropped)");
                }
            }
            Command::QueryServerInfo { reply } => {
                if reply.send(self.server_info()).is_err() {
                    debug!("QueryServerInfo reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn handle_submission(&mut self, player: PlayerName, actions: Vec<Action>) -> Result<usize> {
        if !self.registry.has_player(&player) {
            return Err(RuntimeError::UnknownPlayer(player));
        }
        let count = actions.len();
        let pending = self.aggregator.submit(&player, actions).inspect_err(|error| {
            warn!(target: "runtime::authority", %error, "submission refused");
        })?;
        debug!(
            target: "runtime::authority",
            player = %player,
            count,
            pending,
            "actions buffered"
        );
        Ok(pending)
    }

    fn handle_turn(&mut self, turn: Turn) -> Result<TurnReport> {
        if turn.number != self.next_turn {
            warn!(
                target: "runtime::authority",
                expected = self.next_turn.0,
                received = turn.number.0,
                "rejecting out-of-sequence turn"
            );
            return Err(RuntimeError::TurnOutOfSequence {
                expected: self.next_turn,
                received: turn.number,
            });
        }
        Ok(self.apply(turn))
    }

    /// Applies `turn`, advances the counter and broadcasts the result.
    fn apply(&mut self, turn: Turn) -> TurnReport {
        let report = turn.apply_to(&mut self.registry);
        self.next_turn = turn.number.next();

        if report.is_clean() {
            info!(
                target: "runtime::authority",
                turn = turn.number.0,
                applied = report.applied.len(),
                "turn applied"
            );
        } else {
            warn!(
                target: "runtime::authority",
                turn = turn.number.0,
                applied = report.applied.len(),
                skipped = report.skipped.len(),
                "turn applied with skipped actions"
            );
        }

        self.event_bus.publish(Event::Turn(TurnEvent::Applied {
            turn,
            report: report.clone(),
        }));

        report
    }

    fn handle_join(&mut self, nickname: &str) -> Result<JoinAccepted> {
        let nickname = nickname.trim();
        let base = player_slug(nickname).ok_or(JoinRejection::EmptyNickname)?;

        if self.registry.player_count() >= self.settings.max_players {
            return Err(JoinRejection::SessionFull {
                max: self.settings.max_players,
            }
            .into());
        }

        let player = self.unused_name(&base);
        self.registry
            .add_player(Player::new(player.clone(), nickname))?;

        info!(
            target: "runtime::authority",
            player = %player,
            nickname,
            "player joined"
        );
        self.event_bus.publish(Event::Lobby(LobbyEvent::PlayerJoined {
            player: player.clone(),
            nickname: nickname.to_string(),
        }));

        Ok(JoinAccepted { player })
    }

    fn unused_name(&self, base: &str) -> PlayerName {
        let mut candidate = PlayerName::new(base);
        let mut suffix = 2;
        while self.registry.has_player(&candidate) {
            candidate = PlayerName::new(format!("{base}-{suffix}"));
            suffix += 1;
        }
        candidate
    }

    fn handle_load(&mut self, snapshot: StateSnapshot) {
        let dropped = self.aggregator.len();
        self.aggregator.clear();
        self.registry = snapshot.registry;
        self.next_turn = snapshot.next_turn;

        info!(
            target: "runtime::authority",
            players = self.registry.player_count(),
            next_turn = self.next_turn.0,
            dropped,
            "snapshot loaded"
        );
        self.event_bus
            .publish(Event::Turn(TurnEvent::SnapshotLoaded {
                next_turn: self.next_turn,
            }));
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            next_turn: self.next_turn,
            registry: self.registry.clone(),
        }
    }

    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.settings.server_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            players: self.registry.player_count(),
            max_players: self.settings.max_players,
            next_turn: self.next_turn,
        }
    }
}

/// Lower-case identity derived from a nickname: runs of anything other than
/// ASCII letters and digits collapse to a single `-`. `None` if nothing
/// usable remains.
pub(crate) fn player_slug(nickname: &str) -> Option<String> {
    let mut slug = String::with_capacity(nickname.len());
    for c in nickname.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    (!slug.is_empty()).then_some(slug)
}
