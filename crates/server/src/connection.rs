//! Per-connection task: lobby handshake, then turn traffic.
//!
//! A connection starts in the lobby, where it may query server info any
//! number of times and must eventually send a join request. Once joined it
//! receives a full snapshot and the player list, then every applied turn
//! with its report. Inbound turn envelopes are verified on this task before
//! they reach the authority worker.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use stellar_core::{PlayerName, TurnNumber};
use stellar_protocol::{
    Envelope, EnvelopeKind, JoinAccepted, JoinRejected, Message, PlayerList, read_envelope,
    write_envelope,
};
use stellar_runtime::{Event, RuntimeError, RuntimeHandle, Topic, TurnEvent};

const INBOUND_BUFFER: usize = 16;

pub async fn serve<S>(stream: S, peer: SocketAddr, handle: RuntimeHandle) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let Some(player) = handshake(&mut reader, &mut writer, &handle, peer).await? else {
        debug!(target: "server::connection", %peer, "left the lobby without joining");
        return Ok(());
    };

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
    let reader_task = tokio::spawn(read_loop(reader, inbound_tx, peer));

    let result = session(&mut writer, inbound_rx, &handle, &player).await;

    reader_task.abort();
    match handle.leave(&player).await {
        Ok(dropped) => info!(
            target: "server::connection",
            %peer,
            player = %player,
            dropped,
            "connection closed"
        ),
        Err(error) => debug!(target: "server::connection", %peer, %error, "runtime gone on leave"),
    }

    result
}

/// Answers one server-info query and closes. Used on the fast port.
pub async fn answer_probe<S>(stream: S, peer: SocketAddr, handle: RuntimeHandle) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let Some(envelope) = read_envelope(&mut reader).await? else {
        return Ok(());
    };
    match envelope.open() {
        Some(Message::ServerInfoQuery(_)) => {
            let info = handle.server_info().await?;
            send(&mut writer, Message::ServerInfo(info)).await
        }
        _ => {
            warn!(target: "server::connection", %peer, kind = %envelope.kind, "unexpected probe");
            Ok(())
        }
    }
}

/// Runs the lobby exchange. `None` if the peer closed or was rejected.
async fn handshake<S>(
    reader: &mut ReadHalf<S>,
    writer: &mut WriteHalf<S>,
    handle: &RuntimeHandle,
    peer: SocketAddr,
) -> Result<Option<PlayerName>>
where
    S: AsyncRead + AsyncWrite,
{
    while let Some(envelope) = read_envelope(reader).await? {
        let Some(message) = envelope.open() else {
            continue;
        };

        match message {
            Message::ServerInfoQuery(_) => {
                let info = handle.server_info().await?;
                send(writer, Message::ServerInfo(info)).await?;
            }
            Message::JoinRequest(request) => match handle.join(request.nickname).await {
                Ok(JoinAccepted { player }) => {
                    info!(target: "server::connection", %peer, player = %player, "joined");
                    send(
                        writer,
                        Message::JoinAccepted(JoinAccepted {
                            player: player.clone(),
                        }),
                    )
                    .await?;
                    return Ok(Some(player));
                }
                Err(RuntimeError::JoinRejected(reason)) => {
                    info!(target: "server::connection", %peer, %reason, "join rejected");
                    send(
                        writer,
                        Message::JoinRejected(JoinRejected {
                            reason: reason.to_string(),
                        }),
                    )
                    .await?;
                    return Ok(None);
                }
                Err(error) => return Err(error.into()),
            },
            other => {
                warn!(
                    target: "server::connection",
                    %peer,
                    kind = %other.kind(),
                    "ignoring message before join"
                );
            }
        }
    }

    Ok(None)
}

async fn read_loop<S>(mut reader: ReadHalf<S>, inbound: mpsc::Sender<Envelope>, peer: SocketAddr)
where
    S: AsyncRead,
{
    loop {
        match read_envelope(&mut reader).await {
            Ok(Some(envelope)) => {
                if inbound.send(envelope).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(error) => {
                warn!(target: "server::connection", %peer, %error, "dropping connection");
                break;
            }
        }
    }
}

async fn session<S>(
    writer: &mut WriteHalf<S>,
    mut inbound: mpsc::Receiver<Envelope>,
    handle: &RuntimeHandle,
    player: &PlayerName,
) -> Result<()>
where
    S: AsyncWrite,
{
    // Subscribe before the snapshot so no turn falls between the two.
    let mut turns = handle.subscribe(Topic::Turn);
    let mut lobby = handle.subscribe(Topic::Lobby);

    let mut next_turn = resync(writer, handle).await?;
    send_player_list(writer, handle).await?;

    loop {
        tokio::select! {
            envelope = inbound.recv() => match envelope {
                Some(envelope) => on_inbound(writer, handle, player, envelope).await?,
                None => break,
            },
            event = turns.recv() => match event {
                Ok(Event::Turn(TurnEvent::Applied { turn, report })) => {
                    // Already covered by the snapshot this connection received.
                    if turn.number < next_turn {
                        continue;
                    }
                    next_turn = turn.number.next();
                    send(writer, Message::Turn(turn)).await?;
                    send(writer, Message::TurnReport(report)).await?;
                }
                Ok(Event::Turn(TurnEvent::SnapshotLoaded { .. })) => {
                    next_turn = resync(writer, handle).await?;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!(target: "server::connection", player = %player, missed, "lagged, resyncing");
                    next_turn = resync(writer, handle).await?;
                }
                Err(RecvError::Closed) => break,
            },
            event = lobby.recv() => match event {
                Ok(_) | Err(RecvError::Lagged(_)) => send_player_list(writer, handle).await?,
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

async fn on_inbound<S>(
    writer: &mut WriteHalf<S>,
    handle: &RuntimeHandle,
    player: &PlayerName,
    envelope: Envelope,
) -> Result<()>
where
    S: AsyncWrite,
{
    match envelope.kind {
        EnvelopeKind::Turn => match handle.submit_envelope(player, &envelope).await {
            Ok(pending) => {
                debug!(target: "server::connection", player = %player, pending, "turn accepted")
            }
            Err(error @ (RuntimeError::CommandChannelClosed | RuntimeError::ReplyChannelClosed(_))) => {
                return Err(error.into());
            }
            Err(error) => {
                warn!(target: "server::connection", player = %player, %error, "turn refused");
            }
        },
        EnvelopeKind::ServerInfoQuery => {
            if envelope.open().is_some() {
                let info = handle.server_info().await?;
                send(writer, Message::ServerInfo(info)).await?;
            }
        }
        other => {
            warn!(target: "server::connection", player = %player, kind = %other, "ignoring message");
        }
    }
    Ok(())
}

async fn resync<S>(writer: &mut WriteHalf<S>, handle: &RuntimeHandle) -> Result<TurnNumber>
where
    S: AsyncWrite,
{
    let snapshot = handle.query_snapshot().await?;
    let next_turn = snapshot.next_turn;
    send(writer, Message::Snapshot(snapshot)).await?;
    Ok(next_turn)
}

async fn send_player_list<S>(writer: &mut WriteHalf<S>, handle: &RuntimeHandle) -> Result<()>
where
    S: AsyncWrite,
{
    let snapshot = handle.query_snapshot().await?;
    send(
        writer,
        Message::PlayerList(PlayerList::from_registry(&snapshot.registry)),
    )
    .await
}

async fn send<W>(writer: &mut W, message: Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let kind = message.kind();
    write_envelope(writer, &message.seal())
        .await
        .with_context(|| format!("failed to send {kind} envelope"))
}
