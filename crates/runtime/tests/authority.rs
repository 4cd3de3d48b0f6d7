//! Runtime behaviour through the public handle.

use stellar_core::{
    Action, Player, PlayerName, ReceiveIncome, Registry, ResourceAmount, Turn, TurnNumber,
};
use stellar_protocol::{EnvelopeKind, Message};
use stellar_runtime::{
    Event, FileSnapshotRepository, JoinRejection, LobbyEvent, Runtime, RuntimeConfig,
    RuntimeError, Topic, TurnEvent,
};

fn registry_with_alice(metal: i64) -> Registry {
    let mut registry = Registry::new();
    registry
        .add_player(
            Player::new("alice", "Alice").with_resources(ResourceAmount::from_iter([("metal", metal)])),
        )
        .unwrap();
    registry
}

fn income(metal: i64) -> Action {
    Action::new(
        "alice",
        ReceiveIncome::new(ResourceAmount::from_iter([("metal", metal)])),
    )
}

async fn alice_metal(runtime: &Runtime) -> i64 {
    let snapshot = runtime.handle().query_snapshot().await.unwrap();
    snapshot
        .registry
        .player(&"alice".into())
        .unwrap()
        .resources
        .get("metal")
}

#[tokio::test]
async fn concurrent_steps_apply_one_turn_at_a_time() {
    let runtime = Runtime::builder()
        .initial_registry(registry_with_alice(10))
        .build()
        .await
        .unwrap();
    let alice = PlayerName::new("alice");

    let mut tasks = Vec::new();
    for _ in 0..15 {
        let handle = runtime.handle();
        let alice = alice.clone();
        tasks.push(tokio::spawn(async move {
            handle.submit_actions(&alice, vec![income(-1)]).await.unwrap();
            handle.close_step().await.unwrap()
        }));
    }

    let mut turns = Vec::new();
    let mut applied = 0;
    let mut skipped = 0;
    for task in tasks {
        let report = task.await.unwrap();
        turns.push(report.turn.0);
        applied += report.applied.len();
        skipped += report.skipped.len();
    }

    turns.sort_unstable();
    assert_eq!(turns, (1..=15).collect::<Vec<_>>());
    assert_eq!(applied, 10);
    assert_eq!(skipped, 5);
    assert_eq!(alice_metal(&runtime).await, 0);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn corrupted_envelope_never_reaches_the_worker() {
    let runtime = Runtime::builder()
        .initial_registry(registry_with_alice(10))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let alice = PlayerName::new("alice");

    let mut envelope = Message::Turn(Turn::with_actions(TurnNumber(1), vec![income(5)])).seal();
    envelope.payload = envelope.payload.replace('5', "6");

    let result = handle.submit_envelope(&alice, &envelope).await;
    assert!(matches!(
        result,
        Err(RuntimeError::IntegrityCheckFailed {
            kind: EnvelopeKind::Turn
        })
    ));

    let report = handle.close_step().await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(alice_metal(&runtime).await, 10);
}

#[tokio::test]
async fn verified_envelope_lands_in_the_next_turn() {
    let runtime = Runtime::builder()
        .initial_registry(registry_with_alice(10))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let alice = PlayerName::new("alice");

    // The client's turn number is advisory.
    let envelope = Message::Turn(Turn::with_actions(TurnNumber(40), vec![income(5)])).seal();
    assert_eq!(handle.submit_envelope(&alice, &envelope).await.unwrap(), 1);

    let report = handle.close_step().await.unwrap();
    assert_eq!(report.turn, TurnNumber(1));
    assert_eq!(alice_metal(&runtime).await, 15);
}

#[tokio::test]
async fn non_turn_envelope_is_refused() {
    let runtime = Runtime::builder().build().await.unwrap();
    let envelope = Message::ServerInfoQuery(Default::default()).seal();

    let result = runtime
        .handle()
        .submit_envelope(&"alice".into(), &envelope)
        .await;
    assert!(matches!(
        result,
        Err(RuntimeError::UnexpectedMessage {
            expected: EnvelopeKind::Turn,
            received: EnvelopeKind::ServerInfoQuery,
        })
    ));
}

#[tokio::test]
async fn submissions_must_come_from_their_creator() {
    let mut registry = registry_with_alice(10);
    registry.add_player(Player::new("bob", "Bob")).unwrap();
    let runtime = Runtime::builder()
        .initial_registry(registry)
        .build()
        .await
        .unwrap();

    let result = runtime
        .handle()
        .submit_actions(&"bob".into(), vec![income(3)])
        .await;
    assert!(matches!(result, Err(RuntimeError::ForeignCreator { .. })));

    let result = runtime
        .handle()
        .submit_actions(&"carol".into(), vec![])
        .await;
    assert!(matches!(result, Err(RuntimeError::UnknownPlayer(_))));
}

#[tokio::test]
async fn turns_must_arrive_in_sequence() {
    let runtime = Runtime::builder()
        .initial_registry(registry_with_alice(10))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let early = handle
        .apply_turn(Turn::with_actions(TurnNumber(2), vec![income(1)]))
        .await;
    assert!(matches!(
        early,
        Err(RuntimeError::TurnOutOfSequence {
            expected: TurnNumber(1),
            received: TurnNumber(2),
        })
    ));

    let report = handle
        .apply_turn(Turn::with_actions(TurnNumber(1), vec![income(1)]))
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(handle.server_info().await.unwrap().next_turn, TurnNumber(2));
}

#[tokio::test]
async fn applied_turns_are_broadcast() {
    let runtime = Runtime::builder()
        .initial_registry(registry_with_alice(10))
        .build()
        .await
        .unwrap();
    let mut turns = runtime.subscribe(Topic::Turn);
    let handle = runtime.handle();

    handle
        .submit_actions(&"alice".into(), vec![income(2), income(-50)])
        .await
        .unwrap();
    handle.close_step().await.unwrap();

    let Event::Turn(TurnEvent::Applied { turn, report }) = turns.recv().await.unwrap() else {
        panic!("expected an applied turn");
    };
    assert_eq!(turn.number, TurnNumber(1));
    assert_eq!(turn.actions.len(), 2);
    assert_eq!(report.applied_indices().collect::<Vec<_>>(), vec![0]);
    assert_eq!(report.skipped_indices().collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn join_derives_unique_names_and_enforces_capacity() {
    let config = RuntimeConfig {
        max_players: 3,
        ..Default::default()
    };
    let runtime = Runtime::builder().config(config).build().await.unwrap();
    let mut lobby = runtime.subscribe(Topic::Lobby);
    let handle = runtime.handle();

    let first = handle.join("Star Lord").await.unwrap();
    let second = handle.join("star lord").await.unwrap();
    assert_eq!(first.player.as_str(), "star-lord");
    assert_eq!(second.player.as_str(), "star-lord-2");

    assert!(matches!(
        handle.join("  ?? ").await,
        Err(RuntimeError::JoinRejected(JoinRejection::EmptyNickname))
    ));

    handle.join("Gamora").await.unwrap();
    assert!(matches!(
        handle.join("Drax").await,
        Err(RuntimeError::JoinRejected(JoinRejection::SessionFull { max: 3 }))
    ));

    assert_eq!(
        lobby.recv().await.unwrap(),
        Event::Lobby(LobbyEvent::PlayerJoined {
            player: "star-lord".into(),
            nickname: "Star Lord".into(),
        })
    );

    let info = handle.server_info().await.unwrap();
    assert_eq!(info.players, 3);
    assert_eq!(info.max_players, 3);
}

#[tokio::test]
async fn flooding_a_step_is_refused_and_the_queue_kept() {
    let config = RuntimeConfig {
        max_actions_per_step: 2,
        ..Default::default()
    };
    let runtime = Runtime::builder()
        .config(config)
        .initial_registry(registry_with_alice(10))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let alice = PlayerName::new("alice");

    handle.submit_actions(&alice, vec![income(1)]).await.unwrap();
    assert!(matches!(
        handle
            .submit_actions(&alice, vec![income(1), income(1)])
            .await,
        Err(RuntimeError::StepLimitExceeded {
            pending: 1,
            limit: 2,
            ..
        })
    ));

    let report = handle.close_step().await.unwrap();
    assert_eq!(report.applied.len(), 1);
    assert_eq!(alice_metal(&runtime).await, 11);
    assert_eq!(
        handle
            .submit_actions(&alice, vec![income(1), income(1)])
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn leaving_drops_buffered_actions() {
    let runtime = Runtime::builder()
        .initial_registry(registry_with_alice(10))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let alice = PlayerName::new("alice");

    handle
        .submit_actions(&alice, vec![income(1), income(1)])
        .await
        .unwrap();
    assert_eq!(handle.leave(&alice).await.unwrap(), 2);

    let report = handle.close_step().await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(alice_metal(&runtime).await, 10);
}

#[tokio::test]
async fn snapshots_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let runtime = Runtime::builder()
        .initial_registry(registry_with_alice(10))
        .repository(FileSnapshotRepository::new(dir.path()).unwrap())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    handle
        .submit_actions(&"alice".into(), vec![income(7)])
        .await
        .unwrap();
    handle.close_step().await.unwrap();
    let saved = runtime.save_snapshot("slot1").await.unwrap();
    drop(handle);
    runtime.shutdown().await.unwrap();

    let restarted = Runtime::builder()
        .repository(FileSnapshotRepository::new(dir.path()).unwrap())
        .build()
        .await
        .unwrap();
    let mut turns = restarted.subscribe(Topic::Turn);
    let restored = restarted.restore_snapshot("slot1").await.unwrap();

    assert_eq!(restored, saved);
    assert_eq!(restored.next_turn, TurnNumber(2));
    assert_eq!(alice_metal(&restarted).await, 17);
    assert_eq!(
        turns.recv().await.unwrap(),
        Event::Turn(TurnEvent::SnapshotLoaded {
            next_turn: TurnNumber(2)
        })
    );

    assert!(matches!(
        restarted.restore_snapshot("missing").await,
        Err(RuntimeError::SnapshotNotFound(_))
    ));
}
