//! Client-to-server exchange over an in-memory stream.

use stellar_core::{
    Action, Building, BuildingType, IncrementBuildProgress, Player, Position, Prop, ReceiveIncome,
    Registry, ResourceAmount, Turn, TurnNumber,
};
use stellar_protocol::{
    Envelope, Message, StateSnapshot, read_envelope, read_frame, write_envelope, write_frame,
};
use tokio::io::duplex;

fn registry() -> (Registry, stellar_core::EntityId) {
    let mut registry = Registry::new();
    registry
        .add_player(
            Player::new("alice", "Alice").with_resources(ResourceAmount::from_iter([("metal", 10)])),
        )
        .unwrap();
    let planet = registry.allocate_id().unwrap();
    registry
        .register_prop(Prop::planet(planet, "Kepler", Position::new(3, 4)).owned_by("alice"))
        .unwrap();
    let mine = registry.allocate_id().unwrap();
    registry
        .register_building(Building::new(mine, planet, BuildingType::new("mine", 2)))
        .unwrap();
    (registry, mine)
}

#[tokio::test]
async fn turn_sent_by_client_applies_identically_on_server() {
    let (client_state, mine) = registry();
    let mut server_state = client_state.clone();
    let mut predicted = client_state.clone();

    let turn = Turn::with_actions(
        TurnNumber(1),
        vec![
            Action::new(
                "alice",
                ReceiveIncome::new(ResourceAmount::from_iter([("metal", -4)])),
            ),
            Action::new("alice", IncrementBuildProgress { building: mine }),
        ],
    );
    let local = turn.apply_to(&mut predicted);

    let (mut client, mut server) = duplex(8 * 1024);
    write_envelope(&mut client, &Message::from(turn).seal())
        .await
        .unwrap();

    let envelope = read_envelope(&mut server).await.unwrap().unwrap();
    let Some(Message::Turn(received)) = envelope.open() else {
        panic!("turn did not survive transfer");
    };
    let remote = received.apply_to(&mut server_state);

    assert_eq!(remote, local);
    assert_eq!(server_state, predicted);
    assert_eq!(server_state.state_hash(), predicted.state_hash());
}

#[tokio::test]
async fn corruption_in_transit_reads_as_not_received() {
    let (registry, _) = registry();
    let envelope = Message::from(StateSnapshot {
        next_turn: TurnNumber(5),
        registry,
    })
    .seal();

    let mut bytes = envelope.to_bytes().unwrap();
    let position = bytes
        .windows(5)
        .position(|window| window == b"metal")
        .unwrap();
    bytes[position] = b'n';

    let (mut client, mut server) = duplex(64 * 1024);
    write_frame(&mut client, &bytes).await.unwrap();

    let frame = read_frame(&mut server).await.unwrap().unwrap();
    let received = Envelope::from_bytes(&frame).unwrap();
    assert!(!received.is_intact());
    assert_eq!(received.open(), None);
}
