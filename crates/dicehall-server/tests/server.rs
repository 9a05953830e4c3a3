//! End-to-end tests: a real server, real WebSocket clients, whole games.

use std::time::Duration;

use dicehall_protocol::{
    ClientEvent, Face, PlayerId, ServerEvent, SettingKind,
};
use dicehall_round::PhaseDelays;
use dicehall_server::DicehallServerBuilder;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn fast_delays() -> PhaseDelays {
    PhaseDelays {
        intro: Duration::from_millis(20),
        tick: Duration::from_millis(10),
        notice: Duration::from_millis(20),
        reveal: Duration::from_millis(20),
        results: Duration::from_millis(20),
    }
}

async fn start() -> String {
    let server = DicehallServerBuilder::new()
        .bind("127.0.0.1:0")
        .delays(fast_delays())
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// Connects and drains the Welcome event, returning the assigned id.
async fn connect(addr: &str) -> (Ws, PlayerId) {
    let (mut ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
    let ServerEvent::Welcome { id } = recv(&mut ws).await else {
        panic!("expected Welcome first");
    };
    (ws, id)
}

async fn send(ws: &mut Ws, event: &ClientEvent) {
    let data = serde_json::to_vec(event).unwrap();
    ws.send(Message::Binary(data.into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(10), ws.next())
        .await
        .expect("timed out waiting for event")
        .unwrap()
        .unwrap();
    serde_json::from_slice(&msg.into_data()).unwrap()
}

/// Reads events until one matches `pred`, discarding the rest.
async fn recv_until(
    ws: &mut Ws,
    mut pred: impl FnMut(&ServerEvent) -> bool,
) -> ServerEvent {
    loop {
        let event = recv(ws).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Reads until the next Ack and returns its error field.
async fn ack(ws: &mut Ws) -> Option<String> {
    let event =
        recv_until(ws, |e| matches!(e, ServerEvent::Ack { .. })).await;
    let ServerEvent::Ack { error } = event else { unreachable!() };
    error
}

/// Hosts a room and joins a second player, acks drained.
async fn lobby(addr: &str, code: &str) -> (Ws, PlayerId, Ws, PlayerId) {
    let (mut alice, alice_id) = connect(addr).await;
    let (mut bob, bob_id) = connect(addr).await;
    send(&mut alice, &ClientEvent::Host {
        name: "Alice".into(),
        code: code.into(),
    })
    .await;
    assert_eq!(ack(&mut alice).await, None);
    send(&mut bob, &ClientEvent::Join {
        name: "Bob".into(),
        code: code.into(),
    })
    .await;
    assert_eq!(ack(&mut bob).await, None);
    (alice, alice_id, bob, bob_id)
}

#[tokio::test]
async fn test_host_join_and_room_setup() {
    let addr = start().await;
    let (mut alice, alice_id, mut bob, _bob_id) =
        lobby(&addr, "abcdef").await;

    send(&mut bob, &ClientEvent::RoomSetup).await;

    let data = recv_until(&mut alice, |e| {
        matches!(e, ServerEvent::RoomData { .. })
    })
    .await;
    let ServerEvent::RoomData { code, host, .. } = data else {
        unreachable!()
    };
    assert_eq!(code.as_str(), "ABCDEF");
    assert_eq!(host, alice_id);

    let players = recv_until(&mut alice, |e| {
        matches!(e, ServerEvent::Players { .. })
    })
    .await;
    let ServerEvent::Players { players } = players else {
        unreachable!()
    };
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].name, "Alice");
    assert_eq!(players[1].name, "Bob");
    // Distinct palette colors in allocation order.
    assert_ne!(players[0].color, players[1].color);
}

#[tokio::test]
async fn test_duplicate_room_code_rejected() {
    let addr = start().await;
    let (mut alice, _) = connect(&addr).await;
    let (mut eve, _) = connect(&addr).await;

    send(&mut alice, &ClientEvent::Host {
        name: "Alice".into(),
        code: "SAMECD".into(),
    })
    .await;
    assert_eq!(ack(&mut alice).await, None);

    send(&mut eve, &ClientEvent::Host {
        name: "Eve".into(),
        code: "samecd".into(),
    })
    .await;
    let error = ack(&mut eve).await.expect("duplicate must be rejected");
    assert!(error.contains("already exists"), "{error}");
}

#[tokio::test]
async fn test_check_reports_room_state() {
    let addr = start().await;
    let (mut probe, _) = connect(&addr).await;

    send(&mut probe, &ClientEvent::Check {
        code: "nosuch".into(),
    })
    .await;
    let error = ack(&mut probe).await.expect("missing room");
    assert!(error.contains("does not exist"), "{error}");

    let (mut alice, _, _bob, _) = lobby(&addr, "checkk").await;
    send(&mut probe, &ClientEvent::Check {
        code: "checkk".into(),
    })
    .await;
    assert_eq!(ack(&mut probe).await, None);

    send(&mut alice, &ClientEvent::StartGame { balance: 10 }).await;
    assert_eq!(ack(&mut alice).await, None);
    send(&mut probe, &ClientEvent::Check {
        code: "checkk".into(),
    })
    .await;
    let error = ack(&mut probe).await.expect("started room");
    assert!(error.contains("already started"), "{error}");
}

#[tokio::test]
async fn test_invalid_room_code_rejected() {
    let addr = start().await;
    let (mut alice, _) = connect(&addr).await;
    send(&mut alice, &ClientEvent::Host {
        name: "Alice".into(),
        code: "abc".into(),
    })
    .await;
    let error = ack(&mut alice).await.expect("short code");
    assert!(error.contains("invalid room code"), "{error}");
}

#[tokio::test]
async fn test_setting_changes_broadcast_accepted_values() {
    let addr = start().await;
    let (mut alice, _, mut bob, _) = lobby(&addr, "settng").await;

    send(&mut alice, &ClientEvent::ChangeSetting {
        setting: SettingKind::TimeLimit,
        value: 45,
    })
    .await;
    let changed = recv_until(&mut bob, |e| {
        matches!(e, ServerEvent::SettingChanged { .. })
    })
    .await;
    assert_eq!(changed, ServerEvent::SettingChanged {
        setting: SettingKind::TimeLimit,
        value: 45,
    });

    // Out of range: error to the requester, no broadcast, no mutation.
    send(&mut alice, &ClientEvent::ChangeSetting {
        setting: SettingKind::RoundLimit,
        value: 99,
    })
    .await;
    let error = ack(&mut alice).await.expect("out of range");
    assert!(error.contains("between"), "{error}");
}

#[tokio::test]
async fn test_chat_carries_author_and_color() {
    let addr = start().await;
    let (mut alice, _, mut bob, _) = lobby(&addr, "chatty").await;

    send(&mut alice, &ClientEvent::SendMessage {
        text: "xin chào".into(),
    })
    .await;
    let chat =
        recv_until(&mut bob, |e| matches!(e, ServerEvent::Chat { .. }))
            .await;
    let ServerEvent::Chat { messages } = chat else { unreachable!() };
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].author, "Alice");
    assert_eq!(messages[0].text, "xin chào");
}

#[tokio::test]
async fn test_full_round_over_websocket() {
    let addr = start().await;
    let (mut alice, alice_id, mut bob, _) = lobby(&addr, "gamey1").await;

    send(&mut alice, &ClientEvent::StartGame { balance: 10 }).await;
    assert_eq!(ack(&mut alice).await, None);
    let start = recv_until(&mut bob, |e| {
        matches!(e, ServerEvent::GameStart { .. })
    })
    .await;
    let ServerEvent::GameStart { state } = start else { unreachable!() };
    assert!(state.players.iter().all(|p| p.balance == 10));

    send(&mut alice, &ClientEvent::StartRound).await;
    assert_eq!(ack(&mut alice).await, None);
    recv_until(&mut bob, |e| matches!(e, ServerEvent::HideRound)).await;

    // Betting open: Alice stakes 5 on Fish, Bob passes.
    send(&mut alice, &ClientEvent::Bet {
        amount: 5,
        face: Face::Fish,
    })
    .await;
    assert_eq!(ack(&mut alice).await, None);
    send(&mut bob, &ClientEvent::Ready).await;
    assert_eq!(ack(&mut bob).await, None);

    let roll = recv_until(&mut bob, |e| {
        matches!(e, ServerEvent::DiceRoll { .. })
    })
    .await;
    let ServerEvent::DiceRoll { dice } = roll else { unreachable!() };

    let state = recv_until(&mut bob, |e| {
        matches!(e, ServerEvent::NewGameState { .. })
    })
    .await;
    let ServerEvent::NewGameState { state } = state else {
        unreachable!()
    };

    // Alice's balance follows the roll: stake 5 escrowed, a face hit k
    // times returns 5×(k+1).
    let k = dice.iter().filter(|f| **f == Face::Fish).count() as i64;
    let expected = if k > 0 { 10 - 5 + 5 * (k + 1) } else { 5 };
    let alice_view = state
        .players
        .iter()
        .find(|p| p.id == alice_id)
        .expect("alice in state");
    assert_eq!(alice_view.balance, expected);
    assert!(state.bets.is_empty());

    let next = recv_until(&mut bob, |e| {
        matches!(e, ServerEvent::NextRound { .. })
    })
    .await;
    assert_eq!(next, ServerEvent::NextRound { round: 2 });
}

#[tokio::test]
async fn test_disconnect_reassigns_host_and_shrinks_roster() {
    let addr = start().await;
    let (alice, _, mut bob, bob_id) = lobby(&addr, "leaver").await;

    drop(alice); // host's socket closes

    let players = recv_until(&mut bob, |e| {
        matches!(e, ServerEvent::Players { .. })
    })
    .await;
    let ServerEvent::Players { players } = players else {
        unreachable!()
    };
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].name, "Bob");

    let new_host = recv_until(&mut bob, |e| {
        matches!(e, ServerEvent::NewHost { .. })
    })
    .await;
    assert_eq!(new_host, ServerEvent::NewHost { host: bob_id });
}

#[tokio::test]
async fn test_room_code_is_reusable_after_room_dies() {
    let addr = start().await;
    let (mut alice, _) = connect(&addr).await;
    send(&mut alice, &ClientEvent::Host {
        name: "Alice".into(),
        code: "recycl".into(),
    })
    .await;
    assert_eq!(ack(&mut alice).await, None);
    drop(alice); // last player leaves; room is destroyed

    // Give the server a beat to process the disconnect.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (mut carol, _) = connect(&addr).await;
    send(&mut carol, &ClientEvent::Host {
        name: "Carol".into(),
        code: "recycl".into(),
    })
    .await;
    assert_eq!(ack(&mut carol).await, None);
}

#[tokio::test]
async fn test_join_after_start_is_rejected() {
    let addr = start().await;
    let (mut alice, _, _bob, _) = lobby(&addr, "late01").await;
    send(&mut alice, &ClientEvent::StartGame { balance: 10 }).await;
    assert_eq!(ack(&mut alice).await, None);

    let (mut carol, _) = connect(&addr).await;
    send(&mut carol, &ClientEvent::Join {
        name: "Carol".into(),
        code: "late01".into(),
    })
    .await;
    let error = ack(&mut carol).await.expect("late join");
    assert!(error.contains("already started"), "{error}");
}

#[tokio::test]
async fn test_bet_before_round_opens_is_rejected() {
    let addr = start().await;
    let (mut alice, _, _bob, _) = lobby(&addr, "early1").await;
    send(&mut alice, &ClientEvent::StartGame { balance: 10 }).await;
    assert_eq!(ack(&mut alice).await, None);

    send(&mut alice, &ClientEvent::Bet {
        amount: 5,
        face: Face::Crab,
    })
    .await;
    let error = ack(&mut alice).await.expect("no round yet");
    assert!(error.contains("betting is closed"), "{error}");
}

#[tokio::test]
async fn test_request_without_room_is_rejected() {
    let addr = start().await;
    let (mut loner, _) = connect(&addr).await;
    send(&mut loner, &ClientEvent::Ready).await;
    let error = ack(&mut loner).await.expect("not in a room");
    assert!(error.contains("join a room first"), "{error}");
}
