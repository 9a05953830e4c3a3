//! Per-connection handler: event decoding, routing, and acks.
//!
//! Each accepted connection gets its own Tokio task. The flow is:
//!   1. Send `Welcome` so the client learns its player id
//!   2. Loop: decode a `ClientEvent`, dispatch it, ack the requester
//!   3. On close: leave the current room (roster/host/state broadcasts
//!      follow from the room actor)
//!
//! A second task pumps the player's broadcast channel onto the socket,
//! so room-driven traffic (timers, dice, results) flows while the main
//! loop is parked waiting for the next client message.

use std::sync::Arc;

use dicehall_protocol::{ClientEvent, Codec, PlayerId, RoomCode, ServerEvent};
use dicehall_room::PlayerSender;
use dicehall_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::DicehallError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DicehallError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let player_id = PlayerId(conn.id().into_inner());
    tracing::debug!(player = %player_id, "handling new connection");

    // Everything this player receives — acks and room broadcasts alike —
    // goes through one channel, so ordering is preserved end to end.
    let (tx, rx) = mpsc::unbounded_channel::<ServerEvent>();
    let writer = spawn_writer(Arc::clone(&conn), state.codec.clone(), rx);

    let _ = tx.send(ServerEvent::Welcome { id: player_id });

    // The room this connection is currently a member of.
    let mut joined: Option<RoomCode> = None;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(player = %player_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(player = %player_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                // Malformed input costs the sender an error ack, nothing
                // more.
                let _ = tx.send(ServerEvent::rejected(e.to_string()));
                continue;
            }
        };

        let ack = dispatch(&state, player_id, &tx, &mut joined, event).await;
        let _ = tx.send(match ack {
            Ok(()) => ServerEvent::ok(),
            Err(e) => ServerEvent::rejected(e.to_string()),
        });
    }

    // Implicit disconnect: leave the room; the actor broadcasts the
    // updated roster, host change, and game state to the survivors.
    if let Some(code) = joined {
        let mut registry = state.registry.lock().await;
        if let Err(e) = registry.leave(&code, player_id).await {
            tracing::debug!(
                player = %player_id,
                error = %e,
                "leave on disconnect failed"
            );
        }
    }

    // With our sender and the room's copy gone, the writer drains and
    // exits on its own.
    drop(tx);
    let _ = writer.await;
    Ok(())
}

/// Spawns the task that pumps outbound events onto the socket.
fn spawn_writer<C>(
    conn: Arc<WebSocketConnection>,
    codec: C,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) -> tokio::task::JoinHandle<()>
where
    C: Codec,
{
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if conn.send(&bytes).await.is_err() {
                // Peer is gone; the disconnect path cleans up.
                break;
            }
        }
    })
}

/// Routes one client event. The returned result becomes the ack.
async fn dispatch<C>(
    state: &Arc<ServerState<C>>,
    player_id: PlayerId,
    tx: &PlayerSender,
    joined: &mut Option<RoomCode>,
    event: ClientEvent,
) -> Result<(), DicehallError>
where
    C: Codec,
{
    match event {
        ClientEvent::Host { name, code } => {
            if joined.is_some() {
                return Err(already_in_room());
            }
            let code = RoomCode::parse(&code)?;
            let mut registry = state.registry.lock().await;
            let handle = registry.create(code.clone(), player_id)?;
            if let Err(e) =
                handle.join(player_id, name, tx.clone()).await
            {
                // The fresh room never got its host; retire it.
                registry.forget(&code);
                return Err(e.into());
            }
            *joined = Some(code);
            Ok(())
        }

        ClientEvent::Join { name, code } => {
            if joined.is_some() {
                return Err(already_in_room());
            }
            let code = RoomCode::parse(&code)?;
            let handle =
                state.registry.lock().await.handle(&code)?;
            handle.join(player_id, name, tx.clone()).await?;
            *joined = Some(code);
            Ok(())
        }

        ClientEvent::Check { code } => {
            let code = RoomCode::parse(&code)?;
            state.registry.lock().await.check(&code).await?;
            Ok(())
        }

        // Everything else is a room operation for the current room.
        event => {
            let code = joined.as_ref().ok_or_else(not_in_room)?;
            let handle = state.registry.lock().await.handle(code)?;
            handle.request(player_id, event).await?;
            Ok(())
        }
    }
}

fn already_in_room() -> DicehallError {
    dicehall_protocol::ProtocolError::InvalidMessage(
        "already in a room".into(),
    )
    .into()
}

fn not_in_room() -> DicehallError {
    dicehall_protocol::ProtocolError::InvalidMessage(
        "join a room first".into(),
    )
    .into()
}
