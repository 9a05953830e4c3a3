//! Client requests and server broadcasts.
//!
//! Both enums are internally tagged (`#[serde(tag = "type")]`), so a
//! request looks like `{ "type": "Bet", "amount": 5, "face": "Fish" }` on
//! the wire — easy to produce and match from a browser client.
//!
//! Delivery rules: every [`ClientEvent`] is answered with an
//! [`ServerEvent::Ack`] to the requester only; everything else a client
//! receives is a room-scoped broadcast. Errors ride in the ack and are
//! never broadcast.

use serde::{Deserialize, Serialize};

use crate::types::{
    ChatMessage, Face, PlayerId, PlayerView, RoomCode, RoomSnapshot,
    SettingKind, Settings,
};

/// Everything a client can ask the server to do.
///
/// `Host`/`Join`/`Check` carry the room code as a raw string because it is
/// user input — the server normalizes and validates it into a
/// [`RoomCode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Create a room with the given code and join it as host.
    Host { name: String, code: String },

    /// Join an existing room.
    Join { name: String, code: String },

    /// Probe whether a room can be joined (exists, not full, not started).
    Check { code: String },

    /// Ask for the lobby broadcasts (`RoomData` + `Players`) after joining.
    RoomSetup,

    /// Change a game setting. Host-adjustable, lobby only.
    ChangeSetting { setting: SettingKind, value: i64 },

    /// Start the game with the given starting balance.
    StartGame { balance: i64 },

    /// Return a finished game to the lobby.
    PlayAgain,

    /// Kick off the first round of an active game.
    StartRound,

    /// Stake `amount` on `face` for the current round.
    Bet { amount: i64, face: Face },

    /// Take a previously placed stake back.
    Unbet { amount: i64, face: Face },

    /// Declare "done betting" for this round.
    Ready,

    /// Send a chat line to the room.
    SendMessage { text: String },
}

/// Everything the server can send.
///
/// `Ack` and `Welcome` go to a single client; the rest are room-scoped
/// broadcasts. State-bearing events carry owned snapshots, never live
/// references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Sent once on connect so the client knows its own id.
    Welcome { id: PlayerId },

    /// Per-request acknowledgement. `error: None` means the request was
    /// applied; `Some(reason)` means it was rejected and nothing changed.
    Ack { error: Option<String> },

    // -- Lobby --
    /// Room identity and current settings.
    RoomData {
        code: RoomCode,
        host: PlayerId,
        settings: Settings,
    },

    /// The current roster.
    Players { players: Vec<PlayerView> },

    /// A setting change was accepted.
    SettingChanged { setting: SettingKind, value: i64 },

    /// The host left; a new one was elected.
    NewHost { host: PlayerId },

    // -- Game lifecycle --
    /// The game started; full state attached.
    GameStart { state: RoomSnapshot },

    /// The room returned to the lobby for another game.
    GameRestart { state: RoomSnapshot },

    // -- Round flow --
    /// Betting countdown tick.
    Timer { seconds: i32 },

    /// Clear the previous round's dice from display.
    ClearDice,

    /// Show the round-intro banner.
    ShowRound,

    /// Hide the round-intro banner; betting is open.
    HideRound,

    /// Betting closed; show the "time's up" notice.
    ShowTimesUp,

    /// Hide the "time's up" notice.
    HideTimesUp,

    /// The three rolled faces, in rolled order.
    DiceRoll { dice: [Face; 3] },

    /// Per-player round outcomes, sorted by net delta descending.
    ShowResults { results: Vec<PlayerView> },

    /// Hide the results overlay.
    HideResults,

    /// Full state after any mutation (bet placed, settlement applied,
    /// player left mid-game).
    NewGameState { state: RoomSnapshot },

    /// The next round is starting.
    NextRound { round: u32 },

    /// The game ended; final standings attached.
    GameOver { results: Vec<PlayerView> },

    // -- Chat --
    /// Full chat history after a new message.
    Chat { messages: Vec<ChatMessage> },
}

impl ServerEvent {
    /// An ack that reports success.
    pub fn ok() -> Self {
        ServerEvent::Ack { error: None }
    }

    /// An ack that reports a rejected request.
    pub fn rejected(reason: impl Into<String>) -> Self {
        ServerEvent::Ack {
            error: Some(reason.into()),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_client_event_is_internally_tagged() {
        let event = ClientEvent::Bet {
            amount: 5,
            face: Face::Fish,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Bet");
        assert_eq!(json["amount"], 5);
        assert_eq!(json["face"], "Fish");
    }

    #[test]
    fn test_client_event_host_round_trip() {
        let event = ClientEvent::Host {
            name: "Alice".into(),
            code: "abcdef".into(),
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_client_event_unit_variants_decode() {
        let decoded: ClientEvent =
            serde_json::from_str(r#"{"type": "Ready"}"#).unwrap();
        assert_eq!(decoded, ClientEvent::Ready);

        let decoded: ClientEvent =
            serde_json::from_str(r#"{"type": "PlayAgain"}"#).unwrap();
        assert_eq!(decoded, ClientEvent::PlayAgain);
    }

    #[test]
    fn test_client_event_bet_with_unknown_face_fails() {
        let raw = r#"{"type": "Bet", "amount": 5, "face": "Lion"}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_ack_ok_has_null_error() {
        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::ok()).unwrap();
        assert_eq!(json["type"], "Ack");
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_ack_rejected_carries_reason() {
        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::rejected("room is full"))
                .unwrap();
        assert_eq!(json["error"], "room is full");
    }

    #[test]
    fn test_dice_roll_carries_three_faces() {
        let event = ServerEvent::DiceRoll {
            dice: [Face::Deer, Face::Deer, Face::Fish],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "DiceRoll");
        assert_eq!(json["dice"], serde_json::json!(["Deer", "Deer", "Fish"]));
    }

    #[test]
    fn test_show_results_round_trip() {
        let event = ServerEvent::ShowResults {
            results: vec![PlayerView {
                id: PlayerId(3),
                name: "Bob".into(),
                color: Color::new("#4a7eac"),
                balance: 10,
                net: 20,
                rank: 1,
                bankrupt: false,
                ready: true,
            }],
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_unknown_event_type_fails_to_decode() {
        let raw = r#"{"type": "FlyToMoon", "speed": 9000}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
