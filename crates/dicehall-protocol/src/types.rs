//! Core wire types: identifiers, the dice-face alphabet, and the state
//! snapshot shapes that get broadcast to a room.
//!
//! Everything here is `Serialize + Deserialize` because it crosses the
//! network boundary. Snapshots are owned copies — the engine never hands
//! out references to live state, so a broadcast can't be retroactively
//! mutated after it is emitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// A player is a connection: the transport assigns the id when the socket
/// is accepted, and the id dies with the socket. `#[serde(transparent)]`
/// makes `PlayerId(42)` serialize as plain `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A six-character room code, normalized to ASCII uppercase.
///
/// Clients type these in, so construction goes through [`RoomCode::parse`]
/// which uppercases and validates. Once a `RoomCode` exists it is known
/// well-formed — the engine never sees a raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a room code.
    pub const LEN: usize = 6;

    /// Parses and normalizes a client-supplied code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] unless the input is
    /// exactly six ASCII alphanumeric characters.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != Self::LEN
            || !code.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ProtocolError::InvalidRoomCode(raw.to_string()));
        }
        Ok(Self(code))
    }

    /// Returns the normalized code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Dice faces
// ---------------------------------------------------------------------------

/// One of the six symbols a die can land on.
///
/// The alphabet is closed: a bet or a roll can only ever name one of these
/// six. Unknown faces fail JSON decoding at the boundary, so the engine
/// never has to reject one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Face {
    Deer,
    Gourd,
    Rooster,
    Fish,
    Crab,
    Shrimp,
}

impl Face {
    /// Every face, in canonical order.
    pub const ALL: [Face; 6] = [
        Face::Deer,
        Face::Gourd,
        Face::Rooster,
        Face::Fish,
        Face::Crab,
        Face::Shrimp,
    ];
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Face::Deer => "deer",
            Face::Gourd => "gourd",
            Face::Rooster => "rooster",
            Face::Fish => "fish",
            Face::Crab => "crab",
            Face::Shrimp => "shrimp",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Player color
// ---------------------------------------------------------------------------

/// A player's display color, as a `#rrggbb` hex string.
///
/// Colors are allocated from a fixed per-room palette; the protocol layer
/// only carries them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    /// Wraps a hex string.
    pub fn new(hex: &str) -> Self {
        Self(hex.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-room game settings, adjustable by the host while in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Betting-phase countdown, in seconds.
    pub time_limit: i32,
    /// Number of rounds in a game.
    pub round_limit: u32,
    /// Balance every player starts a game with.
    pub starting_balance: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_limit: 30,
            round_limit: 5,
            starting_balance: 10,
        }
    }
}

/// Names one of the three adjustable settings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum SettingKind {
    TimeLimit,
    RoundLimit,
    StartingBalance,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKind::TimeLimit => "time_limit",
            SettingKind::RoundLimit => "round_limit",
            SettingKind::StartingBalance => "starting_balance",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Snapshot shapes
// ---------------------------------------------------------------------------

/// One player's stake on one face.
///
/// The ledger guarantees at most one `Bet` per (player, face) pair —
/// repeated bets on the same face merge into one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub player: PlayerId,
    pub face: Face,
    pub amount: i64,
}

/// A player as seen by every client in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: Color,
    /// Current balance. Never negative — stakes are escrowed at bet time.
    pub balance: i64,
    /// Per-round profit/loss accumulator; reset after each settlement.
    pub net: i64,
    pub rank: u32,
    pub bankrupt: bool,
    pub ready: bool,
}

/// A chat line with the author's display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: String,
    pub color: Color,
    pub text: String,
}

/// An immutable copy of a room's full visible state, taken at broadcast
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub active: bool,
    pub host: PlayerId,
    pub players: Vec<PlayerView>,
    pub bets: Vec<Bet>,
    /// Empty until a roll, then exactly three faces.
    pub dice: Vec<Face>,
    pub settings: Settings,
    pub round: u32,
    pub timer: i32,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_code_parse_normalizes_to_uppercase() {
        let code = RoomCode::parse("abCdef").unwrap();
        assert_eq!(code.as_str(), "ABCDEF");
    }

    #[test]
    fn test_room_code_parse_trims_whitespace() {
        let code = RoomCode::parse("  qwerty ").unwrap();
        assert_eq!(code.as_str(), "QWERTY");
    }

    #[test]
    fn test_room_code_rejects_wrong_length() {
        assert!(RoomCode::parse("ABC").is_err());
        assert!(RoomCode::parse("ABCDEFG").is_err());
        assert!(RoomCode::parse("").is_err());
    }

    #[test]
    fn test_room_code_rejects_non_alphanumeric() {
        assert!(RoomCode::parse("AB-DEF").is_err());
        assert!(RoomCode::parse("AB DEF").is_err());
    }

    #[test]
    fn test_room_code_serializes_transparently() {
        let code = RoomCode::parse("abcdef").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"ABCDEF\"");
    }

    #[test]
    fn test_face_alphabet_has_six_distinct_symbols() {
        let mut faces = Face::ALL.to_vec();
        faces.dedup();
        assert_eq!(faces.len(), 6);
    }

    #[test]
    fn test_face_serializes_by_variant_name() {
        let json = serde_json::to_string(&Face::Shrimp).unwrap();
        assert_eq!(json, "\"Shrimp\"");
    }

    #[test]
    fn test_face_rejects_unknown_symbol() {
        // The wire-level rendering of InvalidFace: a symbol outside the
        // six-face alphabet never decodes.
        let result: Result<Face, _> = serde_json::from_str("\"Dragon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let s = Settings::default();
        assert_eq!(s.time_limit, 30);
        assert_eq!(s.round_limit, 5);
        assert_eq!(s.starting_balance, 10);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = RoomSnapshot {
            code: RoomCode::parse("abcdef").unwrap(),
            active: true,
            host: PlayerId(1),
            players: vec![PlayerView {
                id: PlayerId(1),
                name: "Alice".into(),
                color: Color::new("#c04e48"),
                balance: 10,
                net: -5,
                rank: 1,
                bankrupt: false,
                ready: false,
            }],
            bets: vec![Bet {
                player: PlayerId(1),
                face: Face::Fish,
                amount: 5,
            }],
            dice: vec![Face::Fish, Face::Crab, Face::Shrimp],
            settings: Settings::default(),
            round: 1,
            timer: 12,
        };
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let decoded: RoomSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snapshot, decoded);
    }
}
