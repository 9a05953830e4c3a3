//! Error types for the room layer.
//!
//! Validation and state errors on a client request are returned to that
//! request's acknowledgement only — never broadcast, never a mutation.

use dicehall_protocol::{Face, PlayerId, RoomCode, SettingKind};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A room with this code already exists.
    #[error("room {0} already exists")]
    DuplicateRoom(RoomCode),

    /// The room does not exist.
    #[error("room {0} does not exist")]
    RoomNotFound(RoomCode),

    /// The room has no player slots left.
    #[error("room {0} is already full")]
    RoomFull(RoomCode),

    /// The operation requires the lobby, but a game is running.
    #[error("the game has already started")]
    GameInProgress,

    /// The operation requires a running game.
    #[error("no game is currently running")]
    GameNotActive,

    /// Starting a game needs at least this many players.
    #[error("at least {0} players are needed to start")]
    NotEnoughPlayers(usize),

    /// The color pool is exhausted. Unreachable while the player cap is
    /// no larger than the palette.
    #[error("no colors left to assign")]
    NoColorsAvailable,

    /// The player is not a member of this room.
    #[error("player {0} is not in the room")]
    PlayerNotFound(PlayerId),

    /// A setting value outside its permitted range.
    #[error("{setting} must be between {min} and {max}")]
    InvalidSetting {
        setting: SettingKind,
        min: i64,
        max: i64,
    },

    /// A bet amount that is not positive or exceeds the player's balance.
    #[error("bet amount must be positive and within your balance")]
    InvalidAmount,

    /// A bankrupt player tried to bet.
    #[error("player {0} is bankrupt and cannot bet")]
    PlayerBankrupt(PlayerId),

    /// No matching bet entry to remove.
    #[error("no bet of {amount} on {face} to remove")]
    BetNotFound { face: Face, amount: i64 },

    /// Bets are only accepted while the betting phase is open.
    #[error("betting is closed")]
    BettingClosed,

    /// The room's actor has shut down; its command channel is gone.
    #[error("room {0} has closed")]
    RoomClosed(RoomCode),
}
