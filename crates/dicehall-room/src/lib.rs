//! Room lifecycle and game engine for Dicehall.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! roster, betting ledger, settings, chat, and round scheduler.
//!
//! # Key types
//!
//! - [`GameRoom`] — the synchronous game engine for one room
//! - [`PlayerRoster`] — membership and color allocation
//! - [`BettingLedger`] — bet bookkeeping and payout computation
//! - [`RoomRegistry`] — creates/retires rooms, code-keyed lookup
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomError`] — everything a room operation can reject

mod actor;
mod error;
mod ledger;
mod registry;
mod room;
mod roster;

pub use actor::{LeaveSummary, PlayerSender, RoomHandle, RoomInfo};
pub use error::RoomError;
pub use ledger::BettingLedger;
pub use registry::RoomRegistry;
pub use room::{
    GameRoom, LeaveOutcome, MIN_PLAYERS, ROUND_LIMIT_RANGE, RoundAdvance,
    STARTING_BALANCE_RANGE, TIME_LIMIT_RANGE,
};
pub use roster::{MAX_PLAYERS, PALETTE, Player, PlayerRoster};
