//! Wire protocol for Dicehall.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`RoomCode`], [`Face`], [`RoomSnapshot`], etc.) — the data
//!   structures that travel on the wire.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — every request a client
//!   can make and every broadcast the server can emit.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong at this layer.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! engine. It knows nothing about connections, timers, or game rules —
//! only message shapes.

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    Bet, ChatMessage, Color, Face, PlayerId, PlayerView, RoomCode,
    RoomSnapshot, SettingKind, Settings,
};
