//! # Dicehall server
//!
//! A server-authoritative engine for a round-based, multi-room betting
//! dice game: players join a short-lived room by code, stake on symbolic
//! dice faces each round, three dice are revealed, payouts land, and the
//! game runs a fixed number of rounds or until everyone is bankrupt.
//!
//! This crate is the outermost layer: it accepts WebSocket connections,
//! decodes [`ClientEvent`](dicehall_protocol::ClientEvent)s, routes them
//! to room actors, and acks every request. All game rules live in
//! [`dicehall_room`]; all timing in [`dicehall_round`].

mod error;
mod handler;
mod server;

pub use error::DicehallError;
pub use server::{DicehallServer, DicehallServerBuilder};
