//! Room registry: creates, finds, and retires rooms by code.
//!
//! The registry is the only owner of room handles — a code-keyed map
//! with O(1) lookup, no scanning and no external aliasing of room state
//! (the state lives inside each room's actor task).

use std::collections::HashMap;

use dicehall_protocol::{PlayerId, RoomCode};
use dicehall_round::PhaseDelays;

use crate::actor::spawn_room;
use crate::{LeaveSummary, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks every live room.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    delays: PhaseDelays,
}

impl RoomRegistry {
    /// An empty registry whose rooms will pace rounds with `delays`.
    pub fn new(delays: PhaseDelays) -> Self {
        Self {
            rooms: HashMap::new(),
            delays,
        }
    }

    /// Creates a room with `host` as its designated host and returns the
    /// handle.
    ///
    /// # Errors
    /// `DuplicateRoom` if the code is already in use.
    pub fn create(
        &mut self,
        code: RoomCode,
        host: PlayerId,
    ) -> Result<RoomHandle, RoomError> {
        if self.rooms.contains_key(&code) {
            return Err(RoomError::DuplicateRoom(code));
        }
        let handle = spawn_room(
            code.clone(),
            host,
            self.delays,
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, "room created");
        Ok(handle)
    }

    /// Looks up a room's handle.
    ///
    /// # Errors
    /// `RoomNotFound` if no room has this code.
    pub fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))
    }

    /// Probes whether a room can be joined right now.
    ///
    /// # Errors
    /// `RoomNotFound`, `RoomFull`, or `GameInProgress`.
    pub async fn check(&self, code: &RoomCode) -> Result<(), RoomError> {
        let info = self.handle(code)?.info().await?;
        if info.player_count >= info.capacity {
            return Err(RoomError::RoomFull(code.clone()));
        }
        if info.active {
            return Err(RoomError::GameInProgress);
        }
        Ok(())
    }

    /// Removes a player from a room; retires the room if it emptied.
    ///
    /// Retirement is synchronous with the leave: the handle is dropped
    /// here, in the same turn the actor reports an empty roster, and the
    /// actor's exit cancels any pending round alarm.
    pub async fn leave(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
    ) -> Result<LeaveSummary, RoomError> {
        let summary = self.handle(code)?.leave(player).await?;
        if summary.roster_empty {
            self.rooms.remove(code);
            tracing::info!(room = %code, "room destroyed");
        }
        Ok(summary)
    }

    /// Drops a handle for a room whose actor already terminated.
    pub fn forget(&mut self, code: &RoomCode) {
        if self.rooms.remove(code).is_some() {
            tracing::debug!(room = %code, "room forgotten");
        }
    }

    /// The number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
