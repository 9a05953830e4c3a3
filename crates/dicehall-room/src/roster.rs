//! Per-room membership and color allocation.
//!
//! The roster keeps players in join order — host succession is "first
//! remaining player" — and owns the color pool. Colors leave the front of
//! the pool on join and return to the back on leave (FIFO), so the union
//! of assigned and pooled colors is always exactly the palette.

use std::collections::VecDeque;

use dicehall_protocol::{Color, PlayerId, PlayerView};

use crate::RoomError;

/// The fixed 8-entry color palette, in allocation order.
pub const PALETTE: [&str; 8] = [
    "#c04e48", // red
    "#4a7eac", // blue
    "#d3c56e", // yellow
    "#4e9e58", // green
    "#ca7f3e", // orange
    "#7fc7b1", // teal
    "#ca709d", // pink
    "#903c9c", // purple
];

/// Maximum players per room. Never larger than the palette.
pub const MAX_PLAYERS: usize = 8;

/// A room member and their game-visible state.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: Color,
    /// Current balance; stakes are deducted here the moment a bet lands.
    pub balance: i64,
    /// Per-round profit/loss accumulator.
    pub net: i64,
    pub rank: u32,
    pub bankrupt: bool,
    pub ready: bool,
}

impl Player {
    fn new(id: PlayerId, name: String, color: Color) -> Self {
        Self {
            id,
            name,
            color,
            balance: 0,
            net: 0,
            rank: 1,
            bankrupt: false,
            ready: false,
        }
    }

    /// The wire view of this player.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            balance: self.balance,
            net: self.net,
            rank: self.rank,
            bankrupt: self.bankrupt,
            ready: self.ready,
        }
    }
}

/// Insertion-ordered membership plus the color pool.
#[derive(Debug)]
pub struct PlayerRoster {
    players: Vec<Player>,
    colors: VecDeque<Color>,
}

impl PlayerRoster {
    /// An empty roster with the full palette pooled.
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            colors: PALETTE.iter().map(|hex| Color::new(hex)).collect(),
        }
    }

    /// Adds a player, allocating the next pooled color.
    ///
    /// # Errors
    /// `RoomFull` at capacity is checked by the caller (it owns the room
    /// code for the error); here only `NoColorsAvailable` can fail, and
    /// cannot while `MAX_PLAYERS <= PALETTE.len()`.
    pub fn add(
        &mut self,
        id: PlayerId,
        name: String,
    ) -> Result<&Player, RoomError> {
        let color =
            self.colors.pop_front().ok_or(RoomError::NoColorsAvailable)?;
        self.players.push(Player::new(id, name, color));
        Ok(self.players.last().expect("just pushed this player"))
    }

    /// Removes a player and returns their color to the back of the pool.
    pub fn remove(&mut self, id: PlayerId) -> Result<Player, RoomError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(RoomError::PlayerNotFound(id))?;
        let player = self.players.remove(index);
        self.colors.push_back(player.color.clone());
        Ok(player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// The first player in join order — the host successor.
    pub fn first_id(&self) -> Option<PlayerId> {
        self.players.first().map(|p| p.id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    /// Wire views of every member, in join order.
    pub fn views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    /// Colors still in the pool, front first.
    pub fn pooled_colors(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }
}

impl Default for PlayerRoster {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn full_palette() -> HashSet<Color> {
        PALETTE.iter().map(|hex| Color::new(hex)).collect()
    }

    #[test]
    fn test_add_allocates_palette_colors_in_order() {
        let mut roster = PlayerRoster::new();
        let a = roster.add(PlayerId(1), "a".into()).unwrap().color.clone();
        let b = roster.add(PlayerId(2), "b".into()).unwrap().color.clone();
        assert_eq!(a, Color::new(PALETTE[0]));
        assert_eq!(b, Color::new(PALETTE[1]));
    }

    #[test]
    fn test_colors_partition_the_palette_at_all_times() {
        let mut roster = PlayerRoster::new();
        for i in 0..5 {
            roster.add(PlayerId(i), format!("p{i}")).unwrap();
        }
        roster.remove(PlayerId(2)).unwrap();
        roster.remove(PlayerId(4)).unwrap();
        roster.add(PlayerId(9), "late".into()).unwrap();

        let assigned: HashSet<Color> =
            roster.iter().map(|p| p.color.clone()).collect();
        let pooled: HashSet<Color> =
            roster.pooled_colors().cloned().collect();

        assert_eq!(assigned.len(), roster.len());
        assert!(assigned.is_disjoint(&pooled));
        let union: HashSet<Color> =
            assigned.union(&pooled).cloned().collect();
        assert_eq!(union, full_palette());
    }

    #[test]
    fn test_removed_color_returns_to_back_of_pool() {
        let mut roster = PlayerRoster::new();
        for i in 0..8 {
            roster.add(PlayerId(i), format!("p{i}")).unwrap();
        }
        // Pool empty; remove red's owner, then the next join gets red —
        // from the BACK of the pool (FIFO return).
        roster.remove(PlayerId(0)).unwrap();
        let rejoined = roster.add(PlayerId(99), "again".into()).unwrap();
        assert_eq!(rejoined.color, Color::new(PALETTE[0]));
    }

    #[test]
    fn test_fifo_return_order_with_partial_pool() {
        let mut roster = PlayerRoster::new();
        for i in 0..8 {
            roster.add(PlayerId(i), format!("p{i}")).unwrap();
        }
        roster.remove(PlayerId(3)).unwrap(); // green returns first
        roster.remove(PlayerId(1)).unwrap(); // then blue
        let first = roster.add(PlayerId(10), "x".into()).unwrap();
        assert_eq!(first.color, Color::new(PALETTE[3]));
        let second = roster.add(PlayerId(11), "y".into()).unwrap();
        assert_eq!(second.color, Color::new(PALETTE[1]));
    }

    #[test]
    fn test_new_player_starts_in_lobby_state() {
        let mut roster = PlayerRoster::new();
        let p = roster.add(PlayerId(1), "Alice".into()).unwrap();
        assert_eq!(p.balance, 0);
        assert_eq!(p.net, 0);
        assert_eq!(p.rank, 1);
        assert!(!p.bankrupt);
        assert!(!p.ready);
    }

    #[test]
    fn test_remove_unknown_player_fails() {
        let mut roster = PlayerRoster::new();
        assert!(matches!(
            roster.remove(PlayerId(42)),
            Err(RoomError::PlayerNotFound(PlayerId(42)))
        ));
    }

    #[test]
    fn test_first_id_follows_join_order() {
        let mut roster = PlayerRoster::new();
        roster.add(PlayerId(5), "host".into()).unwrap();
        roster.add(PlayerId(6), "second".into()).unwrap();
        assert_eq!(roster.first_id(), Some(PlayerId(5)));
        roster.remove(PlayerId(5)).unwrap();
        assert_eq!(roster.first_id(), Some(PlayerId(6)));
    }
}
