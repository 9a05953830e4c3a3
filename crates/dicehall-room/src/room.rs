//! The game engine for a single room.
//!
//! `GameRoom` aggregates the roster, the ledger, the settings, and the
//! round/timer/dice counters, and exposes every mutation as a validated
//! operation. It is plain synchronous state — the actor task around it
//! owns timing and broadcasting, so everything here is directly testable.

use dicehall_protocol::{
    Face, PlayerId, PlayerView, RoomCode, RoomSnapshot, SettingKind,
    Settings,
};
use rand::Rng;

use crate::{BettingLedger, Player, PlayerRoster, RoomError, roster};

/// Valid range for the betting countdown, in seconds.
pub const TIME_LIMIT_RANGE: (i64, i64) = (10, 60);
/// Valid range for the number of rounds.
pub const ROUND_LIMIT_RANGE: (i64, i64) = (1, 20);
/// Valid range for the starting balance.
pub const STARTING_BALANCE_RANGE: (i64, i64) = (1, 1000);

/// Minimum players required to start a game.
pub const MIN_PLAYERS: usize = 2;

/// What a player removal left behind.
#[derive(Debug)]
pub struct LeaveOutcome {
    /// The removed player.
    pub removed: Player,
    /// Set when the leaver was host and a successor was elected.
    pub new_host: Option<PlayerId>,
    /// The room must be destroyed when the last player is gone.
    pub roster_empty: bool,
}

/// Where the game goes after a settled round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundAdvance {
    /// The next round's number.
    Next(u32),
    /// Round limit exceeded or every player bankrupt.
    GameOver,
}

/// One room's complete game state.
#[derive(Debug)]
pub struct GameRoom {
    code: RoomCode,
    host: PlayerId,
    active: bool,
    settings: Settings,
    round: u32,
    timer: i32,
    dice: Vec<Face>,
    roster: PlayerRoster,
    ledger: BettingLedger,
}

impl GameRoom {
    /// A fresh room in the lobby. `host` is the creator; they still join
    /// through [`add_player`](Self::add_player) like everyone else.
    pub fn new(code: RoomCode, host: PlayerId) -> Self {
        let settings = Settings::default();
        Self {
            code,
            host,
            active: false,
            settings,
            round: 1,
            timer: settings.time_limit,
            dice: Vec::new(),
            roster: PlayerRoster::new(),
            ledger: BettingLedger::new(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn timer(&self) -> i32 {
        self.timer
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    pub fn dice(&self) -> &[Face] {
        &self.dice
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Adds a player to the lobby.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: String,
    ) -> Result<&Player, RoomError> {
        if self.active {
            return Err(RoomError::GameInProgress);
        }
        if self.roster.len() >= roster::MAX_PLAYERS {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        self.roster.add(id, name)
    }

    /// Removes a player at any phase.
    ///
    /// Their outstanding bets are forfeited, not refunded. If the host
    /// left and players remain, the first remaining player (join order)
    /// becomes host within this same operation.
    pub fn remove_player(
        &mut self,
        id: PlayerId,
    ) -> Result<LeaveOutcome, RoomError> {
        let removed = self.roster.remove(id)?;
        self.ledger.forfeit(id);

        let mut new_host = None;
        if self.roster.is_empty() {
            return Ok(LeaveOutcome {
                removed,
                new_host,
                roster_empty: true,
            });
        }
        if self.host == id {
            if let Some(successor) = self.roster.first_id() {
                self.host = successor;
                new_host = Some(successor);
            }
        }
        Ok(LeaveOutcome {
            removed,
            new_host,
            roster_empty: false,
        })
    }

    // -----------------------------------------------------------------
    // Settings and game lifecycle
    // -----------------------------------------------------------------

    /// Changes a setting while in the lobby.
    ///
    /// Changing the time limit also resets the displayed timer.
    pub fn update_setting(
        &mut self,
        setting: SettingKind,
        value: i64,
    ) -> Result<i64, RoomError> {
        if self.active {
            return Err(RoomError::GameInProgress);
        }
        let (min, max) = match setting {
            SettingKind::TimeLimit => TIME_LIMIT_RANGE,
            SettingKind::RoundLimit => ROUND_LIMIT_RANGE,
            SettingKind::StartingBalance => STARTING_BALANCE_RANGE,
        };
        if value < min || value > max {
            return Err(RoomError::InvalidSetting { setting, min, max });
        }
        match setting {
            SettingKind::TimeLimit => {
                self.settings.time_limit = value as i32;
                self.timer = value as i32;
            }
            SettingKind::RoundLimit => {
                self.settings.round_limit = value as u32;
            }
            SettingKind::StartingBalance => {
                self.settings.starting_balance = value;
            }
        }
        Ok(value)
    }

    /// Starts a game: everyone gets `starting_balance`, round 1 begins.
    pub fn start_game(
        &mut self,
        starting_balance: i64,
    ) -> Result<(), RoomError> {
        if self.active {
            return Err(RoomError::GameInProgress);
        }
        if self.roster.len() < MIN_PLAYERS {
            return Err(RoomError::NotEnoughPlayers(MIN_PLAYERS));
        }
        let (min, max) = STARTING_BALANCE_RANGE;
        if starting_balance < min || starting_balance > max {
            return Err(RoomError::InvalidSetting {
                setting: SettingKind::StartingBalance,
                min,
                max,
            });
        }

        self.active = true;
        self.round = 1;
        self.timer = self.settings.time_limit;
        self.settings.starting_balance = starting_balance;
        self.dice.clear();
        self.ledger.clear();
        for player in self.roster.iter_mut() {
            player.balance = starting_balance;
            player.net = 0;
            player.rank = 1;
            player.bankrupt = false;
            player.ready = false;
        }
        Ok(())
    }

    /// Ends the game and returns the room to the lobby.
    pub fn reset_game(&mut self) {
        self.active = false;
        self.round = 1;
        self.timer = self.settings.time_limit;
        self.dice.clear();
        self.ledger.clear();
        for player in self.roster.iter_mut() {
            player.balance = 0;
            player.net = 0;
            player.rank = 1;
            player.bankrupt = false;
            player.ready = false;
        }
    }

    // -----------------------------------------------------------------
    // Betting
    // -----------------------------------------------------------------

    /// Stakes `amount` on `face`, escrowing it immediately.
    pub fn place_bet(
        &mut self,
        id: PlayerId,
        amount: i64,
        face: Face,
    ) -> Result<(), RoomError> {
        if !self.active {
            return Err(RoomError::GameNotActive);
        }
        let player = self
            .roster
            .get(id)
            .ok_or(RoomError::PlayerNotFound(id))?;
        if player.bankrupt {
            return Err(RoomError::PlayerBankrupt(id));
        }
        self.ledger.place(id, face, amount, player.balance)?;

        let player = self
            .roster
            .get_mut(id)
            .ok_or(RoomError::PlayerNotFound(id))?;
        player.balance -= amount;
        player.net -= amount;
        Ok(())
    }

    /// Takes a stake back, refunding balance and net symmetrically.
    pub fn remove_bet(
        &mut self,
        id: PlayerId,
        amount: i64,
        face: Face,
    ) -> Result<(), RoomError> {
        if !self.active {
            return Err(RoomError::GameNotActive);
        }
        if !self.roster.contains(id) {
            return Err(RoomError::PlayerNotFound(id));
        }
        self.ledger.remove(id, face, amount)?;

        let player = self
            .roster
            .get_mut(id)
            .ok_or(RoomError::PlayerNotFound(id))?;
        player.balance += amount;
        player.net += amount;
        Ok(())
    }

    /// Marks a player done betting for this round.
    pub fn set_ready(&mut self, id: PlayerId) -> Result<(), RoomError> {
        if !self.active {
            return Err(RoomError::GameNotActive);
        }
        let player = self
            .roster
            .get_mut(id)
            .ok_or(RoomError::PlayerNotFound(id))?;
        player.ready = true;
        Ok(())
    }

    /// Whether every non-bankrupt player has placed a bet or marked
    /// ready. Recomputed over the live roster on each check.
    pub fn all_eligible_ready(&self) -> bool {
        self.roster
            .iter()
            .filter(|p| !p.bankrupt)
            .all(|p| p.ready || self.ledger.has_bet(p.id))
    }

    // -----------------------------------------------------------------
    // Timer
    // -----------------------------------------------------------------

    /// Resets the countdown to the configured time limit.
    pub fn reset_timer(&mut self) -> i32 {
        self.timer = self.settings.time_limit;
        self.timer
    }

    /// Advances the countdown by one tick.
    ///
    /// The all-eligible-ready check runs FIRST and returns `None` (the
    /// end-of-phase sentinel) without decrementing — it wins over the
    /// timer expiring on the same tick, giving one deterministic exit
    /// path. Otherwise decrements and returns the new value; a negative
    /// value means the countdown has expired.
    pub fn update_timer(&mut self) -> Option<i32> {
        if self.all_eligible_ready() {
            return None;
        }
        self.timer -= 1;
        Some(self.timer)
    }

    // -----------------------------------------------------------------
    // Dice and settlement
    // -----------------------------------------------------------------

    /// Rolls three dice independently and uniformly, with replacement.
    pub fn roll_dice(&mut self, rng: &mut impl Rng) -> [Face; 3] {
        let mut roll = [Face::Deer; 3];
        for die in &mut roll {
            *die = Face::ALL[rng.random_range(0..Face::ALL.len())];
        }
        self.dice = roll.to_vec();
        roll
    }

    /// Applies the rolled dice to every bettor's net delta.
    ///
    /// During betting, net tracks the escrowed stakes as a negative
    /// balance-to-come. Settlement replaces it with the round's gross
    /// winnings — stake plus profit for each hit face, zero for misses —
    /// so a bet on a face appearing k times nets stake×(k+1) back, a
    /// profit of stake×k. No-op unless exactly three dice are rolled.
    pub fn settle(&mut self) {
        let Ok(dice) = <[Face; 3]>::try_from(self.dice.as_slice()) else {
            return;
        };
        for player in self.roster.iter_mut() {
            player.net = 0;
        }
        for (id, gain) in self.ledger.settle(&dice) {
            if let Some(player) = self.roster.get_mut(id) {
                player.net += gain;
            }
        }
    }

    /// Players sorted by this round's net delta, best first.
    pub fn round_results(&self) -> Vec<PlayerView> {
        let mut results = self.roster.views();
        results.sort_by(|a, b| b.net.cmp(&a.net));
        results
    }

    /// Banks the round: winnings land, nets reset, bets clear, and a
    /// player whose balance hit zero goes bankrupt and auto-ready.
    ///
    /// Only the positive part of net is added — losses already left the
    /// balance at bet time. Survivors' ready flags reset for the next
    /// round; bankrupt players stay ready so eligibility checks skip
    /// them.
    pub fn finalize_round(&mut self) {
        for player in self.roster.iter_mut() {
            if player.net > 0 {
                player.balance += player.net;
            }
            player.net = 0;
            if player.balance == 0 {
                player.bankrupt = true;
            }
            player.ready = player.bankrupt;
        }
        self.ledger.clear();
    }

    /// Recomputes ranks from balances, descending, with standard
    /// competition ranking: ties share a rank, and the next strictly
    /// poorer player ranks by position (1, 1, 3).
    pub fn recompute_rankings(&mut self) {
        let mut order: Vec<(PlayerId, i64)> = self
            .roster
            .iter()
            .map(|p| (p.id, p.balance))
            .collect();
        order.sort_by(|a, b| b.1.cmp(&a.1));

        let mut prev_balance = None;
        let mut prev_rank = 1;
        for (index, (id, balance)) in order.iter().enumerate() {
            let rank = match prev_balance {
                Some(prev) if *balance == prev => prev_rank,
                _ => index as u32 + 1,
            };
            prev_balance = Some(*balance);
            prev_rank = rank;
            if let Some(player) = self.roster.get_mut(*id) {
                player.rank = rank;
            }
        }
    }

    /// Players sorted by final standing (balance descending).
    pub fn standings(&self) -> Vec<PlayerView> {
        let mut standings = self.roster.views();
        standings.sort_by(|a, b| b.balance.cmp(&a.balance));
        standings
    }

    /// Whether every remaining player is bankrupt.
    pub fn all_bankrupt(&self) -> bool {
        !self.roster.is_empty()
            && self.roster.iter().all(|p| p.bankrupt)
    }

    /// Advances the round counter and decides whether the game goes on.
    pub fn advance_round(&mut self) -> RoundAdvance {
        self.round += 1;
        if self.round > self.settings.round_limit || self.all_bankrupt() {
            RoundAdvance::GameOver
        } else {
            RoundAdvance::Next(self.round)
        }
    }

    /// Clears the dice display for a new round.
    pub fn clear_dice(&mut self) {
        self.dice.clear();
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    /// An owned copy of the room's visible state at this instant.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            active: self.active,
            host: self.host,
            players: self.roster.views(),
            bets: self.ledger.bets().to_vec(),
            dice: self.dice.clone(),
            settings: self.settings,
            round: self.round,
            timer: self.timer,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
