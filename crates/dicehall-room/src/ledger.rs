//! Per-room bet bookkeeping and payout computation.
//!
//! The ledger holds at most one entry per (player, face) pair — repeated
//! bets on the same face merge by summing. Stakes are escrowed at bet
//! time: the caller deducts balance and net when a placement succeeds, and
//! settlement only ever adds winnings back.

use dicehall_protocol::{Bet, Face, PlayerId};

use crate::RoomError;

/// The betting ledger for one room, cleared at every settlement.
#[derive(Debug, Default)]
pub struct BettingLedger {
    bets: Vec<Bet>,
}

impl BettingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a stake of `amount` on `face`.
    ///
    /// `available` is the player's current balance; the stake must fit in
    /// it because it is escrowed immediately.
    ///
    /// # Errors
    /// `InvalidAmount` if `amount <= 0` or `amount > available`.
    pub fn place(
        &mut self,
        player: PlayerId,
        face: Face,
        amount: i64,
        available: i64,
    ) -> Result<(), RoomError> {
        if amount <= 0 || amount > available {
            return Err(RoomError::InvalidAmount);
        }
        match self.entry_mut(player, face) {
            Some(bet) => bet.amount += amount,
            None => self.bets.push(Bet {
                player,
                face,
                amount,
            }),
        }
        Ok(())
    }

    /// Takes `amount` back off the player's stake on `face`.
    ///
    /// The exact inverse of [`place`](Self::place): the caller refunds
    /// balance and net symmetrically, so place-then-remove is an identity.
    ///
    /// # Errors
    /// `BetNotFound` if there is no entry on that face, or the entry is
    /// smaller than `amount`.
    pub fn remove(
        &mut self,
        player: PlayerId,
        face: Face,
        amount: i64,
    ) -> Result<(), RoomError> {
        let bet = self
            .entry_mut(player, face)
            .filter(|bet| bet.amount >= amount && amount > 0)
            .ok_or(RoomError::BetNotFound { face, amount })?;
        bet.amount -= amount;
        self.bets.retain(|bet| bet.amount > 0);
        Ok(())
    }

    /// Computes each player's winnings for a roll.
    ///
    /// Occurrence multipliers are assigned in rolled order: the first die
    /// showing a face is worth ×2, every repeat of that face ×1. A bet on
    /// a face gains `amount × (sum of that face's multipliers)` — so a
    /// face appearing k times pays back stake×(k+1) against the escrowed
    /// stake, i.e. profit of stake×k.
    pub fn settle(&self, dice: &[Face; 3]) -> Vec<(PlayerId, i64)> {
        let mut multipliers: Vec<(Face, i64)> = Vec::with_capacity(3);
        for (index, die) in dice.iter().enumerate() {
            let repeat = dice[..index].contains(die);
            let weight = if repeat { 1 } else { 2 };
            match multipliers.iter_mut().find(|(face, _)| face == die) {
                Some((_, sum)) => *sum += weight,
                None => multipliers.push((*die, weight)),
            }
        }

        let mut gains: Vec<(PlayerId, i64)> = Vec::new();
        for bet in &self.bets {
            let Some((_, sum)) =
                multipliers.iter().find(|(face, _)| *face == bet.face)
            else {
                continue;
            };
            let win = bet.amount * sum;
            match gains.iter_mut().find(|(id, _)| *id == bet.player) {
                Some((_, total)) => *total += win,
                None => gains.push((bet.player, win)),
            }
        }
        gains
    }

    /// Drops every entry (round settled).
    pub fn clear(&mut self) {
        self.bets.clear();
    }

    /// Drops a leaver's entries without refund.
    pub fn forfeit(&mut self, player: PlayerId) {
        self.bets.retain(|bet| bet.player != player);
    }

    /// Whether the player has any stake this round.
    pub fn has_bet(&self, player: PlayerId) -> bool {
        self.bets.iter().any(|bet| bet.player == player)
    }

    /// All current entries, in placement order.
    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    fn entry_mut(
        &mut self,
        player: PlayerId,
        face: Face,
    ) -> Option<&mut Bet> {
        self.bets
            .iter_mut()
            .find(|bet| bet.player == player && bet.face == face)
    }
}

// =========================================================================
// Tests
// =========================================================================
