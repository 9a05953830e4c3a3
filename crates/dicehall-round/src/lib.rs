//! Round phase state machine and alarm scheduler for Dicehall.
//!
//! A round moves through fixed phases:
//!
//! ```text
//! Lobby → RoundIntro → Betting → Revealing → Settling → RoundEnd
//!                ↑                                         │
//!                └────────── next round ───────────────────┤
//!                                                          ▼
//!                                                       GameOver
//! ```
//!
//! Each phase advance is driven by exactly one pending [`Alarm`]. The
//! [`RoundScheduler`] owns that single deadline: arming a new alarm
//! replaces the old one, disarming cancels it, and a fired alarm names the
//! phase it belongs to so a late callback can be detected and dropped
//! instead of mutating a room it no longer owns.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a room actor's
//! `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         alarm = scheduler.wait() => { /* advance the phase */ }
//!     }
//! }
//! ```
//!
//! [`RoundScheduler::wait`] pends forever while nothing is armed, so the
//! `select!` keeps processing commands in the lobby and after game over.

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::trace;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// The lifecycle state of a room's round machine.
///
/// - **Lobby**: no round running. Pre-game, between games, and the brief
///   window after `StartGame` before the first `StartRound`.
/// - **RoundIntro**: round banner shown, dice cleared, betting not open.
/// - **Betting**: countdown ticking; bets and ready signals accepted.
/// - **Revealing**: betting closed, "time's up" notice then the dice roll.
/// - **Settling**: payouts applied to nets, results on display.
/// - **RoundEnd**: rankings recomputed, round counter advanced. Instantly
///   loops to RoundIntro or ends the game — no alarm lives here.
/// - **GameOver**: final standings shown; only `PlayAgain` leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    RoundIntro,
    Betting,
    Revealing,
    Settling,
    RoundEnd,
    GameOver,
}

impl Phase {
    /// Returns `true` while a round is in flight (an alarm should be
    /// pending).
    pub fn in_round(self) -> bool {
        matches!(
            self,
            Self::RoundIntro | Self::Betting | Self::Revealing | Self::Settling
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lobby => "Lobby",
            Self::RoundIntro => "RoundIntro",
            Self::Betting => "Betting",
            Self::Revealing => "Revealing",
            Self::Settling => "Settling",
            Self::RoundEnd => "RoundEnd",
            Self::GameOver => "GameOver",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Alarms
// ---------------------------------------------------------------------------

/// A named deadline that advances the phase machine when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alarm {
    /// End of the round-intro banner; opens betting.
    IntroOver,
    /// One-second betting countdown tick.
    BettingTick,
    /// End of the "time's up" notice; rolls the dice.
    NoticeOver,
    /// End of the dice-reveal hold; applies settlement.
    RevealOver,
    /// End of the results hold; finalizes the round.
    ResultsOver,
}

impl Alarm {
    /// The phase this alarm is only valid in. A fired alarm whose phase
    /// doesn't match the room's current phase is stale and must be a
    /// no-op.
    pub fn phase(self) -> Phase {
        match self {
            Self::IntroOver => Phase::RoundIntro,
            Self::BettingTick => Phase::Betting,
            Self::NoticeOver | Self::RevealOver => Phase::Revealing,
            Self::ResultsOver => Phase::Settling,
        }
    }
}

impl std::fmt::Display for Alarm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::IntroOver => "IntroOver",
            Self::BettingTick => "BettingTick",
            Self::NoticeOver => "NoticeOver",
            Self::RevealOver => "RevealOver",
            Self::ResultsOver => "ResultsOver",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Delays
// ---------------------------------------------------------------------------

/// How long each phase holds before its alarm fires.
///
/// The defaults pace the game for human players; tests shrink them to
/// milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct PhaseDelays {
    /// Round-intro banner hold before betting opens.
    pub intro: Duration,
    /// Betting countdown cadence.
    pub tick: Duration,
    /// "Time's up" notice hold before the dice roll.
    pub notice: Duration,
    /// Dice-reveal hold before settlement.
    pub reveal: Duration,
    /// Results hold before the round finalizes.
    pub results: Duration,
}

impl Default for PhaseDelays {
    fn default() -> Self {
        Self {
            intro: Duration::from_secs(3),
            tick: Duration::from_secs(1),
            notice: Duration::from_secs(3),
            reveal: Duration::from_millis(5500),
            results: Duration::from_secs(5),
        }
    }
}

impl PhaseDelays {
    fn for_alarm(&self, alarm: Alarm) -> Duration {
        match alarm {
            Alarm::IntroOver => self.intro,
            Alarm::BettingTick => self.tick,
            Alarm::NoticeOver => self.notice,
            Alarm::RevealOver => self.reveal,
            Alarm::ResultsOver => self.results,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Owns a room's single pending alarm.
///
/// One `RoundScheduler` per room actor. At most one deadline exists at any
/// moment: [`arm`](Self::arm) replaces whatever was pending, so duplicate
/// or overlapping phase timers cannot exist by construction. Dropping the
/// scheduler (room destruction) cancels the pending alarm with it.
pub struct RoundScheduler {
    delays: PhaseDelays,
    armed: Option<(Alarm, TokioInstant)>,
}

impl RoundScheduler {
    /// Creates a scheduler with the given phase delays.
    pub fn new(delays: PhaseDelays) -> Self {
        Self {
            delays,
            armed: None,
        }
    }

    /// The configured delays.
    pub fn delays(&self) -> &PhaseDelays {
        &self.delays
    }

    /// Schedules `alarm` to fire after its configured delay, replacing any
    /// pending alarm.
    pub fn arm(&mut self, alarm: Alarm) {
        let deadline = TokioInstant::now() + self.delays.for_alarm(alarm);
        trace!(%alarm, "alarm armed");
        self.armed = Some((alarm, deadline));
    }

    /// Cancels the pending alarm, if any. [`wait`](Self::wait) pends
    /// forever afterwards.
    pub fn disarm(&mut self) {
        if let Some((alarm, _)) = self.armed.take() {
            trace!(%alarm, "alarm disarmed");
        }
    }

    /// The currently pending alarm, if any.
    pub fn armed(&self) -> Option<Alarm> {
        self.armed.map(|(alarm, _)| alarm)
    }

    /// Waits until the pending alarm is due, then returns it (disarmed).
    ///
    /// While nothing is armed this future pends forever — inside
    /// `tokio::select!` the other branches still run. Cancel-safe: if the
    /// future is dropped before the deadline (a command branch won the
    /// select), the alarm stays armed and the next `wait` resumes it.
    pub async fn wait(&mut self) -> Alarm {
        let (alarm, deadline) = match self.armed {
            Some(pending) => pending,
            None => {
                // Never completes — select! handles other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(deadline).await;
        self.armed = None;
        trace!(%alarm, "alarm fired");
        alarm
    }
}

// =========================================================================
// Tests
// =========================================================================
