//! Room actor: an isolated Tokio task that owns one game room.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel — no shared mutable state, just message
//! passing. The round scheduler's alarm is a second branch of the same
//! `select!` loop, so client commands and timer callbacks are serialized:
//! no two mutations of one room ever run concurrently, and every
//! broadcast follows full application of its mutation in the same
//! logical turn.
//!
//! Destroying a room is simply the actor returning: the scheduler (and
//! its pending alarm) drops with it, so a timer can never fire for a
//! destroyed room.

use std::collections::HashMap;

use dicehall_protocol::{ChatMessage, ClientEvent, PlayerId, RoomCode, ServerEvent};
use dicehall_round::{Alarm, Phase, PhaseDelays, RoundScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::{GameRoom, RoomError, RoundAdvance};

/// Channel sender for delivering server events to one player's
/// connection handler.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Add a player to the room.
    Join {
        id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player (disconnect or explicit leave).
    Leave {
        id: PlayerId,
        reply: oneshot::Sender<Result<LeaveSummary, RoomError>>,
    },

    /// A game request from a player; the result feeds their ack.
    Request {
        id: PlayerId,
        event: ClientEvent,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Request room metadata (for joinability checks).
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// What a leave left behind, as seen by the registry.
#[derive(Debug, Clone, Copy)]
pub struct LeaveSummary {
    /// A new host was elected.
    pub new_host: Option<PlayerId>,
    /// The roster is empty; the registry must drop this room's handle.
    pub roster_empty: bool,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub active: bool,
    pub player_count: usize,
    pub capacity: usize,
}

/// Handle to a running room actor. Cheap to clone — just an
/// `mpsc::Sender` wrapper. The registry holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))?
    }

    /// Sends a leave request to the room.
    pub async fn leave(
        &self,
        id: PlayerId,
    ) -> Result<LeaveSummary, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { id, reply: reply_tx })
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))?
    }

    /// Routes a game request from a player to the room.
    pub async fn request(
        &self,
        id: PlayerId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Request {
                id,
                event,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))?
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::RoomClosed(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: GameRoom,
    phase: Phase,
    scheduler: RoundScheduler,
    chat: Vec<ChatMessage>,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the last player leaves.
    async fn run(mut self) {
        let code = self.room.code().clone();
        tracing::info!(room = %code, "room opened");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    // All handles dropped — nobody can reach us.
                    None => break,
                },
                alarm = self.scheduler.wait() => self.on_alarm(alarm),
            }
        }

        tracing::info!(room = %code, "room closed");
    }

    /// Processes one command. Returns `true` when the room should be
    /// destroyed (roster empty).
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                id,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(id, name, sender);
                let _ = reply.send(result);
                false
            }
            RoomCommand::Leave { id, reply } => {
                let (result, destroy) = self.handle_leave(id);
                let _ = reply.send(result);
                destroy
            }
            RoomCommand::Request { id, event, reply } => {
                let result = self.handle_request(id, event);
                let _ = reply.send(result);
                false
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(RoomInfo {
                    code: self.room.code().clone(),
                    active: self.room.is_active(),
                    player_count: self.room.player_count(),
                    capacity: crate::roster::MAX_PLAYERS,
                });
                false
            }
        }
    }

    fn handle_join(
        &mut self,
        id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        self.room.add_player(id, name)?;
        tracing::info!(
            room = %self.room.code(),
            player = %id,
            players = self.room.player_count(),
            "player joined"
        );
        self.senders.insert(id, sender);
        Ok(())
    }

    fn handle_leave(
        &mut self,
        id: PlayerId,
    ) -> (Result<LeaveSummary, RoomError>, bool) {
        let outcome = match self.room.remove_player(id) {
            Ok(outcome) => outcome,
            Err(e) => return (Err(e), false),
        };
        self.senders.remove(&id);
        tracing::info!(
            room = %self.room.code(),
            player = %id,
            players = self.room.player_count(),
            "player left"
        );

        let summary = LeaveSummary {
            new_host: outcome.new_host,
            roster_empty: outcome.roster_empty,
        };
        if outcome.roster_empty {
            // The run loop breaks; the scheduler and any pending alarm
            // drop with the actor.
            return (Ok(summary), true);
        }

        self.broadcast(ServerEvent::Players {
            players: self.room.snapshot().players,
        });
        if let Some(host) = outcome.new_host {
            self.broadcast(ServerEvent::NewHost { host });
        }
        if self.room.is_active() {
            // Eligibility is recomputed over the live roster: if the
            // leaver was the last not-ready player, the next scheduled
            // tick ends the betting phase on its own.
            self.broadcast(ServerEvent::NewGameState {
                state: self.room.snapshot(),
            });
        }
        (Ok(summary), false)
    }

    fn handle_request(
        &mut self,
        id: PlayerId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        if self.room.player(id).is_none() {
            return Err(RoomError::PlayerNotFound(id));
        }

        match event {
            ClientEvent::RoomSetup => {
                self.broadcast(ServerEvent::RoomData {
                    code: self.room.code().clone(),
                    host: self.room.host(),
                    settings: self.room.settings(),
                });
                self.broadcast(ServerEvent::Players {
                    players: self.room.snapshot().players,
                });
            }

            ClientEvent::ChangeSetting { setting, value } => {
                let accepted = self.room.update_setting(setting, value)?;
                self.broadcast(ServerEvent::SettingChanged {
                    setting,
                    value: accepted,
                });
            }

            ClientEvent::StartGame { balance } => {
                self.room.start_game(balance)?;
                self.phase = Phase::Lobby;
                tracing::info!(
                    room = %self.room.code(),
                    players = self.room.player_count(),
                    "game started"
                );
                self.broadcast(ServerEvent::GameStart {
                    state: self.room.snapshot(),
                });
            }

            ClientEvent::PlayAgain => {
                self.room.reset_game();
                self.phase = Phase::Lobby;
                self.scheduler.disarm();
                tracing::info!(room = %self.room.code(), "game reset");
                self.broadcast(ServerEvent::GameRestart {
                    state: self.room.snapshot(),
                });
            }

            ClientEvent::StartRound => {
                if !self.room.is_active() {
                    return Err(RoomError::GameNotActive);
                }
                if self.phase != Phase::Lobby {
                    return Err(RoomError::GameInProgress);
                }
                self.begin_round();
            }

            ClientEvent::Bet { amount, face } => {
                if self.phase != Phase::Betting {
                    return Err(RoomError::BettingClosed);
                }
                self.room.place_bet(id, amount, face)?;
                self.broadcast(ServerEvent::NewGameState {
                    state: self.room.snapshot(),
                });
            }

            ClientEvent::Unbet { amount, face } => {
                if self.phase != Phase::Betting {
                    return Err(RoomError::BettingClosed);
                }
                self.room.remove_bet(id, amount, face)?;
                self.broadcast(ServerEvent::NewGameState {
                    state: self.room.snapshot(),
                });
            }

            ClientEvent::Ready => {
                self.room.set_ready(id)?;
                self.broadcast(ServerEvent::NewGameState {
                    state: self.room.snapshot(),
                });
            }

            ClientEvent::SendMessage { text } => {
                // Membership was checked above; author data comes from
                // the roster so names and colors can't be spoofed.
                if let Some(player) = self.room.player(id) {
                    self.chat.push(ChatMessage {
                        author: player.name.clone(),
                        color: player.color.clone(),
                        text,
                    });
                }
                self.broadcast(ServerEvent::Chat {
                    messages: self.chat.clone(),
                });
            }

            // Host/Join/Check are resolved before a command reaches the
            // actor; they cannot appear here.
            ClientEvent::Host { .. }
            | ClientEvent::Join { .. }
            | ClientEvent::Check { .. } => {
                tracing::debug!(
                    room = %self.room.code(),
                    "ignoring lobby event routed to a room"
                );
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Round flow
    // -----------------------------------------------------------------

    /// Opens a round: intro banner, cleared dice, timer display.
    fn begin_round(&mut self) {
        self.phase = Phase::RoundIntro;
        let seconds = self.room.reset_timer();
        self.room.clear_dice();
        self.broadcast(ServerEvent::Timer { seconds });
        self.broadcast(ServerEvent::ClearDice);
        self.broadcast(ServerEvent::ShowRound);
        self.scheduler.arm(Alarm::IntroOver);
    }

    /// Advances the phase machine when an alarm fires.
    ///
    /// A fired alarm that no longer matches the current phase is stale —
    /// the phase transitioned (or the game reset) between arming and
    /// firing. Stale alarms are detected no-ops: no mutation, no
    /// broadcast.
    fn on_alarm(&mut self, alarm: Alarm) {
        if alarm.phase() != self.phase {
            tracing::warn!(
                room = %self.room.code(),
                %alarm,
                phase = %self.phase,
                "stale alarm dropped"
            );
            return;
        }

        match alarm {
            Alarm::IntroOver => {
                self.phase = Phase::Betting;
                self.broadcast(ServerEvent::HideRound);
                self.scheduler.arm(Alarm::BettingTick);
            }

            Alarm::BettingTick => match self.room.update_timer() {
                // All-eligible-ready wins over the timer expiring on the
                // same tick: one deterministic exit path.
                None => self.close_betting(),
                Some(seconds) if seconds >= 0 => {
                    self.broadcast(ServerEvent::Timer { seconds });
                    self.scheduler.arm(Alarm::BettingTick);
                }
                Some(_) => self.close_betting(),
            },

            Alarm::NoticeOver => {
                self.broadcast(ServerEvent::HideTimesUp);
                let dice = self.room.roll_dice(&mut rand::rng());
                tracing::debug!(
                    room = %self.room.code(),
                    ?dice,
                    "dice rolled"
                );
                self.broadcast(ServerEvent::DiceRoll { dice });
                self.scheduler.arm(Alarm::RevealOver);
            }

            Alarm::RevealOver => {
                self.phase = Phase::Settling;
                self.room.settle();
                self.broadcast(ServerEvent::ShowResults {
                    results: self.room.round_results(),
                });
                self.scheduler.arm(Alarm::ResultsOver);
            }

            Alarm::ResultsOver => {
                self.broadcast(ServerEvent::HideResults);
                self.room.finalize_round();
                self.phase = Phase::RoundEnd;
                self.room.recompute_rankings();
                self.broadcast(ServerEvent::NewGameState {
                    state: self.room.snapshot(),
                });
                match self.room.advance_round() {
                    RoundAdvance::Next(round) => {
                        self.broadcast(ServerEvent::NextRound { round });
                        self.begin_round();
                    }
                    RoundAdvance::GameOver => {
                        self.phase = Phase::GameOver;
                        self.scheduler.disarm();
                        tracing::info!(
                            room = %self.room.code(),
                            "game over"
                        );
                        self.broadcast(ServerEvent::GameOver {
                            results: self.room.standings(),
                        });
                    }
                }
            }
        }
    }

    /// Closes betting and starts the reveal sequence.
    fn close_betting(&mut self) {
        self.phase = Phase::Revealing;
        self.broadcast(ServerEvent::ShowTimesUp);
        self.scheduler.arm(Alarm::NoticeOver);
    }

    /// Sends an event to every member. Dead receivers are dropped
    /// silently — their Leave is already in flight.
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` bounds the command channel — senders wait when it
/// fills.
pub(crate) fn spawn_room(
    code: RoomCode,
    host: PlayerId,
    delays: PhaseDelays,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: GameRoom::new(code.clone(), host),
        phase: Phase::Lobby,
        scheduler: RoundScheduler::new(delays),
        chat: Vec::new(),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
