//! Room actor implementation with async message handling.
//!
//! The actor owns the room, its current match, its RNG and its timers.
//! Requests and timer firings are handled one at a time, so a match is
//! never mutated by two events at once.

use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::{
    config::RoomConfig,
    messages::{CloseOutcome, MoveOutcome, RoomEvent, RoomMessage, RoomSnapshot},
    models::{Room, Seat},
    timers::{TimerFired, TimerKind, TimerTable},
};
use crate::{
    bot::{BotPlayer, choose_move},
    game::{
        entities::{GameView, Move, PlayerId, RoomId},
        errors::{GameError, GameResult},
        lifecycle::{self, RoundSummary},
        state_machine::GameState,
    },
};

/// Moves a bot may chain in one turn: declare, play a Jack, name a suit.
const MAX_BOT_STEPS: usize = 3;

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    /// Create a new room handle
    pub fn new(sender: mpsc::Sender<RoomMessage>, room_id: RoomId) -> Self {
        Self { sender, room_id }
    }

    /// Get room ID
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> GameResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::RoomClosed)
    }
}

/// Why a seat is leaving the room.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Departure {
    Left,
    GraceExpired,
}

/// Room actor managing a single room
pub struct RoomActor {
    /// Room ID
    id: RoomId,

    /// Room configuration
    config: RoomConfig,

    /// Seats and match bookkeeping that survive between rounds
    room: Room,

    /// Current (or last finished) round
    game: Option<GameState>,

    rng: StdRng,

    /// Message inbox
    inbox: mpsc::Receiver<RoomMessage>,

    /// Timer firings posted back by `timers`
    timer_rx: mpsc::Receiver<TimerFired>,

    timers: TimerTable,

    /// Set between a finished round and the next deal
    in_transition: bool,

    /// A close request arrived during a transition
    pending_close: bool,

    /// Is room closed
    is_closed: bool,

    /// Bots seated so far, used for naming
    bots_spawned: usize,

    /// Subscribers for room events
    subscribers: HashMap<String, mpsc::Sender<RoomEvent>>,

    /// Events emitted while handling the current message
    outbox: Vec<RoomEvent>,
}

impl RoomActor {
    /// Create a new room actor
    ///
    /// # Returns
    ///
    /// * `(RoomActor, RoomHandle)` - Actor and handle for sending messages
    pub fn new(id: RoomId, config: RoomConfig, created_by: Option<PlayerId>) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let (timer_tx, timer_rx) = mpsc::channel(32);

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let room = Room::new(
            id,
            config.name.clone(),
            config.max_players,
            config.is_private,
            config.max_rounds,
            created_by,
        );

        let actor = Self {
            id,
            config,
            room,
            game: None,
            rng,
            inbox,
            timer_rx,
            timers: TimerTable::new(timer_tx),
            in_transition: false,
            pending_close: false,
            is_closed: false,
            bots_spawned: 0,
            subscribers: HashMap::new(),
            outbox: Vec::new(),
        };

        (actor, RoomHandle::new(sender, id))
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        log::info!("Room {} '{}' starting", self.id, self.config.name);

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    // Every handle is gone.
                    None => break,
                },

                Some(fired) = self.timer_rx.recv() => {
                    self.outbox.clear();
                    self.handle_timer(fired);
                }
            }

            if self.is_closed {
                break;
            }
        }

        self.timers.cancel_all();
        log::info!("Room {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a room message
    fn handle_message(&mut self, message: RoomMessage) {
        self.outbox.clear();

        match message {
            RoomMessage::Join {
                player_id,
                name,
                response,
            } => {
                let result = self.handle_join(player_id, name);
                let _ = response.send(result);
            }

            RoomMessage::AddBot { response } => {
                let result = self.handle_add_bot();
                let _ = response.send(result);
            }

            RoomMessage::Leave {
                player_id,
                response,
            } => {
                let result = self.handle_leave(&player_id);
                let _ = response.send(result);
            }

            RoomMessage::SetReady {
                player_id,
                ready,
                response,
            } => {
                let result = self.handle_set_ready(&player_id, ready);
                let _ = response.send(result);
            }

            RoomMessage::StartMatch { response } => {
                let result = self.start_match();
                let _ = response.send(result);
            }

            RoomMessage::SubmitMove {
                player_id,
                mv,
                response,
            } => {
                let result = self.handle_submit_move(&player_id, mv);
                let _ = response.send(result);
            }

            RoomMessage::Disconnect {
                player_id,
                response,
            } => {
                let result = self.handle_disconnect(&player_id);
                let _ = response.send(result);
            }

            RoomMessage::Reconnect {
                player_id,
                response,
            } => {
                let result = self.handle_reconnect(&player_id);
                let _ = response.send(result);
            }

            RoomMessage::GetState { viewer, response } => {
                let _ = response.send(self.snapshot(viewer.as_ref()));
            }

            RoomMessage::Close { force, response } => {
                let _ = response.send(self.request_close(force));
            }

            RoomMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                log::debug!("{} subscribed to room {} events", subscriber_id, self.id);
                self.subscribers.insert(subscriber_id, sender);
            }

            RoomMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                log::debug!(
                    "{} unsubscribed from room {} events",
                    subscriber_id,
                    self.id
                );
            }
        }
    }

    /// Record an event and broadcast it to all subscribers
    fn emit(&mut self, event: RoomEvent) {
        self.subscribers.retain(|subscriber_id, sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {} channel full, dropping event",
                        subscriber_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", subscriber_id);
                    false
                }
            }
        });
        self.outbox.push(event);
    }

    fn emit_state(&mut self) {
        if let Some(game) = &self.game {
            let view = Box::new(game.view_for(None));
            self.emit(RoomEvent::StateUpdated {
                room_id: self.id,
                view,
            });
        }
    }

    fn snapshot(&self, viewer: Option<&PlayerId>) -> RoomSnapshot {
        RoomSnapshot {
            room: self.room.clone(),
            game: self.game.as_ref().map(|g| g.view_for(viewer)),
            round_transition: self.in_transition,
        }
    }

    fn ensure_open(&self) -> GameResult<()> {
        if self.is_closed || self.pending_close {
            return Err(GameError::RoomClosed);
        }
        Ok(())
    }

    fn ensure_seated(&self, player_id: &PlayerId) -> GameResult<()> {
        match self.room.seat(player_id) {
            Some(_) => Ok(()),
            None => Err(GameError::PlayerNotInRoom),
        }
    }

    fn handle_join(&mut self, player_id: PlayerId, name: String) -> GameResult<RoomSnapshot> {
        self.ensure_open()?;
        if self.room.seat(&player_id).is_some() {
            return Err(GameError::PlayerAlreadyInRoom);
        }
        if self.room.is_full() {
            return Err(GameError::RoomFull);
        }
        if self.room.game_in_progress {
            return Err(GameError::GameAlreadyInProgress);
        }

        self.room
            .seats
            .push(Seat::human(player_id.clone(), name.clone()));
        log::info!("Room {}: {} joined", self.id, player_id);
        self.emit(RoomEvent::PlayerJoined {
            room_id: self.id,
            player_id: player_id.clone(),
            name,
            is_bot: false,
        });

        Ok(self.snapshot(Some(&player_id)))
    }

    fn handle_add_bot(&mut self) -> GameResult<PlayerId> {
        self.ensure_open()?;
        if self.room.is_full() {
            return Err(GameError::RoomFull);
        }
        if self.room.game_in_progress {
            return Err(GameError::GameAlreadyInProgress);
        }

        self.bots_spawned += 1;
        let bot = BotPlayer::spawn(self.bots_spawned);
        self.room
            .seats
            .push(Seat::bot(bot.id.clone(), bot.name.clone()));
        log::info!("Room {}: seated {} ({})", self.id, bot.name, bot.id);
        self.emit(RoomEvent::PlayerJoined {
            room_id: self.id,
            player_id: bot.id.clone(),
            name: bot.name,
            is_bot: true,
        });

        Ok(bot.id)
    }

    fn handle_leave(&mut self, player_id: &PlayerId) -> GameResult<()> {
        self.ensure_seated(player_id)?;
        self.depart(player_id, Departure::Left);
        Ok(())
    }

    fn handle_set_ready(&mut self, player_id: &PlayerId, ready: bool) -> GameResult<RoomSnapshot> {
        self.ensure_open()?;
        if self.room.game_in_progress {
            return Err(GameError::GameAlreadyInProgress);
        }
        let seat = self
            .room
            .seat_mut(player_id)
            .ok_or(GameError::PlayerNotInRoom)?;
        seat.is_ready = ready;

        if ready && self.room.seats.len() >= 2 && self.room.all_ready() {
            log::info!("Room {}: every seat is ready, starting", self.id);
            if let Err(e) = self.start_match() {
                log::warn!("Room {}: auto-start failed: {}", self.id, e);
            }
        }

        Ok(self.snapshot(Some(player_id)))
    }

    fn start_match(&mut self) -> GameResult<GameView> {
        self.ensure_open()?;
        if self.in_transition {
            return Err(GameError::RoundTransitionInProgress);
        }

        let settings = self.config.match_settings();
        let state = lifecycle::create_match(&self.room, &settings, &mut self.rng)?;

        self.room.game_in_progress = true;
        self.room.current_round = state.current_round;
        self.room.max_rounds = state.max_rounds;
        self.room.round_winners.clear();
        for seat in &mut self.room.seats {
            seat.cumulative_score = 0;
        }

        let view = state.view_for(None);
        let starting_player = state.current_player().map(|p| p.id.clone());
        self.emit(RoomEvent::MatchStarted {
            room_id: self.id,
            match_id: state.id,
            players: state.players.iter().map(|p| p.id.clone()).collect(),
        });
        self.emit(RoomEvent::RoundStarted {
            room_id: self.id,
            round: state.current_round,
            max_rounds: state.max_rounds,
            starting_player,
        });
        self.game = Some(state);
        self.emit_state();
        self.schedule_turn_timers();

        Ok(view)
    }

    fn handle_submit_move(&mut self, player_id: &PlayerId, mv: Move) -> GameResult<MoveOutcome> {
        self.ensure_open()?;
        self.ensure_seated(player_id)?;
        if self.in_transition {
            return Err(GameError::RoundTransitionInProgress);
        }

        self.process_move(player_id, mv, false)?;

        let view = self
            .game
            .as_ref()
            .map(|g| g.view_for(Some(player_id)))
            .ok_or(GameError::GameNotStarted)?;
        Ok(MoveOutcome {
            view,
            events: std::mem::take(&mut self.outbox),
        })
    }

    /// The single path through which every move reaches the match.
    fn process_move(&mut self, player_id: &PlayerId, mv: Move, forced: bool) -> GameResult<()> {
        let Some(game) = self.game.as_mut() else {
            return Err(GameError::GameNotStarted);
        };

        let result = if forced {
            game.force_draw(player_id, &mut self.rng)
        } else {
            game.apply_move(player_id, mv, &mut self.rng)
        };

        match result {
            Ok(applied) => {
                log::debug!(
                    "Room {}: {} {}{}",
                    self.id,
                    applied.player_id,
                    applied.mv,
                    if applied.forced { " (forced)" } else { "" }
                );
                self.emit(RoomEvent::MoveResult {
                    room_id: self.id,
                    player_id: applied.player_id,
                    mv: applied.mv,
                    forced: applied.forced,
                    drawn: applied.drawn,
                });
                self.emit_state();
                self.after_move(applied.round_summary);
                Ok(())
            }
            Err(e) if e.is_rejection() => Err(e),
            Err(e) => {
                log::error!("Room {}: {}", self.id, e);
                self.emit(RoomEvent::error(self.id, &e));
                self.finish_match(false);
                Err(e)
            }
        }
    }

    fn after_move(&mut self, summary: Option<RoundSummary>) {
        let Some(summary) = summary else {
            self.schedule_turn_timers();
            return;
        };

        self.sync_room_from_game();
        self.timers.cancel(&TimerKind::TurnTimeout);
        self.timers.cancel(&TimerKind::BotTurn);

        let complete = summary.is_match_complete;
        self.emit(RoomEvent::RoundEnded {
            room_id: self.id,
            summary,
        });

        if complete {
            self.finish_match(false);
        } else {
            self.in_transition = true;
            self.timers.schedule(
                TimerKind::RoundTransition,
                self.config.round_transition_delay(),
            );
        }
    }

    /// Copy scores and round bookkeeping from the match to the seats.
    fn sync_room_from_game(&mut self) {
        let Some(game) = &self.game else {
            return;
        };
        for seat in &mut self.room.seats {
            if let Some(player) = game.player(&seat.id) {
                seat.cumulative_score = player.cumulative_score;
            }
        }
        self.room.current_round = game.current_round;
        self.room.round_winners = game.round_winners.clone();
    }

    fn finish_match(&mut self, forfeit: bool) {
        self.room.game_in_progress = false;
        self.in_transition = false;
        self.timers.cancel(&TimerKind::TurnTimeout);
        self.timers.cancel(&TimerKind::BotTurn);
        self.timers.cancel(&TimerKind::RoundTransition);

        for seat in &mut self.room.seats {
            seat.is_ready = seat.is_bot;
        }

        let (winner, standings) = match &self.game {
            Some(game) => (game.winner.clone(), lifecycle::standings(game)),
            None => (None, Vec::new()),
        };
        log::info!("Room {}: match ended, winner {:?}", self.id, winner);
        self.emit(RoomEvent::MatchEnded {
            room_id: self.id,
            winner,
            standings,
            forfeit,
        });

        if self.pending_close {
            self.close_room();
        }
    }

    /// Restart the turn timer and, for a bot seat, schedule its move.
    fn schedule_turn_timers(&mut self) {
        let Some(game) = self.game.as_ref().filter(|g| g.is_playing()) else {
            self.timers.cancel(&TimerKind::TurnTimeout);
            self.timers.cancel(&TimerKind::BotTurn);
            return;
        };
        let bot_turn = game.current_player().is_some_and(|p| p.is_bot);

        self.timers
            .schedule(TimerKind::TurnTimeout, self.config.turn_time_limit());
        if bot_turn {
            self.timers
                .schedule(TimerKind::BotTurn, self.config.bot_delay());
        } else {
            self.timers.cancel(&TimerKind::BotTurn);
        }
    }

    fn handle_timer(&mut self, fired: TimerFired) {
        if !self.timers.claim(&fired) {
            return;
        }

        match fired.kind {
            TimerKind::TurnTimeout => self.handle_turn_timeout(),
            TimerKind::BotTurn => self.run_bot_turn(),
            TimerKind::RoundTransition => self.end_round_transition(),
            TimerKind::DisconnectGrace(player_id) => self.expire_grace(&player_id),
        }
    }

    fn current_player_id(&self) -> Option<PlayerId> {
        self.game
            .as_ref()
            .filter(|g| g.is_playing())
            .and_then(|g| g.current_player())
            .map(|p| p.id.clone())
    }

    fn handle_turn_timeout(&mut self) {
        let Some(player_id) = self.current_player_id() else {
            return;
        };
        log::warn!("Room {}: {} timed out, forcing a draw", self.id, player_id);
        if let Err(e) = self.process_move(&player_id, Move::DrawCard, true) {
            log::error!("Room {}: forced draw failed: {}", self.id, e);
        }
    }

    fn run_bot_turn(&mut self) {
        let Some(bot_id) = self.current_player_id() else {
            return;
        };

        for _ in 0..MAX_BOT_STEPS {
            let Some(game) = self.game.as_ref() else {
                return;
            };
            let seat = game.current_player_index;
            let still_bot_turn = game
                .current_player()
                .is_some_and(|p| p.is_bot && p.id == bot_id);
            if !still_bot_turn || self.in_transition {
                return;
            }
            let Some(mv) = choose_move(game, seat) else {
                return;
            };

            if let Err(e) = self.process_move(&bot_id, mv, false) {
                log::warn!(
                    "Room {}: bot {} move {} rejected ({}), forcing a draw",
                    self.id,
                    bot_id,
                    mv,
                    e
                );
                if let Err(e) = self.process_move(&bot_id, Move::DrawCard, true) {
                    log::error!("Room {}: bot fallback failed: {}", self.id, e);
                }
                return;
            }
        }
    }

    fn end_round_transition(&mut self) {
        self.in_transition = false;

        if self.pending_close {
            log::info!("Room {}: round transition done, closing", self.id);
            self.close_room();
            return;
        }

        if self.room.seats.len() < 2 {
            if let Some(game) = self.game.as_mut() {
                lifecycle::forfeit(game);
            }
            self.finish_match(true);
            return;
        }

        let settings = self.config.match_settings();
        let next = match &self.game {
            Some(previous) => {
                lifecycle::start_next_round(&self.room, previous, &settings, &mut self.rng)
            }
            None => Err(GameError::GameNotStarted),
        };

        match next {
            Ok(state) => {
                self.room.current_round = state.current_round;
                self.emit(RoomEvent::RoundStarted {
                    room_id: self.id,
                    round: state.current_round,
                    max_rounds: state.max_rounds,
                    starting_player: state.current_player().map(|p| p.id.clone()),
                });
                self.game = Some(state);
                self.emit_state();
                self.schedule_turn_timers();
            }
            Err(e) => {
                log::error!("Room {}: could not deal next round: {}", self.id, e);
                self.emit(RoomEvent::error(self.id, &e));
                self.finish_match(false);
            }
        }
    }

    fn set_connected(&mut self, player_id: &PlayerId, connected: bool) {
        if let Some(seat) = self.room.seat_mut(player_id) {
            seat.is_connected = connected;
        }
        if let Some(player) = self.game.as_mut().and_then(|g| g.player_mut(player_id)) {
            player.is_connected = connected;
        }
    }

    fn handle_disconnect(&mut self, player_id: &PlayerId) -> GameResult<()> {
        let seat = self.room.seat(player_id).ok_or(GameError::PlayerNotInRoom)?;
        if seat.is_bot || !seat.is_connected {
            return Ok(());
        }

        self.set_connected(player_id, false);
        self.timers.schedule(
            TimerKind::DisconnectGrace(player_id.clone()),
            self.config.disconnect_grace(),
        );
        log::info!("Room {}: {} disconnected", self.id, player_id);
        self.emit(RoomEvent::PlayerDisconnected {
            room_id: self.id,
            player_id: player_id.clone(),
        });
        Ok(())
    }

    fn handle_reconnect(&mut self, player_id: &PlayerId) -> GameResult<RoomSnapshot> {
        let seat = self.room.seat(player_id).ok_or(GameError::PlayerNotInRoom)?;

        if !seat.is_connected {
            self.set_connected(player_id, true);
            self.timers
                .cancel(&TimerKind::DisconnectGrace(player_id.clone()));
            log::info!("Room {}: {} reconnected", self.id, player_id);
            self.emit(RoomEvent::PlayerReconnected {
                room_id: self.id,
                player_id: player_id.clone(),
            });
        }

        Ok(self.snapshot(Some(player_id)))
    }

    fn expire_grace(&mut self, player_id: &PlayerId) {
        let still_gone = self
            .room
            .seat(player_id)
            .is_some_and(|s| !s.is_connected);
        if still_gone {
            log::info!("Room {}: grace expired for {}", self.id, player_id);
            self.depart(player_id, Departure::GraceExpired);
        }
    }

    /// Take a seat out of the room and, if a match is running, out of the
    /// match as well.
    fn depart(&mut self, player_id: &PlayerId, departure: Departure) {
        let Some(seat) = self.room.remove_seat(player_id) else {
            return;
        };
        self.timers
            .cancel(&TimerKind::DisconnectGrace(player_id.clone()));

        let event = match departure {
            Departure::Left => RoomEvent::PlayerLeft {
                room_id: self.id,
                player_id: player_id.clone(),
            },
            Departure::GraceExpired => RoomEvent::PlayerRemoved {
                room_id: self.id,
                player_id: player_id.clone(),
            },
        };
        self.emit(event);

        if self.room.game_in_progress {
            if let Some(game) = self.game.as_mut() {
                game.remove_player(player_id);
            }
            // During a transition the forfeit is settled when the
            // transition ends.
            if !self.in_transition {
                if self.room.seats.len() < 2 {
                    if let Some(game) = self.game.as_mut() {
                        lifecycle::forfeit(game);
                    }
                    self.emit_state();
                    self.finish_match(true);
                } else {
                    self.emit_state();
                    self.schedule_turn_timers();
                }
            }
        }

        if !seat.is_bot && !self.room.has_humans() {
            log::info!("Room {}: no players left", self.id);
            self.request_close(false);
        }
    }

    fn request_close(&mut self, force: bool) -> CloseOutcome {
        if self.in_transition && !force {
            log::info!(
                "Room {}: deletion vetoed during round transition, deferring",
                self.id
            );
            self.pending_close = true;
            return CloseOutcome::Deferred;
        }
        self.close_room();
        CloseOutcome::Closed
    }

    fn close_room(&mut self) {
        if self.is_closed {
            return;
        }
        self.is_closed = true;
        self.timers.cancel_all();
        self.emit(RoomEvent::RoomClosed { room_id: self.id });
    }
}
