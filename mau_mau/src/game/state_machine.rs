//! Authoritative per-room match state and its transitions.
//!
//! A [`GameState`] is mutated in place. It is only ever owned by one room
//! actor, so every transition below runs serialized with respect to the
//! room's other events.

use chrono::{DateTime, Utc};
use log::{debug, error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    constants::DECK_SIZE,
    deck,
    entities::{
        Card, Direction, GameView, MatchStatus, Move, Player, PlayerId, PlayerView, Rank,
        RoomId, SeatIndex, Suit,
    },
    errors::{GameError, GameResult},
    lifecycle::{self, RoundSummary},
    rules::{self, Effect, RuleSet},
};

/// One round of a match as seen by the room that owns it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameState {
    pub id: Uuid,
    pub room_id: RoomId,
    pub players: Vec<Player>,
    pub current_player_index: SeatIndex,
    pub direction: Direction,
    pub status: MatchStatus,
    /// Consumed from the front.
    pub draw_pile: Vec<Card>,
    /// The last element is the top card.
    pub discard_pile: Vec<Card>,
    /// Pending forced draw.
    pub draw_count: u32,
    pub skip_next: bool,
    pub wild_suit: Option<Suit>,
    /// Consecutive 7s played since the last draw.
    pub seven_stack: u32,
    pub is_first_play: bool,
    /// Seat that played a Jack and still owes a suit choice.
    pub pending_suit_choice: Option<SeatIndex>,
    pub turn_start_time: DateTime<Utc>,
    pub turn_time_limit_secs: u64,
    pub current_round: u32,
    pub max_rounds: u32,
    pub round_winners: Vec<PlayerId>,
    pub is_game_complete: bool,
    pub winner: Option<PlayerId>,
    pub rule_set: RuleSet,
}

/// Result of an accepted move or forced draw.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveApplied {
    pub player_id: PlayerId,
    pub mv: Move,
    pub forced: bool,
    pub effect: Option<Effect>,
    /// Cards the mover drew, if the move was a draw.
    pub drawn: usize,
    /// Present when the move emptied the mover's hand.
    pub round_summary: Option<RoundSummary>,
}

impl GameState {
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == MatchStatus::Playing
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    #[must_use]
    pub fn seat_of(&self, player_id: &PlayerId) -> Option<SeatIndex> {
        self.players.iter().position(|p| &p.id == player_id)
    }

    #[must_use]
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == player_id)
    }

    #[must_use]
    pub fn top_card(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    /// Every card currently accounted for across piles and hands.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    fn step(&self, from: SeatIndex, steps: usize) -> SeatIndex {
        let n = self.players.len();
        if n == 0 {
            return 0;
        }
        let steps = steps % n;
        match self.direction {
            Direction::Forward => (from + steps) % n,
            Direction::Backward => (from + n - steps) % n,
        }
    }

    /// Seat that plays after `from` in the current direction.
    #[must_use]
    pub fn next_index(&self, from: SeatIndex) -> SeatIndex {
        self.step(from, 1)
    }

    /// Hand the turn on, consuming a pending skip.
    fn advance_turn(&mut self) {
        let steps = if self.skip_next { 2 } else { 1 };
        self.skip_next = false;
        self.current_player_index = self.step(self.current_player_index, steps);
        self.turn_start_time = Utc::now();
    }

    /// Move `count` cards from the draw pile into a seat's hand, first
    /// recycling the discard pile if the stock is short. Returns how many
    /// cards were actually drawn.
    pub fn draw_into_hand<R: Rng + ?Sized>(
        &mut self,
        seat: SeatIndex,
        count: usize,
        rng: &mut R,
    ) -> usize {
        if self.draw_pile.len() < count {
            let stock = deck::reshuffle_discard_into_draw(&mut self.discard_pile, rng);
            debug!(
                "Room {}: reshuffled {} discards into the draw pile",
                self.room_id,
                stock.len()
            );
            self.draw_pile.extend(stock);
        }
        let drawn = deck::draw(&mut self.draw_pile, count);
        let n = drawn.len();
        if let Some(player) = self.players.get_mut(seat) {
            player.hand.extend(drawn);
            if player.hand.len() != 1 {
                player.declared_last_card = false;
            }
        }
        n
    }

    /// Draw for the current seat: the pending penalty, or one card.
    fn resolve_draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let required = if self.draw_count > 0 {
            self.draw_count as usize
        } else {
            1
        };
        let drawn = self.draw_into_hand(self.current_player_index, required, rng);
        self.draw_count = 0;
        self.seven_stack = 0;
        self.skip_next = false;
        self.advance_turn();
        drawn
    }

    /// Validate and apply a move from `player_id`.
    ///
    /// Rejections leave the state untouched. An invariant violation after
    /// the mutation aborts the round and returns [`GameError::Internal`].
    pub fn apply_move<R: Rng + ?Sized>(
        &mut self,
        player_id: &PlayerId,
        mv: Move,
        rng: &mut R,
    ) -> GameResult<MoveApplied> {
        rules::validate_move(self, player_id, &mv)?;
        let seat = self.current_player_index;

        let mut applied = MoveApplied {
            player_id: player_id.clone(),
            mv,
            forced: false,
            effect: None,
            drawn: 0,
            round_summary: None,
        };

        match mv {
            Move::PlayCard { card } => {
                let card = self.players[seat]
                    .take_card(&card)
                    .ok_or(GameError::CardNotInHand(card))?;
                self.discard_pile.push(card);
                self.is_first_play = false;
                if self.players[seat].hand.len() != 1 {
                    self.players[seat].declared_last_card = false;
                }

                let effect = rules::apply_effect(self, &card, rng);
                applied.effect = Some(effect);

                if self.players[seat].hand.is_empty() {
                    // A winning Jack does not wait for a suit.
                    self.pending_suit_choice = None;
                    applied.round_summary = Some(lifecycle::finish_round(self, seat));
                } else if effect != Effect::Wild {
                    self.advance_turn();
                }
            }
            Move::DrawCard => {
                applied.drawn = self.resolve_draw(rng);
            }
            Move::ChooseSuit { suit } => {
                self.wild_suit = Some(suit);
                self.pending_suit_choice = None;
                self.advance_turn();
            }
            Move::DeclareLow => {
                self.players[seat].declared_last_card = true;
            }
        }

        self.verify_or_abort()?;
        Ok(applied)
    }

    /// Timeout fallback for the current seat: draw without the turn-origin
    /// and mandatory-stack checks. A seat that owes a suit choice gets its
    /// most-held suit chosen instead.
    pub fn force_draw<R: Rng + ?Sized>(
        &mut self,
        player_id: &PlayerId,
        rng: &mut R,
    ) -> GameResult<MoveApplied> {
        if !self.is_playing() {
            return Err(GameError::GameNotStarted);
        }
        let seat = self.seat_of(player_id).ok_or(GameError::PlayerNotInRoom)?;
        if seat != self.current_player_index {
            return Err(GameError::NotYourTurn);
        }

        let mut applied = MoveApplied {
            player_id: player_id.clone(),
            mv: Move::DrawCard,
            forced: true,
            effect: None,
            drawn: 0,
            round_summary: None,
        };

        if self.pending_suit_choice == Some(seat) {
            let suit = self.players[seat].most_held_suit();
            self.wild_suit = Some(suit);
            self.pending_suit_choice = None;
            self.advance_turn();
            applied.mv = Move::ChooseSuit { suit };
        } else {
            applied.drawn = self.resolve_draw(rng);
        }

        self.verify_or_abort()?;
        Ok(applied)
    }

    /// Take a seat out of the round for good. Its cards go to the bottom
    /// of the draw pile and the turn passes to whoever would have been
    /// next. If the seat was on turn, its pending seven penalty is dropped.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<Player> {
        let idx = self.seat_of(player_id)?;
        let was_current = idx == self.current_player_index;

        let mut removed = self.players.remove(idx);
        self.draw_pile.append(&mut removed.hand);
        for (position, player) in self.players.iter_mut().enumerate() {
            player.position = position;
        }

        if self.pending_suit_choice == Some(idx) {
            self.pending_suit_choice = None;
        }

        let n = self.players.len();
        if n == 0 {
            self.current_player_index = 0;
            return Some(removed);
        }

        if was_current {
            // A penalty owed by the leaving seat leaves with it.
            self.skip_next = false;
            self.draw_count = 0;
            self.seven_stack = 0;
            self.current_player_index = match self.direction {
                Direction::Forward => idx % n,
                Direction::Backward => (idx + n - 1) % n,
            };
            self.turn_start_time = Utc::now();
        } else if idx < self.current_player_index {
            self.current_player_index -= 1;
        }
        if let Some(pending) = self.pending_suit_choice
            && pending > idx
        {
            self.pending_suit_choice = Some(pending - 1);
        }

        Some(removed)
    }

    /// Check the structural invariants of the state.
    pub fn check_invariants(&self) -> Result<(), String> {
        let count = self.card_count();
        if count != DECK_SIZE {
            return Err(format!("card count is {count}, expected {DECK_SIZE}"));
        }
        if self.is_playing() && self.current_player_index >= self.players.len() {
            return Err(format!(
                "current seat {} out of bounds for {} players",
                self.current_player_index,
                self.players.len()
            ));
        }
        if self.draw_count > 0 && self.seven_stack == 0 {
            return Err("draw penalty pending without a seven stack".to_string());
        }
        if self.is_first_play && !self.discard_pile.is_empty() {
            return Err("first play flag set with cards on the discard pile".to_string());
        }
        if let Some(seat) = self.pending_suit_choice
            && self.top_card().map(Card::rank) != Some(Rank::Jack)
        {
            return Err(format!("seat {seat} owes a suit choice without a Jack on top"));
        }
        Ok(())
    }

    fn verify_or_abort(&mut self) -> GameResult<()> {
        if let Err(violation) = self.check_invariants() {
            self.abort_round(&violation);
            return Err(GameError::Internal(violation));
        }
        Ok(())
    }

    /// Stop the round without a winner after an invariant violation.
    pub fn abort_round(&mut self, reason: &str) {
        error!(
            "Room {}: aborting round {} of match {}: {}",
            self.room_id, self.current_round, self.id, reason
        );
        self.status = MatchStatus::Finished;
        self.pending_suit_choice = None;
        self.winner = None;
    }

    /// Projection for `viewer`, hiding every other seat's cards.
    #[must_use]
    pub fn view_for(&self, viewer: Option<&PlayerId>) -> GameView {
        let own = viewer.and_then(|id| self.player(id));
        let hand = own.map(|p| p.hand.clone()).unwrap_or_default();
        let legal_cards = match own {
            Some(player)
                if self.is_playing()
                    && self.current_player().map(|c| &c.id) == Some(&player.id) =>
            {
                rules::legal_cards(&player.hand, self)
            }
            _ => Vec::new(),
        };

        GameView {
            match_id: self.id,
            viewer: own.map(|p| p.id.clone()),
            hand,
            legal_cards,
            players: self.players.iter().map(PlayerView::from).collect(),
            current_player: self
                .is_playing()
                .then(|| self.current_player().map(|p| p.id.clone()))
                .flatten(),
            direction: self.direction,
            status: self.status,
            top_card: self.top_card().copied(),
            draw_pile_count: self.draw_pile.len(),
            discard_pile_count: self.discard_pile.len(),
            draw_count: self.draw_count,
            wild_suit: self.wild_suit,
            awaiting_suit_choice: self.pending_suit_choice.is_some(),
            is_first_play: self.is_first_play,
            turn_start_time: self.turn_start_time,
            turn_time_limit_secs: self.turn_time_limit_secs,
            current_round: self.current_round,
            max_rounds: self.max_rounds,
            round_winners: self.round_winners.clone(),
            is_game_complete: self.is_game_complete,
            winner: self.winner.clone(),
        }
    }
}
