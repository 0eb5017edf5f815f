//! Room and seat models. These outlive any single match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::entities::{Player, PlayerId, RoomId, SeatIndex};

/// A seat at the table: identity and score, kept across rounds.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,
    pub is_connected: bool,
    pub is_bot: bool,
    pub cumulative_score: u32,
}

impl Seat {
    pub fn human(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            is_ready: false,
            is_connected: true,
            is_bot: false,
            cumulative_score: 0,
        }
    }

    /// Bots are always ready.
    pub fn bot(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            is_ready: true,
            is_connected: true,
            is_bot: true,
            cumulative_score: 0,
        }
    }

    /// Per-round projection of this seat with an empty hand.
    pub fn to_player(&self, position: SeatIndex, cumulative_score: u32) -> Player {
        Player {
            id: self.id.clone(),
            name: self.name.clone(),
            hand: Vec::new(),
            is_ready: self.is_ready,
            is_connected: self.is_connected,
            is_bot: self.is_bot,
            position,
            cumulative_score,
            round_score: 0,
            declared_last_card: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub max_players: usize,
    pub is_private: bool,
    pub seats: Vec<Seat>,
    pub game_in_progress: bool,
    pub current_round: u32,
    pub max_rounds: u32,
    pub round_winners: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<PlayerId>,
}

impl Room {
    pub fn new(
        id: RoomId,
        name: String,
        max_players: usize,
        is_private: bool,
        max_rounds: u32,
        created_by: Option<PlayerId>,
    ) -> Self {
        Self {
            id,
            name,
            max_players,
            is_private,
            seats: Vec::new(),
            game_in_progress: false,
            current_round: 0,
            max_rounds,
            round_winners: Vec::new(),
            created_at: Utc::now(),
            created_by,
        }
    }

    pub fn seat(&self, player_id: &PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.id == player_id)
    }

    pub fn seat_mut(&mut self, player_id: &PlayerId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| &s.id == player_id)
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.max_players
    }

    pub fn has_humans(&self) -> bool {
        self.seats.iter().any(|s| !s.is_bot)
    }

    pub fn all_ready(&self) -> bool {
        self.seats.iter().all(|s| s.is_ready)
    }

    pub fn remove_seat(&mut self, player_id: &PlayerId) -> Option<Seat> {
        let idx = self.seats.iter().position(|s| &s.id == player_id)?;
        Some(self.seats.remove(idx))
    }
}
