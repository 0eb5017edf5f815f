//! Room actor message and event types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::models::Room;
use crate::game::{
    entities::{GameView, Move, PlayerId, RoomId, Standing},
    errors::{GameError, GameResult},
    lifecycle::RoundSummary,
};

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Take a seat
    Join {
        player_id: PlayerId,
        name: String,
        response: oneshot::Sender<GameResult<RoomSnapshot>>,
    },

    /// Seat a computer-controlled player
    AddBot {
        response: oneshot::Sender<GameResult<PlayerId>>,
    },

    /// Give up a seat voluntarily
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<GameResult<()>>,
    },

    SetReady {
        player_id: PlayerId,
        ready: bool,
        response: oneshot::Sender<GameResult<RoomSnapshot>>,
    },

    /// Explicit start request
    StartMatch {
        response: oneshot::Sender<GameResult<GameView>>,
    },

    SubmitMove {
        player_id: PlayerId,
        mv: Move,
        response: oneshot::Sender<GameResult<MoveOutcome>>,
    },

    /// The transport lost this player's connection
    Disconnect {
        player_id: PlayerId,
        response: oneshot::Sender<GameResult<()>>,
    },

    Reconnect {
        player_id: PlayerId,
        response: oneshot::Sender<GameResult<RoomSnapshot>>,
    },

    /// Snapshot of the room, personalized for `viewer` if given
    GetState {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<RoomSnapshot>,
    },

    /// Close the room. Without `force` the request is deferred while a round
    /// transition is running.
    Close {
        force: bool,
        response: oneshot::Sender<CloseOutcome>,
    },

    /// Subscribe to room events
    Subscribe {
        subscriber_id: String,
        sender: mpsc::Sender<RoomEvent>,
    },

    /// Unsubscribe from room events
    Unsubscribe { subscriber_id: String },
}

/// Events broadcast to subscribers and returned with accepted moves.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    MatchStarted {
        room_id: RoomId,
        match_id: uuid::Uuid,
        players: Vec<PlayerId>,
    },
    RoundStarted {
        room_id: RoomId,
        round: u32,
        max_rounds: u32,
        starting_player: Option<PlayerId>,
    },
    /// Public view of the match after a change
    StateUpdated { room_id: RoomId, view: Box<GameView> },
    MoveResult {
        room_id: RoomId,
        player_id: PlayerId,
        mv: Move,
        forced: bool,
        drawn: usize,
    },
    RoundEnded {
        room_id: RoomId,
        summary: RoundSummary,
    },
    MatchEnded {
        room_id: RoomId,
        winner: Option<PlayerId>,
        standings: Vec<Standing>,
        forfeit: bool,
    },
    PlayerJoined {
        room_id: RoomId,
        player_id: PlayerId,
        name: String,
        is_bot: bool,
    },
    PlayerLeft { room_id: RoomId, player_id: PlayerId },
    PlayerDisconnected { room_id: RoomId, player_id: PlayerId },
    PlayerReconnected { room_id: RoomId, player_id: PlayerId },
    /// A seat was dropped after its disconnect grace ran out
    PlayerRemoved { room_id: RoomId, player_id: PlayerId },
    RoomClosed { room_id: RoomId },
    Error {
        room_id: RoomId,
        code: String,
        message: String,
    },
}

impl RoomEvent {
    /// Wire form handed to the transport.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn error(room_id: RoomId, err: &GameError) -> Self {
        Self::Error {
            room_id,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Reply to an accepted move.
#[derive(Clone, Debug, Serialize)]
pub struct MoveOutcome {
    /// The match as the mover now sees it
    pub view: GameView,
    /// Everything the move caused, in order
    pub events: Vec<RoomEvent>,
}

/// Room state response
#[derive(Clone, Debug, Serialize)]
pub struct RoomSnapshot {
    pub room: Room,
    pub game: Option<GameView>,
    pub round_transition: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CloseOutcome {
    Closed,
    /// A round transition is running; the room closes once it completes
    Deferred,
}

/// Room metadata for discovery
#[derive(Clone, Debug, Serialize)]
pub struct RoomMetadata {
    pub id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub is_private: bool,
    pub game_in_progress: bool,
}

impl From<&Room> for RoomMetadata {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            player_count: room.seats.len(),
            max_players: room.max_players,
            is_private: room.is_private,
            game_in_progress: room.game_in_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, Rank, Suit};
    use serde_json::Value;

    #[test]
    fn test_event_wire_form_is_tagged() {
        let card = Card::new(Rank::Seven, Suit::Clubs);
        let event = RoomEvent::MoveResult {
            room_id: 7,
            player_id: "alice".into(),
            mv: Move::PlayCard { card },
            forced: false,
            drawn: 0,
        };

        let json: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["event"], "move_result");
        assert_eq!(json["room_id"], 7);
        assert_eq!(json["player_id"], "alice");
        assert_eq!(json["mv"]["type"], "PLAY_CARD");
        assert_eq!(json["mv"]["card"]["id"], card.id());
        assert_eq!(json["mv"]["card"]["suit"], "clubs");
        assert_eq!(json["forced"], false);
    }

    #[test]
    fn test_error_event_carries_code() {
        let event = RoomEvent::error(3, &GameError::NotYourTurn);

        let json: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["code"], "NOT_YOUR_TURN");
        assert!(json["message"].is_string());
    }
}
