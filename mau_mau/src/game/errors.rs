//! Error types surfaced to the transport collaborator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::Card;

/// Result type for engine operations
pub type GameResult<T> = Result<T, GameError>;

/// Every reason the engine refuses a request.
///
/// Most variants are validation rejections: expected, user-facing, and
/// raised before any state is touched. `Internal` is the exception; it is
/// raised after an invariant violation forced the round to be aborted.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("room not found")]
    RoomNotFound,
    #[error("room is full")]
    RoomFull,
    #[error("room is closed")]
    RoomClosed,
    #[error("invalid room configuration: {0}")]
    InvalidRoomConfig(String),
    #[error("player is not in this room")]
    PlayerNotInRoom,
    #[error("player is already in this room")]
    PlayerAlreadyInRoom,
    #[error("game already in progress")]
    GameAlreadyInProgress,
    #[error("game has not started")]
    GameNotStarted,
    #[error("need 2+ players")]
    InsufficientPlayers,
    #[error("not every player is ready")]
    PlayersNotReady,
    #[error("round transition in progress")]
    RoundTransitionInProgress,
    #[error("not your turn")]
    NotYourTurn,
    #[error("{0} is not in your hand")]
    CardNotInHand(Card),
    #[error("a draw penalty is pending: play a 7 or draw")]
    MustPlaySevenOrDraw,
    #[error("{0} does not match the discard pile")]
    IllegalCardMatch(Card),
    #[error("no suit choice is pending")]
    InvalidSuitChoice,
    #[error("can only declare with exactly one card in hand")]
    InvalidDeclaration,
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Stable wire code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::RoomClosed => "ROOM_CLOSED",
            Self::InvalidRoomConfig(_) => "INVALID_ROOM_CONFIG",
            Self::PlayerNotInRoom => "PLAYER_NOT_IN_ROOM",
            Self::PlayerAlreadyInRoom => "PLAYER_ALREADY_IN_ROOM",
            Self::GameAlreadyInProgress => "GAME_ALREADY_IN_PROGRESS",
            Self::GameNotStarted => "GAME_NOT_STARTED",
            Self::InsufficientPlayers => "INSUFFICIENT_PLAYERS",
            Self::PlayersNotReady => "PLAYERS_NOT_READY",
            Self::RoundTransitionInProgress => "ROUND_TRANSITION_IN_PROGRESS",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::CardNotInHand(_) => "CARD_NOT_IN_HAND",
            Self::MustPlaySevenOrDraw => "MUST_PLAY_SEVEN_OR_DRAW",
            Self::IllegalCardMatch(_) => "ILLEGAL_CARD_MATCH",
            Self::InvalidSuitChoice => "INVALID_SUIT_CHOICE",
            Self::InvalidDeclaration => "INVALID_DECLARATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this is an ordinary refusal that left state untouched.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};

    #[test]
    fn test_error_codes() {
        assert_eq!(GameError::RoomNotFound.code(), "ROOM_NOT_FOUND");
        assert_eq!(GameError::NotYourTurn.code(), "NOT_YOUR_TURN");
        assert_eq!(
            GameError::MustPlaySevenOrDraw.code(),
            "MUST_PLAY_SEVEN_OR_DRAW"
        );
        assert_eq!(
            GameError::CardNotInHand(Card::new(Rank::Two, Suit::Clubs)).code(),
            "CARD_NOT_IN_HAND"
        );
    }

    #[test]
    fn test_error_display_names_card() {
        let err = GameError::IllegalCardMatch(Card::new(Rank::Queen, Suit::Hearts));
        assert_eq!(err.to_string(), "Q♥ does not match the discard pile");
    }

    #[test]
    fn test_internal_is_not_rejection() {
        assert!(GameError::PlayersNotReady.is_rejection());
        assert!(!GameError::Internal("card count".to_string()).is_rejection());
    }
}
