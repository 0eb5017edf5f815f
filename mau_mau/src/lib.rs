//! # Mau-Mau
//!
//! A multiplayer Mau-Mau card game engine with an async room orchestrator.
//!
//! The game itself is a synchronous state machine over a single 52-card
//! deck. Rooms wrap it in a Tokio actor that serializes moves, runs turn and
//! bot timers, and handles disconnects and round transitions.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, rules, match state machine, and round lifecycle
//! - [`room`]: Room actors, timers, events, and the room registry
//! - [`bot`]: Move policy for computer-controlled seats
//!
//! ## Example
//!
//! ```
//! use mau_mau::game::{deck, entities::{Card, Rank, Suit}};
//!
//! let cards = deck::fresh_deck();
//! assert_eq!(cards.len(), 52);
//! assert_eq!(Card::new(Rank::Seven, Suit::Clubs).to_string(), "7♣");
//! ```

/// Bot move policy.
pub mod bot;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameError, GameResult, GameState, RuleSet,
    constants::{self, MAX_PLAYERS, MIN_PLAYERS},
    entities::{self, Card, Move, PlayerId, Rank, RoomId, Suit},
};

/// Room actors and the room registry.
pub mod room;
pub use room::{RoomConfig, RoomEvent, RoomManager};
