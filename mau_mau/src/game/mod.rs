//! Mau-Mau game engine: cards, rules, and the per-round state machine.
//!
//! Everything in this module is synchronous and owned by whoever holds the
//! [`GameState`]. Rooms drive it from their actor task.

pub mod constants;
pub mod deck;
pub mod entities;
pub mod errors;
pub mod lifecycle;
pub mod rules;
pub mod state_machine;

pub use errors::{GameError, GameResult};
pub use lifecycle::{MatchSettings, RoundScore, RoundSummary};
pub use rules::{Effect, MatchRules, RuleSet};
pub use state_machine::{GameState, MoveApplied};
