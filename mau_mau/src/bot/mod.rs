//! Computer-controlled seats.
//!
//! Bots are ordinary seats whose moves come from [`decision::choose_move`]
//! instead of a client. The room actor schedules them after a configurable
//! delay and feeds their moves through the same path as human moves.
//!
//! ## Policy
//!
//! - Owes a suit after a Jack: name the most-held suit
//! - One card left and not yet declared: declare
//! - Otherwise play the first legal card, or draw when there is none

pub mod decision;
pub mod models;

pub use decision::choose_move;
pub use models::BotPlayer;
