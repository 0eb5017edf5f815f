//! Room module: one async actor per room plus a registry of rooms.
//!
//! This module implements:
//! - RoomActor: owns a room's seats, current match, RNG and timers
//! - RoomManager: creates, finds and tears down room actors
//! - TimerTable: per-room turn, bot, transition and grace timers
//!
//! ## Architecture
//!
//! Each room runs in a separate Tokio task with an mpsc message inbox.
//! Every request carries a oneshot reply channel. Timers are tasks that post
//! back into the same room, so requests and timer firings are processed one
//! at a time.
//!
//! ## Example
//!
//! ```no_run
//! use mau_mau::room::{RoomConfig, RoomManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = RoomManager::new();
//!     let room_id = manager
//!         .create_room(RoomConfig::default(), None)
//!         .await
//!         .unwrap();
//!
//!     manager
//!         .join_room(room_id, "alice".into(), "Alice".to_string())
//!         .await
//!         .unwrap();
//!     manager.add_bot(room_id).await.unwrap();
//!     manager.set_ready(room_id, "alice".into(), true).await.unwrap();
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod models;
pub mod timers;

pub use actor::{RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use manager::RoomManager;
pub use messages::{CloseOutcome, MoveOutcome, RoomEvent, RoomMessage, RoomMetadata, RoomSnapshot};
pub use models::{Room, Seat};
pub use timers::{TimerFired, TimerKind, TimerTable};
