//! Bot identity.

use uuid::Uuid;

use crate::game::{constants::BOT_ID_PREFIX, entities::PlayerId};

/// Identity handed to a newly seated bot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BotPlayer {
    pub id: PlayerId,
    pub name: String,
}

impl BotPlayer {
    /// A fresh bot named after its ordinal among the room's bots.
    pub fn spawn(ordinal: usize) -> Self {
        Self {
            id: PlayerId::new(&format!("{BOT_ID_PREFIX}{}", Uuid::new_v4())),
            name: format!("Bot {ordinal}"),
        }
    }
}
