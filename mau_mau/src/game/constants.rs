/// Cards in a full set. Conservation checks compare against this.
pub const DECK_SIZE: usize = 52;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 10;

pub const DEFAULT_HAND_SIZE: usize = 5;
pub const MAX_HAND_SIZE: usize = 10;
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Ids starting with this prefix belong to computer-controlled seats.
pub const BOT_ID_PREFIX: &str = "bot-";

pub const MAX_PLAYER_ID_LENGTH: usize = 64;
pub const MAX_ROOM_NAME_LENGTH: usize = 48;
