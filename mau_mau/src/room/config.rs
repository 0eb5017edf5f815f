//! Room configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    constants::{
        DECK_SIZE, DEFAULT_HAND_SIZE, DEFAULT_MAX_ROUNDS, MAX_HAND_SIZE, MAX_PLAYERS,
        MAX_ROOM_NAME_LENGTH, MIN_PLAYERS,
    },
    lifecycle::MatchSettings,
    rules::RuleSet,
};

/// Room configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Room name
    pub name: String,

    /// Maximum number of seats (default: 4)
    pub max_players: usize,

    /// Whether the room is hidden from listings
    pub is_private: bool,

    /// Rounds per match
    pub max_rounds: u32,

    /// Cards dealt to each seat at the start of a round
    pub hand_size: usize,

    /// Time a seat has to act before a draw is forced on it
    pub turn_time_limit_ms: u64,

    /// Pause before a bot acts
    pub bot_delay_ms: u64,

    /// How long a disconnected seat is held before it is removed
    pub disconnect_grace_ms: u64,

    /// Pause between a finished round and the next deal
    pub round_transition_ms: u64,

    /// Rule variant used for matches in this room
    pub rule_set: RuleSet,

    /// Fixed RNG seed for reproducible shuffles
    pub rng_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "Mau-Mau".to_string(),
            max_players: 4,
            is_private: false,
            max_rounds: DEFAULT_MAX_ROUNDS,
            hand_size: DEFAULT_HAND_SIZE,
            turn_time_limit_ms: 30_000,
            bot_delay_ms: 1_000,
            disconnect_grace_ms: 300_000,
            round_transition_ms: 3_000,
            rule_set: RuleSet::default(),
            rng_seed: None,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.name.chars().count() > MAX_ROOM_NAME_LENGTH {
            return Err(format!(
                "Room name must be between 1 and {MAX_ROOM_NAME_LENGTH} characters"
            ));
        }

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(format!(
                "Max players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            ));
        }

        if self.max_rounds == 0 {
            return Err("Max rounds must be at least 1".to_string());
        }

        if !(1..=MAX_HAND_SIZE).contains(&self.hand_size) {
            return Err(format!("Hand size must be between 1 and {MAX_HAND_SIZE}"));
        }

        // At least one card has to stay behind for the draw pile.
        if self.hand_size * self.max_players > DECK_SIZE - 1 {
            return Err(format!(
                "{} seats with {} cards each do not fit in one deck",
                self.max_players, self.hand_size
            ));
        }

        if self.turn_time_limit_ms == 0 {
            return Err("Turn time limit must be positive".to_string());
        }

        Ok(())
    }

    pub fn turn_time_limit(&self) -> Duration {
        Duration::from_millis(self.turn_time_limit_ms)
    }

    pub fn bot_delay(&self) -> Duration {
        Duration::from_millis(self.bot_delay_ms)
    }

    pub fn disconnect_grace(&self) -> Duration {
        Duration::from_millis(self.disconnect_grace_ms)
    }

    pub fn round_transition_delay(&self) -> Duration {
        Duration::from_millis(self.round_transition_ms)
    }

    /// Settings handed to the engine when a match or round is dealt.
    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            hand_size: self.hand_size,
            max_rounds: self.max_rounds,
            turn_time_limit_secs: self.turn_time_limit_ms.div_ceil(1000),
            rule_set: self.rule_set,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RoomConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.disconnect_grace(), Duration::from_secs(300));
        assert_eq!(config.round_transition_delay(), Duration::from_secs(3));
        assert_eq!(config.match_settings().turn_time_limit_secs, 30);
    }

    #[test]
    fn test_rejects_bad_seat_counts() {
        let config = RoomConfig {
            max_players: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RoomConfig {
            max_players: 11,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_deal() {
        let config = RoomConfig {
            max_players: 6,
            hand_size: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RoomConfig {
            max_players: 10,
            hand_size: 5,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_name_and_zero_rounds() {
        let config = RoomConfig {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RoomConfig {
            max_rounds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RoomConfig =
            serde_json::from_str(r#"{"name":"Quick","rule_set":{"kind":"legacy"}}"#).unwrap();
        assert_eq!(config.name, "Quick");
        assert_eq!(config.rule_set, RuleSet::legacy());
        assert_eq!(config.max_players, 4);
    }
}
