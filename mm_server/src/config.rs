//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use mau_mau::{MAX_PLAYERS, MIN_PLAYERS, RoomConfig, RuleSet};
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Prometheus scrape address, if metrics are enabled
    pub metrics_bind: Option<SocketAddr>,
    /// Room defaults configuration
    pub room_defaults: RoomDefaultsConfig,
    /// Number of headless rooms to create on startup
    pub num_rooms: usize,
    /// Bots seated in each headless room
    pub bots_per_room: usize,
}

/// Default room configuration
#[derive(Debug, Clone)]
pub struct RoomDefaultsConfig {
    /// Maximum players per room
    pub max_players: usize,
    /// Rounds per match
    pub max_rounds: u32,
    /// Cards dealt per seat
    pub hand_size: usize,
    pub turn_time_limit_ms: u64,
    pub bot_delay_ms: u64,
    pub disconnect_grace_ms: u64,
    pub round_transition_ms: u64,
    /// Card effect table
    pub rule_set: RuleSet,
    /// Fixed RNG seed for reproducible runs
    pub rng_seed: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `metrics_override` - Optional metrics address override (from CLI args)
    /// * `num_rooms_override` - Optional number of rooms override (from CLI args)
    /// * `bots_override` - Optional bots-per-room override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be understood
    pub fn from_env(
        metrics_override: Option<SocketAddr>,
        num_rooms_override: Option<usize>,
        bots_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let metrics_bind = match metrics_override {
            Some(addr) => Some(addr),
            None => match std::env::var("METRICS_BIND") {
                Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{}' is not a socket address", raw),
                })?),
                Err(_) => None,
            },
        };

        let rule_set = match std::env::var("ROOM_RULE_SET") {
            Ok(raw) => parse_rule_set(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "ROOM_RULE_SET".to_string(),
                reason: format!("'{}' is not one of: classic, legacy", raw),
            })?,
            Err(_) => RuleSet::default(),
        };

        let room_defaults = RoomDefaultsConfig {
            max_players: parse_env_or("ROOM_MAX_PLAYERS", 4),
            max_rounds: parse_env_or("ROOM_MAX_ROUNDS", 3),
            hand_size: parse_env_or("ROOM_HAND_SIZE", 5),
            turn_time_limit_ms: parse_env_or("ROOM_TURN_TIME_LIMIT_MS", 30_000),
            bot_delay_ms: parse_env_or("ROOM_BOT_DELAY_MS", 1_000),
            disconnect_grace_ms: parse_env_or("ROOM_DISCONNECT_GRACE_MS", 300_000),
            round_transition_ms: parse_env_or("ROOM_ROUND_TRANSITION_MS", 3_000),
            rule_set,
            rng_seed: std::env::var("ROOM_RNG_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
        };

        let num_rooms = num_rooms_override.unwrap_or_else(|| parse_env_or("MAX_ROOMS", 1));
        let bots_per_room = bots_override.unwrap_or_else(|| parse_env_or("BOTS_PER_ROOM", 3));

        Ok(ServerConfig {
            metrics_bind,
            room_defaults,
            num_rooms,
            bots_per_room,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_rooms == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_ROOMS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.bots_per_room < MIN_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "BOTS_PER_ROOM".to_string(),
                reason: format!("Must be at least {}", MIN_PLAYERS),
            });
        }

        if self.bots_per_room > self.room_defaults.max_players {
            return Err(ConfigError::Invalid {
                var: "BOTS_PER_ROOM".to_string(),
                reason: format!(
                    "Cannot exceed max players ({})",
                    self.room_defaults.max_players
                ),
            });
        }

        if self.room_defaults.max_players > MAX_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "ROOM_MAX_PLAYERS".to_string(),
                reason: format!("Must be at most {}", MAX_PLAYERS),
            });
        }

        // Everything else is checked by the room itself.
        self.room_config(0)
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "ROOM_*".to_string(),
                reason,
            })
    }

    /// Room configuration for the `index`-th headless room.
    pub fn room_config(&self, index: usize) -> RoomConfig {
        let defaults = &self.room_defaults;
        RoomConfig {
            name: format!("Room {}", index + 1),
            max_players: defaults.max_players,
            is_private: false,
            max_rounds: defaults.max_rounds,
            hand_size: defaults.hand_size,
            turn_time_limit_ms: defaults.turn_time_limit_ms,
            bot_delay_ms: defaults.bot_delay_ms,
            disconnect_grace_ms: defaults.disconnect_grace_ms,
            round_transition_ms: defaults.round_transition_ms,
            rule_set: defaults.rule_set,
            rng_seed: defaults.rng_seed.map(|seed| seed.wrapping_add(index as u64)),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_rule_set(raw: &str) -> Option<RuleSet> {
    match raw.to_lowercase().as_str() {
        "classic" => Some(RuleSet::classic()),
        "legacy" => Some(RuleSet::legacy()),
        _ => None,
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
