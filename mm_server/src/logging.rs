//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; those records are bridged into
//! the tracing subscriber installed here.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,mau_mau=debug";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log the final ranking of a room's match
pub fn log_match_result(room_id: i64, winner: Option<&str>, forfeit: bool, elapsed_ms: i64) {
    tracing::info!(
        room_id = room_id,
        winner = winner,
        forfeit = forfeit,
        elapsed_ms = elapsed_ms,
        "Match finished"
    );
}

/// Log a room error event
pub fn log_room_error(room_id: i64, code: &str, message: &str) {
    tracing::error!(room_id = room_id, code = code, "ROOM ERROR: {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }

    #[test]
    fn test_log_helpers() {
        // Just ensure they don't panic without a subscriber
        log_match_result(1, Some("bot-1"), false, 1200);
        log_match_result(2, None, true, 10);
        log_room_error(3, "INTERNAL_ERROR", "invariant violated");
    }
}
