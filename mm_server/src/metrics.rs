//! Prometheus metrics for monitoring room health and match progress.
//!
//! Metrics are fed from room event subscriptions and exposed in Prometheus
//! text format for scraping.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! metrics::active_rooms(3);
//! ```

use mau_mau::RoomEvent;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Set current active rooms count.
pub fn active_rooms(count: usize) {
    metrics::gauge!("active_rooms").set(count as f64);
}

/// Increment accepted moves counter.
pub fn moves_total(forced: bool) {
    metrics::counter!("moves_total",
        "forced" => forced.to_string()
    )
    .increment(1);
}

/// Increment rejected or failed requests counter.
pub fn room_errors_total(code: &str) {
    metrics::counter!("room_errors_total",
        "code" => code.to_string()
    )
    .increment(1);
}

/// Increment completed rounds counter.
pub fn rounds_completed_total() {
    metrics::counter!("rounds_completed_total").increment(1);
}

/// Increment completed matches counter.
pub fn matches_completed_total(forfeit: bool) {
    metrics::counter!("matches_completed_total",
        "forfeit" => forfeit.to_string()
    )
    .increment(1);
}

/// Increment disconnects counter.
pub fn disconnects_total() {
    metrics::counter!("disconnects_total").increment(1);
}

/// Record cards taken in one draw.
pub fn cards_drawn(count: usize) {
    metrics::histogram!("cards_drawn").record(count as f64);
}

/// Update metrics for one room event.
pub fn record_event(event: &RoomEvent) {
    match event {
        RoomEvent::MoveResult { forced, drawn, .. } => {
            moves_total(*forced);
            if *drawn > 0 {
                cards_drawn(*drawn);
            }
        }
        RoomEvent::RoundEnded { .. } => rounds_completed_total(),
        RoomEvent::MatchEnded { forfeit, .. } => matches_completed_total(*forfeit),
        RoomEvent::PlayerDisconnected { .. } => disconnects_total(),
        RoomEvent::Error { code, .. } => room_errors_total(code),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mau_mau::Move;

    #[test]
    fn test_record_event_without_recorder() {
        // Without an installed recorder every call is a no-op.
        record_event(&RoomEvent::MoveResult {
            room_id: 1,
            player_id: "bot-1".into(),
            mv: Move::DrawCard,
            forced: true,
            drawn: 3,
        });
        record_event(&RoomEvent::RoomClosed { room_id: 1 });
        active_rooms(0);
    }
}
