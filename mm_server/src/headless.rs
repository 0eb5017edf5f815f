//! Headless bot rooms.
//!
//! Each room is seated with bots only, started, and watched through an event
//! subscription until its match ends.

use anyhow::Context;
use chrono::Utc;
use mau_mau::{RoomConfig, RoomEvent, RoomId, RoomManager, entities::Standing};
use tokio::sync::mpsc;

use crate::{logging, metrics};

/// Buffer for the watcher's event subscription
const EVENT_BUFFER: usize = 4096;

/// What a finished headless room reports back.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub room_id: RoomId,
    pub winner: Option<String>,
    pub standings: Vec<Standing>,
    pub forfeit: bool,
}

/// Create a room, seat `bots` bots and start the match.
///
/// Returns the room ID and the event stream the caller should watch.
pub async fn start_bot_room(
    manager: &RoomManager,
    config: RoomConfig,
    bots: usize,
) -> anyhow::Result<(RoomId, mpsc::Receiver<RoomEvent>)> {
    let room_id = manager
        .create_room(config, None)
        .await
        .context("Failed to create room")?;

    for _ in 0..bots {
        manager
            .add_bot(room_id)
            .await
            .with_context(|| format!("Failed to seat bot in room {}", room_id))?;
    }

    let events = manager
        .subscribe(room_id, "headless".to_string(), EVENT_BUFFER)
        .await
        .context("Failed to subscribe to room events")?;

    manager
        .start_match(room_id)
        .await
        .with_context(|| format!("Failed to start match in room {}", room_id))?;

    log::info!("Room {} started with {} bots", room_id, bots);
    Ok((room_id, events))
}

/// Consume room events until the match ends or the room closes.
pub async fn watch_room(
    room_id: RoomId,
    mut events: mpsc::Receiver<RoomEvent>,
) -> Option<MatchReport> {
    let started = Utc::now();

    while let Some(event) = events.recv().await {
        metrics::record_event(&event);
        if log::log_enabled!(log::Level::Trace)
            && let Ok(json) = event.to_json()
        {
            log::trace!("Room {}: {}", room_id, json);
        }

        match event {
            RoomEvent::RoundEnded { summary, .. } => {
                log::info!(
                    "Room {}: round {} won by {}",
                    room_id,
                    summary.round,
                    summary.winner
                );
            }
            RoomEvent::Error { code, message, .. } => {
                logging::log_room_error(room_id, &code, &message);
            }
            RoomEvent::MatchEnded {
                winner,
                standings,
                forfeit,
                ..
            } => {
                let winner = winner.map(|w| w.to_string());
                let elapsed_ms = (Utc::now() - started).num_milliseconds();
                logging::log_match_result(room_id, winner.as_deref(), forfeit, elapsed_ms);
                return Some(MatchReport {
                    room_id,
                    winner,
                    standings,
                    forfeit,
                });
            }
            RoomEvent::RoomClosed { .. } => {
                log::warn!("Room {} closed before its match ended", room_id);
                return None;
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_config() -> RoomConfig {
        RoomConfig {
            name: "headless".to_string(),
            max_rounds: 1,
            bot_delay_ms: 1,
            round_transition_ms: 10,
            rng_seed: Some(3),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bot_room_reports_winner() {
        let manager = RoomManager::new();
        let (room_id, events) = start_bot_room(&manager, fast_config(), 3).await.unwrap();

        let report = tokio::time::timeout(Duration::from_secs(20), watch_room(room_id, events))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.room_id, room_id);
        assert!(!report.forfeit);
        assert_eq!(report.standings.len(), 3);
        assert_eq!(
            report.winner.as_deref(),
            Some(report.standings[0].player_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_too_many_bots_is_an_error() {
        let manager = RoomManager::new();
        let config = RoomConfig {
            max_players: 2,
            ..fast_config()
        };

        assert!(start_bot_room(&manager, config, 3).await.is_err());
    }

    #[tokio::test]
    async fn test_closed_room_yields_no_report() {
        let manager = RoomManager::new();
        let config = RoomConfig {
            bot_delay_ms: 60_000,
            ..fast_config()
        };
        let (room_id, events) = start_bot_room(&manager, config, 2).await.unwrap();

        manager.delete_room(room_id, true).await.unwrap();

        let report = tokio::time::timeout(Duration::from_secs(2), watch_room(room_id, events))
            .await
            .unwrap();
        assert!(report.is_none());
    }
}
