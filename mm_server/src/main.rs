//! Headless Mau-Mau room host.
//!
//! Spawns bot-only rooms through a RoomManager, watches their event streams
//! and exports Prometheus metrics until every match ends or a signal
//! arrives.

mod config;
mod headless;
mod logging;
mod metrics;

use std::net::SocketAddr;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use mau_mau::RoomManager;
use pico_args::Arguments;
use tokio::{sync::mpsc, task::JoinHandle};

use config::ServerConfig;
use headless::MatchReport;

const HELP: &str = "\
Run headless Mau-Mau bot rooms

USAGE:
  mm_server [OPTIONS]

OPTIONS:
  --rooms      N           Number of rooms to create   [default: env MAX_ROOMS or 1]
  --bots       N           Bots seated in each room    [default: env BOTS_PER_ROOM or 3]
  --metrics    IP:PORT     Prometheus scrape address   [default: env METRICS_BIND or disabled]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  RUST_LOG                 Log filter (default: info,mau_mau=debug)
  ROOM_MAX_PLAYERS         Seats per room
  ROOM_MAX_ROUNDS          Rounds per match
  ROOM_HAND_SIZE           Cards dealt per seat
  ROOM_RULE_SET            classic or legacy
  ROOM_RNG_SEED            Fixed seed for reproducible runs
  (See .env file for all configuration options)
";

struct Args {
    metrics: Option<SocketAddr>,
    num_rooms: Option<usize>,
    bots: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        metrics: pargs.opt_value_from_str("--metrics")?,
        num_rooms: pargs.opt_value_from_str("--rooms")?,
        bots: pargs.opt_value_from_str("--bots")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.metrics, args.num_rooms, args.bots)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Metrics available at http://{}/metrics", addr);
    }

    // Catching signals for shutdown.
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
    set_handler(move || {
        let _ = signal_tx.send(());
    })?;

    let manager = RoomManager::new();

    info!(
        "Creating {} room(s) with {} bot(s) each...",
        config.num_rooms, config.bots_per_room
    );

    let mut watchers: Vec<JoinHandle<Option<MatchReport>>> = Vec::new();
    for i in 0..config.num_rooms {
        match headless::start_bot_room(&manager, config.room_config(i), config.bots_per_room).await
        {
            Ok((room_id, events)) => {
                info!("✓ Created room {} with ID {}", i + 1, room_id);
                watchers.push(tokio::spawn(headless::watch_room(room_id, events)));
            }
            Err(e) => {
                log::error!("Failed to create room {}: {:#}", i + 1, e);
            }
        }
    }

    let active_count = manager.active_room_count().await;
    metrics::active_rooms(active_count);
    info!("Server ready with {} active room(s). Press Ctrl+C to stop.", active_count);

    let all_finished = async {
        let mut reports = Vec::new();
        for watcher in watchers {
            match watcher.await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(e) => log::error!("Room watcher failed: {}", e),
            }
            metrics::active_rooms(manager.active_room_count().await);
        }
        reports
    };

    tokio::select! {
        reports = all_finished => {
            for report in reports {
                info!(
                    "Room {}: winner {}{} ({})",
                    report.room_id,
                    report.winner.as_deref().unwrap_or("none"),
                    if report.forfeit { " by forfeit" } else { "" },
                    report
                        .standings
                        .iter()
                        .map(|s| format!("{} {}", s.name, s.cumulative_score))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        _ = signal_rx.recv() => {
            info!("Signal received");
        }
    }

    info!("Shutting down server...");
    manager.shutdown().await;
    metrics::active_rooms(0);

    Ok(())
}
