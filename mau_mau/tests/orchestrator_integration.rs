/// Integration tests for the room orchestrator
///
/// These tests run real room actors on the Tokio runtime and talk to them
/// through the RoomManager, the same way a transport would.
use mau_mau::{
    GameError, Move, PlayerId,
    room::{CloseOutcome, RoomConfig, RoomEvent, RoomManager},
};
use std::time::Duration;
use tokio::{sync::mpsc, time::timeout};

fn fast_config(name: &str) -> RoomConfig {
    RoomConfig {
        name: name.to_string(),
        bot_delay_ms: 1,
        round_transition_ms: 20,
        rng_seed: Some(42),
        ..Default::default()
    }
}

/// Wait for the first event matching `pred`, skipping everything else.
async fn wait_for<F>(rx: &mut mpsc::Receiver<RoomEvent>, secs: u64, pred: F) -> RoomEvent
where
    F: Fn(&RoomEvent) -> bool,
{
    timeout(Duration::from_secs(secs), async {
        loop {
            let event = rx.recv().await.expect("room event stream ended");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for room event")
}

async fn room_with_two_humans(manager: &RoomManager, config: RoomConfig) -> i64 {
    let room_id = manager.create_room(config, None).await.unwrap();
    manager
        .join_room(room_id, "alice".into(), "Alice".to_string())
        .await
        .unwrap();
    manager
        .join_room(room_id, "bob".into(), "Bob".to_string())
        .await
        .unwrap();
    room_id
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        max_players: 1,
        ..Default::default()
    };

    let err = manager.create_room(config, None).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_ROOM_CONFIG");
    assert_eq!(manager.active_room_count().await, 0);
}

#[tokio::test]
async fn test_join_errors() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        max_players: 2,
        ..fast_config("small")
    };
    let room_id = room_with_two_humans(&manager, config).await;

    let err = manager
        .join_room(room_id, "alice".into(), "Alice".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, GameError::PlayerAlreadyInRoom);

    let err = manager
        .join_room(room_id, "carol".into(), "Carol".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, GameError::RoomFull);

    let err = manager
        .join_room(999, "carol".into(), "Carol".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, GameError::RoomNotFound);

    let err = manager.leave_room(room_id, "carol".into()).await.unwrap_err();
    assert_eq!(err, GameError::PlayerNotInRoom);
}

#[tokio::test]
async fn test_start_requires_ready_seats() {
    let manager = RoomManager::new();
    let room_id = manager
        .create_room(fast_config("lonely"), None)
        .await
        .unwrap();
    manager
        .join_room(room_id, "alice".into(), "Alice".to_string())
        .await
        .unwrap();

    let err = manager.start_match(room_id).await.unwrap_err();
    assert_eq!(err, GameError::InsufficientPlayers);

    manager
        .join_room(room_id, "bob".into(), "Bob".to_string())
        .await
        .unwrap();
    let err = manager.start_match(room_id).await.unwrap_err();
    assert_eq!(err, GameError::PlayersNotReady);

    let err = manager
        .submit_move(room_id, "alice".into(), Move::DrawCard)
        .await
        .unwrap_err();
    assert_eq!(err, GameError::GameNotStarted);
}

#[tokio::test]
async fn test_all_ready_starts_match() {
    let manager = RoomManager::new();
    let room_id = room_with_two_humans(&manager, fast_config("auto")).await;

    let snapshot = manager
        .set_ready(room_id, "alice".into(), true)
        .await
        .unwrap();
    assert!(snapshot.game.is_none());

    let snapshot = manager.set_ready(room_id, "bob".into(), true).await.unwrap();
    assert!(snapshot.room.game_in_progress);
    let game = snapshot.game.unwrap();
    assert_eq!(game.hand.len(), 5);
    assert_eq!(game.current_round, 1);
    assert!(game.is_first_play);

    let err = manager.start_match(room_id).await.unwrap_err();
    assert_eq!(err, GameError::GameAlreadyInProgress);
}

#[tokio::test]
async fn test_moves_are_judged_against_current_turn() {
    let manager = RoomManager::new();
    let room_id = room_with_two_humans(&manager, fast_config("turns")).await;
    manager.set_ready(room_id, "alice".into(), true).await.unwrap();
    manager.set_ready(room_id, "bob".into(), true).await.unwrap();

    let snapshot = manager.get_room_state(room_id, None).await.unwrap();
    let current = snapshot.game.unwrap().current_player.unwrap();
    let waiting: PlayerId = if current.as_str() == "alice" {
        "bob".into()
    } else {
        "alice".into()
    };

    let err = manager
        .submit_move(room_id, waiting, Move::DrawCard)
        .await
        .unwrap_err();
    assert_eq!(err, GameError::NotYourTurn);

    let view = manager
        .get_room_state(room_id, Some(current.clone()))
        .await
        .unwrap()
        .game
        .unwrap();
    let mv = match view.legal_cards.first() {
        Some(card) => Move::PlayCard { card: *card },
        None => Move::DrawCard,
    };

    let outcome = manager.submit_move(room_id, current.clone(), mv).await.unwrap();
    assert!(matches!(
        &outcome.events[0],
        RoomEvent::MoveResult { player_id, forced: false, .. } if *player_id == current
    ));
    assert!(
        outcome
            .events
            .iter()
            .any(|e| matches!(e, RoomEvent::StateUpdated { .. }))
    );
    assert!(!outcome.view.is_first_play || mv == Move::DrawCard);
}

#[tokio::test]
async fn test_turn_timeout_forces_draw() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        turn_time_limit_ms: 50,
        ..fast_config("slow")
    };
    let room_id = room_with_two_humans(&manager, config).await;
    let mut events = manager
        .subscribe(room_id, "watcher".to_string(), 256)
        .await
        .unwrap();

    manager.set_ready(room_id, "alice".into(), true).await.unwrap();
    manager.set_ready(room_id, "bob".into(), true).await.unwrap();

    let event = wait_for(&mut events, 5, |e| {
        matches!(e, RoomEvent::MoveResult { forced: true, .. })
    })
    .await;
    match event {
        RoomEvent::MoveResult { mv, .. } => assert_eq!(mv, Move::DrawCard),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_reconnect_is_idempotent() {
    let manager = RoomManager::new();
    let room_id = room_with_two_humans(&manager, fast_config("flaky")).await;
    let mut events = manager
        .subscribe(room_id, "watcher".to_string(), 64)
        .await
        .unwrap();

    manager
        .notify_disconnect(room_id, "alice".into())
        .await
        .unwrap();
    let snapshot = manager.get_room_state(room_id, None).await.unwrap();
    assert!(!snapshot.room.seats[0].is_connected);

    manager
        .notify_reconnect(room_id, "alice".into())
        .await
        .unwrap();
    let snapshot = manager
        .notify_reconnect(room_id, "alice".into())
        .await
        .unwrap();
    assert!(snapshot.room.seats[0].is_connected);
    assert_eq!(snapshot.room.seats.len(), 2);

    wait_for(&mut events, 1, |e| {
        matches!(e, RoomEvent::PlayerDisconnected { .. })
    })
    .await;
    wait_for(&mut events, 1, |e| {
        matches!(e, RoomEvent::PlayerReconnected { .. })
    })
    .await;
    // The second reconnect changed nothing and emitted nothing.
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_grace_expiry_removes_seat_and_forfeits() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        disconnect_grace_ms: 30,
        ..fast_config("grace")
    };
    let room_id = room_with_two_humans(&manager, config).await;
    let mut events = manager
        .subscribe(room_id, "watcher".to_string(), 256)
        .await
        .unwrap();
    manager.set_ready(room_id, "alice".into(), true).await.unwrap();
    manager.set_ready(room_id, "bob".into(), true).await.unwrap();

    manager
        .notify_disconnect(room_id, "alice".into())
        .await
        .unwrap();

    wait_for(&mut events, 2, |e| matches!(e, RoomEvent::PlayerRemoved { .. })).await;
    let ended = wait_for(&mut events, 2, |e| matches!(e, RoomEvent::MatchEnded { .. })).await;
    match ended {
        RoomEvent::MatchEnded { winner, forfeit, .. } => {
            assert!(forfeit);
            assert_eq!(winner, Some(PlayerId::from("bob")));
        }
        other => panic!("unexpected event {other:?}"),
    }

    let err = manager
        .notify_reconnect(room_id, "alice".into())
        .await
        .unwrap_err();
    assert_eq!(err, GameError::PlayerNotInRoom);
}

#[tokio::test]
async fn test_last_human_leaving_closes_room() {
    let manager = RoomManager::new();
    let room_id = manager
        .create_room(fast_config("solo"), Some("alice".into()))
        .await
        .unwrap();
    manager
        .join_room(room_id, "alice".into(), "Alice".to_string())
        .await
        .unwrap();
    manager.add_bot(room_id).await.unwrap();
    let mut events = manager
        .subscribe(room_id, "watcher".to_string(), 64)
        .await
        .unwrap();

    manager.leave_room(room_id, "alice".into()).await.unwrap();
    wait_for(&mut events, 1, |e| matches!(e, RoomEvent::RoomClosed { .. })).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.active_room_count().await, 0);
    let err = manager.get_room_state(room_id, None).await.unwrap_err();
    assert!(matches!(err, GameError::RoomNotFound | GameError::RoomClosed));
}

#[tokio::test]
async fn test_bot_match_runs_to_completion() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        max_rounds: 2,
        ..fast_config("bots")
    };
    let room_id = manager.create_room(config, None).await.unwrap();
    for _ in 0..3 {
        manager.add_bot(room_id).await.unwrap();
    }
    let mut events = manager
        .subscribe(room_id, "watcher".to_string(), 8192)
        .await
        .unwrap();

    let view = manager.start_match(room_id).await.unwrap();
    assert_eq!(view.players.len(), 3);

    let ended = wait_for(&mut events, 20, |e| matches!(e, RoomEvent::MatchEnded { .. })).await;
    match ended {
        RoomEvent::MatchEnded {
            winner,
            standings,
            forfeit,
            ..
        } => {
            assert!(!forfeit);
            assert_eq!(standings.len(), 3);
            assert_eq!(winner, Some(standings[0].player_id.clone()));
        }
        other => panic!("unexpected event {other:?}"),
    }

    let snapshot = manager.get_room_state(room_id, None).await.unwrap();
    assert!(!snapshot.room.game_in_progress);
    assert_eq!(snapshot.room.round_winners.len(), 2);
    assert!(snapshot.game.unwrap().is_game_complete);
}

#[tokio::test]
async fn test_deletion_is_vetoed_during_round_transition() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        max_rounds: 2,
        round_transition_ms: 300,
        ..fast_config("transition")
    };
    let room_id = manager.create_room(config, None).await.unwrap();
    let bot = manager.add_bot(room_id).await.unwrap();
    manager.add_bot(room_id).await.unwrap();
    let mut events = manager
        .subscribe(room_id, "watcher".to_string(), 8192)
        .await
        .unwrap();
    manager.start_match(room_id).await.unwrap();

    wait_for(&mut events, 20, |e| matches!(e, RoomEvent::RoundEnded { .. })).await;

    let snapshot = manager.get_room_state(room_id, None).await.unwrap();
    assert!(snapshot.round_transition);

    let err = manager
        .submit_move(room_id, bot, Move::DrawCard)
        .await
        .unwrap_err();
    assert_eq!(err, GameError::RoundTransitionInProgress);

    let outcome = manager.delete_room(room_id, false).await.unwrap();
    assert_eq!(outcome, CloseOutcome::Deferred);

    // The room closes by itself once the transition is over, without
    // dealing another round.
    let event = wait_for(&mut events, 2, |e| {
        matches!(
            e,
            RoomEvent::RoomClosed { .. } | RoomEvent::RoundStarted { .. }
        )
    })
    .await;
    assert!(matches!(event, RoomEvent::RoomClosed { .. }));
}

#[tokio::test]
async fn test_grace_expiry_during_round_transition_closes_room() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        max_rounds: 2,
        turn_time_limit_ms: 20,
        disconnect_grace_ms: 50,
        round_transition_ms: 400,
        ..fast_config("grace-transition")
    };
    let room_id = manager.create_room(config, None).await.unwrap();
    manager
        .join_room(room_id, "alice".into(), "Alice".to_string())
        .await
        .unwrap();
    manager.add_bot(room_id).await.unwrap();
    manager.add_bot(room_id).await.unwrap();
    let mut events = manager
        .subscribe(room_id, "watcher".to_string(), 8192)
        .await
        .unwrap();

    // Bots are always ready, so this starts the match.
    manager.set_ready(room_id, "alice".into(), true).await.unwrap();

    wait_for(&mut events, 20, |e| matches!(e, RoomEvent::RoundEnded { .. })).await;
    manager
        .notify_disconnect(room_id, "alice".into())
        .await
        .unwrap();

    let removed = wait_for(&mut events, 2, |e| {
        matches!(
            e,
            RoomEvent::PlayerRemoved { .. } | RoomEvent::RoundStarted { .. }
        )
    })
    .await;
    match removed {
        RoomEvent::PlayerRemoved { player_id, .. } => {
            assert_eq!(player_id, PlayerId::from("alice"));
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The last human is gone mid-transition: the close waits for the
    // transition and no further round is dealt.
    let event = wait_for(&mut events, 2, |e| {
        matches!(
            e,
            RoomEvent::RoomClosed { .. } | RoomEvent::RoundStarted { .. }
        )
    })
    .await;
    assert!(matches!(event, RoomEvent::RoomClosed { .. }));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.active_room_count().await, 0);
}

#[tokio::test]
async fn test_list_rooms_hides_private_rooms() {
    let manager = RoomManager::new();
    let open = manager.create_room(fast_config("open"), None).await.unwrap();
    manager
        .create_room(
            RoomConfig {
                is_private: true,
                ..fast_config("hidden")
            },
            None,
        )
        .await
        .unwrap();

    let rooms = manager.list_rooms().await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id, open);
    assert_eq!(rooms[0].name, "open");
}

#[tokio::test]
async fn test_shutdown_closes_every_room() {
    let manager = RoomManager::new();
    let first = manager.create_room(fast_config("a"), None).await.unwrap();
    manager.create_room(fast_config("b"), None).await.unwrap();
    assert_eq!(manager.active_room_count().await, 2);

    manager.shutdown().await;

    assert_eq!(manager.active_room_count().await, 0);
    let err = manager.get_room_state(first, None).await.unwrap_err();
    assert_eq!(err, GameError::RoomNotFound);
}
