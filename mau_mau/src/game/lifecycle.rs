//! Round and match lifecycle: dealing, round scoring, and final ranking.

use chrono::Utc;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use uuid::Uuid;

use super::{
    constants::MIN_PLAYERS,
    deck,
    entities::{Direction, MatchStatus, Player, PlayerId, Standing},
    errors::{GameError, GameResult},
    rules::RuleSet,
    state_machine::GameState,
};
use crate::room::models::Room;

/// Per-match parameters taken from the room configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchSettings {
    pub hand_size: usize,
    pub max_rounds: u32,
    pub turn_time_limit_secs: u64,
    pub rule_set: RuleSet,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundScore {
    pub player_id: PlayerId,
    pub round_score: u32,
    pub cumulative_score: u32,
}

/// Outcome of a finished round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub winner: PlayerId,
    pub scores: Vec<RoundScore>,
    pub is_match_complete: bool,
    pub match_winner: Option<PlayerId>,
}

/// Start a new match for the room's current seats.
///
/// Cumulative scores and round counters start from zero.
pub fn create_match<R: Rng + ?Sized>(
    room: &Room,
    settings: &MatchSettings,
    rng: &mut R,
) -> GameResult<GameState> {
    if room.game_in_progress {
        return Err(GameError::GameAlreadyInProgress);
    }
    if room.seats.len() < MIN_PLAYERS {
        return Err(GameError::InsufficientPlayers);
    }
    if room.seats.iter().any(|s| !s.is_ready) {
        return Err(GameError::PlayersNotReady);
    }

    let players = room
        .seats
        .iter()
        .enumerate()
        .map(|(position, seat)| seat.to_player(position, 0))
        .collect();

    let state = deal_round(
        room,
        Uuid::new_v4(),
        players,
        1,
        Vec::new(),
        settings,
        rng,
    );
    info!(
        "Room {}: match {} started with {} seats, {} rounds",
        room.id,
        state.id,
        state.players.len(),
        state.max_rounds
    );
    Ok(state)
}

/// Deal the next round of an unfinished match to the room's current seats,
/// carrying cumulative scores over from `previous`.
pub fn start_next_round<R: Rng + ?Sized>(
    room: &Room,
    previous: &GameState,
    settings: &MatchSettings,
    rng: &mut R,
) -> GameResult<GameState> {
    if previous.is_game_complete {
        return Err(GameError::Internal(format!(
            "match {} is already complete",
            previous.id
        )));
    }
    if room.seats.len() < MIN_PLAYERS {
        return Err(GameError::InsufficientPlayers);
    }

    let players = room
        .seats
        .iter()
        .enumerate()
        .map(|(position, seat)| {
            let score = previous
                .player(&seat.id)
                .map_or(seat.cumulative_score, |p| p.cumulative_score);
            seat.to_player(position, score)
        })
        .collect();

    let state = deal_round(
        room,
        previous.id,
        players,
        previous.current_round,
        previous.round_winners.clone(),
        settings,
        rng,
    );
    info!(
        "Room {}: round {}/{} dealt",
        room.id, state.current_round, state.max_rounds
    );
    Ok(state)
}

fn deal_round<R: Rng + ?Sized>(
    room: &Room,
    match_id: Uuid,
    mut players: Vec<Player>,
    round: u32,
    round_winners: Vec<PlayerId>,
    settings: &MatchSettings,
    rng: &mut R,
) -> GameState {
    let shuffled = deck::new_shuffled_deck(rng);
    let (hands, draw_pile) = deck::deal(shuffled, players.len(), settings.hand_size);
    for (player, hand) in players.iter_mut().zip(hands) {
        player.hand = hand;
    }

    // The opening seat moves one place each round.
    let starting_seat = (round.saturating_sub(1) as usize) % players.len().max(1);

    GameState {
        id: match_id,
        room_id: room.id,
        players,
        current_player_index: starting_seat,
        direction: Direction::Forward,
        status: MatchStatus::Playing,
        draw_pile,
        discard_pile: Vec::new(),
        draw_count: 0,
        skip_next: false,
        wild_suit: None,
        seven_stack: 0,
        is_first_play: true,
        pending_suit_choice: None,
        turn_start_time: Utc::now(),
        turn_time_limit_secs: settings.turn_time_limit_secs,
        current_round: round,
        max_rounds: settings.max_rounds,
        round_winners,
        is_game_complete: false,
        winner: None,
        rule_set: settings.rule_set,
    }
}

/// Score the round won by `winner`, close it, and decide whether the match
/// is over.
pub fn finish_round(state: &mut GameState, winner: usize) -> RoundSummary {
    for (idx, player) in state.players.iter_mut().enumerate() {
        player.round_score = if idx == winner {
            0
        } else {
            player.hand_penalty()
        };
        player.cumulative_score += player.round_score;
    }

    let winner_id = state.players[winner].id.clone();
    state.round_winners.push(winner_id.clone());
    state.status = MatchStatus::Finished;
    state.pending_suit_choice = None;

    let round = state.current_round;
    if round >= state.max_rounds {
        state.is_game_complete = true;
        state.winner = standings(state).first().map(|s| s.player_id.clone());
    } else {
        state.current_round += 1;
    }

    info!(
        "Room {}: round {} won by {}{}",
        state.room_id,
        round,
        winner_id,
        if state.is_game_complete {
            " (match complete)"
        } else {
            ""
        }
    );

    RoundSummary {
        round,
        winner: winner_id,
        scores: state
            .players
            .iter()
            .map(|p| RoundScore {
                player_id: p.id.clone(),
                round_score: p.round_score,
                cumulative_score: p.cumulative_score,
            })
            .collect(),
        is_match_complete: state.is_game_complete,
        match_winner: state.winner.clone(),
    }
}

/// End the match early because too few seats are left. The remaining seat,
/// if any, wins.
pub fn forfeit(state: &mut GameState) -> Option<PlayerId> {
    state.status = MatchStatus::Finished;
    state.pending_suit_choice = None;
    state.is_game_complete = true;
    state.winner = match state.players.as_slice() {
        [last] => Some(last.id.clone()),
        _ => None,
    };
    info!(
        "Room {}: match {} ended by forfeit, winner {:?}",
        state.room_id, state.id, state.winner
    );
    state.winner.clone()
}

/// Ranking of the seats: lowest cumulative score first, then most rounds
/// won, then whoever won a round earliest, then seat order.
#[must_use]
pub fn standings(state: &GameState) -> Vec<Standing> {
    let mut ranked: Vec<(&Player, usize, usize)> = state
        .players
        .iter()
        .map(|p| {
            let rounds_won = state.round_winners.iter().filter(|w| **w == p.id).count();
            let first_win = state
                .round_winners
                .iter()
                .position(|w| *w == p.id)
                .unwrap_or(usize::MAX);
            (p, rounds_won, first_win)
        })
        .collect();

    ranked.sort_by_key(|(p, rounds_won, first_win)| {
        (p.cumulative_score, Reverse(*rounds_won), *first_win, p.position)
    });

    ranked
        .into_iter()
        .map(|(p, rounds_won, _)| Standing {
            player_id: p.id.clone(),
            name: p.name.clone(),
            cumulative_score: p.cumulative_score,
            rounds_won,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state_machine::tests::{card, state_with_hands, two_seat_state};
    use crate::room::models::Seat;
    use rand::{SeedableRng, rngs::StdRng};

    fn settings() -> MatchSettings {
        MatchSettings {
            hand_size: 5,
            max_rounds: 3,
            turn_time_limit_secs: 30,
            rule_set: RuleSet::default(),
        }
    }

    fn room(seats: &[&str]) -> Room {
        let mut room = Room::new(7, "Test Room".to_string(), 4, false, 3, None);
        for id in seats {
            let mut seat = Seat::human(PlayerId::from(*id), id.to_string());
            seat.is_ready = true;
            room.seats.push(seat);
        }
        room
    }

    #[test]
    fn test_create_match_needs_two_ready_seats() {
        let mut rng = StdRng::seed_from_u64(3);

        let lonely = room(&["alice"]);
        assert_eq!(
            create_match(&lonely, &settings(), &mut rng).unwrap_err(),
            GameError::InsufficientPlayers
        );

        let mut unready = room(&["alice", "bob"]);
        unready.seats[1].is_ready = false;
        assert_eq!(
            create_match(&unready, &settings(), &mut rng).unwrap_err(),
            GameError::PlayersNotReady
        );

        let mut busy = room(&["alice", "bob"]);
        busy.game_in_progress = true;
        assert_eq!(
            create_match(&busy, &settings(), &mut rng).unwrap_err(),
            GameError::GameAlreadyInProgress
        );
    }

    #[test]
    fn test_create_match_deals_fresh_round() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut room = room(&["alice", "bob", "carol"]);
        room.seats[0].cumulative_score = 40;

        let state = create_match(&room, &settings(), &mut rng).unwrap();

        assert_eq!(state.room_id, 7);
        assert_eq!(state.current_round, 1);
        assert!(state.is_first_play);
        assert!(state.discard_pile.is_empty());
        assert_eq!(state.draw_pile.len(), 52 - 15);
        assert!(state.players.iter().all(|p| p.hand.len() == 5));
        assert!(state.players.iter().all(|p| p.cumulative_score == 0));
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_next_round_rotates_start_and_keeps_scores() {
        let mut rng = StdRng::seed_from_u64(3);
        let room = room(&["alice", "bob"]);
        let mut state = create_match(&room, &settings(), &mut rng).unwrap();
        state.players[1].hand = vec![card("KS")];
        state.players[0].hand.clear();
        // Put the rest back in the stock so cards still add up.
        state.draw_pile = deck::fresh_deck()
            .into_iter()
            .filter(|c| *c != card("KS"))
            .collect();
        finish_round(&mut state, 0);

        let next = start_next_round(&room, &state, &settings(), &mut rng).unwrap();
        assert_eq!(next.id, state.id);
        assert_eq!(next.current_round, 2);
        assert_eq!(next.current_player_index, 1);
        assert_eq!(next.players[1].cumulative_score, 10);
        assert_eq!(next.round_winners, vec![PlayerId::from("alice")]);
        assert!(next.is_playing());
    }

    #[test]
    fn test_finish_round_scores_penalties() {
        let mut state = two_seat_state(&[], &["AH", "JS", "QD", "7C"]);
        let summary = finish_round(&mut state, 0);

        assert_eq!(summary.round, 1);
        assert_eq!(summary.scores[0].round_score, 0);
        assert_eq!(summary.scores[1].round_score, 11 + 25 + 10 + 7);
        assert!(!summary.is_match_complete);
        assert_eq!(state.current_round, 2);
        assert_eq!(state.status, MatchStatus::Finished);
    }

    #[test]
    fn test_final_round_picks_lowest_total() {
        let mut state = two_seat_state(&["2C"], &[]);
        state.current_round = 3;
        state.players[0].cumulative_score = 30;
        state.players[1].cumulative_score = 5;

        let summary = finish_round(&mut state, 1);

        assert!(summary.is_match_complete);
        assert!(state.is_game_complete);
        assert_eq!(state.winner, Some(PlayerId::from("bob")));
        assert_eq!(summary.match_winner, Some(PlayerId::from("bob")));
    }

    #[test]
    fn test_standings_tie_break() {
        let mut state = state_with_hands(&[("alice", &[]), ("bob", &[]), ("carol", &[])]);
        state.players[0].cumulative_score = 10;
        state.players[1].cumulative_score = 10;
        state.players[2].cumulative_score = 10;
        state.round_winners = vec!["carol".into(), "bob".into(), "bob".into()];

        let ranked: Vec<String> = standings(&state)
            .into_iter()
            .map(|s| s.player_id.to_string())
            .collect();
        assert_eq!(ranked, vec!["bob", "carol", "alice"]);

        state.round_winners = vec!["carol".into(), "bob".into()];
        let first = standings(&state).remove(0);
        assert_eq!(first.player_id, PlayerId::from("carol"));
        assert_eq!(first.rounds_won, 1);
    }

    #[test]
    fn test_forfeit_awards_last_seat() {
        let mut state = two_seat_state(&["2C"], &["3C"]);
        state.remove_player(&"bob".into());

        assert_eq!(forfeit(&mut state), Some(PlayerId::from("alice")));
        assert!(state.is_game_complete);
        assert_eq!(state.status, MatchStatus::Finished);
    }
}
