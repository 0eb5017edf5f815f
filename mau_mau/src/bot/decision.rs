//! Bot move selection.

use crate::game::{
    entities::{Move, SeatIndex},
    rules,
    state_machine::GameState,
};

/// Pick the move the bot in `seat` makes right now.
///
/// Returns `None` when it is not that seat's turn or the round is over.
#[must_use]
pub fn choose_move(state: &GameState, seat: SeatIndex) -> Option<Move> {
    if !state.is_playing() || state.current_player_index != seat {
        return None;
    }
    let bot = state.players.get(seat)?;

    if state.pending_suit_choice == Some(seat) {
        return Some(Move::ChooseSuit {
            suit: bot.most_held_suit(),
        });
    }

    if bot.hand_count() == 1 && !bot.declared_last_card {
        return Some(Move::DeclareLow);
    }

    let mv = match rules::legal_cards(&bot.hand, state).first() {
        Some(card) => Move::PlayCard { card: *card },
        None => Move::DrawCard,
    };
    Some(mv)
}
