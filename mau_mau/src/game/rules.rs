//! Card-matching rules: legality, special-card effects, and move validation.
//!
//! Everything here is pure decision logic over a [`GameState`] except
//! [`apply_effect`], which records a played card's effect on the state.
//! The rule variant in force is a [`RuleSet`] value chosen when the match
//! is created.

use enum_dispatch::enum_dispatch;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    entities::{Card, Move, PlayerId, Rank, Suit},
    errors::{GameError, GameResult},
    state_machine::GameState,
};

/// What a played card does beyond landing on the discard pile.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Raise the pending draw penalty by `per_card` for every consecutive 7.
    StackDraw { per_card: u32 },
    /// The next seat in turn order loses its turn.
    Skip,
    /// Turn order changes direction.
    Reverse,
    /// The player names the suit to follow.
    Wild,
    /// Every other seat draws `count` cards right away.
    OthersDraw { count: u32 },
    Plain,
}

/// Behaviour that differs between rule variants.
#[enum_dispatch]
pub trait MatchRules {
    /// Whether `card` may follow `top` when no wild suit is in effect.
    fn matches(&self, card: &Card, top: &Card) -> bool;

    fn effect(&self, rank: Rank) -> Effect;
}

/// Suit, rank, or color matching; 7 draws three and stacks, 8 skips,
/// 10 reverses, J is wild, and A makes everyone else draw one.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClassicRules {}

impl MatchRules for ClassicRules {
    fn matches(&self, card: &Card, top: &Card) -> bool {
        card.suit() == top.suit()
            || card.rank() == top.rank()
            || card.suit().color() == top.suit().color()
    }

    fn effect(&self, rank: Rank) -> Effect {
        match rank {
            Rank::Seven => Effect::StackDraw { per_card: 3 },
            Rank::Eight => Effect::Skip,
            Rank::Ten => Effect::Reverse,
            Rank::Jack => Effect::Wild,
            Rank::Ace => Effect::OthersDraw { count: 1 },
            _ => Effect::Plain,
        }
    }
}

/// Suit-or-rank matching; 7 draws two and stacks, 8 skips, J is wild.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LegacyRules {}

impl MatchRules for LegacyRules {
    fn matches(&self, card: &Card, top: &Card) -> bool {
        card.suit() == top.suit() || card.rank() == top.rank()
    }

    fn effect(&self, rank: Rank) -> Effect {
        match rank {
            Rank::Seven => Effect::StackDraw { per_card: 2 },
            Rank::Eight => Effect::Skip,
            Rank::Jack => Effect::Wild,
            _ => Effect::Plain,
        }
    }
}

#[enum_dispatch(MatchRules)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RuleSet {
    Classic(ClassicRules),
    Legacy(LegacyRules),
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::Classic(ClassicRules {})
    }
}

impl RuleSet {
    #[must_use]
    pub fn classic() -> Self {
        Self::Classic(ClassicRules {})
    }

    #[must_use]
    pub fn legacy() -> Self {
        Self::Legacy(LegacyRules {})
    }
}

/// Whether `card` may be played on the current discard pile.
pub fn is_legal_play(
    rules: &RuleSet,
    card: &Card,
    top: Option<&Card>,
    wild_suit: Option<Suit>,
    is_first_play: bool,
) -> bool {
    if is_first_play && top.is_none() {
        return card.suit() == Suit::Clubs;
    }
    if let Some(suit) = wild_suit {
        return card.suit() == suit || card.rank() == Rank::Jack;
    }
    if card.rank() == Rank::Jack {
        return true;
    }
    match top {
        Some(top) => rules.matches(card, top),
        None => true,
    }
}

/// Cards from `hand` that may be played right now.
#[must_use]
pub fn legal_cards(hand: &[Card], state: &GameState) -> Vec<Card> {
    if state.pending_suit_choice.is_some() {
        return Vec::new();
    }
    if state.draw_count > 0 {
        return hand
            .iter()
            .filter(|c| c.rank() == Rank::Seven)
            .copied()
            .collect();
    }
    hand.iter()
        .filter(|c| {
            is_legal_play(
                &state.rule_set,
                c,
                state.top_card(),
                state.wild_suit,
                state.is_first_play,
            )
        })
        .copied()
        .collect()
}

/// Check a move against the current state without touching it.
pub fn validate_move(state: &GameState, player_id: &PlayerId, mv: &Move) -> GameResult<()> {
    if !state.is_playing() {
        return Err(GameError::GameNotStarted);
    }
    let current = state
        .current_player()
        .ok_or_else(|| GameError::Internal("current seat is missing".to_string()))?;
    if &current.id != player_id {
        return Err(GameError::NotYourTurn);
    }
    if state.pending_suit_choice.is_some() && !matches!(mv, Move::ChooseSuit { .. }) {
        return Err(GameError::InvalidSuitChoice);
    }

    match mv {
        Move::PlayCard { card } => {
            if !current.holds(card) {
                return Err(GameError::CardNotInHand(*card));
            }
            if state.draw_count > 0 && card.rank() != Rank::Seven {
                return Err(GameError::MustPlaySevenOrDraw);
            }
            if !is_legal_play(
                &state.rule_set,
                card,
                state.top_card(),
                state.wild_suit,
                state.is_first_play,
            ) {
                return Err(GameError::IllegalCardMatch(*card));
            }
        }
        Move::DrawCard => {
            // Stacking is mandatory when possible.
            if state.draw_count > 0 && current.hand.iter().any(|c| c.rank() == Rank::Seven) {
                return Err(GameError::MustPlaySevenOrDraw);
            }
        }
        Move::ChooseSuit { .. } => {
            if state.pending_suit_choice != Some(state.current_player_index) {
                return Err(GameError::InvalidSuitChoice);
            }
        }
        Move::DeclareLow => {
            if current.hand_count() != 1 || current.declared_last_card {
                return Err(GameError::InvalidDeclaration);
            }
        }
    }

    Ok(())
}

/// Record the effect of `card`, which was just placed on the discard pile
/// by the current seat.
pub fn apply_effect<R: Rng + ?Sized>(state: &mut GameState, card: &Card, rng: &mut R) -> Effect {
    if card.rank() != Rank::Jack {
        state.wild_suit = None;
    }

    let effect = state.rule_set.effect(card.rank());
    if !matches!(effect, Effect::StackDraw { .. }) {
        state.seven_stack = 0;
        state.draw_count = 0;
    }

    match effect {
        Effect::StackDraw { per_card } => {
            state.seven_stack += 1;
            state.draw_count = state.seven_stack * per_card;
        }
        Effect::Skip => state.skip_next = true,
        Effect::Reverse => state.direction = state.direction.flipped(),
        Effect::Wild => {
            state.wild_suit = None;
            state.pending_suit_choice = Some(state.current_player_index);
        }
        Effect::OthersDraw { count } => {
            let current = state.current_player_index;
            for seat in 0..state.players.len() {
                if seat != current {
                    state.draw_into_hand(seat, count as usize, rng);
                }
            }
        }
        Effect::Plain => {}
    }

    effect
}
