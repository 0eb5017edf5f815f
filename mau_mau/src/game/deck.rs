//! Card set creation, shuffling, dealing, and pile replenishment.
//!
//! Piles are plain vectors. The draw pile is consumed from the front;
//! the discard pile grows at the back, so its last element is the top card.

use rand::{Rng, seq::SliceRandom};

use super::entities::{Card, Rank, Suit};

/// The 52-card set in canonical (id) order.
#[must_use]
pub fn fresh_deck() -> Vec<Card> {
    Rank::ALL
        .iter()
        .flat_map(|rank| Suit::ALL.iter().map(move |suit| Card::new(*rank, *suit)))
        .collect()
}

/// A full set under a uniform random permutation.
pub fn new_shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    let mut cards = fresh_deck();
    // SliceRandom::shuffle is Fisher-Yates.
    cards.shuffle(rng);
    cards
}

/// Deal round-robin, one card per seat per pass, until every seat holds
/// `hand_size` cards. A short deck under-deals without complaint.
///
/// Returns the hands (indexed by seat) and what is left of the deck.
#[must_use]
pub fn deal(deck: Vec<Card>, seat_count: usize, hand_size: usize) -> (Vec<Vec<Card>>, Vec<Card>) {
    let mut hands: Vec<Vec<Card>> = (0..seat_count)
        .map(|_| Vec::with_capacity(hand_size))
        .collect();
    let mut remaining = deck.into_iter();

    'passes: for _ in 0..hand_size {
        for hand in &mut hands {
            match remaining.next() {
                Some(card) => hand.push(card),
                None => break 'passes,
            }
        }
    }

    (hands, remaining.collect())
}

/// Remove up to `count` cards from the front of the pile.
pub fn draw(draw_pile: &mut Vec<Card>, count: usize) -> Vec<Card> {
    let count = count.min(draw_pile.len());
    draw_pile.drain(..count).collect()
}

/// Turn everything under the top discard into fresh, shuffled stock.
///
/// The top card stays behind as the seed of the new discard pile. The
/// returned cards are meant to be appended to the draw pile.
pub fn reshuffle_discard_into_draw<R: Rng + ?Sized>(
    discard_pile: &mut Vec<Card>,
    rng: &mut R,
) -> Vec<Card> {
    let Some(top) = discard_pile.pop() else {
        return Vec::new();
    };
    let mut stock = std::mem::replace(discard_pile, vec![top]);
    stock.shuffle(rng);
    stock
}
