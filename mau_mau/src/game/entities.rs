use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Clubs,
    Spades,
    Hearts,
    Diamonds,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Spades, Suit::Hearts, Suit::Diamonds];

    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Hearts | Self::Diamonds => Color::Red,
            Self::Clubs | Self::Spades => Color::Black,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Clubs => "♣",
            Self::Spades => "♠",
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Penalty points a card of this rank costs when it is still in hand
    /// at the end of a round.
    #[must_use]
    pub const fn penalty(self) -> u32 {
        match self {
            Self::Ace => 11,
            Self::Jack => 25,
            Self::Queen | Self::King => 10,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten => 10,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Ace => "A",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
        };
        write!(f, "{repr}")
    }
}

/// A playing card. The id is the card's position in the canonical
/// unshuffled deck, so it is unique within one 52-card set.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card {
    id: u8,
    suit: Suit,
    rank: Rank,
}

impl Card {
    #[must_use]
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self {
            id: rank as u8 * 4 + suit as u8,
            suit,
            rank,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u8 {
        self.id
    }

    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.suit
    }

    #[must_use]
    pub const fn rank(&self) -> Rank {
        self.rank
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Player identity as handed to the engine by the (already authenticated)
/// transport layer.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        // Capped in characters so a multi-byte character is never split.
        let id: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(constants::MAX_PLAYER_ID_LENGTH)
            .collect();
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.0.starts_with(constants::BOT_ID_PREFIX)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Type alias for a seat's position in the turn order.
pub type SeatIndex = usize;

/// Type alias for room ids.
pub type RoomId = i64;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Playing,
    Finished,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// An intent submitted by a seat.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Move {
    PlayCard { card: Card },
    DrawCard,
    ChooseSuit { suit: Suit },
    /// Announce that only one card is left in hand.
    DeclareLow,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayCard { card } => write!(f, "plays {card}"),
            Self::DrawCard => write!(f, "draws"),
            Self::ChooseSuit { suit } => write!(f, "chooses {suit}"),
            Self::DeclareLow => write!(f, "declares last card"),
        }
    }
}

/// A seat within one round of a match. Rebuilt from the room's seats
/// every round with a fresh hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub is_ready: bool,
    pub is_connected: bool,
    pub is_bot: bool,
    pub position: SeatIndex,
    pub cumulative_score: u32,
    pub round_score: u32,
    pub declared_last_card: bool,
}

impl Player {
    #[must_use]
    pub fn hand_count(&self) -> usize {
        self.hand.len()
    }

    #[must_use]
    pub fn holds(&self, card: &Card) -> bool {
        self.hand.iter().any(|c| c.id() == card.id())
    }

    /// Remove `card` from hand, returning it if it was there.
    pub fn take_card(&mut self, card: &Card) -> Option<Card> {
        let idx = self.hand.iter().position(|c| c.id() == card.id())?;
        Some(self.hand.remove(idx))
    }

    #[must_use]
    pub fn hand_penalty(&self) -> u32 {
        self.hand.iter().map(|c| c.rank().penalty()).sum()
    }

    /// Count of cards per suit, in `Suit::ALL` order.
    #[must_use]
    pub fn suit_counts(&self) -> [(Suit, usize); 4] {
        Suit::ALL.map(|suit| (suit, self.hand.iter().filter(|c| c.suit() == suit).count()))
    }

    /// The suit with the most cards in hand. Ties go to the suit listed
    /// first in `Suit::ALL`; an empty hand yields clubs.
    #[must_use]
    pub fn most_held_suit(&self) -> Suit {
        let mut best = (Suit::Clubs, 0);
        for (suit, count) in self.suit_counts() {
            if count > best.1 {
                best = (suit, count);
            }
        }
        best.0
    }
}

/// What one seat sees of another seat: everything but the cards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub hand_count: usize,
    pub is_connected: bool,
    pub is_bot: bool,
    pub position: SeatIndex,
    pub cumulative_score: u32,
    pub round_score: u32,
    pub declared_last_card: bool,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            hand_count: player.hand_count(),
            is_connected: player.is_connected,
            is_bot: player.is_bot,
            position: player.position,
            cumulative_score: player.cumulative_score,
            round_score: player.round_score,
            declared_last_card: player.declared_last_card,
        }
    }
}

/// Projection of a match for a single viewer. Only the viewer's own hand
/// is revealed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameView {
    pub match_id: uuid::Uuid,
    pub viewer: Option<PlayerId>,
    pub hand: Vec<Card>,
    pub legal_cards: Vec<Card>,
    pub players: Vec<PlayerView>,
    pub current_player: Option<PlayerId>,
    pub direction: Direction,
    pub status: MatchStatus,
    pub top_card: Option<Card>,
    pub draw_pile_count: usize,
    pub discard_pile_count: usize,
    pub draw_count: u32,
    pub wild_suit: Option<Suit>,
    pub awaiting_suit_choice: bool,
    pub is_first_play: bool,
    pub turn_start_time: chrono::DateTime<chrono::Utc>,
    pub turn_time_limit_secs: u64,
    pub current_round: u32,
    pub max_rounds: u32,
    pub round_winners: Vec<PlayerId>,
    pub is_game_complete: bool,
    pub winner: Option<PlayerId>,
}

/// One line of a match ranking.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub name: String,
    pub cumulative_score: u32,
    pub rounds_won: usize,
}
