//! Hunter card vocabulary and the shuffled pools every deck is drawn from.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combat::Opponent;
use crate::constants::{EVENT_DECK, ITEM_DECK};
use crate::error::GameError;
use crate::hunter::HunterId;
use crate::map::LocationId;

/// Anything a hunter can bring to a combat round.
///
/// `Punch`, `Dodge` and `Escape` are always available and never held as
/// cards; the rest come from the item deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Punch,
    Dodge,
    Escape,
    Knife,
    Pistol,
    Rifle,
    Stake,
    SacredBullets,
    Crucifix,
}

impl Item {
    pub const ALWAYS_AVAILABLE: [Self; 3] = [Self::Punch, Self::Dodge, Self::Escape];

    /// Whether the item is a card that must be held to be used.
    #[must_use]
    pub const fn is_card(self) -> bool {
        !matches!(self, Self::Punch | Self::Dodge | Self::Escape)
    }

    #[must_use]
    pub const fn is_firearm(self) -> bool {
        matches!(self, Self::Pistol | Self::Rifle)
    }

    /// Whether the item may be submitted in a round against `opponent`.
    ///
    /// Holy items only work on Dracula himself.
    #[must_use]
    pub const fn usable_against(self, opponent: Opponent) -> bool {
        match self {
            Self::Stake | Self::SacredBullets | Self::Crucifix => opponent.is_dracula(),
            _ => true,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Punch => "Punch",
            Self::Dodge => "Dodge",
            Self::Escape => "Escape",
            Self::Knife => "Knife",
            Self::Pistol => "Pistol",
            Self::Rifle => "Rifle",
            Self::Stake => "Stake",
            Self::SacredBullets => "Sacred Bullets",
            Self::Crucifix => "Crucifix",
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterEvent {
    /// Reveal every trail and catacomb card at a chosen location.
    HiredScouts,
    /// Reveal the oldest concealed trail card.
    NewspaperReports,
    /// Cure one bite.
    BloodTransfusion,
    /// Cancel the next queued encounter.
    Forewarned,
    /// Add a roll bonus to the next combat round.
    GoodLuck,
}

impl HunterEvent {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HiredScouts => "Hired Scouts",
            Self::NewspaperReports => "Newspaper Reports",
            Self::BloodTransfusion => "Blood Transfusion",
            Self::Forewarned => "Forewarned",
            Self::GoodLuck => "Good Luck",
        }
    }
}

impl fmt::Display for HunterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Target chosen when playing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventTarget {
    #[default]
    None,
    Location(LocationId),
    Hunter(HunterId),
}

/// Shuffled draw pool. Every mutation leaves the pool freshly shuffled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool<T> {
    name: &'static str,
    cards: Vec<T>,
}

impl<T: Copy> Pool<T> {
    /// Build a pool from `(card, copies)` pairs and shuffle it.
    pub fn from_counts<R: Rng + ?Sized>(name: &'static str, counts: &[(T, u8)], rng: &mut R) -> Self {
        let cards = counts
            .iter()
            .flat_map(|(card, copies)| std::iter::repeat_n(*card, usize::from(*copies)))
            .collect();
        let mut pool = Self { name, cards };
        pool.shuffle(rng);
        pool
    }

    #[must_use]
    pub const fn empty(name: &'static str) -> Self {
        Self {
            name,
            cards: Vec::new(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cards.iter()
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Take the top card.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PoolExhausted`] when the pool is empty.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<T, GameError> {
        let card = self
            .cards
            .pop()
            .ok_or(GameError::PoolExhausted { pool: self.name })?;
        self.shuffle(rng);
        Ok(card)
    }

    /// Return a card to the pool.
    pub fn discard<R: Rng + ?Sized>(&mut self, card: T, rng: &mut R) {
        self.cards.push(card);
        self.shuffle(rng);
    }

    pub fn discard_all<R, I>(&mut self, cards: I, rng: &mut R)
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = T>,
    {
        self.cards.extend(cards);
        self.shuffle(rng);
    }
}

pub fn item_deck<R: Rng + ?Sized>(rng: &mut R) -> Pool<Item> {
    Pool::from_counts("item", ITEM_DECK, rng)
}

pub fn event_deck<R: Rng + ?Sized>(rng: &mut R) -> Pool<HunterEvent> {
    Pool::from_counts("event", EVENT_DECK, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn decks_hold_their_configured_counts() {
        let mut rng = SmallRng::seed_from_u64(11);
        let items = item_deck(&mut rng);
        assert_eq!(items.len(), 20);
        assert_eq!(items.iter().filter(|item| **item == Item::Stake).count(), 3);
        assert!(items.iter().all(|item| item.is_card()));
        assert_eq!(event_deck(&mut rng).len(), 20);
    }

    #[test]
    fn empty_pool_draw_is_an_error() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut pool: Pool<Item> = Pool::empty("item");
        let err = pool.draw(&mut rng).unwrap_err();
        assert!(matches!(err, GameError::PoolExhausted { pool: "item" }));
        pool.discard(Item::Knife, &mut rng);
        assert_eq!(pool.draw(&mut rng).unwrap(), Item::Knife);
        assert!(pool.is_empty());
    }

    #[test]
    fn holy_items_are_reserved_for_dracula() {
        assert!(Item::Stake.usable_against(Opponent::Dracula));
        assert!(!Item::Crucifix.usable_against(Opponent::MinionWithKnife));
        assert!(Item::Punch.usable_against(Opponent::MinionWithRifle));
    }
}
