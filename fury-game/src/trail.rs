//! Dracula's trail and catacombs.
//!
//! The trail is ordered newest first. Cards only ever enter at the head and
//! age toward the tail; once the trail is over capacity the tail card either
//! retires to the catacombs or drops off. Revealing is one way.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::cards::Pool;
use crate::constants::{
    CATACOMB_CAPACITY, CATACOMB_DISCARD_CHANCE, CATACOMB_RECYCLE_CHANCE,
    DOUBLE_BACK_KEEP_CATACOMB_WEIGHT, DOUBLE_BACK_KEEP_ORIGINAL_WEIGHT, TRAIL_CAPACITY,
};
use crate::dracula::Power;
use crate::encounters::Encounter;
use crate::error::GameError;
use crate::map::{LocationId, MapGraph};

/// Stable identity of a card for as long as it stays in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailCard {
    id: CardId,
    revealed: bool,
    location: Option<LocationId>,
    encounter: Option<Encounter>,
    /// Extra encounter drawn when the card retired to the catacombs.
    catacomb_encounter: Option<Encounter>,
    power: Option<Power>,
    /// Power that brought the card back to the head, kept apart from the
    /// power it was first played with.
    #[serde(default)]
    returned_by: Option<Power>,
}

impl TrailCard {
    #[must_use]
    pub const fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub const fn reveal(&mut self) {
        self.revealed = true;
    }

    #[must_use]
    pub const fn location(&self) -> Option<LocationId> {
        self.location
    }

    #[must_use]
    pub const fn power(&self) -> Option<Power> {
        self.power
    }

    #[must_use]
    pub const fn returned_by(&self) -> Option<Power> {
        self.returned_by
    }

    /// Record the power that brought the card back into play.
    pub const fn mark_returned(&mut self, power: Power) {
        self.returned_by = Some(power);
    }

    #[must_use]
    pub const fn encounter(&self) -> Option<Encounter> {
        self.encounter
    }

    #[must_use]
    pub const fn catacomb_encounter(&self) -> Option<Encounter> {
        self.catacomb_encounter
    }

    #[must_use]
    pub const fn holds_encounter(&self) -> bool {
        self.encounter.is_some() || self.catacomb_encounter.is_some()
    }

    /// Place an encounter, returning any encounter it displaced.
    pub const fn set_encounter(&mut self, encounter: Encounter) -> Option<Encounter> {
        self.encounter.replace(encounter)
    }

    /// Remove every encounter on the card, primary first.
    pub fn take_encounters(&mut self) -> Vec<Encounter> {
        self.encounter
            .take()
            .into_iter()
            .chain(self.catacomb_encounter.take())
            .collect()
    }
}

/// Where a card currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum CardSlot {
    Trail(usize),
    Catacomb(usize),
}

/// What happened to the tail when the trail overflowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overflow {
    None,
    Catacombed(CardId),
    /// The card left play; its encounter, if any, needs a fate decision.
    Dropped(TrailCard),
}

/// Cards matched by a search and the encounters lifted from them, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub revealed: Vec<CardId>,
    pub encounters: Vec<Encounter>,
}

impl SearchResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }
}

/// Player-facing rendering of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CardView {
    Concealed,
    Revealed {
        location: Option<LocationId>,
        power: Option<Power>,
        encounter: Option<Encounter>,
    },
}

impl From<&TrailCard> for CardView {
    fn from(card: &TrailCard) -> Self {
        if card.revealed {
            Self::Revealed {
                location: card.location,
                power: card.power,
                encounter: card.encounter,
            }
        } else {
            Self::Concealed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailView {
    pub trail: Vec<CardView>,
    pub catacombs: Vec<CardView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trail {
    cards: VecDeque<TrailCard>,
    catacombs: Vec<TrailCard>,
    next_id: u32,
}

impl Trail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh card. A card must name a location, a power, or both.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] for a card with neither.
    pub fn new_card(
        &mut self,
        location: Option<LocationId>,
        power: Option<Power>,
    ) -> Result<TrailCard, GameError> {
        if location.is_none() && power.is_none() {
            return Err(GameError::Invariant(
                "trail card needs a location or a power".into(),
            ));
        }
        let id = CardId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        Ok(TrailCard {
            id,
            revealed: false,
            location,
            encounter: None,
            catacomb_encounter: None,
            power,
            returned_by: None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> impl Iterator<Item = &TrailCard> {
        self.cards.iter()
    }

    #[must_use]
    pub fn catacombs(&self) -> &[TrailCard] {
        &self.catacombs
    }

    #[must_use]
    pub fn head(&self) -> Option<&TrailCard> {
        self.cards.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut TrailCard> {
        self.cards.front_mut()
    }

    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&TrailCard> {
        self.cards
            .iter()
            .chain(&self.catacombs)
            .find(|card| card.id == id)
    }

    #[must_use]
    pub fn slot_of(&self, id: CardId) -> Option<CardSlot> {
        if let Some(idx) = self.cards.iter().position(|card| card.id == id) {
            return Some(CardSlot::Trail(idx));
        }
        self.catacombs
            .iter()
            .position(|card| card.id == id)
            .map(CardSlot::Catacomb)
    }

    pub fn push_head(&mut self, card: TrailCard) {
        self.cards.push_front(card);
    }

    pub fn pop_head(&mut self) -> Option<TrailCard> {
        self.cards.pop_front()
    }

    /// Retire the tail card once the trail is over capacity.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PoolExhausted`] if a catacomb encounter cannot be drawn.
    pub fn evaluate_overflow<R: Rng + ?Sized>(
        &mut self,
        map: &MapGraph,
        pool: &mut Pool<Encounter>,
        rng: &mut R,
    ) -> Result<Overflow, GameError> {
        if self.cards.len() <= TRAIL_CAPACITY {
            return Ok(Overflow::None);
        }
        let Some(mut tail) = self.cards.pop_back() else {
            return Ok(Overflow::None);
        };
        let eligible = self.catacombs.len() < CATACOMB_CAPACITY
            && tail.location.is_some_and(|loc| !map.is_sea(loc));
        if eligible && rng.gen_bool(CATACOMB_RECYCLE_CHANCE) {
            tail.catacomb_encounter = Some(pool.draw(rng)?);
            let id = tail.id;
            log::debug!("trail card {id:?} retires to the catacombs");
            self.catacombs.push(tail);
            return Ok(Overflow::Catacombed(id));
        }
        log::debug!("trail card {:?} drops off the trail", tail.id);
        Ok(Overflow::Dropped(tail))
    }

    /// Bring a catacomb card back to the head of the trail.
    ///
    /// When the card carries two encounters, one is kept at random and the
    /// other goes back into the pool.
    pub fn double_back<R: Rng + ?Sized>(
        &mut self,
        catacomb_index: usize,
        pool: &mut Pool<Encounter>,
        rng: &mut R,
    ) -> Option<CardId> {
        if catacomb_index >= self.catacombs.len() {
            return None;
        }
        let mut card = self.catacombs.remove(catacomb_index);
        match (card.encounter, card.catacomb_encounter.take()) {
            (Some(original), Some(extra)) => {
                let total = DOUBLE_BACK_KEEP_ORIGINAL_WEIGHT + DOUBLE_BACK_KEEP_CATACOMB_WEIGHT;
                let (kept, returned) = if rng.gen_range(0..total) < DOUBLE_BACK_KEEP_ORIGINAL_WEIGHT {
                    (original, extra)
                } else {
                    (extra, original)
                };
                log::debug!("double back keeps {kept} and returns {returned}");
                card.encounter = Some(kept);
                pool.discard(returned, rng);
            }
            (None, Some(extra)) => card.encounter = Some(extra),
            _ => {}
        }
        let id = card.id;
        self.cards.push_front(card);
        Some(id)
    }

    /// Bring a live trail card back to the head.
    pub fn double_back_trail(&mut self, index: usize) -> Option<CardId> {
        let card = self.cards.remove(index)?;
        let id = card.id;
        self.cards.push_front(card);
        Some(id)
    }

    /// Discard catacomb cards during timekeeping.
    ///
    /// `keep` is never discarded; `discard` always is, as is any card with no
    /// encounter left. Other cards go with a fixed chance. Encounters on
    /// discarded cards return to the pool.
    pub fn evaluate_catacombs<R: Rng + ?Sized>(
        &mut self,
        keep: Option<CardId>,
        discard: Option<CardId>,
        pool: &mut Pool<Encounter>,
        rng: &mut R,
    ) -> Vec<CardId> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.catacombs.len());
        for mut card in std::mem::take(&mut self.catacombs) {
            let goes = if Some(card.id) == keep {
                false
            } else {
                Some(card.id) == discard
                    || !card.holds_encounter()
                    || rng.gen_bool(CATACOMB_DISCARD_CHANCE)
            };
            if goes {
                pool.discard_all(card.take_encounters(), rng);
                removed.push(card.id);
            } else {
                kept.push(card);
            }
        }
        self.catacombs = kept;
        if !removed.is_empty() {
            log::debug!("catacomb cards discarded: {removed:?}");
        }
        removed
    }

    /// Reveal every card at `location`, lifting its encounters for resolution.
    ///
    /// A Hide card directly ahead of a matched trail card is revealed too.
    pub fn search(&mut self, location: LocationId) -> SearchResult {
        let mut result = SearchResult::default();
        let matches: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.location == Some(location))
            .map(|(idx, _)| idx)
            .collect();
        for idx in matches {
            if idx > 0 && self.cards[idx - 1].power == Some(Power::Hide) {
                self.cards[idx - 1].reveal();
            }
            let card = &mut self.cards[idx];
            card.reveal();
            result.revealed.push(card.id);
            result.encounters.extend(card.take_encounters());
        }
        for card in &mut self.catacombs {
            if card.location == Some(location) {
                card.reveal();
                result.revealed.push(card.id);
                result.encounters.extend(card.take_encounters());
            }
        }
        result
    }

    /// Reveal cards at `location` without disturbing their encounters.
    pub fn reveal_at(&mut self, location: LocationId) -> usize {
        let mut count = 0;
        for card in self.cards.iter_mut().chain(self.catacombs.iter_mut()) {
            if card.location == Some(location) && !card.revealed {
                card.reveal();
                count += 1;
            }
        }
        count
    }

    /// Reveal the oldest concealed trail card.
    pub fn reveal_oldest(&mut self) -> Option<CardId> {
        let card = self.cards.iter_mut().rev().find(|card| !card.revealed)?;
        card.reveal();
        Some(card.id)
    }

    /// Replace the whole trail with a single card, clearing the catacombs.
    pub fn truncate_to<R: Rng + ?Sized>(
        &mut self,
        card: TrailCard,
        pool: &mut Pool<Encounter>,
        rng: &mut R,
    ) {
        let displaced: Vec<Encounter> = self
            .cards
            .drain(..)
            .chain(self.catacombs.drain(..))
            .flat_map(|mut old| old.take_encounters())
            .collect();
        pool.discard_all(displaced, rng);
        self.cards.push_front(card);
    }

    /// Locations of live trail and catacomb cards.
    #[must_use]
    pub fn occupied_locations(&self, unrevealed_only: bool) -> Vec<LocationId> {
        let mut out: Vec<LocationId> = self
            .cards
            .iter()
            .chain(&self.catacombs)
            .filter(|card| !unrevealed_only || !card.revealed)
            .filter_map(|card| card.location)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Powers present on the live trail, compounds expanded.
    #[must_use]
    pub fn used_powers(&self) -> Vec<Power> {
        let mut out: Vec<Power> = self
            .cards
            .iter()
            .flat_map(|card| card.power.into_iter().chain(card.returned_by))
            .flat_map(|power| {
                std::iter::once(power).chain(power.constituents().iter().copied())
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    #[must_use]
    pub fn catacomb_locations(&self) -> Vec<(usize, LocationId)> {
        self.catacombs
            .iter()
            .enumerate()
            .filter_map(|(idx, card)| card.location.map(|loc| (idx, loc)))
            .collect()
    }

    #[must_use]
    pub fn view(&self) -> TrailView {
        TrailView {
            trail: self.cards.iter().map(CardView::from).collect(),
            catacombs: self.catacombs.iter().map(CardView::from).collect(),
        }
    }

    /// Check the capacity and card-shape invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] describing the first violation.
    pub fn check(&self) -> Result<(), GameError> {
        if self.cards.len() > TRAIL_CAPACITY {
            return Err(GameError::Invariant(format!(
                "trail holds {} cards",
                self.cards.len()
            )));
        }
        if self.catacombs.len() > CATACOMB_CAPACITY {
            return Err(GameError::Invariant(format!(
                "catacombs hold {} cards",
                self.catacombs.len()
            )));
        }
        if let Some(card) = self
            .cards
            .iter()
            .chain(&self.catacombs)
            .find(|card| card.location.is_none() && card.power.is_none())
        {
            return Err(GameError::Invariant(format!(
                "card {:?} has neither location nor power",
                card.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounters::encounter_pool;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn push_then_pop_returns_the_same_card() {
        let mut trail = Trail::new();
        let mut card = trail.new_card(Some(LocationId(3)), None).unwrap();
        card.set_encounter(Encounter::Rats);
        trail.push_head(card.clone());
        assert_eq!(trail.pop_head(), Some(card));
        assert!(trail.is_empty());
    }

    #[test]
    fn blank_cards_are_rejected() {
        let mut trail = Trail::new();
        assert!(trail.new_card(None, None).is_err());
        assert!(trail.new_card(None, Some(Power::Hide)).is_ok());
    }

    #[test]
    fn search_reveals_hide_ahead_of_match() {
        let mut trail = Trail::new();
        let mut older = trail.new_card(Some(LocationId(4)), None).unwrap();
        older.set_encounter(Encounter::Plague);
        trail.push_head(older);
        let hide = trail.new_card(None, Some(Power::Hide)).unwrap();
        trail.push_head(hide);

        let result = trail.search(LocationId(4));
        assert_eq!(result.encounters, vec![Encounter::Plague]);
        assert!(trail.cards().all(TrailCard::is_revealed));
    }

    #[test]
    fn double_back_keeps_exactly_one_encounter() {
        let mut rng = SmallRng::seed_from_u64(8);
        let mut pool = encounter_pool(&mut rng);
        let before = pool.len();
        let mut trail = Trail::new();
        let mut card = trail.new_card(Some(LocationId(1)), None).unwrap();
        card.set_encounter(Encounter::Thief);
        card.catacomb_encounter = Some(Encounter::Bats);
        trail.catacombs.push(card);

        let id = trail.double_back(0, &mut pool, &mut rng).unwrap();
        let head = trail.head().unwrap();
        assert_eq!(head.id(), id);
        assert!(head.encounter().is_some());
        assert!(head.catacomb_encounter().is_none());
        assert_eq!(pool.len(), before + 1);
    }

    #[test]
    fn forced_and_empty_catacomb_cards_are_discarded() {
        let mut rng = SmallRng::seed_from_u64(8);
        let mut pool = Pool::empty("encounter");
        let mut trail = Trail::new();
        let mut forced = trail.new_card(Some(LocationId(1)), None).unwrap();
        forced.catacomb_encounter = Some(Encounter::Fog);
        let empty = trail.new_card(Some(LocationId(2)), None).unwrap();
        let mut protected = trail.new_card(Some(LocationId(3)), None).unwrap();
        protected.catacomb_encounter = Some(Encounter::Rats);
        let (forced_id, empty_id, protected_id) = (forced.id, empty.id, protected.id);
        trail.catacombs = vec![forced, empty, protected];

        let removed = trail.evaluate_catacombs(Some(protected_id), Some(forced_id), &mut pool, &mut rng);
        assert_eq!(removed, vec![forced_id, empty_id]);
        assert_eq!(trail.catacombs().len(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn returned_cards_report_both_powers() {
        let mut trail = Trail::new();
        let mut card = trail.new_card(Some(LocationId(2)), Some(Power::Feed)).unwrap();
        card.mark_returned(Power::WolfFormAndDoubleBack);
        trail.push_head(card);
        assert_eq!(
            trail.used_powers(),
            vec![
                Power::Feed,
                Power::DoubleBack,
                Power::WolfForm,
                Power::WolfFormAndDoubleBack
            ]
        );
        assert_eq!(trail.head().unwrap().power(), Some(Power::Feed));
    }
}
