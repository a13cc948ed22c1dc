//! Dracula's record, power catalog and encounter hand.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::adversary::MoveCandidate;
use crate::cards::Pool;
use crate::constants::{
    BLOOD_DEFEAT_STEP, DARK_CALL_HAND_BONUS, DRACULA_MAX_BLOOD, HAND_CAPACITY, SEA_BLOOD_COST,
};
use crate::encounters::Encounter;
use crate::error::GameError;
use crate::map::LocationId;

/// Special moves Dracula may take instead of, or alongside, a location change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Power {
    DarkCall,
    DoubleBack,
    Feed,
    Hide,
    WolfForm,
    WolfFormAndDoubleBack,
}

impl Power {
    pub const ALL: [Self; 6] = [
        Self::DarkCall,
        Self::DoubleBack,
        Self::Feed,
        Self::Hide,
        Self::WolfForm,
        Self::WolfFormAndDoubleBack,
    ];

    #[must_use]
    pub const fn night_only(self) -> bool {
        matches!(self, Self::DarkCall | Self::Feed)
    }

    /// Blood spent on use. Negative costs restore blood.
    #[must_use]
    pub const fn blood_cost(self) -> i8 {
        match self {
            Self::DarkCall => 10,
            Self::Feed => -1,
            Self::DoubleBack | Self::Hide => 0,
            Self::WolfForm | Self::WolfFormAndDoubleBack => 4,
        }
    }

    /// Simple powers a compound power is made of.
    #[must_use]
    pub const fn constituents(self) -> &'static [Self] {
        match self {
            Self::WolfFormAndDoubleBack => &[Self::WolfForm, Self::DoubleBack],
            Self::DarkCall => &[Self::DarkCall],
            Self::DoubleBack => &[Self::DoubleBack],
            Self::Feed => &[Self::Feed],
            Self::Hide => &[Self::Hide],
            Self::WolfForm => &[Self::WolfForm],
        }
    }

    #[must_use]
    pub const fn is_compound(self) -> bool {
        self.constituents().len() > 1
    }

    /// Whether a card carrying this power also receives an encounter.
    #[must_use]
    pub const fn places_encounter(self) -> bool {
        !matches!(
            self,
            Self::Hide | Self::WolfForm | Self::WolfFormAndDoubleBack
        )
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DarkCall => "Dark Call",
            Self::DoubleBack => "Double Back",
            Self::Feed => "Feed",
            Self::Hide => "Hide",
            Self::WolfForm => "Wolf Form",
            Self::WolfFormAndDoubleBack => "Wolf Form + Double Back",
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dracula {
    blood: u8,
    location: LocationId,
    revealed: bool,
    hand: Vec<Encounter>,
    hand_capacity: usize,
    sea_blood_paid: bool,
    next_move: Option<MoveCandidate>,
}

impl Dracula {
    #[must_use]
    pub const fn new(location: LocationId) -> Self {
        Self {
            blood: DRACULA_MAX_BLOOD,
            location,
            revealed: false,
            hand: Vec::new(),
            hand_capacity: HAND_CAPACITY,
            sea_blood_paid: false,
            next_move: None,
        }
    }

    #[must_use]
    pub const fn blood(&self) -> u8 {
        self.blood
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.blood == 0
    }

    /// Remove blood, clamped at zero. Returns the amount actually lost.
    pub const fn lose_blood(&mut self, amount: u8) -> u8 {
        let lost = if amount > self.blood {
            self.blood
        } else {
            amount
        };
        self.blood -= lost;
        lost
    }

    pub fn gain_blood(&mut self, amount: u8) {
        self.blood = self.blood.saturating_add(amount).min(DRACULA_MAX_BLOOD);
    }

    pub const fn kill(&mut self) {
        self.blood = 0;
    }

    /// Pay a power's cost. Negative costs heal.
    pub fn pay_for(&mut self, power: Power) {
        let cost = power.blood_cost();
        if cost >= 0 {
            self.lose_blood(cost.unsigned_abs());
        } else {
            self.gain_blood(cost.unsigned_abs());
        }
    }

    /// Blood penalty for running out of legal moves. Returns the new blood.
    pub const fn suffer_defeat(&mut self) -> u8 {
        self.blood = (self.blood.saturating_sub(1) / BLOOD_DEFEAT_STEP) * BLOOD_DEFEAT_STEP;
        self.blood
    }

    #[must_use]
    pub const fn location(&self) -> LocationId {
        self.location
    }

    pub const fn set_location(&mut self, location: LocationId) {
        self.location = location;
    }

    #[must_use]
    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub const fn reveal(&mut self) {
        self.revealed = true;
    }

    pub const fn conceal(&mut self) {
        self.revealed = false;
    }

    #[must_use]
    pub const fn sea_blood_paid(&self) -> bool {
        self.sea_blood_paid
    }

    /// Charge for a sea crossing once per voyage. Returns the blood paid.
    pub const fn enter_sea(&mut self) -> u8 {
        if self.sea_blood_paid {
            return 0;
        }
        self.sea_blood_paid = true;
        self.lose_blood(SEA_BLOOD_COST)
    }

    pub const fn make_landfall(&mut self) {
        self.sea_blood_paid = false;
    }

    #[must_use]
    pub const fn next_move(&self) -> Option<&MoveCandidate> {
        self.next_move.as_ref()
    }

    pub fn set_next_move(&mut self, candidate: MoveCandidate) {
        self.next_move = Some(candidate);
    }

    pub const fn take_next_move(&mut self) -> Option<MoveCandidate> {
        self.next_move.take()
    }

    #[must_use]
    pub fn hand(&self) -> &[Encounter] {
        &self.hand
    }

    #[must_use]
    pub const fn hand_capacity(&self) -> usize {
        self.hand_capacity
    }

    /// Remove and return the encounter at `index`.
    pub fn play_from_hand(&mut self, index: usize) -> Option<Encounter> {
        (index < self.hand.len()).then(|| self.hand.remove(index))
    }

    /// Draw until the hand is at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PoolExhausted`] if the pool runs dry first.
    pub fn refill_hand<R: Rng + ?Sized>(
        &mut self,
        pool: &mut Pool<Encounter>,
        rng: &mut R,
    ) -> Result<usize, GameError> {
        let mut drawn = 0;
        while self.hand.len() < self.hand_capacity {
            self.hand.push(pool.draw(rng)?);
            drawn += 1;
        }
        Ok(drawn)
    }

    /// Discard random encounters until the hand fits its capacity.
    pub fn discard_to_capacity<R: Rng + ?Sized>(
        &mut self,
        pool: &mut Pool<Encounter>,
        rng: &mut R,
    ) -> usize {
        let mut discarded = 0;
        while self.hand.len() > self.hand_capacity {
            let idx = rng.gen_range(0..self.hand.len());
            pool.discard(self.hand.remove(idx), rng);
            discarded += 1;
        }
        discarded
    }

    /// Dark Call: draw up to the enlarged capacity, then cut back to normal.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PoolExhausted`] if the pool runs dry.
    pub fn dark_call<R: Rng + ?Sized>(
        &mut self,
        pool: &mut Pool<Encounter>,
        rng: &mut R,
    ) -> Result<(), GameError> {
        self.hand_capacity = HAND_CAPACITY + DARK_CALL_HAND_BONUS;
        let refill = self.refill_hand(pool, rng);
        self.hand_capacity = HAND_CAPACITY;
        refill?;
        self.discard_to_capacity(pool, rng);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ENCOUNTER_DECK;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn defeat_drops_blood_to_lower_step() {
        for (start, expected) in [(15, 10), (6, 5), (5, 0), (1, 0), (11, 10)] {
            let mut dracula = Dracula::new(LocationId(0));
            dracula.lose_blood(15 - start);
            assert_eq!(dracula.suffer_defeat(), expected, "from {start}");
        }
    }

    #[test]
    fn blood_is_clamped() {
        let mut dracula = Dracula::new(LocationId(0));
        dracula.pay_for(Power::Feed);
        assert_eq!(dracula.blood(), 15);
        assert_eq!(dracula.lose_blood(40), 15);
        assert!(dracula.is_dead());
    }

    #[test]
    fn sea_blood_is_paid_once_per_voyage() {
        let mut dracula = Dracula::new(LocationId(0));
        assert_eq!(dracula.enter_sea(), 1);
        assert_eq!(dracula.enter_sea(), 0);
        dracula.make_landfall();
        assert_eq!(dracula.enter_sea(), 1);
        assert_eq!(dracula.blood(), 13);
    }

    #[test]
    fn dark_call_leaves_a_normal_hand() {
        let mut rng = SmallRng::seed_from_u64(21);
        let mut pool = Pool::from_counts("encounter", ENCOUNTER_DECK, &mut rng);
        let total = pool.len();
        let mut dracula = Dracula::new(LocationId(0));
        dracula.refill_hand(&mut pool, &mut rng).unwrap();
        dracula.dark_call(&mut pool, &mut rng).unwrap();
        assert_eq!(dracula.hand().len(), HAND_CAPACITY);
        assert_eq!(pool.len() + dracula.hand().len(), total);
    }

    #[test]
    fn compound_power_lists_both_parts() {
        assert!(Power::WolfFormAndDoubleBack.is_compound());
        assert!(!Power::WolfFormAndDoubleBack.places_encounter());
        assert!(Power::DarkCall.places_encounter());
        assert_eq!(Power::Feed.blood_cost(), -1);
    }
}
