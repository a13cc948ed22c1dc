//! Hunter records and the fixed four-hunter roster.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cards::{HunterEvent, Item};
use crate::constants::{BITE_LIMIT, HUNTER_COUNT, MAX_HUNTER_EVENTS, MAX_HUNTER_ITEMS};
use crate::encounters::Encounter;
use crate::map::LocationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HunterId(pub u8);

impl HunterId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for HunterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hunter #{}", self.0)
    }
}

/// Configuration for one seat at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunterProfile {
    pub name: &'static str,
    pub max_health: u8,
    pub starting_bites: u8,
    pub start: &'static str,
}

pub const ROSTER: [HunterProfile; HUNTER_COUNT] = [
    HunterProfile {
        name: "Lord Godalming",
        max_health: 12,
        starting_bites: 0,
        start: "London",
    },
    HunterProfile {
        name: "Dr. Seward",
        max_health: 10,
        starting_bites: 0,
        start: "Paris",
    },
    HunterProfile {
        name: "Van Helsing",
        max_health: 8,
        starting_bites: 0,
        start: "Vienna",
    },
    HunterProfile {
        name: "Mina Harker",
        max_health: 8,
        starting_bites: 1,
        start: "Madrid",
    },
];

/// Cards a hunter gives up when sent to the hospital.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surrendered {
    pub items: Vec<Item>,
    pub events: Vec<HunterEvent>,
    pub tiles: Vec<Encounter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunter {
    id: HunterId,
    name: String,
    max_health: u8,
    health: u8,
    starting_bites: u8,
    bites: u8,
    location: LocationId,
    items: Vec<Item>,
    events: Vec<HunterEvent>,
    /// Encounter tiles held until the next round of hunter turns.
    tiles: Vec<Encounter>,
    group: u8,
    stalled: bool,
    moved: bool,
    acted: bool,
}

impl Hunter {
    #[must_use]
    pub fn new(id: HunterId, profile: &HunterProfile, location: LocationId) -> Self {
        Self {
            id,
            name: profile.name.to_string(),
            max_health: profile.max_health,
            health: profile.max_health,
            starting_bites: profile.starting_bites,
            bites: profile.starting_bites,
            location,
            items: Vec::new(),
            events: Vec::new(),
            tiles: Vec::new(),
            group: 0,
            stalled: false,
            moved: false,
            acted: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> HunterId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn health(&self) -> u8 {
        self.health
    }

    #[must_use]
    pub const fn max_health(&self) -> u8 {
        self.max_health
    }

    #[must_use]
    pub const fn bites(&self) -> u8 {
        self.bites
    }

    #[must_use]
    pub const fn location(&self) -> LocationId {
        self.location
    }

    pub const fn set_location(&mut self, location: LocationId) {
        self.location = location;
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn events(&self) -> &[HunterEvent] {
        &self.events
    }

    #[must_use]
    pub fn tiles(&self) -> &[Encounter] {
        &self.tiles
    }

    #[must_use]
    pub const fn group(&self) -> u8 {
        self.group
    }

    pub const fn set_group(&mut self, group: u8) {
        self.group = group;
    }

    /// Whether both hunters travel as one group.
    #[must_use]
    pub const fn travels_with(&self, other: &Self) -> bool {
        self.group != 0 && self.group == other.group
    }

    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub const fn stall(&mut self) {
        self.stalled = true;
    }

    #[must_use]
    pub const fn has_moved(&self) -> bool {
        self.moved
    }

    pub const fn mark_moved(&mut self) {
        self.moved = true;
    }

    #[must_use]
    pub const fn has_acted(&self) -> bool {
        self.acted
    }

    pub const fn mark_acted(&mut self) {
        self.acted = true;
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health == 0 || self.bites >= BITE_LIMIT
    }

    /// Reset per-round flags and hand back any held tiles.
    pub fn begin_round(&mut self) -> Vec<Encounter> {
        self.stalled = false;
        self.moved = false;
        self.acted = false;
        std::mem::take(&mut self.tiles)
    }

    pub fn hold_tile(&mut self, tile: Encounter) {
        self.tiles.push(tile);
    }

    /// Apply damage, clamped at zero. Returns the health actually lost.
    pub const fn lose_health(&mut self, amount: u8) -> u8 {
        let lost = if amount > self.health {
            self.health
        } else {
            amount
        };
        self.health -= lost;
        lost
    }

    pub fn heal(&mut self, amount: u8) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    pub const fn bite(&mut self) {
        self.bites = self.bites.saturating_add(1);
    }

    /// Remove one bite. Returns false if there was nothing to cure.
    pub const fn cure_bite(&mut self) -> bool {
        if self.bites == 0 {
            return false;
        }
        self.bites -= 1;
        true
    }

    /// Basic combat moves are always held.
    #[must_use]
    pub fn has_item(&self, item: Item) -> bool {
        !item.is_card() || self.items.contains(&item)
    }

    #[must_use]
    pub fn has_event(&self, event: HunterEvent) -> bool {
        self.events.contains(&event)
    }

    /// Items this hunter could submit this round.
    #[must_use]
    pub fn usable_items(&self) -> Vec<Item> {
        let mut usable: Vec<Item> = Item::ALWAYS_AVAILABLE.to_vec();
        for item in &self.items {
            if !usable.contains(item) {
                usable.push(*item);
            }
        }
        usable
    }

    /// Add an item, discarding a random card if the hand overflows.
    pub fn gain_item<R: Rng + ?Sized>(&mut self, item: Item, rng: &mut R) -> Option<Item> {
        self.items.push(item);
        if self.items.len() > MAX_HUNTER_ITEMS {
            let idx = rng.gen_range(0..self.items.len());
            return Some(self.items.remove(idx));
        }
        None
    }

    pub fn gain_event<R: Rng + ?Sized>(
        &mut self,
        event: HunterEvent,
        rng: &mut R,
    ) -> Option<HunterEvent> {
        self.events.push(event);
        if self.events.len() > MAX_HUNTER_EVENTS {
            let idx = rng.gen_range(0..self.events.len());
            return Some(self.events.remove(idx));
        }
        None
    }

    /// Remove one copy of a held item card.
    pub fn take_item(&mut self, item: Item) -> bool {
        self.items
            .iter()
            .position(|held| *held == item)
            .map(|idx| self.items.remove(idx))
            .is_some()
    }

    pub fn take_event(&mut self, event: HunterEvent) -> bool {
        self.events
            .iter()
            .position(|held| *held == event)
            .map(|idx| self.events.remove(idx))
            .is_some()
    }

    pub fn take_random_item<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Item> {
        if self.items.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.items.len());
        Some(self.items.remove(idx))
    }

    pub fn take_random_event<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<HunterEvent> {
        if self.events.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.events.len());
        Some(self.events.remove(idx))
    }

    pub fn take_all_items(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.items)
    }

    /// Send a defeated hunter to the hospital at full health.
    pub fn send_to_hospital(&mut self, hospital: LocationId) -> Surrendered {
        self.location = hospital;
        self.health = self.max_health;
        self.bites = self.starting_bites.min(BITE_LIMIT.saturating_sub(1));
        self.group = 0;
        self.stalled = true;
        Surrendered {
            items: std::mem::take(&mut self.items),
            events: std::mem::take(&mut self.events),
            tiles: std::mem::take(&mut self.tiles),
        }
    }
}

/// Rail hops allowed by a d6 roll.
#[must_use]
pub const fn rail_hops(roll: u8) -> u8 {
    match roll {
        0..=2 => 0,
        3 | 4 => 1,
        5 => 2,
        _ => 3,
    }
}
