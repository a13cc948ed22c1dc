//! Fixed rule constants for the hunt.
//!
//! The ruleset is not configurable; every tunable number lives here so that
//! gameplay can only change through reviewed code.

// Trail and catacombs --------------------------------------------------------
pub const TRAIL_CAPACITY: usize = 6;
pub const CATACOMB_CAPACITY: usize = 3;
/// Chance that a card dropping off the trail is recycled into the catacombs.
pub const CATACOMB_RECYCLE_CHANCE: f64 = 0.2;
/// Chance that an existing catacomb card is discarded during timekeeping.
pub const CATACOMB_DISCARD_CHANCE: f64 = 0.2;
/// Weight of the original encounter when a doubled-back catacomb card holds two.
pub const DOUBLE_BACK_KEEP_ORIGINAL_WEIGHT: u32 = 1;
/// Weight of the catacomb encounter when a doubled-back catacomb card holds two.
pub const DOUBLE_BACK_KEEP_CATACOMB_WEIGHT: u32 = 1;

// Dracula ----------------------------------------------------------------------
pub const DRACULA_MAX_BLOOD: u8 = 15;
pub const HAND_CAPACITY: usize = 5;
pub const DARK_CALL_HAND_BONUS: usize = 10;
pub const SEA_BLOOD_COST: u8 = 1;
/// Blood is knocked down to the next lower multiple of this on forced defeat.
pub const BLOOD_DEFEAT_STEP: u8 = 5;
pub const WOLF_FORM_ROAD_RANGE: u32 = 2;

// Time -------------------------------------------------------------------------
pub const TIME_PHASES: u8 = 6;
/// First time counter value that counts as night.
pub const NIGHT_STARTS_AT: u8 = 3;
pub const VAMPIRE_VICTORY_THRESHOLD: u8 = 6;

// Hunters ----------------------------------------------------------------------
pub const MAX_HUNTER_ITEMS: usize = 3;
pub const MAX_HUNTER_EVENTS: usize = 3;
pub const BITE_LIMIT: u8 = 2;
pub const HUNTER_COUNT: usize = 4;

// Map --------------------------------------------------------------------------
/// Longest rail route a single train move can cover.
pub const RAIL_ROUTE_MAX_HOPS: usize = 3;

// Combat -----------------------------------------------------------------------
pub const COMBAT_DIE_SIDES: u8 = 6;
pub const COMBAT_ROUND_LIMIT: u8 = 12;

// Decks ------------------------------------------------------------------------
pub(crate) const ENCOUNTER_DECK: &[(crate::encounters::Encounter, u8)] = &[
    (crate::encounters::Encounter::Ambush, 3),
    (crate::encounters::Encounter::Bats, 3),
    (crate::encounters::Encounter::DesecratedSoil, 3),
    (crate::encounters::Encounter::Fog, 4),
    (crate::encounters::Encounter::Hoax, 2),
    (crate::encounters::Encounter::Lightning, 2),
    (crate::encounters::Encounter::MinionWithKnife, 3),
    (crate::encounters::Encounter::MinionWithPistol, 3),
    (crate::encounters::Encounter::MinionWithRifle, 2),
    (crate::encounters::Encounter::NewVampire, 5),
    (crate::encounters::Encounter::Peasants, 4),
    (crate::encounters::Encounter::Plague, 2),
    (crate::encounters::Encounter::Rats, 3),
    (crate::encounters::Encounter::Saboteur, 2),
    (crate::encounters::Encounter::Thief, 3),
    (crate::encounters::Encounter::Wolves, 3),
];

pub(crate) const ITEM_DECK: &[(crate::cards::Item, u8)] = &[
    (crate::cards::Item::Knife, 4),
    (crate::cards::Item::Pistol, 4),
    (crate::cards::Item::Rifle, 3),
    (crate::cards::Item::Stake, 3),
    (crate::cards::Item::SacredBullets, 3),
    (crate::cards::Item::Crucifix, 3),
];

pub(crate) const EVENT_DECK: &[(crate::cards::HunterEvent, u8)] = &[
    (crate::cards::HunterEvent::HiredScouts, 4),
    (crate::cards::HunterEvent::NewspaperReports, 5),
    (crate::cards::HunterEvent::BloodTransfusion, 4),
    (crate::cards::HunterEvent::Forewarned, 4),
    (crate::cards::HunterEvent::GoodLuck, 3),
];
