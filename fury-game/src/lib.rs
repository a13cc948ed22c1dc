//! Fury of Dracula hunt engine
//!
//! Platform-agnostic rules engine for a seeded, single-adversary hunt across a
//! fixed map of Europe. Four hunters are driven through commands while the
//! engine plays Dracula, whose position stays hidden behind a trail of cards.
//! No UI or I/O lives here; shells render the narration and snapshots.

pub mod adversary;
pub mod cards;
pub mod combat;
pub mod constants;
pub mod dracula;
pub mod encounters;
pub mod error;
pub mod game;
pub mod hunter;
pub mod map;
pub mod rng;
pub mod trail;

// Re-export commonly used types
pub use adversary::{FirstCandidate, MoveCandidate, MoveTrace, Sampler, Situation};
pub use cards::{EventTarget, HunterEvent, Item, Pool};
pub use combat::{Attack, Combat, CombatEnd, CombatRound, Effect, Opponent};
pub use dracula::{Dracula, Power};
pub use encounters::{Encounter, EncounterChoice};
pub use error::GameError;
pub use game::{Game, GamePhase, GameSetup, GameSnapshot, QueuedEncounter, Victor};
pub use hunter::{Hunter, HunterId, ROSTER};
pub use map::{LocationId, MapError, MapGraph, MapProblem, ModeSet, TravelMode};
pub use rng::RngBundle;
pub use trail::{CardId, CardView, Trail, TrailCard, TrailView};
