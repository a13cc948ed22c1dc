//! Dracula's decision heuristics.
//!
//! Candidate generation and sampling are separate: [`move_candidates`] lists
//! every legal option with a weight and [`sample`] picks one through a
//! [`Sampler`], recording a [`MoveTrace`] of the draw.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{Attack, Opponent};
use crate::constants::WOLF_FORM_ROAD_RANGE;
use crate::dracula::{Dracula, Power};
use crate::encounters::Encounter;
use crate::map::{LocationId, MapGraph, ModeSet};
use crate::trail::{CardId, Trail, TrailCard};

/// One option for Dracula's next turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCandidate {
    /// Where Dracula ends up; `None` when he stays hidden in place.
    pub destination: Option<LocationId>,
    pub power: Option<Power>,
    /// Card brought back to the head by a double back.
    pub double_back: Option<CardId>,
    /// Catacomb card at the destination that must be discarded.
    pub discard_target: Option<CardId>,
    pub weight: u32,
}

impl MoveCandidate {
    const fn basic(destination: LocationId, discard_target: Option<CardId>) -> Self {
        Self {
            destination: Some(destination),
            power: None,
            double_back: None,
            discard_target,
            weight: 1,
        }
    }

    const fn with_power(destination: Option<LocationId>, power: Power) -> Self {
        Self {
            destination,
            power: Some(power),
            double_back: None,
            discard_target: None,
            weight: 1,
        }
    }

    #[must_use]
    pub fn describe(&self, map: &MapGraph) -> String {
        let place = self.destination.map(|id| map.name(id).to_string());
        match (self.power, place) {
            (Some(power), Some(place)) => format!("{power} ({place})"),
            (Some(power), None) => power.to_string(),
            (None, Some(place)) => format!("move to {place}"),
            (None, None) => "stay".to_string(),
        }
    }
}

/// Everything the heuristics may look at.
#[derive(Debug, Clone, Copy)]
pub struct Situation<'a> {
    pub map: &'a MapGraph,
    pub trail: &'a Trail,
    pub dracula: &'a Dracula,
    pub is_night: bool,
}

impl Situation<'_> {
    /// Whether Dracula may end his move at `destination` given his blood.
    fn can_afford(&self, destination: LocationId) -> bool {
        if !self.map.is_sea(destination) || self.dracula.blood() > 1 {
            return true;
        }
        self.dracula.sea_blood_paid() && self.map.is_sea(self.dracula.location())
    }

    fn power_legal(&self, power: Power, used: &[Power]) -> bool {
        if power.is_compound() {
            return power
                .constituents()
                .iter()
                .all(|part| self.power_legal(*part, used))
                && !used.contains(&power);
        }
        (self.is_night || !power.night_only())
            && i16::from(power.blood_cost()) < i16::from(self.dracula.blood())
            && !self.map.is_sea(self.dracula.location())
            && !used.contains(&power)
    }
}

/// List every legal option for Dracula's next turn.
#[must_use]
pub fn move_candidates(situation: &Situation<'_>) -> Vec<MoveCandidate> {
    let Situation {
        map, trail, dracula, ..
    } = *situation;
    let at = dracula.location();
    let hospital = map.hospital();
    let concealed = trail.occupied_locations(true);
    let live = trail.occupied_locations(false);
    let mut candidates = Vec::new();

    for dest in map.neighbours(at, ModeSet::ROAD_AND_SEA) {
        if dest == hospital || concealed.contains(&dest) || !situation.can_afford(dest) {
            continue;
        }
        let discard_target = trail
            .catacombs()
            .iter()
            .find(|card| card.location() == Some(dest))
            .map(TrailCard::id);
        candidates.push(MoveCandidate::basic(dest, discard_target));
    }

    let used = trail.used_powers();
    for power in Power::ALL {
        if !situation.power_legal(power, &used) {
            continue;
        }
        match power {
            Power::DarkCall | Power::Feed => {
                candidates.push(MoveCandidate::with_power(Some(at), power));
            }
            Power::Hide => candidates.push(MoveCandidate::with_power(None, power)),
            Power::DoubleBack => {
                let targets = double_back_targets(trail, |loc| {
                    map.distance(at, loc, ModeSet::ROAD_AND_SEA) == Some(1)
                        && situation.can_afford(loc)
                });
                candidates.extend(targets.into_iter().map(|(card, loc)| MoveCandidate {
                    double_back: Some(card),
                    ..MoveCandidate::with_power(Some(loc), power)
                }));
            }
            Power::WolfForm => {
                for dest in map.within(at, WOLF_FORM_ROAD_RANGE, ModeSet::ROAD) {
                    if dest != hospital && !live.contains(&dest) {
                        candidates.push(MoveCandidate::with_power(Some(dest), power));
                    }
                }
            }
            Power::WolfFormAndDoubleBack => {
                let reach = map.within(at, WOLF_FORM_ROAD_RANGE, ModeSet::ROAD);
                let targets = double_back_targets(trail, |loc| reach.contains(&loc));
                candidates.extend(targets.into_iter().map(|(card, loc)| MoveCandidate {
                    double_back: Some(card),
                    ..MoveCandidate::with_power(Some(loc), power)
                }));
            }
        }
    }
    candidates
}

/// One card per reachable location, trail before catacombs and newest first.
fn double_back_targets(
    trail: &Trail,
    reachable: impl Fn(LocationId) -> bool,
) -> Vec<(CardId, LocationId)> {
    let mut targets: Vec<(CardId, LocationId)> = Vec::new();
    for card in trail.cards().chain(trail.catacombs()) {
        if let Some(loc) = card.location()
            && reachable(loc)
            && targets.iter().all(|(_, seen)| *seen != loc)
        {
            targets.push((card.id(), loc));
        }
    }
    targets
}

/// Source of weighted picks.
pub trait Sampler {
    /// Return a roll in `0..total_weight`.
    fn roll(&mut self, total_weight: u32) -> u32;
}

impl<R: Rng + ?Sized> Sampler for R {
    fn roll(&mut self, total_weight: u32) -> u32 {
        self.gen_range(0..total_weight)
    }
}

/// Deterministic sampler that always takes the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl Sampler for FirstCandidate {
    fn roll(&mut self, _total_weight: u32) -> u32 {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedMove {
    pub label: String,
    pub weight: u32,
}

/// Telemetry for one weighted decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTrace {
    pub candidates: Vec<WeightedMove>,
    pub roll: u32,
    pub chosen: usize,
}

/// Pick one candidate with probability proportional to its weight.
pub fn sample<S: Sampler + ?Sized>(
    candidates: &[MoveCandidate],
    map: &MapGraph,
    sampler: &mut S,
) -> Option<(usize, MoveTrace)> {
    let total: u32 = candidates.iter().map(|c| c.weight).sum();
    if total == 0 {
        return None;
    }
    let roll = sampler.roll(total);
    let mut running = 0;
    let chosen = candidates
        .iter()
        .position(|candidate| {
            running += candidate.weight;
            roll < running
        })
        .unwrap_or(0);
    let trace = MoveTrace {
        candidates: candidates
            .iter()
            .map(|c| WeightedMove {
                label: c.describe(map),
                weight: c.weight,
            })
            .collect(),
        roll,
        chosen,
    };
    log::debug!(
        "dracula chose {} (roll {roll} of {total}, {} candidates)",
        trace.candidates[chosen].label,
        candidates.len()
    );
    Some((chosen, trace))
}

/// Uniform pick of the encounter to place from the hand.
pub fn choose_encounter<R: Rng + ?Sized>(hand: &[Encounter], rng: &mut R) -> Option<usize> {
    (!hand.is_empty()).then(|| rng.gen_range(0..hand.len()))
}

/// Uniform pick among the opponent's legal combat cards.
pub fn choose_attack<R: Rng + ?Sized>(
    opponent: Opponent,
    is_night: bool,
    previous: Option<Attack>,
    rng: &mut R,
) -> Attack {
    let legal = opponent.legal_cards(is_night, previous);
    if legal.is_empty() {
        return Attack::Claws;
    }
    legal[rng.gen_range(0..legal.len())]
}

/// What becomes of an encounter that drops off the end of the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroppedFate {
    /// An unfound New Vampire matures.
    Matures,
    ReturnsToPool,
    Nothing,
}

#[must_use]
pub const fn dropped_encounter_fate(card: &TrailCard) -> DroppedFate {
    match card.encounter() {
        Some(Encounter::NewVampire) if !card.is_revealed() => DroppedFate::Matures,
        Some(_) => DroppedFate::ReturnsToPool,
        None => DroppedFate::Nothing,
    }
}

/// Dracula's opening location: any land city without a hunter.
pub fn choose_start<R: Rng + ?Sized>(
    map: &MapGraph,
    occupied: &[LocationId],
    rng: &mut R,
) -> Option<LocationId> {
    let options: Vec<LocationId> = map
        .ids()
        .filter(|id| {
            !map.is_sea(*id)
                && *id != map.hospital()
                && *id != map.castle()
                && !occupied.contains(id)
        })
        .collect();
    (!options.is_empty()).then(|| options[rng.gen_range(0..options.len())])
}
