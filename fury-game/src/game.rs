//! Game orchestration: phase sequencing, the command surface and victory.
//!
//! Every command returns narration. Rule situations that merely make a
//! command pointless (wrong phase, nothing to resolve) come back as `Ok`
//! text; only configuration and invariant failures are errors.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::adversary::{self, DroppedFate, MoveCandidate, MoveTrace, Situation};
use crate::cards::{self, EventTarget, HunterEvent, Item, Pool};
use crate::combat::{Combat, CombatContext, CombatEnd, Opponent};
use crate::constants::{
    COMBAT_DIE_SIDES, DRACULA_MAX_BLOOD, ENCOUNTER_DECK, HUNTER_COUNT, NIGHT_STARTS_AT,
    TIME_PHASES, VAMPIRE_VICTORY_THRESHOLD,
};
use crate::dracula::{Dracula, Power};
use crate::encounters::{self, Discards, Encounter, EncounterChoice, Resolution};
use crate::error::GameError;
use crate::hunter::{Hunter, HunterId, ROSTER, rail_hops};
use crate::map::{LocationId, MapGraph, ModeSet};
use crate::rng::RngBundle;
use crate::trail::{CardSlot, Overflow, Trail, TrailCard, TrailView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Victor {
    Hunters,
    Dracula,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Timekeeping,
    Movement,
    Action,
    HunterTurns,
    GameOver(Victor),
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timekeeping => f.write_str("timekeeping"),
            Self::Movement => f.write_str("movement"),
            Self::Action => f.write_str("action"),
            Self::HunterTurns => f.write_str("hunter turns"),
            Self::GameOver(victor) => write!(f, "game over ({victor:?} win)"),
        }
    }
}

const TIME_NAMES: [&str; TIME_PHASES as usize] =
    ["Dawn", "Noon", "Dusk", "Twilight", "Midnight", "Small Hours"];

/// An encounter waiting to be resolved against the group that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedEncounter {
    pub encounter: Encounter,
    pub group: Vec<HunterId>,
    pub location: LocationId,
}

/// Optional overrides for a new game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSetup {
    pub seed: u64,
    pub hunter_starts: Option<Vec<LocationId>>,
    pub dracula_start: Option<LocationId>,
}

impl GameSetup {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunterSnapshot {
    pub name: String,
    pub health: u8,
    pub max_health: u8,
    pub bites: u8,
    pub location: String,
    pub group: u8,
    pub items: Vec<Item>,
    pub events: Vec<HunterEvent>,
}

/// Serializable public view of the game for shells and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub day: u32,
    pub time: String,
    pub vampires: u8,
    pub resolve: u8,
    pub dracula_blood: u8,
    /// Only present while Dracula is revealed.
    pub dracula_location: Option<String>,
    pub trail: TrailView,
    pub hunters: Vec<HunterSnapshot>,
    pub pending_encounters: usize,
    pub in_combat: bool,
}

pub struct Game {
    map: Arc<MapGraph>,
    rng: RngBundle,
    phase: GamePhase,
    time: u8,
    day: u32,
    turn: u32,
    vampires: u8,
    resolve: u8,
    dracula: Dracula,
    hunters: Vec<Hunter>,
    trail: Trail,
    encounters: Pool<Encounter>,
    items: Pool<Item>,
    events: Pool<HunterEvent>,
    queue: VecDeque<QueuedEncounter>,
    combat: Option<Combat>,
    /// Group waiting to fight Dracula once the encounter queue drains.
    confrontation: Option<Vec<HunterId>>,
    dropped: Option<TrailCard>,
    last_move: Option<MoveCandidate>,
    last_trace: Option<MoveTrace>,
    log: Vec<String>,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("seed", &self.rng.seed())
            .field("phase", &self.phase)
            .field("day", &self.day)
            .field("time", &self.time)
            .field("blood", &self.dracula.blood())
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Start a game on the standard board.
    ///
    /// # Errors
    ///
    /// Returns an error if the board fails verification.
    pub fn new(seed: u64) -> Result<Self, GameError> {
        Self::with_setup(MapGraph::standard()?, GameSetup::seeded(seed))
    }

    /// Start a game on any verified board.
    ///
    /// # Errors
    ///
    /// Returns an error if a start location is missing or a pool runs dry
    /// during setup.
    pub fn with_setup(map: Arc<MapGraph>, setup: GameSetup) -> Result<Self, GameError> {
        let rng = RngBundle::from_user_seed(setup.seed);
        let starts = match setup.hunter_starts {
            Some(starts) => starts,
            None => ROSTER
                .iter()
                .map(|profile| {
                    map.id(profile.start)
                        .ok_or_else(|| GameError::UnknownLocation(profile.start.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        if starts.len() != HUNTER_COUNT {
            return Err(GameError::Invariant(format!(
                "expected {HUNTER_COUNT} hunter starts, got {}",
                starts.len()
            )));
        }
        let hunters: Vec<Hunter> = (0_u8..)
            .zip(ROSTER.iter().zip(&starts))
            .map(|(idx, (profile, start))| Hunter::new(HunterId(idx), profile, *start))
            .collect();

        let mut encounters = encounters::encounter_pool(&mut *rng.encounter());
        let items = cards::item_deck(&mut *rng.encounter());
        let events = cards::event_deck(&mut *rng.encounter());

        let start = match setup.dracula_start {
            Some(start) => start,
            None => adversary::choose_start(&map, &starts, &mut *rng.movement())
                .ok_or_else(|| GameError::Invariant("no location for Dracula to start".into()))?,
        };
        let mut dracula = Dracula::new(start);
        let mut trail = Trail::new();
        let card = trail.new_card(Some(start), None)?;
        trail.push_head(card);
        dracula.refill_hand(&mut encounters, &mut *rng.encounter())?;

        log::info!("new game seeded with {}", setup.seed);
        Ok(Self {
            map,
            rng,
            phase: GamePhase::Timekeeping,
            time: 0,
            day: 1,
            turn: 0,
            vampires: 0,
            resolve: 0,
            dracula,
            hunters,
            trail,
            encounters,
            items,
            events,
            queue: VecDeque::new(),
            combat: None,
            confrontation: None,
            dropped: None,
            last_move: None,
            last_trace: None,
            log: Vec::new(),
        })
    }

    // Queries -----------------------------------------------------------------

    #[must_use]
    pub fn map(&self) -> &MapGraph {
        &self.map
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    #[must_use]
    pub const fn victor(&self) -> Option<Victor> {
        match self.phase {
            GamePhase::GameOver(victor) => Some(victor),
            _ => None,
        }
    }

    #[must_use]
    pub const fn time(&self) -> u8 {
        self.time
    }

    #[must_use]
    pub const fn is_night(&self) -> bool {
        self.time >= NIGHT_STARTS_AT
    }

    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Number of Dracula turns played.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub const fn vampires(&self) -> u8 {
        self.vampires
    }

    #[must_use]
    pub const fn resolve(&self) -> u8 {
        self.resolve
    }

    #[must_use]
    pub const fn dracula(&self) -> &Dracula {
        &self.dracula
    }

    #[must_use]
    pub const fn dracula_blood(&self) -> u8 {
        self.dracula.blood()
    }

    /// Dracula's location if the hunters currently know it.
    #[must_use]
    pub const fn visible_dracula_location(&self) -> Option<LocationId> {
        if self.dracula.is_revealed() {
            Some(self.dracula.location())
        } else {
            None
        }
    }

    #[must_use]
    pub fn hunters(&self) -> &[Hunter] {
        &self.hunters
    }

    /// # Errors
    ///
    /// Returns [`GameError::UnknownHunter`] for an id outside the roster.
    pub fn hunter(&self, id: HunterId) -> Result<&Hunter, GameError> {
        self.hunters
            .get(id.index())
            .ok_or(GameError::UnknownHunter(id))
    }

    #[must_use]
    pub const fn trail(&self) -> &Trail {
        &self.trail
    }

    #[must_use]
    pub fn trail_view(&self) -> TrailView {
        self.trail.view()
    }

    #[must_use]
    pub fn pending_encounter(&self) -> Option<&QueuedEncounter> {
        self.queue.front()
    }

    #[must_use]
    pub fn pending_encounters(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub const fn combat(&self) -> Option<&Combat> {
        self.combat.as_ref()
    }

    #[must_use]
    pub const fn last_trace(&self) -> Option<&MoveTrace> {
        self.last_trace.as_ref()
    }

    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub fn distance(&self, from: LocationId, to: LocationId, modes: ModeSet) -> Option<u32> {
        self.map.distance(from, to, modes)
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase,
            day: self.day,
            time: TIME_NAMES[usize::from(self.time)].to_string(),
            vampires: self.vampires,
            resolve: self.resolve,
            dracula_blood: self.dracula.blood(),
            dracula_location: self
                .visible_dracula_location()
                .map(|id| self.map.name(id).to_string()),
            trail: self.trail.view(),
            hunters: self
                .hunters
                .iter()
                .map(|hunter| HunterSnapshot {
                    name: hunter.name().to_string(),
                    health: hunter.health(),
                    max_health: hunter.max_health(),
                    bites: hunter.bites(),
                    location: self.map.name(hunter.location()).to_string(),
                    group: hunter.group(),
                    items: hunter.items().to_vec(),
                    events: hunter.events().to_vec(),
                })
                .collect(),
            pending_encounters: self.queue.len(),
            in_combat: self.combat.is_some(),
        }
    }

    /// Verify the bookkeeping the rules guarantee.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] on the first violation found.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        self.trail.check()?;
        if self.dracula.blood() > DRACULA_MAX_BLOOD {
            return Err(GameError::Invariant(format!(
                "Dracula has {} blood",
                self.dracula.blood()
            )));
        }
        if let Some(hunter) = self
            .hunters
            .iter()
            .find(|hunter| hunter.health() > hunter.max_health())
        {
            return Err(GameError::Invariant(format!(
                "{} has {} health",
                hunter.name(),
                hunter.health()
            )));
        }
        let expected: usize = ENCOUNTER_DECK
            .iter()
            .map(|(_, copies)| usize::from(*copies))
            .sum();
        let on_cards: usize = self
            .trail
            .cards()
            .chain(self.trail.catacombs())
            .map(|card| {
                usize::from(card.encounter().is_some())
                    + usize::from(card.catacomb_encounter().is_some())
            })
            .sum();
        let held: usize = self.hunters.iter().map(|hunter| hunter.tiles().len()).sum();
        let dropped = self.dropped.as_ref().map_or(0, |card| {
            usize::from(card.encounter().is_some())
                + usize::from(card.catacomb_encounter().is_some())
        });
        let found = self.encounters.len()
            + self.dracula.hand().len()
            + on_cards
            + self.queue.len()
            + held
            + dropped;
        if found != expected {
            return Err(GameError::Invariant(format!(
                "{found} encounter tiles in play, expected {expected}"
            )));
        }
        Ok(())
    }

    // Phase machine -------------------------------------------------------------

    /// Run the current phase and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns an error when a pool runs dry or internal bookkeeping breaks.
    pub fn advance_phase(&mut self) -> Result<String, GameError> {
        let (lines, next) = match self.phase {
            GamePhase::GameOver(_) => return Ok(String::new()),
            GamePhase::Timekeeping => (self.timekeeping()?, GamePhase::Movement),
            GamePhase::Movement => (self.movement()?, GamePhase::Action),
            GamePhase::Action => {
                let mut lines = self.action()?;
                lines.extend(self.begin_hunter_round());
                (lines, GamePhase::HunterTurns)
            }
            GamePhase::HunterTurns => {
                if let Some(reason) = self.busy() {
                    return Ok(self.narrate(vec![reason.to_string()]));
                }
                (Vec::new(), GamePhase::Timekeeping)
            }
        };
        self.phase = next;
        log::info!("phase -> {next}");
        let mut lines = lines;
        lines.extend(self.check_victory());
        Ok(self.narrate(lines))
    }

    fn timekeeping(&mut self) -> Result<Vec<String>, GameError> {
        let mut lines = self.plan_move()?;
        if self.dracula.is_dead() {
            return Ok(lines);
        }
        lines.extend(self.tend_catacombs());

        if !self.map.is_sea(self.dracula.location()) {
            self.time = (self.time + 1) % TIME_PHASES;
            if self.time == 0 {
                self.day += 1;
                self.vampires = self.vampires.saturating_add(1);
                self.resolve = self.resolve.saturating_add(1);
                lines.push(format!("Day {} dawns. The vampire count rises.", self.day));
            }
        }
        lines.push(format!("It is {}.", TIME_NAMES[usize::from(self.time)]));
        Ok(lines)
    }

    /// Let catacomb cards crumble, sparing the card the planned move doubles back to.
    fn tend_catacombs(&mut self) -> Option<String> {
        let (keep, discard) = self.dracula.next_move().map_or((None, None), |plan| {
            (plan.double_back, plan.discard_target)
        });
        let removed = self.trail.evaluate_catacombs(
            keep,
            discard,
            &mut self.encounters,
            &mut *self.rng.trail(),
        );
        (!removed.is_empty()).then(|| format!("{} catacomb card(s) crumble.", removed.len()))
    }

    /// Choose Dracula's next move, suffering defeat until one exists.
    fn plan_move(&mut self) -> Result<Vec<String>, GameError> {
        let mut lines = Vec::new();
        while !self.dracula.is_dead() {
            let situation = Situation {
                map: &self.map,
                trail: &self.trail,
                dracula: &self.dracula,
                is_night: self.is_night(),
            };
            let candidates = adversary::move_candidates(&situation);
            let picked = adversary::sample(&candidates, &self.map, &mut *self.rng.movement());
            if let Some((idx, trace)) = picked {
                log::debug!(
                    "dracula picks {} (roll {} of {} candidates)",
                    candidates[idx].describe(&self.map),
                    trace.roll,
                    trace.candidates.len()
                );
                self.dracula.set_next_move(candidates[idx].clone());
                self.last_trace = Some(trace);
                return Ok(lines);
            }
            lines.push(self.die()?);
        }
        Ok(lines)
    }

    /// Dracula is cornered: lose blood and collapse the trail onto his location.
    fn die(&mut self) -> Result<String, GameError> {
        let blood = self.dracula.suffer_defeat();
        let at = self.dracula.location();
        let mut card = self.trail.new_card(Some(at), None)?;
        card.reveal();
        self.trail
            .truncate_to(card, &mut self.encounters, &mut *self.rng.encounter());
        self.dracula.reveal();
        log::info!("dracula cornered, blood now {blood}");
        Ok(format!(
            "Dracula is cornered at {} and falls to {blood} blood.",
            self.map.name(at)
        ))
    }

    fn movement(&mut self) -> Result<Vec<String>, GameError> {
        let mut lines = Vec::new();
        let Some(plan) = self.dracula.take_next_move() else {
            return Ok(lines);
        };
        self.turn += 1;
        if let Some(power) = plan.power {
            self.dracula.pay_for(power);
        }
        if plan.power == Some(Power::DarkCall) {
            self.dracula
                .dark_call(&mut self.encounters, &mut *self.rng.encounter())?;
            lines.push("Dracula calls upon the darkness.".to_string());
        }

        if let Some(card_id) = plan.double_back {
            let moved = match self.trail.slot_of(card_id) {
                Some(CardSlot::Trail(idx)) => self.trail.double_back_trail(idx),
                Some(CardSlot::Catacomb(idx)) => {
                    self.trail
                        .double_back(idx, &mut self.encounters, &mut *self.rng.trail())
                }
                None => None,
            };
            if moved.is_none() {
                return Err(GameError::Invariant(format!(
                    "double back target {card_id:?} is gone"
                )));
            }
            if let (Some(head), Some(power)) = (self.trail.head_mut(), plan.power) {
                head.mark_returned(power);
            }
        } else {
            let card = self.trail.new_card(plan.destination, plan.power)?;
            self.trail.push_head(card);
        }

        if let Some(destination) = plan.destination {
            self.dracula.set_location(destination);
        }
        let at = self.dracula.location();
        if self.map.is_sea(at) {
            if self.dracula.enter_sea() > 0 {
                lines.push("Dracula pays blood to cross the sea.".to_string());
            }
        } else {
            self.dracula.make_landfall();
        }

        let seen = at == self.map.castle() || self.hunters.iter().any(|h| h.location() == at);
        if seen {
            self.dracula.reveal();
            if let Some(head) = self.trail.head_mut() {
                head.reveal();
            }
            lines.push(format!("Dracula is seen at {}.", self.map.name(at)));
        } else {
            self.dracula.conceal();
            lines.push("Dracula moves in secret.".to_string());
        }

        match self
            .trail
            .evaluate_overflow(&self.map, &mut self.encounters, &mut *self.rng.trail())?
        {
            Overflow::Dropped(card) => self.dropped = Some(card),
            Overflow::Catacombed(_) => {
                lines.push("An old trail card sinks into the catacombs.".to_string());
            }
            Overflow::None => {}
        }
        self.last_move = Some(plan);
        Ok(lines)
    }

    fn action(&mut self) -> Result<Vec<String>, GameError> {
        let mut lines = Vec::new();
        let at = self.dracula.location();
        let present: Vec<HunterId> = self
            .hunters
            .iter()
            .filter(|hunter| hunter.location() == at)
            .map(Hunter::id)
            .collect();

        if !present.is_empty() && !self.map.is_sea(at) {
            lines.push(format!("Dracula attacks at {}!", self.map.name(at)));
            self.combat = Some(Combat::new(Opponent::Dracula, at, present));
        } else if self.should_place_encounter() {
            let picked = adversary::choose_encounter(self.dracula.hand(), &mut *self.rng.encounter());
            if let Some(encounter) = picked.and_then(|idx| self.dracula.play_from_hand(idx)) {
                let displaced = match self.trail.head_mut() {
                    Some(head) => head.set_encounter(encounter),
                    None => Some(encounter),
                };
                if let Some(displaced) = displaced {
                    self.encounters.discard(displaced, &mut *self.rng.encounter());
                }
                lines.push("Dracula leaves something behind.".to_string());
            }
        }

        if let Some(mut card) = self.dropped.take() {
            if adversary::dropped_encounter_fate(&card) == DroppedFate::Matures {
                self.vampires = self.vampires.saturating_add(1);
                log::info!("a new vampire matures ({} total)", self.vampires);
                lines.push("A new vampire matures.".to_string());
            }
            self.encounters
                .discard_all(card.take_encounters(), &mut *self.rng.encounter());
        }

        self.dracula
            .refill_hand(&mut self.encounters, &mut *self.rng.encounter())?;
        Ok(lines)
    }

    fn should_place_encounter(&self) -> bool {
        let power_allows = self
            .last_move
            .as_ref()
            .and_then(|plan| plan.power)
            .is_none_or(Power::places_encounter);
        power_allows
            && !self.map.is_sea(self.dracula.location())
            && self
                .trail
                .head()
                .is_some_and(|head| head.location().is_some() && head.encounter().is_none())
    }

    fn begin_hunter_round(&mut self) -> Vec<String> {
        let returned: Vec<Encounter> = self
            .hunters
            .iter_mut()
            .flat_map(Hunter::begin_round)
            .collect();
        if returned.is_empty() {
            return Vec::new();
        }
        self.encounters
            .discard_all(returned, &mut *self.rng.encounter());
        vec!["Held encounter tiles return to Dracula.".to_string()]
    }

    fn check_victory(&mut self) -> Option<String> {
        if self.is_over() {
            return None;
        }
        let victor = if self.dracula.is_dead() {
            Victor::Hunters
        } else if self.vampires >= VAMPIRE_VICTORY_THRESHOLD {
            Victor::Dracula
        } else {
            return None;
        };
        self.phase = GamePhase::GameOver(victor);
        log::info!("game over after {} turns: {victor:?} win", self.turn);
        Some(match victor {
            Victor::Hunters => "Dracula is destroyed. The hunters win!".to_string(),
            Victor::Dracula => "The vampires have spread. Dracula wins.".to_string(),
        })
    }

    fn narrate(&mut self, lines: Vec<String>) -> String {
        let text = lines.join("\n");
        if !text.is_empty() {
            self.log.push(text.clone());
        }
        text
    }

    // Hunter commands -------------------------------------------------------------

    fn turn_gate(&self) -> Option<String> {
        match self.phase {
            GamePhase::HunterTurns => None,
            GamePhase::GameOver(_) => Some("The game is over.".to_string()),
            _ => Some("It is not the hunters' turn.".to_string()),
        }
    }

    fn busy(&self) -> Option<&'static str> {
        if self.combat.is_some() {
            Some("A fight is in progress.")
        } else if !self.queue.is_empty() {
            Some("An encounter awaits resolution.")
        } else {
            None
        }
    }

    /// Hunters travelling with `id` from the same location, `id` included.
    fn group_of(&self, id: HunterId) -> Result<Vec<HunterId>, GameError> {
        let leader = self.hunter(id)?;
        Ok(self
            .hunters
            .iter()
            .filter(|other| {
                other.id() == id
                    || (other.travels_with(leader) && other.location() == leader.location())
            })
            .map(Hunter::id)
            .collect())
    }

    /// Move a hunter, and any group travelling with them, one step.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownHunter`] for an id outside the roster.
    pub fn move_hunter(
        &mut self,
        id: HunterId,
        destination: LocationId,
    ) -> Result<String, GameError> {
        if let Some(message) = self.turn_gate() {
            return Ok(message);
        }
        if let Some(reason) = self.busy() {
            return Ok(reason.to_string());
        }
        let hunter = self.hunter(id)?;
        let name = hunter.name().to_string();
        let from = hunter.location();
        if hunter.is_stalled() || hunter.has_moved() {
            return Ok(self.narrate(vec![format!("{name} cannot move again this turn.")]));
        }
        if destination.index() >= self.map.len() {
            return Err(GameError::UnknownLocation(format!("{destination:?}")));
        }
        if destination == from {
            return Ok(String::new());
        }

        let group = self.group_of(id)?;
        let mut lines = Vec::new();
        let direct = self
            .map
            .neighbours(from, ModeSet::ROAD_AND_SEA)
            .contains(&destination);
        if !direct {
            let on_line = self
                .map
                .rail_routes(from)
                .iter()
                .any(|(dest, _)| *dest == destination);
            if !on_line {
                return Ok(self.narrate(vec![format!(
                    "{name} cannot reach {} from {}.",
                    self.map.name(destination),
                    self.map.name(from)
                )]));
            }
            let roll: u8 = self.rng.combat().gen_range(1..=COMBAT_DIE_SIDES);
            let hops = rail_hops(roll);
            if !self.map.connected_by_fast_mode(from, destination, hops) {
                for member in &group {
                    self.hunters[member.index()].mark_moved();
                }
                return Ok(self.narrate(vec![format!(
                    "{name} rolls {roll}; the train does not reach {}.",
                    self.map.name(destination)
                )]));
            }
            lines.push(format!("{name} rolls {roll} and takes the train."));
        }

        for member in &group {
            let traveller = &mut self.hunters[member.index()];
            if traveller.location() == from && !traveller.is_stalled() {
                traveller.set_location(destination);
                traveller.mark_moved();
                lines.push(format!(
                    "{} travels to {}.",
                    traveller.name(),
                    self.map.name(destination)
                ));
            }
        }
        if self.dracula.location() == destination && !self.map.is_sea(destination) {
            self.dracula.reveal();
            lines.push("Dracula is here!".to_string());
        }
        Ok(self.narrate(lines))
    }

    /// Search the hunter's location for trail cards and Dracula himself.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownHunter`] for an id outside the roster.
    pub fn search(&mut self, id: HunterId) -> Result<String, GameError> {
        if let Some(message) = self.turn_gate() {
            return Ok(message);
        }
        if let Some(reason) = self.busy() {
            return Ok(reason.to_string());
        }
        let hunter = self.hunter(id)?;
        let name = hunter.name().to_string();
        if hunter.has_acted() || hunter.is_stalled() {
            return Ok(self.narrate(vec![format!("{name} has already acted this turn.")]));
        }
        let at = hunter.location();
        let group = self.group_of(id)?;
        for member in &group {
            self.hunters[member.index()].mark_acted();
        }

        let mut lines = Vec::new();
        let result = self.trail.search(at);
        if result.is_empty() {
            lines.push(format!("{name} searches {} and finds nothing.", self.map.name(at)));
        } else {
            lines.push(format!(
                "{name} uncovers {} card(s) at {}.",
                result.revealed.len(),
                self.map.name(at)
            ));
        }
        for encounter in result.encounters {
            self.queue.push_back(QueuedEncounter {
                encounter,
                group: group.clone(),
                location: at,
            });
        }
        if self.dracula.location() == at && !self.map.is_sea(at) {
            self.dracula.reveal();
            self.confrontation = Some(group);
            lines.push("Dracula is here!".to_string());
        }
        lines.extend(self.start_confrontation_if_ready());
        Ok(self.narrate(lines))
    }

    fn start_confrontation_if_ready(&mut self) -> Option<String> {
        if !self.queue.is_empty() || self.combat.is_some() {
            return None;
        }
        let group = self.confrontation.take()?;
        let at = self.dracula.location();
        let fighters: Vec<HunterId> = group
            .into_iter()
            .filter(|id| {
                self.hunters
                    .get(id.index())
                    .is_some_and(|hunter| hunter.location() == at)
            })
            .collect();
        if fighters.is_empty() || self.dracula.is_dead() {
            return None;
        }
        self.combat = Some(Combat::new(Opponent::Dracula, at, fighters));
        Some("Dracula turns to fight!".to_string())
    }

    /// Resolve the encounter at the head of the queue.
    ///
    /// # Errors
    ///
    /// Returns an error only if internal bookkeeping breaks.
    pub fn resolve_encounter(
        &mut self,
        choice: Option<EncounterChoice>,
    ) -> Result<String, GameError> {
        if let Some(message) = self.turn_gate() {
            return Ok(message);
        }
        if self.combat.is_some() {
            return Ok("Finish the fight first.".to_string());
        }
        let Some(front) = self.queue.front().cloned() else {
            return Ok(String::new());
        };
        let group: Vec<HunterId> = front
            .group
            .iter()
            .copied()
            .filter(|id| {
                self.hunters
                    .get(id.index())
                    .is_some_and(|hunter| hunter.location() == front.location)
            })
            .collect();
        if group.is_empty() {
            self.queue.pop_front();
            self.encounters
                .discard(front.encounter, &mut *self.rng.encounter());
            return Ok(self.narrate(vec![format!("The {} finds no one.", front.encounter)]));
        }

        let is_night = self.is_night();
        let mut discards = Discards {
            items: &mut self.items,
            events: &mut self.events,
        };
        let resolution = encounters::resolve(
            front.encounter,
            &mut self.hunters,
            &group,
            is_night,
            choice,
            &mut discards,
            &mut *self.rng.encounter(),
        );
        let report = match resolution {
            Resolution::NeedsChoice(options) => {
                let names: Vec<String> = options.iter().map(|opt| format!("{opt:?}")).collect();
                return Ok(self.narrate(vec![format!(
                    "{} requires a choice: {}.",
                    front.encounter,
                    names.join(" or ")
                )]));
            }
            Resolution::Resolved(report) => report,
        };
        self.queue.pop_front();

        let mut lines = report.narration;
        if report.kept_by.is_none() {
            self.encounters
                .discard(front.encounter, &mut *self.rng.encounter());
        }
        if report.dracula_blood > 0 {
            self.dracula.gain_blood(report.dracula_blood);
        }
        if let Some(opponent) = report.combat {
            lines.push(format!("{opponent} attacks!"));
            self.combat = Some(Combat::new(opponent, front.location, group.clone()));
        }
        if report.ambush {
            let picked = adversary::choose_encounter(self.dracula.hand(), &mut *self.rng.encounter());
            if let Some(sprung) = picked.and_then(|idx| self.dracula.play_from_hand(idx)) {
                lines.push(format!("Dracula springs {sprung}!"));
                self.queue.push_front(QueuedEncounter {
                    encounter: sprung,
                    group,
                    location: front.location,
                });
            }
        }
        lines.extend(self.process_defeats());
        lines.extend(self.start_confrontation_if_ready());
        lines.extend(self.check_victory());
        Ok(self.narrate(lines))
    }

    /// Play one combat round with the submitted items.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownHunter`] for an id outside the roster.
    pub fn submit_combat_items(
        &mut self,
        submissions: Vec<(HunterId, Item)>,
    ) -> Result<String, GameError> {
        if let Some(message) = self.turn_gate() {
            return Ok(message);
        }
        let Some(combat) = self.combat.as_ref() else {
            return Ok(String::new());
        };
        let opponent = combat.opponent();
        let previous = combat.previous_attack();
        let engaged = combat.hunters().to_vec();

        let mut lines = Vec::new();
        let mut valid = Vec::with_capacity(submissions.len());
        for (id, item) in submissions {
            let hunter = self.hunter(id)?;
            if !engaged.contains(&id) {
                lines.push(format!("{} is not in the fight.", hunter.name()));
            } else if !hunter.has_item(item) || !item.usable_against(opponent) {
                lines.push(format!("{} cannot use {item} here.", hunter.name()));
            } else if !valid.iter().any(|(other, _)| *other == id) {
                valid.push((id, item));
            }
        }
        if valid.is_empty() {
            lines.push("No usable items were submitted.".to_string());
            return Ok(self.narrate(lines));
        }

        let attack =
            adversary::choose_attack(opponent, self.is_night(), previous, &mut *self.rng.movement());
        let Some(combat) = self.combat.as_mut() else {
            return Ok(String::new());
        };
        let mut ctx = CombatContext {
            dracula: &mut self.dracula,
            hunters: &mut self.hunters,
            items: &mut self.items,
            events: &mut self.events,
        };
        let round = combat.play_round(&valid, attack, &mut ctx, &mut *self.rng.combat());
        lines.push(round.narration);
        if let Some(end) = round.end {
            self.combat = None;
            if end == CombatEnd::DraculaEscaped {
                self.confrontation = None;
            }
        }
        lines.extend(self.process_defeats());
        lines.extend(self.start_confrontation_if_ready());
        lines.extend(self.check_victory());
        Ok(self.narrate(lines))
    }

    /// Draw supplies: an event, plus an item in a large city.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown hunter or an exhausted deck.
    pub fn supply(&mut self, id: HunterId) -> Result<String, GameError> {
        if let Some(message) = self.turn_gate() {
            return Ok(message);
        }
        if let Some(reason) = self.busy() {
            return Ok(reason.to_string());
        }
        let hunter = self.hunter(id)?;
        let name = hunter.name().to_string();
        if hunter.has_acted() || hunter.is_stalled() {
            return Ok(self.narrate(vec![format!("{name} has already acted this turn.")]));
        }
        let large_city = self.map.location(hunter.location()).is_large_city();

        let mut rng = self.rng.encounter();
        let mut lines = Vec::new();
        let event = self.events.draw(&mut *rng)?;
        let hunter = &mut self.hunters[id.index()];
        hunter.mark_acted();
        lines.push(format!("{name} receives {event}."));
        if let Some(excess) = hunter.gain_event(event, &mut *rng) {
            self.events.discard(excess, &mut *rng);
            lines.push(format!("{name} discards {excess}."));
        }
        if large_city {
            let item = self.items.draw(&mut *rng)?;
            lines.push(format!("{name} buys {item}."));
            if let Some(excess) = self.hunters[id.index()].gain_item(item, &mut *rng) {
                self.items.discard(excess, &mut *rng);
                lines.push(format!("{name} discards {excess}."));
            }
        }
        drop(rng);
        Ok(self.narrate(lines))
    }

    /// Play an event card from a hunter's hand.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownHunter`] for an id outside the roster.
    pub fn play_event(
        &mut self,
        id: HunterId,
        event: HunterEvent,
        target: EventTarget,
    ) -> Result<String, GameError> {
        if let Some(message) = self.turn_gate() {
            return Ok(message);
        }
        let hunter = self.hunter(id)?;
        let name = hunter.name().to_string();
        if !hunter.has_event(event) {
            return Ok(self.narrate(vec![format!("{name} does not hold {event}.")]));
        }

        let line = match (event, target) {
            (HunterEvent::HiredScouts, EventTarget::Location(location)) => {
                if location.index() >= self.map.len() {
                    return Err(GameError::UnknownLocation(format!("{location:?}")));
                }
                let found = self.trail.reveal_at(location);
                if self.dracula.location() == location {
                    self.dracula.reveal();
                }
                format!(
                    "Scouts report {found} new sign(s) at {}.",
                    self.map.name(location)
                )
            }
            (HunterEvent::HiredScouts, _) => {
                return Ok("Hired Scouts needs a location.".to_string());
            }
            (HunterEvent::NewspaperReports, _) => match self.trail.reveal_oldest() {
                Some(_) => "The papers report an old sighting.".to_string(),
                None => return Ok("There is nothing left to report.".to_string()),
            },
            (HunterEvent::BloodTransfusion, target) => {
                let patient = match target {
                    EventTarget::Hunter(other) => other,
                    _ => id,
                };
                self.hunter(patient)?;
                if !self.hunters[patient.index()].cure_bite() {
                    return Ok("There is no bite to cure.".to_string());
                }
                format!("{} receives a transfusion.", self.hunters[patient.index()].name())
            }
            (HunterEvent::Forewarned, _) => match self.queue.pop_front() {
                Some(queued) => {
                    self.encounters
                        .discard(queued.encounter, &mut *self.rng.encounter());
                    format!("Forewarned, the hunters avoid the {}.", queued.encounter)
                }
                None => return Ok("There is nothing to be forewarned about.".to_string()),
            },
            (HunterEvent::GoodLuck, _) => match self.combat.as_mut() {
                Some(combat) => {
                    combat.grant_hunter_bonus();
                    "Luck favours the hunters.".to_string()
                }
                None => return Ok("Good Luck needs a fight.".to_string()),
            },
        };

        self.hunters[id.index()].take_event(event);
        self.events.discard(event, &mut *self.rng.encounter());
        let mut lines = vec![format!("{name} plays {event}."), line];
        lines.extend(self.start_confrontation_if_ready());
        Ok(self.narrate(lines))
    }

    /// Assign a hunter to a travel group. Zero means travelling alone.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownHunter`] for an id outside the roster.
    pub fn set_group(&mut self, id: HunterId, group: u8) -> Result<String, GameError> {
        self.hunter(id)?;
        let hunter = &mut self.hunters[id.index()];
        hunter.set_group(group);
        let line = if group == 0 {
            format!("{} travels alone.", hunter.name())
        } else {
            format!("{} joins group {group}.", hunter.name())
        };
        Ok(self.narrate(vec![line]))
    }

    fn process_defeats(&mut self) -> Vec<String> {
        let hospital = self.map.hospital();
        let mut lines = Vec::new();
        let mut rng = self.rng.encounter();
        for hunter in &mut self.hunters {
            if !hunter.is_defeated() {
                continue;
            }
            let surrendered = hunter.send_to_hospital(hospital);
            self.items.discard_all(surrendered.items, &mut *rng);
            self.events.discard_all(surrendered.events, &mut *rng);
            self.encounters.discard_all(surrendered.tiles, &mut *rng);
            log::info!("{} defeated", hunter.name());
            lines.push(format!("{} is carried to the hospital.", hunter.name()));
        }
        lines
    }
}
