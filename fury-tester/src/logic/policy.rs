use std::fmt;

use clap::ValueEnum;
use fury_game::map::LocationId;
use fury_game::trail::CardView;
use fury_game::{EncounterChoice, Game, HunterId, Item, ModeSet, Opponent, QueuedEncounter};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// What a hunter does after moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterAction {
    Search,
    Supply,
    Wait,
}

/// One hunter's plan for the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnPlan {
    pub destination: Option<LocationId>,
    pub action: HunterAction,
    pub rationale: &'static str,
}

impl TurnPlan {
    const fn new(
        destination: Option<LocationId>,
        action: HunterAction,
        rationale: &'static str,
    ) -> Self {
        Self {
            destination,
            action,
            rationale,
        }
    }
}

/// Policy interface for automated hunters.
pub trait HunterPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    fn plan_turn(&mut self, game: &Game, hunter: HunterId) -> TurnPlan;

    /// Answer a choice-bearing encounter.
    fn pick_choice(&mut self, game: &Game, queued: &QueuedEncounter) -> Option<EncounterChoice>;

    /// Item to submit for one combat round.
    fn pick_item(&mut self, game: &Game, hunter: HunterId, opponent: Opponent) -> Item;
}

/// Built-in hunter strategies for automated runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterStrategy {
    /// Wander and act at random
    Random,
    /// Chase every lead and fight with the best weapon
    Greedy,
    /// Chase leads only while healthy
    Cautious,
}

impl HunterStrategy {
    pub const ALL: [Self; 3] = [Self::Random, Self::Greedy, Self::Cautious];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Greedy => "Greedy",
            Self::Cautious => "Cautious",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn HunterPolicy + Send> {
        match self {
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Cautious => Box::new(CautiousPolicy),
        }
    }
}

impl fmt::Display for HunterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

struct GreedyPolicy;
struct CautiousPolicy;

/// Best-known whereabouts of Dracula: his revealed location, else the newest
/// revealed trail card.
fn latest_lead(game: &Game) -> Option<LocationId> {
    game.visible_dracula_location().or_else(|| {
        game.trail_view().trail.iter().find_map(|card| match card {
            CardView::Revealed {
                location: Some(location),
                ..
            } => Some(*location),
            _ => None,
        })
    })
}

/// Neighbour that gets closest to `target`, if any improves on staying put.
fn step_toward(game: &Game, from: LocationId, target: LocationId) -> Option<LocationId> {
    let modes = ModeSet::ROAD_AND_SEA;
    let current = game.distance(from, target, modes)?;
    game.map()
        .neighbours(from, modes)
        .into_iter()
        .filter_map(|next| game.distance(next, target, modes).map(|d| (d, next)))
        .filter(|(d, _)| *d < current)
        .min()
        .map(|(_, next)| next)
}

fn usable_items(game: &Game, hunter: HunterId, opponent: Opponent) -> Vec<Item> {
    game.hunter(hunter)
        .map(|h| h.usable_items())
        .unwrap_or_default()
        .into_iter()
        .filter(|item| item.usable_against(opponent))
        .collect()
}

fn first_held(usable: &[Item], preference: &[Item]) -> Item {
    preference
        .iter()
        .copied()
        .find(|item| usable.contains(item))
        .unwrap_or(Item::Punch)
}

fn chase(game: &Game, hunter: HunterId) -> TurnPlan {
    let Ok(record) = game.hunter(hunter) else {
        return TurnPlan::new(None, HunterAction::Wait, "unknown hunter");
    };
    let here = record.location();
    match latest_lead(game) {
        Some(lead) if lead == here => TurnPlan::new(None, HunterAction::Search, "on the lead"),
        Some(lead) => TurnPlan::new(
            step_toward(game, here, lead),
            HunterAction::Search,
            "closing on lead",
        ),
        None if record.items().is_empty() => {
            TurnPlan::new(None, HunterAction::Supply, "arming up")
        }
        None => TurnPlan::new(None, HunterAction::Search, "sweeping"),
    }
}

impl HunterPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn plan_turn(&mut self, game: &Game, hunter: HunterId) -> TurnPlan {
        let Ok(record) = game.hunter(hunter) else {
            return TurnPlan::new(None, HunterAction::Wait, "unknown hunter");
        };
        let options = game
            .map()
            .neighbours(record.location(), ModeSet::ROAD_AND_SEA);
        let destination = if !options.is_empty() && self.rng.gen_bool(0.6) {
            Some(options[self.rng.gen_range(0..options.len())])
        } else {
            None
        };
        let action = match self.rng.gen_range(0..3) {
            0 => HunterAction::Supply,
            1 => HunterAction::Wait,
            _ => HunterAction::Search,
        };
        TurnPlan::new(destination, action, "dice")
    }

    fn pick_choice(&mut self, _game: &Game, queued: &QueuedEncounter) -> Option<EncounterChoice> {
        let options = queued.encounter.choices();
        (!options.is_empty()).then(|| options[self.rng.gen_range(0..options.len())])
    }

    fn pick_item(&mut self, game: &Game, hunter: HunterId, opponent: Opponent) -> Item {
        let usable = usable_items(game, hunter, opponent);
        if usable.is_empty() {
            return Item::Punch;
        }
        usable[self.rng.gen_range(0..usable.len())]
    }
}

impl HunterPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn plan_turn(&mut self, game: &Game, hunter: HunterId) -> TurnPlan {
        chase(game, hunter)
    }

    fn pick_choice(&mut self, game: &Game, queued: &QueuedEncounter) -> Option<EncounterChoice> {
        let options = queued.encounter.choices();
        let healthy = queued
            .group
            .iter()
            .filter_map(|id| game.hunter(*id).ok())
            .all(|h| h.health() > 4);
        [
            (healthy, EncounterChoice::TakeDamage),
            (true, EncounterChoice::DiscardEvent),
            (true, EncounterChoice::DiscardItem),
        ]
        .into_iter()
        .filter(|(wanted, _)| *wanted)
        .map(|(_, choice)| choice)
        .find(|choice| options.contains(choice))
        .or_else(|| options.first().copied())
    }

    fn pick_item(&mut self, game: &Game, hunter: HunterId, opponent: Opponent) -> Item {
        let usable = usable_items(game, hunter, opponent);
        first_held(
            &usable,
            &[
                Item::Stake,
                Item::Crucifix,
                Item::SacredBullets,
                Item::Rifle,
                Item::Pistol,
                Item::Knife,
                Item::Punch,
            ],
        )
    }
}

impl HunterPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn plan_turn(&mut self, game: &Game, hunter: HunterId) -> TurnPlan {
        let Ok(record) = game.hunter(hunter) else {
            return TurnPlan::new(None, HunterAction::Wait, "unknown hunter");
        };
        if record.health() * 2 <= record.max_health() {
            return TurnPlan::new(None, HunterAction::Supply, "recovering");
        }
        chase(game, hunter)
    }

    fn pick_choice(&mut self, game: &Game, queued: &QueuedEncounter) -> Option<EncounterChoice> {
        let options = queued.encounter.choices();
        let armed = queued
            .group
            .iter()
            .filter_map(|id| game.hunter(*id).ok())
            .any(|h| !h.items().is_empty());
        let order = if armed {
            [EncounterChoice::DiscardEvent, EncounterChoice::DiscardItem]
        } else {
            [EncounterChoice::DiscardEvent, EncounterChoice::TakeDamage]
        };
        order
            .into_iter()
            .find(|choice| options.contains(choice))
            .or_else(|| options.first().copied())
    }

    fn pick_item(&mut self, game: &Game, hunter: HunterId, opponent: Opponent) -> Item {
        let usable = usable_items(game, hunter, opponent);
        let fragile = game.hunter(hunter).is_ok_and(|h| h.health() <= 3);
        if fragile {
            return first_held(&usable, &[Item::Escape, Item::Dodge]);
        }
        first_held(
            &usable,
            &[
                Item::Crucifix,
                Item::Stake,
                Item::Rifle,
                Item::Pistol,
                Item::Knife,
                Item::Dodge,
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_have_distinct_labels() {
        let labels: Vec<_> = HunterStrategy::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Random", "Greedy", "Cautious"]);
        for strategy in HunterStrategy::ALL {
            assert_eq!(strategy.create_policy(1).name(), strategy.label());
        }
    }

    #[test]
    fn preferences_fall_back_to_a_punch() {
        assert_eq!(first_held(&[Item::Knife], &[Item::Rifle]), Item::Punch);
        assert_eq!(
            first_held(&[Item::Knife, Item::Rifle], &[Item::Rifle, Item::Knife]),
            Item::Rifle
        );
    }

    #[test]
    fn holy_items_are_filtered_against_minions() {
        let game = Game::new(3).unwrap();
        let usable = usable_items(&game, HunterId(0), Opponent::MinionWithKnife);
        assert!(usable.contains(&Item::Punch));
        assert!(!usable.contains(&Item::Crucifix));
    }

    #[test]
    fn steps_close_the_distance() {
        let game = Game::new(12).unwrap();
        let here = game.hunter(HunterId(1)).unwrap().location();
        let target = game.map().id("Castle Dracula").unwrap();
        let step = step_toward(&game, here, target).unwrap();
        let modes = ModeSet::ROAD_AND_SEA;
        assert!(game.distance(step, target, modes) < game.distance(here, target, modes));
    }

    #[test]
    fn random_policy_is_seeded() {
        let game = Game::new(5).unwrap();
        let mut a = HunterStrategy::Random.create_policy(77);
        let mut b = HunterStrategy::Random.create_policy(77);
        for idx in 0..4 {
            assert_eq!(
                a.plan_turn(&game, HunterId(idx)),
                b.plan_turn(&game, HunterId(idx))
            );
        }
    }
}
