//! Encounter tiles and their resolution against a group of hunters.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cards::{HunterEvent, Item, Pool};
use crate::combat::Opponent;
use crate::constants::ENCOUNTER_DECK;
use crate::hunter::{Hunter, HunterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encounter {
    Ambush,
    Bats,
    DesecratedSoil,
    Fog,
    Hoax,
    Lightning,
    MinionWithKnife,
    MinionWithPistol,
    MinionWithRifle,
    NewVampire,
    Peasants,
    Plague,
    Rats,
    Saboteur,
    Thief,
    Wolves,
}

impl Encounter {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ambush => "Ambush",
            Self::Bats => "Bats",
            Self::DesecratedSoil => "Desecrated Soil",
            Self::Fog => "Fog",
            Self::Hoax => "Hoax",
            Self::Lightning => "Lightning",
            Self::MinionWithKnife => "Minion with Knife",
            Self::MinionWithPistol => "Minion with Pistol",
            Self::MinionWithRifle => "Minion with Rifle",
            Self::NewVampire => "New Vampire",
            Self::Peasants => "Peasants",
            Self::Plague => "Plague",
            Self::Rats => "Rats",
            Self::Saboteur => "Saboteur",
            Self::Thief => "Thief",
            Self::Wolves => "Wolves",
        }
    }

    /// Options the hunters pick between, if any.
    #[must_use]
    pub const fn choices(self) -> &'static [EncounterChoice] {
        match self {
            Self::Peasants => &[EncounterChoice::DiscardItem, EncounterChoice::TakeDamage],
            Self::Saboteur => &[EncounterChoice::DiscardItem, EncounterChoice::DiscardEvent],
            _ => &[],
        }
    }

    #[must_use]
    pub const fn minion(self) -> Option<Opponent> {
        match self {
            Self::MinionWithKnife => Some(Opponent::MinionWithKnife),
            Self::MinionWithPistol => Some(Opponent::MinionWithPistol),
            Self::MinionWithRifle => Some(Opponent::MinionWithRifle),
            _ => None,
        }
    }

    /// Tiles the finder keeps until the next round of hunter turns.
    #[must_use]
    pub const fn is_kept(self) -> bool {
        matches!(self, Self::Bats | Self::Fog)
    }
}

impl fmt::Display for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterChoice {
    DiscardItem,
    TakeDamage,
    DiscardEvent,
}

/// Cross-entity consequences of a resolved encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterReport {
    pub narration: Vec<String>,
    pub combat: Option<Opponent>,
    pub dracula_blood: u8,
    /// Dracula springs another encounter from his hand.
    pub ambush: bool,
    /// The tile stays with this hunter instead of returning to the pool.
    pub kept_by: Option<HunterId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NeedsChoice(&'static [EncounterChoice]),
    Resolved(EncounterReport),
}

/// Decks that discarded hunter cards go back to.
pub struct Discards<'a> {
    pub items: &'a mut Pool<Item>,
    pub events: &'a mut Pool<HunterEvent>,
}

#[must_use]
pub fn encounter_pool<R: Rng + ?Sized>(rng: &mut R) -> Pool<Encounter> {
    Pool::from_counts("encounter", ENCOUNTER_DECK, rng)
}

/// Resolve `encounter` against every hunter in `group`.
///
/// Hunter-local effects are applied here; anything touching Dracula, combat
/// or the encounter queue is returned in the report for the caller to apply.
pub fn resolve<R: Rng + ?Sized>(
    encounter: Encounter,
    hunters: &mut [Hunter],
    group: &[HunterId],
    is_night: bool,
    choice: Option<EncounterChoice>,
    discards: &mut Discards<'_>,
    rng: &mut R,
) -> Resolution {
    let options = encounter.choices();
    let choice = match choice {
        Some(choice) if options.contains(&choice) => Some(choice),
        _ if !options.is_empty() => return Resolution::NeedsChoice(options),
        _ => None,
    };

    let mut report = EncounterReport::default();
    report.narration.push(format!("Encounter: {encounter}."));
    match encounter {
        Encounter::Ambush => {
            report.ambush = true;
            report.narration.push("Dracula springs an ambush.".into());
        }
        Encounter::DesecratedSoil => {
            report.dracula_blood = 1;
            report
                .narration
                .push("The unholy ground restores Dracula's strength.".into());
        }
        Encounter::MinionWithKnife | Encounter::MinionWithPistol | Encounter::MinionWithRifle => {
            report.combat = encounter.minion();
        }
        Encounter::Bats | Encounter::Fog => {
            report.kept_by = group.first().copied();
        }
        _ => {}
    }

    for id in group {
        let Some(hunter) = hunters.get_mut(id.index()) else {
            continue;
        };
        if let Some(line) = affect_hunter(encounter, hunter, is_night, choice, discards, rng) {
            report.narration.push(line);
        }
    }

    if let (Some(holder), true) = (report.kept_by, encounter.is_kept())
        && let Some(hunter) = hunters.get_mut(holder.index())
    {
        hunter.hold_tile(encounter);
    }

    Resolution::Resolved(report)
}

fn affect_hunter<R: Rng + ?Sized>(
    encounter: Encounter,
    hunter: &mut Hunter,
    is_night: bool,
    choice: Option<EncounterChoice>,
    discards: &mut Discards<'_>,
    rng: &mut R,
) -> Option<String> {
    let name = hunter.name().to_string();
    match encounter {
        Encounter::Bats | Encounter::Fog => {
            hunter.stall();
            Some(format!("{name} loses the rest of the turn."))
        }
        Encounter::Hoax => discard_event(hunter, discards, rng)
            .map(|event| format!("{name} is fooled and discards {event}.")),
        Encounter::Lightning => {
            if hunter.has_item(Item::Crucifix) {
                Some(format!("{name}'s crucifix turns the lightning aside."))
            } else {
                let lost = hunter.lose_health(2);
                Some(format!("{name} is struck for {lost}."))
            }
        }
        Encounter::NewVampire => {
            if is_night {
                hunter.bite();
                Some(format!("{name} is bitten by a new vampire."))
            } else {
                Some(format!("{name} destroys a sleeping vampire."))
            }
        }
        Encounter::Peasants => match choice {
            Some(EncounterChoice::DiscardItem) => match discard_item(hunter, discards, rng) {
                Some(item) => Some(format!("{name} hands over {item}.")),
                None => {
                    let lost = hunter.lose_health(2);
                    Some(format!("{name} has nothing to give and loses {lost}."))
                }
            },
            _ => {
                let lost = hunter.lose_health(2);
                Some(format!("{name} fights off the peasants and loses {lost}."))
            }
        },
        Encounter::Plague => {
            let lost = hunter.lose_health(2);
            Some(format!("{name} falls ill and loses {lost}."))
        }
        Encounter::Rats => {
            let bites = rng.gen_range(1..=3);
            let lost = hunter.lose_health(bites);
            Some(format!("{name} is swarmed by rats and loses {lost}."))
        }
        Encounter::Saboteur => match choice {
            Some(EncounterChoice::DiscardEvent) => discard_event(hunter, discards, rng)
                .map(|event| format!("{name}'s {event} is sabotaged.")),
            _ => discard_item(hunter, discards, rng)
                .map(|item| format!("{name}'s {item} is sabotaged.")),
        },
        Encounter::Thief => {
            let item = discard_item(hunter, discards, rng);
            let event = discard_event(hunter, discards, rng);
            (item.is_some() || event.is_some()).then(|| format!("{name} is robbed."))
        }
        Encounter::Wolves => {
            let damage = if hunter.has_item(Item::Pistol) || hunter.has_item(Item::Rifle) {
                1
            } else {
                2
            };
            let lost = hunter.lose_health(damage);
            Some(format!("{name} is mauled by wolves and loses {lost}."))
        }
        Encounter::Ambush
        | Encounter::DesecratedSoil
        | Encounter::MinionWithKnife
        | Encounter::MinionWithPistol
        | Encounter::MinionWithRifle => None,
    }
}

fn discard_item<R: Rng + ?Sized>(
    hunter: &mut Hunter,
    discards: &mut Discards<'_>,
    rng: &mut R,
) -> Option<Item> {
    let item = hunter.take_random_item(rng)?;
    discards.items.discard(item, rng);
    Some(item)
}

fn discard_event<R: Rng + ?Sized>(
    hunter: &mut Hunter,
    discards: &mut Discards<'_>,
    rng: &mut R,
) -> Option<HunterEvent> {
    let event = hunter.take_random_event(rng)?;
    discards.events.discard(event, rng);
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunter::ROSTER;
    use crate::map::LocationId;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn party() -> Vec<Hunter> {
        ROSTER
            .iter()
            .enumerate()
            .map(|(idx, profile)| Hunter::new(HunterId(idx as u8), profile, LocationId(0)))
            .collect()
    }

    #[test]
    fn pool_holds_every_tile() {
        let mut rng = SmallRng::seed_from_u64(2);
        assert_eq!(encounter_pool(&mut rng).len(), 46);
    }

    #[test]
    fn peasants_wait_for_a_choice() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut hunters = party();
        let mut items = Pool::empty("item");
        let mut events = Pool::empty("event");
        let mut discards = Discards {
            items: &mut items,
            events: &mut events,
        };
        let pending = resolve(
            Encounter::Peasants,
            &mut hunters,
            &[HunterId(0)],
            false,
            None,
            &mut discards,
            &mut rng,
        );
        assert_eq!(
            pending,
            Resolution::NeedsChoice(&[EncounterChoice::DiscardItem, EncounterChoice::TakeDamage])
        );
        let done = resolve(
            Encounter::Peasants,
            &mut hunters,
            &[HunterId(0)],
            false,
            Some(EncounterChoice::TakeDamage),
            &mut discards,
            &mut rng,
        );
        assert!(matches!(done, Resolution::Resolved(_)));
        assert_eq!(hunters[0].health(), 10);
    }

    #[test]
    fn new_vampire_bites_only_at_night() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut hunters = party();
        let mut items = Pool::empty("item");
        let mut events = Pool::empty("event");
        let mut discards = Discards {
            items: &mut items,
            events: &mut events,
        };
        let group = [HunterId(0), HunterId(1)];
        resolve(Encounter::NewVampire, &mut hunters, &group, false, None, &mut discards, &mut rng);
        assert_eq!(hunters[0].bites(), 0);
        resolve(Encounter::NewVampire, &mut hunters, &group, true, None, &mut discards, &mut rng);
        assert_eq!(hunters[0].bites(), 1);
        assert_eq!(hunters[1].bites(), 1);
        assert_eq!(hunters[2].bites(), 0);
    }

    #[test]
    fn fog_is_kept_and_stalls_the_group() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut hunters = party();
        let mut items = Pool::empty("item");
        let mut events = Pool::empty("event");
        let mut discards = Discards {
            items: &mut items,
            events: &mut events,
        };
        let Resolution::Resolved(report) = resolve(
            Encounter::Fog,
            &mut hunters,
            &[HunterId(2)],
            false,
            None,
            &mut discards,
            &mut rng,
        ) else {
            panic!("fog needs no choice");
        };
        assert_eq!(report.kept_by, Some(HunterId(2)));
        assert!(hunters[2].is_stalled());
        assert_eq!(hunters[2].tiles(), &[Encounter::Fog]);
    }

    #[test]
    fn minions_start_combat() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut hunters = party();
        let mut items = Pool::empty("item");
        let mut events = Pool::empty("event");
        let mut discards = Discards {
            items: &mut items,
            events: &mut events,
        };
        let Resolution::Resolved(report) = resolve(
            Encounter::MinionWithRifle,
            &mut hunters,
            &[HunterId(0)],
            true,
            None,
            &mut discards,
            &mut rng,
        ) else {
            panic!("minions need no choice");
        };
        assert_eq!(report.combat, Some(Opponent::MinionWithRifle));
    }
}
