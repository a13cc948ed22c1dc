//! Combat tables and the round engine built around them.
//!
//! The two resolver functions are pure lookups. [`Combat`] owns the state of
//! one fight and applies the looked-up effects to the participants in order.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::fmt;

use crate::cards::{HunterEvent, Item, Pool};
use crate::constants::{COMBAT_DIE_SIDES, COMBAT_ROUND_LIMIT};
use crate::dracula::Dracula;
use crate::hunter::{Hunter, HunterId};
use crate::map::LocationId;

/// Closed vocabulary of combat effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    BloodLoss1,
    BloodLoss2,
    BloodLoss3,
    BloodLoss4,
    HealthLoss1,
    HealthLoss2,
    HealthLoss3,
    ItemDestroyed,
    EventDiscarded,
    AllItemsLost,
    Bite,
    MinionDeath,
    DraculaDeath,
    Repel,
    EscapeAsBat,
    Continue,
    End,
    Invalid,
    RollBonus,
    InitiativeBonus,
}

impl Effect {
    /// Whether applying this effect finishes the fight.
    #[must_use]
    pub const fn ends_combat(self) -> bool {
        matches!(
            self,
            Self::End | Self::MinionDeath | Self::DraculaDeath | Self::Repel | Self::EscapeAsBat
        )
    }
}

/// Ordered effect list produced by a table lookup.
pub type Outcome = SmallVec<[Effect; 4]>;

/// Who the hunters are fighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opponent {
    Dracula,
    MinionWithKnife,
    MinionWithPistol,
    MinionWithRifle,
}

impl Opponent {
    #[must_use]
    pub const fn is_dracula(self) -> bool {
        matches!(self, Self::Dracula)
    }

    /// Cards the opponent may play this round.
    ///
    /// Dracula never repeats the card he played in the previous round, and
    /// some of his cards need darkness.
    #[must_use]
    pub fn legal_cards(self, is_night: bool, previous: Option<Attack>) -> Vec<Attack> {
        let deck: &[Attack] = match self {
            Self::Dracula => &[
                Attack::Claws,
                Attack::Fangs,
                Attack::Strength,
                Attack::Mesmerize,
                Attack::DodgeDracula,
                Attack::EscapeBat,
                Attack::EscapeMist,
            ],
            Self::MinionWithKnife => &[Attack::MinionPunch, Attack::MinionKnife, Attack::MinionDodge],
            Self::MinionWithPistol => &[
                Attack::MinionPunch,
                Attack::MinionKnife,
                Attack::MinionPistol,
                Attack::MinionDodge,
            ],
            Self::MinionWithRifle => &[
                Attack::MinionPunch,
                Attack::MinionKnife,
                Attack::MinionRifle,
                Attack::MinionDodge,
            ],
        };
        deck.iter()
            .copied()
            .filter(|card| is_night || !card.night_only())
            .filter(|card| !self.is_dracula() || Some(*card) != previous)
            .collect()
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dracula => "Dracula",
            Self::MinionWithKnife => "a minion with a knife",
            Self::MinionWithPistol => "a minion with a pistol",
            Self::MinionWithRifle => "a minion with a rifle",
        }
    }
}

impl fmt::Display for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cards played by Dracula or a minion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attack {
    Claws,
    Fangs,
    Strength,
    Mesmerize,
    DodgeDracula,
    EscapeBat,
    EscapeMist,
    MinionPunch,
    MinionKnife,
    MinionPistol,
    MinionRifle,
    MinionDodge,
}

impl Attack {
    pub const ALL: [Self; 12] = [
        Self::Claws,
        Self::Fangs,
        Self::Strength,
        Self::Mesmerize,
        Self::DodgeDracula,
        Self::EscapeBat,
        Self::EscapeMist,
        Self::MinionPunch,
        Self::MinionKnife,
        Self::MinionPistol,
        Self::MinionRifle,
        Self::MinionDodge,
    ];

    #[must_use]
    pub const fn night_only(self) -> bool {
        matches!(self, Self::Fangs | Self::Mesmerize | Self::EscapeBat)
    }

    #[must_use]
    pub const fn is_minion_card(self) -> bool {
        matches!(
            self,
            Self::MinionPunch
                | Self::MinionKnife
                | Self::MinionPistol
                | Self::MinionRifle
                | Self::MinionDodge
        )
    }

    const fn is_dracula_strike(self) -> bool {
        matches!(
            self,
            Self::Claws | Self::Fangs | Self::Strength | Self::Mesmerize
        )
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Claws => "Claws",
            Self::Fangs => "Fangs",
            Self::Strength => "Strength",
            Self::Mesmerize => "Mesmerize",
            Self::DodgeDracula => "Dodge",
            Self::EscapeBat => "Escape (Bat)",
            Self::EscapeMist => "Escape (Mist)",
            Self::MinionPunch => "Punch",
            Self::MinionKnife => "Knife",
            Self::MinionPistol => "Pistol",
            Self::MinionRifle => "Rifle",
            Self::MinionDodge => "Dodge",
        }
    }
}

impl fmt::Display for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const fn holy_vs_minion(defender: Attack, attacker: Item) -> bool {
    defender.is_minion_card()
        && matches!(attacker, Item::Stake | Item::SacredBullets | Item::Crucifix)
}

/// Effects when the hunter's roll beats the opponent's.
#[must_use]
pub fn resolve_attacker_success(defender: Attack, attacker: Item) -> Outcome {
    use Attack as A;
    use Effect as E;

    if holy_vs_minion(defender, attacker) {
        return smallvec![E::Invalid];
    }
    match attacker {
        Item::Escape => return smallvec![E::End],
        Item::Dodge => return smallvec![E::Continue],
        _ => {}
    }
    if defender.is_minion_card() {
        return match (attacker, defender) {
            (_, A::MinionDodge) => smallvec![E::Continue],
            (Item::Punch, _) => smallvec![E::RollBonus, E::Continue],
            (Item::Knife | Item::Pistol | Item::Rifle, _) => smallvec![E::MinionDeath, E::End],
            _ => smallvec![E::Invalid],
        };
    }
    if !defender.is_dracula_strike() {
        // Dodge and escape cards: the hunter only keeps Dracula in the fight.
        return match attacker {
            Item::SacredBullets if defender != A::DodgeDracula => {
                smallvec![E::ItemDestroyed, E::BloodLoss1, E::Continue]
            }
            _ => smallvec![E::Continue],
        };
    }
    match (attacker, defender) {
        (Item::Punch, _) => smallvec![E::BloodLoss1, E::Continue],
        (Item::Knife | Item::Pistol, _) => smallvec![E::BloodLoss2, E::Continue],
        (Item::Rifle, _) => smallvec![E::BloodLoss3, E::Continue],
        (Item::Stake, A::Fangs | A::Mesmerize) => {
            smallvec![E::ItemDestroyed, E::DraculaDeath, E::End]
        }
        (Item::Stake, _) => smallvec![E::ItemDestroyed, E::BloodLoss4, E::End],
        (Item::SacredBullets, A::Claws) => smallvec![E::ItemDestroyed, E::BloodLoss2, E::Continue],
        (Item::SacredBullets, A::Strength) => {
            smallvec![E::ItemDestroyed, E::BloodLoss3, E::Continue]
        }
        (Item::SacredBullets, A::Fangs) => smallvec![E::ItemDestroyed, E::BloodLoss4, E::Continue],
        (Item::SacredBullets, _) => smallvec![E::ItemDestroyed, E::BloodLoss4, E::End],
        (Item::Crucifix, _) => smallvec![E::Repel, E::End],
        _ => smallvec![E::Invalid],
    }
}

/// Effects when the opponent's roll matches or beats the hunter's.
#[must_use]
pub fn resolve_defender_success(defender: Attack, attacker: Item) -> Outcome {
    use Attack as A;
    use Effect as E;

    if holy_vs_minion(defender, attacker) {
        return smallvec![E::Invalid];
    }
    match defender {
        A::Claws => smallvec![E::HealthLoss2, E::Continue],
        A::Fangs => smallvec![E::Bite, E::HealthLoss1, E::End],
        A::Strength => match attacker {
            Item::Punch => smallvec![E::AllItemsLost, E::Continue],
            Item::Dodge | Item::Escape => smallvec![E::HealthLoss1, E::Continue],
            _ => smallvec![E::ItemDestroyed, E::Continue],
        },
        A::Mesmerize => smallvec![E::EventDiscarded, E::Continue],
        A::DodgeDracula | A::MinionDodge => smallvec![E::InitiativeBonus, E::Continue],
        A::EscapeBat => smallvec![E::EscapeAsBat, E::End],
        A::EscapeMist => smallvec![E::End],
        A::MinionPunch => smallvec![E::HealthLoss1, E::Continue],
        A::MinionKnife | A::MinionPistol => smallvec![E::HealthLoss2, E::Continue],
        A::MinionRifle => smallvec![E::HealthLoss3, E::Continue],
    }
}

/// How a fight finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatEnd {
    /// Someone played an ending card or escaped.
    Disengaged,
    MinionKilled,
    DraculaKilled,
    Repelled,
    /// Dracula fled as a bat and is concealed again.
    DraculaEscaped,
    HuntersDefeated,
    RoundLimit,
}

/// One hunter's exchange within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub hunter: HunterId,
    pub item: Item,
    pub hunter_total: u8,
    pub opponent_total: u8,
    pub hunter_won: bool,
    pub effects: Vec<Effect>,
}

/// Record of a played round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRound {
    pub number: u8,
    pub attack: Attack,
    pub exchanges: Vec<Exchange>,
    pub defeated: Vec<HunterId>,
    pub end: Option<CombatEnd>,
    pub narration: String,
}

/// Mutable participants a round acts upon.
pub struct CombatContext<'a> {
    pub dracula: &'a mut Dracula,
    pub hunters: &'a mut [Hunter],
    pub items: &'a mut Pool<Item>,
    pub events: &'a mut Pool<HunterEvent>,
}

/// State of one ongoing fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    opponent: Opponent,
    location: LocationId,
    hunters: Vec<HunterId>,
    hunter_bonus: u8,
    opponent_bonus: u8,
    previous: Option<Attack>,
    rounds: u8,
    end: Option<CombatEnd>,
}

impl Combat {
    #[must_use]
    pub fn new(opponent: Opponent, location: LocationId, hunters: Vec<HunterId>) -> Self {
        Self {
            opponent,
            location,
            hunters,
            hunter_bonus: 0,
            opponent_bonus: 0,
            previous: None,
            rounds: 0,
            end: None,
        }
    }

    #[must_use]
    pub const fn opponent(&self) -> Opponent {
        self.opponent
    }

    #[must_use]
    pub const fn location(&self) -> LocationId {
        self.location
    }

    #[must_use]
    pub fn hunters(&self) -> &[HunterId] {
        &self.hunters
    }

    #[must_use]
    pub const fn previous_attack(&self) -> Option<Attack> {
        self.previous
    }

    #[must_use]
    pub const fn rounds(&self) -> u8 {
        self.rounds
    }

    #[must_use]
    pub const fn end(&self) -> Option<CombatEnd> {
        self.end
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.end.is_some()
    }

    /// Add a roll bonus to the hunters' next round.
    pub const fn grant_hunter_bonus(&mut self) {
        self.hunter_bonus = self.hunter_bonus.saturating_add(1);
    }

    /// Play one round: the opponent shows `attack`, every submission rolls
    /// against the same opponent roll, and the winning table is applied.
    pub fn play_round<R: Rng + ?Sized>(
        &mut self,
        submissions: &[(HunterId, Item)],
        attack: Attack,
        ctx: &mut CombatContext<'_>,
        rng: &mut R,
    ) -> CombatRound {
        self.rounds = self.rounds.saturating_add(1);
        let opponent_total = roll(rng).saturating_add(self.opponent_bonus);
        let hunter_bonus = self.hunter_bonus;
        self.hunter_bonus = 0;
        self.opponent_bonus = 0;
        self.previous = Some(attack);

        let mut lines = vec![format!(
            "Round {}: {} plays {attack} (rolls {opponent_total}).",
            self.rounds, self.opponent
        )];
        let mut exchanges = Vec::with_capacity(submissions.len());
        let mut defeated = Vec::new();

        for &(hunter_id, item) in submissions {
            if self.end.is_some() {
                break;
            }
            let Some(hunter) = ctx.hunters.get_mut(hunter_id.index()) else {
                continue;
            };
            if !self.hunters.contains(&hunter_id) {
                continue;
            }
            let hunter_total = roll(rng).saturating_add(hunter_bonus);
            let hunter_won = hunter_total > opponent_total;
            let effects = if hunter_won {
                resolve_attacker_success(attack, item)
            } else {
                resolve_defender_success(attack, item)
            };
            lines.push(format!(
                "{} uses {item} (rolls {hunter_total}) and {}.",
                hunter.name(),
                if hunter_won { "wins" } else { "loses" }
            ));

            let mut applied = Vec::with_capacity(effects.len());
            for effect in effects.iter().copied() {
                applied.push(effect);
                lines.extend(self.apply(effect, hunter, item, ctx.dracula, ctx.items, ctx.events, rng));
                if hunter.is_defeated() {
                    defeated.push(hunter_id);
                    lines.push(format!("{} is defeated.", hunter.name()));
                    break;
                }
                if ctx.dracula.blood() == 0 && self.opponent.is_dracula() {
                    self.end = Some(CombatEnd::DraculaKilled);
                }
                if self.end.is_some() || effect.ends_combat() {
                    break;
                }
            }
            exchanges.push(Exchange {
                hunter: hunter_id,
                item,
                hunter_total,
                opponent_total,
                hunter_won,
                effects: applied,
            });
        }

        self.hunters.retain(|id| !defeated.contains(id));
        if self.end.is_none() && self.hunters.is_empty() {
            self.end = Some(CombatEnd::HuntersDefeated);
        }
        if self.end.is_none() && self.rounds >= COMBAT_ROUND_LIMIT {
            self.end = Some(CombatEnd::RoundLimit);
            lines.push("The fight stalls and both sides withdraw.".to_string());
        }
        if let Some(end) = self.end {
            log::info!("combat against {} ended: {end:?}", self.opponent);
        }

        CombatRound {
            number: self.rounds,
            attack,
            exchanges,
            defeated,
            end: self.end,
            narration: lines.join("\n"),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply<R: Rng + ?Sized>(
        &mut self,
        effect: Effect,
        hunter: &mut Hunter,
        item: Item,
        dracula: &mut Dracula,
        items: &mut Pool<Item>,
        events: &mut Pool<HunterEvent>,
        rng: &mut R,
    ) -> Option<String> {
        let blood = |amount: u8, dracula: &mut Dracula| {
            let lost = dracula.lose_blood(amount);
            Some(format!("Dracula loses {lost} blood."))
        };
        match effect {
            Effect::BloodLoss1 => blood(1, dracula),
            Effect::BloodLoss2 => blood(2, dracula),
            Effect::BloodLoss3 => blood(3, dracula),
            Effect::BloodLoss4 => blood(4, dracula),
            Effect::HealthLoss1 | Effect::HealthLoss2 | Effect::HealthLoss3 => {
                let amount = match effect {
                    Effect::HealthLoss1 => 1,
                    Effect::HealthLoss2 => 2,
                    _ => 3,
                };
                let lost = hunter.lose_health(amount);
                Some(format!("{} loses {lost} health.", hunter.name()))
            }
            Effect::ItemDestroyed => {
                if item.is_card() && hunter.take_item(item) {
                    items.discard(item, rng);
                    Some(format!("{}'s {item} is spent.", hunter.name()))
                } else {
                    None
                }
            }
            Effect::EventDiscarded => hunter.take_random_event(rng).map(|event| {
                events.discard(event, rng);
                format!("{} forgets {event}.", hunter.name())
            }),
            Effect::AllItemsLost => {
                let lost = hunter.take_all_items();
                if lost.is_empty() {
                    return None;
                }
                items.discard_all(lost, rng);
                Some(format!("{} is disarmed.", hunter.name()))
            }
            Effect::Bite => {
                hunter.bite();
                Some(format!("{} is bitten.", hunter.name()))
            }
            Effect::MinionDeath => {
                self.end = Some(CombatEnd::MinionKilled);
                Some(format!("{} is slain.", self.opponent))
            }
            Effect::DraculaDeath => {
                dracula.kill();
                self.end = Some(CombatEnd::DraculaKilled);
                Some("Dracula is destroyed.".to_string())
            }
            Effect::Repel => {
                self.end = Some(CombatEnd::Repelled);
                Some("Dracula is repelled.".to_string())
            }
            Effect::EscapeAsBat => {
                dracula.conceal();
                self.end = Some(CombatEnd::DraculaEscaped);
                Some("Dracula escapes as a bat.".to_string())
            }
            Effect::End => {
                if self.end.is_none() {
                    self.end = Some(CombatEnd::Disengaged);
                }
                None
            }
            Effect::Continue => None,
            Effect::Invalid => {
                log::warn!("no combat table entry for {item} against {}", self.opponent);
                Some(format!("{item} has no effect here."))
            }
            Effect::RollBonus => {
                self.hunter_bonus = self.hunter_bonus.saturating_add(1);
                None
            }
            Effect::InitiativeBonus => {
                self.opponent_bonus = self.opponent_bonus.saturating_add(1);
                None
            }
        }
    }
}

fn roll<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=COMBAT_DIE_SIDES)
}
