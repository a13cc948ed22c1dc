use fury_game::cards::Pool;
use fury_game::combat::{CombatContext, resolve_attacker_success, resolve_defender_success};
use fury_game::{
    Attack, Combat, CombatEnd, Dracula, Effect, Hunter, HunterId, Item, LocationId, Opponent,
    ROSTER,
};
use rand::rngs::mock::StepRng;

const ITEMS: [Item; 9] = [
    Item::Punch,
    Item::Dodge,
    Item::Escape,
    Item::Knife,
    Item::Pistol,
    Item::Rifle,
    Item::Stake,
    Item::SacredBullets,
    Item::Crucifix,
];

fn roster_at(location: LocationId) -> Vec<Hunter> {
    (0_u8..)
        .zip(ROSTER.iter())
        .map(|(idx, profile)| Hunter::new(HunterId(idx), profile, location))
        .collect()
}

#[test]
fn every_pairing_has_an_outcome() {
    for attack in Attack::ALL {
        for item in ITEMS {
            assert!(!resolve_attacker_success(attack, item).is_empty(), "{attack} vs {item}");
            assert!(!resolve_defender_success(attack, item).is_empty(), "{attack} vs {item}");
        }
    }
}

#[test]
fn holy_items_never_apply_to_minion_cards() {
    for attack in Attack::ALL.into_iter().filter(|a| a.is_minion_card()) {
        for item in [Item::Stake, Item::SacredBullets, Item::Crucifix] {
            assert_eq!(resolve_attacker_success(attack, item).as_slice(), &[Effect::Invalid]);
            assert_eq!(resolve_defender_success(attack, item).as_slice(), &[Effect::Invalid]);
            assert!(!item.usable_against(Opponent::MinionWithRifle));
        }
    }
}

#[test]
fn outcomes_end_at_most_once() {
    for attack in Attack::ALL {
        for item in ITEMS {
            for outcome in [
                resolve_attacker_success(attack, item),
                resolve_defender_success(attack, item),
            ] {
                let enders = outcome.iter().filter(|e| e.ends_combat()).count();
                let continues = outcome.contains(&Effect::Continue);
                assert!(!(continues && enders > 0), "{attack} vs {item}: {outcome:?}");
            }
        }
    }
}

#[test]
fn tied_rolls_go_to_the_minion() {
    let at = LocationId(7);
    let mut hunters = roster_at(at);
    let mut dracula = Dracula::new(LocationId(0));
    let mut items = Pool::empty("item");
    let mut events = Pool::empty("event");
    let mut combat = Combat::new(Opponent::MinionWithKnife, at, vec![HunterId(1)]);
    // A zero step rolls a one for everybody.
    let mut rng = StepRng::new(0, 0);
    let mut ctx = CombatContext {
        dracula: &mut dracula,
        hunters: &mut hunters,
        items: &mut items,
        events: &mut events,
    };

    let round = combat.play_round(&[(HunterId(1), Item::Punch)], Attack::MinionKnife, &mut ctx, &mut rng);
    assert_eq!(round.number, 1);
    assert_eq!(round.exchanges.len(), 1);
    assert!(!round.exchanges[0].hunter_won);
    assert_eq!(round.end, None);
    assert_eq!(hunters[1].health(), ROSTER[1].max_health - 2);
    assert_eq!(combat.previous_attack(), Some(Attack::MinionKnife));
}

#[test]
fn hunters_outside_the_fight_are_ignored() {
    let at = LocationId(7);
    let mut hunters = roster_at(at);
    let mut dracula = Dracula::new(at);
    let mut items = Pool::empty("item");
    let mut events = Pool::empty("event");
    let mut combat = Combat::new(Opponent::Dracula, at, vec![HunterId(0)]);
    let mut rng = StepRng::new(0, 0);
    let mut ctx = CombatContext {
        dracula: &mut dracula,
        hunters: &mut hunters,
        items: &mut items,
        events: &mut events,
    };
    let round = combat.play_round(&[(HunterId(2), Item::Punch)], Attack::Claws, &mut ctx, &mut rng);
    assert!(round.exchanges.is_empty());
    assert_eq!(hunters[2].health(), ROSTER[2].max_health);
}

#[test]
fn fangs_on_a_tie_bite_and_end_the_fight() {
    let at = LocationId(7);
    let mut hunters = roster_at(at);
    let mut dracula = Dracula::new(at);
    let mut items = Pool::empty("item");
    let mut events = Pool::empty("event");
    let mut combat = Combat::new(Opponent::Dracula, at, vec![HunterId(3)]);
    let mut rng = StepRng::new(0, 0);
    let mut ctx = CombatContext {
        dracula: &mut dracula,
        hunters: &mut hunters,
        items: &mut items,
        events: &mut events,
    };
    let round = combat.play_round(&[(HunterId(3), Item::Dodge)], Attack::Fangs, &mut ctx, &mut rng);
    // Mina starts with a bite, so a second one defeats her.
    assert_eq!(round.defeated, vec![HunterId(3)]);
    assert_eq!(round.end, Some(CombatEnd::HuntersDefeated));
    assert!(combat.is_over());
    assert!(hunters[3].is_defeated());
}
