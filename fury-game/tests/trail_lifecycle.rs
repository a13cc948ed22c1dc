use fury_game::encounters::encounter_pool;
use fury_game::trail::Overflow;
use fury_game::{CardView, Encounter, MapGraph, Power, Trail};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::rngs::mock::StepRng;

const ROUTE: [&str; 7] = [
    "Madrid", "Santander", "Saragossa", "Bordeaux", "Nantes", "Paris", "Le Havre",
];

fn lay_route(trail: &mut Trail, map: &MapGraph, names: &[&str]) {
    for name in names {
        let card = trail.new_card(Some(map.id(name).unwrap()), None).unwrap();
        trail.push_head(card);
    }
}

#[test]
fn seventh_land_card_can_retire_to_the_catacombs() {
    let map = MapGraph::standard().unwrap();
    // A zero step makes every chance roll succeed.
    let mut rng = StepRng::new(0, 0);
    let mut pool = encounter_pool(&mut rng);
    let before = pool.len();
    let mut trail = Trail::new();
    lay_route(&mut trail, &map, &ROUTE);
    assert_eq!(trail.len(), 7);

    let overflow = trail.evaluate_overflow(&map, &mut pool, &mut rng).unwrap();
    let Overflow::Catacombed(id) = overflow else {
        panic!("expected the oldest card to enter the catacombs, got {overflow:?}");
    };
    assert_eq!(trail.len(), 6);
    assert_eq!(trail.catacombs().len(), 1);
    assert_eq!(trail.catacombs()[0].id(), id);
    assert_eq!(trail.catacombs()[0].location(), map.id("Madrid"));
    assert!(trail.catacombs()[0].catacomb_encounter().is_some());
    assert_eq!(pool.len(), before - 1);
    trail.check().unwrap();
}

#[test]
fn sea_cards_always_drop_off() {
    let map = MapGraph::standard().unwrap();
    let mut rng = StepRng::new(0, 0);
    let mut pool = encounter_pool(&mut rng);
    let mut trail = Trail::new();
    lay_route(&mut trail, &map, &["Bay of Biscay"]);
    lay_route(&mut trail, &map, &ROUTE[1..]);

    let overflow = trail.evaluate_overflow(&map, &mut pool, &mut rng).unwrap();
    let Overflow::Dropped(card) = overflow else {
        panic!("sea card should not enter the catacombs, got {overflow:?}");
    };
    assert_eq!(card.location(), map.id("Bay of Biscay"));
    assert!(trail.catacombs().is_empty());
}

#[test]
fn short_trails_do_not_overflow() {
    let map = MapGraph::standard().unwrap();
    let mut rng = SmallRng::seed_from_u64(4);
    let mut pool = encounter_pool(&mut rng);
    let mut trail = Trail::new();
    lay_route(&mut trail, &map, &ROUTE[..6]);
    assert_eq!(
        trail.evaluate_overflow(&map, &mut pool, &mut rng).unwrap(),
        Overflow::None
    );
}

#[test]
fn long_runs_keep_capacities() {
    let map = MapGraph::standard().unwrap();
    let mut rng = SmallRng::seed_from_u64(21);
    let mut pool = encounter_pool(&mut rng);
    let mut trail = Trail::new();
    for lap in 0..6 {
        for name in ROUTE {
            let card = trail.new_card(Some(map.id(name).unwrap()), None).unwrap();
            trail.push_head(card);
            trail.evaluate_overflow(&map, &mut pool, &mut rng).unwrap();
            if lap % 2 == 0 {
                trail.evaluate_catacombs(None, None, &mut pool, &mut rng);
            }
            trail.check().unwrap();
        }
    }
}

#[test]
fn compound_powers_block_their_parts() {
    let map = MapGraph::standard().unwrap();
    let mut trail = Trail::new();
    let card = trail
        .new_card(map.id("Paris"), Some(Power::WolfFormAndDoubleBack))
        .unwrap();
    trail.push_head(card);
    let used = trail.used_powers();
    assert!(used.contains(&Power::WolfForm));
    assert!(used.contains(&Power::DoubleBack));
    assert!(used.contains(&Power::WolfFormAndDoubleBack));
    assert!(!used.contains(&Power::Hide));
}

#[test]
fn truncation_returns_every_encounter() {
    let map = MapGraph::standard().unwrap();
    let mut rng = SmallRng::seed_from_u64(2);
    let mut pool = encounter_pool(&mut rng);
    let full = pool.len();
    let mut trail = Trail::new();
    for name in &ROUTE[..4] {
        let mut card = trail.new_card(map.id(name), None).unwrap();
        card.set_encounter(pool.draw(&mut rng).unwrap());
        trail.push_head(card);
    }
    assert_eq!(pool.len(), full - 4);

    let last = trail.new_card(map.id("Paris"), None).unwrap();
    trail.truncate_to(last, &mut pool, &mut rng);
    assert_eq!(trail.len(), 1);
    assert_eq!(pool.len(), full);
}

#[test]
fn view_hides_concealed_cards() {
    let map = MapGraph::standard().unwrap();
    let mut trail = Trail::new();
    lay_route(&mut trail, &map, &ROUTE[..2]);
    let santander = map.id("Santander").unwrap();
    assert_eq!(trail.reveal_at(santander), 1);

    let view = trail.view();
    assert_eq!(view.trail.len(), 2);
    assert!(matches!(
        view.trail[0],
        CardView::Revealed { location: Some(loc), encounter: None, .. } if loc == santander
    ));
    assert_eq!(view.trail[1], CardView::Concealed);
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["trail"][1]["state"], "concealed");
}

#[test]
fn search_lifts_encounters_for_resolution() {
    let map = MapGraph::standard().unwrap();
    let mut trail = Trail::new();
    let nantes = map.id("Nantes").unwrap();
    let mut card = trail.new_card(Some(nantes), None).unwrap();
    card.set_encounter(Encounter::Thief);
    trail.push_head(card);
    let result = trail.search(nantes);
    assert_eq!(result.encounters, vec![Encounter::Thief]);
    assert!(trail.head().unwrap().encounter().is_none());
    assert!(trail.search(map.id("Paris").unwrap()).is_empty());
}

#[test]
fn two_matching_cards_are_searched_head_first() {
    let map = MapGraph::standard().unwrap();
    let mut trail = Trail::new();
    let nantes = map.id("Nantes").unwrap();
    let paris = map.id("Paris").unwrap();

    let mut older = trail.new_card(Some(nantes), None).unwrap();
    older.set_encounter(Encounter::Rats);
    let older_id = older.id();
    trail.push_head(older);
    let between = trail.new_card(Some(paris), None).unwrap();
    trail.push_head(between);
    let mut newer = trail.new_card(Some(nantes), Some(Power::DoubleBack)).unwrap();
    newer.set_encounter(Encounter::Fog);
    let newer_id = newer.id();
    trail.push_head(newer);

    let result = trail.search(nantes);
    assert_eq!(result.revealed, vec![newer_id, older_id]);
    assert_eq!(result.encounters, vec![Encounter::Fog, Encounter::Rats]);
    assert!(trail.cards().filter(|c| c.location() == Some(nantes)).all(|c| c.is_revealed()));
    assert!(!trail.cards().nth(1).unwrap().is_revealed());
}
