use std::sync::Arc;

use fury_game::adversary::{self, FirstCandidate, Situation, move_candidates};
use fury_game::{Dracula, MapGraph, ModeSet, Power, Trail};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn situation<'a>(
    map: &'a MapGraph,
    trail: &'a Trail,
    dracula: &'a Dracula,
    is_night: bool,
) -> Situation<'a> {
    Situation {
        map,
        trail,
        dracula,
        is_night,
    }
}

fn at(map: &Arc<MapGraph>, name: &str) -> Dracula {
    Dracula::new(map.id(name).unwrap())
}

#[test]
fn last_drop_of_blood_keeps_dracula_ashore() {
    let map = MapGraph::standard().unwrap();
    let trail = Trail::new();
    let mut dracula = at(&map, "Bordeaux");
    dracula.lose_blood(dracula.blood() - 1);
    assert_eq!(dracula.blood(), 1);

    let candidates = move_candidates(&situation(&map, &trail, &dracula, true));
    assert!(!candidates.is_empty());
    for candidate in &candidates {
        if let Some(dest) = candidate.destination {
            assert!(!map.is_sea(dest), "{}", candidate.describe(&map));
        }
        // Only powers that cost nothing remain.
        if let Some(power) = candidate.power {
            assert!(power.blood_cost() < 1, "{power} should be unaffordable");
        }
    }
}

#[test]
fn healthy_dracula_may_put_to_sea() {
    let map = MapGraph::standard().unwrap();
    let trail = Trail::new();
    let dracula = at(&map, "Bordeaux");
    let candidates = move_candidates(&situation(&map, &trail, &dracula, false));
    let biscay = map.id("Bay of Biscay").unwrap();
    assert!(candidates.iter().any(|c| c.destination == Some(biscay) && c.power.is_none()));
}

#[test]
fn the_hospital_is_never_a_destination() {
    let map = MapGraph::standard().unwrap();
    let trail = Trail::new();
    let hospital = map.hospital();
    for start in map.neighbours(hospital, ModeSet::ROAD) {
        let dracula = Dracula::new(start);
        let candidates = move_candidates(&situation(&map, &trail, &dracula, true));
        assert!(candidates.iter().all(|c| c.destination != Some(hospital)));
    }
}

#[test]
fn powers_on_the_trail_cannot_be_reused() {
    let map = MapGraph::standard().unwrap();
    let mut trail = Trail::new();
    let hide = trail.new_card(None, Some(Power::Hide)).unwrap();
    trail.push_head(hide);
    let dracula = at(&map, "Paris");
    let candidates = move_candidates(&situation(&map, &trail, &dracula, true));
    assert!(candidates.iter().all(|c| c.power != Some(Power::Hide)));
    assert!(candidates.iter().any(|c| c.power == Some(Power::Feed)));
}

#[test]
fn no_powers_at_sea() {
    let map = MapGraph::standard().unwrap();
    let trail = Trail::new();
    let dracula = at(&map, "Bay of Biscay");
    let candidates = move_candidates(&situation(&map, &trail, &dracula, true));
    assert!(!candidates.is_empty());
    assert!(candidates.iter().all(|c| c.power.is_none()));
}

#[test]
fn wolf_form_reaches_two_roads_away() {
    let map = MapGraph::standard().unwrap();
    let trail = Trail::new();
    let dracula = at(&map, "Paris");
    let candidates = move_candidates(&situation(&map, &trail, &dracula, false));
    let wolf: Vec<_> = candidates
        .iter()
        .filter(|c| c.power == Some(Power::WolfForm))
        .filter_map(|c| c.destination)
        .collect();
    assert!(!wolf.is_empty());
    let paris = dracula.location();
    for dest in wolf {
        let distance = map.distance(paris, dest, ModeSet::ROAD).unwrap();
        assert!((1..=2).contains(&distance));
    }
}

#[test]
fn sampling_is_reproducible() {
    let map = MapGraph::standard().unwrap();
    let trail = Trail::new();
    let dracula = at(&map, "Vienna");
    let candidates = move_candidates(&situation(&map, &trail, &dracula, true));

    let mut first = SmallRng::seed_from_u64(77);
    let mut second = SmallRng::seed_from_u64(77);
    let a = adversary::sample(&candidates, &map, &mut first).unwrap();
    let b = adversary::sample(&candidates, &map, &mut second).unwrap();
    assert_eq!(a, b);
    assert!(a.1.roll < a.1.candidates.iter().map(|c| c.weight).sum::<u32>());

    let (idx, trace) = adversary::sample(&candidates, &map, &mut FirstCandidate).unwrap();
    assert_eq!((idx, trace.roll), (0, 0));
}

#[test]
fn opening_location_avoids_hunters_and_special_sites() {
    let map = MapGraph::standard().unwrap();
    let occupied: Vec<_> = ["London", "Paris", "Vienna", "Madrid"]
        .iter()
        .map(|name| map.id(name).unwrap())
        .collect();
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..50 {
        let start = adversary::choose_start(&map, &occupied, &mut rng).unwrap();
        assert!(!map.is_sea(start));
        assert!(!occupied.contains(&start));
        assert_ne!(start, map.hospital());
        assert_ne!(start, map.castle());
    }
}

#[test]
fn one_double_back_per_location() {
    let map = MapGraph::standard().unwrap();
    let havre = map.id("Le Havre").unwrap();
    let mut trail = Trail::new();
    let older = trail.new_card(Some(havre), None).unwrap();
    trail.push_head(older);
    let newer = trail.new_card(Some(havre), Some(Power::Feed)).unwrap();
    let newer_id = newer.id();
    trail.push_head(newer);
    let dracula = at(&map, "Paris");

    let candidates = move_candidates(&situation(&map, &trail, &dracula, false));
    for power in [Power::DoubleBack, Power::WolfFormAndDoubleBack] {
        let to_havre: Vec<_> = candidates
            .iter()
            .filter(|c| c.power == Some(power) && c.destination == Some(havre))
            .collect();
        assert_eq!(to_havre.len(), 1, "{power}");
        assert_eq!(to_havre[0].double_back, Some(newer_id));
    }
}
