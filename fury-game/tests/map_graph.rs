use fury_game::map::{Domain, LocationKind, LocationSpec, MapSpec};
use fury_game::{MapError, MapGraph, MapProblem, ModeSet, TravelMode};

fn standard() -> std::sync::Arc<MapGraph> {
    MapGraph::standard().unwrap()
}

#[test]
fn every_connection_runs_both_ways() {
    let map = standard();
    for (id, location) in map.iter() {
        for mode in [TravelMode::Road, TravelMode::Rail, TravelMode::Sea] {
            for &other in location.adjacent(mode) {
                assert!(
                    map.adjacent(other, mode).contains(&id),
                    "{} -> {} by {mode} has no way back",
                    location.name(),
                    map.name(other)
                );
            }
        }
    }
}

#[test]
fn seas_only_touch_by_sea() {
    let map = standard();
    for (id, location) in map.iter() {
        if location.is_sea() {
            assert!(map.adjacent(id, TravelMode::Road).is_empty());
            assert!(map.adjacent(id, TravelMode::Rail).is_empty());
            assert!(!map.adjacent(id, TravelMode::Sea).is_empty());
        }
    }
}

#[test]
fn distances_are_symmetric_and_metric_for_every_pair() {
    let map = standard();
    let ids: Vec<_> = map.ids().collect();
    let table: Vec<Vec<u32>> = ids
        .iter()
        .map(|&a| {
            ids.iter()
                .map(|&b| {
                    map.distance(a, b, ModeSet::ALL)
                        .unwrap_or_else(|| panic!("{} cannot reach {}", map.name(a), map.name(b)))
                })
                .collect()
        })
        .collect();
    for a in 0..ids.len() {
        assert_eq!(table[a][a], 0);
        for b in 0..ids.len() {
            assert_eq!(
                table[a][b],
                table[b][a],
                "{} <-> {}",
                map.name(ids[a]),
                map.name(ids[b])
            );
            for c in 0..ids.len() {
                assert!(
                    table[a][b] <= table[a][c] + table[c][b],
                    "{} -> {} beats the detour through {}",
                    map.name(ids[a]),
                    map.name(ids[b]),
                    map.name(ids[c])
                );
            }
        }
    }
}

#[test]
fn within_matches_distance() {
    let map = standard();
    let paris = map.id("Paris").unwrap();
    let reach = map.within(paris, 2, ModeSet::ROAD);
    assert!(!reach.contains(&paris));
    for id in map.ids() {
        let close = map
            .distance(paris, id, ModeSet::ROAD)
            .is_some_and(|d| (1..=2).contains(&d));
        assert_eq!(reach.contains(&id), close, "{}", map.name(id));
    }
}

#[test]
fn rail_routes_respect_their_hop_counts() {
    let map = standard();
    for id in map.ids() {
        for &(dest, hops) in map.rail_routes(id) {
            assert!((1..=3).contains(&hops));
            assert!(map.connected_by_fast_mode(id, dest, hops));
            assert!(!map.connected_by_fast_mode(id, dest, hops - 1));
        }
    }
}

#[test]
fn one_sided_neighbour_lists_are_rejected() {
    let mut a = LocationSpec::new("A", LocationKind::SmallCity, Domain::West);
    a.road.push("B".to_string());
    let spec = MapSpec {
        locations: vec![
            a,
            LocationSpec::new("B", LocationKind::Hospital, Domain::West),
            LocationSpec::new("C", LocationKind::Castle, Domain::East),
        ],
        ..MapSpec::default()
    };
    let Err(MapError::Invalid(problems)) = MapGraph::from_spec(spec) else {
        panic!("map should fail verification");
    };
    assert!(problems.contains(&MapProblem::NotReciprocal {
        from: "A".to_string(),
        to: "B".to_string(),
        mode: TravelMode::Road,
    }));
    assert!(
        problems
            .iter()
            .any(|problem| matches!(problem, MapProblem::Disconnected { unreachable } if unreachable == &["C".to_string()]))
    );
}

#[test]
fn sea_connections_between_land_are_rejected() {
    let mut spec = MapSpec {
        locations: vec![
            LocationSpec::new("Port", LocationKind::LargeCity, Domain::West),
            LocationSpec::new("Harbour", LocationKind::Hospital, Domain::West),
            LocationSpec::new("Keep", LocationKind::Castle, Domain::East),
        ],
        ..MapSpec::default()
    };
    spec.connect(TravelMode::Sea, "Port", "Harbour");
    spec.connect(TravelMode::Road, "Harbour", "Keep");
    let Err(MapError::Invalid(problems)) = MapGraph::from_spec(spec) else {
        panic!("map should fail verification");
    };
    assert!(problems.contains(&MapProblem::SeaEdgeOnLand {
        a: "Port".to_string(),
        b: "Harbour".to_string(),
    }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        MapGraph::from_json("{ not json"),
        Err(MapError::Parse(_))
    ));
    assert!(matches!(
        MapGraph::from_json(r#"{ "locations": [] }"#),
        Err(MapError::Invalid(problems)) if problems == vec![MapProblem::Empty]
    ));
}
