//! Transport graph of the board.
//!
//! Locations live in an arena indexed by [`LocationId`]. Raw neighbour names
//! from the data file are resolved once into ids, the graph is verified, and
//! nothing is mutated afterwards.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::constants::RAIL_ROUTE_MAX_HOPS;

const STANDARD_MAP_JSON: &str = include_str!("../data/map.json");

/// Index of a location inside its [`MapGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u16);

impl LocationId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    SmallCity,
    LargeCity,
    Hospital,
    Castle,
    Sea,
}

/// Coarse geographic partition used by rail routing and rule filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    West,
    East,
    Sea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Road,
    Rail,
    Sea,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Road => "road",
            Self::Rail => "rail",
            Self::Sea => "sea",
        })
    }
}

/// Subset of travel modes considered by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModeSet {
    pub road: bool,
    pub rail: bool,
    pub sea: bool,
}

impl ModeSet {
    pub const ALL: Self = Self {
        road: true,
        rail: true,
        sea: true,
    };
    pub const ROAD: Self = Self {
        road: true,
        rail: false,
        sea: false,
    };
    pub const ROAD_AND_SEA: Self = Self {
        road: true,
        rail: false,
        sea: true,
    };
    pub const RAIL: Self = Self {
        road: false,
        rail: true,
        sea: false,
    };

    #[must_use]
    pub const fn contains(self, mode: TravelMode) -> bool {
        match mode {
            TravelMode::Road => self.road,
            TravelMode::Rail => self.rail,
            TravelMode::Sea => self.sea,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.road && !self.rail && !self.sea
    }
}

/// Immutable location record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    name: String,
    kind: LocationKind,
    domain: Domain,
    road: Vec<LocationId>,
    rail: Vec<LocationId>,
    sea: Vec<LocationId>,
}

impl Location {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> LocationKind {
        self.kind
    }

    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    #[must_use]
    pub const fn is_sea(&self) -> bool {
        matches!(self.kind, LocationKind::Sea)
    }

    #[must_use]
    pub const fn is_large_city(&self) -> bool {
        matches!(self.kind, LocationKind::LargeCity)
    }

    #[must_use]
    pub fn adjacent(&self, mode: TravelMode) -> &[LocationId] {
        match mode {
            TravelMode::Road => &self.road,
            TravelMode::Rail => &self.rail,
            TravelMode::Sea => &self.sea,
        }
    }
}

/// Raw location entry as stored in map data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    pub kind: LocationKind,
    pub domain: Domain,
    #[serde(default)]
    pub road: Vec<String>,
    #[serde(default)]
    pub rail: Vec<String>,
    #[serde(default)]
    pub sea: Vec<String>,
}

impl LocationSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: LocationKind, domain: Domain) -> Self {
        Self {
            name: name.into(),
            kind,
            domain,
            road: Vec::new(),
            rail: Vec::new(),
            sea: Vec::new(),
        }
    }

    fn names_mut(&mut self, mode: TravelMode) -> &mut Vec<String> {
        match mode {
            TravelMode::Road => &mut self.road,
            TravelMode::Rail => &mut self.rail,
            TravelMode::Sea => &mut self.sea,
        }
    }
}

/// Map data before name resolution.
///
/// Neighbours may be listed per location or as undirected pairs; pairs are
/// expanded onto both endpoints before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    pub locations: Vec<LocationSpec>,
    #[serde(default)]
    pub roads: Vec<[String; 2]>,
    #[serde(default)]
    pub rails: Vec<[String; 2]>,
    #[serde(default)]
    pub seas: Vec<[String; 2]>,
}

impl MapSpec {
    /// Parse map data from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a map.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add an undirected connection by name.
    pub fn connect(&mut self, mode: TravelMode, a: &str, b: &str) {
        let pair = [a.to_string(), b.to_string()];
        match mode {
            TravelMode::Road => self.roads.push(pair),
            TravelMode::Rail => self.rails.push(pair),
            TravelMode::Sea => self.seas.push(pair),
        }
    }

    /// Move pair lists onto both endpoints. Pairs where neither end is known
    /// cannot be attached anywhere and are returned as problems.
    fn expand_pairs(&mut self) -> Vec<MapProblem> {
        let index: HashMap<String, usize> = self
            .locations
            .iter()
            .enumerate()
            .map(|(idx, loc)| (loc.name.clone(), idx))
            .collect();
        let pairs = [
            (TravelMode::Road, std::mem::take(&mut self.roads)),
            (TravelMode::Rail, std::mem::take(&mut self.rails)),
            (TravelMode::Sea, std::mem::take(&mut self.seas)),
        ];
        let mut orphans = Vec::new();
        for (mode, list) in pairs {
            for [a, b] in list {
                match (index.get(&a), index.get(&b)) {
                    (None, None) => orphans.push(MapProblem::UnknownNeighbour {
                        location: a,
                        mode,
                        neighbour: b,
                    }),
                    (left, right) => {
                        if let Some(&idx) = left {
                            self.locations[idx].names_mut(mode).push(b.clone());
                        }
                        if let Some(&idx) = right {
                            self.locations[idx].names_mut(mode).push(a);
                        }
                    }
                }
            }
        }
        orphans
    }
}

/// Structural defect found while resolving or verifying a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapProblem {
    DuplicateName(String),
    UnknownNeighbour {
        location: String,
        mode: TravelMode,
        neighbour: String,
    },
    NotReciprocal {
        from: String,
        to: String,
        mode: TravelMode,
    },
    /// A sea connection joined two land locations.
    SeaEdgeOnLand { a: String, b: String },
    /// A road or rail connection touched a sea.
    LandEdgeAtSea {
        mode: TravelMode,
        a: String,
        b: String,
    },
    SelfLoop { location: String, mode: TravelMode },
    SeaDomainMismatch(String),
    HospitalCount(usize),
    CastleCount(usize),
    Disconnected { unreachable: Vec<String> },
    Empty,
}

impl fmt::Display for MapProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "duplicate location name '{name}'"),
            Self::UnknownNeighbour {
                location,
                mode,
                neighbour,
            } => write!(f, "{location} lists unknown {mode} neighbour '{neighbour}'"),
            Self::NotReciprocal { from, to, mode } => {
                write!(f, "{mode} connection {from} -> {to} has no way back")
            }
            Self::SeaEdgeOnLand { a, b } => write!(f, "sea connection between land {a} and {b}"),
            Self::LandEdgeAtSea { mode, a, b } => {
                write!(f, "{mode} connection {a} - {b} touches a sea")
            }
            Self::SelfLoop { location, mode } => write!(f, "{location} has a {mode} self loop"),
            Self::SeaDomainMismatch(name) => {
                write!(f, "{name} mixes sea and land kind/domain")
            }
            Self::HospitalCount(count) => write!(f, "expected one hospital, found {count}"),
            Self::CastleCount(count) => write!(f, "expected one castle, found {count}"),
            Self::Disconnected { unreachable } => {
                write!(f, "unreachable locations: {}", unreachable.join(", "))
            }
            Self::Empty => f.write_str("map has no locations"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("map failed verification: {}", format_problems(.0))]
    Invalid(Vec<MapProblem>),
}

fn format_problems(problems: &[MapProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Static board graph answering distance and reachability queries.
#[derive(Debug, Clone)]
pub struct MapGraph {
    locations: Vec<Location>,
    index: HashMap<String, LocationId>,
    /// Rail destinations per location with the fewest hops needed to reach them.
    rail_routes: Vec<Vec<(LocationId, u8)>>,
    hospital: LocationId,
    castle: LocationId,
}

static STANDARD: OnceLock<Arc<MapGraph>> = OnceLock::new();

impl MapGraph {
    /// The production board, parsed and verified once per process.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded map data is malformed.
    pub fn standard() -> Result<Arc<Self>, MapError> {
        if let Some(map) = STANDARD.get() {
            return Ok(Arc::clone(map));
        }
        let map = Arc::new(Self::from_json(STANDARD_MAP_JSON)?);
        Ok(Arc::clone(STANDARD.get_or_init(|| map)))
    }

    /// Parse, resolve and verify a map from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the resulting graph is malformed.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Self::from_spec(MapSpec::from_json(json)?)
    }

    /// Resolve raw neighbour names into ids and verify the result.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Invalid`] listing every problem found.
    pub fn from_spec(mut spec: MapSpec) -> Result<Self, MapError> {
        let mut problems = spec.expand_pairs();
        if spec.locations.is_empty() {
            return Err(MapError::Invalid(vec![MapProblem::Empty]));
        }

        let mut index = HashMap::with_capacity(spec.locations.len());
        for (idx, loc) in spec.locations.iter().enumerate() {
            let Ok(raw) = u16::try_from(idx) else {
                problems.push(MapProblem::DuplicateName(loc.name.clone()));
                continue;
            };
            if index.insert(loc.name.clone(), LocationId(raw)).is_some() {
                problems.push(MapProblem::DuplicateName(loc.name.clone()));
            }
        }

        let resolve = |loc: &LocationSpec, mode: TravelMode, problems: &mut Vec<MapProblem>| {
            let mut ids: Vec<LocationId> = loc
                .names_ref(mode)
                .iter()
                .filter_map(|name| {
                    let found = index.get(name).copied();
                    if found.is_none() {
                        problems.push(MapProblem::UnknownNeighbour {
                            location: loc.name.clone(),
                            mode,
                            neighbour: name.clone(),
                        });
                    }
                    found
                })
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        // The raw name lists are consumed here and never kept.
        let locations: Vec<Location> = spec
            .locations
            .iter()
            .map(|loc| Location {
                name: loc.name.clone(),
                kind: loc.kind,
                domain: loc.domain,
                road: resolve(loc, TravelMode::Road, &mut problems),
                rail: resolve(loc, TravelMode::Rail, &mut problems),
                sea: resolve(loc, TravelMode::Sea, &mut problems),
            })
            .collect();

        problems.extend(verify_locations(&locations));
        if !problems.is_empty() {
            return Err(MapError::Invalid(problems));
        }

        let find_kind = |kind: LocationKind| {
            locations
                .iter()
                .position(|loc| loc.kind == kind)
                .and_then(|idx| u16::try_from(idx).ok())
                .map(LocationId)
        };
        let (Some(hospital), Some(castle)) =
            (find_kind(LocationKind::Hospital), find_kind(LocationKind::Castle))
        else {
            return Err(MapError::Invalid(vec![MapProblem::HospitalCount(0)]));
        };

        let rail_routes = (0..locations.len())
            .map(|idx| compute_rail_routes(&locations, idx))
            .collect();

        Ok(Self {
            locations,
            index,
            rail_routes,
            hospital,
            castle,
        })
    }

    /// Re-run the structural validator, returning every problem found.
    #[must_use]
    pub fn verify(&self) -> Vec<MapProblem> {
        verify_locations(&self.locations)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Look up a location by exact name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<LocationId> {
        self.index.get(name).copied()
    }

    /// Location record for an id.
    ///
    /// Ids only come from this graph, so indexing is infallible for callers
    /// that do not fabricate them.
    #[must_use]
    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }

    #[must_use]
    pub fn name(&self, id: LocationId) -> &str {
        self.location(id).name()
    }

    #[must_use]
    pub fn is_sea(&self, id: LocationId) -> bool {
        self.location(id).is_sea()
    }

    #[must_use]
    pub const fn hospital(&self) -> LocationId {
        self.hospital
    }

    #[must_use]
    pub const fn castle(&self) -> LocationId {
        self.castle
    }

    pub fn ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        (0..self.locations.len()).filter_map(|idx| u16::try_from(idx).ok().map(LocationId))
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Location)> + '_ {
        self.ids().zip(&self.locations)
    }

    #[must_use]
    pub fn adjacent(&self, id: LocationId, mode: TravelMode) -> &[LocationId] {
        self.location(id).adjacent(mode)
    }

    /// All rail destinations reachable in one train move, with hop counts.
    #[must_use]
    pub fn rail_routes(&self, id: LocationId) -> &[(LocationId, u8)] {
        &self.rail_routes[id.index()]
    }

    /// Direct neighbours over the requested modes, sorted and deduplicated.
    ///
    /// Rail contributes whole rail routes rather than single rail edges.
    #[must_use]
    pub fn neighbours(&self, id: LocationId, modes: ModeSet) -> Vec<LocationId> {
        let mut out = BTreeSet::new();
        let loc = self.location(id);
        if modes.road {
            out.extend(loc.road.iter().copied());
        }
        if modes.sea {
            out.extend(loc.sea.iter().copied());
        }
        if modes.rail {
            out.extend(self.rail_routes(id).iter().map(|(dest, _)| *dest));
        }
        out.remove(&id);
        out.into_iter().collect()
    }

    /// Minimum number of moves between two locations using the given modes.
    ///
    /// Returns `None` when the destination cannot be reached.
    #[must_use]
    pub fn distance(
        &self,
        origin: LocationId,
        destination: LocationId,
        modes: ModeSet,
    ) -> Option<u32> {
        if origin == destination {
            return Some(0);
        }
        let mut visited = vec![false; self.locations.len()];
        visited[origin.index()] = true;
        let mut frontier = vec![origin];
        let mut layer = 0_u32;
        loop {
            layer += 1;
            let mut next = Vec::new();
            for loc in &frontier {
                for neighbour in self.neighbours(*loc, modes) {
                    if !visited[neighbour.index()] {
                        visited[neighbour.index()] = true;
                        next.push(neighbour);
                    }
                }
            }
            if visited[destination.index()] {
                return Some(layer);
            }
            if next.is_empty() {
                return None;
            }
            frontier = next;
        }
    }

    /// Every location within `range` moves of `origin`, excluding the origin.
    #[must_use]
    pub fn within(&self, origin: LocationId, range: u32, modes: ModeSet) -> Vec<LocationId> {
        let mut visited = vec![false; self.locations.len()];
        visited[origin.index()] = true;
        let mut frontier = vec![origin];
        let mut found = Vec::new();
        for _ in 0..range {
            let mut next = Vec::new();
            for loc in &frontier {
                for neighbour in self.neighbours(*loc, modes) {
                    if !visited[neighbour.index()] {
                        visited[neighbour.index()] = true;
                        next.push(neighbour);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            found.extend(next.iter().copied());
            frontier = next;
        }
        found.sort_unstable();
        found
    }

    /// Whether a single train move of at most `rail_hops` edges connects the two.
    #[must_use]
    pub fn connected_by_fast_mode(
        &self,
        origin: LocationId,
        destination: LocationId,
        rail_hops: u8,
    ) -> bool {
        self.rail_routes(origin)
            .iter()
            .any(|(dest, hops)| *dest == destination && *hops <= rail_hops)
    }
}

impl LocationSpec {
    fn names_ref(&self, mode: TravelMode) -> &[String] {
        match mode {
            TravelMode::Road => &self.road,
            TravelMode::Rail => &self.rail,
            TravelMode::Sea => &self.sea,
        }
    }
}

fn compute_rail_routes(locations: &[Location], origin: usize) -> Vec<(LocationId, u8)> {
    let mut best: HashMap<LocationId, u8> = HashMap::new();
    let Ok(raw) = u16::try_from(origin) else {
        return Vec::new();
    };
    let start = LocationId(raw);
    let mut path = vec![start];
    walk_rail(locations, &mut path, &mut best);
    best.remove(&start);
    let mut routes: Vec<(LocationId, u8)> = best.into_iter().collect();
    routes.sort_unstable();
    routes
}

fn walk_rail(locations: &[Location], path: &mut Vec<LocationId>, best: &mut HashMap<LocationId, u8>) {
    let hops = path.len() - 1;
    if hops == RAIL_ROUTE_MAX_HOPS {
        return;
    }
    let Some(&tail) = path.last() else {
        return;
    };
    for &next in &locations[tail.index()].rail {
        if path.contains(&next) {
            continue;
        }
        path.push(next);
        let route_hops = path.len() - 1;
        // Night trains do not run a full three-leg route through the east.
        let eastern_waypoint = route_hops == RAIL_ROUTE_MAX_HOPS
            && path[1..route_hops]
                .iter()
                .any(|waypoint| locations[waypoint.index()].domain == Domain::East);
        if !eastern_waypoint {
            let hops_u8 = u8::try_from(route_hops).unwrap_or(u8::MAX);
            best.entry(next)
                .and_modify(|existing| *existing = (*existing).min(hops_u8))
                .or_insert(hops_u8);
        }
        walk_rail(locations, path, best);
        path.pop();
    }
}

fn verify_locations(locations: &[Location]) -> Vec<MapProblem> {
    let mut problems = Vec::new();
    if locations.is_empty() {
        problems.push(MapProblem::Empty);
        return problems;
    }

    for (idx, loc) in locations.iter().enumerate() {
        let sea_kind = loc.kind == LocationKind::Sea;
        if sea_kind != (loc.domain == Domain::Sea) {
            problems.push(MapProblem::SeaDomainMismatch(loc.name.clone()));
        }
        for mode in [TravelMode::Road, TravelMode::Rail, TravelMode::Sea] {
            for &other in loc.adjacent(mode) {
                let neighbour = &locations[other.index()];
                if other.index() == idx {
                    problems.push(MapProblem::SelfLoop {
                        location: loc.name.clone(),
                        mode,
                    });
                    continue;
                }
                if !neighbour.adjacent(mode).iter().any(|back| back.index() == idx) {
                    problems.push(MapProblem::NotReciprocal {
                        from: loc.name.clone(),
                        to: neighbour.name.clone(),
                        mode,
                    });
                }
                // Report each undirected edge once.
                if other.index() < idx {
                    continue;
                }
                match mode {
                    TravelMode::Sea if !loc.is_sea() && !neighbour.is_sea() => {
                        problems.push(MapProblem::SeaEdgeOnLand {
                            a: loc.name.clone(),
                            b: neighbour.name.clone(),
                        });
                    }
                    TravelMode::Road | TravelMode::Rail if loc.is_sea() || neighbour.is_sea() => {
                        problems.push(MapProblem::LandEdgeAtSea {
                            mode,
                            a: loc.name.clone(),
                            b: neighbour.name.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    let hospitals = locations
        .iter()
        .filter(|loc| loc.kind == LocationKind::Hospital)
        .count();
    if hospitals != 1 {
        problems.push(MapProblem::HospitalCount(hospitals));
    }
    let castles = locations
        .iter()
        .filter(|loc| loc.kind == LocationKind::Castle)
        .count();
    if castles != 1 {
        problems.push(MapProblem::CastleCount(castles));
    }

    let mut seen = vec![false; locations.len()];
    seen[0] = true;
    let mut stack = vec![0_usize];
    while let Some(idx) = stack.pop() {
        let loc = &locations[idx];
        for next in loc.road.iter().chain(&loc.rail).chain(&loc.sea) {
            if !seen[next.index()] {
                seen[next.index()] = true;
                stack.push(next.index());
            }
        }
    }
    let unreachable: Vec<String> = locations
        .iter()
        .zip(&seen)
        .filter(|(_, reached)| !**reached)
        .map(|(loc, _)| loc.name.clone())
        .collect();
    if !unreachable.is_empty() {
        problems.push(MapProblem::Disconnected { unreachable });
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_spec() -> MapSpec {
        let mut spec = MapSpec {
            locations: vec![
                LocationSpec::new("Westford", LocationKind::LargeCity, Domain::West),
                LocationSpec::new("Midtown", LocationKind::SmallCity, Domain::West),
                LocationSpec::new("Eastgate", LocationKind::SmallCity, Domain::East),
                LocationSpec::new("Keep", LocationKind::Castle, Domain::East),
                LocationSpec::new("Infirmary", LocationKind::Hospital, Domain::East),
                LocationSpec::new("Grey Sea", LocationKind::Sea, Domain::Sea),
            ],
            ..MapSpec::default()
        };
        spec.connect(TravelMode::Road, "Westford", "Midtown");
        spec.connect(TravelMode::Road, "Midtown", "Eastgate");
        spec.connect(TravelMode::Road, "Eastgate", "Keep");
        spec.connect(TravelMode::Road, "Eastgate", "Infirmary");
        spec.connect(TravelMode::Rail, "Westford", "Midtown");
        spec.connect(TravelMode::Rail, "Midtown", "Eastgate");
        spec.connect(TravelMode::Rail, "Eastgate", "Infirmary");
        spec.connect(TravelMode::Sea, "Westford", "Grey Sea");
        spec
    }

    #[test]
    fn standard_map_verifies_cleanly() {
        let map = MapGraph::standard().unwrap();
        assert_eq!(map.len(), 71);
        assert!(map.verify().is_empty());
        assert_eq!(map.name(map.hospital()), "St. Joseph and St. Mary");
        assert_eq!(map.name(map.castle()), "Castle Dracula");
    }

    #[test]
    fn distance_counts_layers_per_mode() {
        let map = MapGraph::from_spec(tiny_spec()).unwrap();
        let west = map.id("Westford").unwrap();
        let keep = map.id("Keep").unwrap();
        let sea = map.id("Grey Sea").unwrap();
        assert_eq!(map.distance(west, keep, ModeSet::ROAD), Some(3));
        assert_eq!(map.distance(west, sea, ModeSet::ROAD), None);
        assert_eq!(map.distance(west, sea, ModeSet::ALL), Some(1));
        assert_eq!(map.distance(west, west, ModeSet::ROAD), Some(0));
    }

    #[test]
    fn three_hop_rail_routes_skip_eastern_waypoints() {
        let map = MapGraph::from_spec(tiny_spec()).unwrap();
        let west = map.id("Westford").unwrap();
        let east = map.id("Eastgate").unwrap();
        let infirmary = map.id("Infirmary").unwrap();
        // Westford -> Midtown -> Eastgate is two hops and allowed.
        assert!(map.connected_by_fast_mode(west, east, 2));
        assert!(!map.connected_by_fast_mode(west, east, 1));
        // Westford -> Midtown -> Eastgate -> Infirmary passes through the east.
        assert!(!map.connected_by_fast_mode(west, infirmary, 3));
        assert_eq!(map.distance(west, infirmary, ModeSet::RAIL), Some(2));
    }

    #[test]
    fn one_sided_neighbour_lists_are_rejected() {
        let mut spec = tiny_spec();
        spec.locations[0].road.push("Keep".into());
        let err = MapGraph::from_spec(spec).unwrap_err();
        let MapError::Invalid(problems) = err else {
            panic!("expected verification failure");
        };
        assert!(problems.iter().any(|p| matches!(
            p,
            MapProblem::NotReciprocal { from, to, mode: TravelMode::Road }
                if from == "Westford" && to == "Keep"
        )));
    }

    #[test]
    fn structural_problems_are_all_reported() {
        let mut spec = tiny_spec();
        spec.locations.push(LocationSpec::new(
            "Island",
            LocationKind::Hospital,
            Domain::West,
        ));
        spec.connect(TravelMode::Sea, "Westford", "Midtown");
        spec.connect(TravelMode::Road, "Midtown", "Grey Sea");
        let Err(MapError::Invalid(problems)) = MapGraph::from_spec(spec) else {
            panic!("expected verification failure");
        };
        assert!(problems.contains(&MapProblem::HospitalCount(2)));
        assert!(problems.iter().any(|p| matches!(p, MapProblem::SeaEdgeOnLand { .. })));
        assert!(problems.iter().any(|p| matches!(p, MapProblem::LandEdgeAtSea { .. })));
        assert!(problems.iter().any(|p| matches!(
            p,
            MapProblem::Disconnected { unreachable } if unreachable == &vec!["Island".to_string()]
        )));
    }

    #[test]
    fn unknown_neighbour_names_are_reported() {
        let mut spec = tiny_spec();
        spec.locations[1].rail.push("Atlantis".into());
        let Err(MapError::Invalid(problems)) = MapGraph::from_spec(spec) else {
            panic!("expected verification failure");
        };
        assert!(problems.iter().any(|p| matches!(
            p,
            MapProblem::UnknownNeighbour { neighbour, .. } if neighbour == "Atlantis"
        )));
    }

    #[test]
    fn within_excludes_origin_and_respects_range() {
        let map = MapGraph::from_spec(tiny_spec()).unwrap();
        let west = map.id("Westford").unwrap();
        let reach = map.within(west, 2, ModeSet::ROAD);
        let names: Vec<&str> = reach.iter().map(|id| map.name(*id)).collect();
        assert_eq!(names, vec!["Midtown", "Eastgate"]);
    }
}
