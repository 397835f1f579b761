use crate::city::City;
use crate::color::CardColor;
use crate::error::MapError;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Valid lengths of a connection, which is also the number of cards and rails needed to claim it.
pub const CONNECTION_LENGTHS: RangeInclusive<u8> = 3..=5;

/// Valid widths and heights of a map.
const MAP_DIMENSIONS: RangeInclusive<u32> = 10..=800;

/// Index of a connection in [`Map::connections`].
pub type ConnectionId = usize;

/// A set of connection indices, e.g. the connections claimed by one player.
pub type ConnectionSet = BTreeSet<ConnectionId>;

/// A colored link of a given length between two distinct cities.
///
/// The two cities are stored in name order, so two connections are equal regardless of the
/// order in which their cities were given. Connections are ordered by their cities, then by
/// length, then by color.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Connection {
    from: City,
    to: City,
    length: u8,
    color: CardColor,
}

impl Connection {
    /// Returns an `Err` if either:
    /// * Both cities are the same.
    /// * The length is not one of [`CONNECTION_LENGTHS`].
    pub fn new(a: City, b: City, color: CardColor, length: u8) -> Result<Self, MapError> {
        if a.name() == b.name() {
            return Err(MapError::SameCity(a.name().to_owned()));
        }

        if !CONNECTION_LENGTHS.contains(&length) {
            return Err(MapError::Length(
                a.name().to_owned(),
                b.name().to_owned(),
                length,
            ));
        }

        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self {
            from,
            to,
            length,
            color,
        })
    }

    #[inline]
    pub fn cities(&self) -> (&City, &City) {
        (&self.from, &self.to)
    }

    #[inline]
    pub fn color(&self) -> CardColor {
        self.color
    }

    #[inline]
    pub fn length(&self) -> u8 {
        self.length
    }
}

/// Two distinct cities a player is asked to connect by the end of the game.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Destination {
    from: City,
    to: City,
}

impl Destination {
    /// Returns an `Err` if both cities are the same.
    pub fn new(a: City, b: City) -> Result<Self, MapError> {
        if a.name() == b.name() {
            return Err(MapError::SameCity(a.name().to_owned()));
        }

        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self { from, to })
    }

    #[inline]
    pub fn cities(&self) -> (&City, &City) {
        (&self.from, &self.to)
    }
}

/// On-the-wire shape of a map.
///
/// Connections are nested as `{city: {city: {color: length}}}`.
#[derive(Deserialize, Serialize)]
struct MapJson {
    width: u32,
    height: u32,
    cities: Vec<City>,
    connections: BTreeMap<String, BTreeMap<String, BTreeMap<String, u8>>>,
}

/// The immutable game board: cities and the connections between them.
///
/// Connections live in a sorted array, and are referred to by their index ([`ConnectionId`])
/// everywhere else in the game.
///
/// # JSON
/// `{"width": w, "height": h, "cities": [[name, [x, y]], ...], "connections": {name: {name: {color: length}}}}`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "MapJson", into = "MapJson")]
pub struct Map {
    width: u32,
    height: u32,
    cities: Vec<City>,
    connections: Vec<Connection>,
}

impl Map {
    /// Creates a map from its cities and connections. Duplicated connections are collapsed.
    ///
    /// Returns an `Err` if either:
    /// * The width or the height is outside of [10, 800].
    /// * Two cities share the same name.
    /// * A connection refers to a city that is not part of the map.
    pub fn new(
        width: u32,
        height: u32,
        mut cities: Vec<City>,
        mut connections: Vec<Connection>,
    ) -> Result<Self, MapError> {
        if !MAP_DIMENSIONS.contains(&width) || !MAP_DIMENSIONS.contains(&height) {
            return Err(MapError::Dimensions { width, height });
        }

        cities.sort();
        if let Some(pair) = cities.windows(2).find(|pair| pair[0].name() == pair[1].name()) {
            return Err(MapError::DuplicateCity(pair[0].name().to_owned()));
        }

        for connection in &connections {
            let (from, to) = connection.cities();
            for city in [from, to] {
                if cities.binary_search(city).is_err() {
                    return Err(MapError::UnknownCity(city.name().to_owned()));
                }
            }
        }

        connections.sort();
        connections.dedup();

        Ok(Self {
            width,
            height,
            cities,
            connections,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All cities, sorted by name.
    #[inline]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// All connections, sorted. The position of a connection is its [`ConnectionId`].
    #[inline]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    #[inline]
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// The index of a connection, if it is part of this map.
    pub fn connection_id(&self, connection: &Connection) -> Option<ConnectionId> {
        self.connections.binary_search(connection).ok()
    }

    /// Every connection on the map.
    pub fn all_connection_ids(&self) -> ConnectionSet {
        (0..self.connections.len()).collect()
    }

    /// Maps every city touched by `subset` to its neighbors through `subset`.
    fn adjacency(&self, subset: &ConnectionSet) -> BTreeMap<&City, BTreeSet<&City>> {
        let mut adjacency: BTreeMap<&City, BTreeSet<&City>> = BTreeMap::new();

        for connection in subset.iter().filter_map(|id| self.connection(*id)) {
            let (from, to) = connection.cities();
            adjacency.entry(from).or_default().insert(to);
            adjacency.entry(to).or_default().insert(from);
        }

        adjacency
    }

    fn reachable_in<'a>(
        adjacency: &BTreeMap<&'a City, BTreeSet<&'a City>>,
        start: &'a City,
    ) -> BTreeSet<&'a City> {
        let mut cities_visited = BTreeSet::new();
        let mut cities_to_visit = VecDeque::from([start]);

        while let Some(city) = cities_to_visit.pop_front() {
            if let Some(neighbors) = adjacency.get(city) {
                for neighbor in neighbors {
                    if cities_visited.insert(*neighbor) {
                        cities_to_visit.push_back(*neighbor);
                    }
                }
            }
        }

        // A city is only reachable from itself through a cycle, which we do not care about.
        cities_visited.remove(start);
        cities_visited
    }

    /// All cities reachable from `start` using only the connections in `subset`.
    /// `start` itself is never part of the result.
    pub fn reachable_from(&self, start: &City, subset: &ConnectionSet) -> BTreeSet<City> {
        let adjacency = self.adjacency(subset);
        Self::reachable_in(&adjacency, start)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Whether the two cities of `destination` are linked through the connections in `subset`.
    pub fn connects(&self, destination: &Destination, subset: &ConnectionSet) -> bool {
        let (from, to) = destination.cities();
        let adjacency = self.adjacency(subset);
        Self::reachable_in(&adjacency, from).contains(to)
    }

    /// Every pair of cities linked by some path through the connections in `subset`.
    ///
    /// # Examples:
    /// ```
    /// use trains::city::City;
    /// use trains::color::CardColor;
    /// use trains::map::{Connection, ConnectionSet, Map};
    ///
    /// let (austin, boise, boston) = (
    ///     City::new("Austin", 10, 10),
    ///     City::new("Boise", 20, 20),
    ///     City::new("Boston", 30, 30),
    /// );
    /// let connections = vec![
    ///     Connection::new(austin.clone(), boise.clone(), CardColor::Red, 3).unwrap(),
    ///     Connection::new(boise.clone(), boston.clone(), CardColor::Blue, 4).unwrap(),
    /// ];
    /// let lonely = City::new("Denver", 40, 40);
    /// let map = Map::new(100, 100, vec![austin, boise, boston, lonely], connections).unwrap();
    ///
    /// assert_eq!(map.feasible_destinations(&map.all_connection_ids()).len(), 3);
    /// assert!(map.feasible_destinations(&ConnectionSet::new()).is_empty());
    /// ```
    pub fn feasible_destinations(&self, subset: &ConnectionSet) -> BTreeSet<Destination> {
        let adjacency = self.adjacency(subset);
        let mut destinations = BTreeSet::new();

        for city in adjacency.keys().copied() {
            for reachable in Self::reachable_in(&adjacency, city) {
                if city < reachable {
                    destinations.insert(Destination {
                        from: city.clone(),
                        to: reachable.clone(),
                    });
                }
            }
        }

        destinations
    }
}

impl TryFrom<MapJson> for Map {
    type Error = MapError;

    fn try_from(json: MapJson) -> Result<Self, Self::Error> {
        let find_city = |name: &str| {
            json.cities
                .iter()
                .find(|city| city.name() == name)
                .cloned()
                .ok_or_else(|| MapError::UnknownCity(name.to_owned()))
        };

        let mut connections = Vec::new();
        for (from, destinations) in &json.connections {
            for (to, segments) in destinations {
                for (color, length) in segments {
                    let color = CardColor::from_str(color)
                        .map_err(|_| MapError::UnknownColor(color.clone()))?;
                    connections.push(Connection::new(
                        find_city(from)?,
                        find_city(to)?,
                        color,
                        *length,
                    )?);
                }
            }
        }

        Map::new(json.width, json.height, json.cities, connections)
    }
}

impl From<Map> for MapJson {
    fn from(map: Map) -> Self {
        let mut connections: BTreeMap<String, BTreeMap<String, BTreeMap<String, u8>>> =
            BTreeMap::new();

        for connection in &map.connections {
            let (from, to) = connection.cities();
            connections
                .entry(from.name().to_owned())
                .or_default()
                .entry(to.name().to_owned())
                .or_default()
                .insert(connection.color().to_string(), connection.length());
        }

        Self {
            width: map.width,
            height: map.height,
            cities: map.cities,
            connections,
        }
    }
}
