use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// On-the-wire shape of a city: `[name, [x, y]]`.
type CityJson = (String, (u32, u32));

/// A city on the map, identified by its name.
///
/// The position is only meaningful for rendering: cities are compared, hashed and ordered by
/// name alone, which is the order players rely on when sorting connections and destinations.
///
/// # JSON
/// Cities are serialized as `[name, [x, y]]`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(from = "CityJson", into = "CityJson")]
pub struct City {
    name: String,
    x: u32,
    y: u32,
}

impl City {
    pub fn new(name: impl Into<String>, x: u32, y: u32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

impl From<CityJson> for City {
    fn from((name, (x, y)): CityJson) -> Self {
        Self::new(name, x, y)
    }
}

impl From<City> for CityJson {
    fn from(city: City) -> Self {
        (city.name, (city.x, city.y))
    }
}

impl PartialEq for City {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for City {}

impl Hash for City {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for City {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for City {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
