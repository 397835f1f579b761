use crate::card::Deck;
use crate::color::CardColor;
use crate::error::{ConfigError, MapError};
use crate::map::Map;
use crate::strategy::{Strategy, StrategyPlayer};

use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the cards of every game are dealt.
///
/// # JSON
/// Either `{"size": n}` or `{"colors": ["red", "blue", ...]}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DeckConfig {
    /// A random deck of that many cards, drawn once and reused by every game.
    Size(usize),
    /// The exact deck every game starts with, top card last.
    Colors(Vec<CardColor>),
}

/// One participant, following one of the built-in strategies.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlayerConfig {
    pub name: String,
    pub strategy: String,
    /// Map suggested by this player, instead of the tournament's.
    #[serde(default)]
    pub map: Option<PathBuf>,
}

/// Everything needed to run a tournament from the command line.
///
/// Relative paths are resolved against the directory of the configuration file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TournamentConfig {
    pub map: PathBuf,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub deck: Option<DeckConfig>,
    pub players: Vec<PlayerConfig>,
    /// Play on `map` when no suggestion has enough destinations.
    #[serde(default)]
    pub use_default_map: bool,
}

impl FromStr for TournamentConfig {
    type Err = ConfigError;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TournamentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_str(&read(path)?)?;

        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }

        Ok(config)
    }

    fn resolve_paths(&mut self, dir: &Path) {
        self.map = dir.join(&self.map);
        for player in &mut self.players {
            if let Some(map) = &mut player.map {
                *map = dir.join(&*map);
            }
        }
    }

    /// The tournament's own map.
    pub fn default_map(&self) -> Result<Map, ConfigError> {
        load_map(&self.map)
    }

    /// Builds every configured player, in order.
    ///
    /// Returns an `Err` if either:
    /// * A strategy has no implementation.
    /// * A map cannot be read, or is invalid.
    pub fn players(&self) -> Result<Vec<StrategyPlayer>, ConfigError> {
        let mut maps: BTreeMap<&Path, Map> = BTreeMap::new();
        let mut players = Vec::with_capacity(self.players.len());

        for player in &self.players {
            let strategy = Strategy::from_str(&player.strategy)
                .map_err(|_| ConfigError::UnknownStrategy(player.strategy.clone()))?;

            let path = player.map.as_deref().unwrap_or(self.map.as_path());
            let map = match maps.get(path) {
                Some(map) => map.clone(),
                None => {
                    let map = load_map(path)?;
                    maps.insert(path, map.clone());
                    map
                }
            };

            players.push(StrategyPlayer::new(&player.name, strategy, Some(map)));
        }

        Ok(players)
    }

    /// The deck every game starts with, or `None` for a fresh random deck per game.
    pub fn deck<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Deck> {
        match &self.deck {
            None => None,
            Some(DeckConfig::Size(size)) => Some(Deck::random(*size, rng)),
            Some(DeckConfig::Colors(colors)) => Some(Deck::new(colors.clone())),
        }
    }
}

/// Reads a map in its JSON format.
pub fn load_map(path: &Path) -> Result<Map, ConfigError> {
    serde_json::from_str(&read(path)?).map_err(|e| ConfigError::Map {
        path: path.to_owned(),
        source: MapError::Json(e),
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })
}
