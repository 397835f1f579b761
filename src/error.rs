use std::path::PathBuf;

/// A map description that cannot be turned into a valid [`crate::map::Map`].
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("width and height must each be in [10, 800], got {width}x{height}")]
    Dimensions { width: u32, height: u32 },
    #[error("a connection must join two distinct cities, got {0} twice")]
    SameCity(String),
    #[error("a connection between {0} and {1} has length {2}, which is not one of 3, 4 or 5")]
    Length(String, String, u8),
    #[error("unknown city {0}")]
    UnknownCity(String),
    #[error("city {0} is listed more than once")]
    DuplicateCity(String),
    #[error("unknown color {0}")]
    UnknownColor(String),
    #[error("invalid map json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures that prevent a game or a tournament from starting at all.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("the map only has {available} feasible destinations, {required} are needed")]
    NotEnoughDestinations { available: usize, required: usize },
    #[error("cannot run with {count} players")]
    PlayerCount { count: usize },
    #[error("no suggested map has enough destinations for the participants")]
    NoValidMap,
}

/// Failures while loading a tournament configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid map {path}: {source}")]
    Map { path: PathBuf, source: MapError },
    #[error("unknown strategy {0}")]
    UnknownStrategy(String),
}
