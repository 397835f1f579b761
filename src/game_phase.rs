use serde::{Deserialize, Serialize};

/// Phases of a game, which act as states in the referee's finite-state machine.
///
/// # JSON
/// Phases are serialized in snake_case.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Hands are dealt, and every player receives the map.
    Setup,
    /// Every player picks its destinations out of a random offer.
    Picking,
    /// The turn-based game, until the game is over.
    Playing,
    /// Scores are computed, and players are told whether they won.
    Scoring,
    /// No actions can be taken at this point.
    Done,
}
