use crate::map::Connection;

use serde::Serialize;

/// What a player chooses to do on its turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    /// Take up to two cards from the deck.
    DrawCards,
    /// Claim a connection, paying for it with rails and cards of its color.
    Acquire(Connection),
    /// Doing nothing is not a legal move, and gets a player excluded.
    NoMove,
}
