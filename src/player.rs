use crate::card::Hand;
use crate::map::{Connection, ConnectionId, ConnectionSet, Destination};

use serde::Serialize;
use std::collections::BTreeSet;

// Every player starts the game with 45 rails.
pub const INITIAL_RAILS: u32 = 45;

/// The authoritative state of one seat, owned by the game state.
/// Players never see this directly, they get a [`PlayerView`] instead.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    claimed: ConnectionSet,
    hand: Hand,
    rails: u32,
    destinations: BTreeSet<Destination>,
}

impl PlayerState {
    pub fn new(hand: Hand) -> Self {
        Self {
            claimed: ConnectionSet::new(),
            hand,
            rails: INITIAL_RAILS,
            destinations: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn claimed(&self) -> &ConnectionSet {
        &self.claimed
    }

    #[inline]
    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    #[inline]
    pub fn rails(&self) -> u32 {
        self.rails
    }

    #[inline]
    pub fn destinations(&self) -> &BTreeSet<Destination> {
        &self.destinations
    }

    /// Whether this seat holds enough rails and cards of the right color for `connection`.
    /// Ownership of the connection is not checked.
    pub fn can_afford(&self, connection: &Connection) -> bool {
        let length = u32::from(connection.length());
        self.rails >= length && self.hand.count(connection.color()) >= length
    }

    /// Pays for `connection` and records it as claimed. No validation happens here.
    pub(crate) fn claim(&mut self, id: ConnectionId, connection: &Connection) {
        let length = u32::from(connection.length());
        self.rails = self.rails.saturating_sub(length);
        self.hand.remove(connection.color(), length);
        self.claimed.insert(id);
    }

    pub(crate) fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hand
    }

    pub(crate) fn add_destinations(&mut self, destinations: impl IntoIterator<Item = Destination>) {
        self.destinations.extend(destinations);
    }

    /// Forgets every claimed connection, returning them to the shared pool.
    pub(crate) fn release_claims(&mut self) -> ConnectionSet {
        std::mem::take(&mut self.claimed)
    }
}

/// Everything a player may know about the game: its own state in full,
/// and public information about the rest.
///
/// This is a snapshot: mutating it has no effect on the game.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub connections: Vec<Connection>,
    pub cards: Hand,
    pub rails: u32,
    pub destinations: Vec<Destination>,
    pub game_info: GameInfo,
    pub opponent_info: Vec<OpponentInfo>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameInfo {
    pub cards_in_deck: usize,
    /// Sorted, as on the map.
    pub unclaimed_connections: Vec<Connection>,
    /// Whether the final round has started.
    pub last_turn: bool,
}

/// What a player knows about one opponent, in seat order starting after the player.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpponentInfo {
    pub number_of_cards: u32,
    pub connections: Vec<Connection>,
}

impl PlayerView {
    pub fn can_afford(&self, connection: &Connection) -> bool {
        let length = u32::from(connection.length());
        self.rails >= length && self.cards.count(connection.color()) >= length
    }

    /// Unclaimed connections this player can pay for right now, in map order.
    pub fn acquirable_connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.game_info
            .unclaimed_connections
            .iter()
            .filter(|connection| self.can_afford(connection))
    }
}
