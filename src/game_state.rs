use crate::card::{Deck, Hand};
use crate::color::CardColor;
use crate::map::{Connection, ConnectionSet, Destination, Map};
use crate::player::{GameInfo, OpponentInfo, PlayerState, PlayerView};

// Cards dealt to every player before the game starts.
pub const INITIAL_HAND_SIZE: usize = 4;

// Once a player holds fewer rails than this, every player has one turn left.
const FINAL_ROUND_RAILS: u32 = 3;

/// What the game looked like the last time something changed.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Snapshot {
    deck_size: usize,
    unclaimed: usize,
    turn: usize,
}

/// The authoritative truth of one game: every seat's resources, the deck, and whose turn it is.
///
/// Owned by a single [`crate::referee::Referee`], which is the only one mutating it.
pub struct GameState {
    map: Map,
    players: Vec<PlayerState>,
    deck: Deck,
    /// Always a valid index into `players`.
    turn: usize,
    /// Derived from the claims of every seat, refreshed at every turn boundary.
    unclaimed: ConnectionSet,
    snapshot: Snapshot,
    stalled: bool,
}

impl GameState {
    /// Deals an initial hand to each of the `num_seats` seats, in order, from `deck`.
    ///
    /// Seats get fewer cards if the deck runs out.
    pub fn new(map: Map, mut deck: Deck, num_seats: usize) -> Self {
        let players: Vec<_> = (0..num_seats.max(1))
            .map(|_| PlayerState::new(Hand::from_cards(&deck.draw_up_to(INITIAL_HAND_SIZE))))
            .collect();
        let unclaimed = map.all_connection_ids();
        let snapshot = Snapshot {
            deck_size: deck.len(),
            unclaimed: unclaimed.len(),
            turn: 0,
        };

        Self {
            map,
            players,
            deck,
            turn: 0,
            unclaimed,
            snapshot,
            stalled: false,
        }
    }

    #[inline]
    pub fn map(&self) -> &Map {
        &self.map
    }

    #[inline]
    pub fn num_seats(&self) -> usize {
        self.players.len()
    }

    #[inline]
    pub fn player(&self, seat: usize) -> Option<&PlayerState> {
        self.players.get(seat)
    }

    #[inline]
    pub fn deck_size(&self) -> usize {
        self.deck.len()
    }

    #[inline]
    pub fn unclaimed(&self) -> &ConnectionSet {
        &self.unclaimed
    }

    /// The seat whose turn it is.
    #[inline]
    pub fn active_seat(&self) -> usize {
        self.turn
    }

    /// Moves on to the next seat, then refreshes the unclaimed connections and looks for a stall.
    ///
    /// Must be called exactly once per turn, after the turn's effects are applied.
    pub fn advance_turn(&mut self) {
        self.turn = (self.turn + 1) % self.players.len();
        self.recompute_unclaimed();

        let deck_size = self.deck.len();
        let unclaimed = self.unclaimed.len();

        if deck_size == self.snapshot.deck_size && unclaimed == self.snapshot.unclaimed {
            // A full rotation went by without anything happening.
            if self.turn == self.snapshot.turn {
                self.stalled = true;
            }
        } else {
            self.snapshot = Snapshot {
                deck_size,
                unclaimed,
                turn: self.turn,
            };
            self.stalled = false;
        }
    }

    fn recompute_unclaimed(&mut self) {
        let mut unclaimed = self.map.all_connection_ids();
        for player in &self.players {
            for id in player.claimed() {
                unclaimed.remove(id);
            }
        }

        self.unclaimed = unclaimed;
    }

    /// Whether `seat` may claim `connection` right now.
    ///
    /// This is the case iff the connection is on the map and unclaimed, and the seat has at
    /// least as many rails and cards of the connection's color as the connection's length.
    pub fn legal_to_claim(&self, connection: &Connection, seat: usize) -> bool {
        let unclaimed = self
            .map
            .connection_id(connection)
            .map_or(false, |id| self.unclaimed.contains(&id));

        unclaimed
            && self
                .players
                .get(seat)
                .map_or(false, |player| player.can_afford(connection))
    }

    /// Claims `connection` on behalf of the active seat.
    ///
    /// Performs no validation: [`GameState::legal_to_claim`] must be checked beforehand.
    pub fn claim(&mut self, connection: &Connection) {
        if let Some(id) = self.map.connection_id(connection) {
            self.players[self.turn].claim(id, connection);
        }
    }

    /// Removes up to `n` cards from the deck. Returns fewer if the deck runs out.
    pub fn draw_up_to(&mut self, n: usize) -> Vec<CardColor> {
        self.deck.draw_up_to(n)
    }

    /// Adds cards to the active seat's hand.
    pub fn grant_cards(&mut self, cards: &[CardColor]) {
        self.players[self.turn].hand_mut().add(cards);
    }

    pub fn grant_destinations(
        &mut self,
        seat: usize,
        destinations: impl IntoIterator<Item = Destination>,
    ) {
        if let Some(player) = self.players.get_mut(seat) {
            player.add_destinations(destinations);
        }
    }

    /// Takes away every connection claimed by `seat`.
    /// They are back in the unclaimed pool from the next turn boundary onwards.
    pub fn release_claims(&mut self, seat: usize) {
        if let Some(player) = self.players.get_mut(seat) {
            player.release_claims();
        }
    }

    /// Whether any seat is almost out of rails.
    pub fn entering_final_round(&self) -> bool {
        self.players
            .iter()
            .any(|player| player.rails() < FINAL_ROUND_RAILS)
    }

    /// Whether a full rotation went by without any change to the deck or the unclaimed connections.
    #[inline]
    pub fn stalled(&self) -> bool {
        self.stalled
    }

    /// A snapshot of everything `seat` is allowed to know.
    pub fn view_for(&self, seat: usize) -> Option<PlayerView> {
        let player = self.players.get(seat)?;
        let connections_of = |claimed: &ConnectionSet| -> Vec<Connection> {
            claimed
                .iter()
                .filter_map(|id| self.map.connection(*id))
                .cloned()
                .collect()
        };

        let num_seats = self.players.len();
        let opponent_info = (1..num_seats)
            .map(|offset| &self.players[(seat + offset) % num_seats])
            .map(|opponent| OpponentInfo {
                number_of_cards: opponent.hand().total(),
                connections: connections_of(opponent.claimed()),
            })
            .collect();

        Some(PlayerView {
            connections: connections_of(player.claimed()),
            cards: player.hand().clone(),
            rails: player.rails(),
            destinations: player.destinations().iter().cloned().collect(),
            game_info: GameInfo {
                cards_in_deck: self.deck.len(),
                unclaimed_connections: connections_of(&self.unclaimed),
                last_turn: self.entering_final_round(),
            },
            opponent_info,
        })
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self, seat: usize) -> &mut PlayerState {
        &mut self.players[seat]
    }
}
