use crate::card::{Deck, DEFAULT_DECK_SIZE};
use crate::error::SetupError;
use crate::game_phase::GamePhase;
use crate::game_state::GameState;
use crate::map::{Destination, Map};
use crate::moves::Move;
use crate::participant::{call_through, Participant};
use crate::player::INITIAL_RAILS;
use crate::score::{rank, score_game};

use rand::seq::IteratorRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

pub const PLAYERS_PER_GAME: RangeInclusive<usize> = 2..=8;

// Cards drawn by a `Move::DrawCards`.
const CARDS_PER_DRAW: usize = 2;

// Destinations each player keeps, out of the ones offered.
const DESTINATIONS_PER_PLAYER: usize = 2;
const DESTINATION_OPTIONS: usize = 5;

/// Number of feasible destinations a map needs for a game of `num_players`.
///
/// The last player to pick must still be offered a full set of options.
pub fn required_destinations(num_players: usize) -> usize {
    DESTINATION_OPTIONS + DESTINATIONS_PER_PLAYER * num_players.saturating_sub(1)
}

/// The final score of one seat.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeatScore {
    pub seat: usize,
    pub name: String,
    pub score: i32,
}

/// The outcome of a game.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GameResult {
    /// From first to last place. Seats tied for a place share it, ordered by name.
    pub rankings: Vec<Vec<SeatScore>>,
    /// Seats excluded for misbehaving, ordered by name.
    pub excluded: Vec<usize>,
}

/// Drives one game from setup to scoring, and keeps misbehaving players in check.
///
/// This overall acts as a finite-state machine over [`GamePhase`]s.
pub struct Referee<'a, R> {
    phase: GamePhase,
    /// One per seat, in turn order.
    players: Vec<&'a mut dyn Participant>,
    state: GameState,
    feasible_destinations: BTreeSet<Destination>,
    excluded: BTreeSet<usize>,
    /// Seats that played a turn while the final round was on.
    took_final_turn: BTreeSet<usize>,
    rng: R,
}

impl<'a, R: Rng> Referee<'a, R> {
    /// Prepares a game on `map`, with players seated in the given order.
    /// Without a `deck`, one of 250 random cards is used.
    ///
    /// Returns an `Err` if either:
    /// * There are fewer than 2 or more than 8 players.
    /// * The map does not have enough feasible destinations for that many players.
    pub fn new(
        map: Map,
        players: Vec<&'a mut dyn Participant>,
        deck: Option<Deck>,
        mut rng: R,
    ) -> Result<Self, SetupError> {
        if !PLAYERS_PER_GAME.contains(&players.len()) {
            return Err(SetupError::PlayerCount {
                count: players.len(),
            });
        }

        let feasible_destinations = map.feasible_destinations(&map.all_connection_ids());
        let required = required_destinations(players.len());
        if feasible_destinations.len() < required {
            return Err(SetupError::NotEnoughDestinations {
                available: feasible_destinations.len(),
                required,
            });
        }

        let deck = deck.unwrap_or_else(|| Deck::random(DEFAULT_DECK_SIZE, &mut rng));
        let state = GameState::new(map, deck, players.len());

        Ok(Self {
            phase: GamePhase::Setup,
            players,
            state,
            feasible_destinations,
            excluded: BTreeSet::new(),
            took_final_turn: BTreeSet::new(),
            rng,
        })
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    fn enter(&mut self, phase: GamePhase) {
        log::debug!("game moves from {:?} to {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Plays the whole game, and returns its outcome.
    ///
    /// Once done, calling this again returns an empty result.
    pub fn run(&mut self) -> GameResult {
        if self.phase != GamePhase::Setup {
            return GameResult::default();
        }

        log::info!(
            "starting a game with {}",
            self.players
                .iter()
                .map(|player| player.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.setup();
        self.enter(GamePhase::Picking);
        self.pick_destinations();
        self.enter(GamePhase::Playing);
        self.play();
        self.enter(GamePhase::Scoring);
        let result = self.score();
        self.enter(GamePhase::Done);

        result
    }

    /// Excludes `seat` for misbehaving, which happens at most once per seat.
    fn exclude(&mut self, seat: usize, reason: &str) {
        if !self.excluded.insert(seat) {
            return;
        }

        log::warn!(
            "excluding {} from the game: {}",
            self.players[seat].name(),
            reason
        );
        self.state.release_claims(seat);

        // Best effort, the player is out anyways.
        let _ = call_through(&mut *self.players[seat], |p| p.excluded_from_game(reason));
    }

    fn setup(&mut self) {
        for seat in 0..self.players.len() {
            let map = self.state.map().clone();
            let hand = match self.state.player(seat) {
                Some(player) => player.hand().clone(),
                None => continue,
            };

            if let Err(reason) =
                call_through(&mut *self.players[seat], |p| p.setup(&map, INITIAL_RAILS, &hand))
            {
                self.exclude(seat, &format!("failed to set up: {}", reason));
            }
        }
    }

    fn pick_destinations(&mut self) {
        let mut remaining = self.feasible_destinations.clone();

        for seat in 0..self.players.len() {
            if self.excluded.contains(&seat) {
                continue;
            }

            let num_options = DESTINATION_OPTIONS.min(remaining.len());
            let offered: BTreeSet<_> = remaining
                .iter()
                .cloned()
                .choose_multiple(&mut self.rng, num_options)
                .into_iter()
                .collect();

            let returned = match call_through(&mut *self.players[seat], |p| p.pick(&offered)) {
                Ok(returned) => returned,
                Err(reason) => {
                    self.exclude(seat, &format!("failed to pick destinations: {}", reason));
                    continue;
                }
            };

            let kept: BTreeSet<_> = offered.difference(&returned).cloned().collect();
            if kept.len() != DESTINATIONS_PER_PLAYER || !returned.is_subset(&offered) {
                self.exclude(
                    seat,
                    &format!(
                        "kept {} destinations out of {} offered, instead of {}",
                        kept.len(),
                        offered.len(),
                        DESTINATIONS_PER_PLAYER
                    ),
                );
                continue;
            }

            for destination in &kept {
                remaining.remove(destination);
            }
            self.state.grant_destinations(seat, kept);
        }
    }

    fn play(&mut self) {
        while !self.game_over() {
            let seat = self.state.active_seat();

            if !self.excluded.contains(&seat) {
                self.take_turn(seat);

                if self.state.entering_final_round() {
                    self.took_final_turn.insert(seat);
                }

                // The last move stands, but nobody plays after it.
                if self.game_over() {
                    break;
                }
            }

            self.state.advance_turn();
        }
    }

    fn take_turn(&mut self, seat: usize) {
        let view = match self.state.view_for(seat) {
            Some(view) => view,
            None => return,
        };

        match call_through(&mut *self.players[seat], |p| p.play(&view)) {
            Ok(Move::DrawCards) => {
                let cards = self.state.draw_up_to(CARDS_PER_DRAW);
                log::debug!("{} draws {:?}", self.players[seat].name(), cards);
                self.state.grant_cards(&cards);

                // Purely informational.
                let _ = call_through(&mut *self.players[seat], |p| p.more(&cards));
            }
            Ok(Move::Acquire(connection)) => {
                if self.state.legal_to_claim(&connection, seat) {
                    log::debug!("{} acquires {:?}", self.players[seat].name(), connection);
                    self.state.claim(&connection);
                } else {
                    let (from, to) = connection.cities();
                    self.exclude(
                        seat,
                        &format!(
                            "cannot acquire the {} connection between {} and {}",
                            connection.color(),
                            from,
                            to
                        ),
                    );
                }
            }
            Ok(Move::NoMove) => self.exclude(seat, "did not make a move"),
            Err(reason) => self.exclude(seat, &format!("failed to play: {}", reason)),
        }
    }

    /// Seats still in the game.
    fn remaining(&self) -> BTreeSet<usize> {
        (0..self.players.len())
            .filter(|seat| !self.excluded.contains(seat))
            .collect()
    }

    /// The game is over once it stalls, once every remaining seat played its final turn,
    /// or once nobody is left.
    ///
    /// Excluded seats are never waited for, even if they got excluded during the final round.
    fn game_over(&self) -> bool {
        let remaining = self.remaining();

        self.state.stalled()
            || remaining.is_empty()
            || (!self.took_final_turn.is_empty() && remaining.is_subset(&self.took_final_turn))
    }

    fn score(&mut self) -> GameResult {
        let scores = {
            let players: Vec<_> = (0..self.players.len())
                .filter_map(|seat| self.state.player(seat))
                .collect();
            score_game(self.state.map(), &players, &self.excluded)
        };

        let rankings: Vec<Vec<SeatScore>> = {
            let named: Vec<_> = self
                .players
                .iter()
                .zip(&scores)
                .map(|(player, score)| (player.name(), *score))
                .collect();

            rank(&named)
                .into_iter()
                .map(|tied| {
                    tied.into_iter()
                        .map(|seat| SeatScore {
                            seat,
                            name: named[seat].0.to_owned(),
                            score: named[seat].1,
                        })
                        .collect()
                })
                .collect()
        };

        let best = self
            .remaining()
            .into_iter()
            .filter_map(|seat| scores.get(seat).copied())
            .max();
        for seat in self.remaining() {
            let won = scores.get(seat).copied() == best;
            // A failure to acknowledge the outcome changes nothing.
            let _ = call_through(&mut *self.players[seat], |p| p.win(won));
        }

        let mut excluded: Vec<_> = self.excluded.iter().copied().collect();
        excluded.sort_by(|a, b| self.players[*a].name().cmp(self.players[*b].name()));

        log::info!("game over, rankings: {:?}", rankings);
        GameResult { rankings, excluded }
    }
}
