use crate::card::Deck;
use crate::error::SetupError;
use crate::map::Map;
use crate::participant::{call_through, Participant};
use crate::referee::{required_destinations, Referee, PLAYERS_PER_GAME};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MIN_PLAYERS: usize = *PLAYERS_PER_GAME.start();
const MAX_PLAYERS: usize = *PLAYERS_PER_GAME.end();

// The tournament stops once this many rounds in a row eliminated nobody.
const ROUNDS_WITHOUT_CHANGE: usize = 2;

/// Phases of a tournament, which act as states in the manager's finite-state machine.
///
/// # JSON
/// Phases are serialized in snake_case.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    /// Participants suggest maps, and one gets picked for every game.
    Setup,
    /// Successive knock-out rounds.
    Round,
    /// Winners were told they won.
    Done,
}

/// The outcome of a tournament, by participant name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TournamentResult {
    /// Sorted by name.
    pub winners: Vec<String>,
    /// Participants excluded for misbehaving, sorted by name.
    pub excluded: Vec<String>,
}

/// Splits participants, in order, into games of at most 8 players.
///
/// A single participant left over takes the last participant of the previous game along,
/// so every game has at least 2 players. Fewer than 2 participants cannot play at all.
pub fn assign_players_to_games(active: &[usize]) -> Vec<Vec<usize>> {
    if active.len() < MIN_PLAYERS {
        return Vec::new();
    }

    let mut games: Vec<Vec<usize>> = active.chunks(MAX_PLAYERS).map(<[usize]>::to_vec).collect();

    let leftover = games.last().map_or(0, Vec::len);
    if leftover == MIN_PLAYERS - 1 && games.len() > 1 {
        let last = games.len() - 1;
        if let Some(stolen) = games[last - 1].pop() {
            games[last].insert(0, stolen);
        }
    }

    games
}

/// Runs a knock-out tournament: participants are split into games, and only the winners of
/// each game move on to the next round.
///
/// This overall acts as a finite-state machine over [`TournamentPhase`]s.
pub struct Manager<'a, R> {
    phase: TournamentPhase,
    participants: Vec<&'a mut dyn Participant>,
    /// Indices into `participants`, in seat order.
    active: Vec<usize>,
    excluded: Vec<usize>,
    /// Number of active participants after each round.
    history: Vec<usize>,
    /// Cloned for every game. Without it, every game gets a random deck.
    deck: Option<Deck>,
    /// Played on when no suggested map is good enough.
    fallback_map: Option<Map>,
    rng: R,
}

impl<'a, R: Rng> Manager<'a, R> {
    /// Returns an `Err` if there are fewer than 2 participants.
    pub fn new(
        participants: Vec<&'a mut dyn Participant>,
        deck: Option<Deck>,
        rng: R,
    ) -> Result<Self, SetupError> {
        if participants.len() < MIN_PLAYERS {
            return Err(SetupError::PlayerCount {
                count: participants.len(),
            });
        }

        Ok(Self {
            phase: TournamentPhase::Setup,
            active: (0..participants.len()).collect(),
            participants,
            excluded: Vec::new(),
            history: Vec::new(),
            deck,
            fallback_map: None,
            rng,
        })
    }

    /// Plays on `map` whenever none of the suggested maps fits.
    pub fn with_fallback_map(mut self, map: Map) -> Self {
        self.fallback_map = Some(map);
        self
    }

    #[inline]
    pub fn phase(&self) -> TournamentPhase {
        self.phase
    }

    /// Runs the whole tournament.
    ///
    /// Returns an `Err` if either:
    /// * No map can host a game as large as the first round's.
    /// * A game cannot be set up.
    pub fn run(&mut self) -> Result<TournamentResult, SetupError> {
        if self.phase != TournamentPhase::Setup {
            return Ok(self.result());
        }

        let map = self.negotiate_map()?;
        log::info!(
            "starting a tournament with {} participants",
            self.active.len()
        );

        self.phase = TournamentPhase::Round;
        self.history.push(self.active.len());
        loop {
            let games = assign_players_to_games(&self.active);
            for game in &games {
                self.run_game(&map, game)?;
            }

            self.history.push(self.active.len());
            log::info!(
                "round {} is over, {} participants left",
                self.history.len() - 1,
                self.active.len()
            );

            if games.len() <= 1 || self.stalled() {
                break;
            }
        }

        self.phase = TournamentPhase::Done;
        for index in self.active.clone() {
            // The tournament is over anyways.
            if let Err(reason) = call_through(&mut *self.participants[index], |p| p.end(true)) {
                log::warn!(
                    "{} failed to hear about its win: {}",
                    self.participants[index].name(),
                    reason
                );
            }
        }

        Ok(self.result())
    }

    fn result(&self) -> TournamentResult {
        let names = |indices: &[usize]| {
            let mut names: Vec<_> = indices
                .iter()
                .map(|index| self.participants[*index].name().to_owned())
                .collect();
            names.sort();
            names
        };

        TournamentResult {
            winners: names(&self.active),
            excluded: names(&self.excluded),
        }
    }

    /// Whether the last rounds all ended with as many participants as they started with.
    fn stalled(&self) -> bool {
        self.history.len() > ROUNDS_WITHOUT_CHANGE
            && self
                .history
                .windows(2)
                .rev()
                .take(ROUNDS_WITHOUT_CHANGE)
                .all(|round| round[0] == round[1])
    }

    /// Removes a participant from the tournament for good.
    fn exclude(&mut self, index: usize, reason: &str) {
        if self.excluded.contains(&index) {
            return;
        }

        log::warn!(
            "excluding {} from the tournament: {}",
            self.participants[index].name(),
            reason
        );
        self.active.retain(|active| *active != index);
        self.excluded.push(index);

        let _ = call_through(&mut *self.participants[index], |p| {
            p.excluded_from_tournament(reason)
        });
    }

    /// Asks every participant for a map, and picks the first one with enough destinations for
    /// the largest game of the first round.
    fn negotiate_map(&mut self) -> Result<Map, SetupError> {
        let mut suggestions: Vec<Map> = Vec::new();

        for index in self.active.clone() {
            match call_through(&mut *self.participants[index], |p| p.start()) {
                Ok(Some(map)) => {
                    if !suggestions.contains(&map) {
                        suggestions.push(map);
                    }
                }
                Ok(None) => self.exclude(index, "did not suggest a map"),
                Err(reason) => self.exclude(index, &format!("failed to start: {}", reason)),
            }
        }

        let required = required_destinations(self.active.len().min(MAX_PLAYERS));
        let fits =
            |map: &Map| map.feasible_destinations(&map.all_connection_ids()).len() >= required;

        suggestions
            .into_iter()
            .find(|map| fits(map))
            .or_else(|| self.fallback_map.clone().filter(|map| fits(map)))
            .ok_or(SetupError::NoValidMap)
    }

    /// Plays one game between the participants at `game`, then knocks out everyone but the
    /// winners.
    fn run_game(&mut self, map: &Map, game: &[usize]) -> Result<(), SetupError> {
        let result = {
            let mut players: BTreeMap<usize, &mut dyn Participant> = self
                .participants
                .iter_mut()
                .enumerate()
                .filter(|(index, _)| game.contains(index))
                .map(|(index, participant)| {
                    let participant: &mut dyn Participant = &mut **participant;
                    (index, participant)
                })
                .collect();
            let seats = game
                .iter()
                .filter_map(|index| players.remove(index))
                .collect();

            let mut referee =
                Referee::new(map.clone(), seats, self.deck.clone(), &mut self.rng)?;
            referee.run()
        };

        for ranking in result.rankings.iter().skip(1) {
            for seat in ranking {
                let index = game[seat.seat];
                self.active.retain(|active| *active != index);
            }
        }

        for seat in result.excluded {
            self.exclude(game[seat], "excluded from a game");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;
    use crate::color::CardColor::*;
    use crate::map::tests::test_map;
    use crate::map::Connection;
    use crate::moves::Move;
    use crate::participant::tests::Scripted;
    use crate::participant::PlayerResponse;
    use crate::strategy::{Strategy, StrategyPlayer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn red_deck(size: usize) -> Option<Deck> {
        Some(Deck::new(vec![Red; size]))
    }

    fn suggesting(name: &str) -> Scripted {
        let mut participant = Scripted::drawing(name);
        participant.start = Some(test_map());
        participant
    }

    /// Only one feasible destination.
    fn small_map() -> Map {
        let boston = City::new("Boston", 10, 10);
        let new_york = City::new("New York", 20, 10);
        let connection = Connection::new(boston.clone(), new_york.clone(), Red, 3).unwrap();

        Map::new(100, 100, vec![boston, new_york], vec![connection]).unwrap()
    }

    fn sizes(games: &[Vec<usize>]) -> Vec<usize> {
        games.iter().map(Vec::len).collect()
    }

    // Tests for `assign_players_to_games`.

    #[test]
    fn assign_players_to_games_sizes() {
        let active = |n: usize| (0..n).collect::<Vec<_>>();

        assert_eq!(sizes(&assign_players_to_games(&active(8))), vec![8]);
        assert_eq!(sizes(&assign_players_to_games(&active(5))), vec![5]);
        assert_eq!(sizes(&assign_players_to_games(&active(10))), vec![8, 2]);
        assert_eq!(sizes(&assign_players_to_games(&active(9))), vec![7, 2]);
        assert_eq!(sizes(&assign_players_to_games(&active(16))), vec![8, 8]);
        assert_eq!(sizes(&assign_players_to_games(&active(17))), vec![8, 7, 2]);
        assert_eq!(sizes(&assign_players_to_games(&active(2))), vec![2]);
    }

    #[test]
    fn assign_players_to_games_too_few() {
        assert!(assign_players_to_games(&[]).is_empty());
        assert!(assign_players_to_games(&[4]).is_empty());
    }

    #[test]
    fn assign_players_to_games_keeps_order() {
        let active: Vec<_> = (10..19).collect();

        assert_eq!(
            assign_players_to_games(&active),
            vec![vec![10, 11, 12, 13, 14, 15, 16], vec![17, 18]]
        );
    }

    // Tests for `Manager::new`.

    #[test]
    fn manager_new_too_few_participants() {
        let mut alice = suggesting("alice");
        let result = Manager::new(vec![&mut alice], None, rng());

        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some(String::from("cannot run with 1 players"))
        );
    }

    // Tests for map negotiation.

    #[test]
    fn no_suggested_map() {
        let mut alice = Scripted::drawing("alice");
        let mut bob = Scripted::drawing("bob");

        let mut manager = Manager::new(vec![&mut alice, &mut bob], None, rng()).unwrap();
        assert_eq!(manager.run(), Err(SetupError::NoValidMap));
        drop(manager);

        assert_eq!(alice.called("excluded_from_tournament"), 1);
        assert_eq!(bob.called("excluded_from_tournament"), 1);
    }

    #[test]
    fn fallback_map_when_nothing_fits() {
        let mut alice = Scripted::drawing("alice");
        alice.start = Some(small_map());
        let mut bob = Scripted::drawing("bob");
        bob.start = Some(small_map());

        let result = Manager::new(vec![&mut alice, &mut bob], red_deck(40), rng())
            .unwrap()
            .with_fallback_map(test_map())
            .run()
            .unwrap();

        assert_eq!(result.winners, vec!["alice", "bob"]);
        assert!(result.excluded.is_empty());
    }

    #[test]
    fn small_maps_are_skipped() {
        let mut alice = Scripted::drawing("alice");
        alice.start = Some(small_map());
        let mut bob = suggesting("bob");

        let mut manager = Manager::new(vec![&mut alice, &mut bob], red_deck(40), rng()).unwrap();
        let result = manager.run().unwrap();

        assert_eq!(manager.phase(), TournamentPhase::Done);
        assert_eq!(result.winners, vec!["alice", "bob"]);
    }

    // Tests for `Manager::run`.

    #[test]
    fn drawing_participants_both_win() {
        let mut alice = suggesting("alice");
        let mut bob = suggesting("bob");

        let result = Manager::new(vec![&mut bob, &mut alice], red_deck(20), rng())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(result.winners, vec!["alice", "bob"]);
        assert!(result.excluded.is_empty());
        assert_eq!(alice.called("end true"), 1);
        assert_eq!(bob.called("end true"), 1);
    }

    #[test]
    fn cheater_is_excluded_from_tournament() {
        let mut cheater = StrategyPlayer::new("mallory", Strategy::Cheat, Some(test_map()));
        let mut alice = suggesting("alice");

        let result = Manager::new(vec![&mut cheater, &mut alice], red_deck(20), rng())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(result.winners, vec!["alice"]);
        assert_eq!(result.excluded, vec!["mallory"]);
    }

    #[test]
    fn missing_suggestion_is_excluded() {
        let mut broken = StrategyPlayer::new("broken", Strategy::BuyNow, None);
        let mut alice = suggesting("alice");
        let mut bob = suggesting("bob");

        let result = Manager::new(vec![&mut alice, &mut broken, &mut bob], red_deck(20), rng())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(result.winners, vec!["alice", "bob"]);
        assert_eq!(result.excluded, vec!["broken"]);
    }

    #[test]
    fn ties_stop_after_two_unchanged_rounds() {
        let mut participants: Vec<_> = (0..10).map(|i| suggesting(&format!("p{}", i))).collect();
        let players = participants
            .iter_mut()
            .map(|p| p as &mut dyn Participant)
            .collect();

        let mut manager = Manager::new(players, red_deck(60), rng()).unwrap();
        let result = manager.run().unwrap();
        assert_eq!(manager.history, vec![10, 10, 10]);
        drop(manager);

        // Games of 8 and 2 where everybody ties, twice.
        assert_eq!(result.winners.len(), 10);
        for participant in &participants {
            assert_eq!(participant.called("win true"), 2);
            assert_eq!(participant.called("end true"), 1);
        }
    }

    #[test]
    fn winners_move_on_to_next_round() {
        let buying = |name: &str| {
            let mut participant = Scripted::playing(name, |view| -> PlayerResponse<Move> {
                Ok(view
                    .acquirable_connections()
                    .next()
                    .cloned()
                    .map_or(Move::DrawCards, Move::Acquire))
            });
            participant.start = Some(test_map());
            participant
        };

        let mut ann = buying("ann");
        let mut zed = buying("zed");
        let mut drawing: Vec<_> = (0..7).map(|i| suggesting(&format!("d{}", i))).collect();

        let mut players: Vec<&mut dyn Participant> = vec![&mut ann];
        let (first, second) = drawing.split_at_mut(6);
        players.extend(first.iter_mut().map(|p| p as &mut dyn Participant));
        players.push(&mut zed);
        players.push(&mut second[0]);

        // Games are [ann, d0..d5] and [zed, d6], then [ann, zed].
        let mut manager = Manager::new(players, red_deck(80), rng()).unwrap();
        let result = manager.run().unwrap();
        assert_eq!(manager.history.len(), 3);
        drop(manager);

        assert!(!result.winners.is_empty());
        assert!(result
            .winners
            .iter()
            .all(|winner| winner == "ann" || winner == "zed"));
        assert!(result.excluded.is_empty());
        assert_eq!(ann.called("win true") + ann.called("win false"), 2);
        for participant in &drawing {
            assert_eq!(participant.called("win false"), 1);
            assert_eq!(participant.called("end true"), 0);
        }
    }

    #[test]
    fn stalled_needs_two_unchanged_rounds() {
        let (mut a, mut b) = (suggesting("a"), suggesting("b"));
        let mut manager = Manager::new(vec![&mut a, &mut b], None, rng()).unwrap();

        manager.history = vec![10, 10];
        assert!(!manager.stalled());
        manager.history = vec![12, 10, 10, 10];
        assert!(manager.stalled());
        manager.history = vec![10, 10, 9, 9];
        assert!(!manager.stalled());
    }

    #[test]
    fn tournament_phase_to_json() -> serde_json::Result<()> {
        assert_eq!(
            serde_json::to_string(&TournamentPhase::Round)?,
            r#""round""#
        );
        assert_eq!(
            serde_json::from_str::<TournamentPhase>(r#""done""#)?,
            TournamentPhase::Done
        );

        Ok(())
    }
}
