use crate::card::Hand;
use crate::city::City;
use crate::color::CardColor;
use crate::map::{Connection, Destination, Map};
use crate::moves::Move;
use crate::participant::{Participant, PlayerResponse};
use crate::player::PlayerView;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumIter, EnumString};

// Number of destinations a player keeps out of the offer.
const DESTINATIONS_KEPT: usize = 2;

// A `Hold10` player keeps drawing until it holds more cards than this.
const HOLD_LIMIT: u32 = 10;

/// All the strategies a local player can follow, selected by name.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, EnumString, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    /// Keeps the first destinations. Draws while holding 10 cards or fewer, otherwise claims
    /// the first connection it can afford.
    #[strum(serialize = "hold-10")]
    #[serde(rename = "hold-10")]
    Hold10,
    /// Keeps the last destinations, and claims the first connection it can afford whenever possible.
    BuyNow,
    /// Keeps the last destinations, and always tries to claim a connection that does not exist.
    Cheat,
}

impl Strategy {
    /// Returns the destinations to give back, out of the sorted `offered` ones.
    fn returned(self, offered: &BTreeSet<Destination>) -> BTreeSet<Destination> {
        match self {
            Strategy::Hold10 => offered.iter().skip(DESTINATIONS_KEPT).cloned().collect(),
            Strategy::BuyNow | Strategy::Cheat => offered
                .iter()
                .take(offered.len().saturating_sub(DESTINATIONS_KEPT))
                .cloned()
                .collect(),
        }
    }

    fn next_move(self, view: &PlayerView) -> PlayerResponse<Move> {
        let first_acquirable = || {
            view.acquirable_connections()
                .next()
                .cloned()
                .map_or(Move::DrawCards, Move::Acquire)
        };

        match self {
            Strategy::Hold10 if view.cards.total() <= HOLD_LIMIT => Ok(Move::DrawCards),
            Strategy::Hold10 | Strategy::BuyNow => Ok(first_acquirable()),
            Strategy::Cheat => Connection::new(
                City::new("Asgard", 5, 5),
                City::new("Hades", 6, 6),
                CardColor::Blue,
                5,
            )
            .map(Move::Acquire)
            .map_err(|e| e.to_string()),
        }
    }
}

/// A participant driven by one of the built-in [`Strategy`]s.
#[derive(Clone, Debug)]
pub struct StrategyPlayer {
    name: String,
    strategy: Strategy,
    /// Map suggested at the start of a tournament.
    suggestion: Option<Map>,
    map: Option<Map>,
    cards: Hand,
    destinations: BTreeSet<Destination>,
    wins: usize,
}

impl StrategyPlayer {
    pub fn new(name: impl Into<String>, strategy: Strategy, suggestion: Option<Map>) -> Self {
        Self {
            name: name.into(),
            strategy,
            suggestion,
            map: None,
            cards: Hand::default(),
            destinations: BTreeSet::new(),
            wins: 0,
        }
    }

    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Number of games won so far.
    #[inline]
    pub fn wins(&self) -> usize {
        self.wins
    }
}

impl Participant for StrategyPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, map: &Map, _rails: u32, cards: &Hand) -> PlayerResponse<()> {
        self.map = Some(map.clone());
        self.cards = cards.clone();
        self.destinations.clear();
        Ok(())
    }

    fn pick(&mut self, offered: &BTreeSet<Destination>) -> PlayerResponse<BTreeSet<Destination>> {
        let returned = self.strategy.returned(offered);
        self.destinations = offered.difference(&returned).cloned().collect();
        Ok(returned)
    }

    fn play(&mut self, view: &PlayerView) -> PlayerResponse<Move> {
        if self.map.is_none() {
            return Err(format!("{} was asked to play before being set up", self.name));
        }

        self.cards = view.cards.clone();
        self.strategy.next_move(view)
    }

    fn more(&mut self, cards: &[CardColor]) -> PlayerResponse<()> {
        self.cards.add(cards);
        Ok(())
    }

    fn win(&mut self, won: bool) -> PlayerResponse<()> {
        if won {
            self.wins += 1;
        }
        Ok(())
    }

    fn start(&mut self) -> PlayerResponse<Option<Map>> {
        Ok(self.suggestion.clone())
    }

    fn end(&mut self, won: bool) -> PlayerResponse<()> {
        log::info!("{} is done with the tournament, winner: {}", self.name, won);
        Ok(())
    }

    fn excluded_from_game(&mut self, reason: &str) -> PlayerResponse<()> {
        log::debug!("{} got excluded from a game: {}", self.name, reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::CardColor::*;
    use crate::map::tests::{connection, destination, test_map};
    use crate::player::GameInfo;
    use std::str::FromStr;

    fn offer() -> BTreeSet<Destination> {
        BTreeSet::from([
            destination("Boston", "New York"),
            destination("Austin", "Boise"),
            destination("Boise", "Philadelphia"),
            destination("Boston", "Washington D.C."),
            destination("New York", "Philadelphia"),
        ])
    }

    fn view_with(cards: &[CardColor]) -> PlayerView {
        PlayerView {
            connections: vec![],
            cards: Hand::from_cards(cards),
            rails: 45,
            destinations: vec![],
            game_info: GameInfo {
                cards_in_deck: 10,
                unclaimed_connections: test_map().connections().to_vec(),
                last_turn: false,
            },
            opponent_info: vec![],
        }
    }

    fn set_up(mut player: StrategyPlayer) -> StrategyPlayer {
        let cards = Hand::default();
        assert_eq!(player.setup(&test_map(), 45, &cards), Ok(()));
        player
    }

    #[test]
    fn strategy_from_name() {
        assert_eq!(Strategy::from_str("hold-10"), Ok(Strategy::Hold10));
        assert_eq!(Strategy::from_str("buy-now"), Ok(Strategy::BuyNow));
        assert_eq!(Strategy::from_str("cheat"), Ok(Strategy::Cheat));
        assert!(Strategy::from_str("random").is_err());
        assert_eq!(Strategy::Hold10.to_string(), "hold-10");
    }

    #[test]
    fn strategy_to_json() -> serde_json::Result<()> {
        assert_eq!(serde_json::to_string(&Strategy::Hold10)?, r#""hold-10""#);
        assert_eq!(
            serde_json::from_str::<Strategy>(r#""buy-now""#)?,
            Strategy::BuyNow
        );

        Ok(())
    }

    #[test]
    fn hold_10_keeps_first_destinations() -> PlayerResponse<()> {
        let mut player = StrategyPlayer::new("alice", Strategy::Hold10, None);
        let returned = player.pick(&offer())?;

        assert_eq!(returned.len(), 3);
        assert_eq!(
            player.destinations,
            BTreeSet::from([
                destination("Austin", "Boise"),
                destination("Boise", "Philadelphia"),
            ])
        );

        Ok(())
    }

    #[test]
    fn buy_now_keeps_last_destinations() -> PlayerResponse<()> {
        let mut player = StrategyPlayer::new("bob", Strategy::BuyNow, None);
        let returned = player.pick(&offer())?;

        assert_eq!(returned.len(), 3);
        assert_eq!(
            player.destinations,
            BTreeSet::from([
                destination("Boston", "Washington D.C."),
                destination("New York", "Philadelphia"),
            ])
        );

        Ok(())
    }

    #[test]
    fn hold_10_draws_with_few_cards() -> PlayerResponse<()> {
        let mut player = set_up(StrategyPlayer::new("alice", Strategy::Hold10, None));

        assert_eq!(player.play(&view_with(&[Red; 10]))?, Move::DrawCards);
        assert_eq!(
            player.play(&view_with(&[Red; 11]))?,
            Move::Acquire(connection("Austin", "Boise", Red, 5))
        );

        Ok(())
    }

    #[test]
    fn hold_10_draws_when_nothing_is_affordable() -> PlayerResponse<()> {
        let mut player = set_up(StrategyPlayer::new("alice", Strategy::Hold10, None));
        let mut view = view_with(&[[Red, Blue, Green, White].as_slice(); 3].concat());
        view.game_info.unclaimed_connections = vec![connection("Austin", "Boise", Red, 5)];

        assert_eq!(player.play(&view)?, Move::DrawCards);

        Ok(())
    }

    #[test]
    fn buy_now_acquires_first_affordable() -> PlayerResponse<()> {
        let mut player = set_up(StrategyPlayer::new("bob", Strategy::BuyNow, None));

        assert_eq!(
            player.play(&view_with(&[Blue, Blue, Blue]))?,
            Move::Acquire(connection("Boston", "New York", Blue, 3))
        );
        assert_eq!(player.play(&view_with(&[Blue, Red]))?, Move::DrawCards);

        Ok(())
    }

    #[test]
    fn cheat_acquires_missing_connection() -> PlayerResponse<()> {
        let mut player = set_up(StrategyPlayer::new("mallory", Strategy::Cheat, None));

        match player.play(&view_with(&[Blue; 5]))? {
            Move::Acquire(connection) => assert_eq!(test_map().connection_id(&connection), None),
            other => panic!("unexpected move {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn play_before_setup_fails() {
        let mut player = StrategyPlayer::new("alice", Strategy::BuyNow, None);

        assert!(player.play(&view_with(&[])).is_err());
    }

    #[test]
    fn player_tracks_cards_and_wins() -> PlayerResponse<()> {
        let mut player = StrategyPlayer::new("alice", Strategy::Hold10, Some(test_map()));

        assert_eq!(player.start()?, Some(test_map()));

        player.setup(&test_map(), 45, &Hand::from_cards(&[Red]))?;
        player.more(&[Red, White])?;
        assert_eq!(player.cards.count(Red), 2);
        assert_eq!(player.cards.count(White), 1);

        player.win(true)?;
        player.win(false)?;
        assert_eq!(player.wins(), 1);

        Ok(())
    }
}
