#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use trains::card::{Deck, Hand};
use trains::color::CardColor;
use trains::config::load_map;
use trains::map::{Destination, Map};
use trains::moves::Move;
use trains::participant::{Participant, PlayerResponse};
use trains::player::PlayerView;

pub fn manifest_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// The seven-city map shipped under `maps/`.
pub fn default_map() -> Map {
    load_map(&manifest_path("maps/default.json")).unwrap()
}

pub fn red_deck(size: usize) -> Option<Deck> {
    Some(Deck::new(vec![CardColor::Red; size]))
}

/// Keeps the destinations it is told to, and always draws.
#[derive(Default)]
pub struct Drawer {
    pub name: String,
    /// Number of offered destinations kept.
    pub keep: usize,
    pub suggestion: Option<Map>,
    pub panic_on_start: bool,
    pub plays: usize,
    pub wins: Vec<bool>,
    pub ends: Vec<bool>,
    pub game_exclusions: Vec<String>,
    pub tournament_exclusions: Vec<String>,
}

impl Drawer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            keep: 2,
            suggestion: Some(default_map()),
            ..Self::default()
        }
    }
}

impl Participant for Drawer {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, _map: &Map, _rails: u32, _cards: &Hand) -> PlayerResponse<()> {
        Ok(())
    }

    fn pick(&mut self, offered: &BTreeSet<Destination>) -> PlayerResponse<BTreeSet<Destination>> {
        Ok(offered.iter().skip(self.keep).cloned().collect())
    }

    fn play(&mut self, _view: &PlayerView) -> PlayerResponse<Move> {
        self.plays += 1;
        Ok(Move::DrawCards)
    }

    fn more(&mut self, _cards: &[CardColor]) -> PlayerResponse<()> {
        Ok(())
    }

    fn win(&mut self, won: bool) -> PlayerResponse<()> {
        self.wins.push(won);
        Ok(())
    }

    fn start(&mut self) -> PlayerResponse<Option<Map>> {
        if self.panic_on_start {
            panic!("{} lost its connection", self.name);
        }
        Ok(self.suggestion.clone())
    }

    fn end(&mut self, won: bool) -> PlayerResponse<()> {
        self.ends.push(won);
        Ok(())
    }

    fn excluded_from_game(&mut self, reason: &str) -> PlayerResponse<()> {
        self.game_exclusions.push(reason.to_owned());
        Ok(())
    }

    fn excluded_from_tournament(&mut self, reason: &str) -> PlayerResponse<()> {
        self.tournament_exclusions.push(reason.to_owned());
        Ok(())
    }
}
