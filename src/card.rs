use crate::color::CardColor;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Number of cards in a deck when none is provided.
pub const DEFAULT_DECK_SIZE: usize = 250;

/// The shared supply of cards. Cards are drawn from the top, i.e. the end of the list.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<CardColor>,
}

impl Deck {
    /// A deck holding exactly `cards`, the last one being on top.
    pub fn new(cards: Vec<CardColor>) -> Self {
        Self { cards }
    }

    /// A deck of `size` cards, each of a uniformly random color.
    pub fn random<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let colors: Vec<_> = CardColor::iter().collect();
        let cards = (0..size)
            .filter_map(|_| colors.choose(rng).copied())
            .collect();

        Self { cards }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Removes up to `n` cards from the top of the deck.
    /// Returns fewer cards (possibly none) once the deck runs out.
    pub fn draw_up_to(&mut self, n: usize) -> Vec<CardColor> {
        let remaining = self.cards.len().saturating_sub(n);
        let mut drawn = self.cards.split_off(remaining);
        drawn.reverse();
        drawn
    }
}

/// The cards held by a player, by color.
///
/// It is guaranteed that the map has at all times an entry for every color.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Hand {
    cards: BTreeMap<CardColor, u32>,
}

impl Default for Hand {
    fn default() -> Self {
        Self {
            cards: CardColor::iter().map(|color| (color, 0)).collect(),
        }
    }
}

impl Hand {
    /// A hand holding the given cards, with every missing color set to zero.
    pub fn from_cards(cards: &[CardColor]) -> Self {
        let mut hand = Self::default();
        hand.add(cards);
        hand
    }

    #[inline]
    pub fn count(&self, color: CardColor) -> u32 {
        self.cards.get(&color).copied().unwrap_or(0)
    }

    /// Total number of cards, all colors included.
    pub fn total(&self) -> u32 {
        self.cards.values().sum()
    }

    pub fn add(&mut self, cards: &[CardColor]) {
        for color in cards {
            *self.cards.entry(*color).or_insert(0) += 1;
        }
    }

    /// Removes `n` cards of the given color, down to zero at most.
    pub fn remove(&mut self, color: CardColor, n: u32) {
        let count = self.cards.entry(color).or_insert(0);
        *count = count.saturating_sub(n);
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardColor, u32)> + '_ {
        self.cards.iter().map(|(color, count)| (*color, *count))
    }
}
