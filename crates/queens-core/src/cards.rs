//! Card and queen catalogs.
//!
//! This module contains:
//! - Typed identifiers for card and queen instances
//! - Card kinds and the fixed 62-card deck
//! - Queen definitions and the fixed 12-queen pool

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cards in the standard deck
pub const DECK_SIZE: usize = 62;

/// Number of queens in the pool
pub const QUEEN_COUNT: usize = 12;

/// Identifier for a concrete card instance within a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u8);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Identifier for a queen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueenId(pub u8);

impl fmt::Display for QueenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// What a card does when played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardKind {
    /// Discardable alone or in combinations summing to 2-10
    Number(u8),
    /// Wakes a sleeping queen of the player's choice
    King,
    /// Steals an awake queen from another player
    Knight,
    /// Cancels a knight attack against its holder
    Dragon,
    /// Puts one of a player's awake queens back to sleep
    Potion,
    /// Coin-flip chance at a random sleeping queen
    Jester,
}

/// A concrete card instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub kind: CardKind,
}

impl Card {
    /// Face value for number cards, `None` for everything else
    pub fn value(&self) -> Option<u8> {
        match self.kind {
            CardKind::Number(value) => Some(value),
            _ => None,
        }
    }
}

/// A queen card, worth points to whoever wakes her
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queen {
    pub id: QueenId,
    pub name: String,
    pub points: u8,
}

/// Create the standard deck (62 cards) in catalog order.
///
/// Composition: 40 number cards (values 1-10, four of each), 8 Kings,
/// 4 Knights, 3 Dragons, 4 Potions, 3 Jesters.
pub fn standard_deck() -> Vec<Card> {
    let mut kinds = Vec::with_capacity(DECK_SIZE);

    for value in 1..=10 {
        for _ in 0..4 {
            kinds.push(CardKind::Number(value));
        }
    }
    kinds.extend(std::iter::repeat(CardKind::King).take(8));
    kinds.extend(std::iter::repeat(CardKind::Knight).take(4));
    kinds.extend(std::iter::repeat(CardKind::Dragon).take(3));
    kinds.extend(std::iter::repeat(CardKind::Potion).take(4));
    kinds.extend(std::iter::repeat(CardKind::Jester).take(3));

    kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| Card {
            id: CardId(i as u8),
            kind,
        })
        .collect()
}

/// Create the full queen pool (12 queens), all asleep.
pub fn queen_pool() -> Vec<Queen> {
    const CATALOG: [(&str, u8); QUEEN_COUNT] = [
        ("Rose Queen", 5),
        ("Cake Queen", 5),
        ("Heart Queen", 5),
        ("Star Queen", 5),
        ("Moon Queen", 10),
        ("Ladybug Queen", 10),
        ("Sunflower Queen", 10),
        ("Rainbow Queen", 10),
        ("Dragon Queen", 15),
        ("Cat Queen", 15),
        ("Dog Queen", 15),
        ("Pancake Queen", 15),
    ];

    CATALOG
        .iter()
        .enumerate()
        .map(|(i, &(name, points))| Queen {
            id: QueenId(i as u8),
            name: name.to_string(),
            points,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_size_and_composition() {
        let deck = standard_deck();
        assert_eq!(deck.len(), DECK_SIZE);

        let count = |want: fn(&CardKind) -> bool| deck.iter().filter(|c| want(&c.kind)).count();
        assert_eq!(count(|k| matches!(k, CardKind::Number(_))), 40);
        assert_eq!(count(|k| matches!(k, CardKind::King)), 8);
        assert_eq!(count(|k| matches!(k, CardKind::Knight)), 4);
        assert_eq!(count(|k| matches!(k, CardKind::Dragon)), 3);
        assert_eq!(count(|k| matches!(k, CardKind::Potion)), 4);
        assert_eq!(count(|k| matches!(k, CardKind::Jester)), 3);
    }

    #[test]
    fn test_deck_has_four_of_each_value() {
        let deck = standard_deck();
        for value in 1..=10 {
            let copies = deck.iter().filter(|c| c.value() == Some(value)).count();
            assert_eq!(copies, 4, "value {} should appear four times", value);
        }
    }

    #[test]
    fn test_card_ids_are_unique() {
        let deck = standard_deck();
        let mut ids: Vec<u8> = deck.iter().map(|c| c.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), DECK_SIZE);
    }

    #[test]
    fn test_queen_pool() {
        let queens = queen_pool();
        assert_eq!(queens.len(), QUEEN_COUNT);

        for points in [5u8, 10, 15] {
            let at_value = queens.iter().filter(|q| q.points == points).count();
            assert_eq!(at_value, 4, "{} point queens", points);
        }

        let total: u32 = queens.iter().map(|q| u32::from(q.points)).sum();
        assert_eq!(total, 120);
    }
}
