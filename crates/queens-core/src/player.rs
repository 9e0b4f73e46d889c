//! Player state.

use crate::cards::{Card, CardId, CardKind, Queen, QueenId};
use serde::{Deserialize, Serialize};

/// Player identifier: a seat index fixed when the game starts (0-3)
pub type PlayerId = u8;

/// A single player's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Seat index, equal to this player's position in the player list
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Cards in hand. Order is irrelevant to the rules but stable for display.
    pub hand: Vec<Card>,
    /// Queens this player has woken
    pub awake_queens: Vec<Queen>,
}

impl Player {
    /// Create a new player with an empty hand
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            awake_queens: Vec::new(),
        }
    }

    /// Total points from awake queens
    pub fn score(&self) -> u32 {
        self.awake_queens.iter().map(|q| u32::from(q.points)).sum()
    }

    /// Number of awake queens
    pub fn queen_count(&self) -> usize {
        self.awake_queens.len()
    }

    /// Position of a card in hand by id, if present
    pub fn card_position(&self, id: CardId) -> Option<usize> {
        self.hand.iter().position(|c| c.id == id)
    }

    /// Position of an awake queen by id, if present
    pub fn queen_position(&self, id: QueenId) -> Option<usize> {
        self.awake_queens.iter().position(|q| q.id == id)
    }

    /// Whether any card in hand is a dragon
    pub fn holds_dragon(&self) -> bool {
        self.hand.iter().any(|c| c.kind == CardKind::Dragon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::QueenId;
    use pretty_assertions::assert_eq;

    fn queen(id: u8, points: u8) -> Queen {
        Queen {
            id: QueenId(id),
            name: format!("Queen {}", id),
            points,
        }
    }

    #[test]
    fn test_score_sums_queen_points() {
        let mut player = Player::new(0, "Alice".to_string());
        assert_eq!(player.score(), 0);

        player.awake_queens.push(queen(0, 5));
        player.awake_queens.push(queen(4, 10));
        assert_eq!(player.score(), 15);
        assert_eq!(player.queen_count(), 2);
    }

    #[test]
    fn test_card_position() {
        let mut player = Player::new(0, "Alice".to_string());
        player.hand.push(Card {
            id: CardId(7),
            kind: CardKind::King,
        });

        assert_eq!(player.card_position(CardId(7)), Some(0));
        assert_eq!(player.card_position(CardId(8)), None);
    }

    #[test]
    fn test_holds_dragon() {
        let mut player = Player::new(0, "Alice".to_string());
        assert!(!player.holds_dragon());

        player.hand.push(Card {
            id: CardId(3),
            kind: CardKind::Dragon,
        });
        assert!(player.holds_dragon());
    }
}
