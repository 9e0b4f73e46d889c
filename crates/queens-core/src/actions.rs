//! Player actions and the audit record of the last resolved action.
//!
//! Actions arrive kind-tagged from the transport layer; the audit record
//! goes back out the same way for presentation.

use crate::cards::{CardId, QueenId};
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};

/// All actions a player can submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameAction {
    /// Play a King to wake a sleeping queen
    WakeQueen { king_id: CardId, queen_id: QueenId },

    /// Play a Knight to steal an awake queen from another player
    PlayKnight {
        knight_id: CardId,
        target_player_id: PlayerId,
        target_queen_id: QueenId,
    },

    /// Play a Dragon to cancel the knight attack currently aimed at you
    PlayDragon { dragon_id: CardId },

    /// Let the knight attack currently aimed at you go through
    DeclineDefense,

    /// Play a Potion to put one of a player's awake queens back to sleep
    PlayPotion {
        potion_id: CardId,
        target_player_id: PlayerId,
    },

    /// Play a Jester for a coin-flip chance at a random sleeping queen
    PlayJester { jester_id: CardId },

    /// Discard number cards summing to 2-10 and redraw
    PlayNumberCards { card_ids: Vec<CardId> },
}

/// Display record of the most recent resolved action.
///
/// Purely informational: consumed by presentation collaborators, never read
/// back by the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LastAction {
    WakeQueen {
        player: String,
        queen: String,
    },

    /// A knight attack is waiting on the defender's response
    KnightAttack {
        player: String,
        target_player: String,
    },

    StealQueen {
        player: String,
        target_player: String,
        queen: String,
    },

    DefendWithDragon {
        player: String,
        attacking_player: String,
    },

    DeclineDefense {
        player: String,
        attacking_player: String,
        queen: String,
    },

    PlayPotion {
        player: String,
        target_player: String,
        queen: String,
    },

    JesterSuccess {
        player: String,
        queen: String,
    },

    JesterFail {
        player: String,
    },

    PlayNumberCards {
        player: String,
        values: Vec<u8>,
        sum: u8,
    },
}
