//! Core game state machine.
//!
//! This module contains the main `GameState` struct and all game rules:
//! the turn/phase gate, one resolver per action kind, win evaluation, and
//! turn scheduling.

use crate::actions::{GameAction, LastAction};
use crate::cards::{
    queen_pool, standard_deck, Card, CardId, CardKind, Queen, QueenId, DECK_SIZE, QUEEN_COUNT,
};
use crate::player::{Player, PlayerId};
use crate::rng::RandomnessProvider;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cards dealt to each player at game start
const OPENING_HAND_SIZE: usize = 5;

/// Points that win the game outright
const WINNING_POINTS: u32 = 40;

/// Queens that win the game outright at a 2-3 player table
const WINNING_QUEENS_SMALL_TABLE: usize = 5;

/// Queens that win the game outright at a 4 player table
const WINNING_QUEENS_LARGE_TABLE: usize = 4;

/// The Jester's chance of waking a queen
const JESTER_WAKE_PROBABILITY: f64 = 0.5;

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    /// Normal play: the player holding the turn may act
    Idle,

    /// A knight attack is waiting on the defender's dragon-or-decline.
    /// Normal turn order is suspended until the defender responds.
    AwaitingDefense(DefenseWindow),

    /// Game is over
    Finished { winner: PlayerId },
}

/// The interrupt record: a knight attack against a dragon holder.
///
/// While this window is open nothing has moved yet - the knight is still in
/// the attacker's hand and the queen still in the defender's awake set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseWindow {
    /// Player who played the knight
    pub attacker: PlayerId,
    /// Player whose queen is targeted; the only player allowed to act
    pub defender: PlayerId,
    /// The knight in play
    pub knight_id: CardId,
    /// The queen being stolen
    pub queen_id: QueenId,
}

/// Rejections for submitted actions. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Card not found in hand")]
    CardNotFound,

    #[error("Invalid target")]
    InvalidTarget,

    #[error("Number cards must sum to between 2 and 10")]
    InvalidCombination,

    #[error("No knight attack to respond to")]
    NoPendingInterrupt,

    #[error("Game is over")]
    GameAlreadyOver,
}

/// The complete game state.
///
/// `apply` is the only mutation path and it returns a fresh snapshot,
/// leaving its receiver untouched. The transport collaborator persists the
/// returned state and serializes concurrent submissions per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Queens nobody has woken yet
    pub sleeping_queens: Vec<Queen>,
    /// Face-down cards; the end of the vec is the top
    pub draw_pile: Vec<Card>,
    /// Face-up discards, append-only
    pub discard_pile: Vec<Card>,
    /// All players in seating order
    pub players: Vec<Player>,
    /// Seating order, fixed at game start
    pub turn_order: Vec<PlayerId>,
    /// Index into `turn_order` of the player whose turn it is
    pub current_turn: usize,
    /// Number of turn changes so far
    pub turn_number: u32,
    /// Current game phase
    pub phase: GamePhase,
    /// Display record of the most recent resolved action
    pub last_action: Option<LastAction>,
}

impl GameState {
    /// Create a new game: build and shuffle the deck, deal opening hands,
    /// put every queen to sleep, and pick a first player at random.
    pub fn new<R: RandomnessProvider>(player_names: Vec<String>, rng: &mut R) -> Self {
        let player_count = player_names.len();
        assert!((2..=4).contains(&player_count), "Must have 2-4 players");

        let mut draw_pile = standard_deck();
        rng.shuffle(&mut draw_pile);

        let mut players: Vec<Player> = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(i as PlayerId, name))
            .collect();

        for player in &mut players {
            for _ in 0..OPENING_HAND_SIZE {
                if let Some(card) = draw_pile.pop() {
                    player.hand.push(card);
                }
            }
        }

        let current_turn = rng.pick_index(player_count);

        Self {
            sleeping_queens: queen_pool(),
            draw_pile,
            discard_pile: Vec::new(),
            turn_order: (0..player_count as PlayerId).collect(),
            players,
            current_turn,
            turn_number: 0,
            phase: GamePhase::Idle,
            last_action: None,
        }
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// The player whose turn it is
    pub fn current_player(&self) -> PlayerId {
        self.turn_order[self.current_turn]
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished { .. })
    }

    /// Get the winner if the game is finished
    pub fn winner(&self) -> Option<PlayerId> {
        if let GamePhase::Finished { winner } = self.phase {
            Some(winner)
        } else {
            None
        }
    }

    /// The open defense window, if a knight attack is pending
    pub fn pending_interrupt(&self) -> Option<&DefenseWindow> {
        match &self.phase {
            GamePhase::AwaitingDefense(window) => Some(window),
            _ => None,
        }
    }

    /// Apply an action, returning the next state.
    ///
    /// All validation happens before any card or queen moves; on `Err` no
    /// state exists but the caller's untouched snapshot.
    pub fn apply<R: RandomnessProvider>(
        &self,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut R,
    ) -> Result<GameState, GameError> {
        self.validate_actor(actor, action)?;

        let mut next = self.clone();
        match *action {
            GameAction::WakeQueen { king_id, queen_id } => {
                next.resolve_wake_queen(actor, king_id, queen_id)?;
            }
            GameAction::PlayKnight {
                knight_id,
                target_player_id,
                target_queen_id,
            } => {
                next.resolve_play_knight(actor, knight_id, target_player_id, target_queen_id)?;
            }
            GameAction::PlayDragon { dragon_id } => {
                next.resolve_play_dragon(actor, dragon_id)?;
            }
            GameAction::DeclineDefense => {
                next.resolve_decline_defense(actor)?;
            }
            GameAction::PlayPotion {
                potion_id,
                target_player_id,
            } => {
                next.resolve_play_potion(actor, potion_id, target_player_id, rng)?;
            }
            GameAction::PlayJester { jester_id } => {
                next.resolve_play_jester(actor, jester_id, rng)?;
            }
            GameAction::PlayNumberCards { ref card_ids } => {
                next.resolve_play_number_cards(actor, card_ids)?;
            }
        }

        debug_assert!(
            next.conservation_holds(),
            "card/queen conservation violated"
        );
        Ok(next)
    }

    /// Get all currently valid actions for a player.
    ///
    /// Number-card combinations are enumerated as singles and pairs only;
    /// `apply` still accepts larger combinations.
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        let p = match self.get_player(player) {
            Some(p) => p,
            None => return actions,
        };

        match &self.phase {
            GamePhase::Finished { .. } => {
                // No actions when game is over
            }

            GamePhase::AwaitingDefense(window) => {
                if player == window.defender {
                    for card in &p.hand {
                        if card.kind == CardKind::Dragon {
                            actions.push(GameAction::PlayDragon { dragon_id: card.id });
                        }
                    }
                    actions.push(GameAction::DeclineDefense);
                }
            }

            GamePhase::Idle => {
                if player != self.current_player() {
                    return actions;
                }

                for card in &p.hand {
                    match card.kind {
                        CardKind::King => {
                            for queen in &self.sleeping_queens {
                                actions.push(GameAction::WakeQueen {
                                    king_id: card.id,
                                    queen_id: queen.id,
                                });
                            }
                        }
                        CardKind::Knight => {
                            for target in &self.players {
                                if target.id == player {
                                    continue;
                                }
                                for queen in &target.awake_queens {
                                    actions.push(GameAction::PlayKnight {
                                        knight_id: card.id,
                                        target_player_id: target.id,
                                        target_queen_id: queen.id,
                                    });
                                }
                            }
                        }
                        CardKind::Potion => {
                            for target in &self.players {
                                if target.id != player && !target.awake_queens.is_empty() {
                                    actions.push(GameAction::PlayPotion {
                                        potion_id: card.id,
                                        target_player_id: target.id,
                                    });
                                }
                            }
                        }
                        CardKind::Jester => {
                            actions.push(GameAction::PlayJester { jester_id: card.id });
                        }
                        CardKind::Number(value) => {
                            if (2..=10).contains(&value) {
                                actions.push(GameAction::PlayNumberCards {
                                    card_ids: vec![card.id],
                                });
                            }
                        }
                        // Dragons only come out in defense
                        CardKind::Dragon => {}
                    }
                }

                // Pairs of number cards; larger combinations left to the client
                for (i, a) in p.hand.iter().enumerate() {
                    let va = match a.kind {
                        CardKind::Number(v) => v,
                        _ => continue,
                    };
                    for b in &p.hand[i + 1..] {
                        let vb = match b.kind {
                            CardKind::Number(v) => v,
                            _ => continue,
                        };
                        if va + vb <= 10 {
                            actions.push(GameAction::PlayNumberCards {
                                card_ids: vec![a.id, b.id],
                            });
                        }
                    }
                }
            }
        }

        actions
    }

    // ==================== Validation ====================

    /// Gate on phase and actor before anything else is inspected.
    fn validate_actor(&self, actor: PlayerId, action: &GameAction) -> Result<(), GameError> {
        if self.get_player(actor).is_none() {
            return Err(GameError::NotYourTurn);
        }

        let defense_response = matches!(
            action,
            GameAction::PlayDragon { .. } | GameAction::DeclineDefense
        );

        match &self.phase {
            GamePhase::Finished { .. } => Err(GameError::GameAlreadyOver),

            GamePhase::AwaitingDefense(window) => {
                if !defense_response {
                    // Turn order is suspended for everyone, defender included
                    Err(GameError::NotYourTurn)
                } else if actor != window.defender {
                    Err(GameError::NoPendingInterrupt)
                } else {
                    Ok(())
                }
            }

            GamePhase::Idle => {
                if defense_response {
                    Err(GameError::NoPendingInterrupt)
                } else if actor != self.current_player() {
                    Err(GameError::NotYourTurn)
                } else {
                    Ok(())
                }
            }
        }
    }

    // ==================== Resolution ====================

    fn resolve_wake_queen(
        &mut self,
        actor: PlayerId,
        king_id: CardId,
        queen_id: QueenId,
    ) -> Result<(), GameError> {
        let king_pos = self
            .player(actor)
            .card_position(king_id)
            .filter(|&pos| self.player(actor).hand[pos].kind == CardKind::King)
            .ok_or(GameError::CardNotFound)?;
        let queen_pos = self
            .sleeping_queens
            .iter()
            .position(|q| q.id == queen_id)
            .ok_or(GameError::InvalidTarget)?;

        let king = self.player_mut(actor).hand.remove(king_pos);
        self.discard_pile.push(king);

        let queen = self.sleeping_queens.remove(queen_pos);
        let queen_name = queen.name.clone();
        self.player_mut(actor).awake_queens.push(queen);
        self.draw_cards(actor, 1);

        self.last_action = Some(LastAction::WakeQueen {
            player: self.player(actor).name.clone(),
            queen: queen_name,
        });

        if !self.check_win() {
            self.advance_turn();
        }
        Ok(())
    }

    fn resolve_play_knight(
        &mut self,
        actor: PlayerId,
        knight_id: CardId,
        target_player_id: PlayerId,
        target_queen_id: QueenId,
    ) -> Result<(), GameError> {
        let knight_pos = self
            .player(actor)
            .card_position(knight_id)
            .filter(|&pos| self.player(actor).hand[pos].kind == CardKind::Knight)
            .ok_or(GameError::CardNotFound)?;
        let target = self
            .get_player(target_player_id)
            .ok_or(GameError::InvalidTarget)?;
        let queen_pos = target
            .queen_position(target_queen_id)
            .ok_or(GameError::InvalidTarget)?;

        if target.holds_dragon() {
            // Nothing moves yet; the defender chooses dragon-or-decline
            self.phase = GamePhase::AwaitingDefense(DefenseWindow {
                attacker: actor,
                defender: target_player_id,
                knight_id,
                queen_id: target_queen_id,
            });
            self.last_action = Some(LastAction::KnightAttack {
                player: self.player(actor).name.clone(),
                target_player: self.player(target_player_id).name.clone(),
            });
            return Ok(());
        }

        let queen_name = self.steal_queen(actor, target_player_id, knight_pos, queen_pos);
        self.last_action = Some(LastAction::StealQueen {
            player: self.player(actor).name.clone(),
            target_player: self.player(target_player_id).name.clone(),
            queen: queen_name,
        });

        if !self.check_win() {
            self.advance_turn();
        }
        Ok(())
    }

    fn resolve_play_dragon(&mut self, actor: PlayerId, dragon_id: CardId) -> Result<(), GameError> {
        let window = match &self.phase {
            GamePhase::AwaitingDefense(window) => window.clone(),
            _ => return Err(GameError::NoPendingInterrupt),
        };

        let dragon_pos = self
            .player(actor)
            .card_position(dragon_id)
            .filter(|&pos| self.player(actor).hand[pos].kind == CardKind::Dragon)
            .ok_or(GameError::CardNotFound)?;
        let knight_pos = self
            .player(window.attacker)
            .card_position(window.knight_id)
            .ok_or(GameError::CardNotFound)?;

        let dragon = self.player_mut(actor).hand.remove(dragon_pos);
        self.discard_pile.push(dragon);
        let knight = self.player_mut(window.attacker).hand.remove(knight_pos);
        self.discard_pile.push(knight);

        self.draw_cards(actor, 1);
        self.draw_cards(window.attacker, 1);

        self.phase = GamePhase::Idle;
        self.last_action = Some(LastAction::DefendWithDragon {
            player: self.player(actor).name.clone(),
            attacking_player: self.player(window.attacker).name.clone(),
        });

        // The defense hands the turn to the defender, wherever they sit
        self.set_turn_to(actor);
        Ok(())
    }

    fn resolve_decline_defense(&mut self, actor: PlayerId) -> Result<(), GameError> {
        let window = match &self.phase {
            GamePhase::AwaitingDefense(window) => window.clone(),
            _ => return Err(GameError::NoPendingInterrupt),
        };

        let knight_pos = self
            .player(window.attacker)
            .card_position(window.knight_id)
            .ok_or(GameError::CardNotFound)?;
        let queen_pos = self
            .player(window.defender)
            .queen_position(window.queen_id)
            .ok_or(GameError::InvalidTarget)?;

        self.phase = GamePhase::Idle;
        let queen_name = self.steal_queen(window.attacker, window.defender, knight_pos, queen_pos);
        self.last_action = Some(LastAction::DeclineDefense {
            player: self.player(actor).name.clone(),
            attacking_player: self.player(window.attacker).name.clone(),
            queen: queen_name,
        });

        // Turn order resumes from the attacker's seat
        if !self.check_win() {
            self.advance_turn();
        }
        Ok(())
    }

    fn resolve_play_potion<R: RandomnessProvider>(
        &mut self,
        actor: PlayerId,
        potion_id: CardId,
        target_player_id: PlayerId,
        rng: &mut R,
    ) -> Result<(), GameError> {
        let potion_pos = self
            .player(actor)
            .card_position(potion_id)
            .filter(|&pos| self.player(actor).hand[pos].kind == CardKind::Potion)
            .ok_or(GameError::CardNotFound)?;
        let target = self
            .get_player(target_player_id)
            .ok_or(GameError::InvalidTarget)?;
        if target.awake_queens.is_empty() {
            return Err(GameError::InvalidTarget);
        }

        let potion = self.player_mut(actor).hand.remove(potion_pos);
        self.discard_pile.push(potion);

        let queen_pos = rng.pick_index(self.player(target_player_id).awake_queens.len());
        let queen = self
            .player_mut(target_player_id)
            .awake_queens
            .remove(queen_pos);
        let queen_name = queen.name.clone();
        self.sleeping_queens.push(queen);
        self.draw_cards(actor, 1);

        self.last_action = Some(LastAction::PlayPotion {
            player: self.player(actor).name.clone(),
            target_player: self.player(target_player_id).name.clone(),
            queen: queen_name,
        });

        if !self.check_win() {
            self.advance_turn();
        }
        Ok(())
    }

    fn resolve_play_jester<R: RandomnessProvider>(
        &mut self,
        actor: PlayerId,
        jester_id: CardId,
        rng: &mut R,
    ) -> Result<(), GameError> {
        let jester_pos = self
            .player(actor)
            .card_position(jester_id)
            .filter(|&pos| self.player(actor).hand[pos].kind == CardKind::Jester)
            .ok_or(GameError::CardNotFound)?;

        let jester = self.player_mut(actor).hand.remove(jester_pos);
        self.discard_pile.push(jester);

        let mut woke_queen = None;
        if rng.coin_flip(JESTER_WAKE_PROBABILITY) && !self.sleeping_queens.is_empty() {
            let queen_pos = rng.pick_index(self.sleeping_queens.len());
            let queen = self.sleeping_queens.remove(queen_pos);
            woke_queen = Some(queen.name.clone());
            self.player_mut(actor).awake_queens.push(queen);
        }
        self.draw_cards(actor, 1);

        let player_name = self.player(actor).name.clone();
        self.last_action = Some(match woke_queen {
            Some(ref queen) => LastAction::JesterSuccess {
                player: player_name,
                queen: queen.clone(),
            },
            None => LastAction::JesterFail { player: player_name },
        });

        // Only a successful wake can end the game
        let finished = woke_queen.is_some() && self.check_win();
        if !finished {
            self.advance_turn();
        }
        Ok(())
    }

    fn resolve_play_number_cards(
        &mut self,
        actor: PlayerId,
        card_ids: &[CardId],
    ) -> Result<(), GameError> {
        if card_ids.is_empty() {
            return Err(GameError::CardNotFound);
        }

        let mut positions = Vec::with_capacity(card_ids.len());
        let mut values = Vec::with_capacity(card_ids.len());
        for &id in card_ids {
            let pos = self
                .player(actor)
                .card_position(id)
                .ok_or(GameError::CardNotFound)?;
            let value = match self.player(actor).hand[pos].kind {
                CardKind::Number(value) => value,
                _ => return Err(GameError::CardNotFound),
            };
            // A repeated id resolves to the same slot; one card can't be discarded twice
            if positions.contains(&pos) {
                return Err(GameError::CardNotFound);
            }
            positions.push(pos);
            values.push(value);
        }

        let sum: u8 = values.iter().sum();
        if !(2..=10).contains(&sum) {
            return Err(GameError::InvalidCombination);
        }

        // Remove from the highest index down so earlier positions stay valid
        let count = positions.len();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        for pos in positions {
            let card = self.player_mut(actor).hand.remove(pos);
            self.discard_pile.push(card);
        }
        self.draw_cards(actor, count);

        self.last_action = Some(LastAction::PlayNumberCards {
            player: self.player(actor).name.clone(),
            values,
            sum,
        });

        self.advance_turn();
        Ok(())
    }

    // ==================== Helper Methods ====================

    /// Shorthand for a player known to exist (ids are validated up front)
    fn player(&self, id: PlayerId) -> &Player {
        &self.players[id as usize]
    }

    fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id as usize]
    }

    /// Draw up to `count` cards; an empty draw pile just draws fewer.
    fn draw_cards(&mut self, player: PlayerId, count: usize) {
        for _ in 0..count {
            match self.draw_pile.pop() {
                Some(card) => self.player_mut(player).hand.push(card),
                None => break,
            }
        }
    }

    /// Complete a knight theft: discard the knight, move the queen, draw.
    /// Returns the stolen queen's name for the audit record.
    fn steal_queen(
        &mut self,
        attacker: PlayerId,
        target: PlayerId,
        knight_pos: usize,
        queen_pos: usize,
    ) -> String {
        let knight = self.player_mut(attacker).hand.remove(knight_pos);
        self.discard_pile.push(knight);

        let queen = self.player_mut(target).awake_queens.remove(queen_pos);
        let queen_name = queen.name.clone();
        self.player_mut(attacker).awake_queens.push(queen);
        self.draw_cards(attacker, 1);

        queen_name
    }

    /// Evaluate win conditions and finish the game if one fired.
    /// Returns true if the game just ended.
    fn check_win(&mut self) -> bool {
        match self.evaluate_win() {
            Some(winner) => {
                self.phase = GamePhase::Finished { winner };
                true
            }
            None => false,
        }
    }

    /// Win conditions in fixed priority order. Ties within a condition go to
    /// the earlier seat: the winner is the first player whose total is the
    /// running maximum.
    fn evaluate_win(&self) -> Option<PlayerId> {
        // 1. Exhaustion: every queen is awake; highest total takes it
        if self.sleeping_queens.is_empty() {
            let mut winner = self.players[0].id;
            let mut best = self.players[0].score();
            for player in &self.players[1..] {
                if player.score() > best {
                    best = player.score();
                    winner = player.id;
                }
            }
            return Some(winner);
        }

        // 2. Queen count: 5 queens at a 2-3 player table, 4 at a full table
        let required = if self.player_count() <= 3 {
            WINNING_QUEENS_SMALL_TABLE
        } else {
            WINNING_QUEENS_LARGE_TABLE
        };
        if let Some(player) = self.players.iter().find(|p| p.queen_count() >= required) {
            return Some(player.id);
        }

        // 3. Points
        self.players
            .iter()
            .find(|p| p.score() >= WINNING_POINTS)
            .map(|p| p.id)
    }

    /// Move to the next seat in turn order.
    fn advance_turn(&mut self) {
        self.current_turn = (self.current_turn + 1) % self.turn_order.len();
        self.turn_number += 1;
    }

    /// Hand the turn to a specific player (successful dragon defense).
    fn set_turn_to(&mut self, player: PlayerId) {
        if let Some(idx) = self.turn_order.iter().position(|&p| p == player) {
            self.current_turn = idx;
        }
        self.turn_number += 1;
    }

    /// Conservation invariant: 12 queens and 62 cards, each in exactly one
    /// place. Violations are programming errors, never game rejections.
    fn conservation_holds(&self) -> bool {
        let queens = self.sleeping_queens.len()
            + self
                .players
                .iter()
                .map(|p| p.awake_queens.len())
                .sum::<usize>();
        let cards = self.draw_pile.len()
            + self.discard_pile.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>();
        queens == QUEEN_COUNT && cards == DECK_SIZE
    }
}
