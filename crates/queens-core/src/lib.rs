//! Sleeping Queens game engine
//!
//! This crate provides the core rules for a sleeping-queens-style card game:
//! - Fixed card deck and queen pool catalogs
//! - Injectable randomness for reproducible games
//! - Action validation and resolution, including the attack/defense
//!   interrupt window
//! - Win evaluation and turn scheduling
//!
//! # Architecture
//!
//! The engine is a pure state machine: [`GameState::apply`] takes the acting
//! player and an action and returns either the next snapshot or a typed
//! rejection. It never mutates its input and performs no I/O. Transport,
//! persistence, and presentation live in collaborating crates; whoever owns
//! persistence must serialize concurrent submissions per game.
//!
//! # Modules
//!
//! - [`cards`]: card/queen catalogs and typed identifiers
//! - [`rng`]: the randomness abstraction
//! - [`player`]: per-player state
//! - [`actions`]: submitted actions and the audit record
//! - [`game`]: the state machine itself

pub mod actions;
pub mod cards;
pub mod game;
pub mod player;
pub mod rng;

// Re-export commonly used types
pub use actions::{GameAction, LastAction};
pub use cards::{
    queen_pool, standard_deck, Card, CardId, CardKind, Queen, QueenId, DECK_SIZE, QUEEN_COUNT,
};
pub use game::{DefenseWindow, GameError, GamePhase, GameState};
pub use player::{Player, PlayerId};
pub use rng::{RandomnessProvider, SeededRandomness, ThreadRandomness};
