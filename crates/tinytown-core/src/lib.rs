//! Tiny Town - a 4x4 tile-placement town-building rules engine
//!
//! This crate provides the core game logic for Tiny Town, including:
//! - The 4x4 grid, resource deck and three-card draw window
//! - Recipe shape matching across every rotation and reflection
//! - The building placement state machine, with the Factory override
//! - Board scoring and achievement evaluation
//!
//! # Architecture
//!
//! The engine is synchronous and platform-agnostic. It performs no I/O and
//! owns no global state: every game lives in an explicitly passed
//! [`GameSession`]. It can be compiled to:
//! - Native Rust for server-side hosting
//! - WebAssembly for a browser front-end
//!
//! # Modules
//!
//! - [`grid`]: Cell coordinates on the 4x4 grid
//! - [`board`]: Resources, buildings and the board symbol alphabet
//! - [`deck`]: Shuffled resource deck and visible window
//! - [`recipe`]: Recipe catalog and shape matching
//! - [`game`]: Session state machine
//! - [`scoring`]: Board scoring
//! - [`achievements`]: Achievement predicates
//! - [`record`]: Finished-game payload for storage

pub mod achievements;
pub mod actions;
pub mod board;
pub mod deck;
pub mod game;
pub mod grid;
pub mod recipe;
pub mod record;
pub mod scoring;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use achievements::{evaluate, evaluate_iso, newly_unlocked, Achievement, AchievementError};
pub use actions::{GameAction, GameEvent};
pub use board::{Board, BuildingKind, Cell, Resource};
pub use deck::{new_deck, DeckConfig, DeckError, ResourceDeck, MAX_DECK_CARDS, VISIBLE_SLOTS};
pub use game::{BuildPhase, DrawPhase, FactoryOverride, FinishedGame, GameError, GameSession};
pub use grid::{CellIndex, CELL_COUNT, GRID_SIZE};
pub use recipe::{match_recipe, Catalog, Pattern, Recipe, Slot};
pub use record::GameRecord;
pub use scoring::{score, score_symbols, ScoreBreakdown};
