//! Core game session state machine.
//!
//! This module contains the `GameSession` struct and all transition logic.
//! A session owns the board, the deck and every piece of in-flight state;
//! there is no process-wide store. Two small state machines run side by
//! side:
//!
//! - `BuildPhase`: `Idle -> Selecting -> ArmedToPlace -> Idle`
//! - `DrawPhase`: `Drawing -> AwaitingOverrideChoice -> Drawing`
//!
//! Every refused transition returns a `GameError` and leaves the session
//! untouched.

use crate::achievements::{self, Achievement};
use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, BuildingKind, Cell, Resource};
use crate::deck::{DeckConfig, DeckError, ResourceDeck, VISIBLE_SLOTS};
use crate::grid::CellIndex;
use crate::recipe::Catalog;
use crate::record::GameRecord;
use crate::scoring;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Building side of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildPhase {
    /// Nothing selected
    Idle,
    /// One or more tiles selected; `matched` is re-evaluated after every toggle
    Selecting { matched: Option<BuildingKind> },
    /// Player committed to build; the resources are still on the board
    ArmedToPlace { building: BuildingKind },
}

/// Drawing side of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawPhase {
    /// Normal draw/place cycle
    Drawing,
    /// A Factory trigger was drawn for `cell`; waiting for the substitute
    AwaitingOverrideChoice {
        slot: usize,
        cell: CellIndex,
        drawn: Resource,
    },
}

/// Factory override bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryOverride {
    /// A Factory was built and its trigger has not been chosen yet
    pub pending_assignment: bool,
    /// Drawing this resource kind lets the player substitute another
    pub trigger: Option<Resource>,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Invalid visible slot {0}")]
    InvalidSlot(usize),

    #[error("Invalid cell {0}")]
    InvalidCell(usize),

    #[error("No resource selected")]
    NoResourceSelected,

    #[error("Cell is already occupied")]
    CellOccupied,

    #[error("Cell does not hold a resource")]
    NotAResource,

    #[error("Selection does not match any recipe")]
    NoRecipeMatched,

    #[error("Only one {0} may be built per game")]
    SingleInstanceBuilt(BuildingKind),

    #[error("Building must go on one of the selected tiles")]
    NotInSelection,

    #[error("No Factory is waiting for an override resource")]
    NoAssignmentPending,

    #[error("No Factory substitution is pending")]
    NoOverridePending,

    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// The results a caller hands on once a game is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedGame {
    pub score: i32,
    pub achievements: BTreeSet<Achievement>,
    pub record: GameRecord,
}

/// One single-player game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    board: Board,
    deck: ResourceDeck,
    /// Visible slot chosen for the next placement
    selected_slot: Option<usize>,
    /// Tiles chosen for a building, unique by cell, in toggle order
    selection: Vec<(CellIndex, Resource)>,
    build_phase: BuildPhase,
    draw_phase: DrawPhase,
    factory: FactoryOverride,
    started_at: DateTime<Utc>,
    config: DeckConfig,
}

impl GameSession {
    /// Start a session with a thread-local RNG
    pub fn new(config: DeckConfig) -> Result<Self, GameError> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Start a session with a seeded RNG (deterministic deck order)
    pub fn from_seed(config: DeckConfig, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(config, &mut StdRng::seed_from_u64(seed))
    }

    /// Start a session drawing its shuffle from `rng`
    pub fn with_rng<R: Rng>(config: DeckConfig, rng: &mut R) -> Result<Self, GameError> {
        let deck = ResourceDeck::shuffled(&config, rng)?;
        Ok(Self::from_deck(config, deck))
    }

    /// Start a session over an already-dealt deck
    pub fn from_deck(config: DeckConfig, deck: ResourceDeck) -> Self {
        Self {
            board: Board::new(),
            deck,
            selected_slot: None,
            selection: Vec::new(),
            build_phase: BuildPhase::Idle,
            draw_phase: DrawPhase::Drawing,
            factory: FactoryOverride::default(),
            started_at: Utc::now(),
            config,
        }
    }

    /// Discard everything and start a fresh round with a new shuffle
    pub fn reset(&mut self) -> Result<(), GameError> {
        self.reset_with_rng(&mut rand::thread_rng())
    }

    pub fn reset_with_rng<R: Rng>(&mut self, rng: &mut R) -> Result<(), GameError> {
        *self = Self::with_rng(self.config.clone(), rng)?;
        Ok(())
    }

    // ==================== Queries ====================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn deck(&self) -> &ResourceDeck {
        &self.deck
    }

    pub fn visible(&self) -> &[Resource; VISIBLE_SLOTS] {
        self.deck.visible()
    }

    pub fn selected_slot(&self) -> Option<usize> {
        self.selected_slot
    }

    pub fn selection(&self) -> &[(CellIndex, Resource)] {
        &self.selection
    }

    pub fn build_phase(&self) -> BuildPhase {
        self.build_phase
    }

    pub fn draw_phase(&self) -> DrawPhase {
        self.draw_phase
    }

    pub fn factory(&self) -> FactoryOverride {
        self.factory
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Override the start time, e.g. when restoring a session
    pub fn set_started_at(&mut self, started_at: DateTime<Utc>) {
        self.started_at = started_at;
    }

    /// Recipe matched by the current selection, if any
    pub fn matched_recipe(&self) -> Option<BuildingKind> {
        match self.build_phase {
            BuildPhase::Selecting { matched } => matched,
            BuildPhase::ArmedToPlace { building } => Some(building),
            BuildPhase::Idle => None,
        }
    }

    /// Current score of the board
    pub fn score(&self) -> i32 {
        scoring::score(&self.board)
    }

    /// Whether every cell is occupied
    pub fn is_board_full(&self) -> bool {
        self.board.is_full()
    }

    /// Score, achievements and the stored record for a game ending now
    pub fn finish(&self, finished_at: DateTime<Utc>) -> FinishedGame {
        let score = self.score();
        FinishedGame {
            score,
            achievements: achievements::evaluate(&self.board, score, self.started_at, finished_at),
            record: GameRecord::with_score(&self.board, score, self.started_at, finished_at),
        }
    }

    /// Get all currently valid actions
    pub fn valid_actions(&self) -> Vec<GameAction> {
        let mut actions = Vec::new();

        match self.draw_phase {
            DrawPhase::Drawing => {
                for slot in 0..VISIBLE_SLOTS {
                    actions.push(GameAction::SelectResource(slot));
                }
                if self.selected_slot.is_some() {
                    for (idx, cell) in self.board.iter() {
                        if cell.is_empty() {
                            actions.push(GameAction::PlaceResource(idx.index()));
                        }
                    }
                }
            }
            DrawPhase::AwaitingOverrideChoice { .. } => {
                for r in Resource::ALL {
                    actions.push(GameAction::ResolveFactoryOverride(r));
                }
            }
        }

        match self.build_phase {
            BuildPhase::Idle | BuildPhase::Selecting { .. } => {
                for (idx, cell) in self.board.iter() {
                    if cell.resource().is_some() {
                        actions.push(GameAction::ToggleTile(idx.index()));
                    }
                }
                if let BuildPhase::Selecting { matched } = self.build_phase {
                    if let Some(building) = matched {
                        if self.check_single_instance(building).is_ok() {
                            actions.push(GameAction::CommitToPlace);
                        }
                    }
                    actions.push(GameAction::ClearSelection);
                }
            }
            BuildPhase::ArmedToPlace { .. } => {
                for (idx, _) in &self.selection {
                    actions.push(GameAction::ConfirmPlacement(idx.index()));
                }
                actions.push(GameAction::ClearSelection);
            }
        }

        if self.factory.pending_assignment {
            for r in Resource::ALL {
                actions.push(GameAction::AssignFactoryOverride(r));
            }
        }

        actions
    }

    /// Apply an action to the session
    pub fn apply_action(&mut self, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::SelectResource(slot) => self.select_resource(slot),
            GameAction::PlaceResource(cell) => self.place_resource(cell),
            GameAction::ResolveFactoryOverride(r) => self.resolve_factory_override(r),
            GameAction::ToggleTile(cell) => self.toggle_tile(cell),
            GameAction::CommitToPlace => self.commit_to_place(),
            GameAction::ConfirmPlacement(cell) => self.confirm_placement(cell),
            GameAction::ClearSelection => self.clear_selection(),
            GameAction::AssignFactoryOverride(r) => self.assign_factory_override(r),
        }
    }

    // ==================== Drawing ====================

    /// Choose which visible resource the next placement uses
    pub fn select_resource(&mut self, slot: usize) -> Result<Vec<GameEvent>, GameError> {
        let resource = self
            .deck
            .visible_at(slot)
            .map_err(|_| GameError::InvalidSlot(slot))?;
        if self.draw_phase != DrawPhase::Drawing {
            return Err(GameError::InvalidPhase);
        }

        self.selected_slot = Some(slot);
        Ok(vec![GameEvent::ResourceSelected { slot, resource }])
    }

    /// Place the selected visible resource on an empty cell.
    ///
    /// If the resource is the Factory trigger, nothing reaches the board yet:
    /// the session moves to `AwaitingOverrideChoice` and the caller must
    /// follow up with [`resolve_factory_override`](Self::resolve_factory_override).
    pub fn place_resource(&mut self, cell: usize) -> Result<Vec<GameEvent>, GameError> {
        let cell = Self::cell(cell)?;
        if self.draw_phase != DrawPhase::Drawing {
            return Err(GameError::InvalidPhase);
        }
        let slot = self.selected_slot.ok_or(GameError::NoResourceSelected)?;
        if !self.board.get(cell).is_empty() {
            return Err(GameError::CellOccupied);
        }
        let drawn = self.deck.visible_at(slot)?;

        if self.factory.trigger == Some(drawn) {
            self.selected_slot = None;
            self.draw_phase = DrawPhase::AwaitingOverrideChoice { slot, cell, drawn };
            return Ok(vec![GameEvent::OverrideChoiceRequired { cell, drawn }]);
        }

        let events = self.put_resource(slot, cell, drawn, drawn)?;
        self.selected_slot = None;
        Ok(events)
    }

    /// Finish a Factory substitution: `substitute` lands on the board and the
    /// drawn trigger card goes back to the deck
    pub fn resolve_factory_override(
        &mut self,
        substitute: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        let DrawPhase::AwaitingOverrideChoice { slot, cell, drawn } = self.draw_phase else {
            return Err(GameError::NoOverridePending);
        };

        let events = self.put_resource(slot, cell, substitute, drawn)?;
        self.draw_phase = DrawPhase::Drawing;
        Ok(events)
    }

    fn put_resource(
        &mut self,
        slot: usize,
        cell: CellIndex,
        resource: Resource,
        drawn: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        let replacement = self.deck.draw_replace(slot, drawn)?;
        self.board.set(cell, Cell::Resource(resource));

        let mut events = vec![GameEvent::ResourcePlaced {
            cell,
            resource,
            drawn,
            slot,
            replacement,
        }];
        if self.board.is_full() {
            events.push(GameEvent::BoardFull);
        }
        Ok(events)
    }

    // ==================== Building ====================

    /// Add or remove a resource tile from the selection and re-match
    pub fn toggle_tile(&mut self, cell: usize) -> Result<Vec<GameEvent>, GameError> {
        let cell = Self::cell(cell)?;
        if matches!(self.build_phase, BuildPhase::ArmedToPlace { .. }) {
            return Err(GameError::InvalidPhase);
        }
        let resource = self.board.get(cell).resource().ok_or(GameError::NotAResource)?;

        let mut events = Vec::new();
        if let Some(pos) = self.selection.iter().position(|(c, _)| *c == cell) {
            self.selection.remove(pos);
            events.push(GameEvent::TileDeselected { cell });
        } else {
            self.selection.push((cell, resource));
            events.push(GameEvent::TileSelected { cell, resource });
        }

        let matched = Catalog::standard()
            .match_recipe(&self.selection)
            .map(|r| r.building);
        self.build_phase = if self.selection.is_empty() {
            BuildPhase::Idle
        } else {
            BuildPhase::Selecting { matched }
        };
        events.push(GameEvent::RecipeMatched { building: matched });

        Ok(events)
    }

    /// Commit to building the matched recipe
    pub fn commit_to_place(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let building = match self.build_phase {
            BuildPhase::Selecting {
                matched: Some(building),
            } => building,
            BuildPhase::ArmedToPlace { .. } => return Err(GameError::InvalidPhase),
            _ => return Err(GameError::NoRecipeMatched),
        };
        self.check_single_instance(building)?;

        self.build_phase = BuildPhase::ArmedToPlace { building };
        Ok(vec![GameEvent::PlacementArmed { building }])
    }

    /// Replace the selected resources with the armed building at `target`
    pub fn confirm_placement(&mut self, target: usize) -> Result<Vec<GameEvent>, GameError> {
        let target = Self::cell(target)?;
        let BuildPhase::ArmedToPlace { building } = self.build_phase else {
            return Err(GameError::InvalidPhase);
        };
        if !self.selection.iter().any(|(c, _)| *c == target) {
            return Err(GameError::NotInSelection);
        }

        let cleared: Vec<CellIndex> = self.selection.drain(..).map(|(c, _)| c).collect();
        for c in &cleared {
            self.board.clear(*c);
        }
        self.board.set(target, Cell::Building(building));
        self.build_phase = BuildPhase::Idle;

        let mut events = vec![GameEvent::BuildingPlaced {
            building,
            cell: target,
            cleared,
        }];

        if building == BuildingKind::Factory {
            self.factory.pending_assignment = true;
            events.push(GameEvent::FactoryOverrideRequested);
        }

        Ok(events)
    }

    /// Abandon the current selection
    pub fn clear_selection(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.build_phase == BuildPhase::Idle {
            return Err(GameError::InvalidPhase);
        }
        self.selection.clear();
        self.build_phase = BuildPhase::Idle;
        Ok(vec![GameEvent::SelectionCleared])
    }

    // ==================== Factory ====================

    /// Set the resource kind the Factory overrides
    pub fn assign_factory_override(
        &mut self,
        trigger: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        if !self.factory.pending_assignment {
            return Err(GameError::NoAssignmentPending);
        }
        self.factory = FactoryOverride {
            pending_assignment: false,
            trigger: Some(trigger),
        };
        Ok(vec![GameEvent::FactoryOverrideAssigned { trigger }])
    }

    // ==================== Helper Methods ====================

    fn cell(index: usize) -> Result<CellIndex, GameError> {
        CellIndex::new(index).ok_or(GameError::InvalidCell(index))
    }

    fn check_single_instance(&self, building: BuildingKind) -> Result<(), GameError> {
        if building.is_single_instance() && self.board.contains_building(building) {
            return Err(GameError::SingleInstanceBuilt(building));
        }
        Ok(())
    }
}
