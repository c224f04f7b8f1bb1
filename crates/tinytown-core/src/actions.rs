//! Actions a player can take and the events they produce.
//!
//! Every entry point of a [`GameSession`](crate::game::GameSession) is
//! mirrored here as data so adapters (WebSocket, wasm) can ship actions and
//! events as JSON.

use crate::board::{BuildingKind, Resource};
use crate::grid::CellIndex;
use serde::{Deserialize, Serialize};

/// All possible player actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Drawing ====================
    /// Pick one of the three visible resources to place next
    SelectResource(usize),
    /// Place the selected resource on an empty cell
    PlaceResource(usize),
    /// Choose what lands on the board when a Factory trigger was drawn
    ResolveFactoryOverride(Resource),

    // ==================== Building ====================
    /// Add or remove a resource tile from the selection
    ToggleTile(usize),
    /// Commit to building the matched recipe
    CommitToPlace,
    /// Put the building on one of the selected tiles
    ConfirmPlacement(usize),
    /// Drop the current selection
    ClearSelection,

    // ==================== Factory ====================
    /// Designate the resource kind a newly built Factory overrides
    AssignFactoryOverride(Resource),
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A visible slot was chosen for the next placement
    ResourceSelected { slot: usize, resource: Resource },

    /// A resource landed on the board.
    ///
    /// `drawn` differs from `resource` when a Factory substitution happened.
    ResourcePlaced {
        cell: CellIndex,
        resource: Resource,
        drawn: Resource,
        slot: usize,
        replacement: Resource,
    },

    /// The drawn resource matches the Factory trigger; the player must pick
    /// a substitute before anything reaches the board
    OverrideChoiceRequired { cell: CellIndex, drawn: Resource },

    /// A tile was added to the selection
    TileSelected { cell: CellIndex, resource: Resource },

    /// A tile was removed from the selection
    TileDeselected { cell: CellIndex },

    /// The selection was re-evaluated against the recipe catalog
    RecipeMatched { building: Option<BuildingKind> },

    /// The player committed to building
    PlacementArmed { building: BuildingKind },

    /// The selection was abandoned
    SelectionCleared,

    /// A building replaced its resources
    BuildingPlaced {
        building: BuildingKind,
        cell: CellIndex,
        cleared: Vec<CellIndex>,
    },

    /// A Factory was built and needs an override resource assigned
    FactoryOverrideRequested,

    /// The Factory override trigger was set
    FactoryOverrideAssigned { trigger: Resource },

    /// Every cell is occupied
    BoardFull,
}
