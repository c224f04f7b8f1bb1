//! Town board representation: resources, buildings and the 16-cell grid.
//!
//! This module contains:
//! - Resource kinds drawn from the deck
//! - Building kinds produced by recipes
//! - The `Cell` occupant and the `Board` itself
//! - The one-character symbol alphabet used to serialize a board

use crate::grid::{CellIndex, CELL_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol used for an empty or unrecognized cell
pub const EMPTY_SYMBOL: char = '.';

/// Raw resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Wood,
    Brick,
    Wheat,
    Glass,
    Stone,
}

impl Resource {
    /// All resource kinds, in deck-building order
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Wheat,
        Resource::Glass,
        Resource::Stone,
    ];

    /// Board symbol for this resource
    pub fn symbol(&self) -> char {
        match self {
            Resource::Wood => 'w',
            Resource::Brick => 'b',
            Resource::Wheat => 'h',
            Resource::Glass => 'g',
            Resource::Stone => 's',
        }
    }

    /// Parse a board symbol
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.symbol() == symbol)
    }

    /// Lowercase display name
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Wheat => "wheat",
            Resource::Glass => "glass",
            Resource::Stone => "stone",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Building kinds that can be constructed from a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// +1 per adjacent Cottage
    Well,
    /// +1 per distinct other building kind in its row and column
    Theatre,
    /// Lets the player substitute one drawn resource kind
    Factory,
    /// 3 points when fed by a Farm
    Cottage,
    /// +1 per fed Cottage
    Chapel,
    /// Feeds up to 4 Cottages
    Farm,
    /// Tiered bonus by count
    Tavern,
    /// +2 and waives the empty-tile penalty
    Cathedral,
}

impl BuildingKind {
    /// All building kinds
    pub const ALL: [BuildingKind; 8] = [
        BuildingKind::Well,
        BuildingKind::Theatre,
        BuildingKind::Factory,
        BuildingKind::Cottage,
        BuildingKind::Chapel,
        BuildingKind::Farm,
        BuildingKind::Tavern,
        BuildingKind::Cathedral,
    ];

    /// Board symbol for this building
    pub fn symbol(&self) -> char {
        match self {
            BuildingKind::Well => 'W',
            BuildingKind::Theatre => 'T',
            BuildingKind::Factory => 'F',
            BuildingKind::Cottage => 'C',
            BuildingKind::Chapel => 'P',
            BuildingKind::Farm => 'A',
            BuildingKind::Tavern => 'V',
            BuildingKind::Cathedral => 'M',
        }
    }

    /// Parse a board symbol
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.symbol() == symbol)
    }

    /// Whether at most one of this building may exist per session.
    ///
    /// The Factory shares the rule so that only one override trigger can
    /// ever be assigned.
    pub fn is_single_instance(&self) -> bool {
        matches!(self, BuildingKind::Cathedral | BuildingKind::Factory)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildingKind::Well => "Well",
            BuildingKind::Theatre => "Theatre",
            BuildingKind::Factory => "Factory",
            BuildingKind::Cottage => "Cottage",
            BuildingKind::Chapel => "Chapel",
            BuildingKind::Farm => "Farm",
            BuildingKind::Tavern => "Tavern",
            BuildingKind::Cathedral => "Cathedral",
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What occupies a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Resource(Resource),
    Building(BuildingKind),
}

impl Cell {
    /// Board symbol for this cell
    pub fn symbol(&self) -> char {
        match self {
            Cell::Empty => EMPTY_SYMBOL,
            Cell::Resource(r) => r.symbol(),
            Cell::Building(b) => b.symbol(),
        }
    }

    /// Parse a board symbol; anything unrecognized is an empty cell
    pub fn from_symbol(symbol: char) -> Self {
        if let Some(r) = Resource::from_symbol(symbol) {
            Cell::Resource(r)
        } else if let Some(b) = BuildingKind::from_symbol(symbol) {
            Cell::Building(b)
        } else {
            Cell::Empty
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn resource(&self) -> Option<Resource> {
        match self {
            Cell::Resource(r) => Some(*r),
            _ => None,
        }
    }

    pub fn building(&self) -> Option<BuildingKind> {
        match self {
            Cell::Building(b) => Some(*b),
            _ => None,
        }
    }
}

/// The 4x4 town board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELL_COUNT],
        }
    }

    /// Build a board from a sequence of symbols.
    ///
    /// Unrecognized symbols become empty cells. Input shorter than the grid
    /// is padded with empty cells; anything past the 16th symbol is ignored.
    pub fn from_symbols(symbols: &str) -> Self {
        let mut board = Self::new();
        for (slot, symbol) in board.cells.iter_mut().zip(symbols.chars()) {
            *slot = Cell::from_symbol(symbol);
        }
        board
    }

    /// Build a board from explicit cells
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// Serialize to one character per cell
    pub fn serialize(&self) -> String {
        self.cells.iter().map(Cell::symbol).collect()
    }

    pub fn get(&self, cell: CellIndex) -> Cell {
        self.cells[cell.index()]
    }

    pub fn set(&mut self, cell: CellIndex, value: Cell) {
        self.cells[cell.index()] = value;
    }

    /// Clear a cell to empty
    pub fn clear(&mut self, cell: CellIndex) {
        self.cells[cell.index()] = Cell::Empty;
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// Iterate over (index, cell) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (CellIndex, Cell)> + '_ {
        CellIndex::all().map(move |idx| (idx, self.cells[idx.index()]))
    }

    /// Whether any cell holds the given building
    pub fn contains_building(&self, kind: BuildingKind) -> bool {
        self.cells.iter().any(|c| *c == Cell::Building(kind))
    }

    /// Number of cells holding the given building
    pub fn count_building(&self, kind: BuildingKind) -> usize {
        self.cells
            .iter()
            .filter(|c| **c == Cell::Building(kind))
            .count()
    }

    /// Number of empty cells
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_empty()).count()
    }

    /// Whether every cell is occupied
    pub fn is_full(&self) -> bool {
        self.empty_count() == 0
    }

    /// Whether every cell is empty
    pub fn is_empty(&self) -> bool {
        self.empty_count() == CELL_COUNT
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.cells.chunks(crate::grid::GRID_SIZE).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in chunk {
                write!(f, "{}", cell.symbol())?;
            }
        }
        Ok(())
    }
}
