//! Board scoring.
//!
//! A single pass over the board tallies building counts and applies the
//! position-dependent Well and Theatre rules; counted buildings are scored
//! after the pass. Scoring is total: any board, including an all-empty one
//! or one parsed from garbage symbols, yields a score.

use crate::board::{Board, BuildingKind, Cell};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cottages a single Farm can feed
pub const COTTAGES_PER_FARM: i32 = 4;

/// Points per fed Cottage
pub const FED_COTTAGE_POINTS: i32 = 3;

/// Flat points per Cathedral
pub const CATHEDRAL_POINTS: i32 = 2;

/// Tavern bonus by count (index = number of Taverns, capped at 5)
pub const TAVERN_TIERS: [i32; 6] = [0, 2, 5, 9, 14, 20];

/// Per-rule contributions to a final score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub wells: i32,
    pub theatres: i32,
    pub cathedrals: i32,
    pub fed_cottages: i32,
    pub cottages: i32,
    pub chapels: i32,
    pub taverns: i32,
    /// Negative or zero
    pub unbuilt_penalty: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.wells
            + self.theatres
            + self.cathedrals
            + self.cottages
            + self.chapels
            + self.taverns
            + self.unbuilt_penalty
    }
}

/// Score a board
pub fn score(board: &Board) -> i32 {
    breakdown(board).total()
}

/// Score a serialized board; unrecognized symbols count as empty
pub fn score_symbols(symbols: &str) -> i32 {
    score(&Board::from_symbols(symbols))
}

/// Tavern bonus for a count of Taverns
pub fn tavern_bonus(count: usize) -> i32 {
    TAVERN_TIERS[count.min(TAVERN_TIERS.len() - 1)]
}

/// Score a board rule by rule
pub fn breakdown(board: &Board) -> ScoreBreakdown {
    let mut result = ScoreBreakdown::default();
    let mut cottages = 0i32;
    let mut farms = 0i32;
    let mut chapels = 0i32;
    let mut taverns = 0usize;
    let mut has_cathedral = false;
    let mut unbuilt = 0i32;

    for (idx, cell) in board.iter() {
        match cell {
            Cell::Empty | Cell::Resource(_) => unbuilt += 1,
            Cell::Building(BuildingKind::Cottage) => cottages += 1,
            Cell::Building(BuildingKind::Farm) => farms += 1,
            Cell::Building(BuildingKind::Chapel) => chapels += 1,
            Cell::Building(BuildingKind::Tavern) => taverns += 1,
            Cell::Building(BuildingKind::Well) => {
                result.wells += idx
                    .neighbors()
                    .iter()
                    .filter(|n| board.get(**n) == Cell::Building(BuildingKind::Cottage))
                    .count() as i32;
            }
            Cell::Building(BuildingKind::Theatre) => {
                let kinds: HashSet<BuildingKind> = idx
                    .row_cells()
                    .chain(idx.col_cells())
                    .filter_map(|c| board.get(c).building())
                    .filter(|b| *b != BuildingKind::Theatre)
                    .collect();
                result.theatres += kinds.len() as i32;
            }
            Cell::Building(BuildingKind::Cathedral) => {
                has_cathedral = true;
                result.cathedrals += CATHEDRAL_POINTS;
            }
            Cell::Building(BuildingKind::Factory) => {}
        }
    }

    let fed = cottages.min(farms * COTTAGES_PER_FARM);
    result.fed_cottages = fed;
    result.cottages = fed * FED_COTTAGE_POINTS;
    result.chapels = chapels * fed;
    result.taverns = tavern_bonus(taverns);
    if !has_cathedral {
        result.unbuilt_penalty = -unbuilt;
    }

    result
}
