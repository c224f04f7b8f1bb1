//! Achievements earned by a finished town.
//!
//! Every predicate is evaluated on every call and is independent of the
//! others. Evaluation performs no I/O; reconciling earned ids against what
//! a player already holds is done with [`newly_unlocked`].

use crate::board::{Board, BuildingKind};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;

/// Minimum score for `masterBuilder`
pub const MASTER_BUILDER_SCORE: i32 = 50;

/// Distinct building kinds needed for `varietyPack`
pub const VARIETY_PACK_KINDS: usize = 3;

/// Farms needed for `farmLife`
pub const FARM_LIFE_FARMS: usize = 3;

/// Finish in under this many seconds for `speedy`
pub const SPEEDY_SECONDS: i64 = 180;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AchievementError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Achievement identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Achievement {
    /// Every cell occupied
    PerfectTown,
    /// Score of 50 or more
    MasterBuilder,
    /// Three or more distinct building kinds
    VarietyPack,
    /// Finished in under three minutes
    Speedy,
    /// Three or more Farms
    FarmLife,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::PerfectTown,
        Achievement::MasterBuilder,
        Achievement::VarietyPack,
        Achievement::Speedy,
        Achievement::FarmLife,
    ];

    /// Stable string id
    pub fn id(&self) -> &'static str {
        match self {
            Achievement::PerfectTown => "perfectTown",
            Achievement::MasterBuilder => "masterBuilder",
            Achievement::VarietyPack => "varietyPack",
            Achievement::Speedy => "speedy",
            Achievement::FarmLife => "farmLife",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Achievements a board qualifies for
pub fn evaluate(
    board: &Board,
    score: i32,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> BTreeSet<Achievement> {
    let mut earned = BTreeSet::new();

    // An untouched board is not a finished town
    if board.is_empty() {
        return earned;
    }

    if board.is_full() {
        earned.insert(Achievement::PerfectTown);
    }

    if score >= MASTER_BUILDER_SCORE {
        earned.insert(Achievement::MasterBuilder);
    }

    let kinds: HashSet<BuildingKind> = board.iter().filter_map(|(_, c)| c.building()).collect();
    if kinds.len() >= VARIETY_PACK_KINDS {
        earned.insert(Achievement::VarietyPack);
    }

    let elapsed = finished_at - started_at;
    if elapsed < Duration::seconds(SPEEDY_SECONDS) {
        earned.insert(Achievement::Speedy);
    }

    if board.count_building(BuildingKind::Farm) >= FARM_LIFE_FARMS {
        earned.insert(Achievement::FarmLife);
    }

    earned
}

/// Parse an ISO-8601 / RFC 3339 timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AchievementError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| AchievementError::InvalidTimestamp(value.to_string()))
}

/// [`evaluate`] with timestamps given as ISO-8601 strings
pub fn evaluate_iso(
    board: &Board,
    score: i32,
    started_at: &str,
    finished_at: &str,
) -> Result<BTreeSet<Achievement>, AchievementError> {
    Ok(evaluate(
        board,
        score,
        parse_timestamp(started_at)?,
        parse_timestamp(finished_at)?,
    ))
}

/// Earned achievements the player did not already hold
pub fn newly_unlocked(
    earned: &BTreeSet<Achievement>,
    previously_unlocked: &BTreeSet<Achievement>,
) -> BTreeSet<Achievement> {
    earned.difference(previously_unlocked).copied().collect()
}
