//! Completed-game payload handed to whatever stores finished games.

use crate::board::Board;
use crate::scoring;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A finished game in its stored form.
///
/// The score is carried as a decimal string and times as RFC 3339 strings,
/// which is the shape the storage side expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// One symbol per cell
    pub board: String,
    pub score: String,
    pub start_time: String,
    pub end_time: String,
}

impl GameRecord {
    /// Score and serialize a board
    pub fn new(board: &Board, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        Self::with_score(board, scoring::score(board), started_at, finished_at)
    }

    /// Build a record with an already computed score
    pub fn with_score(
        board: &Board,
        score: i32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            board: board.serialize(),
            score: score.to_string(),
            start_time: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_time: finished_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// The score as a number, if the stored string is well formed
    pub fn score_value(&self) -> Option<i32> {
        self.score.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_shape() {
        let board = Board::from_symbols("M");
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let end = DateTime::from_timestamp(1_700_000_100, 0).unwrap();
        let record = GameRecord::new(&board, start, end);

        assert_eq!(record.board, "M...............");
        assert_eq!(record.score, "2");
        assert_eq!(record.score_value(), Some(2));
        assert_eq!(record.start_time, "2023-11-14T22:13:20.000Z");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["startTime"], "2023-11-14T22:13:20.000Z");
        assert_eq!(json["endTime"], "2023-11-14T22:15:00.000Z");
        assert_eq!(json["score"], "2");
    }

    #[test]
    fn test_negative_score_string() {
        let now = Utc::now();
        let record = GameRecord::new(&Board::new(), now, now);
        assert_eq!(record.score, "-16");
    }
}
