//! One connection's game table.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tinytown_core::{DeckConfig, FinishedGame, GameAction, GameError, GameEvent, GameSession};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Could not encode game data: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single-player table hosting one game session at a time.
pub struct Table {
    pub id: Uuid,
    session: GameSession,
}

impl Table {
    pub fn new(id: Uuid, config: DeckConfig) -> Result<Self, TableError> {
        Ok(Self {
            id,
            session: GameSession::new(config)?,
        })
    }

    #[cfg(test)]
    fn with_session(id: Uuid, session: GameSession) -> Self {
        Self { id, session }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Throw away the current round and deal a new one
    pub fn new_game(&mut self) -> Result<(), TableError> {
        self.session.reset()?;
        Ok(())
    }

    pub fn apply_action(
        &mut self,
        action: serde_json::Value,
    ) -> Result<Vec<GameEvent>, TableError> {
        let action: GameAction = serde_json::from_value(action)
            .map_err(|e| TableError::InvalidAction(e.to_string()))?;

        Ok(self.session.apply_action(action)?)
    }

    pub fn game_state(&self) -> Result<serde_json::Value, TableError> {
        Ok(serde_json::to_value(&self.session)?)
    }

    pub fn valid_actions(&self) -> Result<Vec<serde_json::Value>, TableError> {
        self.session
            .valid_actions()
            .into_iter()
            .map(|a| serde_json::to_value(a).map_err(TableError::from))
            .collect()
    }

    pub fn encode_events(events: &[GameEvent]) -> Result<Vec<serde_json::Value>, TableError> {
        events
            .iter()
            .map(|e| serde_json::to_value(e).map_err(TableError::from))
            .collect()
    }

    pub fn finish(&self, finished_at: DateTime<Utc>) -> FinishedGame {
        self.session.finish(finished_at)
    }
}
