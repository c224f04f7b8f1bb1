//! WebSocket protocol messages for Tiny Town.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tinytown_core::{Achievement, GameRecord};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Discard the current round and deal a fresh one
    NewGame,

    /// Submit a game action
    Action { action: serde_json::Value },

    /// End the round; `id_token` keys the achievement ledger when present
    FinishGame {
        #[serde(default)]
        id_token: Option<String>,
    },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with the table assigned to this connection
    Welcome { table_id: Uuid },

    /// Session state updated
    GameState { state: serde_json::Value },

    /// Outcome of a submitted action
    ActionResult {
        success: bool,
        events: Vec<serde_json::Value>,
        error: Option<String>,
    },

    /// Actions the session accepts right now
    ValidActions { actions: Vec<serde_json::Value> },

    /// Round finished
    GameFinished {
        record: GameRecord,
        score: i32,
        achievements: BTreeSet<Achievement>,
        newly_unlocked: BTreeSet<Achievement>,
    },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
