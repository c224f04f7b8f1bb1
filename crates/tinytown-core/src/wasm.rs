//! WebAssembly bindings for the Tiny Town engine.
//!
//! This module exposes a game session to JavaScript through wasm-bindgen.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::achievements;
#[cfg(feature = "wasm")]
use crate::actions::GameAction;
#[cfg(feature = "wasm")]
use crate::board::Board;
#[cfg(feature = "wasm")]
use crate::deck::DeckConfig;
#[cfg(feature = "wasm")]
use crate::game::GameSession;
#[cfg(feature = "wasm")]
use crate::recipe::Catalog;
#[cfg(feature = "wasm")]
use crate::scoring;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Start a new game with the standard deck
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmGame, JsValue> {
        let session = GameSession::new(DeckConfig::default())
            .map_err(|e| JsValue::from_str(&format!("Cannot start game: {}", e)))?;
        Ok(WasmGame { session })
    }

    /// Throw away the current round and deal a fresh one
    #[wasm_bindgen(js_name = resetGrid)]
    pub fn reset_grid(&mut self) -> Result<(), JsValue> {
        self.session
            .reset()
            .map_err(|e| JsValue::from_str(&format!("Reset failed: {}", e)))
    }

    /// Get the whole session as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.session).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get valid actions as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self) -> String {
        serde_json::to_string(&self.session.valid_actions()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        match self.session.apply_action(action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&format!("Action failed: {}", e))),
        }
    }

    /// Serialized board, one symbol per cell
    #[wasm_bindgen(js_name = serializeBoard)]
    pub fn serialize_board(&self) -> String {
        self.session.board().serialize()
    }

    /// Score of the current board
    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> i32 {
        self.session.score()
    }

    /// Whether every cell is occupied
    #[wasm_bindgen(js_name = isBoardFull)]
    pub fn is_board_full(&self) -> bool {
        self.session.is_board_full()
    }

    /// Finish the game at the given ISO-8601 time; returns the finished game as JSON
    #[wasm_bindgen(js_name = finish)]
    pub fn finish(&self, finished_at: &str) -> Result<String, JsValue> {
        let finished_at = achievements::parse_timestamp(finished_at)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let finished = self.session.finish(finished_at);
        serde_json::to_string(&finished).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Recipe catalog with every orientation, for rendering building cards
    #[wasm_bindgen(js_name = getRecipes)]
    pub fn get_recipes(&self) -> String {
        serde_json::to_string(Catalog::standard()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Score a serialized board
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = calculateScore)]
pub fn calculate_score(board: &str) -> i32 {
    scoring::score_symbols(board)
}

/// Achievement ids earned by a serialized board, as a JSON array
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = evaluateAchievements)]
pub fn evaluate_achievements(
    board: &str,
    score: i32,
    started_at: &str,
    finished_at: &str,
) -> Result<String, JsValue> {
    let earned = achievements::evaluate_iso(&Board::from_symbols(board), score, started_at, finished_at)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&earned).map_err(|e| JsValue::from_str(&e.to_string()))
}
