//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::table::{Table, TableError};
use chrono::Utc;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tinytown_core::{newly_unlocked, Achievement, DeckConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// Deck settings for every new table
    pub config: DeckConfig,
    /// One table per live connection
    pub tables: DashMap<Uuid, Table>,
    /// Mapping from table ID to its connection's message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Achievements already unlocked, keyed by identity token
    pub unlocked: DashMap<String, BTreeSet<Achievement>>,
}

impl ServerState {
    pub fn new(config: DeckConfig) -> Self {
        Self {
            config,
            tables: DashMap::new(),
            senders: DashMap::new(),
            unlocked: DashMap::new(),
        }
    }

    /// Send a message to the connection owning a table.
    pub fn send_to(&self, table_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&table_id) {
            let _ = sender.send(msg);
        }
    }

    /// Merge `earned` into the ledger for `token`, returning what was not
    /// held before.
    pub fn record_unlocks(
        &self,
        token: &str,
        earned: &BTreeSet<Achievement>,
    ) -> BTreeSet<Achievement> {
        let mut held = self.unlocked.entry(token.to_string()).or_default();
        let fresh = newly_unlocked(earned, &held);
        held.extend(fresh.iter().copied());
        fresh
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(DeckConfig::default())
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Tiny Town server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let table_id = Uuid::new_v4();
    let table = Table::new(table_id, state.config.clone())?;
    state.tables.insert(table_id, table);

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(table_id, tx);

    let welcome = ServerMessage::Welcome { table_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    send_state(table_id, &state);

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(table_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", table_id, text);
                    state.send_to(
                        table_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", table_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to(table_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", table_id, e);
                break;
            }
            _ => {}
        }
    }

    // A table lives exactly as long as its connection
    state.tables.remove(&table_id);
    state.senders.remove(&table_id);
    send_task.abort();

    info!("Connection closed for {}", table_id);
    Ok(())
}

/// Push the session state and its valid actions to the client.
fn send_state(table_id: Uuid, state: &ServerState) {
    let encoded = match state.tables.get(&table_id) {
        Some(table) => table
            .game_state()
            .and_then(|s| table.valid_actions().map(|a| (s, a))),
        None => return,
    };

    match encoded {
        Ok((game_state, actions)) => {
            state.send_to(table_id, ServerMessage::GameState { state: game_state });
            state.send_to(table_id, ServerMessage::ValidActions { actions });
        }
        Err(e) => send_error(table_id, state, e),
    }
}

fn send_error(table_id: Uuid, state: &ServerState, e: TableError) {
    state.send_to(
        table_id,
        ServerMessage::Error {
            message: e.to_string(),
        },
    );
}

/// Handle a client message.
fn handle_message(table_id: Uuid, msg: ClientMessage, state: &ServerState) {
    match msg {
        ClientMessage::NewGame => {
            let result = match state.tables.get_mut(&table_id) {
                Some(mut table) => table.new_game(),
                None => return,
            };
            match result {
                Ok(()) => {
                    debug!("Table {} dealt a new game", table_id);
                    send_state(table_id, state);
                }
                Err(e) => send_error(table_id, state, e),
            }
        }

        ClientMessage::Action { action } => {
            let result = match state.tables.get_mut(&table_id) {
                Some(mut table) => table
                    .apply_action(action)
                    .and_then(|events| Table::encode_events(&events)),
                None => return,
            };

            match result {
                Ok(events) => {
                    state.send_to(
                        table_id,
                        ServerMessage::ActionResult {
                            success: true,
                            events,
                            error: None,
                        },
                    );
                    send_state(table_id, state);
                }
                Err(e) => {
                    debug!("Table {} refused action: {}", table_id, e);
                    state.send_to(
                        table_id,
                        ServerMessage::ActionResult {
                            success: false,
                            events: vec![],
                            error: Some(e.to_string()),
                        },
                    );
                }
            }
        }

        ClientMessage::FinishGame { id_token } => {
            let finished = match state.tables.get(&table_id) {
                Some(table) => table.finish(Utc::now()),
                None => return,
            };

            let newly_unlocked = match id_token.as_deref() {
                Some(token) => state.record_unlocks(token, &finished.achievements),
                None => finished.achievements.clone(),
            };

            info!(
                "Table {} finished with score {} ({} achievements, {} new)",
                table_id,
                finished.score,
                finished.achievements.len(),
                newly_unlocked.len()
            );

            state.send_to(
                table_id,
                ServerMessage::GameFinished {
                    record: finished.record,
                    score: finished.score,
                    achievements: finished.achievements,
                    newly_unlocked,
                },
            );
        }

        ClientMessage::Ping => {
            state.send_to(table_id, ServerMessage::Pong);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocks_are_reported_once_per_token() {
        let state = ServerState::default();
        let earned = BTreeSet::from([Achievement::Speedy, Achievement::FarmLife]);

        assert_eq!(state.record_unlocks("alice", &earned), earned);
        assert!(state.record_unlocks("alice", &earned).is_empty());

        let more = BTreeSet::from([Achievement::Speedy, Achievement::PerfectTown]);
        assert_eq!(
            state.record_unlocks("alice", &more),
            BTreeSet::from([Achievement::PerfectTown])
        );
        assert_eq!(state.unlocked.get("alice").map(|h| h.len()), Some(3));
    }

    #[test]
    fn test_tokens_are_independent() {
        let state = ServerState::default();
        let earned = BTreeSet::from([Achievement::MasterBuilder]);
        state.record_unlocks("a.b.c", &earned);
        assert_eq!(state.record_unlocks("other", &earned), earned);
    }

    #[test]
    fn test_action_reply_sequence() {
        let state = ServerState::default();
        let table_id = Uuid::new_v4();
        state
            .tables
            .insert(table_id, Table::new(table_id, DeckConfig::default()).unwrap());
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.senders.insert(table_id, tx);

        handle_message(
            table_id,
            ClientMessage::Action {
                action: serde_json::json!({ "SelectResource": 2 }),
            },
            &state,
        );

        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::ActionResult { success: true, .. }
        ));
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::GameState { .. }));
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::ValidActions { .. }));

        handle_message(
            table_id,
            ClientMessage::Action {
                action: serde_json::json!({ "ConfirmPlacement": 0 }),
            },
            &state,
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::ActionResult { success: false, error: Some(_), .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_finish_without_token() {
        let state = ServerState::default();
        let table_id = Uuid::new_v4();
        state
            .tables
            .insert(table_id, Table::new(table_id, DeckConfig::default()).unwrap());
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.senders.insert(table_id, tx);

        handle_message(table_id, ClientMessage::FinishGame { id_token: None }, &state);

        match rx.try_recv().unwrap() {
            ServerMessage::GameFinished {
                score,
                achievements,
                newly_unlocked,
                record,
            } => {
                assert_eq!(score, -16);
                assert!(achievements.is_empty());
                assert!(newly_unlocked.is_empty());
                assert_eq!(record.board, "................");
            }
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(state.unlocked.is_empty());
    }
}
