//! Tiny Town game server.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tinytown_core::DeckConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod protocol;
mod server;
mod table;

use server::ServerState;

/// Deck settings from a `DECK_COPIES` value, falling back to the standard deck
fn deck_config(copies: Option<&str>) -> anyhow::Result<DeckConfig> {
    let Some(value) = copies else {
        return Ok(DeckConfig::default());
    };
    let copies_per_kind = value
        .trim()
        .parse::<usize>()
        .with_context(|| format!("DECK_COPIES must be a card count, got {:?}", value))?;
    let config = DeckConfig { copies_per_kind };
    config
        .total_cards()
        .with_context(|| format!("DECK_COPIES={} is out of range", value))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse address from env or use default
    let addr: SocketAddr = std::env::var("SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;

    let config = deck_config(std::env::var("DECK_COPIES").ok().as_deref())?;
    info!(
        "Starting Tiny Town server ({} copies of each resource)...",
        config.copies_per_kind
    );

    let state = Arc::new(ServerState::new(config));

    server::run_server(addr, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_config_default() {
        assert_eq!(deck_config(None).unwrap(), DeckConfig::default());
    }

    #[test]
    fn test_deck_config_parses_count() {
        let config = deck_config(Some(" 4 ")).unwrap();
        assert_eq!(config.copies_per_kind, 4);
    }

    #[test]
    fn test_deck_config_rejects_bad_values() {
        assert!(deck_config(Some("many")).is_err());
        assert!(deck_config(Some("-3")).is_err());
        assert!(deck_config(Some(&(usize::MAX / 2).to_string())).is_err());
    }
}
