//! Gomoku Arena server binary.
//!
//! Wires configuration, logging, the application services, and the WebSocket
//! endpoint together, then serves until shutdown.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gomoku_arena::adapters::identity::GuestDirectory;
use gomoku_arena::adapters::stats::InMemoryStatsStore;
use gomoku_arena::adapters::websocket::{websocket_router, EventGateway};
use gomoku_arena::application::matchmaking::MatchmakingQueue;
use gomoku_arena::application::rooms::RoomRegistry;
use gomoku_arena::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.server.log_level)
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rooms = Arc::new(RoomRegistry::new(config.game.max_rooms));
    let queue = Arc::new(MatchmakingQueue::new(
        config.game.matchmaking_initial_range,
        config.game.matchmaking_expansion_step,
        config.game.matchmaking_expand_interval_secs,
    ));
    let gateway = EventGateway::new(
        rooms,
        queue,
        Arc::new(GuestDirectory::new()),
        Arc::new(InMemoryStatsStore::new()),
        config.game.default_turn_limit_secs,
        config.game.matchmaking_sweep_interval_secs,
    );
    gateway.spawn_matchmaking_sweep();

    let cors = if config.server.is_production() {
        let origins = config
            .server
            .cors_origins_list()
            .iter()
            .filter_map(|o| o.parse::<http::HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    } else {
        CorsLayer::new().allow_origin(Any)
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(websocket_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(gateway);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "gomoku arena listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
