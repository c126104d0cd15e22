use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use coordinator::{CoordinatorState, EffectCatalog, StateSnapshot};
use shared::error::{ApiError, ErrorCode};
use tokio::sync::{mpsc, oneshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app_state;
mod bridge;
mod config;
mod engine;
mod listeners;
mod ws;

use app_state::AppState;
use bridge::{InboundEvent, TransportBridge};
use config::load_settings;
use engine::UdpEngineSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let (events, events_rx) = mpsc::channel(settings.event_queue_capacity);

    let sink = UdpEngineSink::bind(&settings)?;
    let bridge = TransportBridge::new(
        CoordinatorState::new(EffectCatalog::default()),
        sink,
        settings.unmap_on_remove,
    );
    tokio::spawn(bridge.run(events_rx));

    listeners::spawn_all(&settings, events.clone()).await?;

    let state = AppState::new(events);
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.http_bind.parse()?;
    info!(%addr, engine = %settings.engine_host, "coordinator listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/snapshot", get(snapshot))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StateSnapshot>, (StatusCode, Json<ApiError>)> {
    let unavailable = || {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(
                ErrorCode::Unavailable,
                "coordinator event loop is not running",
            )),
        )
    };

    let (reply, response) = oneshot::channel();
    state
        .events
        .send(InboundEvent::Snapshot(reply))
        .await
        .map_err(|_| unavailable())?;
    let snapshot = response.await.map_err(|_| unavailable())?;
    Ok(Json(snapshot))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
