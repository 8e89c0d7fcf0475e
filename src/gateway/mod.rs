//! Usage: HTTP surface (axum router, cookies, handlers) and the server loop.

pub(crate) mod cookies;
pub(crate) mod handlers;
pub(crate) mod listen;
pub(crate) mod query;
pub(crate) mod routes;
pub(crate) mod state;

use crate::infra::settings::AppSettings;
use crate::shared::error::AppResult;
use listen::{is_wildcard_host, parse_listen_address};
use std::future::Future;

/// Binds the configured address and serves until `shutdown` resolves.
pub(crate) async fn serve(
    settings: AppSettings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> AppResult<()> {
    let address = parse_listen_address(&settings.listen_addr)?;
    let bind_addr = address.bind_target();
    if is_wildcard_host(&address.host) {
        tracing::warn!(bind_addr = %bind_addr, "listening on all interfaces");
    }
    let app = routes::build_router(state::AppState::new(settings)?);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("GATEWAY_BIND_FAILED: {bind_addr}: {e}"))?;
    let local = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| bind_addr.clone());
    tracing::info!(bind_addr = %local, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| format!("SYSTEM_ERROR: gateway server error: {e}"))?;
    tracing::info!("gateway stopped");
    Ok(())
}
