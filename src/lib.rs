mod analytics;
mod gateway;
mod infra;
mod oauth;
mod shared;
pub mod test_support;
mod upstream;

pub use infra::settings::{self, AppSettings};
pub use infra::logging;
pub use shared::error::{AppError, AppResult};

/// Serves the dashboard API until Ctrl-C.
pub async fn run(settings: AppSettings) -> AppResult<()> {
    // Payload is not logged; it can carry request data.
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(location = %location, "PANIC: handler panicked at {location}");
    }));

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_version = %settings.api_version,
        "starting fanvue agency hub"
    );
    gateway::serve(settings, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("ctrl-c handler failed: {err}");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutdown requested");
    })
    .await
}
