//! Usage: Tracing subscriber setup (stderr always, daily-rotated file when `log_dir` is
//! configured).

use crate::infra::settings::AppSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "fanvue_agency_hub_lib=info,fanvue_agency_hub=info,info";
const LOG_FILE_PREFIX: &str = "fanvue-agency-hub.log";

/// Installs the global subscriber. Keep the returned guard alive for the process lifetime
/// or buffered file output is lost.
pub fn init(settings: &AppSettings) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let Some(dir) = settings.log_dir.as_ref() else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init();
        return None;
    };

    if let Err(err) = std::fs::create_dir_all(dir) {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init();
        tracing::warn!(log_dir = %dir.display(), "file logging disabled: {err}");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
    tracing::info!(log_dir = %dir.display(), "file logging enabled");
    Some(guard)
}
