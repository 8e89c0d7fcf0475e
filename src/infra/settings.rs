//! Usage: Service settings (schema, TOML file + environment overlay, bounds sanitizing).

use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "FANVUE_HUB_CONFIG";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_API_BASE_URL: &str = "https://api.fanvue.com";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.fanvue.com";
pub const DEFAULT_API_VERSION: &str = "2025-06-26";
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:3000";
pub const DEFAULT_OAUTH_SCOPES: &str = "openid offline_access offline read:self read:chat \
     read:creator read:fan read:insights read:media";
pub const DEFAULT_RATE_LIMIT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RATE_LIMIT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 100;
pub const DEFAULT_FANOUT_BATCH_SIZE: u32 = 3;
pub const DEFAULT_FANOUT_BATCH_DELAY_MS: u64 = 2_000;
pub const DEFAULT_UPSTREAM_REQUEST_TIMEOUT_SECONDS: u32 = 30;
pub const DEFAULT_REFRESH_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_REFRESH_RETRY_BASE_DELAY_MS: u64 = 2_000;
const DEFAULT_SECURE_COOKIES: bool = true;
const MAX_RATE_LIMIT_MAX_RETRIES: u32 = 10;
const MAX_RATE_LIMIT_BASE_DELAY_MS: u64 = 60_000;
const MAX_PAGE_DELAY_MS: u64 = 10_000;
const MAX_FANOUT_BATCH_SIZE: u32 = 20;
const MAX_FANOUT_BATCH_DELAY_MS: u64 = 60_000;
const MAX_UPSTREAM_REQUEST_TIMEOUT_SECONDS: u32 = 10 * 60;
const MAX_REFRESH_MAX_ATTEMPTS: u32 = 10;
const MAX_REFRESH_RETRY_BASE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // Listen address input (host, host:port or [ipv6]:port).
    pub listen_addr: String,
    pub dashboard_url: String,
    pub api_base_url: String,
    pub auth_base_url: String,
    pub api_version: String,
    pub api_key: Option<String>,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
    pub oauth_redirect_uri: Option<String>,
    pub oauth_scopes: String,
    pub powerbi_api_key: Option<String>,
    // Static pair used by the Power BI service routes.
    pub service_access_token: Option<String>,
    pub service_refresh_token: Option<String>,
    pub secure_cookies: bool,
    pub log_dir: Option<PathBuf>,
    pub rate_limit_max_retries: u32,
    pub rate_limit_base_delay_ms: u64,
    pub page_delay_ms: u64,
    pub fanout_batch_size: u32,
    pub fanout_batch_delay_ms: u64,
    pub upstream_request_timeout_seconds: u32,
    pub refresh_max_attempts: u32,
    pub refresh_retry_base_delay_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            oauth_client_id: None,
            oauth_client_secret: None,
            oauth_redirect_uri: None,
            oauth_scopes: DEFAULT_OAUTH_SCOPES.to_string(),
            powerbi_api_key: None,
            service_access_token: None,
            service_refresh_token: None,
            secure_cookies: DEFAULT_SECURE_COOKIES,
            log_dir: None,
            rate_limit_max_retries: DEFAULT_RATE_LIMIT_MAX_RETRIES,
            rate_limit_base_delay_ms: DEFAULT_RATE_LIMIT_BASE_DELAY_MS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            fanout_batch_size: DEFAULT_FANOUT_BATCH_SIZE,
            fanout_batch_delay_ms: DEFAULT_FANOUT_BATCH_DELAY_MS,
            upstream_request_timeout_seconds: DEFAULT_UPSTREAM_REQUEST_TIMEOUT_SECONDS,
            refresh_max_attempts: DEFAULT_REFRESH_MAX_ATTEMPTS,
            refresh_retry_base_delay_ms: DEFAULT_REFRESH_RETRY_BASE_DELAY_MS,
        }
    }
}

/// Client id, secret and redirect URI, all present and non-empty.
#[derive(Debug, Clone)]
pub(crate) struct OAuthClientConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AppSettings {
    pub(crate) fn api_key(&self) -> Option<&str> {
        non_empty(self.api_key.as_deref())
    }

    pub(crate) fn powerbi_api_key(&self) -> Option<&str> {
        non_empty(self.powerbi_api_key.as_deref())
    }

    pub(crate) fn service_access_token(&self) -> Option<&str> {
        non_empty(self.service_access_token.as_deref())
    }

    pub(crate) fn service_refresh_token(&self) -> Option<&str> {
        non_empty(self.service_refresh_token.as_deref())
    }

    pub(crate) fn oauth_client(&self) -> AppResult<OAuthClientConfig> {
        let client_id = non_empty(self.oauth_client_id.as_deref())
            .ok_or_else(|| "CONFIG_MISSING: FANVUE_OAUTH_CLIENT_ID is not set".to_string())?;
        let client_secret = non_empty(self.oauth_client_secret.as_deref())
            .ok_or_else(|| "CONFIG_MISSING: FANVUE_OAUTH_CLIENT_SECRET is not set".to_string())?;
        let redirect_uri = non_empty(self.oauth_redirect_uri.as_deref())
            .ok_or_else(|| "CONFIG_MISSING: FANVUE_OAUTH_REDIRECT_URI is not set".to_string())?;
        Ok(OAuthClientConfig {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
        })
    }

    pub(crate) fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/auth", self.auth_base_url.trim_end_matches('/'))
    }

    pub(crate) fn token_endpoint(&self) -> String {
        format!("{}/oauth2/token", self.auth_base_url.trim_end_matches('/'))
    }

    pub(crate) fn rate_limit_base_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_base_delay_ms)
    }

    pub(crate) fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub(crate) fn fanout_batch_delay(&self) -> Duration {
        Duration::from_millis(self.fanout_batch_delay_ms)
    }

    pub(crate) fn refresh_retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_retry_base_delay_ms)
    }

    pub(crate) fn upstream_request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.upstream_request_timeout_seconds))
    }
}

fn sanitize_retry_settings(settings: &mut AppSettings) -> bool {
    let mut changed = false;

    if settings.rate_limit_max_retries > MAX_RATE_LIMIT_MAX_RETRIES {
        settings.rate_limit_max_retries = MAX_RATE_LIMIT_MAX_RETRIES;
        changed = true;
    }
    if settings.rate_limit_base_delay_ms > MAX_RATE_LIMIT_BASE_DELAY_MS {
        settings.rate_limit_base_delay_ms = MAX_RATE_LIMIT_BASE_DELAY_MS;
        changed = true;
    }
    if settings.refresh_max_attempts == 0 {
        settings.refresh_max_attempts = DEFAULT_REFRESH_MAX_ATTEMPTS;
        changed = true;
    }
    if settings.refresh_max_attempts > MAX_REFRESH_MAX_ATTEMPTS {
        settings.refresh_max_attempts = MAX_REFRESH_MAX_ATTEMPTS;
        changed = true;
    }
    if settings.refresh_retry_base_delay_ms > MAX_REFRESH_RETRY_BASE_DELAY_MS {
        settings.refresh_retry_base_delay_ms = MAX_REFRESH_RETRY_BASE_DELAY_MS;
        changed = true;
    }

    changed
}

fn sanitize_fanout_settings(settings: &mut AppSettings) -> bool {
    let mut changed = false;

    if settings.page_delay_ms > MAX_PAGE_DELAY_MS {
        settings.page_delay_ms = MAX_PAGE_DELAY_MS;
        changed = true;
    }
    if settings.fanout_batch_size == 0 {
        settings.fanout_batch_size = DEFAULT_FANOUT_BATCH_SIZE;
        changed = true;
    }
    if settings.fanout_batch_size > MAX_FANOUT_BATCH_SIZE {
        settings.fanout_batch_size = MAX_FANOUT_BATCH_SIZE;
        changed = true;
    }
    if settings.fanout_batch_delay_ms > MAX_FANOUT_BATCH_DELAY_MS {
        settings.fanout_batch_delay_ms = MAX_FANOUT_BATCH_DELAY_MS;
        changed = true;
    }

    changed
}

fn sanitize_network_settings(settings: &mut AppSettings) -> bool {
    let mut changed = false;

    if settings.upstream_request_timeout_seconds == 0 {
        settings.upstream_request_timeout_seconds = DEFAULT_UPSTREAM_REQUEST_TIMEOUT_SECONDS;
        changed = true;
    }
    if settings.upstream_request_timeout_seconds > MAX_UPSTREAM_REQUEST_TIMEOUT_SECONDS {
        settings.upstream_request_timeout_seconds = MAX_UPSTREAM_REQUEST_TIMEOUT_SECONDS;
        changed = true;
    }
    for (value, default) in [
        (&mut settings.api_base_url, DEFAULT_API_BASE_URL),
        (&mut settings.auth_base_url, DEFAULT_AUTH_BASE_URL),
        (&mut settings.api_version, DEFAULT_API_VERSION),
        (&mut settings.dashboard_url, DEFAULT_DASHBOARD_URL),
        (&mut settings.oauth_scopes, DEFAULT_OAUTH_SCOPES),
    ] {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            *value = default.to_string();
            changed = true;
        } else if trimmed.len() != value.len() {
            *value = trimmed.to_string();
            changed = true;
        }
    }

    changed
}

/// Clamps tuning knobs into their bounds; returns whether anything was rewritten.
pub fn sanitize(settings: &mut AppSettings) -> bool {
    let retry = sanitize_retry_settings(settings);
    let fanout = sanitize_fanout_settings(settings);
    let network = sanitize_network_settings(settings);
    retry || fanout || network
}

pub fn read_file(path: &Path) -> AppResult<AppSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        format!(
            "SYSTEM_ERROR: failed to read settings file {}: {e}",
            path.display()
        )
    })?;
    let settings: AppSettings = toml::from_str(&content).map_err(|e| {
        format!(
            "SEC_INVALID_INPUT: invalid settings file {}: {e}",
            path.display()
        )
    })?;
    Ok(settings)
}

/// Overlays environment variables on top of `settings`. `lookup` is `std::env::var` in production.
pub fn apply_env_overrides(settings: &mut AppSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let optional: [(&str, &mut Option<String>); 7] = [
        ("FANVUE_API_KEY", &mut settings.api_key),
        ("FANVUE_OAUTH_CLIENT_ID", &mut settings.oauth_client_id),
        ("FANVUE_OAUTH_CLIENT_SECRET", &mut settings.oauth_client_secret),
        ("FANVUE_OAUTH_REDIRECT_URI", &mut settings.oauth_redirect_uri),
        ("POWERBI_API_KEY", &mut settings.powerbi_api_key),
        ("SERVICE_ACCESS_TOKEN", &mut settings.service_access_token),
        ("SERVICE_REFRESH_TOKEN", &mut settings.service_refresh_token),
    ];
    for (key, slot) in optional {
        if let Some(value) = read(key) {
            *slot = Some(value);
        }
    }

    let required: [(&str, &mut String); 6] = [
        ("FANVUE_API_VERSION", &mut settings.api_version),
        ("FANVUE_API_BASE_URL", &mut settings.api_base_url),
        ("FANVUE_AUTH_BASE_URL", &mut settings.auth_base_url),
        ("DASHBOARD_URL", &mut settings.dashboard_url),
        ("HUB_LISTEN_ADDR", &mut settings.listen_addr),
        ("FANVUE_OAUTH_SCOPES", &mut settings.oauth_scopes),
    ];
    for (key, slot) in required {
        if let Some(value) = read(key) {
            *slot = value;
        }
    }

    if let Some(dir) = read("HUB_LOG_DIR") {
        settings.log_dir = Some(PathBuf::from(dir));
    }
    if let Some(raw) = read("HUB_SECURE_COOKIES") {
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => settings.secure_cookies = true,
            "0" | "false" | "no" => settings.secure_cookies = false,
            _ => tracing::warn!(value = %raw, "ignoring unrecognized HUB_SECURE_COOKIES value"),
        }
    }
}

/// File (when `FANVUE_HUB_CONFIG` points at one), then environment, then bounds.
pub fn load() -> AppResult<AppSettings> {
    let mut settings = match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => read_file(Path::new(&path))?,
        _ => AppSettings::default(),
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    if sanitize(&mut settings) {
        tracing::info!("settings adjusted into supported bounds");
    }
    Ok(settings)
}
