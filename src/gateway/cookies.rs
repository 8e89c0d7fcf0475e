//! Usage: Browser cookie storage for the OAuth token pair and the pending PKCE handshake.

use crate::oauth::tokens::TokenPair;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use std::collections::HashMap;

pub(crate) const ACCESS_TOKEN_COOKIE: &str = "fanvue_access_token";
pub(crate) const REFRESH_TOKEN_COOKIE: &str = "fanvue_refresh_token";
pub(crate) const TOKEN_TYPE_COOKIE: &str = "fanvue_token_type";
pub(crate) const CODE_VERIFIER_COOKIE: &str = "oauth_code_verifier";
pub(crate) const STATE_COOKIE: &str = "oauth_state";

const ACCESS_TOKEN_DEFAULT_MAX_AGE: i64 = 3600;
const LONG_LIVED_MAX_AGE: i64 = 30 * 24 * 60 * 60;
pub(crate) const PKCE_MAX_AGE: i64 = 600;

/// Cookies sent with one request. Later duplicates win.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestCookies {
    values: HashMap<String, String>,
}

impl RequestCookies {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = HashMap::new();
        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                values.insert(name.to_string(), value.trim().trim_matches('"').to_string());
            }
        }
        Self { values }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `None` without an access token.
    pub(crate) fn token_pair(&self) -> Option<TokenPair> {
        TokenPair::new(
            self.get(ACCESS_TOKEN_COOKIE)?,
            self.get(REFRESH_TOKEN_COOKIE).map(str::to_string),
            self.get(TOKEN_TYPE_COOKIE).map(str::to_string),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SetCookie {
    pub(crate) name: &'static str,
    pub(crate) value: String,
    pub(crate) max_age: i64,
}

impl SetCookie {
    pub(crate) fn new(name: &'static str, value: impl Into<String>, max_age: i64) -> Self {
        Self {
            name,
            value: value.into(),
            max_age,
        }
    }

    pub(crate) fn expired(name: &'static str) -> Self {
        Self::new(name, "", 0)
    }

    /// Writes the value as-is. Values are expected to be URL-safe tokens (base64url, JWT or
    /// opaque ASCII); anything else fails header validation in `append_set_cookies`.
    pub(crate) fn render(&self, secure: bool) -> String {
        let mut out = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.name, self.value, self.max_age
        );
        if secure {
            out.push_str("; Secure");
        }
        out
    }
}

pub(crate) fn token_cookies(pair: &TokenPair) -> Vec<SetCookie> {
    let access_max_age = pair
        .expires_in
        .filter(|v| *v > 0)
        .unwrap_or(ACCESS_TOKEN_DEFAULT_MAX_AGE);
    let mut cookies = vec![SetCookie::new(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        access_max_age,
    )];
    if let Some(refresh) = &pair.refresh_token {
        cookies.push(SetCookie::new(
            REFRESH_TOKEN_COOKIE,
            refresh.clone(),
            LONG_LIVED_MAX_AGE,
        ));
    }
    cookies.push(SetCookie::new(
        TOKEN_TYPE_COOKIE,
        pair.token_type.clone(),
        LONG_LIVED_MAX_AGE,
    ));
    cookies
}

pub(crate) fn clear_token_cookies() -> Vec<SetCookie> {
    vec![
        SetCookie::expired(ACCESS_TOKEN_COOKIE),
        SetCookie::expired(REFRESH_TOKEN_COOKIE),
        SetCookie::expired(TOKEN_TYPE_COOKIE),
    ]
}

pub(crate) fn clear_pkce_cookies() -> Vec<SetCookie> {
    vec![
        SetCookie::expired(CODE_VERIFIER_COOKIE),
        SetCookie::expired(STATE_COOKIE),
    ]
}

/// Appends one `Set-Cookie` per entry and returns how many were written. A value that is not
/// valid header text is dropped with a warning.
pub(crate) fn append_set_cookies(
    headers: &mut HeaderMap,
    cookies: &[SetCookie],
    secure: bool,
) -> usize {
    let mut written = 0;
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.render(secure)) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
                written += 1;
            }
            Err(_) => {
                tracing::warn!(
                    cookie = cookie.name,
                    value_len = cookie.value.len(),
                    "cookie dropped: value is not valid header text"
                );
            }
        }
    }
    written
}
