//! Usage: Authorization redirect building and callback validation for the code + PKCE flow.

use crate::shared::error::AppResult;
use crate::shared::security::constant_time_eq;
use reqwest::Url;

#[derive(Debug, Clone)]
pub(crate) struct AuthorizeRequest<'a> {
    pub(crate) authorize_endpoint: &'a str,
    pub(crate) client_id: &'a str,
    pub(crate) redirect_uri: &'a str,
    pub(crate) scopes: &'a str,
    pub(crate) state: &'a str,
    pub(crate) code_challenge: &'a str,
}

pub(crate) fn build_authorize_url(req: &AuthorizeRequest<'_>) -> AppResult<String> {
    let mut url = Url::parse(req.authorize_endpoint.trim())
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid authorize endpoint: {e}"))?;
    url.query_pairs_mut()
        .append_pair("client_id", req.client_id)
        .append_pair("redirect_uri", req.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", req.scopes)
        .append_pair("state", req.state)
        .append_pair("code_challenge", req.code_challenge)
        .append_pair("code_challenge_method", "S256");
    Ok(url.to_string())
}

/// Redirect reason reported to the dashboard when the callback cannot complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallbackRejection {
    ProviderError,
    InvalidState,
    MissingParameters,
    MissingVerifier,
}

impl CallbackRejection {
    pub(crate) fn as_query_value(self) -> &'static str {
        match self {
            CallbackRejection::ProviderError => "oauth_error",
            CallbackRejection::InvalidState => "invalid_state",
            CallbackRejection::MissingParameters => "missing_parameters",
            CallbackRejection::MissingVerifier => "missing_verifier",
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub(crate) struct CallbackParams {
    pub(crate) code: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) error_description: Option<String>,
}

/// Verified inputs for the code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VerifiedCallback {
    pub(crate) code: String,
    pub(crate) code_verifier: String,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Checks provider error, parameters, state (constant time) and verifier, in that order.
/// Nothing is exchanged unless this returns `Ok`.
pub(crate) fn verify_callback(
    params: &CallbackParams,
    stored_state: Option<&str>,
    stored_verifier: Option<&str>,
) -> Result<VerifiedCallback, CallbackRejection> {
    if present(params.error.as_deref()).is_some() {
        return Err(CallbackRejection::ProviderError);
    }
    let (Some(code), Some(state)) = (
        present(params.code.as_deref()),
        present(params.state.as_deref()),
    ) else {
        return Err(CallbackRejection::MissingParameters);
    };
    let Some(expected) = present(stored_state) else {
        return Err(CallbackRejection::InvalidState);
    };
    if !constant_time_eq(state.as_bytes(), expected.as_bytes()) {
        return Err(CallbackRejection::InvalidState);
    }
    let Some(code_verifier) = present(stored_verifier) else {
        return Err(CallbackRejection::MissingVerifier);
    };
    Ok(VerifiedCallback {
        code: code.to_string(),
        code_verifier: code_verifier.to_string(),
    })
}
