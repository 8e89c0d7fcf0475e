//! Usage: OAuth2 authorization code + PKCE flow and token lifecycle against the Fanvue auth server.

pub(crate) mod authorize;
pub(crate) mod pkce;
pub(crate) mod token_exchange;
pub(crate) mod token_manager;
pub(crate) mod tokens;
