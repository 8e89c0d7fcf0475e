//! Usage: OAuth token pair value and the observable credential state of a session.

pub(crate) const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Immutable credential value. A refresh produces a new pair; the old one is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenPair {
    pub(crate) access_token: String,
    pub(crate) refresh_token: Option<String>,
    pub(crate) token_type: String,
    pub(crate) expires_in: Option<i64>,
    pub(crate) expires_at: Option<i64>,
}

impl TokenPair {
    pub(crate) fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        token_type: Option<String>,
    ) -> Option<Self> {
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return None;
        }
        let refresh_token = refresh_token
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let token_type = token_type
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        Some(Self {
            access_token,
            refresh_token,
            token_type,
            expires_in: None,
            expires_at: None,
        })
    }

    pub(crate) fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub(crate) fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Pair produced by a refresh grant; the old refresh token survives when the server omits one.
    pub(crate) fn rotated(&self, next: TokenPair) -> TokenPair {
        TokenPair {
            refresh_token: next.refresh_token.or_else(|| self.refresh_token.clone()),
            ..next
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenState {
    NoTokens,
    Valid,
    ExpiredNeedsRefresh,
    RefreshFailed,
}

impl TokenState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TokenState::NoTokens => "no_tokens",
            TokenState::Valid => "valid",
            TokenState::ExpiredNeedsRefresh => "expired_needs_refresh",
            TokenState::RefreshFailed => "refresh_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_access_token_is_rejected() {
        assert!(TokenPair::new("  ", None, None).is_none());
    }

    #[test]
    fn token_type_defaults_to_bearer() {
        let pair = TokenPair::new("abc", Some(" ".to_string()), None).expect("pair");
        assert_eq!(pair.authorization_value(), "Bearer abc");
        assert!(!pair.can_refresh());
    }

    #[test]
    fn rotation_keeps_previous_refresh_token_when_omitted() {
        let old = TokenPair::new("old", Some("refresh-1".to_string()), None).expect("pair");
        let next = TokenPair::new("new", None, Some("bearer".to_string())).expect("pair");
        let rotated = old.rotated(next);
        assert_eq!(rotated.access_token, "new");
        assert_eq!(rotated.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(rotated.token_type, "bearer");
        assert_eq!(old.access_token, "old");
    }
}
