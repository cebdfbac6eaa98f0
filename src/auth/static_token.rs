//! Static-token authentication.
//!
//! Looks bearer tokens up in the immutable token table loaded at startup.
//! The scheme check happens before any table lookup, and an unknown token
//! produces a generic failure with no detail.

use http::HeaderMap;

use crate::auth::{AuthError, AuthHandler, AuthOutcome};
use crate::config::TokenTable;

const BEARER_PREFIX: &str = "Bearer ";

/// An [`AuthHandler`] backed by the static token table.
pub struct StaticTokenHandler {
    token_table: TokenTable,
}

impl StaticTokenHandler {
    pub fn new(token_table: TokenTable) -> Self {
        StaticTokenHandler { token_table }
    }
}

#[async_trait::async_trait]
impl AuthHandler for StaticTokenHandler {
    fn name(&self) -> &str {
        "static-token"
    }

    async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthOutcome, AuthError> {
        let header = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        // The prefix match is exact and case-sensitive, single space.
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::InvalidScheme)?;

        match self.token_table.scopes_for(token) {
            Some(scopes) => Ok(AuthOutcome {
                token: token.to_string(),
                scopes: scopes.to_vec(),
            }),
            None => Err(AuthError::Unauthenticated),
        }
    }
}
