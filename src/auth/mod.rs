//! Authentication pipeline.
//!
//! An `Authenticator` drives an ordered list of [`AuthHandler`]s. Handlers
//! are tried in the order they were registered; the first success
//! short-circuits the scan and installs the enriched [`RequestContext`] into
//! the request. When every handler fails, only the last handler's error is
//! surfaced to the caller; earlier failures are available in the logs.

pub mod scopes;
pub mod static_token;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;
use tracing::debug;

use crate::context::RequestContext;
use crate::utils::http_helpers::{abbreviate_token, HandlerError};

/// The result of a successful authentication attempt: the raw bearer token
/// and the scopes it grants.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub token: String,
    pub scopes: Vec<String>,
}

/// The ways a single handler can refuse a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The Authorization header is absent or does not use the Bearer scheme.
    #[error("authorization type 'Bearer ' is missing")]
    InvalidScheme,
    /// The credentials were well-formed but not recognized. Deliberately
    /// carries no detail so error responses cannot be used to enumerate
    /// tokens.
    #[error("credentials not recognized")]
    Unauthenticated,
}

impl AuthError {
    pub fn to_handler_error(&self) -> HandlerError {
        match self {
            AuthError::InvalidScheme => {
                HandlerError::invalid_scope("Authorization Type 'Bearer ' is missing")
            }
            AuthError::Unauthenticated => HandlerError::unauthorized(),
        }
    }
}

/// A single authentication strategy. A handler inspects the request headers
/// and either produces an [`AuthOutcome`] or fails with an [`AuthError`];
/// there is no partial state.
#[async_trait::async_trait]
pub trait AuthHandler: Send + Sync {
    /// A descriptive name for the handler (for logs/debug).
    fn name(&self) -> &str;

    /// Decides whether the request is authenticated.
    async fn authenticate(&self, headers: &http::HeaderMap) -> Result<AuthOutcome, AuthError>;
}

/// Orchestrates an ordered chain of auth handlers.
pub struct Authenticator {
    handlers: Vec<Box<dyn AuthHandler>>,
}

impl Authenticator {
    /// Creates a new chain. Order is caller-specified and preserved; the
    /// list is not sorted or deduplicated. An empty chain rejects every
    /// request.
    pub fn new(handlers: Vec<Box<dyn AuthHandler>>) -> Self {
        Authenticator { handlers }
    }

    /// Runs the chain against the request headers.
    ///
    /// Returns the first successful outcome, or the last handler's error
    /// when every handler failed (`None` for an empty chain).
    pub async fn authenticate(
        &self,
        headers: &http::HeaderMap,
    ) -> Result<AuthOutcome, Option<AuthError>> {
        let mut last_error = None;
        for handler in &self.handlers {
            match handler.authenticate(headers).await {
                Ok(outcome) => {
                    debug!(
                        handler = handler.name(),
                        token = %abbreviate_token(&outcome.token),
                        "authentication succeeded"
                    );
                    return Ok(outcome);
                }
                Err(err) => {
                    debug!(handler = handler.name(), error = %err, "handler rejected request");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error)
    }

    /// Middleware entry point. On success the request carries a derived
    /// context with the token and scopes bound; on failure the error
    /// envelope is written immediately and the wrapped handler never runs.
    pub async fn handle(&self, mut req: Request, next: Next) -> Response {
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();

        match self.authenticate(req.headers()).await {
            Ok(outcome) => {
                let enriched = ctx.with_auth(outcome.token, outcome.scopes);
                req.extensions_mut().insert(enriched);
                next.run(req).await
            }
            Err(last_error) => {
                let handler_error = last_error
                    .map(|e| e.to_handler_error())
                    .unwrap_or_else(HandlerError::unauthorized);
                handler_error.into_response_with(ctx.request_id())
            }
        }
    }
}
