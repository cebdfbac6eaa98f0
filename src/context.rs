//! Per-request execution context.
//!
//! A `RequestContext` carries the request-scoped values the middleware chain
//! and the storage layer agree on: the request id, the authenticated bearer
//! token, the granted scopes, and an optional active database transaction.
//! Every derivation (`with_auth`, `with_transaction`) produces a new context
//! and leaves the parent untouched, so a failed authentication attempt can be
//! retried against the next handler without unwinding anything.

use std::fmt;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

use crate::utils::http_helpers::HandlerError;

/// A shared handle to an open database transaction.
///
/// The inner `Option` is taken exactly once, by the `with_transaction` call
/// that opened it, when it commits or rolls back. Data-access code only ever
/// locks the mutex long enough to run a single statement.
pub type TxHandle = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// Request-scoped value carrier, threaded through every downstream call.
#[derive(Clone, Default)]
pub struct RequestContext {
    request_id: String,
    auth_token: Option<String>,
    scopes: Option<Vec<String>>,
    transaction: Option<TxHandle>,
}

impl RequestContext {
    /// Creates a fresh context for a new request.
    pub fn new(request_id: impl Into<String>) -> Self {
        RequestContext {
            request_id: request_id.into(),
            ..Default::default()
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The bearer token, present only after successful authentication.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// The granted scopes, present only after successful authentication.
    pub fn scopes(&self) -> Option<&[String]> {
        self.scopes.as_deref()
    }

    /// The active transaction bound by the nearest enclosing
    /// `with_transaction`, if any.
    pub fn transaction(&self) -> Option<&TxHandle> {
        self.transaction.as_ref()
    }

    /// Derives a new context carrying the authenticated token and scopes.
    pub fn with_auth(&self, token: impl Into<String>, scopes: Vec<String>) -> Self {
        RequestContext {
            auth_token: Some(token.into()),
            scopes: Some(scopes),
            ..self.clone()
        }
    }

    /// Derives a new context with an active transaction bound to it.
    pub fn with_transaction(&self, tx: TxHandle) -> Self {
        RequestContext {
            transaction: Some(tx),
            ..self.clone()
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("auth_token", &self.auth_token.as_deref().map(|_| "<redacted>"))
            .field("scopes", &self.scopes)
            .field("transaction", &self.transaction.is_some())
            .finish()
    }
}

/// Extractor implementation: handlers receive the context the middleware
/// chain installed into the request extensions. A missing context means the
/// route was wired up without the context middleware.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("request context missing from extensions");
                HandlerError::unexpected("request context not initialized")
            })
    }
}
