//! Scope authorization gates.
//!
//! A [`ScopeGate`] is attached to a route at registration time and checks the
//! scopes the authenticator granted against the route's required list. The
//! reserved wildcard scope grants blanket access under either policy.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;

use crate::context::RequestContext;
use crate::utils::http_helpers::HandlerError;

/// The reserved scope value granting blanket access.
pub const WILDCARD_SCOPE: &str = "*";

/// How a gate combines its required scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePolicy {
    /// Pass when at least one required scope was granted.
    Any,
    /// Pass only when every required scope was granted.
    All,
}

/// Why a gate refused a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// The gate ran without a prior successful authentication stage. This is
    /// a wiring bug upstream, not a legitimate denial; it still maps to the
    /// same external 401.
    #[error("context does not have scope set")]
    MissingScopes,
    /// The caller is authenticated but the granted scopes do not satisfy the
    /// policy.
    #[error("granted scopes do not satisfy the required scopes")]
    Denied,
}

impl ScopeError {
    pub fn to_handler_error(&self) -> HandlerError {
        match self {
            ScopeError::MissingScopes => {
                HandlerError::invalid_scope("context does not have scope set")
            }
            ScopeError::Denied => HandlerError::unauthorized(),
        }
    }
}

/// A per-route scope check.
#[derive(Clone)]
pub struct ScopeGate {
    policy: ScopePolicy,
    required: Arc<[String]>,
}

impl ScopeGate {
    /// Pass if any of `required` was granted.
    pub fn any<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeGate {
            policy: ScopePolicy::Any,
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Pass only if all of `required` were granted.
    pub fn all<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeGate {
            policy: ScopePolicy::All,
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluates the policy against the scopes found in context.
    pub fn evaluate(&self, granted: Option<&[String]>) -> Result<(), ScopeError> {
        let granted = granted.ok_or(ScopeError::MissingScopes)?;

        if granted.iter().any(|s| s == WILDCARD_SCOPE) {
            return Ok(());
        }

        let permitted = match self.policy {
            ScopePolicy::Any => self.required.iter().any(|r| granted.contains(r)),
            ScopePolicy::All => self.required.iter().all(|r| granted.contains(r)),
        };

        if permitted {
            Ok(())
        } else {
            Err(ScopeError::Denied)
        }
    }

    /// Middleware entry point: refuse the request before the wrapped handler
    /// runs when the policy is not satisfied.
    pub async fn handle(&self, req: Request, next: Next) -> Response {
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();

        match self.evaluate(ctx.scopes()) {
            Ok(()) => next.run(req).await,
            Err(err) => err.to_handler_error().into_response_with(ctx.request_id()),
        }
    }
}
