//! HTTP route definitions and handlers.
//!
//! Middleware ordering, outermost first: request context (request id) ->
//! trace -> authenticator -> per-route scope gate -> handler.

mod health_routes;
mod icecream_routes;

use std::sync::Arc;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::Authenticator;
use crate::context::RequestContext;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState, authenticator: Arc<Authenticator>) -> Router {
    let auth = authenticator.clone();
    let protected = icecream_routes::routes().route_layer(middleware::from_fn(
        move |req: Request, next: Next| {
            let auth = auth.clone();
            async move { auth.handle(req, next).await }
        },
    ));

    Router::new()
        .merge(protected)
        .merge(health_routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context_middleware))
        .with_state(state)
}

/// Installs a fresh [`RequestContext`] into every request, honoring an
/// inbound request id header when present, and echoes the id back on the
/// response.
async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut()
        .insert(RequestContext::new(&request_id));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
