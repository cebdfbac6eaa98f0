//! Ice-cream record endpoints.
//!
//! Each route declares its required scopes at registration time; the gate
//! runs after the authenticator and before the handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put, MethodRouter};
use axum::{Json, Router};

use crate::auth::scopes::ScopeGate;
use crate::context::RequestContext;
use crate::models::IceCream;
use crate::state::AppState;
use crate::utils::http_helpers::HandlerError;

const API_V1: &str = "/api/v1";

/// Registers the record routes with their scope gates.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/create", API_V1),
            gated(post(create_ice_cream), ScopeGate::any(["post.icecream"])),
        )
        .route(
            &format!("{}/read", API_V1),
            gated(get(list_ice_creams), ScopeGate::any(["read.icecream"])),
        )
        .route(
            &format!("{}/read/:name", API_V1),
            gated(get(get_ice_cream), ScopeGate::any(["read.icecream"])),
        )
        .route(
            &format!("{}/update", API_V1),
            gated(put(update_ice_cream), ScopeGate::any(["post.icecream"])),
        )
        .route(
            &format!("{}/delete/:name", API_V1),
            gated(delete(delete_ice_cream), ScopeGate::any(["delete.icecream"])),
        )
}

/// Wraps a method router with a scope gate.
fn gated(method_router: MethodRouter<AppState>, gate: ScopeGate) -> MethodRouter<AppState> {
    method_router.route_layer(middleware::from_fn(move |req: Request, next: Next| {
        let gate = gate.clone();
        async move { gate.handle(req, next).await }
    }))
}

async fn create_ice_cream(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<IceCream>, JsonRejection>,
) -> Result<impl IntoResponse, Response> {
    let Json(ice_cream) = payload
        .map_err(|e| format_error(&ctx, e))?;

    state
        .store
        .create(&ctx, ice_cream)
        .await
        .map_err(|e| unexpected(&ctx, e))?;

    Ok((StatusCode::CREATED, Json("")))
}

async fn get_ice_cream(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let ice_cream = state
        .store
        .get(&ctx, &name)
        .await
        .map_err(|e| unexpected(&ctx, e))?
        .ok_or_else(|| {
            HandlerError::not_found(format!("Icecream: {} Not Found", name))
                .into_response_with(ctx.request_id())
        })?;

    Ok(Json(ice_cream))
}

async fn list_ice_creams(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, Response> {
    let ice_creams = state
        .store
        .get_all(&ctx)
        .await
        .map_err(|e| unexpected(&ctx, e))?;

    Ok(Json(ice_creams))
}

async fn update_ice_cream(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<IceCream>, JsonRejection>,
) -> Result<impl IntoResponse, Response> {
    let Json(ice_cream) = payload
        .map_err(|e| format_error(&ctx, e))?;

    state
        .store
        .update(&ctx, ice_cream)
        .await
        .map_err(|e| unexpected(&ctx, e))?;

    Ok((StatusCode::OK, Json("")))
}

async fn delete_ice_cream(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, Response> {
    state
        .store
        .delete(&ctx, &name)
        .await
        .map_err(|e| unexpected(&ctx, e))?;

    Ok((StatusCode::OK, Json("")))
}

fn format_error(ctx: &RequestContext, rejection: JsonRejection) -> Response {
    HandlerError::format_error(format!("invalid input format. error: {}", rejection))
        .into_response_with(ctx.request_id())
}

fn unexpected(ctx: &RequestContext, err: impl std::fmt::Display) -> Response {
    HandlerError::unexpected(err.to_string()).into_response_with(ctx.request_id())
}
