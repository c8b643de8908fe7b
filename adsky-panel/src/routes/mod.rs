//! HTTP routes for the panel

mod account;
mod admin;
mod links;
mod session;
mod user;

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::email::EmailSender;
use crate::error::PanelError;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

pub use session::SESSION_COOKIE;
pub use user::UserOperation;

/// Create the router with all routes
pub fn create_router<U, S, E>(state: Arc<AppState<U, S, E>>) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    E: EmailSender + 'static,
{
    Router::new()
        .route("/api/user/:operation", any(user::dispatch))
        .route(
            "/api/ad/:operation",
            any(|| async { PanelError::OperationNotFound("Ad") }),
        )
        .route(
            "/api/plugin/:operation",
            any(|| async { PanelError::OperationNotFound("Plugin") }),
        )
        .route(
            "/email/confirm/:selector/:secret",
            get(links::confirm_registration),
        )
        .route(
            "/email/reset/:email/:selector/:secret",
            get(links::confirm_reset),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new()),
        )
        .with_state(state)
}
