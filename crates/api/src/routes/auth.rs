//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register  -> register
/// GET  /verify    -> verify      (?token=...)
/// POST /login     -> login
/// GET  /me        -> me
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify", get(auth::verify))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
}
