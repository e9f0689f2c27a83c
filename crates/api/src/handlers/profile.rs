//! Handlers for the `/profile` resource.
//!
//! Name and phone are the only mutable fields; email and role are fixed at
//! registration.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use proofroom_core::error::CoreError;
use proofroom_db::models::user::{UpdateProfile, UserResponse};
use proofroom_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    if let Some(name) = &payload.display_name {
        if name.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Display name must not be empty".into(),
            )));
        }
    }

    let updated = UserRepo::update_profile(
        &state.pool,
        user.user_id,
        &UpdateProfile {
            display_name: payload.display_name,
            phone: payload.phone,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "User",
        id: user.user_id,
    }))?;

    Ok(Json(updated.into()))
}
