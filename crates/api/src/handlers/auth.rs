//! Handlers for the `/auth` resource: registration, email verification,
//! login, and current-identity lookup.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use proofroom_core::error::CoreError;
use proofroom_core::roles::is_valid_role;
use proofroom_db::models::user::{CreateUser, UserResponse};
use proofroom_db::repositories::UserRepo;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// `"photographer"` or `"client"`. Fixed for the account's lifetime.
    pub role: String,
    pub display_name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Compute the SHA-256 hex digest of a verification token.
///
/// Only the digest is stored, so a database leak does not let anyone
/// verify accounts they don't control.
fn hash_verification_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// POST /api/v1/auth/register
///
/// Create an account and send the verification email. The account cannot
/// log in until the emailed link is followed.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    if !payload.email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "A valid email address is required".into(),
        )));
    }
    if !is_valid_role(&payload.role) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown role: '{}'",
            payload.role
        ))));
    }
    validate_password_strength(&payload.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&payload.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let token = Uuid::new_v4().to_string();
    let input = CreateUser {
        email: payload.email.trim().to_lowercase(),
        password_hash,
        role: payload.role,
        display_name: payload.display_name,
        phone: payload.phone,
        verification_token: hash_verification_token(&token),
    };
    let user = UserRepo::create(&state.pool, &input).await?;

    let verify_url = format!(
        "{}/api/v1/auth/verify?token={token}",
        state.config.public_base_url
    );
    match &state.mailer {
        Some(mailer) => {
            if let Err(e) = mailer.send_verification(&user.email, &verify_url).await {
                // The account exists either way; the user can ask for the
                // link again through support.
                tracing::error!(error = %e, email = %user.email, "Verification email failed");
            }
        }
        None => {
            tracing::info!(email = %user.email, %verify_url, "SMTP not configured; verification link logged");
        }
    }

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/auth/verify?token=...
///
/// Consume a verification token and activate the account.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let token_hash = hash_verification_token(&params.token);
    match UserRepo::verify_email(&state.pool, &token_hash).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, "Email verified");
            Ok(Json(serde_json::json!({ "verified": true })))
        }
        None => Err(AppError::Core(CoreError::Validation(
            "Invalid or already-used verification link".into(),
        ))),
    }
}

/// POST /api/v1/auth/login
///
/// Verify credentials and issue an access token. Unverified accounts are
/// rejected: the verification gate in front of everything else.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
        })?;

    let matches = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !matches {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        )));
    }

    if !user.email_verified {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Email not verified. Follow the link in your confirmation email first".into(),
        )));
    }

    let access_token = generate_access_token(user.id, &user.role, &user.email, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: user.into(),
    }))
}

/// GET /api/v1/auth/me
///
/// Current-identity lookup for the bearer of the token.
pub async fn me(
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
