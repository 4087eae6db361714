use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::types::auth::{AuthToken, AuthUser};
use ematch_shared::types::ApiResponse;

use crate::models::{Credential, NewCredential, NewProfile, Profile};
use crate::schema::{credentials, profiles};
use crate::services::{auth_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create the credential and its empty profile
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<AuthToken>>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    auth_service::validate_password(&req.password)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let email = req.email.to_lowercase();

    let exists: bool = credentials::table
        .filter(credentials::email.eq(&email))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if exists {
        return Err(AppError::new(
            ErrorCode::EmailAlreadyExists,
            "an account with this email already exists",
        ));
    }

    let new_credential = NewCredential {
        email,
        password_hash: auth_service::hash_password(&req.password)?,
    };

    let credential = diesel::insert_into(credentials::table)
        .values(&new_credential)
        .get_result::<Credential>(&mut conn)?;

    // Profile is created on first authentication, empty until onboarding
    diesel::insert_into(profiles::table)
        .values(&NewProfile::for_credential(credential.id))
        .execute(&mut conn)?;

    tracing::info!(credential_id = %credential.id, "user registered");

    let token = token_service::create_auth_token(
        credential.id,
        &state.config.jwt_secret,
        state.config.token_ttl_secs,
    )?;

    Ok(Json(ApiResponse::ok(token)))
}

/// POST /auth/login - email+password to bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthToken>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let credential: Credential = credentials::table
        .filter(credentials::email.eq(req.email.to_lowercase()))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    let valid = auth_service::verify_password(&req.password, &credential.password_hash)?;
    if !valid {
        return Err(AppError::new(
            ErrorCode::InvalidCredentials,
            "invalid email or password",
        ));
    }

    let token = token_service::create_auth_token(
        credential.id,
        &state.config.jwt_secret,
        state.config.token_ttl_secs,
    )?;

    tracing::info!(user_id = %credential.id, "user logged in");

    Ok(Json(ApiResponse::ok(token)))
}

/// GET /auth/me - resolve the caller's profile from the token
pub async fn me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::credential_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}
