use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::sanitize;
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::ApiResponse;

use crate::models::{Profile, UpdateProfile};
use crate::schema::profiles;
use crate::AppState;

const MAX_BIO_LEN: usize = 2000;
const MAX_FIELD_LEN: usize = 100;

fn load_own_profile(
    conn: &mut diesel::pg::PgConnection,
    credential_id: uuid::Uuid,
) -> AppResult<Profile> {
    profiles::table
        .filter(profiles::credential_id.eq(credential_id))
        .first::<Profile>(conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

// --- GET /profile ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let profile = load_own_profile(&mut conn, user.id)?;
    Ok(Json(ApiResponse::ok(profile)))
}

// --- PATCH /profile ---

/// Free-text fields are stripped of tags and clamped before the write.
fn sanitize_update(mut update: UpdateProfile) -> AppResult<UpdateProfile> {
    if let Some(ref age) = update.age {
        if *age < 18 || *age > 120 {
            return Err(AppError::Validation("age must be between 18 and 120".into()));
        }
    }

    if let (Some(min), Some(max)) = (update.age_min_pref, update.age_max_pref) {
        if min > max {
            return Err(AppError::Validation(
                "age preference minimum exceeds maximum".into(),
            ));
        }
    }

    if let Some(ref gender) = update.gender {
        if !matches!(gender.as_str(), "male" | "female") {
            return Err(AppError::Validation("gender must be male or female".into()));
        }
    }

    if let Some(ref interested_in) = update.interested_in {
        if !matches!(interested_in.as_str(), "male" | "female" | "both") {
            return Err(AppError::Validation(
                "interested_in must be male, female, or both".into(),
            ));
        }
    }

    update.display_name = update
        .display_name
        .map(|v| sanitize::clean_text(&v, MAX_FIELD_LEN));
    update.bio = update.bio.map(|v| sanitize::clean_text(&v, MAX_BIO_LEN));
    update.location = update.location.map(|v| sanitize::clean_text(&v, MAX_FIELD_LEN));
    update.nationality = update
        .nationality
        .map(|v| sanitize::clean_text(&v, MAX_FIELD_LEN));
    update.entrepreneur_type = update
        .entrepreneur_type
        .map(|v| sanitize::clean_text(&v, MAX_FIELD_LEN));
    update.business_stage = update
        .business_stage
        .map(|v| sanitize::clean_text(&v, MAX_FIELD_LEN));
    update.relationship_goals = update
        .relationship_goals
        .map(|v| sanitize::clean_text(&v, MAX_FIELD_LEN));

    Ok(update)
}

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateProfile>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let payload = sanitize_update(payload)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let profile = load_own_profile(&mut conn, user.id)?;

    let updated = diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set((&payload, profiles::updated_at.eq(chrono::Utc::now())))
        .get_result::<Profile>(&mut conn)?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- POST /profile/onboarding ---

#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    pub display_name: String,
    pub age: i32,
    pub gender: String,
    pub interested_in: Option<String>,
    pub location: Option<String>,
    pub nationality: Option<String>,
    pub entrepreneur_type: String,
    pub business_stage: String,
    pub looking_for: Vec<String>,
    pub interests: Vec<String>,
    pub relationship_goals: Option<String>,
    pub bio: Option<String>,
}

pub async fn complete_onboarding(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<OnboardingRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    if req.display_name.trim().is_empty() || req.display_name.len() > 50 {
        return Err(AppError::Validation(
            "display name must be between 1 and 50 characters".into(),
        ));
    }
    if req.age < 18 || req.age > 120 {
        return Err(AppError::Validation("age must be between 18 and 120".into()));
    }
    if !matches!(req.gender.as_str(), "male" | "female") {
        return Err(AppError::Validation("gender must be male or female".into()));
    }
    if let Some(ref interested_in) = req.interested_in {
        if !matches!(interested_in.as_str(), "male" | "female" | "both") {
            return Err(AppError::Validation(
                "interested_in must be male, female, or both".into(),
            ));
        }
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let profile = load_own_profile(&mut conn, user.id)?;

    let looking_for = serde_json::to_value(
        req.looking_for
            .iter()
            .map(|v| sanitize::clean_text(v, MAX_FIELD_LEN))
            .collect::<Vec<_>>(),
    )
    .map_err(|e| AppError::internal(e.to_string()))?;
    let interests = serde_json::to_value(
        req.interests
            .iter()
            .map(|v| sanitize::clean_text(v, MAX_FIELD_LEN))
            .collect::<Vec<_>>(),
    )
    .map_err(|e| AppError::internal(e.to_string()))?;

    let updated = diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set((
            profiles::display_name.eq(sanitize::clean_text(&req.display_name, MAX_FIELD_LEN)),
            profiles::age.eq(req.age),
            profiles::gender.eq(&req.gender),
            profiles::interested_in.eq(&req.interested_in),
            profiles::location.eq(req.location.as_deref().map(|v| sanitize::clean_text(v, MAX_FIELD_LEN))),
            profiles::nationality.eq(req.nationality.as_deref().map(|v| sanitize::clean_text(v, MAX_FIELD_LEN))),
            profiles::entrepreneur_type.eq(sanitize::clean_text(&req.entrepreneur_type, MAX_FIELD_LEN)),
            profiles::business_stage.eq(sanitize::clean_text(&req.business_stage, MAX_FIELD_LEN)),
            profiles::looking_for.eq(&looking_for),
            profiles::interests.eq(&interests),
            profiles::relationship_goals.eq(req.relationship_goals.as_deref().map(|v| sanitize::clean_text(v, MAX_FIELD_LEN))),
            profiles::bio.eq(req.bio.as_deref().map(|v| sanitize::clean_text(v, MAX_BIO_LEN))),
            profiles::onboarding_complete.eq(true),
            profiles::updated_at.eq(chrono::Utc::now()),
        ))
        .get_result::<Profile>(&mut conn)?;

    tracing::info!(credential_id = %user.id, "onboarding completed");

    Ok(Json(ApiResponse::ok(updated)))
}
