use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::ApiResponse;

use crate::matching::{discovery, score};
use crate::models::Profile;
use crate::schema::profiles;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscoveryParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// GET /discovery - next candidates for the caller. An empty list is the
/// normal "no more profiles" state, not an error.
pub async fn list_candidates(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiscoveryParams>,
) -> AppResult<Json<ApiResponse<Vec<Profile>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = profiles::table
        .filter(profiles::credential_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let limit = params.limit.clamp(1, 50);
    let candidates = discovery::load_candidates(&mut conn, &viewer, limit)?;

    tracing::debug!(
        viewer_id = %viewer.id,
        count = candidates.len(),
        "discovery candidates loaded"
    );

    Ok(Json(ApiResponse::ok(candidates)))
}

#[derive(Debug, Serialize)]
pub struct CompatibilityResponse {
    pub profile_id: Uuid,
    pub score: f64,
}

/// GET /discovery/compatibility/:id - weighted 0-100 score against a single
/// profile. Alternate path, not part of the swipe flow.
pub async fn compatibility(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CompatibilityResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = profiles::table
        .filter(profiles::credential_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let candidate = profiles::table
        .filter(profiles::id.eq(profile_id))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::CandidateNotFound, "candidate not found"))?;

    let score = score::compatibility_score(&viewer, &candidate);

    Ok(Json(ApiResponse::ok(CompatibilityResponse {
        profile_id,
        score,
    })))
}
