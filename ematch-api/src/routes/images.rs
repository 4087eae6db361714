use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::ApiResponse;

use crate::AppState;

const MAX_PROMPT_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedImages {
    pub urls: Vec<String>,
}

/// POST /images/generate
pub async fn generate_image(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateImageRequest>,
) -> AppResult<Json<ApiResponse<GeneratedImages>>> {
    let client = state
        .replicate
        .as_ref()
        .ok_or_else(|| AppError::not_configured("Replicate"))?;

    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "prompt must not be empty"));
    }
    if prompt.len() > MAX_PROMPT_LEN {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("prompt must be at most {MAX_PROMPT_LEN} characters"),
        ));
    }

    let urls = client
        .generate_image(&state.config.replicate_model_version, prompt)
        .await
        .map_err(|e| AppError::new(ErrorCode::ProviderError, e))?;

    Ok(Json(ApiResponse::ok(GeneratedImages { urls })))
}
