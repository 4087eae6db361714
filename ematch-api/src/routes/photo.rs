use axum::extract::{Multipart, State};
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::ApiResponse;
use ematch_shared::upload;

use crate::models::{json_string_array, Profile};
use crate::schema::profiles;
use crate::AppState;

const MAX_PHOTOS: usize = 6;

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub photo_url: String,
    pub photos: Vec<String>,
}

/// POST /profile/photo - validate the multipart part, store it, and append
/// the hosted URL to the profile's photo list.
pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<PhotoUploadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::credential_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let mut photos = json_string_array(&profile.photos);
    if photos.len() >= MAX_PHOTOS {
        return Err(AppError::Validation(format!(
            "profile already has the maximum of {MAX_PHOTOS} photos"
        )));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            AppError::new(
                ErrorCode::PhotoUploadFailed,
                format!("failed to read multipart: {e}"),
            )
        })?
        .ok_or_else(|| AppError::new(ErrorCode::PhotoUploadFailed, "no file provided"))?;

    let filename = field.file_name().unwrap_or("photo").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field.bytes().await.map_err(|e| {
        AppError::new(
            ErrorCode::PhotoUploadFailed,
            format!("failed to read file data: {e}"),
        )
    })?;

    // MIME allow-list, 5 MiB image ceiling, magic-number sniff
    let validated = upload::validate_upload(&filename, &content_type, &data)?;
    if validated.category != upload::FileCategory::Image {
        return Err(AppError::new(
            ErrorCode::InvalidFileType,
            "profile photos must be images",
        ));
    }

    let file_id = Uuid::now_v7();
    let key = format!("profiles/{}/{}.{}", profile.id, file_id, validated.extension);

    let photo_url = state
        .storage
        .upload(&key, data.to_vec(), &validated.content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, e))?;

    photos.push(photo_url.clone());
    let photos_json =
        serde_json::to_value(&photos).map_err(|e| AppError::internal(e.to_string()))?;

    diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set((
            profiles::photos.eq(&photos_json),
            profiles::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;

    tracing::info!(
        profile_id = %profile.id,
        photo_url = %photo_url,
        "profile photo uploaded"
    );

    Ok(Json(ApiResponse::ok(PhotoUploadResponse { photo_url, photos })))
}
