use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::validate_email;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::sanitize;
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::ApiResponse;

use crate::AppState;

const MAX_SUBJECT_LEN: usize = 200;
const MAX_BODY_LEN: usize = 20_000;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct EmailSent {
    pub delivered: bool,
}

/// POST /notifications/email
pub async fn send_email(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendEmailRequest>,
) -> AppResult<Json<ApiResponse<EmailSent>>> {
    let client = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::not_configured("Resend"))?;

    if !validate_email(&req.to) {
        return Err(AppError::new(ErrorCode::ValidationError, "invalid recipient address"));
    }
    let subject = sanitize::clean_text(&req.subject, MAX_SUBJECT_LEN);
    if subject.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "subject must not be empty"));
    }
    if req.html.len() > MAX_BODY_LEN {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("body must be at most {MAX_BODY_LEN} bytes"),
        ));
    }
    let html = sanitize::sanitize_html(&req.html);

    client
        .send_email(&req.to, &subject, &html)
        .await
        .map_err(|e| AppError::new(ErrorCode::ProviderError, e))?;

    Ok(Json(ApiResponse::ok(EmailSent { delivered: true })))
}
