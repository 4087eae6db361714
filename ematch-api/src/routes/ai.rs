use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ematch_shared::clients::openai::ChatMessage;
use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::ApiResponse;

use crate::AppState;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const MAX_CHAT_MESSAGES: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

fn validate_chat(req: &ChatRequest) -> AppResult<()> {
    if req.messages.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "messages must not be empty",
        ));
    }
    if req.messages.len() > MAX_CHAT_MESSAGES {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("at most {MAX_CHAT_MESSAGES} messages per request"),
        ));
    }
    for message in &req.messages {
        if !matches!(message.role.as_str(), "system" | "user" | "assistant") {
            return Err(AppError::new(
                ErrorCode::ValidationError,
                format!("unknown message role: {}", message.role),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ChatCompletion {
    pub content: String,
}

/// POST /ai/openai/chat
pub async fn openai_chat(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatCompletion>>> {
    let client = state
        .openai
        .as_ref()
        .ok_or_else(|| AppError::not_configured("OpenAI"))?;
    validate_chat(&req)?;

    let model = req.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
    let content = client
        .chat(model, &req.messages, req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS))
        .await
        .map_err(|e| AppError::new(ErrorCode::ProviderError, e))?;

    Ok(Json(ApiResponse::ok(ChatCompletion { content })))
}

/// POST /ai/anthropic/chat - the provider's SSE stream is forwarded as-is.
pub async fn anthropic_chat(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> AppResult<Response> {
    let client = state
        .anthropic
        .as_ref()
        .ok_or_else(|| AppError::not_configured("Anthropic"))?;
    validate_chat(&req)?;

    let model = req.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL);
    let upstream = client
        .stream_chat(model, &req.messages, req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS))
        .await
        .map_err(|e| AppError::new(ErrorCode::ProviderError, e))?;

    let stream = upstream
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

    Ok((
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
}

/// POST /ai/transcribe - multipart audio through Whisper.
pub async fn transcribe(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<TranscriptionResult>>> {
    let client = state
        .openai
        .as_ref()
        .ok_or_else(|| AppError::not_configured("OpenAI"))?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::bad_request("no audio file provided"))?;

    let filename = field.file_name().unwrap_or("audio.webm").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    if !content_type.starts_with("audio/") && content_type != "video/webm" {
        return Err(AppError::new(
            ErrorCode::InvalidFileType,
            format!("expected an audio upload, got {content_type}"),
        ));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::bad_request(format!("failed to read audio data: {e}")))?;

    let text = client
        .transcribe(&filename, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::ProviderError, e))?;

    Ok(Json(ApiResponse::ok(TranscriptionResult { text })))
}

#[derive(Debug, Serialize)]
pub struct DeepgramKeyResponse {
    pub key: String,
}

/// GET /ai/deepgram - hand the browser the transcription key.
pub async fn deepgram_key(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DeepgramKeyResponse>>> {
    let key = state
        .config
        .deepgram_api_key
        .clone()
        .ok_or_else(|| AppError::not_configured("Deepgram"))?;

    Ok(Json(ApiResponse::ok(DeepgramKeyResponse { key })))
}
