use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::sanitize;
use ematch_shared::types::api::ApiResponse;
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{Message, MessageReaction, NewMessage, NewMessageReaction};
use crate::routes::conversations::{resolve_own_profile_id, verify_membership};
use crate::schema::{conversations, message_reactions, messages};
use crate::AppState;

const MAX_MESSAGE_LEN: usize = 4000;

// --- Request DTOs ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub emoji: String,
}

// --- Handlers ---

/// GET /conversations/:id/messages - paginated, newest first.
pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Message>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;
    verify_membership(&mut conn, conversation_id, profile_id)?;

    let total: i64 = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .select(count_star())
        .first::<i64>(&mut conn)
        .map_err(AppError::Database)?;

    let items: Vec<Message> = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .order(messages::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<Message>(&mut conn)
        .map_err(AppError::Database)?;

    let paginated = Paginated::new(items, total as u64, &params);

    Ok(Json(ApiResponse::ok(paginated)))
}

/// POST /conversations/:id/messages - send a message; sender always comes
/// from the token. Updates the conversation's denormalized preview fields.
pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    let content = sanitize::clean_text(&req.content, MAX_MESSAGE_LEN);
    if content.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "message must have content",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;
    verify_membership(&mut conn, conversation_id, profile_id)?;

    let message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            conversation_id,
            sender_id: profile_id,
            content: content.clone(),
        })
        .get_result::<Message>(&mut conn)?;

    let now = Utc::now();
    diesel::update(conversations::table.filter(conversations::id.eq(conversation_id)))
        .set((
            conversations::last_message.eq(&content),
            conversations::last_message_time.eq(now),
            conversations::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    // Sending clears the sender's typing indicator
    let key = format!("typing:{conversation_id}:{profile_id}");
    if let Err(e) = state.redis.del(&key).await {
        tracing::debug!(error = %e, "typing indicator cleanup failed");
    }

    Ok(Json(ApiResponse::ok(message)))
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: usize,
}

/// POST /conversations/:id/read - the recipient viewing the conversation
/// marks the other side's messages read.
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MarkReadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;
    verify_membership(&mut conn, conversation_id, profile_id)?;

    let marked = diesel::update(
        messages::table
            .filter(messages::conversation_id.eq(conversation_id))
            .filter(messages::sender_id.ne(profile_id))
            .filter(messages::read.eq(false)),
    )
    .set(messages::read.eq(true))
    .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(MarkReadResponse { marked })))
}

/// POST /messages/:id/reactions - add (or return) the caller's reaction.
pub async fn add_reaction(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<ReactionRequest>,
) -> AppResult<Json<ApiResponse<MessageReaction>>> {
    let emoji = req.emoji.trim();
    if emoji.is_empty() || emoji.chars().count() > 8 {
        return Err(AppError::new(ErrorCode::ValidationError, "invalid emoji"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;

    let message: Message = messages::table
        .filter(messages::id.eq(message_id))
        .first::<Message>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    verify_membership(&mut conn, message.conversation_id, profile_id)?;

    let existing = message_reactions::table
        .filter(message_reactions::message_id.eq(message_id))
        .filter(message_reactions::user_id.eq(profile_id))
        .filter(message_reactions::emoji.eq(emoji))
        .first::<MessageReaction>(&mut conn)
        .optional()?;

    if let Some(reaction) = existing {
        return Ok(Json(ApiResponse::ok(reaction)));
    }

    let reaction = diesel::insert_into(message_reactions::table)
        .values(&NewMessageReaction {
            message_id,
            user_id: profile_id,
            emoji: emoji.to_string(),
        })
        .get_result::<MessageReaction>(&mut conn)?;

    Ok(Json(ApiResponse::ok(reaction)))
}
