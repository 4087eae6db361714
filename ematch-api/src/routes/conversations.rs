use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::types::api::ApiResponse;
use ematch_shared::types::auth::AuthUser;

use crate::models::{Conversation, Profile};
use crate::schema::{conversation_members, conversations, messages, profiles};
use crate::AppState;

/// Typing indicators expire on their own; a keypress refreshes the key.
const TYPING_TTL_SECS: u64 = 5;

// --- Response DTOs ---

#[derive(Debug, Serialize)]
pub struct ConversationPreview {
    pub id: Uuid,
    pub partner_id: Option<Uuid>,
    pub partner_name: Option<String>,
    pub partner_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

// --- Helpers ---

pub fn resolve_own_profile_id(
    conn: &mut diesel::pg::PgConnection,
    credential_id: Uuid,
) -> AppResult<Uuid> {
    profiles::table
        .filter(profiles::credential_id.eq(credential_id))
        .select(profiles::id)
        .first::<Uuid>(conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

/// Verify the user is a member of the given conversation. Returns an error if not.
pub fn verify_membership(
    conn: &mut diesel::pg::PgConnection,
    conversation_id: Uuid,
    profile_id: Uuid,
) -> AppResult<()> {
    let is_member: bool = conversation_members::table
        .filter(conversation_members::conversation_id.eq(conversation_id))
        .filter(conversation_members::user_id.eq(profile_id))
        .select(count_star())
        .first::<i64>(conn)
        .map(|c| c > 0)
        .map_err(AppError::Database)?;

    if !is_member {
        return Err(AppError::new(
            ErrorCode::NotConversationMember,
            "you are not a member of this conversation",
        ));
    }

    Ok(())
}

// --- Handlers ---

/// GET /conversations - the caller's conversations with partner info, last
/// message, and unread count.
pub async fn list_conversations(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ConversationPreview>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;

    let conv_ids: Vec<Uuid> = conversation_members::table
        .filter(conversation_members::user_id.eq(profile_id))
        .select(conversation_members::conversation_id)
        .load::<Uuid>(&mut conn)
        .map_err(AppError::Database)?;

    if conv_ids.is_empty() {
        return Ok(Json(ApiResponse::ok(vec![])));
    }

    let convs: Vec<Conversation> = conversations::table
        .filter(conversations::id.eq_any(&conv_ids))
        .order(conversations::updated_at.desc())
        .load::<Conversation>(&mut conn)
        .map_err(AppError::Database)?;

    let mut previews = Vec::with_capacity(convs.len());
    for conv in convs {
        let partner: Option<Profile> = conversation_members::table
            .inner_join(profiles::table.on(profiles::id.eq(conversation_members::user_id)))
            .filter(conversation_members::conversation_id.eq(conv.id))
            .filter(conversation_members::user_id.ne(profile_id))
            .select(profiles::all_columns)
            .first::<Profile>(&mut conn)
            .optional()
            .map_err(AppError::Database)?;

        let unread: i64 = messages::table
            .filter(messages::conversation_id.eq(conv.id))
            .filter(messages::sender_id.ne(profile_id))
            .filter(messages::read.eq(false))
            .select(count_star())
            .first::<i64>(&mut conn)
            .map_err(AppError::Database)?;

        let partner_photo = partner.as_ref().and_then(|p| {
            crate::models::json_string_array(&p.photos).into_iter().next()
        });

        previews.push(ConversationPreview {
            id: conv.id,
            partner_id: partner.as_ref().map(|p| p.id),
            partner_name: partner.as_ref().and_then(|p| p.display_name.clone()),
            partner_photo,
            created_at: conv.created_at,
            last_message: conv.last_message,
            last_message_time: conv.last_message_time,
            unread_count: unread,
        });
    }

    Ok(Json(ApiResponse::ok(previews)))
}

// --- Typing indicators (ephemeral, Redis TTL) ---

#[derive(Debug, Serialize)]
pub struct TypingResponse {
    pub typing_user_ids: Vec<Uuid>,
}

/// PUT /conversations/:id/typing - created on keypress, expires on idle.
pub async fn start_typing(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;
    verify_membership(&mut conn, conversation_id, profile_id)?;

    let key = format!("typing:{conversation_id}:{profile_id}");
    state
        .redis
        .set(&key, "1", TYPING_TTL_SECS)
        .await
        .map_err(|e| AppError::internal(format!("typing state write failed: {e}")))?;

    Ok(Json(ApiResponse::ok(())))
}

/// DELETE /conversations/:id/typing - explicit stop on blur/send.
pub async fn stop_typing(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;

    let key = format!("typing:{conversation_id}:{profile_id}");
    state
        .redis
        .del(&key)
        .await
        .map_err(|e| AppError::internal(format!("typing state delete failed: {e}")))?;

    Ok(Json(ApiResponse::ok(())))
}

/// GET /conversations/:id/typing - which other members are currently typing.
pub async fn get_typing(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TypingResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let profile_id = resolve_own_profile_id(&mut conn, auth_user.id)?;
    verify_membership(&mut conn, conversation_id, profile_id)?;

    let member_ids: Vec<Uuid> = conversation_members::table
        .filter(conversation_members::conversation_id.eq(conversation_id))
        .filter(conversation_members::user_id.ne(profile_id))
        .select(conversation_members::user_id)
        .load::<Uuid>(&mut conn)
        .map_err(AppError::Database)?;

    let mut typing_user_ids = Vec::new();
    for member_id in member_ids {
        let key = format!("typing:{conversation_id}:{member_id}");
        if let Ok(true) = state.redis.exists(&key).await {
            typing_user_ids.push(member_id);
        }
    }

    Ok(Json(ApiResponse::ok(TypingResponse { typing_user_ids })))
}
