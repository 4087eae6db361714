use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};
use ematch_shared::types::auth::AuthUser;
use ematch_shared::types::ApiResponse;

use crate::models::{
    Conversation, Like, NewConversationMember, NewLike, NewRejectedProfile, Profile,
    RejectedProfile,
};
use crate::schema::{conversation_members, conversations, likes, profiles, rejected_profiles};
use crate::AppState;

/// Rejections stay active for six months, then the profile reappears.
const REJECTION_TTL_DAYS: i64 = 183;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub target_id: Uuid,
}

fn resolve_profiles(
    conn: &mut diesel::pg::PgConnection,
    credential_id: Uuid,
    target_id: Uuid,
) -> AppResult<(Profile, Profile)> {
    // The acting profile always comes from the verified token
    let actor = profiles::table
        .filter(profiles::credential_id.eq(credential_id))
        .first::<Profile>(conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let target = profiles::table
        .filter(profiles::id.eq(target_id))
        .first::<Profile>(conn)
        .map_err(|_| AppError::new(ErrorCode::CandidateNotFound, "target profile not found"))?;

    if actor.id == target.id {
        return Err(AppError::new(
            ErrorCode::CannotSwipeSelf,
            "cannot swipe on your own profile",
        ));
    }

    Ok((actor, target))
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub like: Like,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
}

/// POST /swipes/like - idempotent; a reciprocal like opens the conversation.
pub async fn like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwipeRequest>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let (actor, target) = resolve_profiles(&mut conn, user.id, req.target_id)?;

    let existing = likes::table
        .filter(likes::liker_id.eq(actor.id))
        .filter(likes::liked_id.eq(target.id))
        .first::<Like>(&mut conn)
        .optional()?;

    let like = match existing {
        Some(like) => like,
        None => diesel::insert_into(likes::table)
            .values(&NewLike {
                liker_id: actor.id,
                liked_id: target.id,
            })
            .get_result::<Like>(&mut conn)?,
    };

    // Reciprocal like means a match
    let reciprocal = likes::table
        .filter(likes::liker_id.eq(target.id))
        .filter(likes::liked_id.eq(actor.id))
        .first::<Like>(&mut conn)
        .optional()?
        .is_some();

    let conversation_id = if reciprocal {
        Some(find_or_create_conversation(&mut conn, actor.id, target.id)?)
    } else {
        None
    };

    if reciprocal {
        tracing::info!(
            liker_id = %actor.id,
            liked_id = %target.id,
            "mutual like, conversation opened"
        );
        notify_match(&state, &target, &actor).await;
    }

    Ok(Json(ApiResponse::ok(LikeResponse {
        like,
        matched: reciprocal,
        conversation_id,
    })))
}

/// POST /swipes/dislike - write the rejection with its 6-month expiry. The
/// first record wins; repeat dislikes do not extend the window.
pub async fn dislike(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwipeRequest>,
) -> AppResult<Json<ApiResponse<RejectedProfile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let (actor, target) = resolve_profiles(&mut conn, user.id, req.target_id)?;

    let now = Utc::now();
    let existing = rejected_profiles::table
        .filter(rejected_profiles::user_id.eq(actor.id))
        .filter(rejected_profiles::rejected_profile_id.eq(target.id))
        .filter(rejected_profiles::expires_at.gt(now))
        .first::<RejectedProfile>(&mut conn)
        .optional()?;

    if let Some(active) = existing {
        return Ok(Json(ApiResponse::ok(active)));
    }

    let rejection = diesel::insert_into(rejected_profiles::table)
        .values(&NewRejectedProfile {
            user_id: actor.id,
            rejected_profile_id: target.id,
            rejected_at: now,
            expires_at: now + Duration::days(REJECTION_TTL_DAYS),
        })
        .get_result::<RejectedProfile>(&mut conn)?;

    Ok(Json(ApiResponse::ok(rejection)))
}

fn find_or_create_conversation(
    conn: &mut diesel::pg::PgConnection,
    a: Uuid,
    b: Uuid,
) -> AppResult<Uuid> {
    // A pair conversation is one both profiles are members of
    let a_convs: Vec<Uuid> = conversation_members::table
        .filter(conversation_members::user_id.eq(a))
        .select(conversation_members::conversation_id)
        .load::<Uuid>(conn)?;

    let shared: Option<Uuid> = conversation_members::table
        .filter(conversation_members::user_id.eq(b))
        .filter(conversation_members::conversation_id.eq_any(&a_convs))
        .select(conversation_members::conversation_id)
        .first::<Uuid>(conn)
        .optional()?;

    if let Some(id) = shared {
        return Ok(id);
    }

    let conversation: Conversation = diesel::insert_into(conversations::table)
        .default_values()
        .get_result::<Conversation>(conn)?;

    diesel::insert_into(conversation_members::table)
        .values(&vec![
            NewConversationMember {
                conversation_id: conversation.id,
                user_id: a,
            },
            NewConversationMember {
                conversation_id: conversation.id,
                user_id: b,
            },
        ])
        .execute(conn)?;

    Ok(conversation.id)
}

/// Best-effort match email; failures are logged, never surfaced.
async fn notify_match(state: &AppState, recipient: &Profile, partner: &Profile) {
    let Some(email_client) = &state.email else {
        return;
    };

    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "match notification skipped");
            return;
        }
    };

    use crate::schema::credentials;
    let email: Option<String> = credentials::table
        .filter(credentials::id.eq(recipient.credential_id))
        .select(credentials::email)
        .first::<String>(&mut conn)
        .optional()
        .unwrap_or(None);

    let Some(email) = email else { return };
    let partner_name = partner.display_name.as_deref().unwrap_or("someone new");

    if let Err(e) = email_client.send_match_notification(&email, partner_name).await {
        tracing::warn!(error = %e, "match notification email failed");
    }
}
