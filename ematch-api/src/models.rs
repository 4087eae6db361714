use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    conversation_members, conversations, credentials, likes, message_reactions, messages,
    profiles, rejected_profiles,
};

// --- Credential ---

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = credentials)]
pub struct Credential {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = credentials)]
pub struct NewCredential {
    pub email: String,
    pub password_hash: String,
}

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub display_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub interested_in: Option<String>,
    pub location: Option<String>,
    pub nationality: Option<String>,
    pub entrepreneur_type: Option<String>,
    pub business_stage: Option<String>,
    pub looking_for: serde_json::Value,
    pub interests: serde_json::Value,
    pub relationship_goals: Option<String>,
    pub age_min_pref: Option<i32>,
    pub age_max_pref: Option<i32>,
    pub bio: Option<String>,
    pub photos: serde_json::Value,
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Jsonb string arrays come back as `Value`; anything non-array reads as empty.
    pub fn looking_for_set(&self) -> Vec<String> {
        json_string_array(&self.looking_for)
    }

    pub fn interests_set(&self) -> Vec<String> {
        json_string_array(&self.interests)
    }
}

pub fn json_string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub credential_id: Uuid,
    pub looking_for: serde_json::Value,
    pub interests: serde_json::Value,
    pub photos: serde_json::Value,
}

impl NewProfile {
    pub fn for_credential(credential_id: Uuid) -> Self {
        Self {
            credential_id,
            looking_for: serde_json::json!([]),
            interests: serde_json::json!([]),
            photos: serde_json::json!([]),
        }
    }
}

#[derive(Debug, AsChangeset, Deserialize, Default)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub interested_in: Option<String>,
    pub location: Option<String>,
    pub nationality: Option<String>,
    pub entrepreneur_type: Option<String>,
    pub business_stage: Option<String>,
    pub looking_for: Option<serde_json::Value>,
    pub interests: Option<serde_json::Value>,
    pub relationship_goals: Option<String>,
    pub age_min_pref: Option<i32>,
    pub age_max_pref: Option<i32>,
    pub bio: Option<String>,
    pub photos: Option<serde_json::Value>,
    pub onboarding_complete: Option<bool>,
}

// --- RejectedProfile ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = rejected_profiles)]
pub struct RejectedProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rejected_profile_id: Uuid,
    pub rejected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rejected_profiles)]
pub struct NewRejectedProfile {
    pub user_id: Uuid,
    pub rejected_profile_id: Uuid,
    pub rejected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub liker_id: Uuid,
    pub liked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub liker_id: Uuid,
    pub liked_id: Uuid,
}

// --- Conversation ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = conversations)]
pub struct Conversation {
    pub id: Uuid,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = conversation_members)]
pub struct ConversationMember {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub last_read_at: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = conversation_members)]
pub struct NewConversationMember {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

// --- MessageReaction ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = message_reactions)]
pub struct MessageReaction {
    pub id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = message_reactions)]
pub struct NewMessageReaction {
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub emoji: String,
}
