use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use ematch_shared::errors::AppError;
use ematch_shared::types::auth::{AuthToken, Claims};

pub fn create_access_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<String, AppError> {
    let claims = Claims::new(user_id, ttl_secs);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

pub fn create_auth_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<AuthToken, AppError> {
    let access_token = create_access_token(user_id, secret, ttl_secs)?;
    Ok(AuthToken::new(access_token, ttl_secs))
}
