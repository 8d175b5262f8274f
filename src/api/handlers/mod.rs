pub mod adoption_handlers;
pub mod auth_handlers;
pub mod message_handlers;
pub mod pet_handlers;
pub mod user_handlers;

use actix_web::web;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

use crate::api::state::AppState;
use crate::domain::{Filter, Record, Store, User};
use crate::utils::errors::ApiError;
use crate::utils::security::{auth::AuthUtils, jwt::AuthUser};

/// Path ids must be 24-hex-digit ObjectIds.
pub(crate) fn parse_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("Identificador inválido".to_string()))
}

pub(crate) fn message(text: &str) -> Value {
    json!({ "mensaje": text })
}

pub(crate) async fn find_record<T: Record>(store: &dyn Store<T>, id: &ObjectId, not_found: &str) -> Result<T, ApiError> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(not_found.to_string()))
}

/// Like [`find_record`] but soft-deleted records count as missing.
pub(crate) async fn find_live<T: Record>(store: &dyn Store<T>, id: &ObjectId, not_found: &str) -> Result<T, ApiError> {
    let record = find_record(store, id, not_found).await?;
    if record.is_deleted() {
        return Err(ApiError::NotFound(not_found.to_string()));
    }
    Ok(record)
}

pub(crate) async fn find_user_by_email(state: &AppState, email: &str) -> Result<Option<User>, ApiError> {
    state.users.find_one(&[Filter::eq("email", email)]).await
}

/// Owner of a new record: the caller, or for admins the account named by `emailUsuario`.
pub(crate) async fn resolve_owner(state: &AppState, auth: &AuthUser, email: Option<&str>) -> Result<ObjectId, ApiError> {
    let Some(email) = email.filter(|_| auth.is_admin()) else {
        return Ok(auth.id);
    };

    find_user_by_email(state, email)
        .await?
        .filter(|user| !user.deleted)
        .and_then(|user| user.id)
        .ok_or_else(|| ApiError::NotFound(format!("No existe ningún usuario con el email {}", email)))
}

/// bcrypt runs on the blocking pool so slow hashes do not stall the worker.
pub(crate) async fn hash_password(state: &AppState, password: &str) -> Result<String, ApiError> {
    let password = password.to_string();
    let cost = state.config.bcrypt_cost;

    web::block(move || AuthUtils::hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// A malformed stored hash counts as a mismatch.
pub(crate) async fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let (password, hash) = (password.to_string(), hash.to_string());

    let matches = web::block(move || AuthUtils::verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Password check task failed: {}", e)))?;
    Ok(matches.unwrap_or(false))
}
