use mongodb::bson::oid::ObjectId;
use rand::RngCore;
use serde::{Serialize, Deserialize};
use sha2::{Digest, Sha256};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use chrono::{Utc, Duration};
use bcrypt::{hash as crypt_hash, BcryptError};

use crate::domain::{User, UserRole};
use crate::utils::{errors::ApiError, security::jwt::{AccessData, Claims}};

#[derive(Serialize, Deserialize)]
pub struct AuthUtils;

impl AuthUtils {

    /// Hex SHA-256, used to store password reset tokens.
    pub fn hash(input: &str) -> String {
        let hasher = Sha256::new_with_prefix(input.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn hash_password(input: &str, cost: u32) -> Result<String, BcryptError> {
        crypt_hash(input, cost)
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, BcryptError> {
        bcrypt::verify(password, hash)
    }

    /// Signs an HS256 token carrying the user's id, role and name.
    pub fn generate_access_token(user: &User, secret: &str, minutes: i64) -> Result<String, ApiError> {
        let id = user
            .id
            .ok_or_else(|| ApiError::InternalServerError("Cannot sign a token for an unsaved user".to_string()))?;

        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::minutes(minutes))
            .ok_or_else(|| ApiError::InternalServerError("Token expiration out of range".to_string()))?;

        let claims = Claims {
            sub: id.to_hex(),
            exp: expiration.timestamp() as u64,
            iat: now.timestamp() as u64,
            data: AccessData {
                id: id.to_hex(),
                rol: user.role,
                nombre: user.name.clone(),
            },
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ApiError::InternalServerError(format!("Failed to sign access token: {}", e)))
    }

    pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims<AccessData>, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims<AccessData>>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
    }

    /// 32 random bytes, hex encoded. Only its hash is persisted.
    pub fn generate_reset_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Owner-or-admin rule shared by every resource.
pub fn can_access(role: UserRole, user_id: &ObjectId, owner_id: &ObjectId) -> bool {
    role == UserRole::Admin || user_id == owner_id
}

// ---------------------------------------- TESTS ----------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_for_jwt_signing_operations";
    const COST: u32 = 4;

    fn saved_user(role: UserRole) -> User {
        let mut user = User::new("Ana".into(), "García".into(), "ana@example.com".into(), "hash".into(), role);
        user.id = Some(ObjectId::new());
        user
    }

    #[test]
    fn test_hash() {
        let hash1 = AuthUtils::hash("hash1");
        let hash2 = AuthUtils::hash("hash2");

        assert_ne!(hash1, hash2, "Different inputs should produce different hashes");
        assert_eq!(hash1, AuthUtils::hash("hash1"), "Same input should produce same hash");
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
        assert!(hex::decode(&hash1).is_ok(), "Hash should be valid hex string");
    }

    #[test]
    fn test_hash_password() {
        let hash = AuthUtils::hash_password("my_secure_password", COST).unwrap();

        assert!(hash.starts_with("$2b$"));
        let parts: Vec<&str> = hash.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[2], "04");
    }

    #[test]
    fn test_verify_password() {
        let hash = AuthUtils::hash_password("correct_password", COST).unwrap();

        assert!(AuthUtils::verify_password("correct_password", &hash).unwrap());
        assert!(!AuthUtils::verify_password("wrong_password", &hash).unwrap());
        assert!(!AuthUtils::verify_password("CORRECT_PASSWORD", &hash).unwrap());
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hash1 = AuthUtils::hash_password("same_password", COST).unwrap();
        let hash2 = AuthUtils::hash_password("same_password", COST).unwrap();

        assert_ne!(hash1, hash2, "Salted hashes should differ");
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        assert!(AuthUtils::verify_password("password", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_access_token_round_trip() {
        let user = saved_user(UserRole::Admin);
        let token = AuthUtils::generate_access_token(&user, SECRET, 60).unwrap();

        let claims = AuthUtils::decode_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user.id.unwrap().to_hex());
        assert_eq!(claims.data.rol, UserRole::Admin);
        assert_eq!(claims.data.nombre, "Ana");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let user = saved_user(UserRole::User);
        let token = AuthUtils::generate_access_token(&user, SECRET, -120).unwrap();

        let err = AuthUtils::decode_access_token(&token, SECRET).unwrap_err();
        assert!(matches!(err.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_token_with_wrong_secret_fails() {
        let user = saved_user(UserRole::User);
        let token = AuthUtils::generate_access_token(&user, "wrong_secret_key", 60).unwrap();

        assert!(AuthUtils::decode_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_unsaved_user_cannot_get_token() {
        let mut user = saved_user(UserRole::User);
        user.id = None;

        assert!(AuthUtils::generate_access_token(&user, SECRET, 60).is_err());
    }

    #[test]
    fn test_reset_tokens_are_random_hex() {
        let a = AuthUtils::generate_reset_token();
        let b = AuthUtils::generate_reset_token();

        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(hex::decode(&a).is_ok());
    }

    #[test]
    fn test_owner_or_admin() {
        let (me, other) = (ObjectId::new(), ObjectId::new());

        assert!(can_access(UserRole::User, &me, &me));
        assert!(!can_access(UserRole::User, &me, &other));
        assert!(can_access(UserRole::Admin, &me, &other));
    }
}
