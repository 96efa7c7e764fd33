use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};
use uuid::Uuid;

use crate::models::users;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub username: String,
    pub jti: String,
    pub exp: i64,        // expiration timestamp
}

/// Émetteur des tokens bearer (HS256)
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Génère un JWT token pour un compte validé
    pub fn generate_token(&self, user: &users::Model) -> Result<String, String> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or("Failed to calculate expiration")?
            .timestamp();

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| format!("Failed to generate token: {}", e))
    }

    /// Vérifie et décode un JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Role;

    fn user() -> users::Model {
        users::Model {
            id: 123,
            username: "testuser".into(),
            email: "test@example.com".into(),
            role: Role::User,
            is_staff: false,
            first_name: None,
            last_name: None,
            bio: None,
            confirmation_code: String::new(),
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let keys = JwtKeys::new("test-secret", 24);

        let token = keys.generate_token(&user()).unwrap();
        let claims = keys.verify_token(&token).unwrap();

        assert_eq!(claims.sub, 123);
        assert_eq!(claims.username, "testuser");
    }

    #[test]
    fn test_tokens_are_unique() {
        let keys = JwtKeys::new("test-secret", 24);
        let a = keys.verify_token(&keys.generate_token(&user()).unwrap()).unwrap();
        let b = keys.verify_token(&keys.generate_token(&user()).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_invalid_token() {
        let keys = JwtKeys::new("test-secret", 24);
        assert!(keys.verify_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let token = JwtKeys::new("secret-a", 24).generate_token(&user()).unwrap();
        assert!(JwtKeys::new("secret-b", 24).verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let keys = JwtKeys::new("test-secret", -2);
        let token = keys.generate_token(&user()).unwrap();
        assert!(keys.verify_token(&token).is_err());
    }
}
