use crate::models::user::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Bearer token presented to protected routes.
    Access,
    /// Embedded in the email verification link.
    Verify,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub role: Role,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 tokens signed with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    verification_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("verification_ttl", &self.verification_ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::days(7),
            verification_ttl: Duration::hours(24),
        }
    }

    pub fn with_lifetimes(mut self, access_ttl: Duration, verification_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.verification_ttl = verification_ttl;
        self
    }

    pub fn issue_access_token(&self, user_id: i64, role: Role) -> Result<String, TokenError> {
        self.issue(user_id, role, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_verification_token(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue(user_id, Role::User, TokenKind::Verify, self.verification_ttl)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_verification_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenKind::Verify)
    }

    fn issue(
        &self,
        user_id: i64,
        role: Role,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.kind != expected {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_round_trip_carries_role() {
        let service = TokenService::new("unit-test-secret");
        let token = service.issue_access_token(42, Role::Admin).unwrap();

        let claims = service.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let service = TokenService::new("unit-test-secret");
        let verify = service.issue_verification_token(1).unwrap();
        let access = service.issue_access_token(1, Role::User).unwrap();

        assert!(matches!(
            service.verify_access_token(&verify),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            service.verify_verification_token(&access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new("unit-test-secret")
            .with_lifetimes(Duration::days(7), Duration::seconds(-60));
        let token = service.issue_verification_token(1).unwrap();

        assert!(matches!(
            service.verify_verification_token(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenService::new("secret-a");
        let verifier = TokenService::new("secret-b");
        let token = issuer.issue_access_token(1, Role::User).unwrap();

        assert!(matches!(
            verifier.verify_access_token(&token),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            verifier.verify_access_token("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }
}
