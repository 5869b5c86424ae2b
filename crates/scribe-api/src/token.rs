use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use tracing::debug;
use uuid::Uuid;

use scribe_types::api::Claims;

use crate::error::ApiError;

/// Issues and verifies HS256 session tokens.
///
/// The signing key is fixed at construction and never rotated. There is no
/// server-side session store: every correctly signed, unexpired token is
/// accepted until it expires.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    validity: Duration,
}

pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenService {
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            validity,
        }
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<IssuedToken, ApiError> {
        self.issue_at(user_id, username, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, ApiError> {
        let expires_at = issued_at
            .checked_add_signed(self.validity)
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("token signing failed: {}", e))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Signature is checked before expiry. Every failure collapses into
    /// `Unauthenticated`; only the debug log tells the reasons apart.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => debug!("Rejected expired token"),
                    ErrorKind::InvalidSignature => debug!("Rejected token with bad signature"),
                    other => debug!("Rejected malformed token: {:?}", other),
                }
                ApiError::Unauthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-signing-key", Duration::hours(24))
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let issued = tokens.issue(user_id, "alice").unwrap();
        let claims = tokens.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::hours(24) - Duration::seconds(5);
        let issued = tokens.issue_at(Uuid::new_v4(), "alice", issued_at).unwrap();

        assert!(matches!(tokens.verify(&issued.token), Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn token_is_valid_until_expiry() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::hours(23);
        let issued = tokens.issue_at(Uuid::new_v4(), "alice", issued_at).unwrap();

        assert!(tokens.verify(&issued.token).is_ok());
    }

    #[test]
    fn any_flipped_bit_is_rejected() {
        let tokens = service();
        let issued = tokens.issue(Uuid::new_v4(), "alice").unwrap();
        let original = issued.token.into_bytes();

        for i in 0..original.len() {
            for bit in 0..7 {
                let mut tampered = original.clone();
                tampered[i] ^= 1 << bit;
                let tampered = String::from_utf8(tampered).unwrap();
                assert!(
                    tokens.verify(&tampered).is_err(),
                    "byte {i} bit {bit} still verified"
                );
            }
        }
    }

    #[test]
    fn foreign_key_is_rejected() {
        let ours = service();
        let theirs = TokenService::new(b"someone-else", Duration::hours(24));
        let issued = theirs.issue(Uuid::new_v4(), "mallory").unwrap();

        assert!(matches!(ours.verify(&issued.token), Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn out_of_range_expiry_is_an_internal_error() {
        let tokens = TokenService::new(b"test-signing-key", Duration::days(365 * 1_000_000));
        let result = tokens.issue(Uuid::new_v4(), "alice");
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = service();
        for raw in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(matches!(tokens.verify(raw), Err(ApiError::Unauthenticated)));
        }
    }
}
