//! Claim verification: signs credentials at login and party creation, and
//! gates every mutating call on an exact (user, party) match.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use placard_types::models::{Claims, Validity};

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 48;

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is judged by `Claims::validity` so the outcome stays a plain enum.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Mints a fresh credential for `user_id` acting in `party_id`.
    pub fn mint(&self, user_id: i64, username: &str, party_id: i64) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            party_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::Storage(anyhow::anyhow!("failed to sign credential: {}", e)))
    }

    /// Decodes a credential and classifies it without failing.
    pub fn check(&self, token: &str) -> (Validity, Option<Claims>) {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => {
                let validity = data.claims.validity(Utc::now().timestamp());
                (validity, Some(data.claims))
            }
            Err(e) => {
                debug!("Credential failed to decode: {}", e);
                (Validity::Malformed, None)
            }
        }
    }

    /// The claims of a valid credential, or an authorization error.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        match self.check(token) {
            (Validity::Valid, Some(claims)) => Ok(claims),
            (Validity::Expired, _) => Err(ApiError::unauthorized("credential expired")),
            _ => Err(ApiError::unauthorized("invalid credential")),
        }
    }
}

/// The authorization gate of every mutating call. A mismatch is reported the
/// same way as a bad credential: the caller has to log in again.
pub fn require_match(claims: &Claims, user_id: i64, party_id: i64) -> ApiResult<()> {
    if claims.matches(user_id, party_id) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("invalid credential"))
    }
}
