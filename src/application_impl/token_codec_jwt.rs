use crate::application_port::{AccessToken, AuthError, TokenCodec};
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TOKEN_ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    iss: String,
    sub: String, // user id as string
    iat: i64,
    exp: i64,
}

/// HS256 access tokens carrying `{iss, sub, iat, exp}`.
pub struct JwtHs256Codec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs256Codec {
    pub fn new(signing_key: &[u8]) -> Self {
        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
        }
    }

    fn encode_access(&self, uid: UserId, ttl: Duration) -> Result<(String, DateTime<Utc>), AuthError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| AuthError::Signing(e.to_string()))?;
        let iat_dt = Utc::now();
        let exp_dt = iat_dt
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Signing("expiry out of range".to_string()))?;
        let claims = AccessClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: uid.to_string(),
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        let exp_dt = DateTime::from_timestamp(claims.exp, 0).unwrap_or(exp_dt);
        Ok((token, exp_dt))
    }

    /// Structure and signature first; only then are the claims trusted.
    fn decode_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = false;
        v.leeway = 0;
        v.set_issuer(&[TOKEN_ISSUER]);
        v.set_required_spec_claims(&["exp", "iss", "sub"]);
        let data = decode::<AccessClaims>(token, &self.decoding_key, &v).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
        ttl: Duration,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = self.encode_access(user, ttl)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError> {
        let claims = self.decode_access(&token.0)?;
        if Utc::now().timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidSubject)
    }
}
