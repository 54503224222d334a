use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::AuthConfig;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const EXPIRY_LENGTH: usize = 8;
const TAG_LENGTH: usize = 32;

/// Why a token was rejected. Only useful for logging: callers treat every
/// variant as "no identity".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
}

/// Issues and verifies stateless session tokens.
///
/// Layout before encoding: `expiry (i64 BE unix seconds) || user id || HMAC-SHA256 tag`,
/// carried as unpadded base64url.
#[derive(Clone)]
pub struct TokenCodec {
    keyed: HmacSha256,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(Error::Config("token secret cannot be empty".to_string()));
        }
        let keyed = HmacSha256::new_from_slice(&config.secret)
            .map_err(|e| Error::Config(format!("invalid token secret: {e}")))?;
        Ok(Self { keyed })
    }

    /// Builds a token for `user_id` that stops verifying at `expiry`.
    pub fn issue(&self, user_id: &str, expiry: DateTime<Utc>) -> Result<String> {
        if user_id.is_empty() {
            return Err(Error::invalid("user id cannot be empty"));
        }

        let mut token = Vec::with_capacity(EXPIRY_LENGTH + user_id.len() + TAG_LENGTH);
        token.extend_from_slice(&expiry.timestamp().to_be_bytes());
        token.extend_from_slice(user_id.as_bytes());

        let tag = self.tag(&token).finalize().into_bytes();
        token.extend_from_slice(&tag);

        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    pub fn verify(&self, token: &str) -> std::result::Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as of `now`. A token is valid strictly before its expiry.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, TokenError> {
        let data = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| TokenError::Malformed)?;
        if data.len() <= EXPIRY_LENGTH + TAG_LENGTH {
            return Err(TokenError::Malformed);
        }

        let (payload, tag) = data.split_at(data.len() - TAG_LENGTH);
        self.tag(payload)
            .verify_slice(tag)
            .map_err(|_| TokenError::BadSignature)?;

        let (expiry, user_id) = payload.split_at(EXPIRY_LENGTH);
        let expiry: [u8; EXPIRY_LENGTH] = expiry.try_into().map_err(|_| TokenError::Malformed)?;
        if now.timestamp() >= i64::from_be_bytes(expiry) {
            return Err(TokenError::Expired);
        }

        String::from_utf8(user_id.to_vec()).map_err(|_| TokenError::Malformed)
    }

    fn tag(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(payload);
        mac
    }
}
