//! Session cookie tokens: `userId-expires-sha1(userId-passwd-expires-secret)`.

use crate::db::Database;
use crate::error::AppError;
use crate::schema::EntityDefinition;
use crate::service::{CrudService, Record};
use sha1::{Digest, Sha1};
use std::sync::Arc;

pub const COOKIE_NAME: &str = "awesession";
/// Session lifetime in seconds.
pub const SESSION_MAX_AGE: u64 = 86400;
pub const PASSWORD_MASK: &str = "******";

pub fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stored password form: `sha1(id:passwd)`, where `passwd` is the client-side sha1.
pub fn hash_password(user_id: &str, passwd: &str) -> String {
    sha1_hex(&format!("{}:{}", user_id, passwd))
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken {
    pub user_id: String,
    pub expires: i64,
    pub digest: String,
}

impl SessionToken {
    fn digest(user_id: &str, passwd: &str, expires: i64, secret: &str) -> String {
        sha1_hex(&format!("{}-{}-{}-{}", user_id, passwd, expires, secret))
    }

    /// Token for `user_id` valid for `max_age` seconds from now.
    pub fn issue(user_id: &str, passwd: &str, max_age: u64, secret: &str) -> Self {
        let expires = now_secs().saturating_add(max_age as i64);
        SessionToken {
            user_id: user_id.to_string(),
            expires,
            digest: Self::digest(user_id, passwd, expires, secret),
        }
    }

    /// Split a cookie value. Exactly three `-`-separated parts with a numeric expiry.
    pub fn parse(cookie: &str) -> Option<Self> {
        let parts: Vec<&str> = cookie.split('-').collect();
        let [user_id, expires, digest] = parts.as_slice() else {
            return None;
        };
        Some(SessionToken {
            user_id: user_id.to_string(),
            expires: expires.parse().ok()?,
            digest: digest.to_string(),
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires < now_secs()
    }

    pub fn matches(&self, passwd: &str, secret: &str) -> bool {
        self.digest == Self::digest(&self.user_id, passwd, self.expires, secret)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.user_id, self.expires, self.digest)
    }
}

/// Cookie value for a user record (uses its `id` and stored `passwd`).
pub fn user_to_cookie(user: &Record, max_age: u64, secret: &str) -> String {
    let id = user.get_str("id").unwrap_or_default();
    let passwd = user.get_str("passwd").unwrap_or_default();
    SessionToken::issue(id, passwd, max_age, secret).to_string()
}

/// Validate a session cookie and load its user, password masked.
/// Malformed, expired or forged tokens and unknown users all yield `None`.
pub async fn cookie_to_user(
    db: &Database,
    users: &Arc<EntityDefinition>,
    cookie: &str,
    secret: &str,
) -> Result<Option<Record>, AppError> {
    let Some(token) = SessionToken::parse(cookie) else {
        tracing::debug!("malformed session cookie");
        return Ok(None);
    };
    if token.is_expired() {
        tracing::debug!(user = %token.user_id, "session expired");
        return Ok(None);
    }
    let Some(mut user) = CrudService::find_by_key(db, users, token.user_id.as_str()).await? else {
        return Ok(None);
    };
    let passwd = user.get_str("passwd").unwrap_or_default().to_string();
    if !token.matches(&passwd, secret) {
        tracing::info!(user = %token.user_id, "invalid session digest");
        return Ok(None);
    }
    user.set("passwd", PASSWORD_MASK)?;
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_validates() {
        let token = SessionToken::issue("u1", "stored-hash", 3600, "AwEsOmE");
        let parsed = SessionToken::parse(&token.to_string()).unwrap();
        assert_eq!(parsed, token);
        assert!(!parsed.is_expired());
        assert!(parsed.matches("stored-hash", "AwEsOmE"));
        assert!(!parsed.matches("stored-hash", "other-secret"));
    }

    #[test]
    fn flipped_digest_character_fails() {
        let token = SessionToken::issue("u1", "stored-hash", 3600, "s").to_string();
        let mut chars: Vec<char> = token.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        let forged: String = chars.into_iter().collect();
        assert!(!SessionToken::parse(&forged).unwrap().matches("stored-hash", "s"));
    }

    #[test]
    fn malformed_cookies_are_rejected() {
        assert!(SessionToken::parse("a-b").is_none());
        assert!(SessionToken::parse("a-1-c-d").is_none());
        assert!(SessionToken::parse("a-notanumber-c").is_none());
    }

    #[test]
    fn expired_tokens_are_detected() {
        let token = SessionToken {
            user_id: "u1".into(),
            expires: now_secs() - 1,
            digest: String::new(),
        };
        assert!(token.is_expired());
    }

    #[test]
    fn sha1_matches_known_vector() {
        assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }
}
