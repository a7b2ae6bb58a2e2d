//! Opaque order tokens
//!
//! Orders are never addressed publicly by their internal id. Instead each order carries a
//! short token derived from the id with HMAC-SHA256 under a process-wide secret and truncated
//! to [`ORDER_TOKEN_LEN`] hex digits.
//!
//! The derivation is one-way, so a token does not reveal the id it came from, and it is
//! deterministic, so the server can recompute any order's token from the id and secret without
//! a stored mapping.

use std::{fmt, str::FromStr};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Number of hex digits in an order token.
pub const ORDER_TOKEN_LEN: usize = 12;

/// Errors raised while building secrets or parsing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderTokenError {
    /// The secret is empty.
    #[error("order token secret must not be empty")]
    EmptySecret,

    /// The secret could not be used as an HMAC key.
    #[error("order token secret is not a valid HMAC key")]
    InvalidSecret,

    /// The value is not a well-formed order token.
    #[error("order token is malformed")]
    Malformed,
}

/// Server-side secret keying order token derivation.
///
/// The raw secret bytes are wiped once the HMAC key schedule has been built.
#[derive(Clone)]
pub struct OrderTokenSecret {
    mac: HmacSha256,
}

impl OrderTokenSecret {
    /// Build a secret from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`OrderTokenError::EmptySecret`] when `secret` is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, OrderTokenError> {
        let mut secret = secret.into();

        if secret.is_empty() {
            return Err(OrderTokenError::EmptySecret);
        }

        let mac = HmacSha256::new_from_slice(&secret);

        secret.zeroize();

        mac.map(|mac| Self { mac })
            .map_err(|_invalid_length| OrderTokenError::InvalidSecret)
    }
}

impl fmt::Debug for OrderTokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderTokenSecret(**redacted**)")
    }
}

/// Public, opaque order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderToken(String);

impl OrderToken {
    /// Derive the token for the order with internal id `id`.
    pub fn derive(id: Uuid, secret: &OrderTokenSecret) -> Self {
        let mut mac = secret.mac.clone();

        mac.update(id.simple().to_string().as_bytes());

        let mut token = hex::encode(mac.finalize().into_bytes());

        token.truncate(ORDER_TOKEN_LEN);

        Self(token)
    }

    /// Parse a token, normalising hex digits to lowercase.
    ///
    /// Returns `None` when `value` is not exactly [`ORDER_TOKEN_LEN`] hex digits. In particular
    /// an internal order id never parses as a token.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        (value.len() == ORDER_TOKEN_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| Self(value.to_ascii_lowercase()))
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this token belongs to the order with internal id `id`.
    pub fn matches(&self, id: Uuid, secret: &OrderTokenSecret) -> bool {
        Self::derive(id, secret) == *self
    }
}

impl FromStr for OrderToken {
    type Err = OrderTokenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or(OrderTokenError::Malformed)
    }
}

impl TryFrom<String> for OrderToken {
    type Error = OrderTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderToken> for String {
    fn from(token: OrderToken) -> Self {
        token.0
    }
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn secret(value: &str) -> OrderTokenSecret {
        OrderTokenSecret::new(value).expect("test secret should be valid")
    }

    #[test]
    fn derive_is_deterministic() {
        let id = Uuid::now_v7();
        let secret = secret("s3cret");

        assert_eq!(OrderToken::derive(id, &secret), OrderToken::derive(id, &secret));
    }

    #[test]
    fn derive_changes_with_id() {
        let secret = secret("s3cret");

        assert_ne!(
            OrderToken::derive(Uuid::now_v7(), &secret),
            OrderToken::derive(Uuid::now_v7(), &secret)
        );
    }

    #[test]
    fn derive_changes_with_secret() {
        let id = Uuid::now_v7();

        assert_ne!(
            OrderToken::derive(id, &secret("first")),
            OrderToken::derive(id, &secret("second"))
        );
    }

    #[test]
    fn derive_has_fixed_length_lowercase_hex() {
        for id in [Uuid::nil(), Uuid::from_u128(u128::MAX), Uuid::now_v7()] {
            let token = OrderToken::derive(id, &secret("s3cret"));

            assert_eq!(token.as_str().len(), ORDER_TOKEN_LEN);
            assert!(
                token
                    .as_str()
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)),
                "expected lowercase hex, got {token}"
            );
        }
    }

    #[test]
    fn token_does_not_contain_the_id() {
        let id = Uuid::now_v7();
        let token = OrderToken::derive(id, &secret("s3cret"));

        assert!(!id.simple().to_string().contains(token.as_str()));
    }

    #[test]
    fn parse_accepts_derived_tokens() -> TestResult {
        let token = OrderToken::derive(Uuid::now_v7(), &secret("s3cret"));

        assert_eq!(token.as_str().parse::<OrderToken>()?, token);

        Ok(())
    }

    #[test]
    fn parse_normalises_uppercase() {
        assert_eq!(
            OrderToken::parse("ABCDEF012345").map(|token| token.to_string()),
            Some("abcdef012345".to_owned())
        );
    }

    #[test]
    fn parse_rejects_internal_ids() {
        let id = Uuid::now_v7();

        assert!(OrderToken::parse(&id.simple().to_string()).is_none());
        assert!(OrderToken::parse(&id.to_string()).is_none());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(OrderToken::parse("zzzzzzzzzzzz").is_none());
        assert!(OrderToken::parse("abc").is_none());
    }

    #[test]
    fn matches_recomputes_from_id() {
        let id = Uuid::now_v7();
        let secret = secret("s3cret");
        let token = OrderToken::derive(id, &secret);

        assert!(token.matches(id, &secret));
        assert!(!token.matches(Uuid::now_v7(), &secret));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            OrderTokenSecret::new(""),
            Err(OrderTokenError::EmptySecret)
        ));
    }

    #[test]
    fn secret_debug_is_redacted() {
        assert_eq!(
            format!("{:?}", secret("s3cret")),
            "OrderTokenSecret(**redacted**)"
        );
    }

    #[test]
    fn serde_rejects_malformed_tokens() {
        let result = serde_json::from_str::<OrderToken>("\"not-a-token\"");

        assert!(result.is_err());
    }
}
