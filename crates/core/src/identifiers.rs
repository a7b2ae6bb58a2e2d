//! Public identifiers
//!
//! Catalog items and categories are addressed publicly either by their internal id or by their
//! slug. The two occupy disjoint syntactic spaces: an internal id is a UUID written as 32 hex
//! digits (or the 36 character hyphenated form), while a slug is lowercase ASCII letters,
//! digits and single hyphens.

use std::{fmt, str::FromStr};

use thiserror::Error;
use uuid::Uuid;

/// Longest slug accepted as an identifier.
pub const MAX_SLUG_LEN: usize = 200;

const SIMPLE_ID_LEN: usize = 32;
const HYPHENATED_ID_LEN: usize = 36;

/// Errors raised when parsing a public identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier is empty.
    #[error("identifier is empty")]
    Empty,

    /// The identifier is neither an internal id nor a well-formed slug.
    #[error("identifier \"{0}\" is not a valid id or slug")]
    Malformed(String),
}

/// A parsed public identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// An internal id.
    Id(Uuid),

    /// A slug.
    Slug(String),
}

impl Identifier {
    /// Parse a public identifier, trying the internal-id syntax first.
    ///
    /// Slugs are matched case-insensitively and normalised to lowercase.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentifierError`] when the value is empty or matches neither syntax.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let value = value.trim();

        if value.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if let Some(id) = parse_internal_id(value) {
            return Ok(Self::Id(id));
        }

        let slug = value.to_ascii_lowercase();

        if is_valid_slug(&slug) {
            Ok(Self::Slug(slug))
        } else {
            Err(IdentifierError::Malformed(value.to_owned()))
        }
    }

    /// The slug, when this identifier is one.
    pub fn as_slug(&self) -> Option<&str> {
        match self {
            Self::Slug(slug) => Some(slug),
            Self::Id(_) => None,
        }
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id.simple()),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Parse `value` as an internal id.
///
/// Only the fixed-length forms are accepted: 32 hex digits, or the 36 character hyphenated
/// UUID. Braced and URN forms are rejected so that nothing resembling a slug is ever treated
/// as an id.
pub fn parse_internal_id(value: &str) -> Option<Uuid> {
    match value.len() {
        SIMPLE_ID_LEN if value.bytes().all(|b| b.is_ascii_hexdigit()) => {
            Uuid::try_parse(value).ok()
        }
        HYPHENATED_ID_LEN => Uuid::try_parse(value).ok(),
        _ => None,
    }
}

/// Render an internal id in its public, 32 hex digit form.
pub fn format_internal_id(id: Uuid) -> String {
    id.simple().to_string()
}

/// Check that `value` is a well-formed slug.
///
/// A slug is 1 to [`MAX_SLUG_LEN`] characters of `[a-z0-9]` separated by single hyphens, with
/// no leading or trailing hyphen.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SLUG_LEN
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
