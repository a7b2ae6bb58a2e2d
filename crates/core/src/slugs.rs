//! Slugs
//!
//! Slugs are the public, URL-safe handles for catalog items and categories. They are derived
//! from a human title by [`generate_slug`] and made collision-free by [`resolve_unique`],
//! which probes a [`SlugRegistry`] for taken values and appends `-1`, `-2`, ... until a free
//! one is found.
//!
//! The resolver is a pre-check only. Uniqueness is enforced by the store's unique index; the
//! caller is expected to treat a constraint violation on insert as a signal to resolve again.

use thiserror::Error;

use crate::identifiers::{MAX_SLUG_LEN, parse_internal_id};

/// Highest numeric suffix tried before resolution gives up.
///
/// Reaching this bound means thousands of rows share one base slug, which is a data problem
/// rather than ordinary contention.
pub const MAX_SLUG_SUFFIX: u32 = 10_000;

/// Longest slug produced by [`generate_slug`].
///
/// Leaves room for a `-{n}` suffix up to [`MAX_SLUG_SUFFIX`] within [`MAX_SLUG_LEN`].
pub const MAX_BASE_SLUG_LEN: usize = MAX_SLUG_LEN - 6;

/// Errors raised while resolving a unique slug.
#[derive(Debug, Error)]
pub enum SlugError<E> {
    /// The registry could not answer an existence check.
    #[error("slug registry lookup failed")]
    Registry(#[source] E),

    /// Every suffix up to [`MAX_SLUG_SUFFIX`] is already taken.
    #[error("no free slug found for \"{candidate}\" after {MAX_SLUG_SUFFIX} attempts")]
    Exhausted {
        /// The base slug that could not be resolved.
        candidate: String,
    },
}

/// Existence check consulted by [`resolve_unique`].
///
/// Implementations decide which record (if any) is excluded from the check, so that an item
/// being renamed does not collide with its own current slug.
pub trait SlugRegistry {
    /// Error raised when the existence check cannot be answered.
    type Error;

    /// Returns `true` when `slug` is already held by another record.
    async fn slug_exists(&mut self, slug: &str) -> Result<bool, Self::Error>;
}

/// Derive a URL-safe slug from a human title.
///
/// The title is lower-cased, common Latin diacritics are folded to their ASCII base letter,
/// characters outside `[a-z0-9]`, whitespace and `-` are dropped, and runs of whitespace or
/// hyphens collapse into a single `-`. Leading and trailing separators never appear. Long
/// titles are cut to [`MAX_BASE_SLUG_LEN`].
///
/// The result is empty when the title has no alphanumeric characters; see
/// [`slug_or_fallback`].
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut separator_pending = false;

    for ch in title.chars().flat_map(char::to_lowercase).map(fold_diacritic) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if separator_pending && !slug.is_empty() {
                slug.push('-');
            }

            separator_pending = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            separator_pending = true;
        }
    }

    let len = truncate_slug(&slug, MAX_BASE_SLUG_LEN).len();

    slug.truncate(len);

    slug
}

/// Derive a slug, falling back to `{prefix}-{8 random hex digits}` when the title yields none.
///
/// Titles made only of punctuation or symbols would otherwise produce an empty slug, and every
/// such record would collide on the same empty key. A slug that would read as an internal id
/// is prefixed with `{prefix}-` so that it stays addressable as a slug.
pub fn slug_or_fallback(title: &str, prefix: &str) -> String {
    let slug = generate_slug(title);

    if parse_internal_id(&slug).is_some() {
        return format!("{prefix}-{slug}");
    }

    if !slug.is_empty() {
        return slug;
    }

    let suffix: u32 = rand::random();

    format!("{prefix}-{suffix:08x}")
}

/// Resolve `candidate` into a slug not currently held in `registry`.
///
/// Returns `candidate` unchanged when it is free, otherwise the first free
/// `{candidate}-{n}` for `n` counting up from 1. The base is shortened where needed so that
/// the result never exceeds [`MAX_SLUG_LEN`].
///
/// # Errors
///
/// Returns [`SlugError::Registry`] if an existence check fails, or [`SlugError::Exhausted`] if
/// no free suffix exists up to [`MAX_SLUG_SUFFIX`].
pub async fn resolve_unique<R>(
    candidate: &str,
    registry: &mut R,
) -> Result<String, SlugError<R::Error>>
where
    R: SlugRegistry,
{
    let candidate = truncate_slug(candidate, MAX_SLUG_LEN);

    if !registry
        .slug_exists(candidate)
        .await
        .map_err(SlugError::Registry)?
    {
        return Ok(candidate.to_owned());
    }

    for suffix in 1..=MAX_SLUG_SUFFIX {
        let suffix = format!("-{suffix}");
        let base = truncate_slug(candidate, MAX_SLUG_LEN - suffix.len());
        let slug = format!("{base}{suffix}");

        if !registry
            .slug_exists(&slug)
            .await
            .map_err(SlugError::Registry)?
        {
            return Ok(slug);
        }
    }

    Err(SlugError::Exhausted {
        candidate: candidate.to_owned(),
    })
}

/// Cut an ASCII slug to at most `max_len` bytes without leaving a trailing hyphen.
fn truncate_slug(slug: &str, max_len: usize) -> &str {
    slug.get(..max_len)
        .unwrap_or(slug)
        .trim_end_matches('-')
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ğ' => 'g',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' | 'ş' => 's',
        'ť' | 'ţ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
