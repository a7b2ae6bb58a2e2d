//! Integration tests for slug resolution and public identifiers.

use std::collections::HashSet;

use testresult::TestResult;
use uuid::Uuid;

use storefront::{
    identifiers::{MAX_SLUG_LEN, format_internal_id},
    prelude::*,
};

/// A set of taken slugs that records new ones as they are persisted.
#[derive(Debug, Default)]
struct Collection {
    slugs: HashSet<String>,
}

impl SlugRegistry for Collection {
    type Error = std::convert::Infallible;

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, Self::Error> {
        Ok(self.slugs.contains(slug))
    }
}

impl Collection {
    async fn insert(&mut self, title: &str) -> Result<String, SlugError<std::convert::Infallible>> {
        let slug = resolve_unique(&slug_or_fallback(title, "product"), self).await?;

        self.slugs.insert(slug.clone());

        Ok(slug)
    }
}

#[tokio::test]
async fn identical_titles_get_suffixed_slugs() -> TestResult {
    let mut products = Collection::default();

    assert_eq!(products.insert("Blue Tee").await?, "blue-tee");
    assert_eq!(products.insert("Blue Tee").await?, "blue-tee-1");
    assert_eq!(products.insert("blue  tee!").await?, "blue-tee-2");

    Ok(())
}

#[tokio::test]
async fn fallback_slugs_stay_unique_and_addressable() -> TestResult {
    let mut products = Collection::default();

    let first = products.insert("???").await?;
    let second = products.insert("!!!").await?;

    assert_ne!(first, second);

    for slug in [first, second] {
        assert_eq!(Identifier::parse(&slug)?, Identifier::Slug(slug.clone()));
    }

    Ok(())
}

#[test]
fn generated_slugs_parse_as_slugs() -> TestResult {
    for title in ["Blue Tee", "Crème Brûlée Mug", "2026 Winter Parka", "A"] {
        let slug = generate_slug(title);

        assert_eq!(Identifier::parse(&slug)?, Identifier::Slug(slug.clone()));
    }

    Ok(())
}

#[tokio::test]
async fn long_and_id_shaped_titles_stay_addressable_as_slugs() -> TestResult {
    let mut products = Collection::default();
    let long_title = "Limited Edition ".repeat(14);
    let id_title = "123e4567-e89b-12d3-a456-426614174000";

    let mut slugs = Vec::new();

    for title in [long_title.as_str(), long_title.as_str(), id_title, id_title] {
        slugs.push(products.insert(title).await?);
    }

    for slug in &slugs {
        assert_eq!(Identifier::parse(slug)?, Identifier::Slug(slug.clone()));
    }

    let unique: HashSet<&String> = slugs.iter().collect();

    assert_eq!(unique.len(), slugs.len(), "slugs must be distinct: {slugs:?}");

    Ok(())
}

#[tokio::test]
async fn suffixing_a_max_length_slug_stays_addressable() -> TestResult {
    let mut products = Collection::default();
    let title = "a".repeat(MAX_SLUG_LEN);

    products.slugs.insert(title.clone());

    let slug = resolve_unique(&title, &mut products).await?;

    assert!(slug.len() <= MAX_SLUG_LEN, "slug too long: {}", slug.len());
    assert_eq!(Identifier::parse(&slug)?, Identifier::Slug(slug.clone()));

    Ok(())
}

#[test]
fn ids_and_tokens_occupy_disjoint_syntax() -> TestResult {
    let secret = OrderTokenSecret::new("integration-secret")?;
    let id = Uuid::now_v7();
    let token = OrderToken::derive(id, &secret);

    assert_eq!(Identifier::parse(&format_internal_id(id))?, Identifier::Id(id));
    assert!(OrderToken::parse(&format_internal_id(id)).is_none());
    assert!(token.matches(id, &secret));

    Ok(())
}
