//! Catalog queries
//!
//! A [`CatalogQuery`] is the closed, validated form of the catalog listing's query string. It is
//! built from loosely typed [`CatalogParams`] and rejected eagerly when any value is malformed,
//! so nothing unvalidated reaches the store.
//!
//! Two pagination modes are supported. [`CatalogMode::Deterministic`] orders by creation time
//! and slices by page. [`CatalogMode::Randomized`] draws a fresh bounded random sample per
//! request and slices the page out of that sample; successive pages are therefore neither
//! stable nor disjoint, and the mode is meant for a single first impression only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::{Identifier, IdentifierError};

/// Page size used when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a request may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Upper bound on the random sample drawn in [`CatalogMode::Randomized`].
pub const RANDOM_SAMPLE_CAP: u64 = 1_000;

/// Longest free-text search accepted.
pub const MAX_SEARCH_LEN: usize = 200;

/// Validation failures for catalog query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogQueryError {
    /// `page` is not a positive integer.
    #[error("page must be a positive integer")]
    InvalidPage,

    /// `limit` is not an integer between 1 and [`MAX_PAGE_SIZE`].
    #[error("limit must be an integer between 1 and {MAX_PAGE_SIZE}")]
    InvalidPageSize,

    /// A price bound is not a non-negative integer.
    #[error("{0} must be a non-negative integer amount in minor units")]
    InvalidPrice(&'static str),

    /// The lower price bound exceeds the upper one.
    #[error("min_price must not exceed max_price")]
    InvertedPriceRange,

    /// `randomize` is not a recognised boolean.
    #[error("randomize must be true, false, 1 or 0")]
    InvalidRandomize,

    /// `search` is longer than [`MAX_SEARCH_LEN`].
    #[error("search must be at most {MAX_SEARCH_LEN} characters")]
    SearchTooLong,

    /// `category` is not a valid id or slug.
    #[error("invalid category: {0}")]
    InvalidCategory(#[source] IdentifierError),
}

/// Inclusive price bounds in minor units; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    min: Option<u64>,
    max: Option<u64>,
}

impl PriceRange {
    /// Build a price range.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogQueryError::InvertedPriceRange`] when both bounds are set and
    /// `min > max`.
    pub fn new(min: Option<u64>, max: Option<u64>) -> Result<Self, CatalogQueryError> {
        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(CatalogQueryError::InvertedPriceRange);
        }

        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> Option<u64> {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> Option<u64> {
        self.max
    }

    /// Check whether `price` falls inside the range.
    pub fn contains(&self, price: u64) -> bool {
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price <= max)
    }

    /// Check whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Conjunctive catalog filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Case-insensitive match against title or description.
    pub search: Option<String>,

    /// Category id or slug, resolved to an internal category id before filtering.
    pub category: Option<Identifier>,

    /// Inclusive price bounds.
    pub price: PriceRange,

    /// Membership test against an item's colour set.
    pub color: Option<String>,
}

impl CatalogFilter {
    /// Check whether no filter is applied.
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.category.is_none()
            && self.price.is_unbounded()
            && self.color.is_none()
    }
}

/// One-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Build a page request.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogQueryError::InvalidPage`] when `page` is zero, or
    /// [`CatalogQueryError::InvalidPageSize`] when `page_size` is zero or above
    /// [`MAX_PAGE_SIZE`].
    pub fn new(page: u32, page_size: u32) -> Result<Self, CatalogQueryError> {
        if page == 0 {
            return Err(CatalogQueryError::InvalidPage);
        }

        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CatalogQueryError::InvalidPageSize);
        }

        Ok(Self { page, page_size })
    }

    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Ordering strategy for a catalog page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMode {
    /// Newest first, sliced by page.
    #[default]
    Deterministic,

    /// A fresh random sample per request, sliced by page.
    Randomized,
}

impl CatalogMode {
    /// Metric/log label for the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Randomized => "randomized",
        }
    }
}

/// A validated catalog listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Filters applied to every mode.
    pub filter: CatalogFilter,

    /// Requested page.
    pub page: PageRequest,

    /// Ordering strategy.
    pub mode: CatalogMode,
}

impl CatalogQuery {
    /// Size of the random sample drawn for a filtered set of `total` items.
    pub fn sample_size(total: u64) -> u64 {
        total.min(RANDOM_SAMPLE_CAP)
    }
}

/// Raw catalog listing parameters as received from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogParams {
    /// One-based page number.
    pub page: Option<String>,

    /// Page size.
    pub limit: Option<String>,

    /// Free-text search.
    pub search: Option<String>,

    /// Category id or slug.
    pub category: Option<String>,

    /// Inclusive lower price bound in minor units.
    pub min_price: Option<String>,

    /// Inclusive upper price bound in minor units.
    pub max_price: Option<String>,

    /// Colour.
    pub color: Option<String>,

    /// Whether to draw a random sample.
    pub randomize: Option<String>,
}

impl TryFrom<CatalogParams> for CatalogQuery {
    type Error = CatalogQueryError;

    fn try_from(params: CatalogParams) -> Result<Self, Self::Error> {
        let page = parse_u32(params.page, 1).ok_or(CatalogQueryError::InvalidPage)?;
        let page_size =
            parse_u32(params.limit, DEFAULT_PAGE_SIZE).ok_or(CatalogQueryError::InvalidPageSize)?;

        let search = non_blank(params.search);

        if search
            .as_ref()
            .is_some_and(|search| search.chars().count() > MAX_SEARCH_LEN)
        {
            return Err(CatalogQueryError::SearchTooLong);
        }

        let category = non_blank(params.category)
            .map(|category| Identifier::parse(&category))
            .transpose()
            .map_err(CatalogQueryError::InvalidCategory)?;

        let price = PriceRange::new(
            parse_price(params.min_price, "min_price")?,
            parse_price(params.max_price, "max_price")?,
        )?;

        let mode = match non_blank(params.randomize).as_deref() {
            None | Some("false" | "0") => CatalogMode::Deterministic,
            Some("true" | "1") => CatalogMode::Randomized,
            Some(_) => return Err(CatalogQueryError::InvalidRandomize),
        };

        Ok(Self {
            filter: CatalogFilter {
                search,
                category,
                price,
                color: non_blank(params.color).map(|color| color.to_lowercase()),
            },
            page: PageRequest::new(page, page_size)?,
            mode,
        })
    }
}

/// Pagination metadata returned alongside every catalog page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// One-based page number.
    pub page: u32,

    /// Number of items per page.
    pub page_size: u32,

    /// Number of items reachable through pagination.
    pub total: u64,

    /// `ceil(total / page_size)`.
    pub total_pages: u64,

    /// Whether a later page exists.
    pub has_next: bool,

    /// Whether an earlier page exists.
    pub has_prev: bool,

    /// Whether items remain beyond this page.
    pub has_more: bool,
}

impl Pagination {
    /// Compute pagination metadata for `request` over `total` items.
    pub fn new(request: PageRequest, total: u64) -> Self {
        let page = u64::from(request.page);
        let page_size = u64::from(request.page_size);
        let total_pages = total.div_ceil(page_size);

        Self {
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
            has_more: page.saturating_mul(page_size) < total,
        }
    }
}

/// A page of items with its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,

    /// Pagination metadata.
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Convert every item, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }

    /// An empty page for `request`.
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::new(request, 0),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_u32(value: Option<String>, default: u32) -> Option<u32> {
    match non_blank(value) {
        None => Some(default),
        Some(value) => value.parse().ok(),
    }
}

fn parse_price(
    value: Option<String>,
    name: &'static str,
) -> Result<Option<u64>, CatalogQueryError> {
    non_blank(value)
        .map(|value| value.parse::<u64>())
        .transpose()
        .map_err(|_parse_error| CatalogQueryError::InvalidPrice(name))
}
