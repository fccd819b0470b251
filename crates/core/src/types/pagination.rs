//! Product list pagination, filtering and sorting.
//!
//! [`ProductQuery`] is the validated form of the `limit`, `page`, `sort` and
//! `query` parameters accepted by the product list endpoints. [`PageInfo`]
//! holds the page/link metadata returned alongside each page.
//!
//! The `query` parameter doubles as a filter: `true`/`false` filter by
//! availability, anything else filters by exact category.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::product::Product;

/// Errors produced while parsing list parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("limit must be an integer between 1 and {max}, got '{value}'")]
    InvalidLimit { value: String, max: u32 },
    #[error("page must be a positive integer, got '{0}'")]
    InvalidPage(String),
    #[error("sort must be 'asc' or 'desc', got '{0}'")]
    InvalidSort(String),
}

/// Price sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Query-string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(QueryError::InvalidSort(s.to_owned())),
        }
    }
}

/// Product list filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductFilter {
    /// Exact category match.
    Category(String),
    /// Match on the `status` flag.
    Availability(bool),
}

impl ProductFilter {
    /// Interpret a raw `query` parameter.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Availability(true),
            "false" => Self::Availability(false),
            category => Self::Category(category.to_owned()),
        }
    }

    /// Whether a product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::Category(category) => product.category == *category,
            Self::Availability(status) => product.status == *status,
        }
    }

    /// The raw `query` value that produces this filter.
    #[must_use]
    pub fn as_query_value(&self) -> &str {
        match self {
            Self::Category(category) => category,
            Self::Availability(true) => "true",
            Self::Availability(false) => "false",
        }
    }
}

/// Raw list parameters as they arrive in a query string.
///
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQueryParams {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub query: Option<String>,
}

/// Validated product list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub limit: u32,
    pub page: u32,
    pub sort: Option<SortOrder>,
    pub filter: Option<ProductFilter>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            page: 1,
            sort: None,
            filter: None,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl ProductQuery {
    /// Page size when `limit` is absent.
    pub const DEFAULT_LIMIT: u32 = 10;
    /// Largest accepted page size.
    pub const MAX_LIMIT: u32 = 100;

    /// Validate raw query parameters.
    ///
    /// # Errors
    ///
    /// Returns `QueryError` if `limit` is not in `1..=100`, `page` is not a
    /// positive integer, or `sort` is neither `asc` nor `desc`.
    pub fn from_params(params: &ProductQueryParams) -> Result<Self, QueryError> {
        let limit = match non_empty(params.limit.as_ref()) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|l| (1..=Self::MAX_LIMIT).contains(l))
                .ok_or_else(|| QueryError::InvalidLimit {
                    value: raw.to_owned(),
                    max: Self::MAX_LIMIT,
                })?,
            None => Self::DEFAULT_LIMIT,
        };

        let page = match non_empty(params.page.as_ref()) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| QueryError::InvalidPage(raw.to_owned()))?,
            None => 1,
        };

        let sort = non_empty(params.sort.as_ref())
            .map(SortOrder::from_str)
            .transpose()?;

        let filter = non_empty(params.query.as_ref()).map(ProductFilter::parse);

        Ok(Self {
            limit,
            page,
            sort,
            filter,
        })
    }

    /// Number of items skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Filter, sort and slice an in-memory product list.
    ///
    /// Without a sort order products keep ID order; with one, ties on price
    /// fall back to ID order.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Page<Product> {
        let mut matching: Vec<&Product> = products
            .iter()
            .filter(|p| self.filter.as_ref().is_none_or(|f| f.matches(p)))
            .collect();

        match self.sort {
            Some(SortOrder::Asc) => matching.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
            Some(SortOrder::Desc) => matching.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
            None => matching.sort_by_key(|p| p.id),
        }

        let total = matching.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(self.limit as usize)
            .cloned()
            .collect();

        Page {
            items,
            info: PageInfo::new(total, self.page, self.limit),
        }
    }

    /// Build a link to another page of the same query.
    ///
    /// ```
    /// use mercado_core::{ProductFilter, ProductQuery, SortOrder};
    ///
    /// let query = ProductQuery {
    ///     limit: 5,
    ///     page: 1,
    ///     sort: Some(SortOrder::Desc),
    ///     filter: Some(ProductFilter::Category("home & garden".into())),
    /// };
    /// assert_eq!(
    ///     query.link_for("/api/products", 2),
    ///     "/api/products?page=2&limit=5&sort=desc&query=home+%26+garden"
    /// );
    /// ```
    #[must_use]
    pub fn link_for(&self, base_path: &str, page: u32) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer
            .append_pair("page", &page.to_string())
            .append_pair("limit", &self.limit.to_string());
        if let Some(sort) = self.sort {
            serializer.append_pair("sort", sort.as_str());
        }
        if let Some(filter) = &self.filter {
            serializer.append_pair("query", filter.as_query_value());
        }
        format!("{base_path}?{}", serializer.finish())
    }
}

/// Page metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total_items: u64,
    pub total_pages: u32,
    pub page: u32,
    pub limit: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl PageInfo {
    /// Compute metadata for `page` of a result set of `total_items`.
    ///
    /// There is always at least one page, even when nothing matches. A page
    /// past the end still reports a previous page so clients can walk back.
    #[must_use]
    pub fn new(total_items: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages =
            u32::try_from(total_items.div_ceil(u64::from(limit)).max(1)).unwrap_or(u32::MAX);
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Self {
            total_items,
            total_pages,
            page,
            limit,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}
