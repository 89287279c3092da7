use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid page number")]
    InvalidPage,

    #[error("Invalid limit number")]
    InvalidLimit,
}

/// Page position requested by a list call. Derived per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self, PaginationError> {
        if page <= 0 {
            return Err(PaginationError::InvalidPage);
        }
        if limit <= 0 {
            return Err(PaginationError::InvalidLimit);
        }
        // The row offset must fit in an i64 for the OFFSET bind.
        if (page - 1).checked_mul(limit).is_none() {
            return Err(PaginationError::InvalidPage);
        }
        Ok(Self { page, limit })
    }

    /// Read `page` and `limit` from decoded query pairs.
    ///
    /// Missing or empty values take the defaults. `page=0` is treated as the
    /// first page; negative or non-numeric values are rejected.
    pub fn from_query(pairs: &[(String, String)]) -> Result<Self, PaginationError> {
        let page = match first_value(pairs, "page") {
            None | Some("") | Some("0") => DEFAULT_PAGE,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| PaginationError::InvalidPage)?,
        };

        let limit = match first_value(pairs, "limit") {
            None | Some("") => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| PaginationError::InvalidLimit)?,
        };

        Self::new(page, limit)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Number of pages needed for `total` items (ceiling division).
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total - 1) / self.limit + 1
    }
}

/// Paginated list envelope returned by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponsePayload<T> {
    pub total_item_count: i64,
    pub current_page: i64,
    pub item_limit: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,
}

impl<T> ResponsePayload<T> {
    /// Assemble the envelope. `path` and `query` are the request's own path
    /// and decoded query pairs; they are reused to build the neighbour links.
    pub fn build(
        items: Vec<T>,
        total: i64,
        request: PageRequest,
        path: &str,
        query: &[(String, String)],
    ) -> Self {
        let total_pages = request.total_pages(total);

        let next_page =
            (request.page < total_pages).then(|| page_url(path, query, request.page + 1));
        let prev_page = (request.page > 1).then(|| page_url(path, query, request.page - 1));

        Self {
            total_item_count: total,
            current_page: request.page,
            item_limit: request.limit,
            total_pages,
            items,
            next_page,
            prev_page,
        }
    }
}

/// Decode a raw query string into ordered key/value pairs.
pub fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}

/// All values supplied for `key`, in request order.
pub fn all_values<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

pub fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
}

/// Relative URL for `page`, keeping every other query parameter.
/// Keys are emitted in sorted order; repeated keys keep their relative order.
pub fn page_url(path: &str, query: &[(String, String)], page: i64) -> String {
    let mut pairs: Vec<(&str, String)> = query
        .iter()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    pairs.push(("page", page.to_string()));
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in &pairs {
        serializer.append_pair(k, v);
    }

    format!("{}?{}", path, serializer.finish())
}
