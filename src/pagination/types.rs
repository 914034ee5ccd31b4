//! Pagination types
//!
//! Defines the page shape consumed from index endpoints and the offset
//! arithmetic used to plan the remaining requests.

use crate::error::{Error, Result};
use crate::http::ApiResponse;
use crate::types::{JsonValue, Params};
use serde::Deserialize;

/// Query parameter carrying the page offset
pub const OFFSET_PARAM: &str = "offset";

/// Query parameter carrying the page size
pub const LIMIT_PARAM: &str = "limit";

/// Upper bound on the pages one `index_all` call will request
pub const MAX_PAGES: u64 = 100_000;

/// One page of an index result
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    /// Items on this page
    #[serde(default)]
    pub result: Vec<JsonValue>,
    /// Paging metadata
    pub pagination: PageInfo,
}

/// Paging metadata of an index response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageInfo {
    /// Total number of items across all pages
    pub total: u64,
}

impl Page {
    /// Decode a page from an index response body
    pub fn from_response(response: ApiResponse) -> Result<Self> {
        serde_json::from_value(response.body)
            .map_err(|e| Error::decode(format!("Index response is not a page: {e}")))
    }
}

/// Offset/limit pagination (`?offset=100&limit=50`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPaginator {
    /// Number of items per page
    pub limit: u32,
}

impl OffsetPaginator {
    /// Create a paginator, rejecting a zero page size
    pub fn new(limit: u32) -> Result<Self> {
        if limit == 0 {
            return Err(Error::config("maxLimit must be greater than zero"));
        }
        Ok(Self { limit })
    }

    /// Caller parameters plus offset and limit for one page
    pub fn params_for(&self, params: &Params, offset: u64) -> Params {
        let mut page_params = params.clone();
        page_params.insert(OFFSET_PARAM.to_string(), offset.to_string());
        page_params.insert(LIMIT_PARAM.to_string(), self.limit.to_string());
        page_params
    }

    /// Offsets of every page after the first, in order.
    ///
    /// `total` comes from the server; a total needing more than
    /// [`MAX_PAGES`] pages is rejected as a malformed page.
    pub fn remaining_offsets(&self, total: u64) -> Result<Vec<u64>> {
        let step = u64::from(self.limit);
        let pages = total.div_ceil(step);
        if pages > MAX_PAGES {
            return Err(Error::decode(format!(
                "Reported total {total} needs {pages} pages of {step}, more than {MAX_PAGES}"
            )));
        }
        // page < pages keeps page * step below total
        Ok((1..pages).map(|page| page * step).collect())
    }
}
