//! Pagination module
//!
//! Supports offset/limit index endpoints that report a total count:
//!
//! ```json
//! { "result": [ ... ], "pagination": { "total": 1234 } }
//! ```
//!
//! # Overview
//!
//! `index_all` fetches the first page, plans the remaining offsets from the
//! reported total, fetches those pages concurrently and returns all items in
//! offset order.

mod aggregator;
mod types;

pub use aggregator::index_all;
pub use types::{OffsetPaginator, Page, PageInfo, LIMIT_PARAM, MAX_PAGES, OFFSET_PARAM};

#[cfg(test)]
mod tests;
