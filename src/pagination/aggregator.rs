//! Index-all aggregation
//!
//! Reads the first page to learn the total, then requests every remaining
//! page at once and stitches the results together in offset order.

use super::types::{OffsetPaginator, Page};
use crate::error::Result;
use crate::http::RequestExecutor;
use crate::types::{JsonValue, Params};
use futures::future::try_join_all;
use tracing::debug;

/// Fetch every item of a collection.
///
/// Fails as a whole if any page request fails.
pub async fn index_all(
    executor: &RequestExecutor,
    resource: &str,
    params: &Params,
    max_limit: u32,
) -> Result<Vec<JsonValue>> {
    let paginator = OffsetPaginator::new(max_limit)?;

    let first = executor
        .index(resource, &paginator.params_for(params, 0))
        .await
        .and_then(Page::from_response)?;

    let offsets = paginator.remaining_offsets(first.pagination.total)?;
    debug!(
        "{resource}: {} items, fetching {} more pages",
        first.pagination.total,
        offsets.len()
    );

    let rest = try_join_all(offsets.into_iter().map(|offset| {
        let page_params = paginator.params_for(params, offset);
        async move {
            executor
                .index(resource, &page_params)
                .await
                .and_then(Page::from_response)
        }
    }))
    .await?;

    let mut items = first.result;
    for page in rest {
        items.extend(page.result);
    }
    Ok(items)
}
