//! Bounded-concurrency fetching of numbered pages.

use std::{future::Future, ops::Range};

use futures::{StreamExt, TryStreamExt, stream};

/// Fetches every page in `pages` with at most `concurrency` requests in flight.
///
/// Results are returned sorted by page number. The first failure drops all
/// requests still pending and is returned as is.
pub async fn fetch_pages<T, E, F, Fut>(
    pages: Range<u32>,
    concurrency: usize,
    fetch: F,
) -> Result<Vec<(u32, Vec<T>)>, E>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut fetched: Vec<(u32, Vec<T>)> = stream::iter(pages)
        .map(|page| {
            let fut = fetch(page);
            async move { fut.await.map(|rows| (page, rows)) }
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;
    fetched.sort_unstable_by_key(|(page, _)| *page);
    Ok(fetched)
}
