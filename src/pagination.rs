//! Offset pagination over registry listings.
//!
//! Pages are requested strictly in order. A page shorter than the requested
//! size is the only termination signal, so an exactly-full last page costs
//! one extra (empty) request.

use crate::error::{ZdaoError, ZdaoResult};
use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;
use tracing::debug;

/// Stream every item produced by `fetch_page(offset, limit)`.
///
/// The stream is finite and restartable by calling `paged` again; it is not
/// resumable mid-way since the underlying set can grow between pages.
pub fn paged<'a, T, F, Fut>(
    page_size: u32,
    mut fetch_page: F,
) -> impl Stream<Item = ZdaoResult<T>> + 'a
where
    T: 'a,
    F: FnMut(u64, u32) -> Fut + 'a,
    Fut: Future<Output = ZdaoResult<Vec<T>>> + 'a,
{
    stream::try_unfold(Some(0u64), move |cursor| {
        let next_page = if page_size == 0 {
            Err(ZdaoError::invalid("page size must be at least 1"))
        } else {
            Ok(cursor.map(|offset| (offset, fetch_page(offset, page_size))))
        };

        async move {
            let Some((offset, page)) = next_page? else {
                return Ok(None);
            };

            let items = page.await?;
            let fetched = items.len() as u64;
            debug!(offset, fetched, page_size, "page fetched");

            let next = if fetched < u64::from(page_size) {
                None
            } else {
                Some(offset + fetched)
            };
            Ok::<_, ZdaoError>(Some((
                stream::iter(items.into_iter().map(Ok::<T, ZdaoError>)),
                next,
            )))
        }
    })
    .try_flatten()
}
