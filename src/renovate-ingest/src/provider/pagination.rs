//! Lazy, bounded pagination over provider page methods.

use super::{
    PageCursor, ProviderError, ProviderPage, PullRequestFilter, RepositoryOwner, ScmProvider,
};
use crate::model::{RawPullRequest, Repository};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::future::Future;
use tracing::warn;

/// Hard upper bound on pages fetched for a single listing.
pub const MAX_PAGES: usize = 1000;

struct PageState<F> {
    fetch: F,
    cursor: Option<PageCursor>,
    seen: HashSet<PageCursor>,
    pages: usize,
}

/// Turns a page-fetching function into a lazy stream of items.
///
/// Pages are fetched sequentially, starting at [`PageCursor::First`]. The
/// stream ends when a page has no successor, when a cursor would be visited
/// a second time, or after [`MAX_PAGES`] pages. The first error ends the
/// stream.
pub fn paginate<'a, T, F, Fut>(fetch: F) -> BoxStream<'a, Result<T, ProviderError>>
where
    T: Send + 'a,
    F: FnMut(PageCursor) -> Fut + Send + 'a,
    Fut: Future<Output = Result<ProviderPage<T>, ProviderError>> + Send + 'a,
{
    let state = PageState {
        fetch,
        cursor: Some(PageCursor::First),
        seen: HashSet::new(),
        pages: 0,
    };

    stream::try_unfold(state, |mut state| async move {
        let Some(cursor) = state.cursor.take() else {
            return Ok(None);
        };
        if state.pages >= MAX_PAGES {
            warn!(max = MAX_PAGES, "Reached maximum page count, stopping");
            return Ok(None);
        }

        let page = (state.fetch)(cursor.clone()).await?;
        state.pages += 1;
        state.seen.insert(cursor);
        state.cursor = match page.next {
            Some(next) if state.seen.contains(&next) => {
                warn!(cursor = ?next, "Provider repeated a page cursor, stopping");
                None
            }
            next => next,
        };

        let items = stream::iter(page.items.into_iter().map(Ok));
        Ok(Some((items, state)))
    })
    .try_flatten()
    .boxed()
}

/// Streams every pull request of `repository`, in any state.
pub fn list_pull_requests<'a>(
    provider: &'a dyn ScmProvider,
    repository: &'a str,
    filter: &'a PullRequestFilter,
) -> BoxStream<'a, Result<RawPullRequest, ProviderError>> {
    paginate(move |cursor| provider.pull_request_page(repository, filter, cursor))
}

/// Streams every repository belonging to `owner`.
pub fn list_repositories<'a>(
    provider: &'a dyn ScmProvider,
    owner: &'a RepositoryOwner,
) -> BoxStream<'a, Result<Repository, ProviderError>> {
    paginate(move |cursor| provider.repository_page(owner, cursor))
}
