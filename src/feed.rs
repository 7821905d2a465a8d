//! Incremental catalog feed.
//!
//! A [`Feed`] models one infinite-scrolling list: it starts from a seeded
//! first page, asks for the next page when the view reports its sentinel
//! row as visible, and flattens every fetched page into one ordered run of
//! items. The feed performs no I/O itself. Callers pump it by taking a
//! [`FetchRequest`] from [`Feed::sentinel_visible`], performing the fetch
//! however they like, and handing the outcome back to [`Feed::complete`]
//! or [`Feed::fail`]. [`advance`] wires those steps to a [`PageFetcher`]
//! for callers that fetch inline.

use crate::model::Page;

/// Where a feed currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// Seeded with the first page; nothing has been fetched yet.
    Initial,
    /// A fetch for the next page is in flight.
    LoadingNext,
    /// At least one fetch landed and more pages remain.
    Ready,
    /// The final page has been folded in; the sentinel stays quiet.
    Exhausted,
    /// A fetch failed; the stored message should be shown instead of
    /// further content. Only [`Feed::invalidate`] leaves this phase.
    Errored,
}

/// A fetch the caller should run on the feed's behalf.
///
/// Completions are matched back to the feed through a private generation
/// stamp, so answers to fetches issued before an [`Feed::invalidate`] are
/// dropped instead of corrupting the refreshed list.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Opaque cursor to request, absent for the first page.
    pub cursor: Option<String>,
    /// Page size to request.
    pub limit: u32,
    generation: u64,
}

/// Performs page fetches for [`advance`] and [`refresh`].
///
/// The error string is the message a view would display; transport and
/// server failures are already folded into it.
pub trait PageFetcher<T> {
    fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        limit: u32,
    ) -> std::result::Result<Page<T>, String>;
}

/// Order-preserving accumulation of one paginated catalog listing.
#[derive(Debug)]
pub struct Feed<T> {
    phase: FeedPhase,
    items: Vec<T>,
    next_cursor: Option<String>,
    limit: u32,
    in_flight: bool,
    generation: u64,
    error: Option<String>,
}

impl<T> Feed<T> {
    /// Builds a feed from the server-rendered first page.
    pub fn seeded(limit: u32, first: Page<T>) -> Feed<T> {
        Feed {
            phase: FeedPhase::Initial,
            items: first.items,
            next_cursor: first.next_cursor,
            limit,
            in_flight: false,
            generation: 0,
            error: None,
        }
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    /// Every item fetched so far, in catalog order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// The message from the failed fetch, while errored.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A filtered view over the accumulated items. The underlying list is
    /// untouched, so flipping the filter off restores the full run.
    pub fn filtered<'a, F>(&'a self, mut keep: F) -> impl Iterator<Item = &'a T>
    where
        F: FnMut(&T) -> bool + 'a,
    {
        self.items.iter().filter(move |item| keep(item))
    }

    /// Reports that the sentinel row scrolled into view.
    ///
    /// Returns the fetch to run, or `None` when nothing should happen:
    /// a fetch is already in flight, the catalog is exhausted, or the feed
    /// is errored. Repeated sentinel events are therefore harmless.
    pub fn sentinel_visible(&mut self) -> Option<FetchRequest> {
        match self.phase {
            FeedPhase::Initial | FeedPhase::Ready => {}
            FeedPhase::LoadingNext | FeedPhase::Exhausted | FeedPhase::Errored => return None,
        }
        if self.in_flight {
            return None;
        }
        if self.next_cursor.is_none() {
            self.phase = FeedPhase::Exhausted;
            return None;
        }
        self.in_flight = true;
        self.phase = FeedPhase::LoadingNext;
        Some(FetchRequest {
            cursor: self.next_cursor.clone(),
            limit: self.limit,
            generation: self.generation,
        })
    }

    /// Folds a fetched page into the feed.
    ///
    /// Items are appended as-is behind the existing run; the endpoint's
    /// stable ordering is what keeps the flattened list free of gaps and
    /// repeats. Completions for a superseded generation are dropped.
    pub fn complete(&mut self, request: &FetchRequest, page: Page<T>) {
        if request.generation != self.generation {
            return;
        }
        self.in_flight = false;
        self.items.extend(page.items);
        self.next_cursor = page.next_cursor;
        self.error = None;
        self.phase = if self.next_cursor.is_some() {
            FeedPhase::Ready
        } else {
            FeedPhase::Exhausted
        };
    }

    /// Records a failed fetch. The items gathered so far stay readable,
    /// but the feed stops issuing fetches until invalidated.
    pub fn fail(&mut self, request: &FetchRequest, message: impl Into<String>) {
        if request.generation != self.generation {
            return;
        }
        self.in_flight = false;
        self.error = Some(message.into());
        self.phase = FeedPhase::Errored;
    }

    /// Drops the accumulated list and starts over from the first page.
    ///
    /// Used after an ownership mutation: the catalog's owner columns have
    /// changed, so every cached page is stale. Outstanding completions
    /// from before the call no longer match the generation and are
    /// ignored when they arrive.
    pub fn invalidate(&mut self) -> FetchRequest {
        self.generation += 1;
        self.items.clear();
        self.next_cursor = None;
        self.error = None;
        self.in_flight = true;
        self.phase = FeedPhase::LoadingNext;
        FetchRequest {
            cursor: None,
            limit: self.limit,
            generation: self.generation,
        }
    }
}

/// Runs one sentinel step against a fetcher. Returns `true` when a fetch
/// actually happened.
pub fn advance<T, F>(feed: &mut Feed<T>, fetcher: &mut F) -> bool
where
    F: PageFetcher<T> + ?Sized,
{
    let Some(request) = feed.sentinel_visible() else {
        return false;
    };
    match fetcher.fetch_page(request.cursor.as_deref(), request.limit) {
        Ok(page) => feed.complete(&request, page),
        Err(message) => feed.fail(&request, message),
    }
    true
}

/// Invalidates the feed and refetches the first page inline.
pub fn refresh<T, F>(feed: &mut Feed<T>, fetcher: &mut F)
where
    F: PageFetcher<T> + ?Sized,
{
    let request = feed.invalidate();
    match fetcher.fetch_page(request.cursor.as_deref(), request.limit) {
        Ok(page) => feed.complete(&request, page),
        Err(message) => feed.fail(&request, message),
    }
}
