//! # Listing Controller
//!
//! View-side state for a paginated, searchable listing.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ListingController                                 │
//! │                                                                         │
//! │  keystrokes ──► search_debounced("m"), ("mu"), ("mug")                 │
//! │                      │      │       │                                   │
//! │                      ✗      ✗       │  500ms of quiet                   │
//! │                  superseded         ▼                                   │
//! │                               ListingState::set_search("mug")          │
//! │                               (page reset to 1)                         │
//! │                                     │                                   │
//! │  pager ──► set_page(n) ─────────────┤                                   │
//! │                                     ▼                                   │
//! │                               refresh() ──► ListingSource::fetch       │
//! │                                     │                                   │
//! │                        Ok ──────────┴────────── Err                    │
//! │                        │                         │                      │
//! │                 replace current page      keep previous page,          │
//! │                 record page count         mark it stale,               │
//! │                                           return the error             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no in-flight cancellation: two overlapping refreshes both land,
//! and whichever response arrives last is displayed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use emporium_core::{ListingResult, ListingState, Pagination};

use crate::error::ClientResult;
use crate::listing::ListingSource;

/// Quiet period before a debounced search fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub struct ListingController<S: ListingSource> {
    source: S,
    state: Mutex<ListingState>,
    current: RwLock<Option<ListingResult<S::Item>>>,
    generation: AtomicU64,
    /// Set when the last refresh failed, so the displayed page no longer
    /// matches the state.
    stale: AtomicBool,
    debounce: Duration,
}

impl<S: ListingSource> ListingController<S> {
    /// A controller on page 1 with no search term and nothing loaded.
    pub fn new(source: S, page_size: u32) -> Self {
        ListingController {
            source,
            state: Mutex::new(ListingState::new(page_size)),
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            stale: AtomicBool::new(false),
            debounce: SEARCH_DEBOUNCE,
        }
    }

    /// Overrides the debounce quiet period.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Snapshot of the page/search state.
    pub async fn state(&self) -> ListingState {
        self.state.lock().await.clone()
    }

    /// Metadata of the displayed page, if one has loaded.
    pub async fn pagination(&self) -> Option<Pagination> {
        self.current.read().await.as_ref().map(ListingResult::pagination)
    }

    /// Fetches the page the state points at.
    ///
    /// On failure the previously displayed page is kept, marked stale, and
    /// the error is returned to the caller.
    pub async fn refresh(&self) -> ClientResult<()> {
        let request = self.state.lock().await.to_request()?;

        match self.source.fetch(&request).await {
            Ok(result) => {
                debug!(
                    page = result.page,
                    total = result.total,
                    page_count = result.page_count,
                    "Listing refreshed"
                );
                self.state.lock().await.observe(&result);
                *self.current.write().await = Some(result);
                self.stale.store(false, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                warn!(page = request.page, error = %e, "Listing refresh failed, keeping previous page");
                self.stale.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Applies a search term now, resetting to page 1.
    ///
    /// Supersedes any pending debounced search. Repeating the current term
    /// fetches again only if the last refresh failed.
    ///
    /// ## Returns
    /// Whether a fetch happened.
    pub async fn search(&self, term: &str) -> ClientResult<bool> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.apply_search(term).await
    }

    /// Applies a search term after the debounce period, unless a later
    /// `search`/`search_debounced` call arrives first.
    ///
    /// ## Returns
    /// `Ok(false)` when superseded, or when the term did not change and the
    /// displayed page is current.
    pub async fn search_debounced(&self, term: &str) -> ClientResult<bool> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(term, "Debounced search superseded");
            return Ok(false);
        }
        self.apply_search(term).await
    }

    async fn apply_search(&self, term: &str) -> ClientResult<bool> {
        let changed = self.state.lock().await.set_search(term);
        let stale = self.stale.load(Ordering::SeqCst) || self.current.read().await.is_none();
        if changed || stale {
            self.refresh().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Moves to `page` (clamped to the known page count) and fetches it.
    pub async fn set_page(&self, page: u32) -> ClientResult<bool> {
        let changed = self.state.lock().await.set_page(page);
        if changed {
            self.refresh().await?;
        }
        Ok(changed)
    }

    pub async fn next_page(&self) -> ClientResult<bool> {
        let changed = self.state.lock().await.next_page();
        if changed {
            self.refresh().await?;
        }
        Ok(changed)
    }

    pub async fn previous_page(&self) -> ClientResult<bool> {
        let changed = self.state.lock().await.previous_page();
        if changed {
            self.refresh().await?;
        }
        Ok(changed)
    }
}

impl<S> ListingController<S>
where
    S: ListingSource,
    S::Item: Clone,
{
    /// The displayed page, if one has loaded.
    pub async fn current(&self) -> Option<ListingResult<S::Item>> {
        self.current.read().await.clone()
    }

    /// Items of the displayed page; empty before the first successful fetch.
    pub async fn items(&self) -> Vec<S::Item> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|page| page.items.clone())
            .unwrap_or_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
