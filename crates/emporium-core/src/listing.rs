//! # Listing Module
//!
//! The paginated, searchable listing contract shared by the products and
//! users listings.
//!
//! ## Request → Result
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ListingRequest { page: 3, page_size: 10, search: "mug" }              │
//! │       │                                                                 │
//! │       ├──► PageWindow   { skip: 20, take: 10 }      (OFFSET / LIMIT)   │
//! │       └──► SearchFilter { "%mug%" }                 (LIKE ... ESCAPE)  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  store: COUNT(*) with filter ──┐   (two independent reads,             │
//! │  store: SELECT page w/ filter ─┤    total may drift under writes)      │
//! │                                ▼                                        │
//! │  ListingResult { items[≤10], total: 23, page: 3, page_count: 3 }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items are always ordered by `created_at DESC, id ASC`. The stores in
//! emporium-db execute the queries; everything here is arithmetic.
//!
//! ## Example
//! ```rust
//! use emporium_core::listing::{ListingRequest, ListingResult};
//!
//! let request = ListingRequest::new(3, 10, "").unwrap();
//! assert_eq!(request.window().skip, 20);
//!
//! let result = ListingResult::new(vec!["a", "b", "c"], 23, &request);
//! assert_eq!(result.page_count, 3);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ListingError;
use crate::validation::{validate_page, validate_page_size, validate_search_query};
use crate::DEFAULT_PAGE_SIZE;

// =============================================================================
// Listing Request
// =============================================================================

/// A validated request for one page of a listing.
///
/// The search term is stored trimmed. An empty term means "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingRequest {
    /// 1-based page number.
    pub page: u32,
    /// Items per page (1..=MAX_PAGE_SIZE).
    pub page_size: u32,
    /// Trimmed search term, possibly empty.
    pub search: String,
}

impl ListingRequest {
    /// Builds and validates a request.
    ///
    /// ## Errors
    /// `ListingError::InvalidRequest` when `page < 1`, `page_size` is outside
    /// `1..=MAX_PAGE_SIZE`, or the trimmed search term exceeds 100 characters.
    pub fn new(page: i64, page_size: i64, search: &str) -> Result<Self, ListingError> {
        Ok(ListingRequest {
            page: validate_page(page)?,
            page_size: validate_page_size(page_size)?,
            search: validate_search_query(search)?,
        })
    }

    /// Re-checks a request whose public fields may have been edited in place.
    pub fn validate(&self) -> Result<(), ListingError> {
        validate_page(self.page as i64)?;
        validate_page_size(self.page_size as i64)?;
        validate_search_query(&self.search)?;
        Ok(())
    }

    /// OFFSET/LIMIT for this request.
    pub fn window(&self) -> PageWindow {
        PageWindow::from(self)
    }

    /// Search filter for this request.
    pub fn filter(&self) -> SearchFilter {
        SearchFilter::new(&self.search)
    }
}

impl Default for ListingRequest {
    fn default() -> Self {
        ListingRequest {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
        }
    }
}

// =============================================================================
// Page Window
// =============================================================================

/// The slice of the ordered result set a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Rows to skip: `(page - 1) * page_size`.
    pub skip: u64,
    /// Rows to take: `page_size`.
    pub take: u32,
}

impl PageWindow {
    /// SQL `OFFSET` (SQLite binds integers as i64).
    pub fn offset(&self) -> i64 {
        i64::try_from(self.skip).unwrap_or(i64::MAX)
    }

    /// SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.take as i64
    }

    /// Number of items this window holds out of `total`.
    ///
    /// `min(take, total - skip)` when `skip < total`, else 0.
    pub fn expected_len(&self, total: u64) -> u64 {
        total.saturating_sub(self.skip).min(self.take as u64)
    }
}

impl From<&ListingRequest> for PageWindow {
    fn from(request: &ListingRequest) -> Self {
        PageWindow {
            skip: (request.page as u64 - 1) * request.page_size as u64,
            take: request.page_size,
        }
    }
}

// =============================================================================
// Search Filter
// =============================================================================

/// Case-insensitive substring filter over two text fields.
///
/// ## Matching
/// ```text
/// term "50%_off"  ──►  LIKE '%50\%\_off%' ESCAPE '\'
///                      (wildcards in the term match literally)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilter {
    term: Option<String>,
}

impl SearchFilter {
    /// Builds a filter from a raw term. Blank terms produce no filter.
    pub fn new(term: &str) -> Self {
        let term = term.trim();
        SearchFilter {
            term: (!term.is_empty()).then(|| term.to_string()),
        }
    }

    /// True when every row passes.
    pub fn is_empty(&self) -> bool {
        self.term.is_none()
    }

    /// The trimmed term, if any.
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    /// `LIKE` pattern with `\`, `%` and `_` escaped, wrapped in `%...%`.
    ///
    /// Must be paired with `ESCAPE '\'` in SQL.
    pub fn like_pattern(&self) -> Option<String> {
        self.term.as_ref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for c in term.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }

    /// In-memory evaluation of the same predicate: any field contains the
    /// term, ignoring case. Absent fields never match.
    pub fn matches(&self, fields: &[Option<&str>]) -> bool {
        let Some(term) = &self.term else {
            return true;
        };
        let needle = term.to_lowercase();
        fields
            .iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

// =============================================================================
// Listing Scope
// =============================================================================

/// Which products a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// Anonymous storefront: only ACTIVE products.
    Public,
    /// Signed-in seller: only products owned by this user id, any status.
    Owner(i64),
}

// =============================================================================
// Listing Result
// =============================================================================

/// Pagination metadata as sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

/// One page of a listing plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

/// `ceil(total / page_size)`; zero items means zero pages.
///
/// ## Example
/// ```rust
/// use emporium_core::listing::page_count;
///
/// assert_eq!(page_count(23, 10), 3);
/// assert_eq!(page_count(20, 10), 2);
/// assert_eq!(page_count(0, 10), 0);
/// ```
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

impl<T> ListingResult<T> {
    /// Wraps a fetched page with its metadata.
    pub fn new(items: Vec<T>, total: u64, request: &ListingRequest) -> Self {
        ListingResult {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            page_count: page_count(total, request.page_size),
        }
    }

    /// An empty result for `request` (nothing fetched yet).
    pub fn empty(request: &ListingRequest) -> Self {
        ListingResult::new(Vec::new(), 0, request)
    }

    /// Converts item types at a boundary, keeping the metadata.
    pub fn map<U, F>(self, f: F) -> ListingResult<U>
    where
        F: FnMut(T) -> U,
    {
        ListingResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
        }
    }

    /// Metadata without the items.
    pub fn pagination(&self) -> Pagination {
        Pagination {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
        }
    }

    /// True when a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    /// True when a page before this one exists.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl<T: Clone> ListingResult<T> {
    /// Applies the listing contract to an already-ordered, already-filtered
    /// in-memory collection.
    pub fn from_slice(ordered: &[T], request: &ListingRequest) -> Self {
        let window = request.window();
        let items = ordered
            .iter()
            .skip(usize::try_from(window.skip).unwrap_or(usize::MAX))
            .take(window.take as usize)
            .cloned()
            .collect();
        ListingResult::new(items, ordered.len() as u64, request)
    }
}

// =============================================================================
// Listing State (client-held)
// =============================================================================

/// Page/search state a listing view holds between fetches.
///
/// ## State Transitions
/// ```text
/// set_search("mug")  ──► page = 1, refetch
/// set_page(7)        ──► page = clamp(7, 1..=max(1, page_count)), refetch if changed
/// next_page()        ──► set_page(page + 1)
/// previous_page()    ──► set_page(page - 1)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    page: u32,
    page_size: u32,
    search: String,
    page_count: Option<u32>,
}

impl ListingState {
    /// Fresh state on page 1 with no search term.
    pub fn new(page_size: u32) -> Self {
        ListingState {
            page: 1,
            page_size,
            search: String::new(),
            page_count: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Last known page count, if a result has been observed.
    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    /// Changes the search term and resets to page 1.
    ///
    /// ## Returns
    /// Whether a refetch is needed (term or page actually changed).
    pub fn set_search(&mut self, term: &str) -> bool {
        let term = term.trim();
        let changed = term != self.search || self.page != 1;
        self.search = term.to_string();
        self.page = 1;
        changed
    }

    /// Moves to `page`, clamped to `1..=max(1, page_count)` when the page
    /// count is known.
    ///
    /// ## Returns
    /// Whether the page actually changed.
    pub fn set_page(&mut self, page: u32) -> bool {
        let upper = self.page_count.map(|count| count.max(1)).unwrap_or(u32::MAX);
        let clamped = page.clamp(1, upper);
        let changed = clamped != self.page;
        self.page = clamped;
        changed
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    /// Records the page count of a freshly received result.
    pub fn observe<T>(&mut self, result: &ListingResult<T>) {
        self.page_count = Some(result.page_count);
    }

    /// Builds the request for the current state.
    pub fn to_request(&self) -> Result<ListingRequest, ListingError> {
        ListingRequest::new(self.page as i64, self.page_size as i64, &self.search)
    }
}

impl Default for ListingState {
    fn default() -> Self {
        ListingState::new(DEFAULT_PAGE_SIZE)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
