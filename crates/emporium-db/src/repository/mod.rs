//! # Repository Module
//!
//! Database repository implementations for Emporium.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list(scope, &request)                           │
//! │       ▼                                                                 │
//! │  ProductRepository / UserRepository                                    │
//! │       │                                                                 │
//! │       │  list_page(): COUNT(*) + SELECT ... LIMIT/OFFSET               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product listing and CRUD
//! - [`UserRepository`](user::UserRepository) - Accounts, credentials, user listing

pub mod product;
pub mod user;

use emporium_core::{ListingRequest, ListingResult, SearchFilter};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Ordering shared by every listing.
const LISTING_ORDER: &str = " ORDER BY created_at DESC, id ASC";

/// Appends `AND (col1 LIKE ? ESCAPE '\' OR col2 LIKE ? ESCAPE '\')` when the
/// filter has a term. SQLite's LIKE is case-insensitive for ASCII.
pub(crate) fn push_search(
    builder: &mut QueryBuilder<'_, Sqlite>,
    filter: &SearchFilter,
    columns: &[&str],
) {
    let Some(pattern) = filter.like_pattern() else {
        return;
    };

    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder
            .push(*column)
            .push(" LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\'");
    }
    builder.push(")");
}

/// Runs one listing: a filtered count, then the filtered page.
///
/// `push_where` must append a complete `WHERE ...` clause; it is called once
/// per query so both see the same predicate. The two reads are independent,
/// so `total` can drift from `items` under concurrent writes.
///
/// ## Arguments
/// * `table` - Table to list from
/// * `columns` - Select list matching `T`'s `FromRow`
/// * `request` - Validated listing request
/// * `push_where` - Appends the WHERE clause (scope + search)
pub(crate) async fn list_page<T, F>(
    pool: &SqlitePool,
    table: &str,
    columns: &str,
    request: &ListingRequest,
    push_where: F,
) -> DbResult<ListingResult<T>>
where
    T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    F: for<'q> Fn(&mut QueryBuilder<'q, Sqlite>) + Sync,
{
    let window = request.window();

    let mut count = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", table));
    push_where(&mut count);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::new(format!("SELECT {} FROM {}", columns, table));
    push_where(&mut select);
    select
        .push(LISTING_ORDER)
        .push(" LIMIT ")
        .push_bind(window.limit())
        .push(" OFFSET ")
        .push_bind(window.offset());
    let items: Vec<T> = select.build_query_as::<T>().fetch_all(pool).await?;

    debug!(
        table,
        total,
        page = request.page,
        returned = items.len(),
        "Listing page fetched"
    );

    Ok(ListingResult::new(
        items,
        u64::try_from(total).unwrap_or(0),
        request,
    ))
}
