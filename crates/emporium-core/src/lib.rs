//! # emporium-core: Pure Business Logic for Emporium
//!
//! This crate is the **heart** of Emporium. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront / Admin (emporium-client)               │   │
//! │  │    ListingController ──► CartStore ──► FileStorage              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    emporium-api (axum)                          │   │
//! │  │    /products, /users, /top-5-products, /register, /login        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ emporium-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  listing  │  │   cart    │  │   │
//! │  │   │  Product  │  │   Money   │  │  Request  │  │ CartStore │  │   │
//! │  │   │   User    │  │           │  │  Result   │  │ Storage   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • NO FILES                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  emporium-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, User, ProductStatus)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`listing`] - Pagination and search contract
//! - [`cart`] - Cart reducer and persisted store
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use emporium_core::listing::{ListingRequest, ListingResult};
//! use emporium_core::Money;
//!
//! let price = Money::from_cents(999); // $9.99
//! assert_eq!((price * 2).to_string(), "$19.98");
//!
//! let request = ListingRequest::new(1, 10, "mug").unwrap();
//! let page: ListingResult<u32> = ListingResult::new(vec![], 0, &request);
//! assert_eq!(page.page_count, 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod listing;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use emporium_core::Money` instead of
// `use emporium_core::money::Money`

pub use cart::{Cart, CartLineItem, CartStorage, CartStore, MemoryStorage};
pub use error::{CartError, ListingError, StorageError, ValidationError};
pub use listing::{
    ListingRequest, ListingResult, ListingScope, ListingState, PageWindow, Pagination,
    SearchFilter,
};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when a request doesn't name one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a listing will serve.
///
/// ## Business Reason
/// Keeps a single request from pulling the whole table.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Longest accepted search term, in characters, after trimming.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Highest accepted product price, in cents ($9,999,999.99).
pub const MAX_PRICE_CENTS: i64 = 999_999_999;

/// Number of products in the featured strip.
pub const FEATURED_PRODUCT_LIMIT: u32 = 5;

/// Storage key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "cart";
