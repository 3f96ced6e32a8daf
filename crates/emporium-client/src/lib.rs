//! # emporium-client: Shopper-side Building Blocks
//!
//! The pieces of Emporium that live next to the UI:
//!
//! - [`ListingClient`] - talks to `GET /products` and `GET /users` and
//!   normalizes whatever shape comes back into a `ListingResult<T>`
//! - [`ListingController`] - page/search state for one listing view, with a
//!   debounced search box
//! - [`FileStorage`] - a directory-backed `CartStorage` so the cart survives
//!   restarts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_client::{FileStorage, ListingClient, ListingController, RemoteListing};
//! use emporium_core::CartStore;
//!
//! let client = ListingClient::new("http://localhost:3000")?;
//! let products = ListingController::new(RemoteListing::public_products(client), 10);
//! products.refresh().await?;
//! products.search_debounced("mug").await?;
//!
//! let mut cart = CartStore::load(FileStorage::new("./.emporium"));
//! cart.add_to_cart(products.items().await[0].clone(), 1)?;
//! ```

pub mod controller;
pub mod error;
pub mod listing;
pub mod storage;

pub use controller::{ListingController, SEARCH_DEBOUNCE};
pub use error::{ClientError, ClientResult};
pub use listing::{decode_listing, ListingClient, ListingSource, RemoteListing};
pub use storage::FileStorage;
