//! # Domain Types
//!
//! Core domain types used throughout Emporium.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      User       │   │ ProductStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  DRAFT          │       │
//! │  │  name           │   │  username       │   │  ACTIVE         │       │
//! │  │  category       │   │  email          │   │  OUT_OF_STOCK   │       │
//! │  │  price_cents    │   │  is_admin       │   │  LOW_STOCK      │       │
//! │  │  owner_id ──────┼──►│                 │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  Write models: NewProduct, ProductUpdate, NewUser                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire format is camelCase JSON (`priceCents`, `createdAt`, ...). The
//! password hash never appears on `User`; only the database layer sees it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_category, validate_email, validate_non_negative, validate_price, validate_product_name,
    validate_username,
};

// =============================================================================
// Product Status
// =============================================================================

/// Publication state of a product.
///
/// Only `Active` products appear in the public listing and the featured strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Not visible to shoppers yet.
    Draft,
    /// Listed publicly.
    Active,
    OutOfStock,
    LowStock,
}

impl ProductStatus {
    /// All statuses, in declaration order.
    pub const ALL: [ProductStatus; 4] = [
        ProductStatus::Draft,
        ProductStatus::Active,
        ProductStatus::OutOfStock,
        ProductStatus::LowStock,
    ];

    /// The stored / wire spelling.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "DRAFT",
            ProductStatus::Active => "ACTIVE",
            ProductStatus::OutOfStock => "OUT_OF_STOCK",
            ProductStatus::LowStock => "LOW_STOCK",
        }
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Draft
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ProductStatus::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Database identifier (autoincrement).
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Optional long description (searched alongside the name).
    pub description: Option<String>,

    /// Free-form category label.
    pub category: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units in stock.
    pub stock: i64,

    pub status: ProductStatus,

    /// Image URL, if any.
    pub image: Option<String>,

    /// User who created the product.
    pub owner_id: i64,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `user_id` owns this product.
    #[inline]
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

// =============================================================================
// Product Write Models
// =============================================================================

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default)]
    pub status: ProductStatus,
    pub image: Option<String>,
}

impl NewProduct {
    /// Validates the product fields.
    ///
    /// ## Rules
    /// - name: 1-200 characters after trimming
    /// - category: 1-100 characters after trimming
    /// - price: 0 to `MAX_PRICE_CENTS`
    /// - stock: not negative
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_product_name(&self.name)?;
        validate_category(&self.category)?;
        validate_price(self.price_cents)?;
        validate_non_negative("stock", self.stock)?;
        Ok(())
    }
}

/// Partial update of a product. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub status: Option<ProductStatus>,
    pub image: Option<String>,
}

impl ProductUpdate {
    /// Validates only the fields that are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_product_name(name)?;
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        if let Some(price) = self.price_cents {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_non_negative("stock", stock)?;
        }
        Ok(())
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == ProductUpdate::default()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account as exposed outside the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    /// Validates username and email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.password_hash.is_empty() {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
