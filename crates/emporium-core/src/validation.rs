//! # Validation
//!
//! Field rules shared by the API handlers and the listing types. Handlers
//! call these after deserializing and before touching the database; the
//! schema's NOT NULL, CHECK and UNIQUE constraints sit behind them.
//!
//! ## Usage
//! ```rust
//! use emporium_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Espresso Beans").unwrap();
//! assert_eq!(validate_quantity(2).unwrap(), 2u32);
//! ```

use crate::error::ValidationError;
use crate::{MAX_PAGE_SIZE, MAX_PRICE_CENTS, MAX_SEARCH_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Ceramic Mug").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a product category label (1-100 characters).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    validate_text("category", category, 100)
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 32 characters
/// - Letters, digits, `_`, `-` and `.` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    let len = username.chars().count();
    if len < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if len > 32 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 32,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '.', '-' and '_'".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address shape (`local@domain.tld`).
///
/// This is a sanity check, not RFC 5322; deliverability is not our problem.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }
    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a plaintext password before hashing (at least 8 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filter)
/// - Maximum 100 characters after trimming
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value and narrows it to the cart's line width.
///
/// ## Rules
/// - Must be at least 1
/// - Must fit in a `u32`
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Update Quantity                                                  │
/// │                                                                         │
/// │  Shopper types quantity: 0                                             │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty < 1? → CartError::InvalidQuantity, line unchanged        │
/// │       │                                                                 │
/// │       └── OK → Proceed with update_quantity                            │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<u32> {
    if qty < 1 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: u32::MAX as i64,
        });
    }

    u32::try_from(qty).map_err(|_| ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: u32::MAX as i64,
    })
}

/// Validates that a numeric field (price in cents, stock) is not negative.
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", 1099).is_ok());
/// assert!(validate_non_negative("price", 0).is_ok());     // Free item
/// assert!(validate_non_negative("stock", -1).is_err());
/// ```
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents: not negative and at most `MAX_PRICE_CENTS`.
pub fn validate_price(cents: i64) -> ValidationResult<()> {
    validate_non_negative("price", cents)?;
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a 1-based page number.
pub fn validate_page(page: i64) -> ValidationResult<u32> {
    if page < 1 || page > u32::MAX as i64 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: u32::MAX as i64,
        });
    }
    Ok(page as u32)
}

/// Validates a page size against `MAX_PAGE_SIZE`.
pub fn validate_page_size(page_size: i64) -> ValidationResult<u32> {
    if page_size < 1 || page_size > MAX_PAGE_SIZE as i64 {
        return Err(ValidationError::OutOfRange {
            field: "pageSize".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }
    Ok(page_size as u32)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Ceramic Mug").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
        assert!(validate_product_name(&"A".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jane_doe").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("jane.example.com").is_err());
        assert!(validate_email("jane@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("jane doe@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(matches!(
            validate_password(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  mug ").unwrap(), "mug");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"x".repeat(100)).is_ok());
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(1).unwrap(), 1);
        assert_eq!(validate_quantity(250).unwrap(), 250);

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(u32::MAX as i64 + 1).is_err());
    }

    #[test]
    fn test_validate_page_bounds() {
        assert_eq!(validate_page(1).unwrap(), 1);
        assert!(validate_page(0).is_err());
        assert!(validate_page(-3).is_err());

        assert_eq!(validate_page_size(100).unwrap(), 100);
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(101).is_err());
    }
}
