//! # Validation Module
//!
//! Request checks that run before a query is assembled.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Unknown operator / amount type / sort codes rejected              │
//! │  └── Malformed dates rejected                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Tenant scope present                                              │
//! │  ├── Page within bounds                                                │
//! │  └── Search text length, amount magnitude                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Bound parameters in SQL                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::filter::{OrderFilter, PageRequest};
//! use tally_core::validation::{validate_filter, validate_page};
//!
//! validate_filter(&OrderFilter::for_company(3)).unwrap();
//! validate_page(&PageRequest::new(1, 20), 100).unwrap();
//! assert!(validate_page(&PageRequest::new(0, 20), 100).is_err());
//! ```

use crate::error::ValidationError;
use crate::filter::{OrderFilter, PageRequest};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted free-text search, in characters.
pub const MAX_SEARCH_LENGTH: usize = 100;

// =============================================================================
// Identifiers
// =============================================================================

pub fn validate_company_id(company_id: i64) -> ValidationResult<()> {
    if company_id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "company_id".to_string(),
        });
    }
    Ok(())
}

pub fn validate_order_id(order_id: i64) -> ValidationResult<()> {
    if order_id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "order_id".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Paging
// =============================================================================

/// Page number must be at least 1; page size between 1 and `max_page_size`.
pub fn validate_page(page: &PageRequest, max_page_size: u32) -> ValidationResult<()> {
    if page.page_number == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page_number".to_string(),
        });
    }

    if page.page_size == 0 || page.page_size > max_page_size {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: i64::from(max_page_size),
        });
    }

    Ok(())
}

// =============================================================================
// Filters
// =============================================================================

/// Rejects search text longer than [`MAX_SEARCH_LENGTH`] characters.
pub fn validate_search_text(field: &str, text: Option<&str>) -> ValidationResult<()> {
    if let Some(text) = text {
        if text.trim().chars().count() > MAX_SEARCH_LENGTH {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: MAX_SEARCH_LENGTH,
            });
        }
    }
    Ok(())
}

/// Validates a whole list filter.
pub fn validate_filter(filter: &OrderFilter) -> ValidationResult<()> {
    validate_company_id(filter.company_id)?;

    validate_search_text("keyword", filter.keyword.as_deref())?;
    validate_search_text("order_number", filter.order_number.as_deref())?;
    validate_search_text("product_name", filter.product_name.as_deref())?;
    validate_search_text("member_name_or_phone", filter.member_name_or_phone.as_deref())?;
    validate_search_text("operator_name_or_phone", filter.operator_name_or_phone.as_deref())?;

    for amount in &filter.amount_filters {
        if amount.scaled_value().is_none() {
            return Err(ValidationError::InvalidFormat {
                field: "value".to_string(),
                reason: format!("{} is out of range", amount.value),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
