//! # Query Inputs
//!
//! What a caller hands to a list operation: a partially filled
//! [`OrderFilter`], a [`PageRequest`] and optionally an [`OrderSort`].
//!
//! ## Empty Means "No Constraint"
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  keyword: None            → no predicate                                │
//! │  keyword: Some("   ")     → no predicate (blank after trim)            │
//! │  store_ids: []            → no predicate (NOT "match nothing")         │
//! │  states: []               → configured default allow-list              │
//! │  created_at: { start }    → created_at >= start only                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`OrderSort`]: crate::types::OrderSort

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::AmountFilter;

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range where either bound may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange<T> {
    #[serde(default)]
    pub start: Option<T>,
    #[serde(default)]
    pub end: Option<T>,
}

impl<T> DateRange<T> {
    pub const fn new(start: Option<T>, end: Option<T>) -> Self {
        DateRange { start, end }
    }

    pub const fn unbounded() -> Self {
        DateRange {
            start: None,
            end: None,
        }
    }

    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

impl<T> Default for DateRange<T> {
    fn default() -> Self {
        DateRange::unbounded()
    }
}

// =============================================================================
// Order Filter
// =============================================================================

/// Optional criteria for the order lists.
///
/// ## Example
/// ```rust
/// use tally_core::filter::OrderFilter;
///
/// let filter = OrderFilter::for_company(12)
///     .keyword("A1001")
///     .store_ids(vec![3, 4]);
/// assert_eq!(filter.store_ids, vec![3, 4]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    /// Tenant scope. Always applied.
    pub company_id: i64,

    /// Order number, member name, member phone, item name or item barcode.
    pub keyword: Option<String>,

    pub order_number: Option<String>,

    /// Item name or item barcode.
    pub product_name: Option<String>,

    pub member_name_or_phone: Option<String>,

    /// Operator name, operator phone or shopping guide name.
    pub operator_name_or_phone: Option<String>,

    pub store_ids: Vec<i64>,
    pub channel_ids: Vec<i64>,

    /// Lifecycle codes; empty falls back to the configured allow-list.
    pub states: Vec<i64>,

    /// Orders with a successful payment through any of these methods.
    pub payment_method_ids: Vec<i64>,

    pub created_at: DateRange<NaiveDateTime>,
    pub business_day: DateRange<NaiveDate>,

    pub amount_filters: Vec<AmountFilter>,
}

impl OrderFilter {
    /// An otherwise empty filter scoped to one company.
    pub fn for_company(company_id: i64) -> Self {
        OrderFilter {
            company_id,
            ..OrderFilter::default()
        }
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }

    pub fn product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    pub fn member_name_or_phone(mut self, text: impl Into<String>) -> Self {
        self.member_name_or_phone = Some(text.into());
        self
    }

    pub fn operator_name_or_phone(mut self, text: impl Into<String>) -> Self {
        self.operator_name_or_phone = Some(text.into());
        self
    }

    pub fn store_ids(mut self, ids: Vec<i64>) -> Self {
        self.store_ids = ids;
        self
    }

    pub fn channel_ids(mut self, ids: Vec<i64>) -> Self {
        self.channel_ids = ids;
        self
    }

    pub fn states(mut self, states: Vec<i64>) -> Self {
        self.states = states;
        self
    }

    pub fn payment_method_ids(mut self, ids: Vec<i64>) -> Self {
        self.payment_method_ids = ids;
        self
    }

    pub fn created_between(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.created_at = DateRange::new(start, end);
        self
    }

    pub fn business_day_between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.business_day = DateRange::new(start, end);
        self
    }

    pub fn amount_filter(mut self, filter: AmountFilter) -> Self {
        self.amount_filters.push(filter);
        self
    }
}

// =============================================================================
// Page Request
// =============================================================================

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const fn new(page_number: u32, page_size: u32) -> Self {
        PageRequest {
            page_number,
            page_size,
        }
    }

    /// Rows skipped: `size × (page − 1)`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::filter::PageRequest;
    ///
    /// assert_eq!(PageRequest::new(1, 20).offset(), 0);
    /// assert_eq!(PageRequest::new(3, 20).offset(), 40);
    /// ```
    pub fn offset(&self) -> i64 {
        i64::from(self.page_size) * i64::from(self.page_number.saturating_sub(1))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(1, 20)
    }
}
