//! # Display Rules
//!
//! Pure functions that turn raw column values into the strings the reporting
//! screens show. Repositories call these after fetching rows; nothing here
//! touches SQL.
//!
//! ## Rules At A Glance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  member       name + phone  → "Alice(13800000000)"                     │
//! │               name only     → "Alice"                                  │
//! │               no name       → "Walk-in customer"                       │
//! │                                                                         │
//! │  operator     name + phone  → "Bob(139...)"   no name → "-"            │
//! │                                                                         │
//! │  received     state Created / Awaiting payment → "-"                   │
//! │               no successful payment            → "-"                   │
//! │               otherwise Σ successful, rounded once                     │
//! │                                                                         │
//! │  pay channel  distinct method names by payment sort, joined            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::money::Money;
use crate::types::OrderState;

/// Shown wherever a value is absent.
pub const PLACEHOLDER: &str = "-";

/// Shown in the detail header when the order has no channel.
pub const MISSING_CHANNEL: &str = "--";

/// Member label for orders without a member.
pub const WALK_IN_CUSTOMER: &str = "Walk-in customer";

/// Name of the bucket that collects system rounding discounts.
pub const SYSTEM_ROUNDING_LABEL: &str = "System rounding";

/// Timestamp layout used by every record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// People
// =============================================================================

/// Member column: `name(phone)`, the bare name, or the walk-in label.
pub fn member_label(name: Option<&str>, phone: Option<&str>) -> String {
    match (non_blank(name), non_blank(phone)) {
        (Some(name), Some(phone)) => format!("{}({})", name, phone),
        (Some(name), None) => name.to_string(),
        (None, _) => WALK_IN_CUSTOMER.to_string(),
    }
}

/// Operator column: `name(phone)`, the bare name, or `-`.
pub fn operator_label(name: Option<&str>, phone: Option<&str>) -> String {
    match (non_blank(name), non_blank(phone)) {
        (Some(name), Some(phone)) => format!("{}({})", name, phone),
        (Some(name), None) => name.to_string(),
        (None, _) => PLACEHOLDER.to_string(),
    }
}

/// `"store - channel"`, dropping whichever half is missing.
pub fn store_channel_label(store: Option<&str>, channel: Option<&str>) -> String {
    match (non_blank(store), non_blank(channel)) {
        (Some(store), Some(channel)) => format!("{} - {}", store, channel),
        (Some(one), None) | (None, Some(one)) => one.to_string(),
        (None, None) => PLACEHOLDER.to_string(),
    }
}

// =============================================================================
// Time
// =============================================================================

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Formats an optional timestamp, `-` when absent.
pub fn timestamp_or_placeholder(at: Option<NaiveDateTime>) -> String {
    at.map(format_timestamp)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

// =============================================================================
// Amounts
// =============================================================================

/// `"12.30"` or `-`.
pub fn amount_or_placeholder(amount: Option<Money>) -> String {
    amount
        .map(|m| m.to_fixed())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// `"¥12.30"` or `-`.
pub fn symbol_amount_or_placeholder(amount: Option<Money>, symbol: &str) -> String {
    amount
        .map(|m| m.with_symbol(symbol))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Received amount for a list or detail row.
///
/// ## Example
/// ```rust
/// use tally_core::display::received_amount;
/// use tally_core::money::Money;
/// use tally_core::types::OrderState;
///
/// let paid = Money::parse("50.00");
/// assert_eq!(received_amount(OrderState::AwaitingPayment.code(), paid), "-");
/// assert_eq!(received_amount(OrderState::Paid.code(), paid), "50.00");
/// ```
pub fn received_amount(state_code: i64, successful_total: Option<Money>) -> String {
    let hidden = OrderState::from_code(state_code)
        .map(OrderState::hides_received_amount)
        .unwrap_or(false);
    if hidden {
        return PLACEHOLDER.to_string();
    }
    amount_or_placeholder(successful_total)
}

// =============================================================================
// Payment Channels
// =============================================================================

/// Distinct payment method names in payment `sort` order, joined.
///
/// Rows with equal `sort` keep their input order; the first occurrence of a
/// name fixes its position. Returns `None` when there is no named payment.
///
/// ## Example
/// ```rust
/// use tally_core::display::pay_channel_label;
///
/// let rows = [("Card", 2), ("Cash", 1), ("Card", 3)];
/// assert_eq!(pay_channel_label(rows, ", ").as_deref(), Some("Cash, Card"));
/// ```
pub fn pay_channel_label<'a, I>(payments: I, separator: &str) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut rows: Vec<(&str, i64)> = payments
        .into_iter()
        .filter(|(name, _)| !name.trim().is_empty())
        .collect();
    rows.sort_by_key(|(_, sort)| *sort);

    let mut seen = HashSet::new();
    let names: Vec<&str> = rows
        .into_iter()
        .filter_map(|(name, _)| seen.insert(name).then_some(name))
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(names.join(separator))
    }
}

// =============================================================================
// Discounts & Refunds
// =============================================================================

/// Discount names as cashiers see them; a few stored names are renamed.
pub fn discount_display_name(name: &str) -> &str {
    match name {
        "Item price change" => "Item price concession",
        other => other,
    }
}

/// Refund status of a line item from its purchased and refunded quantity.
pub fn refund_status_label(purchased: Option<Decimal>, refunded: Option<Decimal>) -> &'static str {
    match (purchased, refunded) {
        (_, None) => PLACEHOLDER,
        (Some(purchased), Some(refunded)) if purchased == refunded => "Refunded",
        (_, Some(_)) => "Partially refunded",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
