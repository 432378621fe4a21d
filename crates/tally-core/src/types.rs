//! # Domain Types
//!
//! Enumerations shared by the list, detail, option and aggregation paths.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │   OrderState    │   │  OrderSource    │   │ RefundAggregation   │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  code  ↔ label  │   │  code  ↔ label  │   │  0 none  1 pending  │   │
//! │  │  0..=13         │   │  1..=4          │   │  2 ok    3 failed   │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ AmountFilter    │   │ Comparison-     │   │ OrderSort           │   │
//! │  │  type + op +    │   │ Operator        │   │  field + direction  │   │
//! │  │  value          │   │  > >= < <= = != │   │                     │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored codes are integers. Every code → label lookup goes through the
//! tables here, so the list page, the detail page and the state dropdown can
//! never disagree on a name.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Label shown for a lifecycle code with no entry in [`OrderState`].
pub const UNKNOWN_STATE_LABEL: &str = "Unknown state";

/// Label shown for a source code with no entry in [`OrderSource`].
pub const UNKNOWN_SOURCE_LABEL: &str = "Unknown source";

/// Lifecycle codes listed when a request carries no state filter.
pub const DEFAULT_ACTIVE_STATES: [i64; 7] = [4, 5, 6, 8, 9, 10, 11];

// =============================================================================
// Order State
// =============================================================================

/// Lifecycle state of a sale order (`sale_order.state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Created,
    AwaitingPayment,
    PaymentAbnormal,
    PaymentFailed,
    Paid,
    Completed,
    PartRefunded,
    Cancelled,
    Refunded,
    AwaitingPickup,
    AwaitingDelivery,
    Delivered,
    Closed,
    Voided,
}

impl OrderState {
    /// Every known state, in code order.
    pub const ALL: [OrderState; 14] = [
        OrderState::Created,
        OrderState::AwaitingPayment,
        OrderState::PaymentAbnormal,
        OrderState::PaymentFailed,
        OrderState::Paid,
        OrderState::Completed,
        OrderState::PartRefunded,
        OrderState::Cancelled,
        OrderState::Refunded,
        OrderState::AwaitingPickup,
        OrderState::AwaitingDelivery,
        OrderState::Delivered,
        OrderState::Closed,
        OrderState::Voided,
    ];

    /// Stored integer code.
    pub const fn code(self) -> i64 {
        match self {
            OrderState::Created => 0,
            OrderState::AwaitingPayment => 1,
            OrderState::PaymentAbnormal => 2,
            OrderState::PaymentFailed => 3,
            OrderState::Paid => 4,
            OrderState::Completed => 5,
            OrderState::PartRefunded => 6,
            OrderState::Cancelled => 7,
            OrderState::Refunded => 8,
            OrderState::AwaitingPickup => 9,
            OrderState::AwaitingDelivery => 10,
            OrderState::Delivered => 11,
            OrderState::Closed => 12,
            OrderState::Voided => 13,
        }
    }

    /// Looks up a stored code.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }

    /// Human-readable name.
    pub const fn label(self) -> &'static str {
        match self {
            OrderState::Created => "Created",
            OrderState::AwaitingPayment => "Awaiting payment",
            OrderState::PaymentAbnormal => "Payment abnormal",
            OrderState::PaymentFailed => "Payment failed",
            OrderState::Paid => "Paid",
            OrderState::Completed => "Completed",
            OrderState::PartRefunded => "Partially refunded",
            OrderState::Cancelled => "Cancelled",
            OrderState::Refunded => "Refunded",
            OrderState::AwaitingPickup => "Awaiting pickup",
            OrderState::AwaitingDelivery => "Awaiting delivery",
            OrderState::Delivered => "Delivered",
            OrderState::Closed => "Closed",
            OrderState::Voided => "Voided",
        }
    }

    /// Orders that have not been paid yet show `-` as their received amount,
    /// whatever the payment rows say.
    pub const fn hides_received_amount(self) -> bool {
        matches!(self, OrderState::Created | OrderState::AwaitingPayment)
    }

    /// Payment lines of these orders display as zero.
    pub const fn is_payment_failure(self) -> bool {
        matches!(self, OrderState::PaymentAbnormal | OrderState::PaymentFailed)
    }

    /// States offered in the state dropdown.
    pub const fn is_selectable(self) -> bool {
        !matches!(
            self,
            OrderState::Created
                | OrderState::AwaitingPayment
                | OrderState::PaymentAbnormal
                | OrderState::PaymentFailed
                | OrderState::Cancelled
                | OrderState::Closed
                | OrderState::Voided
        )
    }
}

/// Label for a stored lifecycle code, falling back to [`UNKNOWN_STATE_LABEL`].
///
/// ## Example
/// ```rust
/// use tally_core::types::state_label;
///
/// assert_eq!(state_label(4), "Paid");
/// assert_eq!(state_label(99), "Unknown state");
/// ```
pub fn state_label(code: i64) -> &'static str {
    OrderState::from_code(code)
        .map(OrderState::label)
        .unwrap_or(UNKNOWN_STATE_LABEL)
}

// =============================================================================
// Order Source
// =============================================================================

/// Where the order was created (`sale_order.order_source`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    StoreCashier,
    MiniProgram,
    SelfCheckout,
    DeliveryPlatform,
}

impl OrderSource {
    pub const ALL: [OrderSource; 4] = [
        OrderSource::StoreCashier,
        OrderSource::MiniProgram,
        OrderSource::SelfCheckout,
        OrderSource::DeliveryPlatform,
    ];

    pub const fn code(self) -> i64 {
        match self {
            OrderSource::StoreCashier => 1,
            OrderSource::MiniProgram => 2,
            OrderSource::SelfCheckout => 3,
            OrderSource::DeliveryPlatform => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.code() == code)
    }

    pub const fn label(self) -> &'static str {
        match self {
            OrderSource::StoreCashier => "Store cashier",
            OrderSource::MiniProgram => "Mini program",
            OrderSource::SelfCheckout => "Self checkout",
            OrderSource::DeliveryPlatform => "Delivery platform",
        }
    }
}

/// Label for a stored source code, falling back to [`UNKNOWN_SOURCE_LABEL`].
pub fn source_label(code: i64) -> &'static str {
    OrderSource::from_code(code)
        .map(OrderSource::label)
        .unwrap_or(UNKNOWN_SOURCE_LABEL)
}

// =============================================================================
// Refund Aggregation Status
// =============================================================================

/// Outcome of the aggregated refund payment attached to a refund sheet.
///
/// ## Mapping
/// ```text
/// refund id not in map      → None       (0)
/// map[refund id] = null     → Pending    (1)
/// map[refund id] = true     → Succeeded  (2)
/// map[refund id] = false    → Failed     (3)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RefundAggregationStatus {
    None,
    Pending,
    Succeeded,
    Failed,
}

impl RefundAggregationStatus {
    /// Maps the success flag of an aggregated refund payment, if there is one.
    pub const fn from_flag(flag: Option<Option<bool>>) -> Self {
        match flag {
            None => RefundAggregationStatus::None,
            Some(None) => RefundAggregationStatus::Pending,
            Some(Some(true)) => RefundAggregationStatus::Succeeded,
            Some(Some(false)) => RefundAggregationStatus::Failed,
        }
    }

    /// Looks a refund up in a refund-id → success-flag map.
    ///
    /// ## Example
    /// ```rust
    /// use std::collections::HashMap;
    /// use tally_core::types::RefundAggregationStatus;
    ///
    /// let mut flags = HashMap::new();
    /// flags.insert(7_i64, None);
    /// assert_eq!(RefundAggregationStatus::from_success_map(&7, &flags).code(), 1);
    /// assert_eq!(RefundAggregationStatus::from_success_map(&8, &flags).code(), 0);
    /// ```
    pub fn from_success_map<K: Eq + Hash>(refund_id: &K, flags: &HashMap<K, Option<bool>>) -> Self {
        Self::from_flag(flags.get(refund_id).copied())
    }

    /// Numeric code returned to clients.
    pub const fn code(self) -> u8 {
        match self {
            RefundAggregationStatus::None => 0,
            RefundAggregationStatus::Pending => 1,
            RefundAggregationStatus::Succeeded => 2,
            RefundAggregationStatus::Failed => 3,
        }
    }
}

// =============================================================================
// Amount Filters
// =============================================================================

/// Comparison applied by an amount filter.
///
/// Parsing is strict: an operator code outside the six below is rejected
/// before any SQL is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ComparisonOperator {
    const CODES: [&'static str; 6] = [">", ">=", "<", "<=", "=", "!="];

    /// SQL spelling of the operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Lte => "<=",
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = ValidationError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim() {
            ">" => Ok(ComparisonOperator::Gt),
            ">=" => Ok(ComparisonOperator::Gte),
            "<" => Ok(ComparisonOperator::Lt),
            "<=" => Ok(ComparisonOperator::Lte),
            "=" => Ok(ComparisonOperator::Eq),
            "!=" => Ok(ComparisonOperator::Ne),
            _ => Err(ValidationError::not_allowed("operator", &Self::CODES)),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Which order amount an [`AmountFilter`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AmountType {
    /// `sale_order.total_origin_price`
    TotalPrice,
    /// `sale_order.discount_price`
    DiscountPrice,
    /// Sum of successful payments
    ReceivePrice,
}

impl AmountType {
    const CODES: [&'static str; 3] = ["total_price", "discount_price", "receive_price"];
}

impl FromStr for AmountType {
    type Err = ValidationError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim() {
            "total_price" => Ok(AmountType::TotalPrice),
            "discount_price" => Ok(AmountType::DiscountPrice),
            "receive_price" => Ok(AmountType::ReceivePrice),
            _ => Err(ValidationError::not_allowed("amount_type", &Self::CODES)),
        }
    }
}

/// A single amount comparison such as "received amount >= 100".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountFilter {
    pub amount_type: AmountType,
    pub operator: ComparisonOperator,
    pub value: Decimal,
}

impl AmountFilter {
    pub fn new(amount_type: AmountType, operator: ComparisonOperator, value: Decimal) -> Self {
        AmountFilter {
            amount_type,
            operator,
            value,
        }
    }

    /// Builds a filter from the raw request codes.
    ///
    /// ## Errors
    /// `ValidationError::NotAllowed` for an unknown target or operator,
    /// `ValidationError::InvalidFormat` for a non-decimal value.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::types::AmountFilter;
    ///
    /// assert!(AmountFilter::parse("receive_price", ">=", "100").is_ok());
    /// assert!(AmountFilter::parse("tip", ">=", "100").is_err());
    /// assert!(AmountFilter::parse("receive_price", "~", "100").is_err());
    /// ```
    pub fn parse(amount_type: &str, operator: &str, value: &str) -> Result<Self, ValidationError> {
        let amount_type = amount_type.parse::<AmountType>()?;
        let operator = operator.parse::<ComparisonOperator>()?;
        let value = Money::parse(value)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "value".to_string(),
                reason: format!("'{}' is not a decimal amount", value),
            })?
            .amount();
        Ok(AmountFilter::new(amount_type, operator, value))
    }

    /// The compared value in SQL scaled units.
    pub fn scaled_value(&self) -> Option<i64> {
        Money::new(self.value).scaled_units()
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Columns a PC order list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    ReceivePrice,
    TotalOriginPrice,
    DiscountPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascend,
    Descend,
}

/// Requested list ordering. Without one, lists are newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl OrderSort {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        OrderSort { field, direction }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
