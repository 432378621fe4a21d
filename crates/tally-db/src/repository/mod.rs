//! # Repository Module
//!
//! Read-only repositories over the sale-order tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Web handler (out of scope)                                            │
//! │       │                                                                 │
//! │       │  db.sale_orders().list_orders(&filter, page)                   │
//! │       ▼                                                                 │
//! │  SaleOrderRepository                                                   │
//! │  ├── validate input            (ValidationError → DbError)             │
//! │  ├── BEGIN                     (one snapshot per call)                 │
//! │  ├── build + run SQL           (QueryBuilder, bound values only)       │
//! │  ├── COMMIT                                                            │
//! │  └── project rows              (tally_core::display rules)             │
//! │       │                                                                 │
//! │       │  the whole call runs under QueryConfig::query_timeout          │
//! │       ▼                                                                 │
//! │  OrderPage<OrderListRecord>                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleOrderRepository`] - Order lists, summary, detail header, state options
//! - [`OrderItemRepository`] - Item enrichment, detail items, price statistics
//! - [`OrderRefundRepository`] - Refund sheets and aggregated refund status
//! - [`OrderPaymentRepository`] - Payments, anomalies, discounts, price breakdown
//!
//! [`SaleOrderRepository`]: sale_order::SaleOrderRepository
//! [`OrderItemRepository`]: order_item::OrderItemRepository
//! [`OrderRefundRepository`]: order_refund::OrderRefundRepository
//! [`OrderPaymentRepository`]: order_payment::OrderPaymentRepository

pub mod order_item;
pub mod order_payment;
pub mod order_refund;
pub mod sale_order;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{DbError, DbResult};

/// Runs one repository operation under the configured deadline.
///
/// The future is dropped on expiry, which rolls back any open transaction.
pub(crate) async fn with_timeout<T, F>(
    operation: &'static str,
    after: Duration,
    future: F,
) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    match tokio::time::timeout(after, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, after_ms = after.as_millis() as u64, "Query timed out");
            Err(DbError::Timeout { operation, after })
        }
    }
}

/// The order header fields detail queries need before reading child tables.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct OrderRef {
    pub id: i64,
    pub record_id: String,
    pub state: i64,
    pub change_money: Option<String>,
}

/// Resolves a live order of a company; `None` when missing, disabled or
/// owned by another company.
pub(crate) async fn find_order(
    conn: &mut SqliteConnection,
    order_id: i64,
    company_id: i64,
) -> DbResult<Option<OrderRef>> {
    let order = sqlx::query_as::<_, OrderRef>(
        "SELECT id, record_id, state, change_money FROM sale_order \
         WHERE id = ? AND company_id = ? AND disabled = 0",
    )
    .bind(order_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(order)
}

/// Appends `column IN (?, ?, ...)` for text keys. Callers never pass an
/// empty slice.
pub(crate) fn push_text_in<'args>(
    qb: &mut QueryBuilder<'args, Sqlite>,
    column: &str,
    values: &'args [String],
) {
    qb.push(column).push(" IN (");
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(value.as_str());
    }
    separated.push_unseparated(")");
}

/// SQLite stores booleans as 0/1 integers; a NULL flag means "pending".
pub(crate) fn flag(value: Option<i64>) -> Option<bool> {
    value.map(|v| v != 0)
}

// =============================================================================
// Unit Tests
// =============================================================================
