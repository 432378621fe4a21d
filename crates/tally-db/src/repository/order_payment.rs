//! # Order Payment Repository
//!
//! Payment lines, discount lines and the price breakdown panel of an order,
//! plus the company's payment method options.
//!
//! ## Success Flags
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  is_pay_success = 1     counted in every total                         │
//! │  is_pay_success = 0     anomaly; shown with amount 0.00                 │
//! │  is_pay_success = NULL  pending; listed, never summed                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use tally_core::display::{amount_or_placeholder, discount_display_name, SYSTEM_ROUNDING_LABEL};
use tally_core::money::Money;
use tally_core::pricing::{breakdown_subtotal, ItemExtra};
use tally_core::types::state_label;
use tally_core::validation::{validate_company_id, validate_order_id};
use tally_core::{DiscountLine, OptionItem, OrderPriceBreakdown, PaymentRecord};

use crate::config::QueryConfig;
use crate::error::DbResult;
use crate::repository::order_refund::{fetch_refund_payments, refunded_total};
use crate::repository::{find_order, flag, push_text_in, with_timeout};

/// `discount_source` of automatic till rounding.
const SYSTEM_ROUNDING_SOURCE: i64 = 1;

const ZERO_AMOUNT: &str = "0.00";

/// Repository for payments, discounts and the price breakdown.
#[derive(Debug, Clone)]
pub struct OrderPaymentRepository {
    pool: SqlitePool,
    config: Arc<QueryConfig>,
}

// =============================================================================
// Rows
// =============================================================================

/// One `sale_order_payment` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PaymentRow {
    pub order_id: String,
    pub payment_method_id: Option<i64>,
    pub payment_method_name: Option<String>,
    pub payment_amount: Option<String>,
    pub is_pay_success: Option<i64>,
    pub sort: i64,
}

impl PaymentRow {
    pub fn succeeded(&self) -> bool {
        flag(self.is_pay_success) == Some(true)
    }

    pub fn amount(&self) -> Option<Money> {
        Money::from_column("payment_amount", self.payment_amount.as_deref())
    }

    pub fn method_name(&self) -> &str {
        self.payment_method_name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    discount_source: Option<i64>,
    discount_name: Option<String>,
    discount_amount: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct BreakdownItemRow {
    id: i64,
    shop_price: Option<String>,
    origin_total_price_in_shopcaritem: Option<String>,
    extra: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct MethodRow {
    payment_method_id: i64,
    payment_method_name: Option<String>,
}

// =============================================================================
// Shared Queries
// =============================================================================

/// All payment rows of the given orders of one company, in `sort` then id
/// order.
pub(crate) async fn fetch_payments(
    conn: &mut SqliteConnection,
    company_id: i64,
    order_record_ids: &[String],
) -> DbResult<Vec<PaymentRow>> {
    if order_record_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT order_id, payment_method_id, payment_method_name, payment_amount, \
         is_pay_success, sort FROM sale_order_payment WHERE company_id = ",
    );
    qb.push_bind(company_id).push(" AND ");
    push_text_in(&mut qb, "order_id", order_record_ids);
    qb.push(" ORDER BY sort, id");

    let rows = qb.build_query_as::<PaymentRow>().fetch_all(&mut *conn).await?;
    Ok(rows)
}

/// Exact sum of successful payments; `None` when nothing succeeded.
pub(crate) fn paid_total<'a>(payments: impl IntoIterator<Item = &'a PaymentRow>) -> Option<Money> {
    payments
        .into_iter()
        .filter(|p| p.succeeded())
        .map(|p| p.amount().unwrap_or_default())
        .reduce(|a, b| a + b)
}

fn payment_record(row: &PaymentRow, state_name: &str) -> PaymentRecord {
    let payment_amount = if flag(row.is_pay_success) == Some(false) {
        ZERO_AMOUNT.to_string()
    } else {
        amount_or_placeholder(row.amount())
    };

    PaymentRecord {
        payment_method_id: row.payment_method_id,
        payment_method_name: row.method_name().to_string(),
        payment_amount,
        is_pay_success: flag(row.is_pay_success),
        state_name: state_name.to_string(),
    }
}

// =============================================================================
// Repository
// =============================================================================

impl OrderPaymentRepository {
    /// Creates a new OrderPaymentRepository.
    pub fn new(pool: SqlitePool, config: Arc<QueryConfig>) -> Self {
        OrderPaymentRepository { pool, config }
    }

    /// Every payment line of an order. Failed lines show `0.00`.
    pub async fn list_payments(&self, order_id: i64, company_id: i64) -> DbResult<Vec<PaymentRecord>> {
        self.payment_lines("list_payments", order_id, company_id, false)
            .await
    }

    /// Failed payment lines of an order, each shown with `0.00`.
    pub async fn list_payment_anomalies(
        &self,
        order_id: i64,
        company_id: i64,
    ) -> DbResult<Vec<PaymentRecord>> {
        self.payment_lines("list_payment_anomalies", order_id, company_id, true)
            .await
    }

    async fn payment_lines(
        &self,
        operation: &'static str,
        order_id: i64,
        company_id: i64,
        failed_only: bool,
    ) -> DbResult<Vec<PaymentRecord>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout(operation, self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let Some(order) = find_order(&mut tx, order_id, company_id).await? else {
                return Ok(Vec::new());
            };
            let rows = fetch_payments(&mut tx, company_id, std::slice::from_ref(&order.record_id)).await?;
            tx.commit().await?;

            let state_name = state_label(order.state);
            let records: Vec<PaymentRecord> = rows
                .iter()
                .filter(|row| !failed_only || flag(row.is_pay_success) == Some(false))
                .map(|row| payment_record(row, state_name))
                .collect();

            debug!(order_id, operation, lines = records.len(), "Loaded payment lines");
            Ok(records)
        })
        .await
    }

    /// Payment methods the company has used, as dropdown options.
    pub async fn list_payment_methods(&self, company_id: i64) -> DbResult<Vec<OptionItem>> {
        validate_company_id(company_id)?;

        with_timeout("list_payment_methods", self.config.query_timeout, async {
            let rows = sqlx::query_as::<_, MethodRow>(
                r#"
                SELECT payment_method_id, MIN(payment_method_name) AS payment_method_name
                FROM sale_order_payment
                WHERE company_id = ? AND payment_method_id IS NOT NULL
                GROUP BY payment_method_id
                ORDER BY payment_method_id
                "#,
            )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

            Ok(rows
                .into_iter()
                .map(|row| {
                    OptionItem::new(
                        row.payment_method_id,
                        row.payment_method_name.unwrap_or_default(),
                    )
                })
                .collect())
        })
        .await
    }

    /// Discount lines of an order.
    ///
    /// ## Grouping
    /// ```text
    /// source 1 rows          → one "System rounding" line, listed first
    /// other rows             → one line per display name, first-seen order
    /// "Item price change"    → shown as "Item price concession"
    /// ```
    pub async fn list_discounts(&self, order_id: i64, company_id: i64) -> DbResult<Vec<DiscountLine>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout("list_discounts", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let Some(order) = find_order(&mut tx, order_id, company_id).await? else {
                return Ok(Vec::new());
            };

            let rows = sqlx::query_as::<_, DiscountRow>(
                r#"
                SELECT discount_source, discount_name, discount_amount
                FROM sale_order_discount
                WHERE order_id = ? AND disabled = 0
                ORDER BY id
                "#,
            )
            .bind(&order.record_id)
            .fetch_all(&mut *tx)
            .await?;
            tx.commit().await?;

            Ok(group_discounts(&rows))
        })
        .await
    }

    /// The price breakdown panel of an order.
    ///
    /// `None` when the order does not exist in the company.
    pub async fn get_price_breakdown(
        &self,
        order_id: i64,
        company_id: i64,
    ) -> DbResult<Option<OrderPriceBreakdown>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout("get_price_breakdown", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let Some(order) = find_order(&mut tx, order_id, company_id).await? else {
                return Ok(None);
            };

            let items = sqlx::query_as::<_, BreakdownItemRow>(
                r#"
                SELECT id, shop_price, origin_total_price_in_shopcaritem, extra
                FROM sale_order_item
                WHERE order_id = ? AND disabled = 0
                ORDER BY id
                "#,
            )
            .bind(&order.record_id)
            .fetch_all(&mut *tx)
            .await?;

            let record_ids = std::slice::from_ref(&order.record_id);
            let payments = fetch_payments(&mut tx, company_id, record_ids).await?;
            let refunds = fetch_refund_payments(&mut tx, record_ids).await?;
            tx.commit().await?;

            let subtotal: Money = items
                .iter()
                .filter_map(|item| {
                    let extra = ItemExtra::parse_lenient(item.id, item.extra.as_deref());
                    breakdown_subtotal(
                        Money::from_column("shop_price", item.shop_price.as_deref()),
                        Money::from_column(
                            "origin_total_price_in_shopcaritem",
                            item.origin_total_price_in_shopcaritem.as_deref(),
                        ),
                        &extra,
                    )
                })
                .sum();

            Ok(Some(OrderPriceBreakdown {
                state_name: state_label(order.state).to_string(),
                subtotal: subtotal.to_fixed(),
                change_money: amount_or_placeholder(Money::from_column(
                    "change_money",
                    order.change_money.as_deref(),
                )),
                actually_refund_amount_all: refunded_total(&refunds).to_fixed(),
                payment_amount: amount_or_placeholder(paid_total(&payments)),
            }))
        })
        .await
    }
}

fn group_discounts(rows: &[DiscountRow]) -> Vec<DiscountLine> {
    let mut rounding: Option<Money> = None;
    let mut names: Vec<String> = Vec::new();
    let mut totals: HashMap<String, Money> = HashMap::new();

    for row in rows {
        let amount = Money::from_column("discount_amount", row.discount_amount.as_deref())
            .unwrap_or_default();

        if row.discount_source == Some(SYSTEM_ROUNDING_SOURCE) {
            *rounding.get_or_insert_with(Money::zero) += amount;
            continue;
        }

        let name = discount_display_name(row.discount_name.as_deref().unwrap_or_default()).to_string();
        match totals.get_mut(&name) {
            Some(total) => *total += amount,
            None => {
                totals.insert(name.clone(), amount);
                names.push(name);
            }
        }
    }

    let mut lines = Vec::with_capacity(names.len() + 1);
    if let Some(total) = rounding {
        lines.push(DiscountLine {
            name: SYSTEM_ROUNDING_LABEL.to_string(),
            amount: total.to_fixed(),
        });
    }
    for name in names {
        let amount = totals.get(&name).copied().unwrap_or_default().to_fixed();
        lines.push(DiscountLine { name, amount });
    }
    lines
}

// =============================================================================
// Unit Tests
// =============================================================================
