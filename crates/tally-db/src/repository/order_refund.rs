//! # Order Refund Repository
//!
//! Refund sheets of an order and the status of its aggregated refunds.
//!
//! ## Refund Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale_order.record_id                                                   │
//! │       │                                                                 │
//! │       ▼  order_id                                                       │
//! │  sale_order_refund ──────────────┬─────────────────────────┐           │
//! │       record_id                  │ order_refund_id         │           │
//! │                                  ▼                         ▼           │
//! │                   sale_order_refund_payment   sale_order_refund_item   │
//! │                   (method, amount, flags)     (item, qty, price)       │
//! │                                                                         │
//! │  A refund payment whose method id equals the configured aggregated     │
//! │  method id (default -1) is an aggregated refund payment. Its success   │
//! │  flag becomes the four-valued status code:                             │
//! │     none → 0   NULL → 1   true → 2   false → 3                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use tally_core::display::{
    format_timestamp, operator_label, symbol_amount_or_placeholder, timestamp_or_placeholder,
};
use tally_core::money::{format_quantity, parse_quantity, Money};
use tally_core::types::RefundAggregationStatus;
use tally_core::validation::{validate_company_id, validate_order_id};
use tally_core::{AggregatedRefundInfo, ChannelAmount, OrderRefundRecord, RefundItemRecord};

use crate::config::QueryConfig;
use crate::error::DbResult;
use crate::repository::{find_order, flag, push_text_in, with_timeout};

/// Repository for refund sheets.
#[derive(Debug, Clone)]
pub struct OrderRefundRepository {
    pool: SqlitePool,
    config: Arc<QueryConfig>,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: i64,
    record_id: String,
    refund_number: Option<String>,
    refund_type_alias: Option<String>,
    refund_reason: Option<String>,
    operator_name: Option<String>,
    operator_phone: Option<String>,
    created_at: NaiveDateTime,
}

/// One `sale_order_refund_payment` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RefundPaymentRow {
    pub order_refund_id: String,
    pub refund_payment_method_id: Option<i64>,
    pub refund_payment_name: Option<String>,
    pub refund_payment_amount: Option<String>,
    pub is_refund_success: Option<i64>,
    pub refund_success_time: Option<NaiveDateTime>,
}

impl RefundPaymentRow {
    fn succeeded(&self) -> bool {
        flag(self.is_refund_success) == Some(true)
    }

    fn amount(&self) -> Option<Money> {
        Money::from_column("refund_payment_amount", self.refund_payment_amount.as_deref())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RefundItemRow {
    id: i64,
    order_refund_id: String,
    order_item_id: String,
    goods_sale_name: Option<String>,
    spu_code: Option<String>,
    barcode: Option<String>,
    goods_unit_name: Option<String>,
    picture_url: Option<String>,
    selling_price: Option<String>,
    purchase_quantity: Option<String>,
    actual_receive_price: Option<String>,
    refund_quantity: Option<String>,
    refund_price: Option<String>,
}

/// The latest aggregated refund payment of an order.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AggregatedRefundRow {
    pub order_refund_id: String,
    pub refund_payment_amount: Option<String>,
    pub is_refund_success: Option<i64>,
    pub is_pre_refund_success: Option<i64>,
}

impl AggregatedRefundRow {
    pub fn status(&self) -> RefundAggregationStatus {
        RefundAggregationStatus::from_flag(Some(flag(self.is_refund_success)))
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

/// Refund payment rows of every refund of the given orders, in `sort` then
/// id order.
pub(crate) async fn fetch_refund_payments(
    conn: &mut SqliteConnection,
    order_record_ids: &[String],
) -> DbResult<Vec<RefundPaymentRow>> {
    if order_record_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT rp.order_refund_id, rp.refund_payment_method_id, rp.refund_payment_name, \
         rp.refund_payment_amount, rp.is_refund_success, rp.refund_success_time \
         FROM sale_order_refund_payment rp \
         JOIN sale_order_refund r ON r.record_id = rp.order_refund_id \
         WHERE ",
    );
    push_text_in(&mut qb, "r.order_id", order_record_ids);
    qb.push(" ORDER BY rp.sort, rp.id");

    let rows = qb
        .build_query_as::<RefundPaymentRow>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Exact sum of successful refund payments; zero when none succeeded.
pub(crate) fn refunded_total<'a>(rows: impl IntoIterator<Item = &'a RefundPaymentRow>) -> Money {
    rows.into_iter()
        .filter(|row| row.succeeded())
        .filter_map(RefundPaymentRow::amount)
        .sum()
}

/// The most recent aggregated refund payment of an order, by refund then
/// payment id.
pub(crate) async fn fetch_latest_aggregated(
    conn: &mut SqliteConnection,
    order_record_id: &str,
    aggregated_method_id: i64,
) -> DbResult<Option<AggregatedRefundRow>> {
    let row = sqlx::query_as::<_, AggregatedRefundRow>(
        r#"
        SELECT rp.order_refund_id, rp.refund_payment_amount,
               rp.is_refund_success, rp.is_pre_refund_success
        FROM sale_order_refund r
        JOIN sale_order_refund_payment rp ON rp.order_refund_id = r.record_id
        WHERE r.order_id = ? AND rp.refund_payment_method_id = ?
        ORDER BY r.id DESC, rp.id DESC
        LIMIT 1
        "#,
    )
    .bind(order_record_id)
    .bind(aggregated_method_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

// =============================================================================
// Repository
// =============================================================================

impl OrderRefundRepository {
    /// Creates a new OrderRefundRepository.
    pub fn new(pool: SqlitePool, config: Arc<QueryConfig>) -> Self {
        OrderRefundRepository { pool, config }
    }

    /// Refund sheets of an order, newest first.
    ///
    /// Empty when the order does not exist in the company.
    pub async fn list_order_refunds(
        &self,
        order_id: i64,
        company_id: i64,
    ) -> DbResult<Vec<OrderRefundRecord>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout("list_order_refunds", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let Some(order) = find_order(&mut tx, order_id, company_id).await? else {
                return Ok(Vec::new());
            };

            let refunds = sqlx::query_as::<_, RefundRow>(
                r#"
                SELECT id, record_id, refund_number, refund_type_alias, refund_reason,
                       operator_name, operator_phone, created_at
                FROM sale_order_refund
                WHERE order_id = ?
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .bind(&order.record_id)
            .fetch_all(&mut *tx)
            .await?;

            if refunds.is_empty() {
                return Ok(Vec::new());
            }

            let payments =
                fetch_refund_payments(&mut tx, std::slice::from_ref(&order.record_id)).await?;

            let items = sqlx::query_as::<_, RefundItemRow>(
                r#"
                SELECT ri.id, ri.order_refund_id, ri.order_item_id,
                       i.goods_sale_name, i.spu_code, i.barcode, i.goods_unit_name,
                       i.picture_url, i.selling_price, i.purchase_quantity,
                       i.actual_receive_price, ri.refund_quantity, ri.refund_price
                FROM sale_order_refund_item ri
                JOIN sale_order_refund r ON r.record_id = ri.order_refund_id
                LEFT JOIN sale_order_item i ON i.record_id = ri.order_item_id
                WHERE r.order_id = ?
                ORDER BY ri.id
                "#,
            )
            .bind(&order.record_id)
            .fetch_all(&mut *tx)
            .await?;
            tx.commit().await?;

            debug!(
                order_id,
                refunds = refunds.len(),
                payments = payments.len(),
                items = items.len(),
                "Loaded refund sheets"
            );

            Ok(assemble_refunds(refunds, &payments, items, &self.config))
        })
        .await
    }

    /// The latest aggregated refund payment of an order, if any.
    pub async fn latest_aggregated_refund(
        &self,
        order_id: i64,
        company_id: i64,
    ) -> DbResult<Option<AggregatedRefundInfo>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout("latest_aggregated_refund", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let Some(order) = find_order(&mut tx, order_id, company_id).await? else {
                return Ok(None);
            };
            let latest = fetch_latest_aggregated(
                &mut tx,
                &order.record_id,
                self.config.aggregated_refund_method_id,
            )
            .await?;
            tx.commit().await?;

            Ok(latest.map(|row| AggregatedRefundInfo {
                aggregated_refund_result_code: row.status().code(),
                refund_payment_amount: Money::from_column(
                    "refund_payment_amount",
                    row.refund_payment_amount.as_deref(),
                )
                .unwrap_or_default()
                .to_fixed(),
                is_refund_success: flag(row.is_refund_success),
                is_pre_refund_success: flag(row.is_pre_refund_success),
                order_refund_id: row.order_refund_id,
            }))
        })
        .await
    }
}

// =============================================================================
// Projection
// =============================================================================

fn assemble_refunds(
    refunds: Vec<RefundRow>,
    payments: &[RefundPaymentRow],
    items: Vec<RefundItemRow>,
    config: &QueryConfig,
) -> Vec<OrderRefundRecord> {
    let symbol = config.currency_symbol.as_str();

    let mut payments_by_refund: HashMap<&str, Vec<&RefundPaymentRow>> = HashMap::new();
    let mut aggregated_flags: HashMap<String, Option<bool>> = HashMap::new();
    for payment in payments {
        payments_by_refund
            .entry(payment.order_refund_id.as_str())
            .or_default()
            .push(payment);
        if payment.refund_payment_method_id == Some(config.aggregated_refund_method_id) {
            aggregated_flags.insert(payment.order_refund_id.clone(), flag(payment.is_refund_success));
        }
    }

    let mut items_by_refund: HashMap<String, Vec<RefundItemRecord>> = HashMap::new();
    for item in items {
        items_by_refund
            .entry(item.order_refund_id.clone())
            .or_default()
            .push(project_refund_item(item, symbol));
    }

    refunds
        .into_iter()
        .map(|refund| {
            let lines = payments_by_refund
                .get(refund.record_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();

            let refund_pay_channel = lines
                .iter()
                .filter_map(|line| {
                    let amount = line.amount()?;
                    let shown = if line.succeeded() { amount } else { Money::zero() };
                    Some(ChannelAmount {
                        method_name: line.refund_payment_name.clone().unwrap_or_default(),
                        amount: shown.with_symbol(symbol),
                    })
                })
                .collect();

            let success_time = lines.iter().filter_map(|line| line.refund_success_time).max();

            OrderRefundRecord {
                id: refund.id,
                refund_number: refund.refund_number,
                refund_type_alias: refund.refund_type_alias,
                refund_reason: refund.refund_reason,
                create_at: format_timestamp(refund.created_at),
                operator_name_phone: operator_label(
                    refund.operator_name.as_deref(),
                    refund.operator_phone.as_deref(),
                ),
                actually_refund_amount: refunded_total(lines.iter().copied()).to_fixed(),
                refund_success_time: timestamp_or_placeholder(success_time),
                refund_pay_channel,
                aggregated_refund_result_code: RefundAggregationStatus::from_success_map(
                    &refund.record_id,
                    &aggregated_flags,
                )
                .code(),
                items: items_by_refund.remove(&refund.record_id).unwrap_or_default(),
                record_id: refund.record_id,
            }
        })
        .collect()
}

fn project_refund_item(row: RefundItemRow, symbol: &str) -> RefundItemRecord {
    let money = |field: &str, raw: &Option<String>| {
        symbol_amount_or_placeholder(Money::from_column(field, raw.as_deref()), symbol)
    };

    RefundItemRecord {
        id: row.id,
        selling_price: money("selling_price", &row.selling_price),
        actual_receive_price: money("actual_receive_price", &row.actual_receive_price),
        refund_price: money("refund_price", &row.refund_price),
        purchase_quantity: parse_quantity(row.purchase_quantity.as_deref()).map(format_quantity),
        refund_quantity: parse_quantity(row.refund_quantity.as_deref()).map(format_quantity),
        order_item_id: row.order_item_id,
        goods_sale_name: row.goods_sale_name,
        spu_code: row.spu_code,
        barcode: row.barcode,
        goods_unit_name: row.goods_unit_name,
        picture_url: row.picture_url,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        test_db, ItemFixture, OrderFixture, RefundFixture, RefundItemFixture, RefundPaymentFixture,
    };

    #[tokio::test]
    async fn test_refund_sheets_newest_first_with_lines() {
        let db = test_db().await;
        let order = OrderFixture::new(7, "A1");
        let id = order.insert(db.pool()).await;
        let item = ItemFixture {
            purchase_quantity: Some("2.000".to_string()),
            ..ItemFixture::new(&order, "Milk")
        };
        item.insert(db.pool()).await;

        let older = RefundFixture::new(&order, "R1", "2024-03-02 09:00:00");
        let newer = RefundFixture {
            operator_phone: Some("139".to_string()),
            ..RefundFixture::new(&order, "R2", "2024-03-03 09:00:00")
        };
        older.insert(db.pool()).await;
        newer.insert(db.pool()).await;

        RefundPaymentFixture {
            refund_success_time: Some("2024-03-02 09:05:00".to_string()),
            ..RefundPaymentFixture::new(&older, "Cash", "4.5")
        }
        .insert(db.pool())
        .await;
        RefundPaymentFixture {
            is_refund_success: Some(false),
            sort: 1,
            ..RefundPaymentFixture::new(&older, "Card", "6")
        }
        .insert(db.pool())
        .await;
        RefundItemFixture::new(&older, &item, "1", "4.5").insert(db.pool()).await;

        let refunds = db.order_refunds().list_order_refunds(id, 7).await.unwrap();
        assert_eq!(refunds.len(), 2);

        let first = &refunds[0];
        assert_eq!(first.refund_number.as_deref(), Some("R2"));
        assert_eq!(first.operator_name_phone, "Bob(139)");
        assert_eq!(first.actually_refund_amount, "0.00");
        assert_eq!(first.refund_success_time, "-");
        assert!(first.refund_pay_channel.is_empty());
        assert!(first.items.is_empty());
        assert_eq!(first.aggregated_refund_result_code, 0);

        let second = &refunds[1];
        assert_eq!(second.create_at, "2024-03-02 09:00:00");
        assert_eq!(second.actually_refund_amount, "4.50");
        assert_eq!(second.refund_success_time, "2024-03-02 09:05:00");
        assert_eq!(
            second.refund_pay_channel,
            vec![
                ChannelAmount {
                    method_name: "Cash".to_string(),
                    amount: "¥4.50".to_string()
                },
                ChannelAmount {
                    method_name: "Card".to_string(),
                    amount: "¥0.00".to_string()
                },
            ]
        );
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].goods_sale_name.as_deref(), Some("Milk"));
        assert_eq!(second.items[0].purchase_quantity.as_deref(), Some("2"));
        assert_eq!(second.items[0].refund_price, "¥4.50");
    }

    #[tokio::test]
    async fn test_aggregated_refund_status_per_sheet() {
        let db = test_db().await;
        let order = OrderFixture::new(7, "A1");
        let id = order.insert(db.pool()).await;

        let pending = RefundFixture::new(&order, "R1", "2024-03-02 09:00:00");
        let failed = RefundFixture::new(&order, "R2", "2024-03-03 09:00:00");
        pending.insert(db.pool()).await;
        failed.insert(db.pool()).await;

        RefundPaymentFixture {
            refund_payment_method_id: Some(-1),
            is_refund_success: None,
            ..RefundPaymentFixture::new(&pending, "Aggregated", "8")
        }
        .insert(db.pool())
        .await;
        RefundPaymentFixture {
            refund_payment_method_id: Some(-1),
            is_refund_success: Some(false),
            is_pre_refund_success: Some(true),
            ..RefundPaymentFixture::new(&failed, "Aggregated", "2")
        }
        .insert(db.pool())
        .await;

        let refunds = db.order_refunds().list_order_refunds(id, 7).await.unwrap();
        assert_eq!(refunds[0].refund_number.as_deref(), Some("R2"));
        assert_eq!(refunds[0].aggregated_refund_result_code, 3);
        assert_eq!(refunds[1].aggregated_refund_result_code, 1);

        let latest = db
            .order_refunds()
            .latest_aggregated_refund(id, 7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.order_refund_id, failed.record_id);
        assert_eq!(latest.refund_payment_amount, "2.00");
        assert_eq!(latest.is_refund_success, Some(false));
        assert_eq!(latest.is_pre_refund_success, Some(true));
        assert_eq!(latest.aggregated_refund_result_code, 3);
    }

    #[tokio::test]
    async fn test_no_aggregated_refund() {
        let db = test_db().await;
        let order = OrderFixture::new(7, "A1");
        let id = order.insert(db.pool()).await;
        let refund = RefundFixture::new(&order, "R1", "2024-03-02 09:00:00");
        refund.insert(db.pool()).await;
        RefundPaymentFixture::new(&refund, "Cash", "1").insert(db.pool()).await;

        assert!(db
            .order_refunds()
            .latest_aggregated_refund(id, 7)
            .await
            .unwrap()
            .is_none());
        assert!(db.order_refunds().list_order_refunds(id, 8).await.unwrap().is_empty());
    }

    #[test]
    fn test_refunded_total_ignores_pending_and_failed() {
        let row = |amount: &str, success: Option<i64>| RefundPaymentRow {
            order_refund_id: "r".to_string(),
            refund_payment_method_id: Some(1),
            refund_payment_name: Some("Cash".to_string()),
            refund_payment_amount: Some(amount.to_string()),
            is_refund_success: success,
            refund_success_time: None,
        };
        let rows = vec![row("1.10", Some(1)), row("5", None), row("7", Some(0)), row("2.2", Some(1))];
        assert_eq!(refunded_total(&rows).to_fixed(), "3.30");
        assert_eq!(refunded_total(std::iter::empty()).to_fixed(), "0.00");
    }
}
