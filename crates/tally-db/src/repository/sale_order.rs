//! # Sale Order Repository
//!
//! Order lists, the PC summary, the detail header and the state options.
//!
//! ## List Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_orders(filter, page)                                              │
//! │       │                                                                 │
//! │       ├── validate filter + page                                       │
//! │       ├── BEGIN                                                         │
//! │       ├── COUNT(*)            same predicates, no display joins        │
//! │       ├── SELECT o.id …       ORDER BY … LIMIT ? OFFSET ?              │
//! │       ├── SELECT headers      WHERE o.id IN (page ids)                 │
//! │       ├── SELECT payments     WHERE order_id IN (page record ids)      │
//! │       ├── SELECT items        WHERE order_number IN (page numbers)     │
//! │       ├── COMMIT                                                        │
//! │       └── project             labels, received rule, channel label     │
//! │                                                                         │
//! │  Five statements per page whatever the page size.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Summary
//! `list_orders_with_summary` adds one aggregate statement over every
//! matching order (not just the page). Amounts are summed as integer
//! ten-thousandths and converted back to exact decimals before rounding.

use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use tally_core::display::{
    amount_or_placeholder, format_timestamp, member_label, operator_label, pay_channel_label,
    received_amount, store_channel_label, symbol_amount_or_placeholder, timestamp_or_placeholder,
    MISSING_CHANNEL, PLACEHOLDER,
};
use tally_core::money::{format_quantity, Money};
use tally_core::types::{source_label, state_label, OrderSort, OrderState};
use tally_core::validation::{validate_company_id, validate_filter, validate_order_id, validate_page};
use tally_core::{
    AmountSummary, ChannelAmount, OptionItem, OrderDetail, OrderFilter, OrderItemRecord,
    OrderListRecord, OrderPage, OrderSummaryPage, PageRequest,
};

use crate::config::QueryConfig;
use crate::error::DbResult;
use crate::query::ordering::needs_paid_totals;
use crate::query::{
    push_limit_offset, push_order_by, push_paid_totals_join, received_units, scaled_amount,
    OrderConditions,
};
use crate::repository::order_item::{fetch_items_by_order_numbers, total_quantity};
use crate::repository::order_payment::{fetch_payments, paid_total, PaymentRow};
use crate::repository::order_refund::{fetch_latest_aggregated, fetch_refund_payments, refunded_total};
use crate::repository::with_timeout;

/// Repository for sale order headers.
#[derive(Debug, Clone)]
pub struct SaleOrderRepository {
    pool: SqlitePool,
    config: Arc<QueryConfig>,
}

// =============================================================================
// Rows
// =============================================================================

const HEADER_COLUMNS: &str = "o.id, o.record_id, o.order_number, o.store_name, o.channel_name, \
     o.member_name, o.member_phone, o.operator_name, o.operator_phone, o.shopping_guide_name, \
     o.state, o.order_source, o.created_at, o.paid_at, o.total_origin_price, o.discount_price, \
     o.origin_price, o.change_money, o.remark";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    record_id: String,
    order_number: String,
    store_name: Option<String>,
    channel_name: Option<String>,
    member_name: Option<String>,
    member_phone: Option<String>,
    operator_name: Option<String>,
    operator_phone: Option<String>,
    shopping_guide_name: Option<String>,
    state: i64,
    order_source: i64,
    created_at: NaiveDateTime,
    paid_at: Option<NaiveDateTime>,
    total_origin_price: Option<String>,
    discount_price: Option<String>,
    origin_price: Option<String>,
    change_money: Option<String>,
    remark: Option<String>,
}

impl OrderRow {
    fn amount(&self, field: &str, raw: &Option<String>) -> Option<Money> {
        Money::from_column(field, raw.as_deref())
    }

    fn member(&self) -> String {
        member_label(self.member_name.as_deref(), self.member_phone.as_deref())
    }

    fn operator(&self) -> String {
        operator_label(self.operator_name.as_deref(), self.operator_phone.as_deref())
    }

    fn store_channel(&self) -> String {
        store_channel_label(self.store_name.as_deref(), self.channel_name.as_deref())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    total_count: i64,
    total_units: Option<i64>,
    discount_units: Option<i64>,
    receive_units: Option<i64>,
}

// =============================================================================
// Repository
// =============================================================================

impl SaleOrderRepository {
    /// Creates a new SaleOrderRepository.
    pub fn new(pool: SqlitePool, config: Arc<QueryConfig>) -> Self {
        SaleOrderRepository { pool, config }
    }

    /// Mobile order list, newest first.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let page = db
    ///     .sale_orders()
    ///     .list_orders(&OrderFilter::for_company(7).keyword("milk"), PageRequest::new(1, 20))
    ///     .await?;
    /// println!("{} of {}", page.records_list.len(), page.all_count);
    /// ```
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> DbResult<OrderPage<OrderListRecord>> {
        validate_filter(filter)?;
        validate_page(&page, self.config.max_page_size)?;
        let conditions = OrderConditions::from_filter(filter, &self.config);

        with_timeout("list_orders", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let all_count = count_orders(&mut tx, &conditions).await?;
            let records =
                self.fetch_page(&mut tx, filter.company_id, &conditions, None, page, all_count)
                    .await?;
            tx.commit().await?;

            debug!(
                company_id = filter.company_id,
                page = page.page_number,
                rows = records.len(),
                all_count,
                "Listed orders"
            );
            Ok(OrderPage {
                records_list: records,
                all_count,
            })
        })
        .await
    }

    /// PC order list with an optional sort and totals over every match.
    pub async fn list_orders_with_summary(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
        sort: Option<OrderSort>,
    ) -> DbResult<OrderSummaryPage> {
        validate_filter(filter)?;
        validate_page(&page, self.config.max_page_size)?;
        let conditions = OrderConditions::from_filter(filter, &self.config);

        with_timeout("list_orders_with_summary", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let summary = summarize_orders(&mut tx, filter.company_id, &conditions).await?;
            let records = self
                .fetch_page(
                    &mut tx,
                    filter.company_id,
                    &conditions,
                    sort.as_ref(),
                    page,
                    summary.total_count,
                )
                .await?;
            tx.commit().await?;

            debug!(
                company_id = filter.company_id,
                page = page.page_number,
                rows = records.len(),
                all_count = summary.total_count,
                "Listed orders with summary"
            );
            Ok(OrderSummaryPage {
                records_list: records,
                all_count: summary.total_count,
                amount_data: summary,
            })
        })
        .await
    }

    /// Detail header of one order; `None` when the company has no such live
    /// order.
    pub async fn get_order_detail(
        &self,
        order_id: i64,
        company_id: i64,
    ) -> DbResult<Option<OrderDetail>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout("get_order_detail", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;

            let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
            qb.push(HEADER_COLUMNS)
                .push(" FROM sale_order o WHERE o.id = ")
                .push_bind(order_id)
                .push(" AND o.company_id = ")
                .push_bind(company_id)
                .push(" AND o.disabled = 0");
            let Some(order) = qb.build_query_as::<OrderRow>().fetch_optional(&mut *tx).await? else {
                return Ok(None);
            };

            let record_ids = std::slice::from_ref(&order.record_id);
            let payments = fetch_payments(&mut tx, company_id, record_ids).await?;
            let refunds = fetch_refund_payments(&mut tx, record_ids).await?;
            let aggregated = fetch_latest_aggregated(
                &mut tx,
                &order.record_id,
                self.config.aggregated_refund_method_id,
            )
            .await?;
            tx.commit().await?;

            let refund_total = refunded_total(&refunds);
            let aggregated_code = aggregated
                .map(|row| row.status().code())
                .unwrap_or_default();

            Ok(Some(project_detail(
                order,
                &payments,
                refund_total,
                aggregated_code,
                &self.config,
            )))
        })
        .await
    }

    /// Selectable states present among the company's orders, by code.
    pub async fn list_order_states(&self, company_id: i64) -> DbResult<Vec<OptionItem>> {
        validate_company_id(company_id)?;

        with_timeout("list_order_states", self.config.query_timeout, async {
            let codes: Vec<i64> = sqlx::query_scalar(
                "SELECT DISTINCT state FROM sale_order \
                 WHERE company_id = ? AND disabled = 0 ORDER BY state",
            )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

            Ok(codes
                .into_iter()
                .filter_map(OrderState::from_code)
                .filter(|state| state.is_selectable())
                .map(|state| OptionItem::new(state.code(), state.label()))
                .collect())
        })
        .await
    }

    // =========================================================================
    // Page Assembly
    // =========================================================================

    async fn fetch_page(
        &self,
        conn: &mut SqliteConnection,
        company_id: i64,
        conditions: &OrderConditions,
        sort: Option<&OrderSort>,
        page: PageRequest,
        all_count: i64,
    ) -> DbResult<Vec<OrderListRecord>> {
        if all_count == 0 || page.offset() >= all_count {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT o.id FROM sale_order o");
        if needs_paid_totals(sort) {
            push_paid_totals_join(&mut qb, company_id);
        }
        conditions.push_where(&mut qb);
        push_order_by(&mut qb, sort);
        push_limit_offset(&mut qb, page);
        let ids: Vec<i64> = qb.build_query_scalar().fetch_all(&mut *conn).await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(HEADER_COLUMNS).push(" FROM sale_order o WHERE o.id IN (");
        let mut separated = qb.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let rows = qb.build_query_as::<OrderRow>().fetch_all(&mut *conn).await?;

        let mut by_id: HashMap<i64, OrderRow> = rows.into_iter().map(|row| (row.id, row)).collect();
        let rows: Vec<OrderRow> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

        let record_ids: Vec<String> = rows.iter().map(|row| row.record_id.clone()).collect();
        let order_numbers: Vec<String> = rows.iter().map(|row| row.order_number.clone()).collect();

        let payments = fetch_payments(conn, company_id, &record_ids).await?;
        let mut payments_by_order: HashMap<&str, Vec<&PaymentRow>> = HashMap::new();
        for payment in &payments {
            payments_by_order
                .entry(payment.order_id.as_str())
                .or_default()
                .push(payment);
        }

        let mut items = fetch_items_by_order_numbers(conn, company_id, &order_numbers).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = payments_by_order
                    .get(row.record_id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let goods = items.remove(&row.order_number).unwrap_or_default();
                project_list_row(row, lines, goods, &self.config)
            })
            .collect())
    }
}

// =============================================================================
// Statements
// =============================================================================

async fn count_orders(conn: &mut SqliteConnection, conditions: &OrderConditions) -> DbResult<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sale_order o");
    conditions.push_where(&mut qb);
    let count: i64 = qb.build_query_scalar().fetch_one(&mut *conn).await?;
    Ok(count)
}

async fn summarize_orders(
    conn: &mut SqliteConnection,
    company_id: i64,
    conditions: &OrderConditions,
) -> DbResult<AmountSummary> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS total_count, SUM(");
    qb.push(scaled_amount("o.total_origin_price"))
        .push(") AS total_units, SUM(")
        .push(scaled_amount("o.discount_price"))
        .push(") AS discount_units, SUM(")
        .push(received_units())
        .push(") AS receive_units FROM sale_order o");
    push_paid_totals_join(&mut qb, company_id);
    conditions.push_where(&mut qb);

    let row = qb.build_query_as::<SummaryRow>().fetch_one(&mut *conn).await?;
    let total = |units: Option<i64>| Money::from_scaled_units(units.unwrap_or_default()).to_fixed();

    debug!(total_count = row.total_count, "Summarized matching orders");
    Ok(AmountSummary {
        total_price: total(row.total_units),
        total_discount_price: total(row.discount_units),
        total_receive_price: total(row.receive_units),
        total_count: row.total_count,
    })
}

// =============================================================================
// Projection
// =============================================================================

fn project_list_row(
    row: OrderRow,
    payments: &[&PaymentRow],
    goods: Vec<OrderItemRecord>,
    config: &QueryConfig,
) -> OrderListRecord {
    let paid = paid_total(payments.iter().copied());
    let pay_channel = pay_channel_label(
        payments.iter().map(|p| (p.method_name(), p.sort)),
        &config.channel_separator,
    );
    OrderListRecord {
        store_channel_name: row.store_channel(),
        member_name_phone: row.member(),
        operator_name_phone: row.operator(),
        create_at: format_timestamp(row.created_at),
        state_name: state_label(row.state).to_string(),
        total_origin_price: amount_or_placeholder(row.amount("total_origin_price", &row.total_origin_price)),
        discount_price: amount_or_placeholder(row.amount("discount_price", &row.discount_price)),
        receive_price: received_amount(row.state, paid),
        pay_channel,
        total_purchase_quantity: format_quantity(total_quantity(&goods)),
        goods_info: goods,
        id: row.id,
        record_id: row.record_id,
        order_number: row.order_number,
        store_name: row.store_name,
        channel_name: row.channel_name,
        shopping_guide_name: row.shopping_guide_name,
        state: row.state,
    }
}

fn project_detail(
    row: OrderRow,
    payments: &[PaymentRow],
    refund_total: Money,
    aggregated_refund_result_code: u8,
    config: &QueryConfig,
) -> OrderDetail {
    let symbol = config.currency_symbol.as_str();
    let failed = OrderState::from_code(row.state)
        .map(OrderState::is_payment_failure)
        .unwrap_or(false);

    let successful: Vec<ChannelAmount> = payments
        .iter()
        .filter(|p| p.succeeded())
        .map(|p| ChannelAmount {
            method_name: p.method_name().to_string(),
            amount: p.amount().unwrap_or_default().with_symbol(symbol),
        })
        .collect();

    // Failed orders list every attempt at zero; others list what was taken.
    let channel_lines: Vec<String> = if failed {
        payments
            .iter()
            .map(|p| format!("{}({})", Money::zero().with_symbol(symbol), p.method_name()))
            .collect()
    } else {
        successful
            .iter()
            .map(|line| format!("{}({})", line.amount, line.method_name))
            .collect()
    };
    let pay_channel = if channel_lines.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        channel_lines.join(&config.payment_line_separator)
    };

    let nonzero = |field: &str, raw: &Option<String>| {
        symbol_amount_or_placeholder(row.amount(field, raw).filter(|m| !m.is_zero()), symbol)
    };
    let receive_price = match received_amount(row.state, paid_total(payments)) {
        shown if shown == PLACEHOLDER => shown,
        shown => format!("{}{}", symbol, shown),
    };

    OrderDetail {
        channel_name: row
            .channel_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| MISSING_CHANNEL.to_string()),
        store_channel_name: row.store_channel(),
        state_name: state_label(row.state).to_string(),
        order_source_name: source_label(row.order_source).to_string(),
        member_name_phone: row.member(),
        operator_name_phone: row.operator(),
        create_at: format_timestamp(row.created_at),
        paid_at: timestamp_or_placeholder(row.paid_at),
        total_origin_price: nonzero("total_origin_price", &row.total_origin_price),
        discount_price: nonzero("discount_price", &row.discount_price),
        origin_price: symbol_amount_or_placeholder(row.amount("origin_price", &row.origin_price), symbol),
        receive_price,
        change_money: symbol_amount_or_placeholder(row.amount("change_money", &row.change_money), symbol),
        payments: successful,
        pay_channel,
        actually_refund_amount_all: refund_total.to_fixed(),
        aggregated_refund_result_code,
        id: row.id,
        record_id: row.record_id,
        order_number: row.order_number,
        remark: row.remark,
        store_name: row.store_name,
        state: row.state,
        shopping_guide_name: row.shopping_guide_name,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::test_support::{
        test_db, test_db_with, ItemFixture, OrderFixture, PaymentFixture, RefundFixture,
        RefundPaymentFixture,
    };
    use crate::Database;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tally_core::types::{AmountFilter, AmountType, ComparisonOperator, SortDirection, SortField};

    async fn seed_orders(db: &Database, company_id: i64, count: usize) -> Vec<i64> {
        let mut ids = Vec::new();
        for i in 0..count {
            let order = OrderFixture {
                created_at: format!("2024-03-01 10:{:02}:00", i % 3),
                total_origin_price: Some(format!("{}.50", 10 + i)),
                ..OrderFixture::new(company_id, &format!("N{:03}", i))
            };
            ids.push(order.insert(db.pool()).await);
            PaymentFixture::paid(&order, "Cash", &format!("{}.50", 10 + i))
                .insert(db.pool())
                .await;
            ItemFixture::new(&order, if i % 2 == 0 { "Milk" } else { "Bread" })
                .insert(db.pool())
                .await;
        }
        ids
    }

    #[tokio::test]
    async fn test_list_projects_rows() {
        let db = test_db().await;
        let order = OrderFixture {
            member_name: Some("Ann".to_string()),
            member_phone: Some("138".to_string()),
            ..OrderFixture::new(7, "A1")
        };
        order.insert(db.pool()).await;
        PaymentFixture::paid(&order, "Card", "12.345").insert(db.pool()).await;
        PaymentFixture {
            sort: 1,
            ..PaymentFixture::paid(&order, "Cash", "7.655")
        }
        .insert(db.pool())
        .await;
        ItemFixture {
            purchase_quantity: Some("1.500".to_string()),
            ..ItemFixture::new(&order, "Milk")
        }
        .insert(db.pool())
        .await;
        ItemFixture::new(&order, "Bread").insert(db.pool()).await;

        let page = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7), PageRequest::new(1, 20))
            .await
            .unwrap();

        assert_eq!(page.all_count, 1);
        let row = &page.records_list[0];
        assert_eq!(row.order_number, "A1");
        assert_eq!(row.state_name, "Completed");
        assert_eq!(row.member_name_phone, "Ann(138)");
        assert_eq!(row.store_channel_name, "Main St - POS");
        assert_eq!(row.create_at, "2024-03-01 10:00:00");
        assert_eq!(row.receive_price, "20.00");
        assert_eq!(row.pay_channel.as_deref(), Some("Card, Cash"));
        assert_eq!(row.total_purchase_quantity, "2.5");
        assert_eq!(row.goods_info.len(), 2);
    }

    #[tokio::test]
    async fn test_awaiting_payment_hides_received_amount() {
        let db = test_db().await;
        let order = OrderFixture {
            state: OrderState::AwaitingPayment.code(),
            ..OrderFixture::new(7, "A1")
        };
        order.insert(db.pool()).await;
        PaymentFixture::paid(&order, "Cash", "50.00").insert(db.pool()).await;

        let page = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7).states(vec![1]), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.records_list[0].receive_price, "-");

        // Not in the default state list.
        let default = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(default.all_count, 0);
    }

    #[tokio::test]
    async fn test_filters_never_increase_count() {
        let db = test_db().await;
        seed_orders(&db, 7, 6).await;
        let repo = db.sale_orders();
        let page = PageRequest::new(1, 50);

        let base = repo.list_orders(&OrderFilter::for_company(7), page).await.unwrap();
        let filters = [
            OrderFilter::for_company(7).keyword("Milk"),
            OrderFilter::for_company(7).keyword("Milk").order_number("N00"),
            OrderFilter::for_company(7).store_ids(vec![1]).channel_ids(vec![2]),
            OrderFilter::for_company(7).payment_method_ids(vec![1]),
            OrderFilter::for_company(7).amount_filter(AmountFilter::new(
                AmountType::TotalPrice,
                ComparisonOperator::Gte,
                Decimal::from_str("13").unwrap(),
            )),
        ];

        assert_eq!(base.all_count, 6);
        let mut previous = base.all_count;
        for filter in filters.iter().take(2) {
            let count = repo.list_orders(filter, page).await.unwrap().all_count;
            assert!(count <= previous);
            previous = count;
        }
        for filter in &filters {
            let count = repo.list_orders(filter, page).await.unwrap().all_count;
            assert!(count <= base.all_count);
        }
        assert_eq!(repo.list_orders(&filters[0], page).await.unwrap().all_count, 3);
        assert_eq!(repo.list_orders(&filters[2], page).await.unwrap().all_count, 0);
        assert_eq!(repo.list_orders(&filters[4], page).await.unwrap().all_count, 3);
    }

    #[tokio::test]
    async fn test_pages_concatenate_without_gaps() {
        let db = test_db().await;
        seed_orders(&db, 7, 7).await;
        let repo = db.sale_orders();
        let filter = OrderFilter::for_company(7);

        let all: Vec<i64> = repo
            .list_orders(&filter, PageRequest::new(1, 100))
            .await
            .unwrap()
            .records_list
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(all.len(), 7);

        let mut paged = Vec::new();
        for number in 1..=3 {
            let page = repo.list_orders(&filter, PageRequest::new(number, 3)).await.unwrap();
            assert_eq!(page.all_count, 7);
            paged.extend(page.records_list.iter().map(|r| r.id));
        }
        assert_eq!(paged, all);

        let beyond = repo.list_orders(&filter, PageRequest::new(9, 3)).await.unwrap();
        assert!(beyond.records_list.is_empty());
        assert_eq!(beyond.all_count, 7);
    }

    #[tokio::test]
    async fn test_percent_search_is_literal() {
        let db = test_db().await;
        OrderFixture::new(7, "50%OFF").insert(db.pool()).await;
        OrderFixture::new(7, "500FF").insert(db.pool()).await;

        let page = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7).order_number("0%"), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.all_count, 1);
        assert_eq!(page.records_list[0].order_number, "50%OFF");
    }

    #[tokio::test]
    async fn test_percent_product_search_is_literal() {
        let db = test_db().await;
        let discounted = OrderFixture::new(7, "A1");
        let plain = OrderFixture::new(7, "B1");
        discounted.insert(db.pool()).await;
        plain.insert(db.pool()).await;
        ItemFixture::new(&discounted, "Milk 50%off").insert(db.pool()).await;
        ItemFixture::new(&plain, "Milk 500ff").insert(db.pool()).await;

        let page = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7).product_name("0%"), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.all_count, 1);
        assert_eq!(page.records_list[0].order_number, "A1");
    }

    #[tokio::test]
    async fn test_amount_filter_matches_five_decimal_amounts() {
        let db = test_db().await;
        for (number, amount) in [("A", "2.00025"), ("B", "0.00025"), ("C", "12.34565")] {
            OrderFixture {
                total_origin_price: Some(amount.to_string()),
                ..OrderFixture::new(7, number)
            }
            .insert(db.pool())
            .await;
        }
        let repo = db.sale_orders();
        let count = |op: ComparisonOperator, value: &str| {
            let filter = OrderFilter::for_company(7).amount_filter(AmountFilter::new(
                AmountType::TotalPrice,
                op,
                Decimal::from_str(value).unwrap(),
            ));
            let repo = repo.clone();
            async move {
                repo.list_orders(&filter, PageRequest::new(1, 20))
                    .await
                    .unwrap()
                    .all_count
            }
        };

        for value in ["2.00025", "0.00025", "12.34565"] {
            assert_eq!(count(ComparisonOperator::Eq, value).await, 1, "= {value}");
            assert_eq!(count(ComparisonOperator::Ne, value).await, 2, "!= {value}");
        }
        assert_eq!(count(ComparisonOperator::Eq, "2.0003").await, 1);
        assert_eq!(count(ComparisonOperator::Gt, "2.0003").await, 1);
    }

    #[tokio::test]
    async fn test_companies_are_isolated() {
        let db = test_db().await;
        seed_orders(&db, 7, 2).await;
        seed_orders(&db, 8, 3).await;

        let page = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(8), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.all_count, 3);
        assert!(page.records_list.iter().all(|r| r.goods_info.len() == 1));
    }

    #[tokio::test]
    async fn test_summary_covers_every_match() {
        let db = test_db().await;
        let a = OrderFixture {
            total_origin_price: Some("12.345".to_string()),
            discount_price: Some("1.10".to_string()),
            ..OrderFixture::new(7, "A1")
        };
        let b = OrderFixture {
            total_origin_price: Some("7.655".to_string()),
            discount_price: None,
            ..OrderFixture::new(7, "A2")
        };
        a.insert(db.pool()).await;
        b.insert(db.pool()).await;
        PaymentFixture::paid(&a, "Cash", "12.345").insert(db.pool()).await;
        PaymentFixture::paid(&b, "Cash", "7.655").insert(db.pool()).await;
        PaymentFixture {
            is_pay_success: Some(false),
            ..PaymentFixture::paid(&b, "Card", "99")
        }
        .insert(db.pool())
        .await;

        let page = db
            .sale_orders()
            .list_orders_with_summary(&OrderFilter::for_company(7), PageRequest::new(1, 1), None)
            .await
            .unwrap();

        assert_eq!(page.records_list.len(), 1);
        assert_eq!(page.all_count, 2);
        assert_eq!(
            page.amount_data,
            AmountSummary {
                total_price: "20.00".to_string(),
                total_discount_price: "1.10".to_string(),
                total_receive_price: "20.00".to_string(),
                total_count: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_sort_by_received_amount_puts_unpaid_last() {
        let db = test_db().await;
        let small = OrderFixture::new(7, "S");
        let large = OrderFixture::new(7, "L");
        let unpaid = OrderFixture::new(7, "U");
        small.insert(db.pool()).await;
        large.insert(db.pool()).await;
        unpaid.insert(db.pool()).await;
        PaymentFixture::paid(&small, "Cash", "9.99").insert(db.pool()).await;
        PaymentFixture::paid(&large, "Cash", "10").insert(db.pool()).await;

        let repo = db.sale_orders();
        let numbers = |page: OrderSummaryPage| -> Vec<String> {
            page.records_list.into_iter().map(|r| r.order_number).collect()
        };

        let ascending = repo
            .list_orders_with_summary(
                &OrderFilter::for_company(7),
                PageRequest::new(1, 10),
                Some(OrderSort::new(SortField::ReceivePrice, SortDirection::Ascend)),
            )
            .await
            .unwrap();
        assert_eq!(numbers(ascending), vec!["S", "L", "U"]);

        let descending = repo
            .list_orders_with_summary(
                &OrderFilter::for_company(7),
                PageRequest::new(1, 10),
                Some(OrderSort::new(SortField::ReceivePrice, SortDirection::Descend)),
            )
            .await
            .unwrap();
        assert_eq!(numbers(descending), vec!["L", "S", "U"]);
    }

    #[tokio::test]
    async fn test_receive_sort_ranks_hidden_amounts_last() {
        let db = test_db().await;
        let paid = OrderFixture::new(7, "P");
        let awaiting = OrderFixture {
            state: OrderState::AwaitingPayment.code(),
            ..OrderFixture::new(7, "W")
        };
        paid.insert(db.pool()).await;
        awaiting.insert(db.pool()).await;
        PaymentFixture::paid(&paid, "Cash", "5").insert(db.pool()).await;
        PaymentFixture::paid(&awaiting, "Cash", "50").insert(db.pool()).await;

        // A payment row booked under another company does not count.
        PaymentFixture {
            company_id: 8,
            ..PaymentFixture::paid(&paid, "Cash", "100")
        }
        .insert(db.pool())
        .await;

        let page = db
            .sale_orders()
            .list_orders_with_summary(
                &OrderFilter::for_company(7).states(vec![1, 5]),
                PageRequest::new(1, 10),
                Some(OrderSort::new(SortField::ReceivePrice, SortDirection::Descend)),
            )
            .await
            .unwrap();

        let numbers: Vec<&str> = page.records_list.iter().map(|r| r.order_number.as_str()).collect();
        assert_eq!(numbers, vec!["P", "W"]);
        assert_eq!(page.records_list[0].receive_price, "5.00");
        assert_eq!(page.records_list[1].receive_price, "-");
        assert_eq!(page.amount_data.total_receive_price, "5.00");
    }

    #[tokio::test]
    async fn test_business_day_range() {
        let db = test_db().await;
        OrderFixture {
            business_day: Some("2024-02-28".to_string()),
            ..OrderFixture::new(7, "OLD")
        }
        .insert(db.pool())
        .await;
        OrderFixture::new(7, "NEW").insert(db.pool()).await;

        let filter = OrderFilter::for_company(7).business_day_between(
            NaiveDate::from_ymd_opt(2024, 3, 1),
            NaiveDate::from_ymd_opt(2024, 3, 1),
        );
        let page = db
            .sale_orders()
            .list_orders(&filter, PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.all_count, 1);
        assert_eq!(page.records_list[0].order_number, "NEW");
    }

    #[tokio::test]
    async fn test_invalid_page_is_rejected() {
        let db = test_db().await;
        let err = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7), PageRequest::new(0, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unrestricted_source_lists_every_source() {
        let db = test_db_with(QueryConfig {
            list_order_source: None,
            ..QueryConfig::default()
        })
        .await;
        OrderFixture::new(7, "A1").insert(db.pool()).await;
        OrderFixture {
            order_source: 2,
            ..OrderFixture::new(7, "A2")
        }
        .insert(db.pool())
        .await;

        let page = db
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.all_count, 2);

        let restricted = test_db().await;
        OrderFixture {
            order_source: 2,
            ..OrderFixture::new(7, "A2")
        }
        .insert(restricted.pool())
        .await;
        let page = restricted
            .sale_orders()
            .list_orders(&OrderFilter::for_company(7), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.all_count, 0);
    }

    #[tokio::test]
    async fn test_order_detail() {
        let db = test_db().await;
        let order = OrderFixture {
            channel_name: None,
            discount_price: Some("0".to_string()),
            change_money: Some("0.5".to_string()),
            paid_at: None,
            ..OrderFixture::new(7, "A1")
        };
        let id = order.insert(db.pool()).await;
        PaymentFixture::paid(&order, "Card", "60").insert(db.pool()).await;
        PaymentFixture {
            sort: 1,
            ..PaymentFixture::paid(&order, "Cash", "40.5")
        }
        .insert(db.pool())
        .await;
        PaymentFixture {
            is_pay_success: None,
            sort: 2,
            ..PaymentFixture::paid(&order, "Wallet", "3")
        }
        .insert(db.pool())
        .await;

        let refund = RefundFixture::new(&order, "R1", "2024-03-02 09:00:00");
        refund.insert(db.pool()).await;
        RefundPaymentFixture {
            refund_payment_method_id: Some(-1),
            is_refund_success: Some(true),
            ..RefundPaymentFixture::new(&refund, "Aggregated", "5")
        }
        .insert(db.pool())
        .await;

        let detail = db
            .sale_orders()
            .get_order_detail(id, 7)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(detail.channel_name, "--");
        assert_eq!(detail.store_channel_name, "Main St");
        assert_eq!(detail.order_source_name, "Store cashier");
        assert_eq!(detail.paid_at, "-");
        assert_eq!(detail.total_origin_price, "¥100.00");
        assert_eq!(detail.discount_price, "-");
        assert_eq!(detail.origin_price, "¥100.00");
        assert_eq!(detail.receive_price, "¥100.50");
        assert_eq!(detail.change_money, "¥0.50");
        assert_eq!(detail.pay_channel, "¥60.00(Card); ¥40.50(Cash)");
        assert_eq!(detail.payments.len(), 2);
        assert_eq!(detail.actually_refund_amount_all, "5.00");
        assert_eq!(detail.aggregated_refund_result_code, 2);
    }

    #[tokio::test]
    async fn test_failed_order_detail_shows_zero_lines() {
        let db = test_db().await;
        let order = OrderFixture {
            state: OrderState::PaymentFailed.code(),
            ..OrderFixture::new(7, "A1")
        };
        let id = order.insert(db.pool()).await;
        PaymentFixture {
            is_pay_success: Some(false),
            ..PaymentFixture::paid(&order, "Card", "60")
        }
        .insert(db.pool())
        .await;

        let detail = db
            .sale_orders()
            .get_order_detail(id, 7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.state_name, "Payment failed");
        assert_eq!(detail.pay_channel, "¥0.00(Card)");
        assert!(detail.payments.is_empty());
        assert_eq!(detail.receive_price, "-");
        assert_eq!(detail.actually_refund_amount_all, "0.00");
        assert_eq!(detail.aggregated_refund_result_code, 0);
    }

    #[tokio::test]
    async fn test_detail_is_company_scoped_and_skips_disabled() {
        let db = test_db().await;
        let id = OrderFixture::new(7, "A1").insert(db.pool()).await;
        let disabled = OrderFixture {
            disabled: true,
            ..OrderFixture::new(7, "A2")
        }
        .insert(db.pool())
        .await;

        let repo = db.sale_orders();
        assert!(repo.get_order_detail(id, 8).await.unwrap().is_none());
        assert!(repo.get_order_detail(disabled, 7).await.unwrap().is_none());
        assert!(repo.get_order_detail(id, 7).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_state_options() {
        let db = test_db().await;
        for (number, state) in [("A", 8), ("B", 4), ("C", 1), ("D", 4), ("E", 42), ("F", 12)] {
            OrderFixture {
                state,
                ..OrderFixture::new(7, number)
            }
            .insert(db.pool())
            .await;
        }

        let options = db.sale_orders().list_order_states(7).await.unwrap();
        assert_eq!(
            options,
            vec![OptionItem::new(4, "Paid"), OptionItem::new(8, "Refunded")]
        );
        assert!(db.sale_orders().list_order_states(9).await.unwrap().is_empty());
    }
}
