//! # Order Item Repository
//!
//! Line items of an order, in three shapes:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items_by_order_numbers     page of order numbers ──► one IN query     │
//! │                             grouped by order number, item id order     │
//! │                                                                         │
//! │  get_order_detail_items     one order ──► items + successful refunds   │
//! │                             prices, special pricing, refund status     │
//! │                                                                         │
//! │  get_goods_price_statistic  one order ──► quantity / price totals      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are summed as exact decimals in Rust and rounded once for display.
//! Quantities keep their precision and drop trailing zeros.

use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use tally_core::display::{amount_or_placeholder, refund_status_label, symbol_amount_or_placeholder};
use tally_core::money::{format_quantity, parse_quantity, Money};
use tally_core::pricing::{ItemExtra, LinePrices};
use tally_core::validation::{validate_company_id, validate_order_id};
use tally_core::{GoodsPriceStatistic, OrderDetailItem, OrderItemRecord};

use crate::config::QueryConfig;
use crate::error::DbResult;
use crate::repository::{push_text_in, with_timeout};

/// Repository for order line items.
#[derive(Debug, Clone)]
pub struct OrderItemRepository {
    pool: SqlitePool,
    config: Arc<QueryConfig>,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct DetailItemRow {
    id: i64,
    record_id: String,
    spu_code: Option<String>,
    sku_code: Option<String>,
    barcode: Option<String>,
    goods_sale_name: Option<String>,
    goods_unit_name: Option<String>,
    picture_url: Option<String>,
    goods_spec: Option<i64>,
    goods_package_sku_id: Option<i64>,
    goods_specification: Option<String>,
    selling_price: Option<String>,
    discount_price_in_shopcar: Option<String>,
    purchase_quantity: Option<String>,
    actual_receive_price: Option<String>,
    extra: Option<String>,
}

impl DetailItemRow {
    fn line_prices(&self) -> LinePrices {
        LinePrices {
            selling_price: Money::from_column("selling_price", self.selling_price.as_deref()),
            discount_price_in_shopcar: Money::from_column(
                "discount_price_in_shopcar",
                self.discount_price_in_shopcar.as_deref(),
            ),
            purchase_quantity: parse_quantity(self.purchase_quantity.as_deref()),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RefundedQuantityRow {
    order_item_id: String,
    refund_quantity: Option<String>,
}

const DETAIL_ITEM_SQL: &str = r#"
    SELECT
        i.id, i.record_id, i.spu_code, i.sku_code, i.barcode,
        i.goods_sale_name, i.goods_unit_name, i.picture_url,
        i.goods_spec, i.goods_package_sku_id, i.goods_specification,
        i.selling_price, i.discount_price_in_shopcar, i.purchase_quantity,
        i.actual_receive_price, i.extra
    FROM sale_order o
    JOIN sale_order_item i ON i.order_id = o.record_id AND i.disabled = 0
    WHERE o.id = ? AND o.company_id = ? AND o.disabled = 0
    ORDER BY i.id
"#;

// =============================================================================
// Shared Queries
// =============================================================================

/// Fetches the non-disabled items of a page of orders in one round trip.
///
/// Orders without items are absent from the map.
pub(crate) async fn fetch_items_by_order_numbers(
    conn: &mut SqliteConnection,
    company_id: i64,
    order_numbers: &[String],
) -> DbResult<HashMap<String, Vec<OrderItemRecord>>> {
    if order_numbers.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, order_number, goods_id, goods_sale_name, barcode, goods_custom_code, \
         purchase_quantity, selling_price, vip_price, discount_price_in_shopcar, \
         actual_receive_price, retail_discount_amount, member_discount_amount, \
         discount_amount_all, costs, goods_unit_name, picture_url, category_name, \
         goods_spec, goods_package_sku_id, goods_specification \
         FROM sale_order_item WHERE disabled = 0 AND company_id = ",
    );
    qb.push_bind(company_id).push(" AND ");
    push_text_in(&mut qb, "order_number", order_numbers);
    qb.push(" ORDER BY id");

    let items = qb.build_query_as::<OrderItemRecord>().fetch_all(&mut *conn).await?;

    debug!(
        orders = order_numbers.len(),
        items = items.len(),
        "Fetched items for order page"
    );

    let mut grouped: HashMap<String, Vec<OrderItemRecord>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_number.clone()).or_default().push(item);
    }
    Ok(grouped)
}

/// Exact sum of item quantities; blank or malformed quantities count as zero.
pub(crate) fn total_quantity(items: &[OrderItemRecord]) -> Decimal {
    items
        .iter()
        .filter_map(|item| parse_quantity(item.purchase_quantity.as_deref()))
        .sum()
}

async fn fetch_detail_rows(
    conn: &mut SqliteConnection,
    order_id: i64,
    company_id: i64,
) -> DbResult<Vec<DetailItemRow>> {
    let rows = sqlx::query_as::<_, DetailItemRow>(DETAIL_ITEM_SQL)
        .bind(order_id)
        .bind(company_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Successfully refunded quantity per item record id.
async fn fetch_refunded_quantities(
    conn: &mut SqliteConnection,
    order_id: i64,
    company_id: i64,
) -> DbResult<HashMap<String, Decimal>> {
    let rows = sqlx::query_as::<_, RefundedQuantityRow>(
        r#"
        SELECT ri.order_item_id, ri.refund_quantity
        FROM sale_order o
        JOIN sale_order_item i ON i.order_id = o.record_id
        JOIN sale_order_refund_item ri ON ri.order_item_id = i.record_id
        WHERE o.id = ? AND o.company_id = ? AND o.disabled = 0
          AND ri.is_refund_success = 1
        "#,
    )
    .bind(order_id)
    .bind(company_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut refunded: HashMap<String, Decimal> = HashMap::new();
    for row in rows {
        if let Some(quantity) = parse_quantity(row.refund_quantity.as_deref()) {
            *refunded.entry(row.order_item_id).or_default() += quantity;
        }
    }
    refunded.retain(|_, quantity| !quantity.is_zero());
    Ok(refunded)
}

// =============================================================================
// Repository
// =============================================================================

impl OrderItemRepository {
    /// Creates a new OrderItemRepository.
    pub fn new(pool: SqlitePool, config: Arc<QueryConfig>) -> Self {
        OrderItemRepository { pool, config }
    }

    /// Items of many orders, grouped by order number.
    pub async fn items_by_order_numbers(
        &self,
        company_id: i64,
        order_numbers: &[String],
    ) -> DbResult<HashMap<String, Vec<OrderItemRecord>>> {
        validate_company_id(company_id)?;

        with_timeout("items_by_order_numbers", self.config.query_timeout, async {
            let mut conn = self.pool.acquire().await?;
            fetch_items_by_order_numbers(&mut conn, company_id, order_numbers).await
        })
        .await
    }

    /// Items of one order as shown on the detail page.
    ///
    /// Empty when the order does not exist in the company.
    pub async fn get_order_detail_items(
        &self,
        order_id: i64,
        company_id: i64,
    ) -> DbResult<Vec<OrderDetailItem>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout("get_order_detail_items", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let rows = fetch_detail_rows(&mut tx, order_id, company_id).await?;
            let refunded = fetch_refunded_quantities(&mut tx, order_id, company_id).await?;
            tx.commit().await?;

            debug!(order_id, items = rows.len(), "Loaded detail items");

            let symbol = self.config.currency_symbol.as_str();
            Ok(rows
                .into_iter()
                .map(|row| project_detail_item(row, &refunded, symbol))
                .collect())
        })
        .await
    }

    /// Quantity and price totals over one order's items.
    ///
    /// `None` when the order does not exist in the company.
    pub async fn get_goods_price_statistic(
        &self,
        order_id: i64,
        company_id: i64,
    ) -> DbResult<Option<GoodsPriceStatistic>> {
        validate_order_id(order_id)?;
        validate_company_id(company_id)?;

        with_timeout("get_goods_price_statistic", self.config.query_timeout, async {
            let mut tx = self.pool.begin().await?;

            let total_origin_price: Option<Option<String>> = sqlx::query_scalar(
                "SELECT total_origin_price FROM sale_order \
                 WHERE id = ? AND company_id = ? AND disabled = 0",
            )
            .bind(order_id)
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(total_origin_price) = total_origin_price else {
                return Ok(None);
            };

            let rows = fetch_detail_rows(&mut tx, order_id, company_id).await?;
            tx.commit().await?;

            Ok(Some(price_statistic(total_origin_price.as_deref(), &rows)))
        })
        .await
    }
}

// =============================================================================
// Projection
// =============================================================================

fn project_detail_item(
    row: DetailItemRow,
    refunded: &HashMap<String, Decimal>,
    symbol: &str,
) -> OrderDetailItem {
    let extra = ItemExtra::parse_lenient(row.id, row.extra.as_deref());
    let line = row.line_prices();
    let quantity = line.purchase_quantity;
    let refunded_quantity = refunded.get(&row.record_id).copied();

    let change_price_mark = row
        .discount_price_in_shopcar
        .as_deref()
        .is_some_and(|price| !price.trim().is_empty());

    OrderDetailItem {
        id: row.id,
        selling_price: symbol_amount_or_placeholder(line.selling_price, symbol),
        discount_price_in_shopcar: line.discount_price_in_shopcar.map(|m| m.with_symbol(symbol)),
        change_price_mark,
        limit_time_special_price: symbol_amount_or_placeholder(
            extra.special_price().map(Money::new),
            symbol,
        ),
        limit_time_special_quantity: extra.partial_special_quantity(quantity).map(format_quantity),
        purchase_quantity: quantity.map(format_quantity),
        total_price_item: symbol_amount_or_placeholder(line.original_subtotal(), symbol),
        after_discount_subtotal: symbol_amount_or_placeholder(
            line.after_discount_subtotal(&extra),
            symbol,
        ),
        actual_receive_price: symbol_amount_or_placeholder(
            Money::from_column("actual_receive_price", row.actual_receive_price.as_deref()),
            symbol,
        ),
        return_quantity: refunded_quantity.map(format_quantity),
        refund_status: refund_status_label(quantity, refunded_quantity).to_string(),
        goods_discounts: extra.goods_discounts,
        spu_code: row.spu_code,
        sku_code: row.sku_code,
        barcode: row.barcode,
        goods_sale_name: row.goods_sale_name,
        goods_unit_name: row.goods_unit_name,
        picture_url: row.picture_url,
        goods_spec: row.goods_spec,
        goods_package_sku_id: row.goods_package_sku_id,
        goods_specification: row.goods_specification,
    }
}

fn price_statistic(total_origin_price: Option<&str>, rows: &[DetailItemRow]) -> GoodsPriceStatistic {
    let mut quantity = Decimal::ZERO;
    let mut computed = Money::zero();
    let mut front_end: Option<Money> = None;
    let mut received = Money::zero();

    for row in rows {
        let line = row.line_prices();
        let extra = ItemExtra::parse_lenient(row.id, row.extra.as_deref());

        quantity += line.purchase_quantity.unwrap_or_default();

        if let Some(front) = extra.after_discount_price {
            *front_end.get_or_insert_with(Money::zero) += Money::new(front);
        }
        let formula_extra = ItemExtra {
            after_discount_price: None,
            ..extra
        };
        if let Some(subtotal) = line.after_discount_subtotal(&formula_extra) {
            computed += subtotal;
        }

        if let Some(actual) =
            Money::from_column("actual_receive_price", row.actual_receive_price.as_deref())
        {
            received += actual;
        }
    }

    GoodsPriceStatistic {
        total_quantity: format_quantity(quantity),
        total_price: amount_or_placeholder(Money::from_column("total_origin_price", total_origin_price)),
        total_after_discount: front_end.unwrap_or(computed).to_fixed(),
        total_actual_receive: received.to_fixed(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
