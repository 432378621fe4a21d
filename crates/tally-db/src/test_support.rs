//! Fixture builders for repository tests.
//!
//! Each fixture is a plain struct with public fields and a constructor that
//! fills sensible defaults, so tests override only what they care about:
//!
//! ```rust,ignore
//! let db = test_db().await;
//! let order = OrderFixture { state: 1, ..OrderFixture::new(7, "A1001") };
//! let id = order.insert(db.pool()).await;
//! PaymentFixture::paid(&order, "Cash", "50.00").insert(db.pool()).await;
//! ```

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::QueryConfig;
use crate::pool::{Database, DbConfig};

/// A migrated in-memory database with default query configuration.
pub(crate) async fn test_db() -> Database {
    test_db_with(QueryConfig::default()).await
}

pub(crate) async fn test_db_with(config: QueryConfig) -> Database {
    Database::new(DbConfig::in_memory(), config)
        .await
        .expect("in-memory database")
}

fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct OrderFixture {
    pub record_id: String,
    pub company_id: i64,
    pub order_number: String,
    pub store_id: Option<i64>,
    pub store_name: Option<String>,
    pub channel_id: Option<i64>,
    pub channel_name: Option<String>,
    pub member_name: Option<String>,
    pub member_phone: Option<String>,
    pub operator_name: Option<String>,
    pub operator_phone: Option<String>,
    pub shopping_guide_name: Option<String>,
    pub state: i64,
    pub order_source: i64,
    pub business_day: Option<String>,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub total_origin_price: Option<String>,
    pub discount_price: Option<String>,
    pub origin_price: Option<String>,
    pub change_money: Option<String>,
    pub remark: Option<String>,
    pub disabled: bool,
}

impl OrderFixture {
    /// A completed store-cashier order created on 2024-03-01.
    pub fn new(company_id: i64, order_number: &str) -> Self {
        OrderFixture {
            record_id: new_record_id(),
            company_id,
            order_number: order_number.to_string(),
            store_id: Some(1),
            store_name: Some("Main St".to_string()),
            channel_id: Some(1),
            channel_name: Some("POS".to_string()),
            member_name: None,
            member_phone: None,
            operator_name: Some("Bob".to_string()),
            operator_phone: None,
            shopping_guide_name: None,
            state: 5,
            order_source: 1,
            business_day: Some("2024-03-01".to_string()),
            created_at: "2024-03-01 10:00:00".to_string(),
            paid_at: Some("2024-03-01 10:01:00".to_string()),
            total_origin_price: Some("100.00".to_string()),
            discount_price: Some("0.00".to_string()),
            origin_price: Some("100.00".to_string()),
            change_money: Some("0.00".to_string()),
            remark: None,
            disabled: false,
        }
    }

    /// Inserts the order and returns its numeric id.
    pub async fn insert(&self, pool: &SqlitePool) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO sale_order (
                record_id, company_id, order_number,
                store_id, store_name, channel_id, channel_name,
                member_name, member_phone, operator_name, operator_phone,
                shopping_guide_name, state, order_source,
                business_day, created_at, paid_at,
                total_origin_price, discount_price, origin_price, change_money,
                remark, disabled
            ) VALUES (
                ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?
            )
            RETURNING id
            "#,
        )
        .bind(&self.record_id)
        .bind(self.company_id)
        .bind(&self.order_number)
        .bind(self.store_id)
        .bind(&self.store_name)
        .bind(self.channel_id)
        .bind(&self.channel_name)
        .bind(&self.member_name)
        .bind(&self.member_phone)
        .bind(&self.operator_name)
        .bind(&self.operator_phone)
        .bind(&self.shopping_guide_name)
        .bind(self.state)
        .bind(self.order_source)
        .bind(&self.business_day)
        .bind(&self.created_at)
        .bind(&self.paid_at)
        .bind(&self.total_origin_price)
        .bind(&self.discount_price)
        .bind(&self.origin_price)
        .bind(&self.change_money)
        .bind(&self.remark)
        .bind(self.disabled)
        .fetch_one(pool)
        .await
        .expect("insert sale_order")
    }
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct ItemFixture {
    pub record_id: String,
    pub order_id: String,
    pub order_number: String,
    pub company_id: i64,
    pub goods_sale_name: Option<String>,
    pub barcode: Option<String>,
    pub spu_code: Option<String>,
    pub purchase_quantity: Option<String>,
    pub selling_price: Option<String>,
    pub shop_price: Option<String>,
    pub origin_total_price_in_shopcaritem: Option<String>,
    pub discount_price_in_shopcar: Option<String>,
    pub actual_receive_price: Option<String>,
    pub goods_unit_name: Option<String>,
    pub extra: Option<String>,
    pub disabled: bool,
}

impl ItemFixture {
    /// One unit of a 10.00 item on the given order.
    pub fn new(order: &OrderFixture, name: &str) -> Self {
        ItemFixture {
            record_id: new_record_id(),
            order_id: order.record_id.clone(),
            order_number: order.order_number.clone(),
            company_id: order.company_id,
            goods_sale_name: Some(name.to_string()),
            barcode: None,
            spu_code: None,
            purchase_quantity: Some("1".to_string()),
            selling_price: Some("10.00".to_string()),
            shop_price: Some("10.00".to_string()),
            origin_total_price_in_shopcaritem: None,
            discount_price_in_shopcar: None,
            actual_receive_price: Some("10.00".to_string()),
            goods_unit_name: Some("pc".to_string()),
            extra: None,
            disabled: false,
        }
    }

    pub async fn insert(&self, pool: &SqlitePool) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO sale_order_item (
                record_id, order_id, order_number, company_id,
                goods_sale_name, barcode, spu_code, purchase_quantity,
                selling_price, shop_price, origin_total_price_in_shopcaritem,
                discount_price_in_shopcar, actual_receive_price,
                goods_unit_name, extra, disabled
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&self.record_id)
        .bind(&self.order_id)
        .bind(&self.order_number)
        .bind(self.company_id)
        .bind(&self.goods_sale_name)
        .bind(&self.barcode)
        .bind(&self.spu_code)
        .bind(&self.purchase_quantity)
        .bind(&self.selling_price)
        .bind(&self.shop_price)
        .bind(&self.origin_total_price_in_shopcaritem)
        .bind(&self.discount_price_in_shopcar)
        .bind(&self.actual_receive_price)
        .bind(&self.goods_unit_name)
        .bind(&self.extra)
        .bind(self.disabled)
        .fetch_one(pool)
        .await
        .expect("insert sale_order_item")
    }
}

// =============================================================================
// Payments and Discounts
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct PaymentFixture {
    pub order_id: String,
    pub company_id: i64,
    pub payment_method_id: Option<i64>,
    pub payment_method_name: Option<String>,
    pub payment_amount: Option<String>,
    pub is_pay_success: Option<bool>,
    pub sort: i64,
}

impl PaymentFixture {
    /// A successful payment; method id 1 unless overridden.
    pub fn paid(order: &OrderFixture, method: &str, amount: &str) -> Self {
        PaymentFixture {
            order_id: order.record_id.clone(),
            company_id: order.company_id,
            payment_method_id: Some(1),
            payment_method_name: Some(method.to_string()),
            payment_amount: Some(amount.to_string()),
            is_pay_success: Some(true),
            sort: 0,
        }
    }

    pub async fn insert(&self, pool: &SqlitePool) {
        sqlx::query(
            r#"
            INSERT INTO sale_order_payment (
                order_id, company_id, payment_method_id, payment_method_name,
                payment_amount, is_pay_success, sort
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.order_id)
        .bind(self.company_id)
        .bind(self.payment_method_id)
        .bind(&self.payment_method_name)
        .bind(&self.payment_amount)
        .bind(self.is_pay_success)
        .bind(self.sort)
        .execute(pool)
        .await
        .expect("insert sale_order_payment");
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DiscountFixture {
    pub order_id: String,
    pub company_id: i64,
    pub discount_source: Option<i64>,
    pub discount_name: Option<String>,
    pub discount_amount: Option<String>,
    pub disabled: bool,
}

impl DiscountFixture {
    pub fn new(order: &OrderFixture, source: i64, name: &str, amount: &str) -> Self {
        DiscountFixture {
            order_id: order.record_id.clone(),
            company_id: order.company_id,
            discount_source: Some(source),
            discount_name: Some(name.to_string()),
            discount_amount: Some(amount.to_string()),
            disabled: false,
        }
    }

    pub async fn insert(&self, pool: &SqlitePool) {
        sqlx::query(
            r#"
            INSERT INTO sale_order_discount (
                order_id, company_id, discount_source, discount_name,
                discount_amount, disabled
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.order_id)
        .bind(self.company_id)
        .bind(self.discount_source)
        .bind(&self.discount_name)
        .bind(&self.discount_amount)
        .bind(self.disabled)
        .execute(pool)
        .await
        .expect("insert sale_order_discount");
    }
}

// =============================================================================
// Refunds
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct RefundFixture {
    pub record_id: String,
    pub order_id: String,
    pub company_id: i64,
    pub refund_number: Option<String>,
    pub refund_type_alias: Option<String>,
    pub refund_reason: Option<String>,
    pub operator_name: Option<String>,
    pub operator_phone: Option<String>,
    pub created_at: String,
}

impl RefundFixture {
    pub fn new(order: &OrderFixture, refund_number: &str, created_at: &str) -> Self {
        RefundFixture {
            record_id: new_record_id(),
            order_id: order.record_id.clone(),
            company_id: order.company_id,
            refund_number: Some(refund_number.to_string()),
            refund_type_alias: Some("Refund only".to_string()),
            refund_reason: None,
            operator_name: Some("Bob".to_string()),
            operator_phone: None,
            created_at: created_at.to_string(),
        }
    }

    pub async fn insert(&self, pool: &SqlitePool) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO sale_order_refund (
                record_id, order_id, company_id, refund_number,
                refund_type_alias, refund_reason, operator_name,
                operator_phone, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&self.record_id)
        .bind(&self.order_id)
        .bind(self.company_id)
        .bind(&self.refund_number)
        .bind(&self.refund_type_alias)
        .bind(&self.refund_reason)
        .bind(&self.operator_name)
        .bind(&self.operator_phone)
        .bind(&self.created_at)
        .fetch_one(pool)
        .await
        .expect("insert sale_order_refund")
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RefundItemFixture {
    pub order_refund_id: String,
    pub order_item_id: String,
    pub refund_quantity: Option<String>,
    pub refund_price: Option<String>,
    pub is_refund_success: Option<bool>,
}

impl RefundItemFixture {
    /// A successful refund of `quantity` units of `item`.
    pub fn new(refund: &RefundFixture, item: &ItemFixture, quantity: &str, price: &str) -> Self {
        RefundItemFixture {
            order_refund_id: refund.record_id.clone(),
            order_item_id: item.record_id.clone(),
            refund_quantity: Some(quantity.to_string()),
            refund_price: Some(price.to_string()),
            is_refund_success: Some(true),
        }
    }

    pub async fn insert(&self, pool: &SqlitePool) {
        sqlx::query(
            r#"
            INSERT INTO sale_order_refund_item (
                order_refund_id, order_item_id, refund_quantity,
                refund_price, is_refund_success
            ) VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.order_refund_id)
        .bind(&self.order_item_id)
        .bind(&self.refund_quantity)
        .bind(&self.refund_price)
        .bind(self.is_refund_success)
        .execute(pool)
        .await
        .expect("insert sale_order_refund_item");
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RefundPaymentFixture {
    pub order_refund_id: String,
    pub company_id: i64,
    pub refund_payment_method_id: Option<i64>,
    pub refund_payment_name: Option<String>,
    pub refund_payment_amount: Option<String>,
    pub is_refund_success: Option<bool>,
    pub is_pre_refund_success: Option<bool>,
    pub refund_success_time: Option<String>,
    pub sort: i64,
}

impl RefundPaymentFixture {
    /// A successful refund payment through method id 1.
    pub fn new(refund: &RefundFixture, name: &str, amount: &str) -> Self {
        RefundPaymentFixture {
            order_refund_id: refund.record_id.clone(),
            company_id: refund.company_id,
            refund_payment_method_id: Some(1),
            refund_payment_name: Some(name.to_string()),
            refund_payment_amount: Some(amount.to_string()),
            is_refund_success: Some(true),
            is_pre_refund_success: None,
            refund_success_time: None,
            sort: 0,
        }
    }

    pub async fn insert(&self, pool: &SqlitePool) {
        sqlx::query(
            r#"
            INSERT INTO sale_order_refund_payment (
                order_refund_id, company_id, refund_payment_method_id,
                refund_payment_name, refund_payment_amount, is_refund_success,
                is_pre_refund_success, refund_success_time, sort
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.order_refund_id)
        .bind(self.company_id)
        .bind(self.refund_payment_method_id)
        .bind(&self.refund_payment_name)
        .bind(&self.refund_payment_amount)
        .bind(self.is_refund_success)
        .bind(self.is_pre_refund_success)
        .bind(&self.refund_success_time)
        .bind(self.sort)
        .execute(pool)
        .await
        .expect("insert sale_order_refund_payment");
    }
}
