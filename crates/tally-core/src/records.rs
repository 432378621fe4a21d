//! # Display Records
//!
//! The shapes returned to the reporting screens. Every amount is already a
//! formatted string and every code already a label: callers serialize these
//! straight to JSON.
//!
//! ## Which Operation Returns What
//! ```text
//! ┌──────────────────────────────────┬──────────────────────────────────────┐
//! │ list_orders                      │ OrderPage<OrderListRecord>           │
//! │ list_orders_with_summary         │ OrderSummaryPage                     │
//! │ get_order_detail                 │ Option<OrderDetail>                  │
//! │ get_order_detail_items           │ Vec<OrderDetailItem>                 │
//! │ get_goods_price_statistic        │ Option<GoodsPriceStatistic>          │
//! │ list_order_refunds               │ Vec<OrderRefundRecord>               │
//! │ latest_aggregated_refund         │ Option<AggregatedRefundInfo>         │
//! │ list_payments / anomalies        │ Vec<PaymentRecord>                   │
//! │ list_discounts                   │ Vec<DiscountLine>                    │
//! │ get_price_breakdown              │ Option<OrderPriceBreakdown>          │
//! │ list_order_states / methods      │ Vec<OptionItem>                      │
//! └──────────────────────────────────┴──────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Lists
// =============================================================================

/// One page of a list plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPage<T> {
    pub records_list: Vec<T>,
    pub all_count: i64,
}

impl<T> OrderPage<T> {
    pub fn empty(all_count: i64) -> Self {
        OrderPage {
            records_list: Vec::new(),
            all_count,
        }
    }
}

/// A line item attached to a list row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItemRecord {
    pub id: i64,
    pub order_number: String,
    pub goods_id: Option<i64>,
    pub goods_sale_name: Option<String>,
    pub barcode: Option<String>,
    pub goods_custom_code: Option<String>,
    pub purchase_quantity: Option<String>,
    pub selling_price: Option<String>,
    pub vip_price: Option<String>,
    pub discount_price_in_shopcar: Option<String>,
    pub actual_receive_price: Option<String>,
    pub retail_discount_amount: Option<String>,
    pub member_discount_amount: Option<String>,
    pub discount_amount_all: Option<String>,
    pub costs: Option<String>,
    pub goods_unit_name: Option<String>,
    pub picture_url: Option<String>,
    pub category_name: Option<String>,
    pub goods_spec: Option<i64>,
    pub goods_package_sku_id: Option<i64>,
    pub goods_specification: Option<String>,
}

/// One row of the order list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderListRecord {
    pub id: i64,
    pub record_id: String,
    pub order_number: String,
    pub store_name: Option<String>,
    pub channel_name: Option<String>,
    pub store_channel_name: String,
    pub member_name_phone: String,
    pub operator_name_phone: String,
    pub shopping_guide_name: Option<String>,
    pub create_at: String,
    pub state: i64,
    pub state_name: String,
    /// `"12.30"` or `-`.
    pub total_origin_price: String,
    pub discount_price: String,
    /// Successful payments; `-` before payment.
    pub receive_price: String,
    pub pay_channel: Option<String>,
    pub total_purchase_quantity: String,
    pub goods_info: Vec<OrderItemRecord>,
}

/// Totals across every order matching a PC list filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AmountSummary {
    pub total_price: String,
    pub total_discount_price: String,
    pub total_receive_price: String,
    pub total_count: i64,
}

/// A PC list page with its summary totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSummaryPage {
    pub records_list: Vec<OrderListRecord>,
    pub all_count: i64,
    pub amount_data: AmountSummary,
}

// =============================================================================
// Detail
// =============================================================================

/// A payment or refund-payment line: method name and formatted amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChannelAmount {
    pub method_name: String,
    pub amount: String,
}

/// Header of the order detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub id: i64,
    pub record_id: String,
    pub order_number: String,
    pub remark: Option<String>,
    /// `--` when the order has no channel.
    pub channel_name: String,
    pub store_name: Option<String>,
    pub store_channel_name: String,
    pub state: i64,
    pub state_name: String,
    pub order_source_name: String,
    pub member_name_phone: String,
    pub operator_name_phone: String,
    pub shopping_guide_name: Option<String>,
    pub create_at: String,
    pub paid_at: String,
    pub total_origin_price: String,
    pub discount_price: String,
    pub origin_price: String,
    pub receive_price: String,
    pub change_money: String,
    /// Successful payment lines in payment order.
    pub payments: Vec<ChannelAmount>,
    /// `"¥12.00(Cash); ¥8.00(Card)"`, or `-` without payments.
    pub pay_channel: String,
    pub actually_refund_amount_all: String,
    pub aggregated_refund_result_code: u8,
}

/// A line item on the order detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetailItem {
    pub id: i64,
    pub spu_code: Option<String>,
    pub sku_code: Option<String>,
    pub barcode: Option<String>,
    pub goods_sale_name: Option<String>,
    pub goods_unit_name: Option<String>,
    pub picture_url: Option<String>,
    pub goods_spec: Option<i64>,
    pub goods_package_sku_id: Option<i64>,
    pub goods_specification: Option<String>,
    pub selling_price: String,
    pub discount_price_in_shopcar: Option<String>,
    /// Whether the till changed this line's price.
    pub change_price_mark: bool,
    pub limit_time_special_price: String,
    pub limit_time_special_quantity: Option<String>,
    #[ts(type = "unknown")]
    pub goods_discounts: Option<serde_json::Value>,
    pub purchase_quantity: Option<String>,
    pub total_price_item: String,
    pub after_discount_subtotal: String,
    pub actual_receive_price: String,
    pub return_quantity: Option<String>,
    pub refund_status: String,
}

/// Totals over an order's items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GoodsPriceStatistic {
    pub total_quantity: String,
    pub total_price: String,
    pub total_after_discount: String,
    pub total_actual_receive: String,
}

/// The price breakdown panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPriceBreakdown {
    pub state_name: String,
    pub subtotal: String,
    pub change_money: String,
    pub actually_refund_amount_all: String,
    pub payment_amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountLine {
    pub name: String,
    pub amount: String,
}

/// A payment row as shown in the pay-info and anomaly panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRecord {
    pub payment_method_id: Option<i64>,
    pub payment_method_name: String,
    pub payment_amount: String,
    pub is_pay_success: Option<bool>,
    pub state_name: String,
}

// =============================================================================
// Refunds
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundItemRecord {
    pub id: i64,
    pub order_item_id: String,
    pub goods_sale_name: Option<String>,
    pub spu_code: Option<String>,
    pub barcode: Option<String>,
    pub goods_unit_name: Option<String>,
    pub picture_url: Option<String>,
    pub selling_price: String,
    pub purchase_quantity: Option<String>,
    pub actual_receive_price: String,
    pub refund_quantity: Option<String>,
    pub refund_price: String,
}

/// A refund sheet of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRefundRecord {
    pub id: i64,
    pub record_id: String,
    pub refund_number: Option<String>,
    pub refund_type_alias: Option<String>,
    pub refund_reason: Option<String>,
    pub create_at: String,
    pub operator_name_phone: String,
    /// Sum of successful refund payments, `0.00` when none.
    pub actually_refund_amount: String,
    pub refund_success_time: String,
    pub refund_pay_channel: Vec<ChannelAmount>,
    pub aggregated_refund_result_code: u8,
    pub items: Vec<RefundItemRecord>,
}

/// The most recent aggregated refund payment of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AggregatedRefundInfo {
    pub order_refund_id: String,
    pub refund_payment_amount: String,
    pub is_refund_success: Option<bool>,
    pub is_pre_refund_success: Option<bool>,
    pub aggregated_refund_result_code: u8,
}

// =============================================================================
// Options
// =============================================================================

/// A dropdown option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OptionItem {
    pub id: i64,
    pub value: i64,
    pub label: String,
    pub name: String,
}

impl OptionItem {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        let label = label.into();
        OptionItem {
            id,
            value: id,
            name: label.clone(),
            label,
        }
    }
}
