//! # Line Item Pricing
//!
//! Item rows carry a free-form JSON `extra` column written by the cashier
//! front end. This module reads the parts the detail screens need and derives
//! the after-discount subtotal of a line.
//!
//! ## `extra` Shape
//! ```text
//! {
//!   "limit_time_special": { "discount_price": "8.00", "discount_num": "2" },
//!   "goodsDiscounts":     [ ...opaque, passed through... ],
//!   "afterDiscountPrice": "23.40"
//! }
//! ```
//! Numbers may arrive as JSON numbers or strings. Any key may be missing.
//!
//! ## After-Discount Subtotal
//! ```text
//! afterDiscountPrice present ─────────────► use it as-is
//!          │ no
//!          ▼
//! special quantity (discount_num) present?
//!    yes: selling × (qty − special_qty) + special_price × special_qty
//!         special_price falls back to shop-cart price, then selling price
//!    no:  (shop-cart price or selling price) × qty
//! ```

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Extra Column
// =============================================================================

/// Limit-time special pricing applied to part of a line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitTimeSpecial {
    /// Special unit price.
    pub discount_price: Option<Decimal>,
    /// Units sold at the special price.
    pub discount_num: Option<Decimal>,
}

/// The parsed `extra` column of an order item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemExtra {
    pub limit_time_special: Option<LimitTimeSpecial>,
    /// Passed through to clients untouched.
    pub goods_discounts: Option<Value>,
    /// Subtotal computed by the front end at checkout time.
    pub after_discount_price: Option<Decimal>,
}

impl ItemExtra {
    /// Parses the raw column. Blank or `null` yields an empty extra.
    ///
    /// ## Errors
    /// `CoreError::MalformedExtra` when the text is not JSON or not an object.
    pub fn parse(item_id: i64, raw: Option<&str>) -> CoreResult<Self> {
        let raw = match raw.map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => raw,
            None => return Ok(ItemExtra::default()),
        };

        let value: Value = serde_json::from_str(raw).map_err(|e| CoreError::MalformedExtra {
            item_id,
            reason: e.to_string(),
        })?;

        match value {
            Value::Null => Ok(ItemExtra::default()),
            Value::Object(map) => Ok(Self::from_map(&map)),
            _ => Err(CoreError::MalformedExtra {
                item_id,
                reason: "expected a JSON object".to_string(),
            }),
        }
    }

    /// Like [`ItemExtra::parse`], but logs and degrades to an empty extra.
    pub fn parse_lenient(item_id: i64, raw: Option<&str>) -> Self {
        match Self::parse(item_id, raw) {
            Ok(extra) => extra,
            Err(err) => {
                tracing::warn!(item_id, error = %err, "Ignoring malformed item extra");
                ItemExtra::default()
            }
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let limit_time_special = map
            .get("limit_time_special")
            .and_then(Value::as_object)
            .map(|special| LimitTimeSpecial {
                discount_price: special.get("discount_price").and_then(json_decimal),
                discount_num: special.get("discount_num").and_then(json_decimal),
            });

        let goods_discounts = map.get("goodsDiscounts").filter(|v| !v.is_null()).cloned();

        let after_discount_price = map.get("afterDiscountPrice").and_then(json_decimal);

        ItemExtra {
            limit_time_special,
            goods_discounts,
            after_discount_price,
        }
    }

    /// Special unit price, if the line had one.
    pub fn special_price(&self) -> Option<Decimal> {
        self.limit_time_special.as_ref()?.discount_price
    }

    /// Units sold at the special price, if recorded.
    pub fn special_quantity(&self) -> Option<Decimal> {
        self.limit_time_special.as_ref()?.discount_num
    }

    /// Special quantity worth showing: hidden when zero or when the whole
    /// line was special-priced.
    pub fn partial_special_quantity(&self, purchased: Option<Decimal>) -> Option<Decimal> {
        let special = self.special_quantity()?;
        if special.is_zero() || Some(special) == purchased {
            return None;
        }
        Some(special)
    }
}

fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Money::parse(s).map(|m| m.amount()),
        _ => None,
    }
}

// =============================================================================
// Line Prices
// =============================================================================

/// The price columns of one order item.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinePrices {
    pub selling_price: Option<Money>,
    /// Price changed at the till, if any.
    pub discount_price_in_shopcar: Option<Money>,
    pub purchase_quantity: Option<Decimal>,
}

impl LinePrices {
    /// Selling price × quantity.
    pub fn original_subtotal(&self) -> Option<Money> {
        Some(self.selling_price? * self.purchase_quantity?)
    }

    /// Subtotal after till price changes and limit-time specials.
    ///
    /// ## Example
    /// ```rust
    /// use std::str::FromStr;
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    /// use tally_core::pricing::{ItemExtra, LinePrices};
    ///
    /// let line = LinePrices {
    ///     selling_price: Money::parse("10"),
    ///     discount_price_in_shopcar: None,
    ///     purchase_quantity: Decimal::from_str("3").ok(),
    /// };
    /// let extra = ItemExtra::parse(1, Some(
    ///     r#"{"limit_time_special":{"discount_price":"8","discount_num":"2"}}"#,
    /// )).unwrap();
    /// // 10 × (3 − 2) + 8 × 2
    /// assert_eq!(line.after_discount_subtotal(&extra).unwrap().to_fixed(), "26.00");
    /// ```
    pub fn after_discount_subtotal(&self, extra: &ItemExtra) -> Option<Money> {
        if let Some(front) = extra.after_discount_price {
            return Some(Money::new(front));
        }

        let quantity = self.purchase_quantity?;
        let unit = self.discount_price_in_shopcar.or(self.selling_price);

        match extra.special_quantity() {
            Some(special_quantity) => {
                let selling = self.selling_price?;
                let special_price = extra.special_price().map(Money::new).or(unit)?;
                Some(selling * (quantity - special_quantity) + special_price * special_quantity)
            }
            None => Some(unit? * quantity),
        }
    }
}

/// Contribution of one item to the order's price-breakdown subtotal.
///
/// Lines without a special quantity count their shop price; special-priced
/// lines count the shop-cart original total instead.
pub fn breakdown_subtotal(
    shop_price: Option<Money>,
    origin_total_in_shopcar: Option<Money>,
    extra: &ItemExtra,
) -> Option<Money> {
    match extra.special_quantity() {
        Some(quantity) if !quantity.is_zero() => origin_total_in_shopcar,
        _ => shop_price,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn line(selling: &str, shopcar: Option<&str>, qty: &str) -> LinePrices {
        LinePrices {
            selling_price: Money::parse(selling),
            discount_price_in_shopcar: shopcar.and_then(Money::parse),
            purchase_quantity: Some(dec(qty)),
        }
    }

    #[test]
    fn test_parse_accepts_numbers_and_strings() {
        let extra = ItemExtra::parse(
            1,
            Some(r#"{"limit_time_special":{"discount_price":8.5,"discount_num":"2"},"goodsDiscounts":[{"name":"x"}],"afterDiscountPrice":"23.4"}"#),
        )
        .unwrap();
        assert_eq!(extra.special_price(), Some(dec("8.5")));
        assert_eq!(extra.special_quantity(), Some(dec("2")));
        assert!(extra.goods_discounts.is_some());
        assert_eq!(extra.after_discount_price, Some(dec("23.4")));
    }

    #[test]
    fn test_parse_blank_and_null() {
        assert_eq!(ItemExtra::parse(1, None).unwrap(), ItemExtra::default());
        assert_eq!(ItemExtra::parse(1, Some("  ")).unwrap(), ItemExtra::default());
        assert_eq!(ItemExtra::parse(1, Some("null")).unwrap(), ItemExtra::default());
    }

    #[test]
    fn test_malformed_extra_degrades() {
        assert!(matches!(
            ItemExtra::parse(5, Some("{not json")),
            Err(CoreError::MalformedExtra { item_id: 5, .. })
        ));
        assert!(ItemExtra::parse(5, Some("[1,2]")).is_err());
        assert_eq!(ItemExtra::parse_lenient(5, Some("{not json")), ItemExtra::default());
    }

    #[test]
    fn test_after_discount_without_special() {
        let extra = ItemExtra::default();
        assert_eq!(
            line("10", Some("9"), "2").after_discount_subtotal(&extra).map(|m| m.to_fixed()),
            Some("18.00".to_string())
        );
        assert_eq!(
            line("10", None, "2").after_discount_subtotal(&extra).map(|m| m.to_fixed()),
            Some("20.00".to_string())
        );
    }

    #[test]
    fn test_after_discount_special_price_falls_back_to_shopcar() {
        let extra = ItemExtra::parse(1, Some(r#"{"limit_time_special":{"discount_num":"1"}}"#)).unwrap();
        // 10 × (3 − 1) + 9 × 1
        assert_eq!(
            line("10", Some("9"), "3").after_discount_subtotal(&extra).map(|m| m.to_fixed()),
            Some("29.00".to_string())
        );
    }

    #[test]
    fn test_front_end_subtotal_wins() {
        let extra = ItemExtra::parse(
            1,
            Some(r#"{"limit_time_special":{"discount_price":"8","discount_num":"2"},"afterDiscountPrice":"21.5"}"#),
        )
        .unwrap();
        assert_eq!(
            line("10", None, "3").after_discount_subtotal(&extra).map(|m| m.to_fixed()),
            Some("21.50".to_string())
        );
    }

    #[test]
    fn test_partial_special_quantity() {
        let extra = ItemExtra::parse(1, Some(r#"{"limit_time_special":{"discount_num":"2"}}"#)).unwrap();
        assert_eq!(extra.partial_special_quantity(Some(dec("3"))), Some(dec("2")));
        assert_eq!(extra.partial_special_quantity(Some(dec("2.0"))), None);

        let zero = ItemExtra::parse(1, Some(r#"{"limit_time_special":{"discount_num":0}}"#)).unwrap();
        assert_eq!(zero.partial_special_quantity(Some(dec("3"))), None);
    }

    #[test]
    fn test_breakdown_subtotal() {
        let plain = ItemExtra::default();
        let special = ItemExtra::parse(1, Some(r#"{"limit_time_special":{"discount_num":"1"}}"#)).unwrap();
        let shop = Money::parse("18");
        let origin = Money::parse("20");
        assert_eq!(breakdown_subtotal(shop, origin, &plain), shop);
        assert_eq!(breakdown_subtotal(shop, origin, &special), origin);
    }
}
