//! # Query Building
//!
//! Programmatic SQL assembly for the order lists. Everything here writes into
//! a [`sqlx::QueryBuilder`]; user values only ever enter through
//! `push_bind`, never through string formatting.
//!
//! ## One Filter, Three Statements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderFilter + QueryConfig                                              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  OrderConditions::from_filter  ──► Vec<Predicate> (AND chain)           │
//! │        │                                                                │
//! │        ├──► page     SELECT o.id ... WHERE … ORDER BY … LIMIT/OFFSET    │
//! │        ├──► count    SELECT COUNT(*) ... WHERE …                        │
//! │        └──► summary  SELECT SUM(…) ... WHERE …                          │
//! │                                                                         │
//! │  The same predicate list feeds every statement, so the page, the total  │
//! │  count and the summary can never disagree about which orders match.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Amount Normalization
//! Amount columns are decimal TEXT. Before comparing or summing, both sides
//! become integers of ten-thousandths with the same rounding rule: the column
//! through [`scaled_amount`] (string surgery, no `REAL`), the bound value in
//! Rust with exact decimal arithmetic.

pub mod conditions;
pub mod ordering;
pub mod pagination;

pub use conditions::{OrderConditions, Predicate};
pub use ordering::push_order_by;
pub use pagination::push_limit_offset;

use sqlx::{QueryBuilder, Sqlite};
use tally_core::money::COMPARE_SCALE;
use tally_core::types::OrderState;

/// SQL expression turning a decimal TEXT column into scaled integer units.
///
/// The text is split at the decimal point and re-joined as digits, so no
/// binary float is involved. The fifth fractional digit rounds half away
/// from zero, matching [`Money::scaled_units`](tally_core::Money::scaled_units).
/// `NULL` stays `NULL`.
pub fn scaled_amount(column: &str) -> String {
    let scale = COMPARE_SCALE as usize;
    let pad = "0".repeat(scale);
    let text = format!("TRIM({})", column);
    let dot = format!("INSTR({}, '.')", text);
    format!(
        "(CAST(CASE WHEN {dot} = 0 THEN {text} || '{pad}' \
         ELSE SUBSTR({text}, 1, {dot} - 1) || SUBSTR(SUBSTR({text}, {dot} + 1) || '{pad}', 1, {scale}) \
         END AS INTEGER) \
         + CASE WHEN {dot} > 0 AND SUBSTR({text}, {dot} + {next}, 1) >= '5' \
         THEN (CASE WHEN {text} LIKE '-%' THEN -1 ELSE 1 END) ELSE 0 END)",
        dot = dot,
        text = text,
        pad = pad,
        scale = scale,
        next = scale + 1,
    )
}

/// Joins `paid`, the successful payment total of each order of one company
/// in scaled units, on `paid.order_id = o.record_id`.
pub fn push_paid_totals_join(qb: &mut QueryBuilder<'_, Sqlite>, company_id: i64) {
    qb.push(" LEFT JOIN (SELECT p.order_id, SUM(")
        .push(scaled_amount("p.payment_amount"))
        .push(") AS paid_units FROM sale_order_payment p WHERE p.is_pay_success = 1 AND p.company_id = ")
        .push_bind(company_id)
        .push(" GROUP BY p.order_id) paid ON paid.order_id = o.record_id");
}

/// Received amount of `o` in scaled units: `paid.paid_units`, or `NULL` for
/// states that show no received amount.
pub fn received_units() -> String {
    let hidden: Vec<String> = OrderState::ALL
        .into_iter()
        .filter(|state| state.hides_received_amount())
        .map(|state| state.code().to_string())
        .collect();
    format!(
        "(CASE WHEN o.state IN ({}) THEN NULL ELSE paid.paid_units END)",
        hidden.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_amount_avoids_floats() {
        let sql = scaled_amount("o.discount_price");
        assert!(sql.contains("TRIM(o.discount_price)"));
        assert!(!sql.contains("REAL"));
    }

    async fn scaled(raw: Option<&str>) -> Option<i64> {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let sql = format!("SELECT {} FROM (SELECT ? AS amount)", scaled_amount("amount"));
        sqlx::query_scalar::<_, Option<i64>>(&sql)
            .bind(raw)
            .fetch_one(&pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_scaled_amount_matches_bound_units() {
        for raw in [
            "2.00025", "0.00025", "12.34565", "0.00035", "-2.00025", "12.345", "7", ".5",
            " 3.1 ", "-0.00004", "19.99999",
        ] {
            let expected = tally_core::Money::parse(raw).and_then(|m| m.scaled_units());
            assert_eq!(scaled(Some(raw)).await, expected, "amount {raw:?}");
        }
        assert_eq!(scaled(None).await, None);
    }

    #[test]
    fn test_paid_totals_are_company_scoped() {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT o.id FROM sale_order o");
        push_paid_totals_join(&mut qb, 7);
        let sql = qb.sql();
        assert!(sql.contains("p.is_pay_success = 1 AND p.company_id = ?"));
        assert!(sql.ends_with("GROUP BY p.order_id) paid ON paid.order_id = o.record_id"));
    }

    #[test]
    fn test_received_units_hide_unpaid_states() {
        assert_eq!(
            received_units(),
            "(CASE WHEN o.state IN (0, 1) THEN NULL ELSE paid.paid_units END)"
        );
    }
}
