//! `ORDER BY` for the order lists.
//!
//! Newest first by default. A requested sort puts rows without the sorted
//! amount last in either direction (for the received amount that includes
//! unpaid orders, which display `-`), and `o.id DESC` always breaks ties so
//! that paging is deterministic.

use sqlx::{QueryBuilder, Sqlite};
use tally_core::types::{OrderSort, SortDirection, SortField};

use crate::query::{received_units, scaled_amount};

const DEFAULT_ORDER: &str = " ORDER BY o.created_at DESC, o.id DESC";

/// Whether the page query must join the `paid` totals subquery.
pub fn needs_paid_totals(sort: Option<&OrderSort>) -> bool {
    matches!(
        sort,
        Some(OrderSort {
            field: SortField::ReceivePrice,
            ..
        })
    )
}

fn sort_expression(field: SortField) -> String {
    match field {
        SortField::ReceivePrice => received_units(),
        SortField::TotalOriginPrice => scaled_amount("o.total_origin_price"),
        SortField::DiscountPrice => scaled_amount("o.discount_price"),
    }
}

/// Appends the `ORDER BY` clause.
pub fn push_order_by(qb: &mut QueryBuilder<'_, Sqlite>, sort: Option<&OrderSort>) {
    let Some(sort) = sort else {
        qb.push(DEFAULT_ORDER);
        return;
    };

    let expression = sort_expression(sort.field);
    let direction = match sort.direction {
        SortDirection::Ascend => "ASC",
        SortDirection::Descend => "DESC",
    };

    qb.push(" ORDER BY ")
        .push(&expression)
        .push(" IS NULL, ")
        .push(&expression)
        .push(" ")
        .push(direction)
        .push(", o.id DESC");
}
