//! # Filter Conditions
//!
//! Translates an [`OrderFilter`] into a conjunction of [`Predicate`]s.
//!
//! ## Field → Predicate
//! ```text
//! ┌────────────────────────────┬────────────────────────────────────────────┐
//! │ (always)                   │ o.disabled = 0 AND o.company_id = ?        │
//! │ config.list_order_source   │ o.order_source = ?                         │
//! │ keyword                    │ (order_number OR member_name OR            │
//! │                            │  member_phone OR EXISTS item name/barcode) │
//! │ order_number               │ o.order_number LIKE ?                      │
//! │ product_name               │ EXISTS item name/barcode LIKE ?            │
//! │ member_name_or_phone       │ (member_name OR member_phone)              │
//! │ operator_name_or_phone     │ (operator_name OR operator_phone OR        │
//! │                            │  shopping_guide_name)                      │
//! │ store_ids / channel_ids    │ IN (...)                                   │
//! │ states (or allow-list)     │ o.state IN (...)                           │
//! │ payment_method_ids         │ EXISTS successful payment IN (...)         │
//! │ created_at / business_day  │ >= start, <= end                           │
//! │ amount_filters             │ scaled(amount) <op> ?                      │
//! └────────────────────────────┴────────────────────────────────────────────┘
//! ```
//!
//! Absent, blank or empty fields add nothing. Every fuzzy predicate binds an
//! escaped `%text%` pattern together with `ESCAPE '\'`.

use sqlx::{QueryBuilder, Sqlite};
use tally_core::display::TIMESTAMP_FORMAT;
use tally_core::search::fuzzy_pattern;
use tally_core::{AmountType, ComparisonOperator, OrderFilter};

use crate::config::QueryConfig;
use crate::query::scaled_amount;

/// Suffix that pairs every `LIKE` with the fuzzy escape character.
pub const ESCAPE_CLAUSE: &str = " ESCAPE '\\'";

const DAY_FORMAT: &str = "%Y-%m-%d";

const KEYWORD_COLUMNS: &[&str] = &["o.order_number", "o.member_name", "o.member_phone"];
const ORDER_NUMBER_COLUMNS: &[&str] = &["o.order_number"];
const MEMBER_COLUMNS: &[&str] = &["o.member_name", "o.member_phone"];
const OPERATOR_COLUMNS: &[&str] = &["o.operator_name", "o.operator_phone", "o.shopping_guide_name"];

// =============================================================================
// Predicate
// =============================================================================

/// One `AND`ed term of an order list's `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    NotDisabled,
    CompanyIs(i64),
    SourceIs(i64),
    /// `column IN (values)`; never built with an empty list.
    InList {
        column: &'static str,
        values: Vec<i64>,
    },
    /// Fuzzy match on any of `columns`, and on item name/barcode when
    /// `items` is set.
    TextMatch {
        columns: &'static [&'static str],
        items: bool,
        pattern: String,
    },
    /// A successful payment through one of these methods exists.
    PaidWith(Vec<i64>),
    /// `column <op> value` for timestamp and day columns stored as text.
    Bound {
        column: &'static str,
        op: ComparisonOperator,
        value: String,
    },
    /// `scaled(amount) <op> units`.
    Amount {
        amount_type: AmountType,
        op: ComparisonOperator,
        units: i64,
    },
}

impl Predicate {
    /// Appends this predicate's SQL and binds.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Predicate::NotDisabled => {
                qb.push("o.disabled = 0");
            }

            Predicate::CompanyIs(company_id) => {
                qb.push("o.company_id = ").push_bind(*company_id);
            }

            Predicate::SourceIs(source) => {
                qb.push("o.order_source = ").push_bind(*source);
            }

            Predicate::InList { column, values } => {
                push_in_list(qb, column, values);
            }

            Predicate::TextMatch {
                columns,
                items,
                pattern,
            } => {
                qb.push("(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(*column)
                        .push(" LIKE ")
                        .push_bind(pattern.clone())
                        .push(ESCAPE_CLAUSE);
                }
                if *items {
                    if !columns.is_empty() {
                        qb.push(" OR ");
                    }
                    qb.push(
                        "EXISTS (SELECT 1 FROM sale_order_item i \
                         WHERE i.order_id = o.record_id AND i.disabled = 0 \
                         AND (i.goods_sale_name LIKE ",
                    )
                    .push_bind(pattern.clone())
                    .push(ESCAPE_CLAUSE)
                    .push(" OR i.barcode LIKE ")
                    .push_bind(pattern.clone())
                    .push(ESCAPE_CLAUSE)
                    .push("))");
                }
                qb.push(")");
            }

            Predicate::PaidWith(methods) => {
                qb.push(
                    "EXISTS (SELECT 1 FROM sale_order_payment p \
                     WHERE p.order_id = o.record_id AND p.is_pay_success = 1 AND ",
                );
                push_in_list(qb, "p.payment_method_id", methods);
                qb.push(")");
            }

            Predicate::Bound { column, op, value } => {
                qb.push(*column)
                    .push(" ")
                    .push(op.as_sql())
                    .push(" ")
                    .push_bind(value.clone());
            }

            Predicate::Amount {
                amount_type,
                op,
                units,
            } => {
                qb.push(amount_expression(*amount_type))
                    .push(" ")
                    .push(op.as_sql())
                    .push(" ")
                    .push_bind(*units);
            }
        }
    }
}

fn push_in_list(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[i64]) {
    qb.push(column).push(" IN (");
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(*value);
    }
    separated.push_unseparated(")");
}

/// SQL for the amount an [`AmountType`] targets, in scaled units.
fn amount_expression(amount_type: AmountType) -> String {
    match amount_type {
        AmountType::TotalPrice => scaled_amount("o.total_origin_price"),
        AmountType::DiscountPrice => scaled_amount("o.discount_price"),
        AmountType::ReceivePrice => format!(
            "(SELECT SUM({}) FROM sale_order_payment p \
             WHERE p.order_id = o.record_id AND p.is_pay_success = 1)",
            scaled_amount("p.payment_amount")
        ),
    }
}

// =============================================================================
// Order Conditions
// =============================================================================

/// The full `AND` chain for one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConditions {
    predicates: Vec<Predicate>,
}

impl OrderConditions {
    /// Builds the predicate list. Callers validate the filter first, so an
    /// amount whose scaled value overflows has already been rejected; one
    /// that slips through is skipped with a warning.
    pub fn from_filter(filter: &OrderFilter, config: &QueryConfig) -> Self {
        let mut predicates = vec![Predicate::NotDisabled, Predicate::CompanyIs(filter.company_id)];

        if let Some(source) = config.list_order_source {
            predicates.push(Predicate::SourceIs(source));
        }

        let mut text = |columns: &'static [&'static str], items: bool, input: Option<&str>| {
            if let Some(pattern) = input.and_then(fuzzy_pattern) {
                predicates.push(Predicate::TextMatch {
                    columns,
                    items,
                    pattern,
                });
            }
        };
        text(KEYWORD_COLUMNS, true, filter.keyword.as_deref());
        text(ORDER_NUMBER_COLUMNS, false, filter.order_number.as_deref());
        text(&[], true, filter.product_name.as_deref());
        text(MEMBER_COLUMNS, false, filter.member_name_or_phone.as_deref());
        text(OPERATOR_COLUMNS, false, filter.operator_name_or_phone.as_deref());

        if !filter.store_ids.is_empty() {
            predicates.push(Predicate::InList {
                column: "o.store_id",
                values: filter.store_ids.clone(),
            });
        }

        if !filter.channel_ids.is_empty() {
            predicates.push(Predicate::InList {
                column: "o.channel_id",
                values: filter.channel_ids.clone(),
            });
        }

        let states = if filter.states.is_empty() {
            config.active_states.clone()
        } else {
            filter.states.clone()
        };
        predicates.push(Predicate::InList {
            column: "o.state",
            values: states,
        });

        if !filter.payment_method_ids.is_empty() {
            predicates.push(Predicate::PaidWith(filter.payment_method_ids.clone()));
        }

        if let Some(start) = filter.created_at.start {
            predicates.push(Predicate::Bound {
                column: "o.created_at",
                op: ComparisonOperator::Gte,
                value: start.format(TIMESTAMP_FORMAT).to_string(),
            });
        }
        if let Some(end) = filter.created_at.end {
            predicates.push(Predicate::Bound {
                column: "o.created_at",
                op: ComparisonOperator::Lte,
                value: end.format(TIMESTAMP_FORMAT).to_string(),
            });
        }

        if let Some(start) = filter.business_day.start {
            predicates.push(Predicate::Bound {
                column: "o.business_day",
                op: ComparisonOperator::Gte,
                value: start.format(DAY_FORMAT).to_string(),
            });
        }
        if let Some(end) = filter.business_day.end {
            predicates.push(Predicate::Bound {
                column: "o.business_day",
                op: ComparisonOperator::Lte,
                value: end.format(DAY_FORMAT).to_string(),
            });
        }

        for amount in &filter.amount_filters {
            match amount.scaled_value() {
                Some(units) => predicates.push(Predicate::Amount {
                    amount_type: amount.amount_type,
                    op: amount.operator,
                    units,
                }),
                None => tracing::warn!(value = %amount.value, "Skipping out-of-range amount filter"),
            }
        }

        OrderConditions { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Appends ` WHERE p1 AND p2 AND ...`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            predicate.push_sql(qb);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
