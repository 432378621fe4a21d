//! `LIMIT` / `OFFSET` binding.

use sqlx::{QueryBuilder, Sqlite};
use tally_core::PageRequest;

/// Appends ` LIMIT ? OFFSET ?` for a 1-based page.
pub fn push_limit_offset(qb: &mut QueryBuilder<'_, Sqlite>, page: PageRequest) {
    qb.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
}
