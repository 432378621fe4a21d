//! # tally-db: Query Layer for Tally
//!
//! Read-only access to the sale-order schema: dynamic list filters,
//! pagination with counts, batched enrichment and the order detail panels.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                                  │
//! │                                                                         │
//! │  Reporting handler (GET /orders?keyword=milk&page=2)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │    query     │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ SaleOrderRepo │    │ predicates   │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderItemRepo │───►│ ORDER BY     │  │   │
//! │  │   │ QueryConfig   │    │ RefundRepo    │    │ LIMIT/OFFSET │  │   │
//! │  │   │               │    │ PaymentRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: sale_order, sale_order_item, _payment, _discount,      │   │
//! │  │          _refund, _refund_item, _refund_payment                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and repository accessors
//! - [`config`] - Reporting defaults ([`QueryConfig`])
//! - [`query`] - Predicate assembly, ordering and pagination
//! - [`repository`] - Repository implementations
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::{OrderFilter, PageRequest};
//! use tally_db::{Database, DbConfig, QueryConfig};
//!
//! let db = Database::new(DbConfig::new("orders.db"), QueryConfig::from_env()?).await?;
//!
//! let page = db
//!     .sale_orders()
//!     .list_orders(&OrderFilter::for_company(7).keyword("milk"), PageRequest::new(1, 20))
//!     .await?;
//! let detail = db.sale_orders().get_order_detail(page.records_list[0].id, 7).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, QueryConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order_item::OrderItemRepository;
pub use repository::order_payment::OrderPaymentRepository;
pub use repository::order_refund::OrderRefundRepository;
pub use repository::sale_order::SaleOrderRepository;
