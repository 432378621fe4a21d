//! # tally-core: Pure Rules for Sale-Order Reporting
//!
//! Everything the reporting layer decides without touching a database:
//! amounts, labels, filter inputs, escaping and display formatting.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Reporting web layer (not in this repo)             │   │
//! │  │      order list ──► order detail ──► refunds ──► options        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ OrderFilter / PageRequest              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (query layer)                       │   │
//! │  │      predicate assembly, pagination, repositories               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ raw rows                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │  types  │ │ filter  │ │ display │ │ records │  │   │
//! │  │   │ Decimal │ │ states  │ │ ranges  │ │ labels  │ │  DTOs   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal money, rounding and formatting
//! - [`types`] - Order states, sources, operators, amount filters, sorting
//! - [`filter`] - List filter and page inputs
//! - [`search`] - Escaped `LIKE` patterns
//! - [`pricing`] - Item `extra` parsing and line subtotals
//! - [`display`] - Label and placeholder rules
//! - [`records`] - Response records
//! - [`validation`] - Request checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::display::received_amount;
//! use tally_core::types::OrderState;
//!
//! let paid: Money = ["12.345", "7.655"].iter().filter_map(|a| Money::parse(a)).sum();
//! assert_eq!(received_amount(OrderState::Completed.code(), Some(paid)), "20.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod display;
pub mod error;
pub mod filter;
pub mod money;
pub mod pricing;
pub mod records;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{DateRange, OrderFilter, PageRequest};
pub use money::Money;
pub use records::*;
pub use types::*;
