//! # invoicer-core: Pure Business Logic for Invoicer
//!
//! This crate contains the billing rules of Invoicer as pure functions with
//! zero I/O dependencies. The database crate calls into it on every write.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Callers (HTTP handlers, CLI, seed)             │   │
//! │  │        list invoices ──► create invoice ──► update invoice      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ invoicer-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │  │  types  │ │  money  │ │reconcile │ │ sequence │ │paginate │ │   │
//! │  │  │ Invoice │ │  Money  │ │  Plan    │ │  "001"   │ │  Page   │ │   │
//! │  │  │ Filter  │ │ Totals  │ │  diff    │ │  "002"   │ │  math   │ │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └──────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  invoicer-db (Database Layer)                   │   │
//! │  │         SQLite queries, transactions, locking, migrations       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Invoice, InvoiceItem, Customer, InvoiceFilter, ...)
//! - [`money`] - Money type with integer arithmetic, and invoice totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`pagination`] - Page normalization and pagination metadata
//! - [`sequence`] - Invoice number parsing and formatting
//! - [`reconcile`] - Line-item diff planning for invoice updates
//!
//! ## Example Usage
//!
//! ```rust
//! use invoicer_core::money::{InvoiceTotals, Money};
//! use invoicer_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(25_000); // 250.00
//! let totals = InvoiceTotals::from_subtotal(subtotal, TaxRate::from_bps(1000)).unwrap();
//!
//! assert_eq!(totals.tax.cents(), 2_500);
//! assert_eq!(totals.total.cents(), 27_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pagination;
pub mod reconcile;
pub mod sequence;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{InvoiceTotals, Money};
pub use pagination::{PageRequest, Pagination};
pub use reconcile::{plan_reconciliation, ReconcilePlan};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when the caller does not supply a positive one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typos like 1000000 instead of 100 before they reach an invoice.
pub const MAX_LINE_QUANTITY: i64 = 999_999;

/// Maximum unit price of a line item, in cents (10 billion major units).
///
/// Together with [`MAX_LINE_QUANTITY`] this keeps every line total inside
/// an `i64`.
pub const MAX_UNIT_PRICE_CENTS: i64 = 1_000_000_000_000;

/// Default tax rate in basis points (10%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;
