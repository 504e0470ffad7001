//! # invoicer-db: Database Layer for Invoicer
//!
//! Persistence for invoices, their line items, customers and the item
//! catalog. Uses SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Data Flow                               │
//! │                                                                         │
//! │  Caller (create_invoice)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   invoicer-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │ (invoice.rs)  │    │  (embedded)  │   │   │
//! │  │   │               │    │               │    │              │   │   │
//! │  │   │ SqlitePool    │    │ InvoiceRepo   │    │ 001_init.sql │   │   │
//! │  │   │ BillingPolicy │◄───│ CustomerRepo  │    │              │   │   │
//! │  │   │               │    │ CatalogRepo   │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │           ▲                    │                               │   │
//! │  │           │                    ▼                               │   │
//! │  │   ┌───────────────┐    ┌───────────────┐                       │   │
//! │  │   │   config.rs   │    │   mapper.rs   │                       │   │
//! │  │   │ invoicer.toml │    │ rows ⇄ domain │                       │   │
//! │  │   └───────────────┘    └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - `invoicer.toml` loading with environment overrides
//! - [`migrations`] - Embedded database migrations
//! - [`mapper`] - Row records and their conversion to domain types
//! - [`error`] - Database error types
//! - [`repository`] - Invoice, customer and catalog repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use invoicer_db::{Database, InvoicerConfig};
//!
//! let config = InvoicerConfig::load(None)?;
//! let db = Database::new(config.to_db_config()).await?;
//!
//! let invoice = db.invoices().create(&header, &items).await?;
//! let (page, pagination) = db.invoices().list(&InvoiceFilter::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod mapper;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, InvoicerConfig};
pub use error::{DbError, DbResult, ErrorKind};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::customer::CustomerRepository;
pub use repository::invoice::InvoiceRepository;
