//! # Repository Module
//!
//! Database repository implementations for Invoicer.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller (HTTP handler, CLI, seed binary)                                │
//! │       │                                                                 │
//! │       │  db.invoices().create(&header, &items)                          │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                      │
//! │  ├── list(&self, filter)                                                │
//! │  ├── get_by_id(&self, id)                                               │
//! │  ├── create(&self, header, items)  ──► sequence::next_invoice_number    │
//! │  └── update(&self, id, header, items)                                   │
//! │       │                                                                 │
//! │       │  SQL inside one transaction per write                           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoice list, load, create, update
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer directory
//! - [`CatalogRepository`](catalog::CatalogRepository) - Billable items and services
//! - [`sequence`] - Invoice number locking (used by the invoice repository)

pub mod catalog;
pub mod customer;
pub mod invoice;
pub mod sequence;
