//! # Validation Module
//!
//! Input validation for invoice writes and queries.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request decoding (serde)                                     │
//! │  ├── Types: dates parse as dates, status is paid/unpaid                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any store access)                        │
//! │  ├── Required references, positive quantities and prices               │
//! │  └── Length limits on free text and filter terms                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity > 0), CHECK (total = subtotal + tax)              │
//! │  ├── UNIQUE (invoice_number), UNIQUE (invoice_id, item_id)             │
//! │  └── Foreign keys to customers and items                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use invoicer_core::validation::{validate_line_items, validate_subject};
//! use invoicer_core::types::LineItemInput;
//!
//! validate_subject("Website redesign").unwrap();
//! validate_line_items(&[LineItemInput::new("item-1", 2, 10_000)]).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{InvoiceFilter, InvoiceHeader, LineItemInput};
use crate::{MAX_LINE_QUANTITY, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum subject length.
pub const MAX_SUBJECT_LEN: usize = 255;

/// Maximum length of a substring filter term.
pub const MAX_FILTER_TERM_LEN: usize = 100;

// =============================================================================
// Invoice Header
// =============================================================================

/// Validates the header of a create or update.
///
/// ## Rules
/// - `customer_id` must not be blank
/// - `subject` at most [`MAX_SUBJECT_LEN`] characters (may be empty)
///
/// Dates and status are already typed, so deserialization enforced them.
pub fn validate_header(header: &InvoiceHeader) -> ValidationResult<()> {
    validate_reference("customer_id", &header.customer_id)?;
    validate_subject(&header.subject)
}

pub fn validate_subject(subject: &str) -> ValidationResult<()> {
    if subject.chars().count() > MAX_SUBJECT_LEN {
        return Err(ValidationError::TooLong {
            field: "subject".to_string(),
            max: MAX_SUBJECT_LEN,
        });
    }
    Ok(())
}

fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Line Items
// =============================================================================

/// Validates a single desired line. `index` is used in the field name so
/// the caller can tell which line failed.
///
/// ## Rules
/// - `item_id` must not be blank
/// - quantity in `1..=MAX_LINE_QUANTITY`
/// - unit price in `1..=MAX_UNIT_PRICE_CENTS`
pub fn validate_line_item(index: usize, line: &LineItemInput) -> ValidationResult<()> {
    validate_reference(&format!("items[{}].item_id", index), &line.item_id)?;
    validate_quantity(index, line.quantity)?;
    validate_unit_price(index, line.unit_price_cents)
}

/// Validates every desired line. An empty list is valid.
pub fn validate_line_items(lines: &[LineItemInput]) -> ValidationResult<()> {
    lines
        .iter()
        .enumerate()
        .try_for_each(|(index, line)| validate_line_item(index, line))
}

fn validate_unit_price(index: usize, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: format!("items[{}].unit_price", index),
        });
    }

    if cents > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: format!("items[{}].unit_price", index),
            min: 1,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

fn validate_quantity(index: usize, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: format!("items[{}].quantity", index),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: format!("items[{}].quantity", index),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Query Validators
// =============================================================================

/// Validates a list filter.
///
/// ## Rules
/// - Substring terms at most [`MAX_FILTER_TERM_LEN`] characters
/// - `total_items` not negative
///
/// Page parameters are never rejected; they are normalized instead.
pub fn validate_filter(filter: &InvoiceFilter) -> ValidationResult<()> {
    for (field, term) in [
        ("invoice_number", filter.invoice_number_term()),
        ("subject", filter.subject_term()),
        ("customer", filter.customer_term()),
    ] {
        if let Some(term) = term {
            validate_search_term(field, term)?;
        }
    }

    if let Some(count) = filter.total_items {
        if count < 0 {
            return Err(ValidationError::OutOfRange {
                field: "total_items".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

/// Validates a free-text search term and returns it trimmed.
pub fn validate_search_term(field: &str, term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.chars().count() > MAX_FILTER_TERM_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_FILTER_TERM_LEN,
        });
    }

    Ok(term.to_string())
}

// =============================================================================
// Directory and Catalog Validators
// =============================================================================

/// Validates a display name (customer or catalog item).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
