//! # Domain Types
//!
//! Core domain types used throughout Invoicer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │◄──│     Invoice     │──►│   InvoiceItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  invoice_number │   │  item_id (FK)   │──┐    │
//! │  │  email          │   │  status         │   │  quantity       │  │    │
//! │  └─────────────────┘   │  total_cents    │   │  unit_price     │  │    │
//! │                        └─────────────────┘   └─────────────────┘  │    │
//! │                                                                    │    │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐  │    │
//! │  │    TaxRate      │   │  InvoiceStatus  │   │   CatalogItem   │◄─┘    │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Unpaid         │   │  name           │       │
//! │  │  1000 = 10%     │   │  Paid           │   │  item_type      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every invoice has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `invoice_number`: "001", "002", ... - human-readable, assigned once at creation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{InvoiceTotals, Money};
use crate::sequence::MalformedNumberPolicy;
use crate::DEFAULT_TAX_RATE_BPS;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 1000 bps = 10%.
/// Keeps tax math in integers end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Billing Policy
// =============================================================================

/// System-wide billing settings, built once from configuration and handed
/// to the invoice repository. Create and update both read the tax rate from
/// here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillingPolicy {
    pub tax_rate: TaxRate,
    pub malformed_numbers: MalformedNumberPolicy,
}

impl BillingPolicy {
    pub fn new(tax_rate: TaxRate) -> Self {
        BillingPolicy {
            tax_rate,
            ..Default::default()
        }
    }

    pub fn with_malformed_numbers(mut self, policy: MalformedNumberPolicy) -> Self {
        self.malformed_numbers = policy;
        self
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Payment state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Unpaid
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["paid".to_string(), "unpaid".to_string()],
            }),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A billed party. Invoices reference customers by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A billable item or service. Line items reference these by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Free-form classification, e.g. "Service" or "Hardware".
    pub item_type: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice aggregate: header, resolved customer and line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display number, "001", "002", ... Unique and never reassigned.
    pub invoice_number: String,

    #[ts(as = "String")]
    pub issue_date: NaiveDate,

    #[ts(as = "String")]
    pub due_date: NaiveDate,

    pub subject: String,

    /// Becomes `None` if the customer row is deleted.
    pub customer_id: Option<String>,

    /// Number of distinct line items.
    pub total_items: i64,

    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub status: InvoiceStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Resolved customer; omitted when the reference does not resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,

    pub items: Vec<InvoiceItem>,
}

impl Invoice {
    /// Returns the stored amounts as [`InvoiceTotals`].
    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals {
            subtotal: Money::from_cents(self.subtotal_cents),
            tax: Money::from_cents(self.tax_cents),
            total: Money::from_cents(self.total_cents),
        }
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line on an invoice. At most one line per catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    /// Catalog item reference.
    pub item_id: String,
    /// Catalog name, joined at read time.
    pub item_name: Option<String>,
    /// Catalog type, joined at read time.
    pub item_type: Option<String>,
    pub quantity: i64,
    /// Unit price at time of entry (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Write Inputs
// =============================================================================

/// Header fields supplied on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceHeader {
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub subject: String,
    pub customer_id: String,
    #[serde(default)]
    pub status: InvoiceStatus,
}

/// A desired line: which catalog item, how many, at what price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemInput {
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl LineItemInput {
    pub fn new(item_id: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        LineItemInput {
            item_id: item_id.into(),
            quantity,
            unit_price_cents,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Invoice Filter
// =============================================================================

/// Sparse filter for listing invoices. Every field is optional; present
/// fields are ANDed. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct InvoiceFilter {
    /// Substring of the invoice number.
    pub invoice_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub issue_date: Option<NaiveDate>,
    /// Substring of the subject.
    pub subject: Option<String>,
    /// Exact line-item count.
    pub total_items: Option<i64>,
    /// Substring of the customer's name.
    pub customer: Option<String>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    /// 1-indexed page; non-positive or absent means 1.
    pub page: Option<i64>,
    /// Non-positive or absent means the default page size.
    pub page_size: Option<i64>,
}

impl InvoiceFilter {
    /// Invoice-number substring, `None` when absent or blank.
    pub fn invoice_number_term(&self) -> Option<&str> {
        non_blank(&self.invoice_number)
    }

    pub fn subject_term(&self) -> Option<&str> {
        non_blank(&self.subject)
    }

    pub fn customer_term(&self) -> Option<&str> {
        non_blank(&self.customer)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_default_is_ten_percent() {
        let rate = TaxRate::default();
        assert_eq!(rate.bps(), 1000);
        assert!((rate.percentage() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_invoice_status_default() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_invoice_status_parse() {
        assert_eq!("paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert_eq!(" Unpaid ".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Unpaid);
        assert!("void".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_invoice_status_serde() {
        let json = serde_json::to_string(&InvoiceStatus::Paid).unwrap();
        assert_eq!(json, "\"paid\"");
    }

    #[test]
    fn test_filter_blank_strings_are_absent() {
        let filter = InvoiceFilter {
            invoice_number: Some("".to_string()),
            subject: Some("   ".to_string()),
            customer: Some("Arunika".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.invoice_number_term(), None);
        assert_eq!(filter.subject_term(), None);
        assert_eq!(filter.customer_term(), Some("Arunika"));
    }

    #[test]
    fn test_filter_deserializes_sparse_json() {
        let filter: InvoiceFilter =
            serde_json::from_str(r#"{"status":"paid","page":2}"#).unwrap();
        assert_eq!(filter.status, Some(InvoiceStatus::Paid));
        assert_eq!(filter.page, Some(2));
        assert_eq!(filter.page_size, None);
    }

    #[test]
    fn test_billing_policy_builder() {
        let policy = BillingPolicy::new(TaxRate::from_bps(1100))
            .with_malformed_numbers(MalformedNumberPolicy::Reject);
        assert_eq!(policy.tax_rate.bps(), 1100);
        assert_eq!(policy.malformed_numbers, MalformedNumberPolicy::Reject);
    }
}
