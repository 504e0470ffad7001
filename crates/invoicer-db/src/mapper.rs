//! # Invoice Aggregate Mapper
//!
//! Row shapes returned by SQLite and their conversion to and from the
//! domain types in `invoicer-core`.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices LEFT JOIN customers        invoice_items JOIN items           │
//! │          │                                    │                         │
//! │          ▼                                    ▼                         │
//! │   InvoiceRecord (flat)              InvoiceItemRecord (flat)            │
//! │   customer_* columns may be NULL    item_name / item_type joined        │
//! │          │                                    │                         │
//! │          └──────────────┬─────────────────────┘                         │
//! │                         ▼                                               │
//! │                  assemble_invoices()                                    │
//! │                         │                                               │
//! │                         ▼                                               │
//! │        Invoice { customer: Option<Customer>, items: Vec<_> }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use invoicer_core::{CatalogItem, Customer, Invoice, InvoiceItem, InvoiceStatus};
use std::collections::HashMap;

// =============================================================================
// Select Lists
// =============================================================================

/// Columns of [`InvoiceRecord`]; expects `invoices inv LEFT JOIN customers c`.
pub(crate) const INVOICE_COLUMNS: &str = r#"
    inv.id,
    inv.invoice_number,
    inv.issue_date,
    inv.due_date,
    inv.subject,
    inv.customer_id,
    inv.total_items,
    inv.subtotal_cents,
    inv.tax_cents,
    inv.total_cents,
    inv.status,
    inv.created_at,
    inv.updated_at,
    c.id         AS customer_ref,
    c.name       AS customer_name,
    c.email      AS customer_email,
    c.phone      AS customer_phone,
    c.address    AS customer_address,
    c.created_at AS customer_created_at,
    c.updated_at AS customer_updated_at
"#;

/// Columns of [`InvoiceItemRecord`]; expects `invoice_items ii LEFT JOIN items it`.
pub(crate) const INVOICE_ITEM_COLUMNS: &str = r#"
    ii.id,
    ii.invoice_id,
    ii.item_id,
    it.name      AS item_name,
    it.item_type AS item_type,
    ii.quantity,
    ii.unit_price_cents,
    ii.total_price_cents,
    ii.created_at
"#;

// =============================================================================
// Records
// =============================================================================

/// One invoice row joined with its (optional) customer.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InvoiceRecord {
    pub id: String,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subject: String,
    pub customer_id: Option<String>,
    pub total_items: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_ref: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_created_at: Option<DateTime<Utc>>,
    pub customer_updated_at: Option<DateTime<Utc>>,
}

/// One line item joined with its catalog item.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InvoiceItemRecord {
    pub id: String,
    pub invoice_id: String,
    pub item_id: String,
    pub item_name: Option<String>,
    pub item_type: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CatalogItemRecord {
    pub id: String,
    pub name: String,
    pub item_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Row → Domain
// =============================================================================

impl InvoiceRecord {
    /// The joined customer, or `None` when the reference did not resolve.
    pub fn customer(&self) -> Option<Customer> {
        Some(Customer {
            id: self.customer_ref.clone()?,
            name: self.customer_name.clone()?,
            email: self.customer_email.clone(),
            phone: self.customer_phone.clone(),
            address: self.customer_address.clone(),
            created_at: self.customer_created_at?,
            updated_at: self.customer_updated_at?,
        })
    }

    pub fn into_invoice(self, items: Vec<InvoiceItem>) -> Invoice {
        let customer = self.customer();
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            subject: self.subject,
            customer_id: self.customer_id,
            total_items: self.total_items,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            customer,
            items,
        }
    }
}

impl From<InvoiceItemRecord> for InvoiceItem {
    fn from(r: InvoiceItemRecord) -> Self {
        InvoiceItem {
            id: r.id,
            invoice_id: r.invoice_id,
            item_id: r.item_id,
            item_name: r.item_name,
            item_type: r.item_type,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
            total_price_cents: r.total_price_cents,
            created_at: r.created_at,
        }
    }
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Customer {
            id: r.id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            address: r.address,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<CatalogItemRecord> for CatalogItem {
    fn from(r: CatalogItemRecord) -> Self {
        CatalogItem {
            id: r.id,
            name: r.name,
            item_type: r.item_type,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Attaches each item to its invoice, preserving the order of `invoices`
/// and the order of items within an invoice.
pub fn assemble_invoices(
    invoices: Vec<InvoiceRecord>,
    items: Vec<InvoiceItemRecord>,
) -> Vec<Invoice> {
    let mut by_invoice: HashMap<String, Vec<InvoiceItem>> = HashMap::new();
    for item in items {
        by_invoice
            .entry(item.invoice_id.clone())
            .or_default()
            .push(item.into());
    }

    invoices
        .into_iter()
        .map(|record| {
            let items = by_invoice.remove(&record.id).unwrap_or_default();
            record.into_invoice(items)
        })
        .collect()
}

// =============================================================================
// Domain → Row
// =============================================================================

impl From<&Invoice> for InvoiceRecord {
    fn from(inv: &Invoice) -> Self {
        let customer = inv.customer.as_ref();
        InvoiceRecord {
            id: inv.id.clone(),
            invoice_number: inv.invoice_number.clone(),
            issue_date: inv.issue_date,
            due_date: inv.due_date,
            subject: inv.subject.clone(),
            customer_id: inv.customer_id.clone(),
            total_items: inv.total_items,
            subtotal_cents: inv.subtotal_cents,
            tax_cents: inv.tax_cents,
            total_cents: inv.total_cents,
            status: inv.status,
            created_at: inv.created_at,
            updated_at: inv.updated_at,
            customer_ref: customer.map(|c| c.id.clone()),
            customer_name: customer.map(|c| c.name.clone()),
            customer_email: customer.and_then(|c| c.email.clone()),
            customer_phone: customer.and_then(|c| c.phone.clone()),
            customer_address: customer.and_then(|c| c.address.clone()),
            customer_created_at: customer.map(|c| c.created_at),
            customer_updated_at: customer.map(|c| c.updated_at),
        }
    }
}

impl From<&InvoiceItem> for InvoiceItemRecord {
    fn from(item: &InvoiceItem) -> Self {
        InvoiceItemRecord {
            id: item.id.clone(),
            invoice_id: item.invoice_id.clone(),
            item_id: item.item_id.clone(),
            item_name: item.item_name.clone(),
            item_type: item.item_type.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            total_price_cents: item.total_price_cents,
            created_at: item.created_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_invoice(with_customer: bool) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: "inv-1".to_string(),
            invoice_number: "001".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            subject: "Logo work".to_string(),
            customer_id: Some("cust-1".to_string()),
            total_items: 1,
            subtotal_cents: 10_000,
            tax_cents: 1_000,
            total_cents: 11_000,
            status: InvoiceStatus::Unpaid,
            created_at: now,
            updated_at: now,
            customer: with_customer.then(|| Customer {
                id: "cust-1".to_string(),
                name: "PT Arunika Digital".to_string(),
                email: Some("finance@arunika.co.id".to_string()),
                phone: None,
                address: Some("Jakarta".to_string()),
                created_at: now,
                updated_at: now,
            }),
            items: vec![InvoiceItem {
                id: "line-1".to_string(),
                invoice_id: "inv-1".to_string(),
                item_id: "item-1".to_string(),
                item_name: Some("Logo Design".to_string()),
                item_type: Some("Service".to_string()),
                quantity: 1,
                unit_price_cents: 10_000,
                total_price_cents: 10_000,
                created_at: now,
            }],
        }
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let invoice = sample_invoice(true);
        let record = InvoiceRecord::from(&invoice);
        let items: Vec<InvoiceItemRecord> = invoice.items.iter().map(Into::into).collect();

        let rebuilt = assemble_invoices(vec![record], items);
        assert_eq!(rebuilt, vec![invoice]);
    }

    #[test]
    fn test_unresolved_customer_is_omitted() {
        let mut record = InvoiceRecord::from(&sample_invoice(false));
        record.customer_id = Some("deleted".to_string());

        let invoice = record.into_invoice(Vec::new());
        assert!(invoice.customer.is_none());
        assert_eq!(invoice.customer_id.as_deref(), Some("deleted"));
    }

    #[test]
    fn test_assemble_groups_items_by_invoice() {
        let a = sample_invoice(false);
        let mut b = sample_invoice(false);
        b.id = "inv-2".to_string();
        b.items.clear();

        let items: Vec<InvoiceItemRecord> = a.items.iter().map(Into::into).collect();
        let out = assemble_invoices(vec![(&b).into(), (&a).into()], items);

        assert_eq!(out[0].id, "inv-2");
        assert!(out[0].items.is_empty());
        assert_eq!(out[1].items.len(), 1);
    }
}
