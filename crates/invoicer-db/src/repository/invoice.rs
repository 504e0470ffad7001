//! # Invoice Repository
//!
//! Listing, loading, creating and updating invoices.
//!
//! ## Write Transactions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(header, items)                update(id, header, items)         │
//! │  ─────────────────────                ─────────────────────────         │
//! │  validate (no store access)           validate (no store access)        │
//! │  BEGIN                                BEGIN                             │
//! │  lock sequence row   ◄─ write lock    touch invoice row  ◄─ write lock  │
//! │  next number                          0 rows? → NotFound                │
//! │  check customer + items exist         check customer + items exist      │
//! │  INSERT header                        load current items                │
//! │  INSERT every line                    plan_reconciliation()             │
//! │  COMMIT                               UPDATE / INSERT / DELETE lines    │
//! │                                       UPDATE header + totals            │
//! │                                       COMMIT                            │
//! │                                                                         │
//! │  Any error drops the transaction → ROLLBACK, nothing persists.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pool is never used while a transaction is open: an in-memory
//! database has a single connection, which the transaction holds.

use chrono::{DateTime, Utc};
use invoicer_core::reconcile::{LineInsert, ReconcilePlan};
use invoicer_core::validation::{validate_filter, validate_header, validate_line_items};
use invoicer_core::{
    plan_reconciliation, BillingPolicy, Invoice, InvoiceFilter, InvoiceHeader, InvoiceItem,
    LineItemInput, PageRequest, Pagination,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::mapper::{
    assemble_invoices, InvoiceItemRecord, InvoiceRecord, INVOICE_COLUMNS, INVOICE_ITEM_COLUMNS,
};
use crate::repository::sequence;

// =============================================================================
// Query Fragments
// =============================================================================

/// Shared FROM/WHERE of the count and page queries. An absent filter
/// binds NULL and its predicate collapses to true.
const FILTERED_INVOICES: &str = r#"
    FROM invoices inv
    LEFT JOIN customers c ON c.id = inv.customer_id
    WHERE (?1 IS NULL OR inv.invoice_number LIKE '%' || ?1 || '%')
      AND (?2 IS NULL OR DATE(inv.issue_date) = DATE(?2))
      AND (?3 IS NULL OR inv.subject LIKE '%' || ?3 || '%')
      AND (?4 IS NULL OR inv.total_items = ?4)
      AND (?5 IS NULL OR c.name LIKE '%' || ?5 || '%')
      AND (?6 IS NULL OR DATE(inv.due_date) = DATE(?6))
      AND (?7 IS NULL OR inv.status = ?7)
"#;

/// Binds the seven filter parameters of [`FILTERED_INVOICES`], in order.
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {
        $query
            .bind($filter.invoice_number_term())
            .bind($filter.issue_date)
            .bind($filter.subject_term())
            .bind($filter.total_items)
            .bind($filter.customer_term())
            .bind($filter.due_date)
            .bind($filter.status.map(|s| s.as_str()))
    };
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.invoices();
///
/// let invoice = repo.create(&header, &[LineItemInput::new(item_id, 2, 10_000)]).await?;
/// assert_eq!(invoice.invoice_number, "001");
///
/// let (page, pagination) = repo.list(&InvoiceFilter::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
    billing: BillingPolicy,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool, billing: BillingPolicy) -> Self {
        InvoiceRepository { pool, billing }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists invoices matching `filter`, newest first, one page at a time.
    ///
    /// ## How It Works
    /// 1. Normalizes page parameters (page ≥ 1, 1 ≤ size ≤ 100, default 10)
    /// 2. Counts all matches (before LIMIT/OFFSET)
    /// 3. Fetches the page ordered by `created_at DESC, id DESC`
    /// 4. Fetches the page's line items in one query and attaches them
    ///
    /// Count and page run in one read transaction, so they see the same
    /// snapshot. No matches is an empty page, not an error.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<(Vec<Invoice>, Pagination)> {
        validate_filter(filter)?;
        let page = PageRequest::new(filter.page, filter.page_size);

        debug!(?filter, page = page.page(), page_size = page.page_size(), "Listing invoices");

        let mut tx = self.pool.begin().await?;

        let count_sql = format!("SELECT COUNT(*) {}", FILTERED_INVOICES);
        let total: i64 = bind_filter!(sqlx::query_scalar(&count_sql), filter)
            .fetch_one(&mut *tx)
            .await?;

        let page_sql = format!(
            "SELECT {} {} ORDER BY inv.created_at DESC, inv.id DESC LIMIT ?8 OFFSET ?9",
            INVOICE_COLUMNS, FILTERED_INVOICES
        );
        let records: Vec<InvoiceRecord> =
            bind_filter!(sqlx::query_as::<_, InvoiceRecord>(&page_sql), filter)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *tx)
                .await?;

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let items = fetch_item_records(&mut tx, &ids).await?;

        tx.commit().await?;

        let invoices = assemble_invoices(records, items);
        let pagination = Pagination::compute(total, page);

        debug!(
            total = pagination.total_items,
            returned = invoices.len(),
            "Listed invoices"
        );
        Ok((invoices, pagination))
    }

    /// Gets a fully hydrated invoice by ID.
    ///
    /// ## Errors
    /// `NotFound` when no invoice has this ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Invoice> {
        let mut conn = self.pool.acquire().await?;
        load_invoice(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates an invoice with a freshly assigned number.
    ///
    /// ## What This Does
    /// 1. Validates header and lines (duplicates collapse, last one wins)
    /// 2. Computes totals with the configured tax rate
    /// 3. In one transaction: assigns the number, inserts header and lines
    ///
    /// ## Errors
    /// - Validation error for bad input (nothing touched)
    /// - `NotFound` naming the missing customer or catalog item
    /// - `Busy` if the number lock could not be taken in time
    pub async fn create(&self, header: &InvoiceHeader, items: &[LineItemInput]) -> DbResult<Invoice> {
        validate_header(header)?;
        validate_line_items(items)?;

        let plan = plan_reconciliation(&[], items, self.billing.tax_rate)?;

        let mut tx = self.pool.begin().await?;

        let invoice_number =
            sequence::next_invoice_number(&mut tx, self.billing.malformed_numbers).await?;

        ensure_customer_exists(&mut tx, &header.customer_id).await?;
        ensure_items_exist(&mut tx, &plan).await?;

        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            issue_date: header.issue_date,
            due_date: header.due_date,
            subject: header.subject.trim().to_string(),
            customer_id: Some(header.customer_id.clone()),
            total_items: plan.line_count,
            subtotal_cents: plan.totals.subtotal.cents(),
            tax_cents: plan.totals.tax.cents(),
            total_cents: plan.totals.total.cents(),
            status: header.status,
            created_at: now,
            updated_at: now,
            customer: None,
            items: Vec::new(),
        };

        insert_header(&mut tx, &InvoiceRecord::from(&invoice)).await?;
        for line in &plan.inserts {
            insert_line(&mut tx, &invoice.id, line, now).await?;
        }

        tx.commit().await?;

        info!(
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            lines = plan.line_count,
            total_cents = invoice.total_cents,
            "Invoice created"
        );

        self.get_by_id(&invoice.id).await
    }

    /// Rewrites an invoice's header and reconciles its line items.
    ///
    /// Lines are matched by catalog item: matching lines are updated in
    /// place (skipped when unchanged), new ones inserted, and lines absent
    /// from `items` deleted. Totals are recomputed from the result.
    ///
    /// ## Errors
    /// - Validation error for bad input (nothing touched)
    /// - `NotFound` for a missing invoice, customer or catalog item
    pub async fn update(
        &self,
        id: &str,
        header: &InvoiceHeader,
        items: &[LineItemInput],
    ) -> DbResult<Invoice> {
        validate_header(header)?;
        validate_line_items(items)?;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Write first: takes the lock and proves the invoice exists.
        let touched = sqlx::query("UPDATE invoices SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        ensure_customer_exists(&mut tx, &header.customer_id).await?;

        let current: Vec<InvoiceItem> = fetch_item_records(&mut tx, &[id.to_string()])
            .await?
            .into_iter()
            .map(InvoiceItem::from)
            .collect();

        let plan = plan_reconciliation(&current, items, self.billing.tax_rate)?;
        ensure_items_exist(&mut tx, &plan).await?;

        debug!(
            id = %id,
            updates = plan.updates.len(),
            inserts = plan.inserts.len(),
            deletes = plan.deletes.len(),
            unchanged = plan.unchanged.len(),
            "Applying reconciliation plan"
        );

        apply_plan(&mut tx, id, &plan, now).await?;

        sqlx::query(
            r#"
            UPDATE invoices SET
                issue_date = ?2,
                due_date = ?3,
                subject = ?4,
                customer_id = ?5,
                status = ?6,
                total_items = ?7,
                subtotal_cents = ?8,
                tax_cents = ?9,
                total_cents = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(header.issue_date)
        .bind(header.due_date)
        .bind(header.subject.trim())
        .bind(&header.customer_id)
        .bind(header.status.as_str())
        .bind(plan.line_count)
        .bind(plan.totals.subtotal.cents())
        .bind(plan.totals.tax.cents())
        .bind(plan.totals.total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = %id,
            lines = plan.line_count,
            total_cents = plan.totals.total.cents(),
            "Invoice updated"
        );

        self.get_by_id(id).await
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn load_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!(
        "SELECT {} FROM invoices inv LEFT JOIN customers c ON c.id = inv.customer_id WHERE inv.id = ?1",
        INVOICE_COLUMNS
    );

    let Some(record) = sqlx::query_as::<_, InvoiceRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let items = fetch_item_records(conn, std::slice::from_ref(&record.id)).await?;
    Ok(assemble_invoices(vec![record], items).pop())
}

/// Fetches the line items of every invoice in `invoice_ids`, in insertion
/// order, with catalog name and type joined.
async fn fetch_item_records(
    conn: &mut SqliteConnection,
    invoice_ids: &[String],
) -> DbResult<Vec<InvoiceItemRecord>> {
    if invoice_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; invoice_ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM invoice_items ii
         LEFT JOIN items it ON it.id = ii.item_id
         WHERE ii.invoice_id IN ({})
         ORDER BY ii.invoice_id, ii.rowid",
        INVOICE_ITEM_COLUMNS, placeholders
    );

    let mut query = sqlx::query_as::<_, InvoiceItemRecord>(&sql);
    for id in invoice_ids {
        query = query.bind(id);
    }

    Ok(query.fetch_all(&mut *conn).await?)
}

async fn ensure_customer_exists(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<()> {
    let found: Option<String> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(DbError::not_found("Customer", customer_id)),
    }
}

/// Checks that every catalog item the plan writes exists. Reports the
/// first missing one in request order.
async fn ensure_items_exist(conn: &mut SqliteConnection, plan: &ReconcilePlan) -> DbResult<()> {
    let wanted: Vec<&str> = plan
        .updates
        .iter()
        .map(|u| u.item_id.as_str())
        .chain(plan.inserts.iter().map(|i| i.item_id.as_str()))
        .collect();

    if wanted.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; wanted.len()].join(", ");
    let sql = format!("SELECT id FROM items WHERE id IN ({})", placeholders);

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for id in &wanted {
        query = query.bind(*id);
    }
    let found: HashSet<String> = query.fetch_all(&mut *conn).await?.into_iter().collect();

    match wanted.into_iter().find(|id| !found.contains(*id)) {
        Some(missing) => Err(DbError::not_found("Item", missing)),
        None => Ok(()),
    }
}

async fn insert_header(conn: &mut SqliteConnection, record: &InvoiceRecord) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, issue_date, due_date, subject, customer_id,
            total_items, subtotal_cents, tax_cents, total_cents, status,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13
        )
        "#,
    )
    .bind(&record.id)
    .bind(&record.invoice_number)
    .bind(record.issue_date)
    .bind(record.due_date)
    .bind(&record.subject)
    .bind(&record.customer_id)
    .bind(record.total_items)
    .bind(record.subtotal_cents)
    .bind(record.tax_cents)
    .bind(record.total_cents)
    .bind(record.status.as_str())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_line(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    line: &LineInsert,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, item_id, quantity, unit_price_cents, total_price_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(invoice_id)
    .bind(&line.item_id)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.total_price_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn apply_plan(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    plan: &ReconcilePlan,
    now: DateTime<Utc>,
) -> DbResult<()> {
    for update in &plan.updates {
        sqlx::query(
            r#"
            UPDATE invoice_items
            SET quantity = ?2, unit_price_cents = ?3, total_price_cents = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&update.line_id)
        .bind(update.quantity)
        .bind(update.unit_price_cents)
        .bind(update.total_price_cents)
        .execute(&mut *conn)
        .await?;
    }

    for insert in &plan.inserts {
        insert_line(conn, invoice_id, insert, now).await?;
    }

    for delete in &plan.deletes {
        sqlx::query("DELETE FROM invoice_items WHERE id = ?1")
            .bind(&delete.line_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use invoicer_core::{CatalogItem, Customer, InvoiceStatus, NewCustomer, TaxRate};

    struct Fixture {
        db: Database,
        customer: Customer,
        items: Vec<CatalogItem>,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .create(&NewCustomer {
                name: "PT Arunika Digital".to_string(),
                email: Some("finance@arunika.co.id".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut items = Vec::new();
        for (name, kind) in [("Logo Design", "Service"), ("Development", "Service"), ("Printer", "Hardware")] {
            items.push(db.catalog().insert(name, kind).await.unwrap());
        }

        Fixture { db, customer, items }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn header(customer_id: &str, subject: &str) -> InvoiceHeader {
        InvoiceHeader {
            issue_date: date(2024, 1, 10),
            due_date: date(2024, 2, 10),
            subject: subject.to_string(),
            customer_id: customer_id.to_string(),
            status: InvoiceStatus::Unpaid,
        }
    }

    fn assert_totals_consistent(invoice: &Invoice, rate: TaxRate) {
        let subtotal: i64 = invoice.items.iter().map(|i| i.total_price_cents).sum();
        assert_eq!(invoice.subtotal_cents, subtotal);
        assert_eq!(
            invoice.tax_cents,
            invoice.totals().subtotal.calculate_tax(rate).unwrap().cents()
        );
        assert_eq!(invoice.total_cents, invoice.subtotal_cents + invoice.tax_cents);
        assert_eq!(invoice.total_items, invoice.items.len() as i64);
    }

    #[tokio::test]
    async fn test_create_end_to_end() {
        let f = fixture().await;
        let lines = vec![
            LineItemInput::new(&f.items[0].id, 2, 100),
            LineItemInput::new(&f.items[1].id, 1, 50),
        ];

        let invoice = f
            .db
            .invoices()
            .create(&header(&f.customer.id, "Website"), &lines)
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "001");
        assert_eq!(invoice.subtotal_cents, 250);
        assert_eq!(invoice.tax_cents, 25);
        assert_eq!(invoice.total_cents, 275);
        assert_eq!(invoice.total_items, 2);
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(invoice.customer.as_ref().unwrap().name, "PT Arunika Digital");
        assert_eq!(invoice.items[0].item_name.as_deref(), Some("Logo Design"));
        assert_eq!(invoice.items[0].item_type.as_deref(), Some("Service"));
        assert_eq!(invoice.items[0].total_price_cents, 200);
        assert_totals_consistent(&invoice, TaxRate::default());
    }

    #[tokio::test]
    async fn test_create_with_zero_items() {
        let f = fixture().await;
        let invoice = f
            .db
            .invoices()
            .create(&header(&f.customer.id, "Retainer"), &[])
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "001");
        assert!(invoice.items.is_empty());
        assert_eq!((invoice.subtotal_cents, invoice.tax_cents, invoice.total_cents), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let f = fixture().await;
        let repo = f.db.invoices();

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let inv = repo.create(&header(&f.customer.id, "x"), &[]).await.unwrap();
            numbers.push(inv.invoice_number);
        }
        assert_eq!(numbers, vec!["001", "002", "003"]);
    }

    #[tokio::test]
    async fn test_create_with_missing_item_rolls_back() {
        let f = fixture().await;
        let repo = f.db.invoices();
        let lines = vec![
            LineItemInput::new(&f.items[0].id, 1, 100),
            LineItemInput::new("no-such-item", 1, 100),
        ];

        let err = repo.create(&header(&f.customer.id, "x"), &lines).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, ref id } if entity == "Item" && id == "no-such-item"));

        let (invoices, pagination) = repo.list(&InvoiceFilter::default()).await.unwrap();
        assert!(invoices.is_empty());
        assert_eq!(pagination.total_items, 0);

        // The number was not consumed.
        let next = repo.create(&header(&f.customer.id, "x"), &[]).await.unwrap();
        assert_eq!(next.invoice_number, "001");
    }

    #[tokio::test]
    async fn test_create_with_missing_customer() {
        let f = fixture().await;
        let err = f
            .db
            .invoices()
            .create(&header("ghost", "x"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_lines() {
        let f = fixture().await;
        let lines = vec![LineItemInput::new(&f.items[0].id, 0, 100)];
        let err = f
            .db
            .invoices()
            .create(&header(&f.customer.id, "x"), &lines)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_oversized_price_is_a_validation_error() {
        let f = fixture().await;
        let repo = f.db.invoices();
        let lines = vec![LineItemInput::new(&f.items[0].id, 1, i64::MAX - 10)];

        let err = repo.create(&header(&f.customer.id, "x"), &lines).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let created = repo.create(&header(&f.customer.id, "x"), &[]).await.unwrap();
        let err = repo
            .update(&created.id, &header(&f.customer.id, "x"), &lines)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_duplicate_lines_collapse_last_wins() {
        let f = fixture().await;
        let lines = vec![
            LineItemInput::new(&f.items[0].id, 1, 100),
            LineItemInput::new(&f.items[0].id, 4, 100),
        ];
        let invoice = f
            .db
            .invoices()
            .create(&header(&f.customer.id, "x"), &lines)
            .await
            .unwrap();

        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].quantity, 4);
        assert_eq!(invoice.subtotal_cents, 400);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let f = fixture().await;
        let err = f.db.invoices().get_by_id("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_reconciles_lines() {
        let f = fixture().await;
        let repo = f.db.invoices();
        let (a, b, c) = (&f.items[0].id, &f.items[1].id, &f.items[2].id);

        let created = repo
            .create(
                &header(&f.customer.id, "x"),
                &[LineItemInput::new(a, 1, 10), LineItemInput::new(b, 2, 5)],
            )
            .await
            .unwrap();
        let line_a = created.items.iter().find(|i| &i.item_id == a).unwrap().id.clone();

        let mut new_header = header(&f.customer.id, "Revised");
        new_header.status = InvoiceStatus::Paid;
        let updated = repo
            .update(
                &created.id,
                &new_header,
                &[LineItemInput::new(a, 3, 10), LineItemInput::new(c, 1, 7)],
            )
            .await
            .unwrap();

        assert_eq!(updated.invoice_number, "001");
        assert_eq!(updated.subject, "Revised");
        assert_eq!(updated.status, InvoiceStatus::Paid);
        assert_eq!(updated.subtotal_cents, 37);
        assert_eq!(updated.total_items, 2);

        let updated_a = updated.items.iter().find(|i| &i.item_id == a).unwrap();
        assert_eq!(updated_a.id, line_a);
        assert_eq!(updated_a.quantity, 3);
        assert!(updated.items.iter().any(|i| &i.item_id == c));
        assert!(!updated.items.iter().any(|i| &i.item_id == b));
        assert_totals_consistent(&updated, TaxRate::default());
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let f = fixture().await;
        let repo = f.db.invoices();
        let lines = vec![
            LineItemInput::new(&f.items[0].id, 3, 10),
            LineItemInput::new(&f.items[2].id, 1, 7),
        ];

        let created = repo.create(&header(&f.customer.id, "x"), &[]).await.unwrap();
        let first = repo.update(&created.id, &header(&f.customer.id, "x"), &lines).await.unwrap();
        let second = repo.update(&created.id, &header(&f.customer.id, "x"), &lines).await.unwrap();

        let ids = |inv: &Invoice| inv.items.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.totals(), second.totals());
        assert_eq!(first.total_items, second.total_items);
    }

    #[tokio::test]
    async fn test_update_with_empty_items_clears_invoice() {
        let f = fixture().await;
        let repo = f.db.invoices();
        let created = repo
            .create(&header(&f.customer.id, "x"), &[LineItemInput::new(&f.items[0].id, 2, 100)])
            .await
            .unwrap();

        let cleared = repo.update(&created.id, &header(&f.customer.id, "x"), &[]).await.unwrap();
        assert!(cleared.items.is_empty());
        assert_eq!(cleared.total_cents, 0);
        assert_eq!(cleared.total_items, 0);
    }

    #[tokio::test]
    async fn test_update_missing_invoice_is_not_found() {
        let f = fixture().await;
        let err = f
            .db
            .invoices()
            .update("missing", &header(&f.customer.id, "x"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Invoice"));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_invoice_untouched() {
        let f = fixture().await;
        let repo = f.db.invoices();
        let created = repo
            .create(&header(&f.customer.id, "x"), &[LineItemInput::new(&f.items[0].id, 2, 100)])
            .await
            .unwrap();

        let err = repo
            .update(
                &created.id,
                &header(&f.customer.id, "changed"),
                &[LineItemInput::new("no-such-item", 1, 1)],
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let after = repo.get_by_id(&created.id).await.unwrap();
        assert_eq!(after.subject, "x");
        assert_eq!(after.items, created.items);
        assert_eq!(after.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_update_uses_configured_tax_rate() {
        let db = Database::new(
            DbConfig::in_memory().billing(BillingPolicy::new(TaxRate::from_bps(1100))),
        )
        .await
        .unwrap();
        let customer = db
            .customers()
            .create(&NewCustomer { name: "CV Kreativa Studio".into(), ..Default::default() })
            .await
            .unwrap();
        let item = db.catalog().insert("Meetings", "Service").await.unwrap();

        let created = db
            .invoices()
            .create(&header(&customer.id, "x"), &[LineItemInput::new(&item.id, 1, 1_000)])
            .await
            .unwrap();
        assert_eq!(created.tax_cents, 110);

        let updated = db
            .invoices()
            .update(&created.id, &header(&customer.id, "x"), &[LineItemInput::new(&item.id, 2, 1_000)])
            .await
            .unwrap();
        assert_eq!(updated.tax_cents, 220);
        assert_totals_consistent(&updated, TaxRate::from_bps(1100));
    }

    #[tokio::test]
    async fn test_deleted_customer_is_omitted() {
        let f = fixture().await;
        let created = f
            .db
            .invoices()
            .create(&header(&f.customer.id, "x"), &[])
            .await
            .unwrap();

        sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(&f.customer.id)
            .execute(f.db.pool())
            .await
            .unwrap();

        let invoice = f.db.invoices().get_by_id(&created.id).await.unwrap();
        assert!(invoice.customer.is_none());
        assert!(invoice.customer_id.is_none());
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Three invoices: "001" Logo (1 line, unpaid, Arunika),
    /// "002" Website (2 lines, paid, Kreativa), "003" Printer (0 lines, unpaid, Arunika).
    async fn listing_fixture() -> Fixture {
        let f = fixture().await;
        let kreativa = f
            .db
            .customers()
            .create(&NewCustomer { name: "CV Kreativa Studio".into(), ..Default::default() })
            .await
            .unwrap();
        let repo = f.db.invoices();

        repo.create(&header(&f.customer.id, "Logo"), &[LineItemInput::new(&f.items[0].id, 1, 100)])
            .await
            .unwrap();

        let mut paid = header(&kreativa.id, "Website");
        paid.status = InvoiceStatus::Paid;
        paid.issue_date = date(2024, 3, 5);
        repo.create(
            &paid,
            &[LineItemInput::new(&f.items[0].id, 1, 100), LineItemInput::new(&f.items[1].id, 1, 100)],
        )
        .await
        .unwrap();

        repo.create(&header(&f.customer.id, "Printer"), &[]).await.unwrap();
        f
    }

    async fn numbers(repo: &InvoiceRepository, filter: InvoiceFilter) -> (Vec<String>, Pagination) {
        let (invoices, pagination) = repo.list(&filter).await.unwrap();
        (invoices.into_iter().map(|i| i.invoice_number).collect(), pagination)
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let f = listing_fixture().await;
        let (found, pagination) = numbers(&f.db.invoices(), InvoiceFilter::default()).await;

        assert_eq!(found, vec!["003", "002", "001"]);
        assert_eq!(pagination.total_items, 3);
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(pagination.page_size, 10);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = listing_fixture().await;
        let repo = f.db.invoices();

        let by_customer = InvoiceFilter { customer: Some("kreativa".into()), ..Default::default() };
        assert_eq!(numbers(&repo, by_customer).await.0, vec!["002"]);

        let by_status = InvoiceFilter { status: Some(InvoiceStatus::Unpaid), ..Default::default() };
        assert_eq!(numbers(&repo, by_status).await.0, vec!["003", "001"]);

        let by_count = InvoiceFilter { total_items: Some(0), ..Default::default() };
        assert_eq!(numbers(&repo, by_count).await.0, vec!["003"]);

        let by_subject = InvoiceFilter { subject: Some("web".into()), ..Default::default() };
        assert_eq!(numbers(&repo, by_subject).await.0, vec!["002"]);

        let by_number = InvoiceFilter { invoice_number: Some("01".into()), ..Default::default() };
        assert_eq!(numbers(&repo, by_number).await.0, vec!["001"]);

        let by_issue = InvoiceFilter { issue_date: Some(date(2024, 3, 5)), ..Default::default() };
        assert_eq!(numbers(&repo, by_issue).await.0, vec!["002"]);

        let by_due = InvoiceFilter { due_date: Some(date(2024, 2, 10)), ..Default::default() };
        assert_eq!(numbers(&repo, by_due).await.1.total_items, 3);

        let combined = InvoiceFilter {
            customer: Some("Arunika".into()),
            total_items: Some(1),
            ..Default::default()
        };
        assert_eq!(numbers(&repo, combined).await.0, vec!["001"]);

        let blank = InvoiceFilter { subject: Some(String::new()), ..Default::default() };
        assert_eq!(numbers(&repo, blank).await.1.total_items, 3);
    }

    #[tokio::test]
    async fn test_list_no_match_is_empty() {
        let f = listing_fixture().await;
        let filter = InvoiceFilter { subject: Some("nothing like this".into()), ..Default::default() };
        let (found, pagination) = numbers(&f.db.invoices(), filter).await;

        assert!(found.is_empty());
        assert_eq!(pagination.total_items, 0);
        assert_eq!(pagination.total_pages, 0);
        assert_eq!(pagination.next_page, None);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let f = listing_fixture().await;
        let repo = f.db.invoices();

        let first = InvoiceFilter { page: Some(1), page_size: Some(2), ..Default::default() };
        let (found, p) = numbers(&repo, first).await;
        assert_eq!(found, vec!["003", "002"]);
        assert_eq!(p.total_items, 3);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.prev_page, None);
        assert_eq!(p.next_page, Some(2));

        let second = InvoiceFilter { page: Some(2), page_size: Some(2), ..Default::default() };
        let (found, p) = numbers(&repo, second).await;
        assert_eq!(found, vec!["001"]);
        assert_eq!(p.prev_page, Some(1));
        assert_eq!(p.next_page, None);

        let normalized = InvoiceFilter { page: Some(0), page_size: Some(-1), ..Default::default() };
        let (_, p) = numbers(&repo, normalized).await;
        assert_eq!((p.current_page, p.page_size), (1, 10));
    }

    #[tokio::test]
    async fn test_list_hydrates_items_and_customer() {
        let f = listing_fixture().await;
        let filter = InvoiceFilter { invoice_number: Some("002".into()), ..Default::default() };
        let (invoices, _) = f.db.invoices().list(&filter).await.unwrap();

        let invoice = &invoices[0];
        assert_eq!(invoice.items.len(), 2);
        assert!(invoice.items.iter().all(|i| i.item_name.is_some()));
        assert_eq!(invoice.customer.as_ref().unwrap().name, "CV Kreativa Studio");
        assert_totals_consistent(invoice, TaxRate::default());
    }

    #[tokio::test]
    async fn test_list_rejects_negative_item_count() {
        let f = fixture().await;
        let filter = InvoiceFilter { total_items: Some(-1), ..Default::default() };
        let err = f.db.invoices().list(&filter).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
