//! Concurrent invoice creation against an on-disk database.
//!
//! In-memory databases are pinned to one connection, so these tests use a
//! temporary file and a pool wide enough for creators to really overlap.

use chrono::NaiveDate;
use invoicer_core::{InvoiceFilter, InvoiceHeader, InvoiceStatus, LineItemInput, NewCustomer};
use invoicer_db::{Database, DbConfig};
use std::collections::HashSet;
use tempfile::TempDir;

struct Setup {
    _dir: TempDir,
    db: Database,
    customer_id: String,
    item_id: String,
}

async fn setup() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("invoicer.db")).max_connections(4);
    let db = Database::new(config).await.unwrap();

    let customer = db
        .customers()
        .create(&NewCustomer {
            name: "PT Arunika Digital".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let item = db.catalog().insert("Development", "Service").await.unwrap();

    Setup {
        _dir: dir,
        db,
        customer_id: customer.id,
        item_id: item.id,
    }
}

fn header(customer_id: &str) -> InvoiceHeader {
    InvoiceHeader {
        issue_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        subject: "Sprint".to_string(),
        customer_id: customer_id.to_string(),
        status: InvoiceStatus::Unpaid,
    }
}

async fn create_concurrently(setup: &Setup, count: usize) -> Vec<String> {
    let mut handles = Vec::with_capacity(count);
    for _ in 0..count {
        let repo = setup.db.invoices();
        let header = header(&setup.customer_id);
        let lines = vec![LineItemInput::new(&setup.item_id, 1, 10_000)];
        handles.push(tokio::spawn(async move { repo.create(&header, &lines).await }));
    }

    let mut numbers = Vec::with_capacity(count);
    for handle in handles {
        let invoice = handle.await.unwrap().unwrap();
        numbers.push(invoice.invoice_number);
    }
    numbers.sort();
    numbers
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_creators_get_distinct_numbers() {
    let setup = setup().await;

    let numbers = create_concurrently(&setup, 2).await;

    assert_eq!(numbers, vec!["001", "002"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_batch_has_no_gaps_or_duplicates() {
    let setup = setup().await;

    let numbers = create_concurrently(&setup, 12).await;

    let expected: Vec<String> = (1..=12).map(|n| format!("{:03}", n)).collect();
    assert_eq!(numbers, expected);

    let unique: HashSet<&String> = numbers.iter().collect();
    assert_eq!(unique.len(), 12);

    let filter = InvoiceFilter {
        page_size: Some(100),
        ..Default::default()
    };
    let (stored, pagination) = setup.db.invoices().list(&filter).await.unwrap();
    assert_eq!(pagination.total_items, 12);
    assert!(stored
        .iter()
        .all(|inv| inv.total_cents == inv.subtotal_cents + inv.tax_cents));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn numbering_continues_after_concurrent_burst() {
    let setup = setup().await;

    create_concurrently(&setup, 3).await;
    let next = setup
        .db
        .invoices()
        .create(&header(&setup.customer_id), &[])
        .await
        .unwrap();

    assert_eq!(next.invoice_number, "004");
}
