//! # Invoice Number Sequence
//!
//! Assigns the next display number inside the transaction that inserts the
//! invoice.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Creator A                              Creator B                       │
//! │  ─────────                              ─────────                       │
//! │  BEGIN                                  BEGIN                           │
//! │  UPSERT invoice_sequence  ◄── write lock                                │
//! │  SELECT max number → "041"              UPSERT invoice_sequence         │
//! │  INSERT invoice "042"                     │ SQLITE_BUSY, busy handler   │
//! │  COMMIT  ── lock released ──────────────► │ retries on a fresh snapshot │
//! │                                         SELECT max number → "042"       │
//! │                                         INSERT invoice "043"            │
//! │                                         COMMIT                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock row write must be the first statement of the transaction: a
//! transaction that has already read cannot retry onto a newer snapshot
//! and would fail with `SQLITE_BUSY_SNAPSHOT` instead of waiting.

use chrono::Utc;
use invoicer_core::sequence::{self, MalformedNumberPolicy, NextNumber};
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::DbResult;

/// Name of the lock row used for invoice numbering.
const INVOICE_SEQUENCE: &str = "invoice";

/// Takes the invoice-number lock for the current transaction.
///
/// Holds the SQLite write lock until the transaction commits or rolls back.
pub async fn lock_sequence(conn: &mut SqliteConnection) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_sequence (name, locked_at)
        VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET locked_at = excluded.locked_at
        "#,
    )
    .bind(INVOICE_SEQUENCE)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Returns the greatest stored invoice number.
///
/// Digit strings compare numerically: longer first, then lexicographic, so
/// `"1000"` ranks above `"999"`.
pub async fn greatest_invoice_number(conn: &mut SqliteConnection) -> DbResult<Option<String>> {
    let number: Option<String> = sqlx::query_scalar(
        r#"
        SELECT invoice_number
        FROM invoices
        ORDER BY LENGTH(invoice_number) DESC, invoice_number DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(number)
}

/// Locks the sequence and derives the next invoice number.
///
/// Must run inside the transaction that inserts the invoice, before any
/// other statement.
pub async fn next_invoice_number(
    conn: &mut SqliteConnection,
    policy: MalformedNumberPolicy,
) -> DbResult<String> {
    lock_sequence(conn).await?;

    let last = greatest_invoice_number(conn).await?;

    match sequence::next_invoice_number(last.as_deref(), policy)? {
        NextNumber::Sequential(next) => {
            debug!(last = ?last, next = %next, "Assigned invoice number");
            Ok(next)
        }
        NextNumber::Restarted { next, malformed } => {
            warn!(
                malformed = %malformed,
                next = %next,
                "Greatest invoice number is not numeric; restarting sequence"
            );
            Ok(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use invoicer_core::CoreError;

    async fn insert_raw(db: &Database, number: &str) {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO invoices (id, invoice_number, issue_date, due_date, created_at, updated_at)
             VALUES (?1, ?2, '2024-01-01', '2024-01-31', ?3, ?3)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(number)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn next(db: &Database, policy: MalformedNumberPolicy) -> DbResult<String> {
        let mut tx = db.pool().begin().await.unwrap();
        let number = next_invoice_number(&mut tx, policy).await;
        tx.rollback().await.unwrap();
        number
    }

    #[tokio::test]
    async fn test_empty_table_starts_at_001() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(next(&db, MalformedNumberPolicy::Restart).await.unwrap(), "001");
    }

    #[tokio::test]
    async fn test_numeric_ordering_past_999() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert_raw(&db, "999").await;
        insert_raw(&db, "1000").await;
        assert_eq!(next(&db, MalformedNumberPolicy::Restart).await.unwrap(), "1001");
    }

    #[tokio::test]
    async fn test_099_then_100() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert_raw(&db, "098").await;
        insert_raw(&db, "099").await;
        assert_eq!(next(&db, MalformedNumberPolicy::Restart).await.unwrap(), "100");
    }

    #[tokio::test]
    async fn test_malformed_number_policies() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert_raw(&db, "INV-A").await;

        assert_eq!(next(&db, MalformedNumberPolicy::Restart).await.unwrap(), "001");

        let err = next(&db, MalformedNumberPolicy::Reject).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MalformedInvoiceNumber(ref n)) if n == "INV-A"
        ));
    }
}
