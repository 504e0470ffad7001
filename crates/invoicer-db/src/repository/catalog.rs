//! # Catalog Repository
//!
//! Billable items and services. Line items reference these rows; the
//! invoice read path joins their name and type.
//!
//! ## Search
//! ```text
//! query "serv"
//!   ├── name LIKE '%serv%'        ┐
//!   └── item_type LIKE '%serv%'   ┘ OR, active items only
//!
//!   Logo Design   | Service   ← match (type)
//!   Printer       | Hardware
//! ```

use chrono::Utc;
use invoicer_core::validation::{validate_name, validate_search_term};
use invoicer_core::CatalogItem;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::mapper::CatalogItemRecord;

const CATALOG_COLUMNS: &str = "id, name, item_type, is_active, created_at, updated_at";

/// Repository for the item catalog.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts an active catalog item.
    pub async fn insert(&self, name: &str, item_type: &str) -> DbResult<CatalogItem> {
        validate_name("name", name)?;
        validate_name("item_type", item_type)?;

        let now = Utc::now();
        let item = CatalogItem {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            item_type: item_type.trim().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "Inserting catalog item");

        sqlx::query(
            r#"
            INSERT INTO items (id, name, item_type, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.item_type)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets a catalog item by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<CatalogItem> {
        let sql = format!("SELECT {} FROM items WHERE id = ?1", CATALOG_COLUMNS);

        sqlx::query_as::<_, CatalogItemRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(CatalogItem::from)
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Searches active items by name or type. A blank query lists every
    /// active item.
    pub async fn search(&self, query: &str) -> DbResult<Vec<CatalogItem>> {
        let term = validate_search_term("query", query)?;
        let term = (!term.is_empty()).then_some(term);

        debug!(query = ?term, "Searching catalog");

        let sql = format!(
            "SELECT {} FROM items
             WHERE is_active = 1
               AND (?1 IS NULL OR name LIKE '%' || ?1 || '%' OR item_type LIKE '%' || ?1 || '%')
             ORDER BY name, id",
            CATALOG_COLUMNS
        );

        let items = sqlx::query_as::<_, CatalogItemRecord>(&sql)
            .bind(term)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CatalogItem::from)
            .collect();

        Ok(items)
    }

    /// Marks an item inactive. Existing invoice lines keep referencing it.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE items SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
