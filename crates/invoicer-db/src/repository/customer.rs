//! # Customer Repository
//!
//! The customer directory invoices point at.

use chrono::Utc;
use invoicer_core::validation::{validate_name, validate_search_term};
use invoicer_core::{Customer, NewCustomer};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::mapper::CustomerRecord;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer.
    ///
    /// ## Errors
    /// - Validation error for a blank name
    /// - `UniqueViolation` when the email is already registered
    pub async fn create(&self, input: &NewCustomer) -> DbResult<Customer> {
        validate_name("name", &input.name)?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            email: input.email.as_deref().map(str::trim).filter(|e| !e.is_empty()).map(String::from),
            phone: input.phone.clone(),
            address: input.address.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, name = %customer.name, "Creating customer");

        let result = sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(id = %customer.id, "Customer created");
                Ok(customer)
            }
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate(
                    "customer email",
                    customer.email.unwrap_or_default(),
                )),
                other => Err(other),
            },
        }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Customer> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);

        sqlx::query_as::<_, CustomerRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Customer::from)
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Lists customers by name, optionally filtered by a name substring.
    pub async fn list(&self, name: Option<&str>) -> DbResult<Vec<Customer>> {
        let term = match name {
            Some(n) => Some(validate_search_term("name", n)?).filter(|t| !t.is_empty()),
            None => None,
        };

        let sql = format!(
            "SELECT {} FROM customers
             WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%')
             ORDER BY name, id",
            CUSTOMER_COLUMNS
        );

        let customers = sqlx::query_as::<_, CustomerRecord>(&sql)
            .bind(term)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Customer::from)
            .collect::<Vec<_>>();

        debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
