use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Payment, PaymentAttributes, PaymentSummary};
use crate::id::{IdError, PaymentId};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("stored payment could not be decoded: {0}")]
    Corrupt(String),
}

impl From<IdError> for StorageError {
    fn from(e: IdError) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Trait defining the operations available on the payment collection.
///
/// Identifiers are assigned by the store and ordered by their raw bytes.
/// Dropping any returned future abandons the underlying storage call.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Up to `limit` summaries whose id sorts strictly after `after`, in
    /// ascending id order. `None` starts from the beginning of the collection.
    async fn list(&self, limit: usize, after: Option<PaymentId>) -> StorageResult<Vec<PaymentSummary>>;

    /// `Ok(None)` when no payment has this id.
    async fn get_by_id(&self, id: PaymentId) -> StorageResult<Option<Payment>>;

    /// Store a new payment at version 0 and return its id.
    async fn insert(&self, organisation_id: &str, attributes: &PaymentAttributes) -> StorageResult<PaymentId>;

    /// Replace `organisation_id` and `attributes` and bump the version by one.
    /// An unknown id is a silent no-op.
    async fn update(&self, id: PaymentId, organisation_id: &str, attributes: &PaymentAttributes) -> StorageResult<()>;

    /// Remove the payment. Deleting an unknown id succeeds.
    async fn delete(&self, id: PaymentId) -> StorageResult<()>;
}

/// DbConnection manages the SQLite payment collection
#[derive(Clone)]
pub struct DbConnection {
    pool: SqlitePool,
}

impl DbConnection {
    /// Connect to the database at `url`, creating it and its schema if needed
    pub async fn new(url: &str, max_connections: u32) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        info!("Connected to payment store at {}", url);

        Ok(Self { pool })
    }

    /// Initialize a private in-memory database for tests
    #[cfg(test)]
    pub async fn init_test() -> StorageResult<Self> {
        // A single connection that never idles out keeps the in-memory
        // database alive for the whole test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::setup_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                id BLOB PRIMARY KEY NOT NULL,
                organisation_id TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 0,
                attributes TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn payment_from_row(row: &SqliteRow) -> StorageResult<Payment> {
        let id: Vec<u8> = row.try_get("id")?;
        let version: i64 = row.try_get("version")?;
        let attributes: String = row.try_get("attributes")?;

        Ok(Payment {
            id: PaymentId::from_slice(&id)?,
            organisation_id: row.try_get("organisation_id")?,
            version: u64::try_from(version)
                .map_err(|_| StorageError::Corrupt(format!("negative version {}", version)))?,
            attributes: serde_json::from_str(&attributes)?,
        })
    }
}

#[async_trait]
impl PaymentStore for DbConnection {
    async fn list(&self, limit: usize, after: Option<PaymentId>) -> StorageResult<Vec<PaymentSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match after {
            Some(after) => {
                sqlx::query("SELECT id FROM payments WHERE id > ? ORDER BY id ASC LIMIT ?")
                    .bind(after.as_bytes())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT id FROM payments ORDER BY id ASC LIMIT ?")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter()
            .map(|row| -> StorageResult<PaymentSummary> {
                let id: Vec<u8> = row.try_get("id")?;
                Ok(PaymentSummary {
                    id: PaymentId::from_slice(&id)?,
                })
            })
            .collect()
    }

    async fn get_by_id(&self, id: PaymentId) -> StorageResult<Option<Payment>> {
        let row = sqlx::query(
            "SELECT id, organisation_id, version, attributes FROM payments WHERE id = ?",
        )
        .bind(id.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::payment_from_row).transpose()
    }

    async fn insert(&self, organisation_id: &str, attributes: &PaymentAttributes) -> StorageResult<PaymentId> {
        let id = PaymentId::generate();
        let document = serde_json::to_string(attributes)?;

        sqlx::query(
            "INSERT INTO payments (id, organisation_id, version, attributes) VALUES (?, ?, 0, ?)",
        )
        .bind(id.as_bytes())
        .bind(organisation_id)
        .bind(document)
        .execute(&self.pool)
        .await?;

        debug!("Inserted payment {}", id);
        Ok(id)
    }

    async fn update(&self, id: PaymentId, organisation_id: &str, attributes: &PaymentAttributes) -> StorageResult<()> {
        let document = serde_json::to_string(attributes)?;

        // The increment happens inside the statement, so concurrent updates of
        // the same row each land exactly once.
        let result = sqlx::query(
            "UPDATE payments SET organisation_id = ?, attributes = ?, version = version + 1 WHERE id = ?",
        )
        .bind(organisation_id)
        .bind(document)
        .bind(id.as_bytes())
        .execute(&self.pool)
        .await?;

        debug!("Updated payment {} ({} rows)", id, result.rows_affected());
        Ok(())
    }

    async fn delete(&self, id: PaymentId) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM payments WHERE id = ?")
            .bind(id.as_bytes())
            .execute(&self.pool)
            .await?;

        debug!("Deleted payment {} ({} rows)", id, result.rows_affected());
        Ok(())
    }
}
