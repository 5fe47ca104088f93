//! PostgreSQL implementation of DocumentStore.
//!
//! Documents live in a single `documents` table keyed by
//! `(collection, id)` with a JSONB `body`. Filters become `body @> $filter`
//! containment checks. Atomic adds are single `UPDATE ... RETURNING`
//! statements, so Postgres row locking provides the atomicity.
//!
//! Every call is wrapped in the configured request timeout and a timeout
//! surfaces as `StoreError::Timeout`. Nothing is retried here.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;
use crate::ports::{
    BoundedAdd, Collection, CreateOutcome, Document, DocumentStore, Filter, StoreError,
    StoredDocument, WriteMode,
};

/// PostgreSQL implementation of the DocumentStore port.
pub struct PostgresDocumentStore {
    pool: PgPool,
    request_timeout: Duration,
}

impl PostgresDocumentStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool, request_timeout: Duration) -> Self {
        Self {
            pool,
            request_timeout,
        }
    }

    /// Opens a connection pool from configuration.
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::unavailable(format!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool, config.request_timeout()))
    }

    /// Applies the schema migrations under `./migrations`.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running document store migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::unavailable(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        collection: Collection,
        query: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, query).await {
            Ok(result) => result.map_err(|e| {
                StoreError::unavailable(format!("{} on {} failed: {}", operation, collection, e))
            }),
            Err(_) => Err(StoreError::Timeout {
                operation,
                collection,
                timeout_secs: self.request_timeout.as_secs(),
            }),
        }
    }
}

fn into_document(collection: Collection, id: &str, value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::malformed(collection, id, "body is not a JSON object")),
    }
}

/// Equality conditions as a JSONB containment pattern.
fn containment(filter: &Filter) -> Value {
    let pattern: Document = filter
        .conditions()
        .iter()
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();
    Value::Object(pattern)
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<(Json<Value>,)> = self
            .bounded(
                "get",
                collection,
                sqlx::query_as("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection.as_str())
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(|(Json(body),)| into_document(collection, id, body))
            .transpose()
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let sql = match mode {
            WriteMode::Replace => {
                r#"
                INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body
                "#
            }
            WriteMode::Merge => {
                r#"
                INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET body = documents.body || EXCLUDED.body
                "#
            }
        };

        self.bounded(
            "put",
            collection,
            sqlx::query(sql)
                .bind(collection.as_str())
                .bind(id)
                .bind(Json(Value::Object(document)))
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<CreateOutcome, StoreError> {
        let result = self
            .bounded(
                "create",
                collection,
                sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
                    ON CONFLICT (collection, id) DO NOTHING
                    "#,
                )
                .bind(collection.as_str())
                .bind(id)
                .bind(Json(Value::Object(document)))
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            debug!(%collection, id, "Document already exists");
            Ok(CreateOutcome::AlreadyExists)
        } else {
            Ok(CreateOutcome::Created)
        }
    }

    async fn count_where(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let (count,): (i64,) = self
            .bounded(
                "count_where",
                collection,
                sqlx::query_as(
                    r#"
                    SELECT COUNT(*) FROM documents
                    WHERE collection = $1
                      AND body @> $2
                      AND ($3::text IS NULL OR starts_with(id, $3))
                    "#,
                )
                .bind(collection.as_str())
                .bind(Json(containment(filter)))
                .bind(filter.id_prefix())
                .fetch_one(&self.pool),
            )
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn list_where(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let rows: Vec<(String, Json<Value>)> = self
            .bounded(
                "list_where",
                collection,
                sqlx::query_as(
                    r#"
                    SELECT id, body FROM documents
                    WHERE collection = $1
                      AND body @> $2
                      AND ($3::text IS NULL OR starts_with(id, $3))
                    ORDER BY id
                    "#,
                )
                .bind(collection.as_str())
                .bind(Json(containment(filter)))
                .bind(filter.id_prefix())
                .fetch_all(&self.pool),
            )
            .await?;

        rows.into_iter()
            .map(|(id, Json(body))| {
                let body = into_document(collection, &id, body)?;
                Ok(StoredDocument { id, body })
            })
            .collect()
    }

    async fn atomic_add(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<Option<i64>, StoreError> {
        let row: Option<(i64,)> = self
            .bounded(
                "atomic_add",
                collection,
                sqlx::query_as(
                    r#"
                    UPDATE documents
                    SET body = jsonb_set(
                        body,
                        ARRAY[$3::text],
                        to_jsonb(GREATEST(COALESCE((body->>$3)::bigint, 0) + $4, 0))
                    )
                    WHERE collection = $1 AND id = $2
                    RETURNING (body->>$3)::bigint
                    "#,
                )
                .bind(collection.as_str())
                .bind(id)
                .bind(field)
                .bind(delta)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn atomic_add_bounded(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
        limit_field: &str,
    ) -> Result<BoundedAdd, StoreError> {
        let applied: Option<(i64,)> = self
            .bounded(
                "atomic_add_bounded",
                collection,
                sqlx::query_as(
                    r#"
                    UPDATE documents
                    SET body = jsonb_set(
                        body,
                        ARRAY[$3::text],
                        to_jsonb(GREATEST(COALESCE((body->>$3)::bigint, 0) + $4, 0))
                    )
                    WHERE collection = $1 AND id = $2
                      AND ($4 <= 0 OR COALESCE((body->>$3)::bigint, 0) + $4 <= (body->>$5)::bigint)
                    RETURNING (body->>$3)::bigint
                    "#,
                )
                .bind(collection.as_str())
                .bind(id)
                .bind(field)
                .bind(delta)
                .bind(limit_field)
                .fetch_optional(&self.pool),
            )
            .await?;

        if let Some((value,)) = applied {
            return Ok(BoundedAdd::Applied(value));
        }

        // Nothing updated: either the document is gone or the limit held.
        let snapshot: Option<(i64, Option<i64>)> = self
            .bounded(
                "atomic_add_bounded",
                collection,
                sqlx::query_as(
                    r#"
                    SELECT COALESCE((body->>$3)::bigint, 0), (body->>$4)::bigint
                    FROM documents
                    WHERE collection = $1 AND id = $2
                    "#,
                )
                .bind(collection.as_str())
                .bind(id)
                .bind(field)
                .bind(limit_field)
                .fetch_optional(&self.pool),
            )
            .await?;

        match snapshot {
            None => Ok(BoundedAdd::Missing),
            Some((_, None)) => Err(StoreError::malformed(
                collection,
                id,
                format!("limit field '{}' is missing", limit_field),
            )),
            Some((current, Some(limit))) => Ok(BoundedAdd::Rejected { current, limit }),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let result = self
            .bounded(
                "delete",
                collection,
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection.as_str())
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
