//! PostgreSQL document store
//!
//! Documents live in a single `documents` table with the fields held as
//! JSONB. A conditional write is one `UPDATE ... WHERE <preconditions>`
//! statement; when it touches no row the adapter tells a missing document
//! apart from a lost race with a follow-up existence check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row};
use std::time::Instant;
use tracing::{debug, warn};

use core_kernel::{
    AdapterHealth, DocType, Document, DocumentQuery, DocumentStore, DomainPort, FieldMap,
    HealthCheckResult, HealthCheckable, PortError, Precondition,
};

use crate::error::StoreError;

const RETURNING: &str = " RETURNING doctype, name, version, fields, modified";

/// `DocumentStore` backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, doctype: DocType, name: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM documents WHERE doctype = $1 AND name = $2")
            .bind(doctype.as_str())
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

/// Appends a null-aware equality test on a JSONB field
///
/// A missing key and a JSON null are treated alike, matching the in-memory
/// adapter.
fn push_field_equals(builder: &mut QueryBuilder<'_, Postgres>, field: &str, value: &Value) {
    if value.is_null() {
        push_field_absent(builder, field);
    } else {
        builder.push(" AND fields -> ");
        builder.push_bind(field.to_string());
        builder.push(" = ");
        builder.push_bind(Json(value.clone()));
    }
}

fn push_field_absent(builder: &mut QueryBuilder<'_, Postgres>, field: &str) {
    builder.push(" AND (fields -> ");
    builder.push_bind(field.to_string());
    builder.push(" IS NULL OR fields -> ");
    builder.push_bind(field.to_string());
    builder.push(" = 'null'::jsonb)");
}

fn push_preconditions(builder: &mut QueryBuilder<'_, Postgres>, preconditions: &[Precondition]) {
    for precondition in preconditions {
        match precondition {
            Precondition::FieldEquals { field, value } => push_field_equals(builder, field, value),
            Precondition::FieldAbsent { field } => push_field_absent(builder, field),
            Precondition::Version { version } => {
                builder.push(" AND version = ");
                builder.push_bind(*version as i64);
            }
        }
    }
}

fn row_to_document(row: &PgRow) -> Result<Document, StoreError> {
    let doctype: String = row.try_get("doctype")?;
    let version: i64 = row.try_get("version")?;
    let Json(fields): Json<Value> = row.try_get("fields")?;
    let modified: DateTime<Utc> = row.try_get("modified")?;

    let fields = match fields {
        Value::Object(map) => map,
        other => {
            return Err(StoreError::SerializationError(format!(
                "document fields must be an object, got {}",
                other
            )))
        }
    };

    Ok(Document {
        doctype: doctype
            .parse()
            .map_err(|e: PortError| StoreError::SerializationError(e.to_string()))?,
        name: row.try_get("name")?,
        version: u64::try_from(version)
            .map_err(|_| StoreError::SerializationError(format!("negative version {}", version)))?,
        fields,
        modified,
    })
}

impl DomainPort for PostgresDocumentStore {}

#[async_trait]
impl HealthCheckable for PostgresDocumentStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => {
                warn!(error = %e, "Document store health check failed");
                (AdapterHealth::Unhealthy, Some(e.to_string()))
            }
        };

        HealthCheckResult {
            adapter_id: "postgres-document-store".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, doctype: DocType, name: &str) -> Result<Document, PortError> {
        let row = sqlx::query(
            "SELECT doctype, name, version, fields, modified FROM documents \
             WHERE doctype = $1 AND name = $2",
        )
        .bind(doctype.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?
        .ok_or_else(|| PortError::not_found(doctype.as_str(), name))?;

        Ok(row_to_document(&row)?)
    }

    async fn insert(
        &self,
        doctype: DocType,
        name: &str,
        fields: FieldMap,
    ) -> Result<Document, PortError> {
        let row = sqlx::query(
            "INSERT INTO documents (doctype, name, version, fields, modified) \
             VALUES ($1, $2, 1, $3, now()) \
             RETURNING doctype, name, version, fields, modified",
        )
        .bind(doctype.as_str())
        .bind(name)
        .bind(Json(Value::Object(fields)))
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from)?;

        debug!(doctype = %doctype, name, "Inserted document");
        Ok(row_to_document(&row)?)
    }

    async fn set_fields_if(
        &self,
        doctype: DocType,
        name: &str,
        preconditions: &[Precondition],
        updates: FieldMap,
    ) -> Result<Document, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE documents SET fields = fields || ");
        builder.push_bind(Json(Value::Object(updates)));
        builder.push(", version = version + 1, modified = now() WHERE doctype = ");
        builder.push_bind(doctype.as_str());
        builder.push(" AND name = ");
        builder.push_bind(name.to_string());
        push_preconditions(&mut builder, preconditions);
        builder.push(RETURNING);

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        match row {
            Some(row) => {
                let doc = row_to_document(&row)?;
                debug!(doctype = %doctype, name, version = doc.version, "Updated document");
                Ok(doc)
            }
            None if self.exists(doctype, name).await? => {
                let expected: Vec<String> = preconditions.iter().map(ToString::to_string).collect();
                Err(PortError::conflict(format!(
                    "{} {} was modified concurrently (expected {})",
                    doctype,
                    name,
                    expected.join(", ")
                )))
            }
            None => Err(PortError::not_found(doctype.as_str(), name)),
        }
    }

    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT doctype, name, version, fields, modified FROM documents WHERE doctype = ",
        );
        builder.push_bind(query.doctype.as_str());
        for (field, value) in &query.filters {
            push_field_equals(&mut builder, field, value);
        }
        builder.push(" ORDER BY modified DESC, name ASC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(limit));
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;

        rows.iter()
            .map(|row| row_to_document(row).map_err(PortError::from))
            .collect()
    }
}
