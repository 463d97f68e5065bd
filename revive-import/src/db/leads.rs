//! `leads` table operations

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use revive_common::Result;

use crate::error::StoreError;
use crate::models::LeadInsert;
use crate::services::LeadStore;

/// Stored lead as returned by [`list_leads`]
#[derive(Debug, Clone, Serialize)]
pub struct LeadRow {
    pub id: Uuid,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub lead_score: i64,
    pub source: Option<String>,
    pub last_contact_date: Option<String>,
    pub total_messages_sent: i64,
    pub created_at: DateTime<Utc>,
}

/// [`LeadStore`] backed by the service's SQLite database
///
/// Each batch is written in one transaction; a failing row rolls back the
/// whole batch.
#[derive(Clone)]
pub struct SqliteLeadStore {
    pool: SqlitePool,
}

impl SqliteLeadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    async fn insert_leads(&self, rows: &[LeadInsert]) -> std::result::Result<Option<usize>, StoreError> {
        // Fixed width so lexical order matches time order
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO leads (
                    id, user_id, first_name, last_name, email,
                    phone, company, job_title, notes,
                    status, lead_score, source, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&row.user_id)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.email)
            .bind(&row.phone)
            .bind(&row.company)
            .bind(&row.job_title)
            .bind(&row.notes)
            .bind(&row.status)
            .bind(row.lead_score)
            .bind(&row.source)
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        tracing::debug!(rows = rows.len(), inserted, "Lead batch committed");

        Ok(Some(inserted))
    }
}

/// Leads owned by `owner_id`, newest first
pub async fn list_leads(
    pool: &SqlitePool,
    owner_id: &str,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<LeadRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, first_name, last_name, email,
               phone, company, job_title, notes,
               status, lead_score, source, last_contact_date,
               total_messages_sent, created_at
        FROM leads
        WHERE user_id = ? AND (? IS NULL OR status = ?)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(owner_id)
    .bind(status)
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|row| lead_from_row(&row)).collect()
}

fn lead_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<LeadRow> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| revive_common::Error::Internal(format!("Invalid lead id {}: {}", id, e)))?;

    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| revive_common::Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(LeadRow {
        id,
        user_id: row.get("user_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        job_title: row.get("job_title"),
        notes: row.get("notes"),
        status: row.get("status"),
        lead_score: row.get("lead_score"),
        source: row.get("source"),
        last_contact_date: row.get("last_contact_date"),
        total_messages_sent: row.get("total_messages_sent"),
        created_at,
    })
}
