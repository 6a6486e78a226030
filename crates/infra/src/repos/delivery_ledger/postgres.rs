use super::IDeliveryLedgerRepo;
use crate::repos::shared::timestamp::{from_millis, to_millis};
use chrono::{DateTime, Utc};
use class_reminders_domain::{DeliveryRecord, DeliveryTarget, LedgerCategory, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresDeliveryLedgerRepo {
    pool: PgPool,
}

impl PostgresDeliveryLedgerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DeliveryRecordRaw {
    record_uid: Uuid,
    session_uid: Uuid,
    category: String,
    recipient_email: Option<String>,
    recipient_telegram_id: Option<String>,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRecordRaw> for DeliveryRecord {
    type Error = anyhow::Error;

    fn try_from(e: DeliveryRecordRaw) -> anyhow::Result<Self> {
        let target = match (e.recipient_email, e.recipient_telegram_id) {
            (Some(email), _) => DeliveryTarget::Email(email),
            (None, Some(chat_id)) => DeliveryTarget::Broadcast(chat_id),
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "Delivery record {} has no recipient",
                    e.record_uid
                ))
            }
        };
        Ok(Self {
            id: e.record_uid.into(),
            session_id: e.session_uid.into(),
            category: e.category.parse()?,
            target,
            status: e.status.parse()?,
            error: e.error_message,
            created: to_millis(&e.created_at),
        })
    }
}

#[async_trait::async_trait]
impl IDeliveryLedgerRepo for PostgresDeliveryLedgerRepo {
    async fn has_attempted(
        &self,
        session_id: &ID,
        category: LedgerCategory,
    ) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM delivery_records
                WHERE session_uid = $1 AND category = $2
            )
            "#,
        )
        .bind(session_id.inner_ref())
        .bind(category.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Ledger lookup for session: {} and category: {} failed. DB returned error: {:?}",
                session_id,
                category.as_str(),
                e
            );
            e
        })?;
        Ok(exists)
    }

    async fn try_claim(
        &self,
        session_id: &ID,
        category: LedgerCategory,
        claimed_at: i64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO dispatch_claims(session_uid, category, claimed_at)
            VALUES($1, $2, $3)
            ON CONFLICT (session_uid, category) DO NOTHING
            "#,
        )
        .bind(session_id.inner_ref())
        .bind(category.as_str())
        .bind(from_millis(claimed_at)?)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn release_claim(
        &self,
        session_id: &ID,
        category: LedgerCategory,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM dispatch_claims
            WHERE session_uid = $1 AND category = $2
            "#,
        )
        .bind(session_id.inner_ref())
        .bind(category.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to release claim for session: {} and category: {}. DB returned error: {:?}",
                session_id,
                category.as_str(),
                e
            );
            e
        })?;
        Ok(())
    }

    async fn record(&self, record: &DeliveryRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delivery_records
            (record_uid, session_uid, category, recipient_email, recipient_telegram_id, status, error_message, created_at)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.inner_ref())
        .bind(record.session_id.inner_ref())
        .bind(record.category.as_str())
        .bind(record.target.recipient_email())
        .bind(record.target.recipient_telegram_id())
        .bind(record.status.as_str())
        .bind(&record.error)
        .bind(from_millis(record.created)?)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert delivery record: {:?}. DB returned error: {:?}",
                record, e
            );
            e
        })?;
        Ok(())
    }

    async fn find_by_session(&self, session_id: &ID) -> anyhow::Result<Vec<DeliveryRecord>> {
        let records: Vec<DeliveryRecordRaw> = sqlx::query_as(
            r#"
            SELECT * FROM delivery_records
            WHERE session_uid = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(DeliveryRecord::try_from).collect()
    }
}
