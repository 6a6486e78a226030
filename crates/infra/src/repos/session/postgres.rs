use super::ISessionRepo;
use crate::repos::shared::timestamp::{from_millis, to_millis};
use chrono::{DateTime, Utc};
use class_reminders_domain::{ClassSession, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresSessionRepo {
    pool: PgPool,
}

impl PostgresSessionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClassSessionRaw {
    session_uid: Uuid,
    live_class_uid: Uuid,
    lesson_uid: Option<Uuid>,
    scheduled_at: DateTime<Utc>,
    status: String,
    session_type: String,
    course_title: String,
    lesson_title: String,
}

impl TryFrom<ClassSessionRaw> for ClassSession {
    type Error = anyhow::Error;

    fn try_from(e: ClassSessionRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.session_uid.into(),
            live_class_id: e.live_class_uid.into(),
            lesson_id: e.lesson_uid.map(ID::from),
            scheduled_at: to_millis(&e.scheduled_at),
            status: e.status.parse()?,
            session_type: e.session_type.parse()?,
            course_title: e.course_title,
            lesson_title: e.lesson_title,
        })
    }
}

#[async_trait::async_trait]
impl ISessionRepo for PostgresSessionRepo {
    async fn insert(&self, session: &ClassSession) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO live_classes(live_class_uid, course_title)
            VALUES($1, $2)
            ON CONFLICT (live_class_uid) DO UPDATE SET course_title = EXCLUDED.course_title
            "#,
        )
        .bind(session.live_class_id.inner_ref())
        .bind(&session.course_title)
        .execute(&mut *tx)
        .await?;

        if let Some(lesson_id) = &session.lesson_id {
            sqlx::query(
                r#"
                INSERT INTO lessons(lesson_uid, title)
                VALUES($1, $2)
                ON CONFLICT (lesson_uid) DO UPDATE SET title = EXCLUDED.title
                "#,
            )
            .bind(lesson_id.inner_ref())
            .bind(&session.lesson_title)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO class_sessions
            (session_uid, live_class_uid, lesson_uid, scheduled_at, status, session_type)
            VALUES($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.id.inner_ref())
        .bind(session.live_class_id.inner_ref())
        .bind(session.lesson_id.map(|id| id.inner()))
        .bind(from_millis(session.scheduled_at)?)
        .bind(session.status.as_str())
        .bind(session.session_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert class session: {:?}. DB returned error: {:?}",
                session, e
            );
            e
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_scheduled_between(
        &self,
        start: i64,
        end: i64,
    ) -> anyhow::Result<Vec<ClassSession>> {
        let sessions: Vec<ClassSessionRaw> = sqlx::query_as(
            r#"
            SELECT s.session_uid, s.live_class_uid, s.lesson_uid, s.scheduled_at,
                s.status, s.session_type, c.course_title,
                COALESCE(l.title, '') AS lesson_title
            FROM class_sessions AS s
            INNER JOIN live_classes AS c
                ON c.live_class_uid = s.live_class_uid
            LEFT JOIN lessons AS l
                ON l.lesson_uid = s.lesson_uid
            WHERE s.status = 'scheduled'
                AND s.scheduled_at >= $1
                AND s.scheduled_at <= $2
            ORDER BY s.scheduled_at ASC
            "#,
        )
        .bind(from_millis(start)?)
        .bind(from_millis(end)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find scheduled sessions between {} and {} failed. DB returned error: {:?}",
                start, end, e
            );
            e
        })?;

        sessions.into_iter().map(ClassSession::try_from).collect()
    }
}
