use super::IAccessGrantRepo;
use class_reminders_domain::{AccessGrant, GrantScope, Recipient, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresAccessGrantRepo {
    pool: PgPool,
}

impl PostgresAccessGrantRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RecipientRaw {
    user_uid: Uuid,
    email: Option<String>,
    display_name: Option<String>,
}

impl From<RecipientRaw> for Recipient {
    fn from(e: RecipientRaw) -> Self {
        Self {
            user_id: e.user_uid.into(),
            email: e.email,
            display_name: e.display_name,
        }
    }
}

#[async_trait::async_trait]
impl IAccessGrantRepo for PostgresAccessGrantRepo {
    async fn insert(&self, grant: &AccessGrant) -> anyhow::Result<()> {
        let (session_uid, live_class_uid) = match grant.scope {
            GrantScope::Session(session_id) => (Some(session_id.inner()), None),
            GrantScope::FullCourse(live_class_id) => (None, Some(live_class_id.inner())),
        };
        sqlx::query(
            r#"
            INSERT INTO access_grants(user_uid, scope, session_uid, live_class_uid)
            VALUES($1, $2, $3, $4)
            "#,
        )
        .bind(grant.user_id.inner_ref())
        .bind(grant.scope.as_str())
        .bind(session_uid)
        .bind(live_class_uid)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert access grant: {:?}. DB returned error: {:?}",
                grant, e
            );
            e
        })?;
        Ok(())
    }

    async fn save_profile(&self, profile: &Recipient) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles(user_uid, email, display_name)
            VALUES($1, $2, $3)
            ON CONFLICT (user_uid) DO UPDATE
            SET email = EXCLUDED.email,
            display_name = EXCLUDED.display_name
            "#,
        )
        .bind(profile.user_id.inner_ref())
        .bind(&profile.email)
        .bind(&profile.display_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session_grantees(&self, session_id: &ID) -> anyhow::Result<Vec<Recipient>> {
        let recipients: Vec<RecipientRaw> = sqlx::query_as(
            r#"
            SELECT g.user_uid, p.email, p.display_name
            FROM access_grants AS g
            LEFT JOIN profiles AS p
                ON p.user_uid = g.user_uid
            WHERE g.scope = 'session' AND g.session_uid = $1
            "#,
        )
        .bind(session_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find grantees for session: {} failed. DB returned error: {:?}",
                session_id, e
            );
            e
        })?;

        Ok(recipients.into_iter().map(|r| r.into()).collect())
    }

    async fn find_course_grantees(&self, live_class_id: &ID) -> anyhow::Result<Vec<Recipient>> {
        let recipients: Vec<RecipientRaw> = sqlx::query_as(
            r#"
            SELECT g.user_uid, p.email, p.display_name
            FROM access_grants AS g
            LEFT JOIN profiles AS p
                ON p.user_uid = g.user_uid
            WHERE g.scope = 'full_course' AND g.live_class_uid = $1
            "#,
        )
        .bind(live_class_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find grantees for live class: {} failed. DB returned error: {:?}",
                live_class_id, e
            );
            e
        })?;

        Ok(recipients.into_iter().map(|r| r.into()).collect())
    }
}
