mod inmemory;
mod postgres;

pub use inmemory::InMemorySessionRepo;
pub use postgres::PostgresSessionRepo;

use class_reminders_domain::ClassSession;

#[async_trait::async_trait]
pub trait ISessionRepo: Send + Sync {
    async fn insert(&self, session: &ClassSession) -> anyhow::Result<()>;
    /// Sessions in `scheduled` state starting within `[start, end]`, ordered
    /// by start time ascending
    async fn find_scheduled_between(&self, start: i64, end: i64)
        -> anyhow::Result<Vec<ClassSession>>;
}
