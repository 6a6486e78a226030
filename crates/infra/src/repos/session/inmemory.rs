use super::ISessionRepo;
use crate::repos::shared::inmemory_repo::*;
use class_reminders_domain::{ClassSession, SessionStatus};

pub struct InMemorySessionRepo {
    sessions: std::sync::Mutex<Vec<ClassSession>>,
}

impl InMemorySessionRepo {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ISessionRepo for InMemorySessionRepo {
    async fn insert(&self, session: &ClassSession) -> anyhow::Result<()> {
        insert(session, &self.sessions);
        Ok(())
    }

    async fn find_scheduled_between(
        &self,
        start: i64,
        end: i64,
    ) -> anyhow::Result<Vec<ClassSession>> {
        let mut sessions = find_by(&self.sessions, |s| {
            s.status == SessionStatus::Scheduled && s.scheduled_at >= start && s.scheduled_at <= end
        });
        sessions.sort_by_key(|s| s.scheduled_at);
        Ok(sessions)
    }
}
