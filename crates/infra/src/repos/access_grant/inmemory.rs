use super::IAccessGrantRepo;
use crate::repos::shared::inmemory_repo::*;
use class_reminders_domain::{AccessGrant, GrantScope, Recipient, ID};

pub struct InMemoryAccessGrantRepo {
    grants: std::sync::Mutex<Vec<AccessGrant>>,
    profiles: std::sync::Mutex<Vec<Recipient>>,
}

impl InMemoryAccessGrantRepo {
    pub fn new() -> Self {
        Self {
            grants: std::sync::Mutex::new(Vec::new()),
            profiles: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn grantees<F: Fn(&GrantScope) -> bool>(&self, matches: F) -> Vec<Recipient> {
        find_by(&self.grants, |g| matches(&g.scope))
            .into_iter()
            .map(|grant| {
                find_by(&self.profiles, |p| p.user_id == grant.user_id)
                    .pop()
                    .unwrap_or(Recipient {
                        user_id: grant.user_id,
                        email: None,
                        display_name: None,
                    })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl IAccessGrantRepo for InMemoryAccessGrantRepo {
    async fn insert(&self, grant: &AccessGrant) -> anyhow::Result<()> {
        insert(grant, &self.grants);
        Ok(())
    }

    async fn save_profile(&self, profile: &Recipient) -> anyhow::Result<()> {
        upsert_by(profile, &self.profiles, |p| p.user_id == profile.user_id);
        Ok(())
    }

    async fn find_session_grantees(&self, session_id: &ID) -> anyhow::Result<Vec<Recipient>> {
        Ok(self.grantees(|scope| *scope == GrantScope::Session(*session_id)))
    }

    async fn find_course_grantees(&self, live_class_id: &ID) -> anyhow::Result<Vec<Recipient>> {
        Ok(self.grantees(|scope| *scope == GrantScope::FullCourse(*live_class_id)))
    }
}
