mod inmemory;
mod postgres;

pub use inmemory::InMemoryAccessGrantRepo;
pub use postgres::PostgresAccessGrantRepo;

use class_reminders_domain::{AccessGrant, Recipient, ID};

#[async_trait::async_trait]
pub trait IAccessGrantRepo: Send + Sync {
    async fn insert(&self, grant: &AccessGrant) -> anyhow::Result<()>;
    /// Stores the contact details of a user
    async fn save_profile(&self, profile: &Recipient) -> anyhow::Result<()>;
    /// Users holding a grant for exactly this session
    async fn find_session_grantees(&self, session_id: &ID) -> anyhow::Result<Vec<Recipient>>;
    /// Users holding a grant for every session of the live class
    async fn find_course_grantees(&self, live_class_id: &ID) -> anyhow::Result<Vec<Recipient>>;
}

#[cfg(test)]
mod tests {
    use crate::ReminderContext;
    use class_reminders_domain::{AccessGrant, GrantScope, Recipient, ID};

    #[tokio::test]
    async fn finds_grantees_per_scope() {
        let ctx = ReminderContext::create_inmemory();
        let repo = &ctx.repos.access_grants;
        let session_id = ID::new();
        let live_class_id = ID::new();

        let alice = Recipient {
            user_id: ID::new(),
            email: Some("alice@academy.test".into()),
            display_name: Some("Alice".into()),
        };
        let bob = Recipient {
            user_id: ID::new(),
            email: None,
            display_name: Some("Bob".into()),
        };
        repo.save_profile(&alice).await.unwrap();
        repo.save_profile(&bob).await.unwrap();
        repo.insert(&AccessGrant {
            user_id: alice.user_id,
            scope: GrantScope::Session(session_id),
        })
        .await
        .unwrap();
        repo.insert(&AccessGrant {
            user_id: bob.user_id,
            scope: GrantScope::FullCourse(live_class_id),
        })
        .await
        .unwrap();
        // A grant for some other session
        repo.insert(&AccessGrant {
            user_id: bob.user_id,
            scope: GrantScope::Session(ID::new()),
        })
        .await
        .unwrap();

        let session_grantees = repo.find_session_grantees(&session_id).await.unwrap();
        assert_eq!(session_grantees, vec![alice]);
        let course_grantees = repo.find_course_grantees(&live_class_id).await.unwrap();
        assert_eq!(course_grantees, vec![bob]);
    }

    #[tokio::test]
    async fn grants_without_profile_have_no_contact_details() {
        let ctx = ReminderContext::create_inmemory();
        let session_id = ID::new();
        let user_id = ID::new();
        ctx.repos
            .access_grants
            .insert(&AccessGrant {
                user_id,
                scope: GrantScope::Session(session_id),
            })
            .await
            .unwrap();

        let grantees = ctx
            .repos
            .access_grants
            .find_session_grantees(&session_id)
            .await
            .unwrap();
        assert_eq!(grantees.len(), 1);
        assert_eq!(grantees[0].user_id, user_id);
        assert!(grantees[0].email.is_none());
    }
}
