mod inmemory;
mod postgres;

pub use inmemory::InMemoryDeliveryLedgerRepo;
pub use postgres::PostgresDeliveryLedgerRepo;

use class_reminders_domain::{DeliveryRecord, LedgerCategory, ID};

/// The append-only ledger of delivery attempts, together with the claims
/// that decide which dispatch run owns the sends for a `(session, category)`.
#[async_trait::async_trait]
pub trait IDeliveryLedgerRepo: Send + Sync {
    /// Whether any delivery, successful or failed, has been recorded for
    /// the session and category
    async fn has_attempted(&self, session_id: &ID, category: LedgerCategory)
        -> anyhow::Result<bool>;
    /// Claims the right to deliver for the session and category. Only the
    /// first caller gets `true`, every later call returns `false`.
    async fn try_claim(
        &self,
        session_id: &ID,
        category: LedgerCategory,
        claimed_at: i64,
    ) -> anyhow::Result<bool>;
    /// Gives up a claim so that a later run may deliver the category again
    async fn release_claim(&self, session_id: &ID, category: LedgerCategory)
        -> anyhow::Result<()>;
    async fn record(&self, record: &DeliveryRecord) -> anyhow::Result<()>;
    async fn find_by_session(&self, session_id: &ID) -> anyhow::Result<Vec<DeliveryRecord>>;
}

#[cfg(test)]
mod tests {
    use crate::ReminderContext;
    use class_reminders_domain::{DeliveryRecord, DeliveryTarget, LedgerCategory, ID};

    #[tokio::test]
    async fn any_record_marks_the_category_as_attempted() {
        let ctx = ReminderContext::create_inmemory();
        let ledger = &ctx.repos.delivery_ledger;
        let session_id = ID::new();

        assert!(!ledger
            .has_attempted(&session_id, LedgerCategory::Email)
            .await
            .unwrap());

        let record = DeliveryRecord::failed(
            session_id,
            LedgerCategory::Email,
            DeliveryTarget::Email("a@academy.test".into()),
            "mailbox unavailable".into(),
            0,
        );
        ledger.record(&record).await.unwrap();

        assert!(ledger
            .has_attempted(&session_id, LedgerCategory::Email)
            .await
            .unwrap());
        assert!(!ledger
            .has_attempted(&session_id, LedgerCategory::ClassStart)
            .await
            .unwrap());
        assert!(!ledger
            .has_attempted(&ID::new(), LedgerCategory::Email)
            .await
            .unwrap());
        assert_eq!(
            ledger.find_by_session(&session_id).await.unwrap(),
            vec![record]
        );
    }

    #[tokio::test]
    async fn only_the_first_claim_wins() {
        let ctx = ReminderContext::create_inmemory();
        let ledger = &ctx.repos.delivery_ledger;
        let session_id = ID::new();

        assert!(ledger
            .try_claim(&session_id, LedgerCategory::ClassStart, 0)
            .await
            .unwrap());
        assert!(!ledger
            .try_claim(&session_id, LedgerCategory::ClassStart, 1)
            .await
            .unwrap());
        assert!(ledger
            .try_claim(&session_id, LedgerCategory::Countdown2Min, 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn a_released_claim_can_be_taken_again() {
        let ctx = ReminderContext::create_inmemory();
        let ledger = &ctx.repos.delivery_ledger;
        let session_id = ID::new();

        assert!(ledger
            .try_claim(&session_id, LedgerCategory::Email, 0)
            .await
            .unwrap());
        ledger
            .release_claim(&session_id, LedgerCategory::Email)
            .await
            .unwrap();
        // Releasing a claim nobody holds is fine
        ledger
            .release_claim(&session_id, LedgerCategory::ClassStart)
            .await
            .unwrap();
        assert!(ledger
            .try_claim(&session_id, LedgerCategory::Email, 1)
            .await
            .unwrap());
    }
}
