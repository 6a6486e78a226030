use super::IDeliveryLedgerRepo;
use crate::repos::shared::inmemory_repo::*;
use class_reminders_domain::{DeliveryRecord, LedgerCategory, ID};
use std::collections::HashSet;
use std::sync::Mutex;

pub struct InMemoryDeliveryLedgerRepo {
    records: Mutex<Vec<DeliveryRecord>>,
    claims: Mutex<HashSet<(ID, LedgerCategory)>>,
}

impl InMemoryDeliveryLedgerRepo {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            claims: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait::async_trait]
impl IDeliveryLedgerRepo for InMemoryDeliveryLedgerRepo {
    async fn has_attempted(
        &self,
        session_id: &ID,
        category: LedgerCategory,
    ) -> anyhow::Result<bool> {
        let records = find_by(&self.records, |r| {
            r.session_id == *session_id && r.category == category
        });
        Ok(!records.is_empty())
    }

    async fn try_claim(
        &self,
        session_id: &ID,
        category: LedgerCategory,
        _claimed_at: i64,
    ) -> anyhow::Result<bool> {
        let mut claims = self.claims.lock().unwrap();
        Ok(claims.insert((*session_id, category)))
    }

    async fn release_claim(
        &self,
        session_id: &ID,
        category: LedgerCategory,
    ) -> anyhow::Result<()> {
        let mut claims = self.claims.lock().unwrap();
        claims.remove(&(*session_id, category));
        Ok(())
    }

    async fn record(&self, record: &DeliveryRecord) -> anyhow::Result<()> {
        insert(record, &self.records);
        Ok(())
    }

    async fn find_by_session(&self, session_id: &ID) -> anyhow::Result<Vec<DeliveryRecord>> {
        Ok(find_by(&self.records, |r| r.session_id == *session_id))
    }
}
