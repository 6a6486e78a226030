use super::tally::KindOutcome;
use class_reminders_domain::{
    BroadcastTarget, ClassSession, DeliveryRecord, DeliveryTarget, LedgerCategory,
};
use class_reminders_infra::{IBroadcastChannel, IDeliveryLedgerRepo, TelegramConfig};
use tracing::{error, warn};

/// The chats a broadcast reminder goes out to
pub fn broadcast_destinations(config: &TelegramConfig, target: BroadcastTarget) -> Vec<String> {
    match target {
        BroadcastTarget::AllDestinations => config.chat_ids.clone(),
        BroadcastTarget::DefaultDestination => config.default_chat_id.iter().cloned().collect(),
    }
}

pub struct BroadcastDispatch<'a> {
    pub channel: &'a dyn IBroadcastChannel,
    pub ledger: &'a dyn IDeliveryLedgerRepo,
    pub now: i64,
}

impl<'a> BroadcastDispatch<'a> {
    /// Sends `text` to every destination. Each destination is attempted and
    /// recorded on its own, so a failing chat never blocks the others.
    pub async fn send(
        &self,
        session: &ClassSession,
        category: LedgerCategory,
        destinations: &[String],
        text: &str,
    ) -> KindOutcome {
        let mut outcome = KindOutcome::default();
        if destinations.is_empty() {
            warn!(
                "No broadcast destination is configured for {}, skipping session {}",
                category.as_str(),
                session.id
            );
            return outcome;
        }

        for destination in destinations {
            outcome.attempts += 1;
            let target = DeliveryTarget::Broadcast(destination.clone());
            let record = match self.channel.send_message(destination, text).await {
                Ok(()) => {
                    outcome.tally.telegram_sent += 1;
                    DeliveryRecord::sent(session.id, category, target, self.now)
                }
                Err(e) => {
                    error!(
                        "Broadcast of {} for session {} to {} failed: {}",
                        category.as_str(),
                        session.id,
                        destination,
                        e
                    );
                    outcome.tally.errors += 1;
                    DeliveryRecord::failed(session.id, category, target, e.to_string(), self.now)
                }
            };
            if let Err(e) = self.ledger.record(&record).await {
                error!("Unable to record broadcast delivery {:?}: {:?}", record, e);
            }
        }

        outcome
    }
}
