use super::{
    messages::{render_email, MessageContext},
    tally::KindOutcome,
};
use class_reminders_domain::{
    resolve_recipients, ClassSession, DeliveryRecord, DeliveryTarget, Recipient, ReminderKind,
};
use class_reminders_infra::{IAccessGrantRepo, IDeliveryLedgerRepo, IEmailSender};
use tracing::{error, info};

/// Every user entitled to the session, through a session grant or a full
/// course grant, deduplicated by user
pub async fn find_recipients(
    grants: &dyn IAccessGrantRepo,
    session: &ClassSession,
) -> anyhow::Result<Vec<Recipient>> {
    let session_grantees = grants.find_session_grantees(&session.id).await?;
    let course_grantees = grants.find_course_grantees(&session.live_class_id).await?;
    Ok(resolve_recipients(session_grantees, course_grantees))
}

pub struct DirectDispatch<'a> {
    pub sender: &'a dyn IEmailSender,
    pub grants: &'a dyn IAccessGrantRepo,
    pub ledger: &'a dyn IDeliveryLedgerRepo,
    pub messages: &'a MessageContext<'a>,
    pub now: i64,
}

impl<'a> DirectDispatch<'a> {
    /// Emails every recipient with an address. Recipients without one are
    /// skipped, failures are recorded per recipient.
    pub async fn send(&self, session: &ClassSession, kind: ReminderKind) -> KindOutcome {
        let mut outcome = KindOutcome::default();
        let category = kind.ledger_category();

        let recipients = match find_recipients(self.grants, session).await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(
                    "Unable to resolve recipients for session {}: {:?}",
                    session.id, e
                );
                outcome.tally.errors += 1;
                return outcome;
            }
        };

        for recipient in &recipients {
            let to = match recipient.deliverable_email() {
                Some(to) => to,
                None => {
                    info!(
                        "User {} has no email address, skipping {} reminder",
                        recipient.user_id,
                        kind.lead_time()
                    );
                    continue;
                }
            };

            outcome.attempts += 1;
            let email = render_email(self.messages, session, kind, recipient, to);
            let target = DeliveryTarget::Email(to.to_string());
            let record = match self.sender.send(&email).await {
                Ok(()) => {
                    outcome.tally.email_sent += 1;
                    DeliveryRecord::sent(session.id, category, target, self.now)
                }
                Err(e) => {
                    error!(
                        "Email reminder for session {} to {} failed: {}",
                        session.id, to, e
                    );
                    outcome.tally.errors += 1;
                    DeliveryRecord::failed(session.id, category, target, e.to_string(), self.now)
                }
            };
            if let Err(e) = self.ledger.record(&record).await {
                error!("Unable to record email delivery {:?}: {:?}", record, e);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::tally::DispatchTally;
    use chrono_tz::Tz;
    use class_reminders_domain::{
        AccessGrant, DeliveryStatus, GrantScope, SessionStatus, SessionType, ID,
    };
    use class_reminders_infra::{InMemoryEmailSender, ReminderContext};

    fn session() -> ClassSession {
        ClassSession {
            id: ID::new(),
            live_class_id: ID::new(),
            lesson_id: None,
            scheduled_at: 0,
            status: SessionStatus::Scheduled,
            session_type: SessionType::Afternoon,
            course_title: "Rust".into(),
            lesson_title: "Lifetimes".into(),
        }
    }

    async fn grant(ctx: &ReminderContext, scope: GrantScope, email: Option<&str>) -> ID {
        let user_id = ID::new();
        ctx.repos
            .access_grants
            .save_profile(&Recipient {
                user_id,
                email: email.map(String::from),
                display_name: None,
            })
            .await
            .unwrap();
        ctx.repos
            .access_grants
            .insert(&AccessGrant { user_id, scope })
            .await
            .unwrap();
        user_id
    }

    #[actix_web::test]
    async fn it_skips_recipients_without_email_and_isolates_failures() {
        let ctx = ReminderContext::create_inmemory();
        let session = session();
        grant(&ctx, GrantScope::Session(session.id), Some("a@academy.test")).await;
        grant(&ctx, GrantScope::FullCourse(session.live_class_id), None).await;
        grant(&ctx, GrantScope::FullCourse(session.live_class_id), Some("b@academy.test")).await;
        grant(&ctx, GrantScope::FullCourse(ID::new()), Some("other@academy.test")).await;

        let sender = InMemoryEmailSender::new();
        sender.fail_address("a@academy.test");
        let messages = MessageContext {
            site_url: "https://academy.test",
            timezone: Tz::UTC,
        };

        let outcome = DirectDispatch {
            sender: &sender,
            grants: ctx.repos.access_grants.as_ref(),
            ledger: ctx.repos.delivery_ledger.as_ref(),
            messages: &messages,
            now: 0,
        }
        .send(&session, ReminderKind::DayBefore)
        .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(
            outcome.tally,
            DispatchTally {
                telegram_sent: 0,
                email_sent: 1,
                errors: 1
            }
        );
        let sent_to: Vec<String> = sender.attempts().into_iter().map(|e| e.to).collect();
        assert_eq!(sent_to, vec!["a@academy.test", "b@academy.test"]);

        let records = ctx
            .repos
            .delivery_ledger
            .find_by_session(&session.id)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .any(|r| r.status == DeliveryStatus::Sent
                && r.target.recipient_email() == Some("b@academy.test")));
    }

    #[actix_web::test]
    async fn a_user_with_both_grants_is_emailed_once() {
        let ctx = ReminderContext::create_inmemory();
        let session = session();
        let user_id = grant(&ctx, GrantScope::Session(session.id), Some("a@academy.test")).await;
        ctx.repos
            .access_grants
            .insert(&AccessGrant {
                user_id,
                scope: GrantScope::FullCourse(session.live_class_id),
            })
            .await
            .unwrap();

        let recipients = find_recipients(ctx.repos.access_grants.as_ref(), &session)
            .await
            .unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].user_id, user_id);
    }
}
