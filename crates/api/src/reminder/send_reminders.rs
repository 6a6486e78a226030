use super::{
    broadcast::{broadcast_destinations, BroadcastDispatch},
    direct::DirectDispatch,
    messages::{render_broadcast, MessageContext},
    tally::{DispatchSummary, DispatchTally},
};
use crate::{
    error::ApiError,
    shared::{
        auth::{protect_trigger_route, AnyOfAuthenticator, TriggerRequest},
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use class_reminders_api_structs::send_reminders::APIResponse;
use class_reminders_domain::{ClassSession, ReminderChannel, ReminderKind};
use class_reminders_infra::{IBroadcastChannel, IEmailSender, ReminderContext};
use tracing::{error, info};

pub async fn send_reminders_controller(
    http_req: HttpRequest,
    body: web::Bytes,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ApiError> {
    let authenticator = AnyOfAuthenticator::from_config(&ctx.config.trigger_auth);
    let triggered_by = protect_trigger_route(
        &authenticator,
        &TriggerRequest {
            headers: http_req.headers(),
            body: &body[..],
        },
    )?;

    let usecase = SendRemindersUseCase { triggered_by };

    execute(usecase, &ctx)
        .await
        .map(|summary| HttpResponse::Ok().json(APIResponse::from(summary)))
        .map_err(ApiError::from)
}

pub async fn preflight_controller() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed_controller() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

/// Sends every reminder that is due right now for the upcoming sessions
#[derive(Debug)]
pub struct SendRemindersUseCase {
    /// Name of whatever started this run, used for logging
    pub triggered_by: &'static str,
}

#[derive(Debug)]
pub enum UseCaseError {
    MissingConfiguration(&'static str),
    StorageError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingConfiguration(key) => Self::MissingConfiguration(key.into()),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendRemindersUseCase {
    type Response = DispatchSummary;

    type Error = UseCaseError;

    const NAME: &'static str = "SendReminders";

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Error> {
        let broadcast_channel = ctx
            .channels
            .broadcast
            .clone()
            .ok_or(UseCaseError::MissingConfiguration("TELEGRAM_BOT_TOKEN"))?;
        let email_sender = ctx
            .channels
            .email
            .clone()
            .ok_or(UseCaseError::MissingConfiguration("EMAIL_ENDPOINT_URL"))?;

        let now = ctx.sys.get_timestamp_millis();
        let sessions = ctx
            .repos
            .sessions
            .find_scheduled_between(now, now + ctx.config.dispatch.lookahead_millis)
            .await
            .map_err(|e| {
                error!("Unable to fetch upcoming sessions: {:?}", e);
                UseCaseError::StorageError
            })?;

        info!(
            "Reminder dispatch triggered by {} found {} upcoming session(s)",
            self.triggered_by,
            sessions.len()
        );
        if sessions.is_empty() {
            return Ok(DispatchSummary::NoUpcomingSessions);
        }

        let dispatcher = SessionDispatcher {
            ctx,
            broadcast_channel: broadcast_channel.as_ref(),
            email_sender: email_sender.as_ref(),
            messages: MessageContext {
                site_url: &ctx.config.site_url,
                timezone: ctx.config.display_timezone,
            },
            now,
        };

        let mut tally = DispatchTally::default();
        for session in &sessions {
            tally.merge(dispatcher.dispatch(session).await);
        }

        Ok(DispatchSummary::Completed {
            sessions_checked: sessions.len(),
            tally,
        })
    }
}

struct SessionDispatcher<'a> {
    ctx: &'a ReminderContext,
    broadcast_channel: &'a dyn IBroadcastChannel,
    email_sender: &'a dyn IEmailSender,
    messages: MessageContext<'a>,
    now: i64,
}

impl<'a> SessionDispatcher<'a> {
    /// Runs every reminder kind that fires for the session. Nothing in here
    /// aborts the run, failures end up in the tally.
    async fn dispatch(&self, session: &ClassSession) -> DispatchTally {
        let mut tally = DispatchTally::default();
        let tolerance = self.ctx.config.dispatch.tolerance_millis;

        for kind in ReminderKind::ALL.iter().copied() {
            if !kind.fires(self.now, session.scheduled_at, tolerance) {
                continue;
            }
            if !self.claim(session, kind, &mut tally).await {
                continue;
            }

            let outcome = match kind.channel() {
                ReminderChannel::Direct => {
                    DirectDispatch {
                        sender: self.email_sender,
                        grants: self.ctx.repos.access_grants.as_ref(),
                        ledger: self.ctx.repos.delivery_ledger.as_ref(),
                        messages: &self.messages,
                        now: self.now,
                    }
                    .send(session, kind)
                    .await
                }
                ReminderChannel::Broadcast(target) => {
                    let destinations = broadcast_destinations(&self.ctx.config.telegram, target);
                    let text = render_broadcast(&self.messages, session, kind);
                    BroadcastDispatch {
                        channel: self.broadcast_channel,
                        ledger: self.ctx.repos.delivery_ledger.as_ref(),
                        now: self.now,
                    }
                    .send(session, kind.ledger_category(), &destinations, &text)
                    .await
                }
            };
            tally.merge(outcome.tally);
            if outcome.attempts == 0 {
                self.release(session, kind).await;
            }
        }

        tally
    }

    /// Nothing was attempted for the kind, so a later run must be able to
    /// claim it again
    async fn release(&self, session: &ClassSession, kind: ReminderKind) {
        let category = kind.ledger_category();
        if let Err(e) = self
            .ctx
            .repos
            .delivery_ledger
            .release_claim(&session.id, category)
            .await
        {
            error!(
                "Unable to release {} claim for session {}: {:?}",
                category.as_str(),
                session.id,
                e
            );
        }
    }

    /// Whether this run should deliver `kind` for the session. A kind is only
    /// delivered when its ledger category has never been attempted and this
    /// run wins the claim for it.
    async fn claim(
        &self,
        session: &ClassSession,
        kind: ReminderKind,
        tally: &mut DispatchTally,
    ) -> bool {
        let category = kind.ledger_category();
        let ledger = &self.ctx.repos.delivery_ledger;

        match ledger.has_attempted(&session.id, category).await {
            Ok(true) => {
                info!(
                    "{} reminder already attempted for session {}",
                    category.as_str(),
                    session.id
                );
                return false;
            }
            Ok(false) => (),
            Err(e) => {
                error!(
                    "Unable to check the delivery ledger for session {}: {:?}",
                    session.id, e
                );
                tally.errors += 1;
                return false;
            }
        }

        match ledger.try_claim(&session.id, category, self.now).await {
            Ok(true) => true,
            Ok(false) => {
                info!(
                    "{} reminder for session {} is claimed by another run",
                    category.as_str(),
                    session.id
                );
                false
            }
            Err(e) => {
                error!(
                    "Unable to claim {} reminder for session {}: {:?}",
                    category.as_str(),
                    session.id,
                    e
                );
                tally.errors += 1;
                false
            }
        }
    }
}
