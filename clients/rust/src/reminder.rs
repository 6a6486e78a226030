use crate::{APIResponse, BaseClient};
use class_reminders_api_structs::send_reminders;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReminderClient {
    base: Arc<BaseClient>,
}

/// A dispatch trigger with extra headers, e.g. a scheduler sentinel header
/// or a webhook signature
#[derive(Debug, Clone, Default)]
pub struct TriggerRemindersInput {
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ReminderClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    /// Runs a reminder dispatch on the server
    pub async fn trigger(&self) -> APIResponse<send_reminders::APIResponse> {
        self.trigger_with(TriggerRemindersInput::default()).await
    }

    pub async fn trigger_with(
        &self,
        input: TriggerRemindersInput,
    ) -> APIResponse<send_reminders::APIResponse> {
        self.base
            .post_raw(
                input.body,
                &input.headers,
                "reminders/send".into(),
                StatusCode::OK,
            )
            .await
    }
}
