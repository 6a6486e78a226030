mod base;
mod reminder;
mod status;

pub(crate) use base::BaseClient;
pub use base::{APIError, APIResponse};
pub use class_reminders_api_structs::get_service_health::APIResponse as ServiceHealth;
pub use class_reminders_api_structs::send_reminders::{
    APIResponse as DispatchResult, ReminderBreakdown,
};
use reminder::ReminderClient;
pub use reminder::TriggerRemindersInput;
use status::StatusClient;
use std::sync::Arc;

/// Class Reminders Server SDK
///
/// The SDK contains methods for interacting with the reminder dispatch
/// server API.
#[derive(Clone)]
pub struct ReminderSDK {
    pub reminder: ReminderClient,
    pub status: StatusClient,
}

impl ReminderSDK {
    pub fn new(address: String) -> Self {
        Self::from_base(BaseClient::new(address))
    }

    /// Client that authenticates with the shared cron secret
    pub fn with_cron_secret<T: Into<String>>(address: String, cron_secret: T) -> Self {
        let mut base = BaseClient::new(address);
        base.set_cron_secret(cron_secret.into());
        Self::from_base(base)
    }

    fn from_base(base: BaseClient) -> Self {
        let base = Arc::new(base);
        let reminder = ReminderClient::new(base.clone());
        let status = StatusClient::new(base);

        Self { reminder, status }
    }
}
