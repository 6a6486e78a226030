use serde::{Deserialize, Serialize};

pub mod send_reminders {
    use super::*;

    /// Per channel counts of a dispatch run
    #[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct ReminderBreakdown {
        pub telegram: usize,
        pub email: usize,
        pub errors: usize,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub success: bool,
        pub message: String,
        pub reminders_sent: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub breakdown: Option<ReminderBreakdown>,
    }
}
