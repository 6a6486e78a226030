use class_reminders_api_structs::send_reminders::{APIResponse, ReminderBreakdown};

/// Counts of the deliveries attempted during one dispatch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTally {
    pub telegram_sent: usize,
    pub email_sent: usize,
    pub errors: usize,
}

impl DispatchTally {
    pub fn reminders_sent(&self) -> usize {
        self.telegram_sent + self.email_sent
    }

    pub fn merge(&mut self, other: DispatchTally) {
        self.telegram_sent += other.telegram_sent;
        self.email_sent += other.email_sent;
        self.errors += other.errors;
    }
}

/// What delivering one reminder kind for one session produced
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindOutcome {
    pub tally: DispatchTally,
    /// Deliveries that were attempted, successful or not
    pub attempts: usize,
}

/// Outcome of a dispatch run
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchSummary {
    /// There were no sessions in the lookahead window
    NoUpcomingSessions,
    Completed {
        sessions_checked: usize,
        tally: DispatchTally,
    },
}

impl From<DispatchSummary> for APIResponse {
    fn from(summary: DispatchSummary) -> Self {
        match summary {
            DispatchSummary::NoUpcomingSessions => APIResponse {
                success: true,
                message: "No upcoming sessions".into(),
                reminders_sent: 0,
                breakdown: None,
            },
            DispatchSummary::Completed {
                sessions_checked,
                tally,
            } => APIResponse {
                success: true,
                message: format!(
                    "Checked {} session(s), sent {} reminder(s)",
                    sessions_checked,
                    tally.reminders_sent()
                ),
                reminders_sent: tally.reminders_sent(),
                breakdown: Some(ReminderBreakdown {
                    telegram: tally.telegram_sent,
                    email: tally.email_sent,
                    errors: tally.errors,
                }),
            },
        }
    }
}
