use crate::{
    reminder::LedgerCategory,
    shared::entity::{Entity, ID},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::class_session::UnknownVariantError;

/// A `DeliveryRecord` is one row in the append-only delivery ledger. It is
/// written once for every attempted delivery, successful or not, and never
/// updated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    pub id: ID,
    pub session_id: ID,
    pub category: LedgerCategory,
    pub target: DeliveryTarget,
    pub status: DeliveryStatus,
    /// Error text returned by the provider when `status` is `Failed`
    pub error: Option<String>,
    pub created: i64,
}

/// Who or what a delivery was addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// A recipient email address, used by direct reminders
    Email(String),
    /// A bot chat identifier, used by broadcast reminders
    Broadcast(String),
}

impl DeliveryTarget {
    pub fn recipient_email(&self) -> Option<&str> {
        match self {
            Self::Email(email) => Some(email),
            Self::Broadcast(_) => None,
        }
    }

    pub fn recipient_telegram_id(&self) -> Option<&str> {
        match self {
            Self::Broadcast(chat_id) => Some(chat_id),
            Self::Email(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(UnknownVariantError {
                kind: "delivery status",
                value: s.to_string(),
            }),
        }
    }
}

impl DeliveryRecord {
    pub fn sent(
        session_id: ID,
        category: LedgerCategory,
        target: DeliveryTarget,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            session_id,
            category,
            target,
            status: DeliveryStatus::Sent,
            error: None,
            created: now,
        }
    }

    pub fn failed(
        session_id: ID,
        category: LedgerCategory,
        target: DeliveryTarget,
        error: String,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            session_id,
            category,
            target,
            status: DeliveryStatus::Failed,
            error: Some(error),
            created: now,
        }
    }
}

impl Entity for DeliveryRecord {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_records_keep_the_provider_error() {
        let record = DeliveryRecord::failed(
            ID::new(),
            LedgerCategory::ClassStart,
            DeliveryTarget::Broadcast("-100123".into()),
            "Bad Request: chat not found".into(),
            10,
        );
        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("Bad Request: chat not found"));
        assert_eq!(record.target.recipient_telegram_id(), Some("-100123"));
        assert_eq!(record.target.recipient_email(), None);
    }
}
